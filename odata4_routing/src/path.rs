//! OData path parsing and the path-handler contract

use std::fmt;
use std::sync::Arc;

use odata4_edm::{EdmModel, EdmStructuredType};

use crate::resolver::{DefaultUriResolver, UriResolver, UriResolverSettings, UrlConventions};
use crate::segments;

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("unknown entity set `{name}`")]
    UnknownEntitySet { name: String },
    #[error("segment `{segment}` is not valid at this position")]
    UnexpectedSegment { segment: String },
    #[error("`{segment}` must be the final path segment")]
    TrailingSegments { segment: String },
}

/// One parsed segment of an OData request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Metadata,
    Batch,
    Count,
    Value,
    EntitySet(Arc<str>),
    Key(String),
    Property(Arc<str>),
}

/// A parsed OData path. An empty path addresses the service root (the
/// service document).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ODataPath {
    segments: Vec<PathSegment>,
}

impl ODataPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn first(&self) -> Option<&PathSegment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Parses request paths into [`ODataPath`] values.
///
/// A handler may optionally support URI resolution, in which case it exposes
/// its route-local [`UriResolverSettings`]; composition copies unset fields
/// from the configuration's global settings.
pub trait PathHandler: fmt::Debug + Send + Sync {
    fn parse(&self, model: &EdmModel, service_root: &str, path: &str)
    -> Result<ODataPath, PathError>;

    /// The handler's URI-resolution settings, when the capability is
    /// supported.
    fn resolution_settings(&self) -> Option<&UriResolverSettings> {
        None
    }
}

/// The stock path handler.
#[derive(Debug, Default)]
pub struct DefaultPathHandler {
    settings: UriResolverSettings,
}

impl DefaultPathHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PathHandler for DefaultPathHandler {
    fn resolution_settings(&self) -> Option<&UriResolverSettings> {
        Some(&self.settings)
    }

    fn parse(
        &self,
        model: &EdmModel,
        _service_root: &str,
        path: &str,
    ) -> Result<ODataPath, PathError> {
        let resolver: Arc<dyn UriResolver> = self
            .settings
            .uri_resolver()
            .unwrap_or_else(|| Arc::new(DefaultUriResolver));
        let conventions = self
            .settings
            .url_conventions()
            .unwrap_or(UrlConventions::Parentheses);

        Parser {
            model,
            resolver,
            conventions,
        }
        .parse(path)
    }
}

struct Parser<'a> {
    model: &'a EdmModel,
    resolver: Arc<dyn UriResolver>,
    conventions: UrlConventions,
}

impl Parser<'_> {
    fn parse(&self, path: &str) -> Result<ODataPath, PathError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(ODataPath::default());
        }

        let parts: Vec<&str> = trimmed.split('/').collect();
        let mut segments = Vec::new();
        // The entity set in scope while no key has been parsed yet.
        let mut pending_set = None;
        // The structured type in scope once a single entity is addressed.
        let mut entity_type: Option<Arc<EdmStructuredType>> = None;

        match parts[0] {
            segments::METADATA => {
                Self::require_terminal(&parts, 0)?;
                return Ok(ODataPath {
                    segments: vec![PathSegment::Metadata],
                });
            }
            segments::BATCH => {
                Self::require_terminal(&parts, 0)?;
                return Ok(ODataPath {
                    segments: vec![PathSegment::Batch],
                });
            }
            first => {
                let (set_name, key) = split_parenthesized_key(first);
                let set = self
                    .resolver
                    .resolve_entity_set(self.model, set_name)
                    .ok_or_else(|| PathError::UnknownEntitySet {
                        name: set_name.to_string(),
                    })?;
                segments.push(PathSegment::EntitySet(Arc::from(set.name())));
                match key {
                    Some(key) => {
                        segments.push(PathSegment::Key(key.to_string()));
                        entity_type = Some(Arc::clone(set.entity_type()));
                    }
                    None => pending_set = Some(set),
                }
            }
        }

        for (index, part) in parts.iter().enumerate().skip(1) {
            match *part {
                segments::COUNT => {
                    Self::require_terminal(&parts, index)?;
                    segments.push(PathSegment::Count);
                }
                segments::VALUE => {
                    Self::require_terminal(&parts, index)?;
                    segments.push(PathSegment::Value);
                }
                other => {
                    if let Some(set) = pending_set.take() {
                        if self.conventions == UrlConventions::KeyAsSegment {
                            segments.push(PathSegment::Key(other.to_string()));
                            entity_type = Some(Arc::clone(set.entity_type()));
                            continue;
                        }
                    }

                    match entity_type.take() {
                        Some(declaring) if declaring.property(other).is_some() => {
                            segments.push(PathSegment::Property(Arc::from(other)));
                        }
                        _ => {
                            return Err(PathError::UnexpectedSegment {
                                segment: other.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok(ODataPath { segments })
    }

    fn require_terminal(parts: &[&str], index: usize) -> Result<(), PathError> {
        if index + 1 != parts.len() {
            return Err(PathError::TrailingSegments {
                segment: parts[index].to_string(),
            });
        }
        Ok(())
    }
}

/// Splits `Customers(1)` into the set name and the key literal.
fn split_parenthesized_key(segment: &str) -> (&str, Option<&str>) {
    if let Some(open) = segment.find('(') {
        if let Some(stripped) = segment[open..].strip_prefix('(').and_then(|s| s.strip_suffix(')'))
        {
            return (&segment[..open], Some(stripped));
        }
    }
    (segment, None)
}
