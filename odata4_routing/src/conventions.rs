//! Routing conventions: mapping parsed paths to controllers

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use odata4_edm::EdmModel;

use crate::config::ServerConfig;
use crate::path::{ODataPath, PathSegment};

/// A policy mapping a parsed request path to a controller, independent of
/// attribute-declared routes. Conventions are consulted in order; the first
/// one to return a controller wins.
pub trait RoutingConvention: fmt::Debug + Send + Sync {
    fn select_controller(&self, path: &ODataPath) -> Option<Arc<str>>;
}

/// Serves routes declared through explicit attribute registrations on the
/// configuration (`ServerConfig::register_attribute_route`). Template
/// discovery from controller metadata is external; this convention only
/// matches the registered templates.
///
/// Templates are segment-wise literal matches with `{}` placeholders, e.g.
/// `Customers({key})/name`.
#[derive(Debug)]
pub struct AttributeRoutingConvention {
    templates: Vec<(Arc<str>, Arc<str>)>,
}

impl AttributeRoutingConvention {
    /// Snapshots the attribute routes registered on the configuration,
    /// dropping templates whose first segment does not exist in the model.
    pub fn new(config: &Arc<ServerConfig>, model: &Arc<EdmModel>) -> Self {
        let templates = config
            .attribute_routes()
            .into_iter()
            .filter(|(template, controller)| {
                let first = template.split('/').next().unwrap_or("");
                let (set_name, _) = first.split_once('(').unwrap_or((first, ""));
                let known = first.starts_with('$') || model.entity_set(set_name).is_some();
                if !known {
                    warn!(
                        template = template.as_ref(),
                        controller = controller.as_ref(),
                        "dropping attribute route with unknown first segment"
                    );
                }
                known
            })
            .collect();
        Self { templates }
    }

    fn template_matches(template: &str, path: &ODataPath) -> bool {
        let wanted: Vec<&str> = template.split('/').collect();
        let rendered = render_segments(path);
        if wanted.len() != rendered.len() {
            return false;
        }
        wanted
            .iter()
            .zip(&rendered)
            .all(|(pattern, actual)| segment_matches(pattern, actual))
    }
}

fn segment_matches(pattern: &str, actual: &str) -> bool {
    if pattern.starts_with('{') && pattern.ends_with('}') {
        return true;
    }
    // Parenthesized keys match per part: literal set name, placeholder key.
    if let (Some((pattern_set, pattern_key)), Some((actual_set, actual_key))) =
        (split_paren(pattern), split_paren(actual))
    {
        return pattern_set == actual_set
            && (pattern_key.starts_with('{') || pattern_key == actual_key);
    }
    pattern == actual
}

fn split_paren(segment: &str) -> Option<(&str, &str)> {
    let open = segment.find('(')?;
    let key = segment[open..].strip_prefix('(')?.strip_suffix(')')?;
    Some((&segment[..open], key))
}

fn render_segments(path: &ODataPath) -> Vec<String> {
    let mut rendered: Vec<String> = Vec::new();
    for segment in path.segments() {
        match segment {
            PathSegment::Metadata => rendered.push("$metadata".to_string()),
            PathSegment::Batch => rendered.push("$batch".to_string()),
            PathSegment::Count => rendered.push("$count".to_string()),
            PathSegment::Value => rendered.push("$value".to_string()),
            PathSegment::EntitySet(name) => rendered.push(name.to_string()),
            PathSegment::Key(key) => {
                // Keys render into their owning segment, parenthesized.
                if let Some(last) = rendered.last_mut() {
                    last.push('(');
                    last.push_str(key);
                    last.push(')');
                }
            }
            PathSegment::Property(name) => rendered.push(name.to_string()),
        }
    }
    rendered
}

impl RoutingConvention for AttributeRoutingConvention {
    fn select_controller(&self, path: &ODataPath) -> Option<Arc<str>> {
        self.templates
            .iter()
            .find(|(template, _)| Self::template_matches(template, path))
            .map(|(_, controller)| Arc::clone(controller))
    }
}

/// Routes the service root and `$metadata` to the metadata controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataRoutingConvention;

impl RoutingConvention for MetadataRoutingConvention {
    fn select_controller(&self, path: &ODataPath) -> Option<Arc<str>> {
        if path.is_empty() || path.first() == Some(&PathSegment::Metadata) {
            return Some(Arc::from("Metadata"));
        }
        None
    }
}

/// Routes entity-set level requests (`Customers`, `Customers/$count`) to the
/// controller named after the set.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitySetRoutingConvention;

impl RoutingConvention for EntitySetRoutingConvention {
    fn select_controller(&self, path: &ODataPath) -> Option<Arc<str>> {
        match path.segments() {
            [PathSegment::EntitySet(name)]
            | [PathSegment::EntitySet(name), PathSegment::Count] => Some(Arc::clone(name)),
            _ => None,
        }
    }
}

/// Routes single-entity requests (`Customers(1)` and deeper) to the
/// controller named after the set.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityRoutingConvention;

impl RoutingConvention for EntityRoutingConvention {
    fn select_controller(&self, path: &ODataPath) -> Option<Arc<str>> {
        match path.segments() {
            [PathSegment::EntitySet(name), PathSegment::Key(_), ..] => Some(Arc::clone(name)),
            _ => None,
        }
    }
}

/// The default convention set: attribute routing first, then the built-in
/// conventions. Used by route composition when the route container holds no
/// caller-supplied conventions, so a caller-supplied set always replaces the
/// defaults wholesale.
pub fn default_conventions(
    config: &Arc<ServerConfig>,
    model: &Arc<EdmModel>,
) -> Vec<Arc<dyn RoutingConvention>> {
    vec![
        Arc::new(AttributeRoutingConvention::new(config, model)),
        Arc::new(MetadataRoutingConvention),
        Arc::new(EntitySetRoutingConvention),
        Arc::new(EntityRoutingConvention),
    ]
}
