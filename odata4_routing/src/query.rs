//! Query-filter registration hook
//!
//! Filters registered here are drained by the request pipeline, which owns
//! query execution; only the registration surface is part of this core.

use std::fmt;

/// A query-composition filter attached to the configuration.
pub trait QueryFilter: fmt::Debug + Send + Sync {
    /// The query options this filter allows, as raw `$`-option names.
    fn allowed_options(&self) -> &[&'static str];
}

/// The stock filter: enables the standard query options, optionally capped
/// by a server-driven page size.
#[derive(Debug, Clone)]
pub struct EnableQueryFilter {
    page_size: Option<usize>,
    allowed: Vec<&'static str>,
}

impl EnableQueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn page_size(&self) -> Option<usize> {
        self.page_size
    }
}

impl Default for EnableQueryFilter {
    fn default() -> Self {
        Self {
            page_size: None,
            allowed: vec![
                "$filter", "$orderby", "$top", "$skip", "$count", "$select", "$expand",
            ],
        }
    }
}

impl QueryFilter for EnableQueryFilter {
    fn allowed_options(&self) -> &[&'static str] {
        &self.allowed
    }
}
