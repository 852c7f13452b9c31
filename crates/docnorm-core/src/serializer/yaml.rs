//! YAML serialization for [`Document`]
//!
//! Useful for eyeballing normalized output; `serde_yaml` has no layout
//! options, so only field filtering is configurable.

use crate::document::Document;
use crate::error::Result;
use crate::serializer::filter_fields;
use std::collections::BTreeSet;

/// Options for YAML serialization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YamlOptions {
    /// Top-level fields to emit; empty means all
    pub filters: BTreeSet<String>,
}

/// YAML serializer for [`Document`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YamlSerializer {
    options: YamlOptions,
}

impl YamlSerializer {
    #[inline]
    #[must_use = "creates serializer with default options"]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use = "creates serializer with custom options"]
    pub const fn with_options(options: YamlOptions) -> Self {
        Self { options }
    }

    /// Serialize a document to YAML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn serialize_document(&self, doc: &Document) -> Result<String> {
        let value = filter_fields(serde_json::to_value(doc)?, &self.options.filters);
        Ok(serde_yaml::to_string(&value)?)
    }
}
