//! Body-text flattening, run after caption linking.

use crate::document::Document;
use std::fmt;

/// Default separator between flattened text entities
pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// Produces the document's linear body text.
pub trait TextFlattener: fmt::Debug + Send + Sync {
    /// Prepare the collections before concatenation.
    ///
    /// Implementations must leave every provenance record owned by the
    /// entity it had after caption linking. The default does nothing.
    fn filter(&self, _doc: &mut Document) {}

    /// Join the remaining body text.
    fn concatenate(&self, doc: &Document) -> String;
}

/// Joins the text collection with a separator, skipping blank entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintextFlattener {
    separator: String,
}

impl Default for MaintextFlattener {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl MaintextFlattener {
    #[inline]
    #[must_use = "creates a new flattener"]
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl TextFlattener for MaintextFlattener {
    fn concatenate(&self, doc: &Document) -> String {
        let parts: Vec<&str> = doc
            .texts
            .iter()
            .map(|text| text.text.trim())
            .filter(|text| !text.is_empty())
            .collect();
        let skipped = doc.texts.len() - parts.len();
        if skipped > 0 {
            log::debug!("skipped {skipped} blank text entities");
        }
        parts.join(&self.separator)
    }
}
