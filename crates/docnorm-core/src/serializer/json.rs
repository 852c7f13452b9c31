//! JSON serialization for [`Document`]
//!
//! A thin wrapper around `serde_json` with formatting and field-filter
//! options.

use crate::document::Document;
use crate::error::Result;
use crate::serializer::filter_fields;
use std::collections::BTreeSet;

/// Options for JSON serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonOptions {
    /// Pretty-print with indentation (default: true)
    pub pretty: bool,
    /// Top-level fields to emit; empty means all
    pub filters: BTreeSet<String>,
}

impl Default for JsonOptions {
    #[inline]
    fn default() -> Self {
        Self {
            pretty: true,
            filters: BTreeSet::new(),
        }
    }
}

/// JSON serializer for [`Document`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonSerializer {
    options: JsonOptions,
}

impl JsonSerializer {
    /// Create a new JSON serializer with default options (pretty-printed)
    #[inline]
    #[must_use = "creates serializer with default options"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new JSON serializer with custom options
    #[inline]
    #[must_use = "creates serializer with custom options"]
    pub const fn with_options(options: JsonOptions) -> Self {
        Self { options }
    }

    /// Serialize a document to JSON text
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn serialize_document(&self, doc: &Document) -> Result<String> {
        let value = filter_fields(serde_json::to_value(doc)?, &self.options.filters);
        let text = if self.options.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(text)
    }

    /// Parse a full document dump
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a document dump or refers to
    /// missing provenance records.
    pub fn deserialize_document(text: &str) -> Result<Document> {
        Document::from_json(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::TextEntity;
    use crate::provenance::ProvenanceRecord;

    fn sample() -> Document {
        let mut doc = Document::new("sample");
        doc.push_prov(ProvenanceRecord::new(0, "#/texts/0", "Text", "paragraph", 1));
        doc.append_text(TextEntity::new("", vec![0], "Hello World")).unwrap();
        doc
    }

    #[test]
    fn test_json_serialization_basic() {
        let json = JsonSerializer::new().serialize_document(&sample()).unwrap();
        assert!(json.contains("Hello World"));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_json_serialization_compact() {
        let serializer = JsonSerializer::with_options(JsonOptions {
            pretty: false,
            ..JsonOptions::default()
        });
        let json = serializer.serialize_document(&sample()).unwrap();
        assert!(json.contains("Hello World"));
        assert!(!json.contains("\n  "));
    }

    #[test]
    fn test_json_filters() {
        let serializer = JsonSerializer::with_options(JsonOptions {
            pretty: false,
            filters: ["provs".to_string()].into_iter().collect(),
        });
        let json = serializer.serialize_document(&sample()).unwrap();
        assert!(json.starts_with("{\"provs\":"));
        assert!(!json.contains("Hello World"));
    }

    #[test]
    fn test_json_deserialization() {
        let doc = sample();
        let json = JsonSerializer::new().serialize_document(&doc).unwrap();
        let parsed = JsonSerializer::deserialize_document(&json).unwrap();
        assert_eq!(parsed, doc);
    }
}
