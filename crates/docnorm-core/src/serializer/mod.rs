//! Document serialization
//!
//! `Document` implements serde traits directly; the serializers here add
//! output options and named field filters on top.

pub mod json;
pub mod yaml;

pub use json::{JsonOptions, JsonSerializer};
pub use yaml::{YamlOptions, YamlSerializer};

use serde_json::Value;
use std::collections::BTreeSet;

/// Top-level document fields accepted as filters
pub const FIELD_NAMES: [&str; 11] = [
    "name",
    "doc_hash",
    "orig",
    "provs",
    "texts",
    "tables",
    "figures",
    "page_headers",
    "page_footers",
    "other",
    "maintext",
];

/// Keep only the listed top-level fields of a serialized document.
///
/// An empty filter set keeps everything. Unknown names are ignored with a
/// warning.
#[must_use = "returns the filtered value"]
pub fn filter_fields(value: Value, filters: &BTreeSet<String>) -> Value {
    if filters.is_empty() {
        return value;
    }
    for unknown in filters.iter().filter(|f| !FIELD_NAMES.contains(&f.as_str())) {
        log::warn!("ignoring unknown document field filter `{unknown}`");
    }

    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| filters.contains(key))
                .collect(),
        ),
        other => other,
    }
}
