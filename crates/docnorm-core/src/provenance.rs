//! Provenance records: where each main-text item came from.
//!
//! A [`ProvenanceRecord`] is rebuilt from the raw store on every pass; it is
//! never patched across passes. Entities refer to records by their position
//! in the document's `provs` list ([`ProvIndex`]).

use crate::raw::{self, LocationProv};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Position of a record in the document's `provs` list
pub type ProvIndex = usize;

/// Origin, order and page of one layout item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Position in the (sorted) main-text sequence
    pub order: usize,
    /// Position in the raw main-text sequence before sorting
    pub source_index: usize,
    /// Address of the item; rewritten once the item's final home is known
    pub path: String,
    /// Address of this record in `provs` (e.g. "#/provs/4")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_path: Option<String>,
    /// Human label
    pub name: String,
    /// Semantic role (e.g. "paragraph", "table", "caption")
    #[serde(rename = "type")]
    pub item_type: String,
    /// Page number
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<[usize; 2]>,
    /// Set for headers, footers and unrecognized roles
    #[serde(default)]
    pub ignored: bool,
}

impl ProvenanceRecord {
    /// Creates a record without bbox/span for programmatic assembly.
    #[must_use = "creates a new provenance record"]
    pub fn new(
        order: usize,
        path: impl Into<String>,
        name: impl Into<String>,
        item_type: impl Into<String>,
        page: usize,
    ) -> Self {
        Self {
            order,
            source_index: order,
            path: path.into(),
            self_path: None,
            name: name.into(),
            item_type: item_type.into(),
            page,
            bbox: None,
            span: None,
            ignored: false,
        }
    }

    fn with_location(mut self, loc: LocationProv) -> Self {
        self.page = loc.page;
        self.bbox = loc.bbox;
        self.span = loc.span;
        self
    }
}

/// Build one record per resolvable main-text item, in main-text order.
///
/// An item is dropped (with a diagnostic) when its address is malformed,
/// points outside the store, or its target does not carry exactly one
/// location-provenance entry with a page. Calling this twice on an unchanged
/// store yields identical lists.
#[must_use = "returns the provenance records"]
pub fn build_provenance(orig: &Value) -> Vec<ProvenanceRecord> {
    let Some(main_text) = raw::main_text(orig) else {
        return Vec::new();
    };

    let mut provs = Vec::with_capacity(main_text.len());
    for (position, item) in main_text.iter().enumerate() {
        if let Some(record) = build_record(orig, item, position) {
            provs.push(record);
        }
    }
    provs
}

fn build_record(orig: &Value, item: &Value, position: usize) -> Option<ProvenanceRecord> {
    let path = raw::item_path(item, position);

    let source_index = item
        .get(raw::PDF_ORDER_KEY)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(position);

    let Some((base, index)) = raw::split_path(&path) else {
        log::warn!("malformed reference path `{path}` in main-text item: {item}");
        return None;
    };

    let Some(target) = raw::lookup(orig, base, index) else {
        log::warn!("undefined reference path in document: {item}");
        return None;
    };

    let locations = target.get(raw::PROV_KEY).and_then(Value::as_array);
    let location = match locations.map(Vec::as_slice) {
        Some([single]) => single,
        _ => {
            log::error!("undefined prov for main-text item: {item}");
            return None;
        }
    };

    let location: LocationProv = match serde_json::from_value(location.clone()) {
        Ok(loc) => loc,
        Err(e) => {
            log::error!("unreadable prov for main-text item ({e}): {item}");
            return None;
        }
    };

    let record = ProvenanceRecord {
        source_index,
        ..ProvenanceRecord::new(
            position,
            path,
            raw::str_field(item, raw::NAME_KEY),
            raw::str_field(item, raw::TYPE_KEY),
            0,
        )
    };
    Some(record.with_location(location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "main-text": [
                {"text": "Intro", "type": "paragraph", "name": "Text", "pdf-order": 0,
                 "prov": [{"page": 1, "bbox": [0, 0, 10, 10], "span": [0, 5]}]},
                {"$ref": "#/tables/0", "type": "table", "name": "Table", "pdf-order": 1},
                {"$ref": "#/tables/9", "type": "table", "name": "Table", "pdf-order": 2},
                {"text": "orphan", "type": "paragraph", "name": "Text", "pdf-order": 3, "prov": []},
                {"text": "twice", "type": "paragraph", "name": "Text", "pdf-order": 4,
                 "prov": [{"page": 1}, {"page": 2}]},
                {"$ref": "#/tables/x", "type": "table", "name": "Table", "pdf-order": 5}
            ],
            "tables": [
                {"data": [["a"]], "prov": [{"page": 2}]}
            ]
        })
    }

    #[test]
    fn test_build_provenance_drops_unresolvable_items() {
        let provs = build_provenance(&sample());
        assert_eq!(provs.len(), 2);

        assert_eq!(provs[0].path, "#/main-text/0");
        assert_eq!(provs[0].item_type, "paragraph");
        assert_eq!(provs[0].page, 1);
        assert_eq!(provs[0].span, Some([0, 5]));
        assert_eq!(provs[0].bbox, Some([0.0, 0.0, 10.0, 10.0]));

        assert_eq!(provs[1].path, "#/tables/0");
        assert_eq!(provs[1].page, 2);
        assert_eq!(provs[1].order, 1);
        assert_eq!(provs[1].source_index, 1);
        assert!(!provs[1].ignored);
        assert!(provs[1].self_path.is_none());
    }

    #[test]
    fn test_build_provenance_is_idempotent() {
        let orig = sample();
        assert_eq!(build_provenance(&orig), build_provenance(&orig));
    }

    #[test]
    fn test_order_and_source_index_after_reorder() {
        let mut orig = sample();
        // move the table reference to the front, keeping its stamp
        let main = raw::main_text_mut(&mut orig).unwrap();
        let table = main.remove(1);
        main.insert(0, table);

        let provs = build_provenance(&orig);
        assert_eq!(provs[0].path, "#/tables/0");
        assert_eq!(provs[0].order, 0);
        assert_eq!(provs[0].source_index, 1);
        assert_eq!(provs[1].order, 1);
        assert_eq!(provs[1].source_index, 0);
    }

    #[test]
    fn test_missing_main_text() {
        assert!(build_provenance(&json!({"tables": []})).is_empty());
    }
}
