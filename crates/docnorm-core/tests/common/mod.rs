//! Common test utilities and fixtures

#![allow(dead_code)]

use docnorm_core::{Document, ProvIndex};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Builder for raw extraction stores
#[derive(Debug, Default)]
pub struct RawDoc {
    name: Option<String>,
    main_text: Vec<Value>,
    tables: Vec<Value>,
    figures: Vec<Value>,
}

impl RawDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Inline text-like item (`paragraph`, `caption`, `page-header`, ...)
    pub fn text(mut self, item_type: &str, page: usize, text: &str) -> Self {
        self.main_text.push(json!({
            "text": text,
            "type": item_type,
            "name": item_type,
            "prov": [{"page": page, "bbox": [0.0, 0.0, 100.0, 10.0], "span": [0, text.len()]}]
        }));
        self
    }

    pub fn paragraph(self, page: usize, text: &str) -> Self {
        self.text("paragraph", page, text)
    }

    pub fn caption(self, page: usize, text: &str) -> Self {
        self.text("caption", page, text)
    }

    /// Table in `tables`, referenced from main-text
    pub fn table(mut self, page: usize) -> Self {
        let index = self.tables.len();
        self.tables.push(json!({
            "data": [["h1", "h2"], ["a", "b"]],
            "#-rows": 2,
            "#-cols": 2,
            "prov": [{"page": page}]
        }));
        self.main_text.push(json!({
            "$ref": format!("#/tables/{index}"),
            "type": "table",
            "name": "Table"
        }));
        self
    }

    /// Figure in `figures`, referenced from main-text
    pub fn figure(mut self, page: usize) -> Self {
        let index = self.figures.len();
        self.figures.push(json!({"data": {"format": "png"}, "prov": [{"page": page}]}));
        self.main_text.push(json!({
            "$ref": format!("#/figures/{index}"),
            "type": "figure",
            "name": "Picture"
        }));
        self
    }

    /// Inline item without any location provenance
    pub fn unlocated(mut self, text: &str) -> Self {
        self.main_text.push(json!({"text": text, "type": "paragraph", "name": "Text", "prov": []}));
        self
    }

    /// Reference to a table that does not exist
    pub fn dangling_table(mut self) -> Self {
        self.main_text.push(json!({"$ref": "#/tables/999", "type": "table", "name": "Table"}));
        self
    }

    pub fn len(&self) -> usize {
        self.main_text.len()
    }

    pub fn build(self) -> Value {
        let mut raw = json!({
            "main-text": self.main_text,
            "tables": self.tables,
            "figures": self.figures
        });
        if let Some(name) = self.name {
            raw["file-info"] = json!({"filename": name, "document-hash": "0123abcd"});
        }
        raw
    }

    pub fn document(self) -> Document {
        Document::from_raw(self.build()).expect("fixture is a valid raw store")
    }
}

/// Number of entities (top-level and nested captions) owning each record
pub fn prov_owners(doc: &Document) -> BTreeMap<ProvIndex, usize> {
    let mut owners = BTreeMap::new();
    let captions = doc
        .tables
        .iter()
        .flat_map(|t| &t.captions)
        .chain(doc.figures.iter().flat_map(|f| &f.captions));

    let owned = doc
        .entities()
        .flat_map(|e| e.provs().to_vec())
        .chain(captions.flat_map(|c| c.provs.clone()));
    for prov in owned {
        *owners.entry(prov).or_insert(0) += 1;
    }
    owners
}

/// Provenance indices of every linked caption
pub fn caption_provs(doc: &Document) -> Vec<ProvIndex> {
    doc.tables
        .iter()
        .flat_map(|t| &t.captions)
        .chain(doc.figures.iter().flat_map(|f| &f.captions))
        .flat_map(|c| c.provs.clone())
        .collect()
}
