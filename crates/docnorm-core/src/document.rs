//! The normalized document aggregate.
//!
//! A [`Document`] wraps the raw extraction store (`orig`) together with
//! everything derived from it: the ordered provenance list and the typed
//! entity collections.

use crate::entity::{EntityRef, FigureEntity, TableEntity, TextEntity};
use crate::error::{NormalizeError, Result};
use crate::labels::ItemRole;
use crate::provenance::{ProvIndex, ProvenanceRecord};
use crate::raw;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Path segment of nested captions in produced addresses
pub const CAPTIONS_SEGMENT: &str = "captions";
/// Collection name of the provenance list in self addresses
pub const PROVS_SEGMENT: &str = "provs";

/// Normalized document: raw store, provenance list and typed collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document name, used as the prefix of entity addresses
    pub name: String,

    /// Document hash from the raw file info, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_hash: Option<String>,

    /// Raw extraction store
    #[serde(default)]
    pub orig: Value,

    /// Provenance records in final reading order
    #[serde(default)]
    pub provs: Vec<ProvenanceRecord>,

    #[serde(default)]
    pub texts: Vec<TextEntity>,

    #[serde(default)]
    pub tables: Vec<TableEntity>,

    #[serde(default)]
    pub figures: Vec<FigureEntity>,

    #[serde(default)]
    pub page_headers: Vec<TextEntity>,

    #[serde(default)]
    pub page_footers: Vec<TextEntity>,

    /// Items whose role is not covered by the role tables
    #[serde(default)]
    pub other: Vec<TextEntity>,

    /// Flattened body text, filled in by the text flattener
    #[serde(default)]
    pub maintext: String,
}

/// Per-collection counts returned by [`Document::stats()`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentStats {
    pub num_provs: usize,
    pub num_texts: usize,
    pub num_tables: usize,
    pub num_figures: usize,
    pub num_page_headers: usize,
    pub num_page_footers: usize,
    pub num_other: usize,
    /// Captions linked to tables and figures
    pub num_captions: usize,
    /// Distinct page numbers among the provenance records
    pub num_pages: usize,
}

impl Document {
    /// Creates an empty document with the given name.
    #[inline]
    #[must_use = "creates a new empty document"]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            orig: Value::Object(serde_json::Map::new()),
            ..Self::default()
        }
    }

    /// Wrap a raw extraction store.
    ///
    /// The name comes from `file-info.filename`; without one a random
    /// 64-hex-digit name is generated.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::InvalidDocument`] if the store is not a JSON
    /// object or its `main-text` is not an array.
    pub fn from_raw(orig: Value) -> Result<Self> {
        if !orig.is_object() {
            return Err(NormalizeError::InvalidDocument(
                "raw document must be a JSON object".to_string(),
            ));
        }
        if orig
            .get(raw::MAINTEXT_KEY)
            .is_some_and(|main| !main.is_array())
        {
            return Err(NormalizeError::InvalidDocument(format!(
                "`{}` must be an array",
                raw::MAINTEXT_KEY
            )));
        }

        let file_info = orig.get(raw::FILE_INFO_KEY);
        let info_str = |key: &str| {
            file_info
                .and_then(|info| info.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let name = info_str("filename").unwrap_or_else(generate_random_name);
        let doc_hash = info_str("document-hash");

        Ok(Self {
            name,
            doc_hash,
            orig,
            ..Self::default()
        })
    }

    /// Parse and wrap a raw extraction store.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or not a valid raw store.
    pub fn from_raw_str(json: &str) -> Result<Self> {
        Self::from_raw(serde_json::from_str(json)?)
    }

    /// Drop every derived collection, keeping the raw store and name.
    pub fn clear(&mut self) {
        self.provs.clear();
        self.texts.clear();
        self.tables.clear();
        self.figures.clear();
        self.page_headers.clear();
        self.page_footers.clear();
        self.other.clear();
        self.maintext.clear();
    }

    /// Append a provenance record, returning its index.
    pub fn push_prov(&mut self, record: ProvenanceRecord) -> ProvIndex {
        self.provs.push(record);
        self.provs.len() - 1
    }

    /// Append a validated text entity.
    ///
    /// An empty `dloc` is filled in with the entity's address.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::InvalidEntity`] (leaving the document
    /// unchanged) if the text is blank or the entity owns no provenance or
    /// provenance outside `provs`.
    pub fn append_text(&mut self, mut text: TextEntity) -> Result<()> {
        if text.text.trim().is_empty() {
            return Err(NormalizeError::InvalidEntity("text is empty".to_string()));
        }
        self.check_provs(&text.provs)?;

        if text.dloc.is_empty() {
            text.dloc = self.entity_address(ItemRole::Text, self.texts.len());
        }
        self.texts.push(text);
        Ok(())
    }

    /// Append a validated table entity.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::InvalidEntity`] (leaving the document
    /// unchanged) if the grid is empty or ragged, or the table or one of its
    /// captions refers to provenance outside `provs`.
    pub fn append_table(&mut self, mut table: TableEntity) -> Result<()> {
        if !table.is_well_formed() {
            return Err(NormalizeError::InvalidEntity(format!(
                "table grid is empty or ragged ({} rows)",
                table.data.len()
            )));
        }
        self.check_provs(&table.provs)?;
        for caption in &table.captions {
            self.check_provs(&caption.provs)?;
        }

        if table.dloc.is_empty() {
            table.dloc = self.entity_address(ItemRole::Table, self.tables.len());
        }
        table.valid = true;
        self.tables.push(table);
        Ok(())
    }

    fn check_provs(&self, provs: &[ProvIndex]) -> Result<()> {
        if provs.is_empty() {
            return Err(NormalizeError::InvalidEntity(
                "entity owns no provenance".to_string(),
            ));
        }
        if let Some(bad) = provs.iter().find(|&&ind| ind >= self.provs.len()) {
            return Err(NormalizeError::InvalidEntity(format!(
                "provenance index {bad} out of range ({} records)",
                self.provs.len()
            )));
        }
        Ok(())
    }

    /// Creation-time address of the `position`-th entity of a collection
    /// (`<name>#/<collection>/<position>`).
    #[must_use = "returns the entity address"]
    pub fn entity_address(&self, role: ItemRole, position: usize) -> String {
        format!("{}#/{}/{}", self.name, role.collection(), position)
    }

    /// Look up an entity by produced address (`#/tables/0`,
    /// `#/figures/2/captions/1`, optionally prefixed by the document name).
    #[must_use = "returns the addressed entity"]
    pub fn find_by_path(&self, path: &str) -> Option<EntityRef<'_>> {
        let pointer = path.rsplit_once('#').map_or(path, |(_, p)| p);
        let mut parts = pointer.trim_start_matches('/').split('/');
        let collection = parts.next()?;
        let index: usize = parts.next()?.parse().ok()?;

        let caption = match (parts.next(), parts.next()) {
            (None, _) => None,
            (Some(CAPTIONS_SEGMENT), Some(k)) => Some(k.parse::<usize>().ok()?),
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }

        match (collection, caption) {
            ("texts", None) => self.texts.get(index).map(EntityRef::Text),
            ("page_headers", None) => self.page_headers.get(index).map(EntityRef::Text),
            ("page_footers", None) => self.page_footers.get(index).map(EntityRef::Text),
            ("other", None) => self.other.get(index).map(EntityRef::Text),
            ("tables", None) => self.tables.get(index).map(EntityRef::Table),
            ("figures", None) => self.figures.get(index).map(EntityRef::Figure),
            ("tables", Some(k)) => self.tables.get(index)?.captions.get(k).map(EntityRef::Text),
            ("figures", Some(k)) => self.figures.get(index)?.captions.get(k).map(EntityRef::Text),
            _ => None,
        }
    }

    /// Every top-level entity, collection by collection.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> + '_ {
        self.texts
            .iter()
            .map(EntityRef::Text)
            .chain(self.tables.iter().map(EntityRef::Table))
            .chain(self.figures.iter().map(EntityRef::Figure))
            .chain(self.page_headers.iter().map(EntityRef::Text))
            .chain(self.page_footers.iter().map(EntityRef::Text))
            .chain(self.other.iter().map(EntityRef::Text))
    }

    /// Per-collection counts.
    #[must_use = "returns document statistics"]
    pub fn stats(&self) -> DocumentStats {
        let pages: BTreeSet<usize> = self.provs.iter().map(|p| p.page).collect();
        DocumentStats {
            num_provs: self.provs.len(),
            num_texts: self.texts.len(),
            num_tables: self.tables.len(),
            num_figures: self.figures.len(),
            num_page_headers: self.page_headers.len(),
            num_page_footers: self.page_footers.len(),
            num_other: self.other.len(),
            num_captions: self.tables.iter().map(|t| t.captions.len()).sum::<usize>()
                + self.figures.iter().map(|f| f.captions.len()).sum::<usize>(),
            num_pages: pages.len(),
        }
    }

    /// Check that every entity (and nested caption) refers to existing
    /// provenance records.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::InvalidDocument`] naming the first offender.
    pub fn validate(&self) -> Result<()> {
        let captions = self
            .tables
            .iter()
            .flat_map(|t| &t.captions)
            .chain(self.figures.iter().flat_map(|f| &f.captions))
            .map(|c| (c.dloc.as_str(), c.provs.as_slice()));
        let top_level = self.entities().map(|e| (e.dloc(), e.provs()));

        for (dloc, provs) in top_level.chain(captions) {
            if let Some(bad) = provs.iter().find(|&&ind| ind >= self.provs.len()) {
                return Err(NormalizeError::InvalidDocument(format!(
                    "entity `{dloc}` refers to missing provenance record {bad}"
                )));
            }
        }
        Ok(())
    }
}

impl Document {
    /// Serialize to a JSON value holding only the named top-level fields
    /// (all fields when `filters` is empty).
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Json`] if serialization fails.
    pub fn to_json(&self, filters: &BTreeSet<String>) -> Result<Value> {
        Ok(crate::serializer::filter_fields(serde_json::to_value(self)?, filters))
    }

    /// Rebuild a document from a full [`Document::to_json`] dump.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not describe a document or any
    /// entity refers to a missing provenance record.
    pub fn from_json(value: Value) -> Result<Self> {
        let doc: Self = serde_json::from_value(value)?;
        doc.validate()?;
        Ok(doc)
    }
}

/// 64 random hex digits, used when the raw store names no file.
fn generate_random_name() -> String {
    let first = uuid::Uuid::new_v4().simple().to_string();
    let second = uuid::Uuid::new_v4().simple().to_string();
    format!("{first}{second}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with_provs(n: usize) -> Document {
        let mut doc = Document::new("doc");
        for i in 0..n {
            let path = format!("#/main-text/{i}");
            doc.push_prov(ProvenanceRecord::new(i, path, "Text", "paragraph", 1));
        }
        doc
    }

    #[test]
    fn test_from_raw_uses_file_info() {
        let doc = Document::from_raw(json!({
            "file-info": {"filename": "report.pdf", "document-hash": "abc123"},
            "main-text": []
        }))
        .unwrap();
        assert_eq!(doc.name, "report.pdf");
        assert_eq!(doc.doc_hash.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_from_raw_generates_name() {
        let doc = Document::from_raw(json!({"main-text": []})).unwrap();
        assert_eq!(doc.name.len(), 64);
        assert!(doc.name.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(doc.doc_hash.is_none());
    }

    #[test]
    fn test_from_raw_rejects_bad_shapes() {
        assert!(matches!(
            Document::from_raw(json!([1, 2])),
            Err(NormalizeError::InvalidDocument(_))
        ));
        assert!(matches!(
            Document::from_raw(json!({"main-text": {}})),
            Err(NormalizeError::InvalidDocument(_))
        ));
        assert!(Document::from_raw_str("not json").is_err());
    }

    #[test]
    fn test_append_text_validates() {
        let mut doc = doc_with_provs(2);

        doc.append_text(TextEntity::new("", vec![0], "Hello")).unwrap();
        assert_eq!(doc.texts[0].dloc, "doc#/texts/0");

        let blank = doc.append_text(TextEntity::new("", vec![1], "   "));
        assert!(matches!(blank, Err(NormalizeError::InvalidEntity(_))));

        let dangling = doc.append_text(TextEntity::new("", vec![5], "World"));
        assert!(matches!(dangling, Err(NormalizeError::InvalidEntity(_))));

        let orphan = doc.append_text(TextEntity::new("", vec![], "World"));
        assert!(orphan.is_err());

        assert_eq!(doc.texts.len(), 1);
    }

    #[test]
    fn test_append_table_validates() {
        let mut doc = doc_with_provs(2);

        let ragged = TableEntity::new("", vec![0], vec![vec![json!(1), json!(2)], vec![json!(3)]]);
        assert!(doc.append_table(ragged).is_err());
        assert!(doc.tables.is_empty());

        let mut table = TableEntity::new("", vec![0], vec![vec![json!("a"), json!("b")]]);
        table.captions.push(TextEntity::new("", vec![9], "Table 1"));
        assert!(doc.append_table(table.clone()).is_err());

        table.captions[0].provs = vec![1];
        doc.append_table(table).unwrap();
        assert_eq!(doc.tables[0].dloc, "doc#/tables/0");
        assert_eq!(doc.stats().num_captions, 1);
    }

    #[test]
    fn test_find_by_path() {
        let mut doc = doc_with_provs(3);
        doc.append_text(TextEntity::new("", vec![0], "Body")).unwrap();
        let mut table = TableEntity::new("", vec![1], vec![vec![json!("x")]]);
        table.captions.push(TextEntity::new("doc#/texts/1", vec![2], "Table 1"));
        doc.append_table(table).unwrap();

        assert_eq!(
            doc.find_by_path("#/texts/0").map(|e| e.dloc().to_string()),
            Some("doc#/texts/0".to_string())
        );
        assert!(matches!(doc.find_by_path("doc#/tables/0"), Some(EntityRef::Table(_))));
        assert!(matches!(
            doc.find_by_path("#/tables/0/captions/0"),
            Some(EntityRef::Text(t)) if t.text == "Table 1"
        ));
        assert!(doc.find_by_path("#/tables/0/captions/1").is_none());
        assert!(doc.find_by_path("#/tables/0/rows/0").is_none());
        assert!(doc.find_by_path("#/figures/0").is_none());
        assert!(doc.find_by_path("#/texts").is_none());
    }

    #[test]
    fn test_clear_keeps_raw_store() {
        let raw = json!({"file-info": {"filename": "a"}, "main-text": []});
        let mut doc = Document::from_raw(raw).unwrap();
        doc.push_prov(ProvenanceRecord::new(0, "#/main-text/0", "Text", "paragraph", 1));
        doc.append_text(TextEntity::new("", vec![0], "x")).unwrap();
        doc.maintext = "x".to_string();

        doc.clear();
        assert!(doc.provs.is_empty());
        assert!(doc.texts.is_empty());
        assert!(doc.maintext.is_empty());
        assert_eq!(doc.name, "a");
        assert!(doc.orig.get("main-text").is_some());
    }

    #[test]
    fn test_json_dump_and_reload() {
        let mut doc = doc_with_provs(1);
        doc.append_text(TextEntity::new("", vec![0], "Body")).unwrap();

        let full = doc.to_json(&BTreeSet::new()).unwrap();
        assert_eq!(Document::from_json(full.clone()).unwrap(), doc);

        let filters: BTreeSet<String> = ["texts".to_string()].into_iter().collect();
        let partial = doc.to_json(&filters).unwrap();
        assert!(partial.get("provs").is_none());
        assert_eq!(partial["texts"][0]["text"], json!("Body"));

        let mut broken = full;
        broken["provs"] = json!([]);
        assert!(Document::from_json(broken).is_err());
    }

    #[test]
    fn test_validate_catches_dangling_caption() {
        let mut doc = doc_with_provs(2);
        let mut table = TableEntity::new("", vec![0], vec![vec![json!("x")]]);
        table.captions.push(TextEntity::new("doc#/texts/0", vec![1], "Table 1"));
        doc.append_table(table).unwrap();
        assert!(doc.validate().is_ok());

        doc.provs.truncate(1);
        assert!(matches!(doc.validate(), Err(NormalizeError::InvalidDocument(_))));
    }
}
