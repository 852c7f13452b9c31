//! Typed document entities.
//!
//! Entities own provenance by index into the document's `provs` list rather
//! than by reference, so a record can be rewritten (path resolution) without
//! touching the entities that point at it.

use crate::provenance::ProvIndex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text-like entity (paragraphs, titles, captions, headers, footers, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntity {
    /// Address assigned at creation (e.g. "doc#/texts/3")
    pub dloc: String,
    /// Provenance records owned by this entity
    pub provs: Vec<ProvIndex>,
    /// Human label of the source item
    #[serde(default)]
    pub name: String,
    /// Text content
    pub text: String,
}

impl TextEntity {
    /// Creates a text entity owning the given provenance records.
    #[inline]
    #[must_use = "creates a new text entity"]
    pub fn new(dloc: impl Into<String>, provs: Vec<ProvIndex>, text: impl Into<String>) -> Self {
        Self {
            dloc: dloc.into(),
            provs,
            name: String::new(),
            text: text.into(),
        }
    }

    /// Extract a text entity from a raw item.
    ///
    /// Returns `None` when the item has no string `text`.
    #[must_use = "returns the extracted entity"]
    pub fn from_raw(dloc: impl Into<String>, prov: ProvIndex, item: &Value) -> Option<Self> {
        let text = item.get("text")?.as_str()?;
        Some(Self {
            dloc: dloc.into(),
            provs: vec![prov],
            name: crate::raw::str_field(item, crate::raw::NAME_KEY),
            text: text.to_string(),
        })
    }

    /// Text used by the caption prefix heuristic: lower-cased, trimmed.
    #[inline]
    #[must_use = "returns the normalized text"]
    pub fn heuristic_text(&self) -> String {
        self.text.trim().to_lowercase()
    }
}

/// Table entity with its linked captions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableEntity {
    pub dloc: String,
    pub provs: Vec<ProvIndex>,
    pub num_rows: usize,
    pub num_cols: usize,
    /// Cell grid, carried verbatim from the raw item
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Vec<Value>>,
    /// Whether the raw item had a well-formed grid
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub captions: Vec<TextEntity>,
}

impl TableEntity {
    /// Creates a table entity from a cell grid.
    #[must_use = "creates a new table entity"]
    pub fn new(dloc: impl Into<String>, provs: Vec<ProvIndex>, data: Vec<Vec<Value>>) -> Self {
        let num_rows = data.len();
        let num_cols = data.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            dloc: dloc.into(),
            provs,
            num_rows,
            num_cols,
            data,
            valid: true,
            captions: Vec::new(),
        }
    }

    /// Extract a table entity from a raw item.
    ///
    /// Always yields an entity; `valid` is false when `data` is missing or is
    /// not an array of arrays.
    #[must_use = "returns the extracted entity"]
    pub fn from_raw(dloc: impl Into<String>, prov: ProvIndex, item: &Value) -> Self {
        let grid: Option<Vec<Vec<Value>>> = item
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.iter().map(|row| row.as_array().cloned()).collect());

        let Some(grid) = grid else {
            return Self {
                dloc: dloc.into(),
                provs: vec![prov],
                valid: false,
                ..Self::default()
            };
        };

        let mut table = Self::new(dloc, vec![prov], grid);
        let declared = |key: &str| {
            item.get(key)
                .and_then(Value::as_u64)
                .and_then(|v| usize::try_from(v).ok())
        };
        if let Some(rows) = declared("#-rows") {
            table.num_rows = rows;
        }
        if let Some(cols) = declared("#-cols") {
            table.num_cols = cols;
        }
        table
    }

    /// Whether the grid is non-empty and rectangular.
    #[must_use = "returns whether the grid is well formed"]
    pub fn is_well_formed(&self) -> bool {
        !self.data.is_empty() && self.data.iter().all(|row| row.len() == self.num_cols)
    }
}

/// Figure entity with its linked captions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FigureEntity {
    pub dloc: String,
    pub provs: Vec<ProvIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub captions: Vec<TextEntity>,
}

impl FigureEntity {
    /// Extract a figure entity from a raw item; `valid` is false without a
    /// non-null `data` value.
    #[must_use = "returns the extracted entity"]
    pub fn from_raw(dloc: impl Into<String>, prov: ProvIndex, item: &Value) -> Self {
        let data = item.get("data").filter(|v| !v.is_null()).cloned();
        Self {
            dloc: dloc.into(),
            provs: vec![prov],
            valid: data.is_some(),
            data,
            captions: Vec::new(),
        }
    }
}

/// Any document entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Text(TextEntity),
    Table(TableEntity),
    Figure(FigureEntity),
}

impl Entity {
    /// Address assigned at creation
    #[inline]
    #[must_use = "returns the entity address"]
    pub fn dloc(&self) -> &str {
        match self {
            Self::Text(e) => &e.dloc,
            Self::Table(e) => &e.dloc,
            Self::Figure(e) => &e.dloc,
        }
    }

    /// Owned provenance indices
    #[inline]
    #[must_use = "returns the provenance indices"]
    pub fn provs(&self) -> &[ProvIndex] {
        match self {
            Self::Text(e) => &e.provs,
            Self::Table(e) => &e.provs,
            Self::Figure(e) => &e.provs,
        }
    }

    /// Linked captions (always empty for text)
    #[inline]
    #[must_use = "returns the linked captions"]
    pub fn captions(&self) -> &[TextEntity] {
        match self {
            Self::Text(_) => &[],
            Self::Table(e) => &e.captions,
            Self::Figure(e) => &e.captions,
        }
    }

    /// Text content, if this is a text entity
    #[inline]
    #[must_use = "returns the text content if applicable"]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(e) => Some(&e.text),
            Self::Table(_) | Self::Figure(_) => None,
        }
    }
}

/// Borrowed view of an entity stored in a document collection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRef<'a> {
    Text(&'a TextEntity),
    Table(&'a TableEntity),
    Figure(&'a FigureEntity),
}

impl<'a> EntityRef<'a> {
    #[inline]
    #[must_use = "returns the entity address"]
    pub fn dloc(self) -> &'a str {
        match self {
            Self::Text(e) => &e.dloc,
            Self::Table(e) => &e.dloc,
            Self::Figure(e) => &e.dloc,
        }
    }

    #[inline]
    #[must_use = "returns the provenance indices"]
    pub fn provs(self) -> &'a [ProvIndex] {
        match self {
            Self::Text(e) => &e.provs,
            Self::Table(e) => &e.provs,
            Self::Figure(e) => &e.provs,
        }
    }

    /// Clone into an owned [`Entity`].
    #[must_use = "returns an owned copy"]
    pub fn to_owned_entity(self) -> Entity {
        match self {
            Self::Text(e) => Entity::Text(e.clone()),
            Self::Table(e) => Entity::Table(e.clone()),
            Self::Figure(e) => Entity::Figure(e.clone()),
        }
    }
}

impl std::fmt::Display for Entity {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Self::Text(_) => "text",
            Self::Table(_) => "table",
            Self::Figure(_) => "figure",
        };
        write!(f, "{variant} ({})", self.dloc())
    }
}
