//! Role tables for main-text item classification
//!
//! Every main-text item carries a `type` string assigned by the extractor
//! (`"paragraph"`, `"table"`, `"page-header"`, ...). The classifier maps that
//! string onto one of the [`ItemRole`] buckets using a [`RoleTables`] value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Item type of an explicit caption
pub const CAPTION_TYPE: &str = "caption";
/// Item type of a footnote
pub const FOOTNOTE_TYPE: &str = "footnote";
/// Item type of a table object
pub const TABLE_TYPE: &str = "table";
/// Item type of a figure object
pub const FIGURE_TYPE: &str = "figure";

/// Process-wide default role tables, built once and never mutated.
pub static DEFAULT_ROLES: LazyLock<RoleTables> = LazyLock::new(RoleTables::default);

/// Classification bucket for a main-text item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemRole {
    /// Running text (paragraphs, titles, captions, footnotes, formulas)
    Text,
    /// Table object
    Table,
    /// Figure object
    Figure,
    /// Page header furniture
    PageHeader,
    /// Page footer furniture
    PageFooter,
    /// Anything not covered by the role tables
    Other,
}

impl ItemRole {
    /// Name of the document collection holding entities of this role.
    ///
    /// This is also the path segment used in produced addresses
    /// (`#/<collection>/<index>`).
    #[inline]
    #[must_use = "returns the collection name"]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Text => "texts",
            Self::Table => "tables",
            Self::Figure => "figures",
            Self::PageHeader => "page_headers",
            Self::PageFooter => "page_footers",
            Self::Other => "other",
        }
    }

    /// Whether records of this role are excluded from the body flow.
    #[inline]
    #[must_use = "returns whether the role is ignored"]
    pub const fn is_ignored(self) -> bool {
        matches!(self, Self::PageHeader | Self::PageFooter | Self::Other)
    }
}

impl std::fmt::Display for ItemRole {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Table => "table",
            Self::Figure => "figure",
            Self::PageHeader => "page_header",
            Self::PageFooter => "page_footer",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Role sets used to bucket item types.
///
/// Lookups are tried in the order text, table, figure, page-header,
/// page-footer; anything left over is [`ItemRole::Other`]. The `ignored` set
/// lists roles that may land in `other` without an "unrecognized role"
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTables {
    pub text: BTreeSet<String>,
    pub table: BTreeSet<String>,
    pub figure: BTreeSet<String>,
    pub page_header: BTreeSet<String>,
    pub page_footer: BTreeSet<String>,
    pub ignored: BTreeSet<String>,
}

fn set_of(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for RoleTables {
    #[inline]
    fn default() -> Self {
        Self {
            text: set_of(&[
                "title",
                "subtitle-level-1",
                "paragraph",
                "list-item",
                "footnote",
                "caption",
                "formula",
                "equation",
            ]),
            table: set_of(&["table"]),
            figure: set_of(&["figure"]),
            page_header: set_of(&["page-header"]),
            page_footer: set_of(&["page-footer"]),
            ignored: set_of(&["page-header", "page-footer"]),
        }
    }
}

impl RoleTables {
    /// Add roles that may be bucketed as `other` silently.
    #[must_use = "returns the extended role tables"]
    pub fn with_ignored<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(extra.into_iter().map(Into::into));
        self
    }

    /// Bucket an item type.
    #[must_use = "returns the role of the item type"]
    pub fn role_of(&self, item_type: &str) -> ItemRole {
        if self.text.contains(item_type) {
            ItemRole::Text
        } else if self.table.contains(item_type) {
            ItemRole::Table
        } else if self.figure.contains(item_type) {
            ItemRole::Figure
        } else if self.page_header.contains(item_type) {
            ItemRole::PageHeader
        } else if self.page_footer.contains(item_type) {
            ItemRole::PageFooter
        } else {
            ItemRole::Other
        }
    }

    /// Whether an `other` item of this type is expected (no diagnostic).
    #[inline]
    #[must_use = "returns whether the type is benign"]
    pub fn is_benign(&self, item_type: &str) -> bool {
        self.ignored.contains(item_type)
    }
}
