//! Reading-order collaborators.
//!
//! The normalizer hands the document to a [`ReadingOrder`] after stamping
//! every main-text item with `pdf-order` and building provisional provenance.
//! The orderer rearranges `orig["main-text"]` in place; the normalizer then
//! rebuilds provenance from the new sequence.

use crate::document::Document;
use crate::raw;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Rearranges the raw main-text sequence into final reading order.
pub trait ReadingOrder: fmt::Debug + Send + Sync {
    /// Reorder `doc.orig["main-text"]` in place.
    ///
    /// `doc.provs` holds the provisional records, whose `order` is the
    /// item's current main-text position.
    fn reorder(&self, doc: &mut Document);

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Stable sort by (page, `pdf-order`).
///
/// Items without a provisional record keep their relative order after all
/// resolvable items.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageOrder;

impl ReadingOrder for PageOrder {
    fn reorder(&self, doc: &mut Document) {
        let pages: HashMap<usize, usize> = doc.provs.iter().map(|p| (p.order, p.page)).collect();

        let Some(main_text) = raw::main_text_mut(&mut doc.orig) else {
            return;
        };

        let mut keyed: Vec<(Option<usize>, usize, Value)> = std::mem::take(main_text)
            .into_iter()
            .enumerate()
            .map(|(position, item)| {
                let stamp = item
                    .get(raw::PDF_ORDER_KEY)
                    .and_then(Value::as_u64)
                    .and_then(|v| usize::try_from(v).ok())
                    .unwrap_or(position);
                (pages.get(&position).copied(), stamp, item)
            })
            .collect();

        keyed.sort_by_key(|(page, stamp, _)| (page.is_none(), *page, *stamp));
        *main_text = keyed.into_iter().map(|(_, _, item)| item).collect();
    }

    fn name(&self) -> &'static str {
        "page"
    }
}

/// Keeps the extraction order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreserveOrder;

impl ReadingOrder for PreserveOrder {
    fn reorder(&self, _doc: &mut Document) {}

    fn name(&self) -> &'static str {
        "preserve"
    }
}

/// Built-in orderers, selectable by name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    #[default]
    Page,
    Preserve,
}

impl OrderKind {
    /// Instantiate the orderer.
    #[must_use = "returns the orderer"]
    pub fn orderer(self) -> Box<dyn ReadingOrder> {
        match self {
            Self::Page => Box::new(PageOrder),
            Self::Preserve => Box::new(PreserveOrder),
        }
    }
}

impl fmt::Display for OrderKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Page => "page",
            Self::Preserve => "preserve",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "page" => Ok(Self::Page),
            "preserve" | "none" => Ok(Self::Preserve),
            _ => Err(format!("unknown reading order `{s}` (expected `page` or `preserve`)")),
        }
    }
}
