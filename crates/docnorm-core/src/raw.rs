//! Access helpers for the raw extraction store.
//!
//! The raw store is the extractor's JSON document: a `main-text` array of
//! layout items (inline or `$ref` back-references) plus named collections
//! such as `tables` and `figures`. Items are addressed as
//! `#/<collection>/<index>`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key of the main-text sequence
pub const MAINTEXT_KEY: &str = "main-text";
/// Key of the reading-order stamp written onto main-text items
pub const PDF_ORDER_KEY: &str = "pdf-order";
/// Key of the location-provenance array on addressed items
pub const PROV_KEY: &str = "prov";
/// Key of an item's human label
pub const NAME_KEY: &str = "name";
/// Key of an item's semantic role
pub const TYPE_KEY: &str = "type";
/// Key of the optional file metadata object
pub const FILE_INFO_KEY: &str = "file-info";

/// Back-reference keys, in lookup order (`__ref` is the legacy spelling)
const REF_KEYS: [&str; 2] = ["$ref", "__ref"];

/// One location-provenance entry of a raw item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationProv {
    /// Page number
    pub page: usize,
    /// Bounding box, carried through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    /// Character span, carried through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<[usize; 2]>,
}

/// Address of a main-text item: its back-reference if present, else its own
/// slot in the main-text sequence.
#[must_use = "returns the item address"]
pub fn item_path(item: &Value, position: usize) -> String {
    REF_KEYS
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map_or_else(|| format!("#/{MAINTEXT_KEY}/{position}"), str::to_string)
}

/// Split `#/<base>/<index>[/...]` into `(base, index)`.
///
/// Only the second and third `/`-separated segments are looked at, so nested
/// addresses such as `#/tables/0/captions/1` resolve to their owning item.
#[must_use = "returns the parsed address"]
pub fn split_path(path: &str) -> Option<(&str, usize)> {
    let mut parts = path.split('/');
    let _anchor = parts.next()?;
    let base = parts.next()?;
    let index = parts.next()?.parse().ok()?;
    Some((base, index))
}

/// The main-text sequence, if the store has one.
#[inline]
#[must_use = "returns the main-text sequence"]
pub fn main_text(orig: &Value) -> Option<&Vec<Value>> {
    orig.get(MAINTEXT_KEY).and_then(Value::as_array)
}

/// Mutable access to the main-text sequence.
#[inline]
pub fn main_text_mut(orig: &mut Value) -> Option<&mut Vec<Value>> {
    orig.get_mut(MAINTEXT_KEY).and_then(Value::as_array_mut)
}

/// Look up `(collection, index)` in the raw store.
#[inline]
#[must_use = "returns the addressed item"]
pub fn lookup<'a>(orig: &'a Value, base: &str, index: usize) -> Option<&'a Value> {
    orig.get(base)?.as_array()?.get(index)
}

/// Look up an item by address.
#[must_use = "returns the addressed item"]
pub fn resolve<'a>(orig: &'a Value, path: &str) -> Option<&'a Value> {
    let (base, index) = split_path(path)?;
    lookup(orig, base, index)
}

/// String field of a raw item, empty when absent.
#[inline]
pub(crate) fn str_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
