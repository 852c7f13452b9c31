//! Entity classification: final provenance list to typed collections.

use crate::document::{Document, PROVS_SEGMENT};
use crate::entity::{FigureEntity, TableEntity, TextEntity};
use crate::labels::{ItemRole, RoleTables, DEFAULT_ROLES};
use crate::raw;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload seen for records whose target is gone from the raw store
static MISSING_ITEM: Value = Value::Null;

/// Diagnostic counts of one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyStats {
    /// Records bucketed as `other` with a role outside the benign set
    pub unrecognized_roles: usize,
    /// Text-like records discarded for an invalid payload
    pub discarded_texts: usize,
    /// Tables and figures kept despite an invalid payload
    pub invalid_objects: usize,
}

/// Buckets provenance records into the document's typed collections.
#[derive(Debug, Clone, Copy)]
pub struct EntityClassifier<'r> {
    roles: &'r RoleTables,
}

impl Default for EntityClassifier<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(&DEFAULT_ROLES)
    }
}

impl<'r> EntityClassifier<'r> {
    #[inline]
    #[must_use = "creates a new classifier"]
    pub const fn new(roles: &'r RoleTables) -> Self {
        Self { roles }
    }

    /// Rebuild every typed collection from `doc.provs`.
    ///
    /// Each record gets its self address (`#/provs/<i>`) and its `ignored`
    /// flag. Text-like entities with an invalid payload are discarded; tables
    /// and figures are always kept.
    pub fn classify(&self, doc: &mut Document) -> ClassifyStats {
        doc.texts.clear();
        doc.tables.clear();
        doc.figures.clear();
        doc.page_headers.clear();
        doc.page_footers.clear();
        doc.other.clear();

        let mut stats = ClassifyStats::default();

        for i in 0..doc.provs.len() {
            let role = self.roles.role_of(&doc.provs[i].item_type);
            let dloc = doc.entity_address(role, collection_len(doc, role));

            let prov = &mut doc.provs[i];
            prov.self_path = Some(format!("#/{PROVS_SEGMENT}/{i}"));
            prov.ignored = role.is_ignored();

            if role == ItemRole::Other && !self.roles.is_benign(&prov.item_type) {
                log::warn!("found new `other` type: {}", prov.item_type);
                stats.unrecognized_roles += 1;
            }

            let item = raw::resolve(&doc.orig, &doc.provs[i].path).unwrap_or(&MISSING_ITEM);

            match role {
                ItemRole::Table => {
                    let table = TableEntity::from_raw(dloc, i, item);
                    if !table.valid {
                        log::warn!("invalid table: {}", doc.provs[i].path);
                        stats.invalid_objects += 1;
                    }
                    doc.tables.push(table);
                }
                ItemRole::Figure => {
                    let figure = FigureEntity::from_raw(dloc, i, item);
                    if !figure.valid {
                        log::warn!("found figure without structure: {}", doc.provs[i].path);
                        stats.invalid_objects += 1;
                    }
                    doc.figures.push(figure);
                }
                ItemRole::Text | ItemRole::PageHeader | ItemRole::PageFooter | ItemRole::Other => {
                    let Some(text) = TextEntity::from_raw(dloc, i, item) else {
                        log::warn!("found invalid text: {item}");
                        stats.discarded_texts += 1;
                        continue;
                    };
                    let collection = match role {
                        ItemRole::Text => &mut doc.texts,
                        ItemRole::PageHeader => &mut doc.page_headers,
                        ItemRole::PageFooter => &mut doc.page_footers,
                        _ => &mut doc.other,
                    };
                    collection.push(text);
                }
            }
        }

        stats
    }
}

fn collection_len(doc: &Document, role: ItemRole) -> usize {
    match role {
        ItemRole::Text => doc.texts.len(),
        ItemRole::Table => doc.tables.len(),
        ItemRole::Figure => doc.figures.len(),
        ItemRole::PageHeader => doc.page_headers.len(),
        ItemRole::PageFooter => doc.page_footers.len(),
        ItemRole::Other => doc.other.len(),
    }
}
