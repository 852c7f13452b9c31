//! Caption linking.
//!
//! Captions are attached to the table or figure they describe and removed
//! from the body text. Linking works on provenance positions (indices into
//! the final `provs` list) and page numbers only:
//!
//! 1. Adjacency: a caption-typed record directly before or after an object on
//!    the same page is linked to it. An object can collect one caption on each
//!    side; a caption is linked at most once.
//! 2. Fallback: an object with no adjacent caption scans the text entities on
//!    its page that start with "tab" (tables) or "fig" (figures). Every
//!    unassigned candidate replaces the previous one, so the last candidate
//!    wins.
//! 3. Assignment appends the caption text entities to their owners.
//! 4. Pruning removes assigned captions from `texts`.

use crate::document::Document;
use crate::error::{NormalizeError, Result};
use crate::labels::{ItemRole, RoleTables, CAPTION_TYPE, DEFAULT_ROLES, FOOTNOTE_TYPE};
use crate::normalize::Stage;
use crate::provenance::ProvIndex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Text prefix marking a table caption candidate
const TABLE_PREFIX: &str = "tab";
/// Text prefix marking a figure caption candidate
const FIGURE_PREFIX: &str = "fig";

/// Outcome of one linking pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    /// Captions linked by adjacency
    pub adjacent: usize,
    /// Captions linked by the text-prefix fallback
    pub fallback: usize,
    /// Text entities removed from `texts`
    pub pruned: usize,
}

impl LinkStats {
    /// Total captions linked
    #[inline]
    #[must_use = "returns the number of linked captions"]
    pub const fn linked(&self) -> usize {
        self.adjacent + self.fallback
    }
}

/// Per-page partition of provenance positions
#[derive(Debug, Default)]
struct PageIndex {
    all: BTreeSet<ProvIndex>,
    objects: BTreeSet<ProvIndex>,
    tables: BTreeSet<ProvIndex>,
    figures: BTreeSet<ProvIndex>,
    texts: BTreeSet<ProvIndex>,
    captions: BTreeSet<ProvIndex>,
    footnotes: BTreeSet<ProvIndex>,
    table_candidates: BTreeSet<ProvIndex>,
    figure_candidates: BTreeSet<ProvIndex>,
}

/// Where an entity lives in its collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Table(usize),
    Figure(usize),
}

/// Indices and links of a single linking pass; discarded afterwards.
#[derive(Debug, Default)]
struct LinkState {
    pages: BTreeMap<usize, PageIndex>,
    assigned: HashSet<ProvIndex>,
    obj_to_caption: BTreeMap<ProvIndex, Vec<ProvIndex>>,
    prov_to_text: HashMap<ProvIndex, usize>,
    prov_to_object: HashMap<ProvIndex, Owner>,
}

impl LinkState {
    fn build(doc: &Document, roles: &RoleTables) -> Self {
        let mut state = Self::default();

        for (i, text) in doc.texts.iter().enumerate() {
            for &prov in &text.provs {
                state.prov_to_text.insert(prov, i);
            }
        }
        for (i, table) in doc.tables.iter().enumerate() {
            for &prov in &table.provs {
                state.prov_to_object.insert(prov, Owner::Table(i));
            }
        }
        for (i, figure) in doc.figures.iter().enumerate() {
            for &prov in &figure.provs {
                state.prov_to_object.insert(prov, Owner::Figure(i));
            }
        }

        for (i, prov) in doc.provs.iter().enumerate() {
            let page = state.pages.entry(prov.page).or_default();
            page.all.insert(i);

            match roles.role_of(&prov.item_type) {
                ItemRole::Table => {
                    page.objects.insert(i);
                    page.tables.insert(i);
                }
                ItemRole::Figure => {
                    page.objects.insert(i);
                    page.figures.insert(i);
                }
                _ if prov.item_type == CAPTION_TYPE => {
                    // a caption whose payload was discarded has nothing to attach
                    if state.prov_to_text.contains_key(&i) {
                        page.captions.insert(i);
                    } else {
                        log::warn!(
                            "caption record {i} on page {} has no text entity, skipped for linking",
                            prov.page
                        );
                    }
                }
                _ if prov.item_type == FOOTNOTE_TYPE => {
                    page.footnotes.insert(i);
                }
                ItemRole::Text => {
                    page.texts.insert(i);
                }
                _ => {}
            }
        }

        for text in &doc.texts {
            let Some(&first) = text.provs.first() else {
                continue;
            };
            let Some(prov) = doc.provs.get(first) else {
                continue;
            };
            let Some(page) = state.pages.get_mut(&prov.page) else {
                continue;
            };
            let content = text.heuristic_text();
            if content.starts_with(TABLE_PREFIX) {
                page.table_candidates.insert(first);
            } else if content.starts_with(FIGURE_PREFIX) {
                page.figure_candidates.insert(first);
            }
        }

        for (page_num, page) in &state.pages {
            log::debug!(
                "page {page_num}: {} items, {} objects, {} texts, {} captions, {} footnotes",
                page.all.len(),
                page.objects.len(),
                page.texts.len(),
                page.captions.len(),
                page.footnotes.len()
            );
            for &obj in &page.objects {
                state.obj_to_caption.insert(obj, Vec::new());
            }
        }

        state
    }

    /// Link caption-typed neighbours (i-1, then i+1) on the same page.
    fn link_adjacent(&mut self) -> usize {
        let mut linked = 0;
        for page in self.pages.values() {
            for &obj in &page.objects {
                let neighbours = [obj.checked_sub(1), obj.checked_add(1)];
                for cand in neighbours.into_iter().flatten() {
                    if page.all.contains(&cand)
                        && page.captions.contains(&cand)
                        && self.assigned.insert(cand)
                    {
                        self.obj_to_caption.entry(obj).or_default().push(cand);
                        linked += 1;
                    }
                }
            }
        }
        linked
    }

    /// Give objects without an adjacent caption the last unassigned
    /// prefix candidate on their page.
    ///
    /// Every unassigned candidate visited is marked assigned and replaces the
    /// previous link, so earlier candidates end up attached to nothing.
    fn link_fallback(&mut self) -> usize {
        let mut linked = 0;
        for page in self.pages.values() {
            for &obj in &page.objects {
                if self.obj_to_caption.get(&obj).is_some_and(|c| !c.is_empty()) {
                    continue;
                }
                let candidates = if page.tables.contains(&obj) {
                    &page.table_candidates
                } else {
                    &page.figure_candidates
                };
                for &cand in candidates {
                    if self.assigned.insert(cand) {
                        self.obj_to_caption.insert(obj, vec![cand]);
                    }
                }
                if self.obj_to_caption.get(&obj).is_some_and(|c| !c.is_empty()) {
                    linked += 1;
                }
            }
        }
        linked
    }

    /// Resolve every link to (owner, caption text index) pairs, in ascending
    /// object order then link order.
    fn resolve(&self) -> Result<Vec<(Owner, usize)>> {
        let mut pairs = Vec::new();
        for (&obj, captions) in &self.obj_to_caption {
            if captions.is_empty() {
                continue;
            }
            let owner = *self.prov_to_object.get(&obj).ok_or_else(|| {
                NormalizeError::consistency(
                    Stage::LinkCaptions,
                    format!("object provenance {obj} has no table or figure entity"),
                )
            })?;
            for &cap in captions {
                let text = *self.prov_to_text.get(&cap).ok_or_else(|| {
                    NormalizeError::consistency(
                        Stage::LinkCaptions,
                        format!("caption provenance {cap} has no text entity"),
                    )
                })?;
                pairs.push((owner, text));
            }
        }
        Ok(pairs)
    }
}

/// Links captions to tables and figures.
#[derive(Debug, Clone, Copy)]
pub struct CaptionLinker<'r> {
    roles: &'r RoleTables,
}

impl Default for CaptionLinker<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(&DEFAULT_ROLES)
    }
}

impl<'r> CaptionLinker<'r> {
    #[inline]
    #[must_use = "creates a new caption linker"]
    pub const fn new(roles: &'r RoleTables) -> Self {
        Self { roles }
    }

    /// Link, assign and prune captions of a classified document.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Consistency`] if a linked position has no
    /// owning entity. The document is left untouched in that case.
    pub fn link(&self, doc: &mut Document) -> Result<LinkStats> {
        let mut state = LinkState::build(doc, self.roles);

        let adjacent = state.link_adjacent();
        let fallback = state.link_fallback();
        let pairs = state.resolve()?;

        for (owner, text) in pairs {
            let caption = doc.texts[text].clone();
            match owner {
                Owner::Table(t) => {
                    log::debug!(
                        "assigning caption {} to table {}",
                        caption.dloc,
                        doc.tables[t].dloc
                    );
                    doc.tables[t].captions.push(caption);
                }
                Owner::Figure(f) => {
                    log::debug!(
                        "assigning caption {} to figure {}",
                        caption.dloc,
                        doc.figures[f].dloc
                    );
                    doc.figures[f].captions.push(caption);
                }
            }
        }

        let pruned = prune_captions(doc);

        Ok(LinkStats {
            adjacent,
            fallback,
            pruned,
        })
    }
}

/// Drop every text entity sharing provenance with a linked caption.
fn prune_captions(doc: &mut Document) -> usize {
    let caption_provs: HashSet<ProvIndex> = doc
        .tables
        .iter()
        .flat_map(|t| &t.captions)
        .chain(doc.figures.iter().flat_map(|f| &f.captions))
        .flat_map(|c| c.provs.iter().copied())
        .collect();

    let before = doc.texts.len();
    doc.texts
        .retain(|text| !text.provs.iter().any(|p| caption_provs.contains(p)));
    before - doc.texts.len()
}
