//! Normalization orchestrator.
//!
//! Runs the stages in a fixed order:
//!
//! ```text
//! AssignReadingOrder -> BuildProvenance (provisional) -> ExternalSort
//!   -> BuildProvenance (final) -> Classify -> LinkCaptions -> FlattenText
//!   -> ResolvePaths
//! ```
//!
//! Per-item problems are logged and counted in the [`NormalizeReport`]; only
//! an internal-consistency failure aborts the run.

use crate::captions::CaptionLinker;
use crate::classify::EntityClassifier;
use crate::document::{Document, CAPTIONS_SEGMENT};
use crate::error::Result;
use crate::labels::{ItemRole, RoleTables, DEFAULT_ROLES};
use crate::maintext::{MaintextFlattener, TextFlattener};
use crate::order::{PageOrder, ReadingOrder};
use crate::provenance::{build_provenance, ProvIndex, ProvenanceRecord};
use crate::raw;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stages of a normalization run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    AssignReadingOrder,
    BuildProvenance,
    ExternalSort,
    Classify,
    LinkCaptions,
    FlattenText,
    ResolvePaths,
}

impl fmt::Display for Stage {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AssignReadingOrder => "assign-reading-order",
            Self::BuildProvenance => "build-provenance",
            Self::ExternalSort => "external-sort",
            Self::Classify => "classify",
            Self::LinkCaptions => "link-captions",
            Self::FlattenText => "flatten-text",
            Self::ResolvePaths => "resolve-paths",
        };
        write!(f, "{s}")
    }
}

/// What a normalization run did, beyond the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    /// Items in the raw main-text sequence
    pub main_text_items: usize,
    /// Items that produced no provenance record
    pub dropped_items: usize,
    /// Records bucketed as `other` with an unexpected role
    pub unrecognized_roles: usize,
    /// Text-like items discarded for an invalid payload
    pub discarded_texts: usize,
    /// Tables and figures kept despite an invalid payload
    pub invalid_objects: usize,
    /// Captions attached to tables and figures
    pub linked_captions: usize,
}

impl fmt::Display for NormalizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} main-text items, {} dropped, {} unrecognized roles, {} invalid texts discarded, \
             {} invalid tables/figures kept, {} captions linked",
            self.main_text_items,
            self.dropped_items,
            self.unrecognized_roles,
            self.discarded_texts,
            self.invalid_objects,
            self.linked_captions
        )
    }
}

/// Collaborators and tables used by a [`Normalizer`]
#[derive(Debug)]
pub struct NormalizerConfig {
    /// Custom role tables; `None` uses the process-wide defaults
    pub roles: Option<RoleTables>,
    pub orderer: Box<dyn ReadingOrder>,
    pub flattener: Box<dyn TextFlattener>,
}

impl Default for NormalizerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            roles: None,
            orderer: Box::new(PageOrder),
            flattener: Box::new(MaintextFlattener::default()),
        }
    }
}

/// Turns a raw extraction into typed collections with linked captions.
#[derive(Debug, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Create a normalizer with the default role tables and collaborators.
    #[inline]
    #[must_use = "normalizer is created but not used"]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use = "normalizer is created but not used"]
    pub const fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Role tables in effect
    #[inline]
    #[must_use]
    pub fn roles(&self) -> &RoleTables {
        self.config.roles.as_ref().unwrap_or(&*DEFAULT_ROLES)
    }

    /// Run every stage on `doc`, replacing all derived collections.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NormalizeError::Consistency`] if caption linking
    /// finds a link without an owning entity. Stages before the failing one
    /// have been applied.
    pub fn normalize(&self, doc: &mut Document) -> Result<NormalizeReport> {
        let mut report = NormalizeReport::default();

        log::debug!("Stage {}: stamping main-text order", Stage::AssignReadingOrder);
        report.main_text_items = assign_reading_order(&mut doc.orig);

        log::debug!("Stage {}: provisional records", Stage::BuildProvenance);
        doc.clear();
        doc.provs = build_provenance(&doc.orig);
        log::debug!("  -> {} provisional records", doc.provs.len());

        log::debug!("Stage {}: {} orderer", Stage::ExternalSort, self.config.orderer.name());
        self.config.orderer.reorder(doc);

        log::debug!("Stage {}: final records", Stage::BuildProvenance);
        doc.provs = build_provenance(&doc.orig);
        report.dropped_items = report.main_text_items.saturating_sub(doc.provs.len());
        log::debug!(
            "  -> {} records, {} dropped",
            doc.provs.len(),
            report.dropped_items
        );

        log::debug!("Stage {}: bucketing records", Stage::Classify);
        let classified = EntityClassifier::new(self.roles()).classify(doc);
        report.unrecognized_roles = classified.unrecognized_roles;
        report.discarded_texts = classified.discarded_texts;
        report.invalid_objects = classified.invalid_objects;
        log::debug!(
            "  -> {} texts, {} tables, {} figures",
            doc.texts.len(),
            doc.tables.len(),
            doc.figures.len()
        );

        log::debug!("Stage {}: linking captions", Stage::LinkCaptions);
        let linked = CaptionLinker::new(self.roles()).link(doc)?;
        report.linked_captions = linked.linked();
        log::debug!(
            "  -> {} adjacent, {} fallback, {} pruned",
            linked.adjacent,
            linked.fallback,
            linked.pruned
        );

        log::debug!("Stage {}: flattening body text", Stage::FlattenText);
        self.config.flattener.filter(doc);
        doc.maintext = self.config.flattener.concatenate(doc);

        log::debug!("Stage {}: rewriting provenance paths", Stage::ResolvePaths);
        resolve_paths(doc);

        Ok(report)
    }
}

/// Stamp every main-text item with its position under `pdf-order`.
///
/// Returns the number of main-text items (zero, with a warning, when the
/// store has no main-text sequence).
pub fn assign_reading_order(orig: &mut Value) -> usize {
    let Some(main_text) = raw::main_text_mut(orig) else {
        log::warn!("no `{}` identified", raw::MAINTEXT_KEY);
        return 0;
    };

    for (position, item) in main_text.iter_mut().enumerate() {
        if let Some(item) = item.as_object_mut() {
            item.insert(raw::PDF_ORDER_KEY.to_string(), Value::from(position));
        }
    }
    main_text.len()
}

/// Rewrite provenance paths to the final addressing scheme.
///
/// Records owned by an entity point at `#/<collection>/<i>`; records owned by
/// a linked caption point at `#/<tables|figures>/<i>/captions/<k>`.
pub fn resolve_paths(doc: &mut Document) {
    let provs = &mut doc.provs;

    let text_collections = [
        (ItemRole::Text, &doc.texts),
        (ItemRole::PageHeader, &doc.page_headers),
        (ItemRole::PageFooter, &doc.page_footers),
        (ItemRole::Other, &doc.other),
    ];
    for (role, entities) in text_collections {
        for (i, entity) in entities.iter().enumerate() {
            rewrite(provs, &entity.provs, &format!("#/{}/{i}", role.collection()));
        }
    }

    let tables = ItemRole::Table.collection();
    for (i, table) in doc.tables.iter().enumerate() {
        rewrite(provs, &table.provs, &format!("#/{tables}/{i}"));
        for (k, caption) in table.captions.iter().enumerate() {
            rewrite(provs, &caption.provs, &format!("#/{tables}/{i}/{CAPTIONS_SEGMENT}/{k}"));
        }
    }

    let figures = ItemRole::Figure.collection();
    for (i, figure) in doc.figures.iter().enumerate() {
        rewrite(provs, &figure.provs, &format!("#/{figures}/{i}"));
        for (k, caption) in figure.captions.iter().enumerate() {
            rewrite(provs, &caption.provs, &format!("#/{figures}/{i}/{CAPTIONS_SEGMENT}/{k}"));
        }
    }
}

fn rewrite(provs: &mut [ProvenanceRecord], owned: &[ProvIndex], path: &str) {
    for &ind in owned {
        if let Some(record) = provs.get_mut(ind) {
            record.path = path.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::PreserveOrder;
    use serde_json::json;

    fn sample() -> Document {
        Document::from_raw(json!({
            "file-info": {"filename": "sample.pdf"},
            "main-text": [
                {"text": "Intro", "type": "paragraph", "name": "Text", "prov": [{"page": 1}]},
                {"$ref": "#/tables/0", "type": "table", "name": "Table"},
                {"text": "Table 1: Results", "type": "caption", "name": "Caption",
                 "prov": [{"page": 1}]},
                {"text": "Outro", "type": "paragraph", "name": "Text", "prov": [{"page": 1}]}
            ],
            "tables": [{"data": [["a", "b"]], "prov": [{"page": 1}]}]
        }))
        .unwrap()
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::LinkCaptions.to_string(), "link-captions");
        assert_eq!(Stage::AssignReadingOrder.to_string(), "assign-reading-order");
        assert_eq!(
            serde_json::to_string(&Stage::ResolvePaths).unwrap(),
            "\"resolve-paths\""
        );
    }

    #[test]
    fn test_assign_reading_order_stamps_positions() {
        let mut orig = json!({"main-text": [{"text": "a"}, {"text": "b"}]});
        assert_eq!(assign_reading_order(&mut orig), 2);
        assert_eq!(orig["main-text"][1]["pdf-order"], json!(1));

        let mut empty = json!({"tables": []});
        assert_eq!(assign_reading_order(&mut empty), 0);
    }

    #[test]
    fn test_normalize_end_to_end() {
        let mut doc = sample();
        let report = Normalizer::new().normalize(&mut doc).unwrap();

        assert_eq!(report.main_text_items, 4);
        assert_eq!(report.dropped_items, 0);
        assert_eq!(report.linked_captions, 1);

        assert_eq!(doc.texts.len(), 2);
        assert_eq!(doc.tables[0].captions.len(), 1);
        assert_eq!(doc.maintext, "Intro\n\nOutro");

        let paths: Vec<_> = doc.provs.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["#/texts/0", "#/tables/0", "#/tables/0/captions/0", "#/texts/1"]
        );
        assert_eq!(doc.texts[0].dloc, "sample.pdf#/texts/0");
    }

    #[test]
    fn test_normalize_twice_is_stable() {
        let mut doc = sample();
        let normalizer = Normalizer::with_config(NormalizerConfig {
            orderer: Box::new(PreserveOrder),
            ..NormalizerConfig::default()
        });
        normalizer.normalize(&mut doc).unwrap();
        let first = doc.clone();
        normalizer.normalize(&mut doc).unwrap();
        assert_eq!(doc, first);
    }

    #[test]
    fn test_custom_roles() {
        let mut doc = sample();
        let mut roles = RoleTables::default();
        roles.text.remove("caption");
        let normalizer = Normalizer::with_config(NormalizerConfig {
            roles: Some(roles),
            ..NormalizerConfig::default()
        });
        let report = normalizer.normalize(&mut doc).unwrap();
        assert_eq!(report.unrecognized_roles, 1);
        assert_eq!(doc.other.len(), 1);
        assert_eq!(report.linked_captions, 0);
    }

    #[test]
    fn test_report_display() {
        let report = NormalizeReport {
            main_text_items: 3,
            linked_captions: 1,
            ..NormalizeReport::default()
        };
        assert!(report.to_string().starts_with("3 main-text items"));
    }
}
