//! Property-Based Tests
//!
//! Random raw stores run through the full pipeline must keep the document
//! invariants:
//! - Provenance rebuild is idempotent
//! - Every record is owned by exactly one entity
//! - A caption is linked to at most one object
//! - Linked captions never remain in `texts`
//! - Every final path resolves back to its owner

mod common;

use common::{caption_provs, prov_owners, RawDoc};
use docnorm_core::{build_provenance, JsonSerializer, Normalizer};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Item {
    Paragraph(&'static str),
    Caption(&'static str),
    Table,
    Figure,
    Header,
    Blank,
    Unlocated,
}

fn item_strategy() -> impl Strategy<Value = (Item, usize)> {
    let item = prop_oneof![
        4 => prop::sample::select(vec![
            "Body text",
            "Table 4 shows",
            "Figure 2 plots",
            "tab. 7",
            "Fig. 1",
        ])
        .prop_map(Item::Paragraph),
        2 => prop::sample::select(vec!["Table 1: Results", "Figure 3: Setup", "Summary"])
            .prop_map(Item::Caption),
        2 => Just(Item::Table),
        2 => Just(Item::Figure),
        1 => Just(Item::Header),
        1 => Just(Item::Blank),
        1 => Just(Item::Unlocated),
    ];
    (item, 1usize..4)
}

fn items_strategy(max_len: usize) -> impl Strategy<Value = Vec<(Item, usize)>> {
    prop::collection::vec(item_strategy(), 0..max_len)
}

fn build(items: &[(Item, usize)]) -> RawDoc {
    items.iter().fold(RawDoc::new(), |raw, (item, page)| match item {
        Item::Paragraph(text) => raw.paragraph(*page, text),
        Item::Caption(text) => raw.caption(*page, text),
        Item::Table => raw.table(*page),
        Item::Figure => raw.figure(*page),
        Item::Header => raw.text("page-header", *page, "Running title"),
        Item::Blank => raw.paragraph(*page, "   "),
        Item::Unlocated => raw.unlocated("lost"),
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: rebuilding provenance twice yields the same records
    #[test]
    fn proptest_provenance_rebuild_idempotent(items in items_strategy(40)) {
        let mut doc = build(&items).document();
        Normalizer::new().normalize(&mut doc).unwrap();
        prop_assert_eq!(build_provenance(&doc.orig), build_provenance(&doc.orig));
    }

    /// Property: every record belongs to exactly one entity
    #[test]
    fn proptest_partition_completeness(items in items_strategy(40)) {
        let raw = build(&items);
        let unlocated = items.iter().filter(|(i, _)| matches!(i, Item::Unlocated)).count();
        let mut doc = raw.document();
        let report = Normalizer::new().normalize(&mut doc).unwrap();

        prop_assert_eq!(report.dropped_items, unlocated);
        prop_assert_eq!(doc.provs.len(), items.len() - unlocated);

        let owners = prov_owners(&doc);
        prop_assert_eq!(owners.len(), doc.provs.len());
        prop_assert!(owners.values().all(|&n| n == 1));
    }

    /// Property: captions are linked at most once and pruned from `texts`
    #[test]
    fn proptest_caption_exclusivity_and_pruning(items in items_strategy(40)) {
        let mut doc = build(&items).document();
        let report = Normalizer::new().normalize(&mut doc).unwrap();

        let linked = caption_provs(&doc);
        let unique: HashSet<_> = linked.iter().copied().collect();
        prop_assert_eq!(unique.len(), linked.len());
        prop_assert_eq!(report.linked_captions, linked.len());

        for text in &doc.texts {
            prop_assert!(text.provs.iter().all(|p| !unique.contains(p)));
        }
        for prov in &linked {
            prop_assert_eq!(doc.provs[*prov].page, page_of_owner(&doc, *prov));
        }
    }

    /// Property: every final path addresses the entity owning the record
    #[test]
    fn proptest_paths_resolve(items in items_strategy(40)) {
        let mut doc = build(&items).document();
        Normalizer::new().normalize(&mut doc).unwrap();

        for (i, prov) in doc.provs.iter().enumerate() {
            let entity = doc.find_by_path(&prov.path);
            prop_assert!(entity.is_some(), "unresolved path {}", prov.path);
            prop_assert!(entity.is_some_and(|e| e.provs().contains(&i)));
        }
    }

    /// Property: normalized documents survive a JSON dump and reload
    #[test]
    fn proptest_json_dump_reload(items in items_strategy(20)) {
        let mut doc = build(&items).document();
        Normalizer::new().normalize(&mut doc).unwrap();

        let json = JsonSerializer::new().serialize_document(&doc).unwrap();
        let parsed = JsonSerializer::deserialize_document(&json).unwrap();
        prop_assert_eq!(parsed, doc);
    }
}

/// Page of the table or figure a caption record is attached to
fn page_of_owner(doc: &docnorm_core::Document, caption: usize) -> usize {
    let owner = doc
        .tables
        .iter()
        .filter(|t| t.captions.iter().any(|c| c.provs.contains(&caption)))
        .map(|t| t.provs[0])
        .chain(
            doc.figures
                .iter()
                .filter(|f| f.captions.iter().any(|c| c.provs.contains(&caption)))
                .map(|f| f.provs[0]),
        )
        .next()
        .expect("linked caption has an owner");
    doc.provs[owner].page
}
