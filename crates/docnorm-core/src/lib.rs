//! # docnorm-core - Document Normalization
//!
//! Turns the raw, loosely ordered output of a PDF layout extractor into a
//! typed document: provenance records in reading order, text/table/figure
//! collections, and captions attached to the objects they describe.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docnorm_core::{Document, JsonSerializer, Normalizer, Result};
//!
//! fn main() -> Result<()> {
//!     let raw = std::fs::read_to_string("extraction.json")?;
//!     let mut doc = Document::from_raw_str(&raw)?;
//!
//!     let report = Normalizer::new().normalize(&mut doc)?;
//!     println!("{report}");
//!
//!     for table in &doc.tables {
//!         println!("{}: {} captions", table.dloc, table.captions.len());
//!     }
//!     println!("{}", JsonSerializer::new().serialize_document(&doc)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module |
//! |-------|--------|
//! | Stamp raw order, rebuild provenance | [`normalize`], [`provenance`] |
//! | Reading order (pluggable) | [`order`] |
//! | Bucket records into collections | [`classify`] |
//! | Attach captions, prune body text | [`captions`] |
//! | Flatten body text (pluggable) | [`maintext`] |
//! | Final addresses (`#/tables/0/captions/0`) | [`normalize::resolve_paths`] |
//!
//! Normalizing never mutates shared state: independent documents can be
//! processed on separate threads with one [`Normalizer`] each, or a shared
//! one behind a reference.

pub mod captions;
pub mod classify;
pub mod document;
pub mod entity;
pub mod error;
pub mod labels;
pub mod maintext;
pub mod normalize;
pub mod order;
pub mod provenance;
pub mod raw;
pub mod serializer;

pub use captions::{CaptionLinker, LinkStats};
pub use classify::{ClassifyStats, EntityClassifier};
pub use document::{Document, DocumentStats};
pub use entity::{Entity, EntityRef, FigureEntity, TableEntity, TextEntity};
pub use error::{NormalizeError, Result};
pub use labels::{ItemRole, RoleTables, DEFAULT_ROLES};
pub use maintext::{MaintextFlattener, TextFlattener};
pub use normalize::{NormalizeReport, Normalizer, NormalizerConfig, Stage};
pub use order::{OrderKind, PageOrder, PreserveOrder, ReadingOrder};
pub use provenance::{build_provenance, ProvIndex, ProvenanceRecord};
pub use serializer::{JsonOptions, JsonSerializer, YamlOptions, YamlSerializer};
