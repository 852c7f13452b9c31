//! Command-line interface for `docnorm-core`
//!
//! This crate provides the `docnorm` tool, which loads raw layout
//! extractions (the deep-search `main-text` JSON), normalizes them and writes
//! the typed document as JSON or YAML.
//!
//! # Quick Start
//!
//! ```bash
//! # Normalize one file to stdout
//! docnorm normalize extraction.json
//!
//! # Compact JSON with only the tables and provenance
//! docnorm normalize extraction.json --compact --filter tables --filter provs -o out.json
//!
//! # Normalize many files in parallel
//! docnorm batch data/*.json --output-dir normalized/ --parallel
//!
//! # Show counts and caption links without writing anything
//! docnorm inspect extraction.json
//! ```
//!
//! # Configuration
//!
//! Defaults are read from `~/.docnorm.toml` and `./.docnorm.toml` (see
//! [`config`]):
//!
//! ```toml
//! [normalize]
//! order = "page"        # or "preserve"
//! format = "json"       # or "yaml"
//! compact = false
//! separator = "\n\n"
//! filters = ["texts", "tables", "figures"]
//! extra_ignored = ["watermark"]
//! ```
//!
//! # Logging
//!
//! Diagnostics go through `env_logger` on stderr. The default level is
//! `warn`; `-v` enables `debug`, `-q` limits output to errors, and `RUST_LOG`
//! overrides both.
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - Error (for `batch`: at least one document failed)

pub mod config;
pub mod run;

pub use config::{Config, NormalizeConfig, CONFIG_FILE_NAME};
pub use run::{normalize_file, output_path, Options, OutputFormat, Overrides};
