//! Shared command plumbing: option resolution, normalization and rendering.

use crate::config::NormalizeConfig;
use anyhow::{Context, Result};
use docnorm_core::{
    Document, JsonOptions, JsonSerializer, MaintextFlattener, NormalizeReport, Normalizer,
    NormalizerConfig, OrderKind, RoleTables, YamlOptions, YamlSerializer,
};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output format of a normalized document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (default)
    #[default]
    Json,
    /// YAML output
    Yaml,
}

impl OutputFormat {
    /// File extension for batch outputs
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(format!("unknown output format `{s}` (expected `json` or `yaml`)")),
        }
    }
}

/// Normalization and output settings after merging CLI flags and config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub order: OrderKind,
    pub separator: Option<String>,
    pub format: OutputFormat,
    pub compact: bool,
    pub filters: BTreeSet<String>,
    pub extra_ignored: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            order: OrderKind::default(),
            separator: None,
            format: OutputFormat::default(),
            compact: false,
            filters: BTreeSet::new(),
            extra_ignored: Vec::new(),
        }
    }
}

/// Command-line overrides; `None`/empty means "not given"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub order: Option<OrderKind>,
    pub format: Option<OutputFormat>,
    pub compact: bool,
    pub filters: Vec<String>,
}

impl Options {
    /// Resolve settings: CLI flags, then config, then defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config names an unknown order or format.
    pub fn resolve(cli: &Overrides, config: &NormalizeConfig) -> Result<Self> {
        let order = match (cli.order, config.order.as_deref()) {
            (Some(order), _) => order,
            (None, Some(name)) => OrderKind::from_str(name).map_err(anyhow::Error::msg)?,
            (None, None) => OrderKind::default(),
        };
        let format = match (cli.format, config.format.as_deref()) {
            (Some(format), _) => format,
            (None, Some(name)) => OutputFormat::from_str(name).map_err(anyhow::Error::msg)?,
            (None, None) => OutputFormat::default(),
        };
        let filters = if cli.filters.is_empty() {
            config.filters.clone().unwrap_or_default()
        } else {
            cli.filters.clone()
        };

        Ok(Self {
            order,
            separator: config.separator.clone(),
            format,
            compact: cli.compact || config.compact.unwrap_or(false),
            filters: filters.into_iter().collect(),
            extra_ignored: config.extra_ignored.clone().unwrap_or_default(),
        })
    }

    /// Build the normalizer these options describe.
    #[must_use]
    pub fn normalizer(&self) -> Normalizer {
        let roles = (!self.extra_ignored.is_empty())
            .then(|| RoleTables::default().with_ignored(self.extra_ignored.iter().cloned()));
        let flattener = self
            .separator
            .as_deref()
            .map_or_else(MaintextFlattener::default, MaintextFlattener::new);

        Normalizer::with_config(NormalizerConfig {
            roles,
            orderer: self.order.orderer(),
            flattener: Box::new(flattener),
        })
    }

    /// Serialize a document in the configured format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render(&self, doc: &Document) -> Result<String> {
        let text = match self.format {
            OutputFormat::Json => JsonSerializer::with_options(JsonOptions {
                pretty: !self.compact,
                filters: self.filters.clone(),
            })
            .serialize_document(doc)?,
            OutputFormat::Yaml => YamlSerializer::with_options(YamlOptions {
                filters: self.filters.clone(),
            })
            .serialize_document(doc)?,
        };
        Ok(text)
    }
}

/// Read and normalize one raw extraction file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a raw store, or
/// normalization fails.
pub fn normalize_file(path: &Path, normalizer: &Normalizer) -> Result<(Document, NormalizeReport)> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let mut doc = Document::from_raw_str(&content)
        .with_context(|| format!("Failed to load raw document: {}", path.display()))?;
    let report = normalizer
        .normalize(&mut doc)
        .with_context(|| format!("Failed to normalize: {}", path.display()))?;
    Ok((doc, report))
}

/// Output path for `input` inside `output_dir` (`<stem>.normalized.<ext>`).
#[must_use]
pub fn output_path(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "document".into(), |s| s.to_string_lossy());
    output_dir.join(format!("{stem}.normalized.{}", format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_precedence() {
        let config = NormalizeConfig {
            order: Some("preserve".to_string()),
            format: Some("yaml".to_string()),
            filters: Some(vec!["texts".to_string()]),
            ..NormalizeConfig::default()
        };

        let from_config = Options::resolve(&Overrides::default(), &config).unwrap();
        assert_eq!(from_config.order, OrderKind::Preserve);
        assert_eq!(from_config.format, OutputFormat::Yaml);
        assert!(from_config.filters.contains("texts"));

        let cli = Overrides {
            order: Some(OrderKind::Page),
            format: Some(OutputFormat::Json),
            compact: true,
            filters: vec!["provs".to_string()],
        };
        let from_cli = Options::resolve(&cli, &config).unwrap();
        assert_eq!(from_cli.order, OrderKind::Page);
        assert_eq!(from_cli.format, OutputFormat::Json);
        assert!(from_cli.compact);
        assert_eq!(from_cli.filters.len(), 1);
        assert!(from_cli.filters.contains("provs"));
    }

    #[test]
    fn test_resolve_rejects_unknown_values() {
        let config = NormalizeConfig {
            format: Some("xml".to_string()),
            ..NormalizeConfig::default()
        };
        assert!(Options::resolve(&Overrides::default(), &config).is_err());
    }

    #[test]
    fn test_normalizer_uses_extra_ignored() {
        let options = Options {
            extra_ignored: vec!["watermark".to_string()],
            ..Options::default()
        };
        assert!(options.normalizer().roles().is_benign("watermark"));
        assert!(!Options::default().normalizer().roles().is_benign("watermark"));
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("in/report.json"), Path::new("out"), OutputFormat::Yaml);
        assert_eq!(path, PathBuf::from("out/report.normalized.yaml"));
    }
}
