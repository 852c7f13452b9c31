//! docnorm - normalize raw PDF layout extractions
//!
//! Thin command-line wrapper around `docnorm-core`; see the crate docs for
//! usage and configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use docnorm_cli::{normalize_file, output_path, Config, Options, OutputFormat, Overrides};
use docnorm_core::{Document, NormalizeReport, OrderKind};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Debug logging of every pipeline stage
    Verbose,
}

impl Verbosity {
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Default `env_logger` filter, overridable through `RUST_LOG`
    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "debug",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "docnorm",
    about = "Normalize raw PDF layout extractions",
    long_about = "Normalize raw PDF layout extractions into typed documents.\n\
                  \n\
                  Items are put in reading order, bucketed into texts, tables, figures,\n\
                  page headers/footers and other, and captions are linked to their tables\n\
                  and figures.",
    version
)]
struct Args {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log every pipeline stage
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Use this config file instead of ~/.docnorm.toml and ./.docnorm.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Normalize one raw extraction
    Normalize {
        /// Raw extraction (JSON with a `main-text` array)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Compact JSON output
        #[arg(long)]
        compact: bool,

        /// Only emit these top-level fields (repeatable)
        #[arg(long = "filter", value_name = "FIELD")]
        filters: Vec<String>,

        /// Reading order: page or preserve
        #[arg(long)]
        order: Option<OrderKind>,
    },

    /// Normalize many raw extractions into a directory
    Batch {
        /// Raw extractions
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for `<stem>.normalized.<ext>` outputs
        #[arg(short = 'd', long)]
        output_dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Compact JSON output
        #[arg(long)]
        compact: bool,

        /// Only emit these top-level fields (repeatable)
        #[arg(long = "filter", value_name = "FIELD")]
        filters: Vec<String>,

        /// Reading order: page or preserve
        #[arg(long)]
        order: Option<OrderKind>,

        /// Process documents on all cores
        #[arg(short, long)]
        parallel: bool,
    },

    /// Print collection counts and caption links
    Inspect {
        /// Raw extraction
        input: PathBuf,

        /// Reading order: page or preserve
        #[arg(long)]
        order: Option<OrderKind>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    let env = env_logger::Env::default().default_filter_or(verbosity.log_filter());
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .init();

    let config = match &args.config {
        Some(path) => {
            log::debug!("loading config from {}", path.display());
            Config::load_from_file(path)?
        }
        None => {
            let (user_config, project_config) = Config::discover_configs();
            log::debug!(
                "discovered configs: user={}, project={}",
                user_config.is_some(),
                project_config.is_some()
            );
            Config::merge(user_config, project_config)
        }
    };
    let section = config.normalize_section();

    match args.command {
        Commands::Normalize {
            input,
            output,
            format,
            compact,
            filters,
            order,
        } => {
            let overrides = Overrides {
                order,
                format,
                compact,
                filters,
            };
            let options = Options::resolve(&overrides, &section)?;
            normalize_command(&input, output.as_deref(), &options, verbosity)
        }
        Commands::Batch {
            inputs,
            output_dir,
            format,
            compact,
            filters,
            order,
            parallel,
        } => {
            let overrides = Overrides {
                order,
                format,
                compact,
                filters,
            };
            let options = Options::resolve(&overrides, &section)?;
            batch_command(&inputs, &output_dir, &options, parallel, verbosity)
        }
        Commands::Inspect { input, order } => {
            let overrides = Overrides {
                order,
                ..Overrides::default()
            };
            let options = Options::resolve(&overrides, &section)?;
            inspect_command(&input, &options)
        }
    }
}

fn normalize_command(
    input: &Path,
    output: Option<&Path>,
    options: &Options,
    verbosity: Verbosity,
) -> Result<()> {
    let (doc, report) = normalize_file(input, &options.normalizer())?;
    let rendered = options.render(&doc)?;

    match output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?,
        None => println!("{rendered}"),
    }

    if verbosity.should_show_output() {
        eprintln!("{} {}: {report}", "Normalized".green().bold(), input.display());
    }
    Ok(())
}

fn batch_command(
    inputs: &[PathBuf],
    output_dir: &Path,
    options: &Options,
    parallel: bool,
    verbosity: Verbosity,
) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let normalizer = options.normalizer();
    let process = |input: &PathBuf| -> Result<NormalizeReport> {
        let (doc, report) = normalize_file(input, &normalizer)?;
        let target = output_path(input, output_dir, options.format);
        fs::write(&target, options.render(&doc)?)
            .with_context(|| format!("Failed to write output file: {}", target.display()))?;
        Ok(report)
    };

    let results: Vec<(&PathBuf, Result<NormalizeReport>)> = if parallel {
        inputs.par_iter().map(|input| (input, process(input))).collect()
    } else {
        inputs.iter().map(|input| (input, process(input))).collect()
    };

    let mut failed = 0usize;
    for (input, result) in &results {
        match result {
            Ok(report) => {
                if verbosity.should_show_output() {
                    eprintln!("{} {}: {report}", "Normalized".green().bold(), input.display());
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {e:#}", "Failed".red().bold(), input.display());
            }
        }
    }

    if verbosity.should_show_output() {
        eprintln!(
            "{} {} succeeded, {failed} failed",
            "Summary:".bold(),
            results.len() - failed
        );
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} documents failed", results.len());
    }
    Ok(())
}

fn inspect_command(input: &Path, options: &Options) -> Result<()> {
    let (doc, report) = normalize_file(input, &options.normalizer())?;
    let stats = doc.stats();

    println!("{} {}", "Document:".bold(), doc.name);
    if let Some(hash) = &doc.doc_hash {
        println!("  hash:               {hash}");
    }
    println!("  provenance records: {} on {} pages", stats.num_provs, stats.num_pages);
    println!("  texts:              {}", stats.num_texts);
    println!("  tables:             {}", stats.num_tables);
    println!("  figures:            {}", stats.num_figures);
    println!("  page headers:       {}", stats.num_page_headers);
    println!("  page footers:       {}", stats.num_page_footers);
    println!("  other:              {}", stats.num_other);
    println!("  captions:           {}", stats.num_captions);
    println!("{} {report}", "Report:".bold());

    print_caption_links(&doc);
    Ok(())
}

fn print_caption_links(doc: &Document) {
    let tables = doc.tables.iter().map(|t| (&t.provs, &t.captions));
    let figures = doc.figures.iter().map(|f| (&f.provs, &f.captions));

    let mut any = false;
    for (provs, captions) in tables.chain(figures) {
        let Some(owner) = provs.first().and_then(|&i| doc.provs.get(i)) else {
            continue;
        };
        for caption in captions {
            if !any {
                println!("{}", "Captions:".bold());
                any = true;
            }
            println!("  {} (page {}) <- {:?}", owner.path, owner.page, caption.text);
        }
    }
}
