//! CLI parsing and orchestration. Parses args, merges a directory, prints one line per pair
//! and a summary. Maps errors to exit codes.

use crate::combine::{
    locate_pairs, run_all, EncodingResolver, ExtensionPair, MergeError, RunOptions,
};
use crate::config::{self, Config};
use crate::model::{AggregateResult, MergeOutcome, MergeStatus};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::fmt::MakeWriter;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Merge(#[from] MergeError),

    #[error("{failed} of {total} pair(s) were not merged.")]
    PartialFailure { failed: usize, total: usize },
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) | CliRunError::Merge(_) => 1,
            CliRunError::PartialFailure { .. } => 2,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "hdrcombine")]
#[command(about = "Append each C++ source file to its header, keeping the header's encoding")]
#[command(
    after_help = "Config file keys (source_extension, target_extension, encodings) are read from ./hdrcombine.toml or the user config directory. CLI flags override config."
)]
pub struct Args {
    /// Directory holding the source and header files (not searched recursively).
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Source and target extensions as SRC:TGT (default cpp:h).
    #[arg(short, long, value_parser = parse_extensions)]
    pub extensions: Option<ExtensionPair>,

    /// Candidate encodings in priority order, comma-separated (default utf-8,euc-kr).
    #[arg(long, value_delimiter = ',')]
    pub encodings: Option<Vec<String>>,

    /// List the pairs that would be merged and whether each header exists; write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the full result as JSON instead of report lines.
    #[arg(long)]
    pub json: bool,

    /// Print only failures and warnings, plus the summary.
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and verbose error chain.
    #[arg(long)]
    pub verbose: bool,
}

fn log_level(verbose: bool) -> tracing::Level {
    if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    }
}

/// Subscriber used by the binary. Color codes only when `ansi` is set.
fn log_subscriber<W>(
    verbose: bool,
    ansi: bool,
    writer: W,
) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_ansi(ansi)
        .with_writer(writer)
        .finish()
}

/// Install the stderr subscriber. Color is used only when stderr is a terminal.
pub fn init_logging(verbose: bool) {
    let subscriber = log_subscriber(verbose, std::io::stderr().is_terminal(), std::io::stderr);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: logging disabled: {}", e);
    }
}

fn parse_extensions(s: &str) -> Result<ExtensionPair, String> {
    s.parse::<ExtensionPair>().map_err(|e| e.to_string())
}

/// Extensions from CLI, then config, then the cpp:h default.
fn effective_extensions(
    args: &Args,
    config: Option<&Config>,
) -> Result<ExtensionPair, CliRunError> {
    if let Some(ext) = &args.extensions {
        return Ok(ext.clone());
    }
    let default = ExtensionPair::default();
    let source = config
        .and_then(|c| c.source_extension.as_deref())
        .unwrap_or(default.source());
    let target = config
        .and_then(|c| c.target_extension.as_deref())
        .unwrap_or(default.target());
    ExtensionPair::new(source, target)
        .map_err(|e| CliRunError::InvalidInput(format!("Config: {}", e)))
}

/// Candidate encodings from CLI, then config, then the built-in list.
fn effective_resolver(
    args: &Args,
    config: Option<&Config>,
) -> Result<EncodingResolver, CliRunError> {
    let labels = args
        .encodings
        .as_ref()
        .or_else(|| config.and_then(|c| c.encodings.as_ref()));
    match labels {
        Some(labels) => Ok(EncodingResolver::from_labels(labels.as_slice())?),
        None => Ok(EncodingResolver::default()),
    }
}

/// Print located pairs without touching any file. Fails if a counterpart is missing.
fn dry_run(directory: &Path, extensions: &ExtensionPair) -> Result<(), CliRunError> {
    let pairs = locate_pairs(directory, extensions)?;
    let mut missing = 0;
    for pair in &pairs {
        let exists = pair.counterpart_path.is_file();
        if !exists {
            missing += 1;
        }
        println!(
            "{} -> {}{}",
            pair.source_path.display(),
            pair.counterpart_path.display(),
            if exists { "" } else { " (missing)" }
        );
    }
    eprintln!("Pairs: {}, missing counterparts: {}", pairs.len(), missing);
    if missing > 0 {
        return Err(CliRunError::PartialFailure {
            failed: missing,
            total: pairs.len(),
        });
    }
    Ok(())
}

fn print_outcome(outcome: &MergeOutcome, quiet: bool) {
    if outcome.status.is_failure() {
        eprintln!("{}", outcome);
    } else if !quiet || outcome.status == MergeStatus::DecodeFallback {
        println!("{}", outcome);
    }
}

fn finish(result: &AggregateResult) -> Result<(), CliRunError> {
    if let Some(e) = &result.root_error {
        return Err(CliRunError::InvalidInput(e.clone()));
    }
    if !result.all_succeeded {
        return Err(CliRunError::PartialFailure {
            failed: result.failed(),
            total: result.outcomes.len(),
        });
    }
    Ok(())
}

/// Entry point for the CLI. Returns Ok(()) when every pair merged; Err with exit code and
/// message otherwise.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let extensions = effective_extensions(args, config.as_ref())?;
    let resolver = effective_resolver(args, config.as_ref())?;
    tracing::debug!(
        source = extensions.source(),
        target = extensions.target(),
        encodings = ?resolver.candidates().iter().map(|e| e.name()).collect::<Vec<_>>(),
        "effective settings"
    );

    if args.dry_run {
        return dry_run(&args.directory, &extensions);
    }

    let quiet = args.quiet;
    let report = |outcome: &MergeOutcome| print_outcome(outcome, quiet);
    let on_outcome: Option<&dyn Fn(&MergeOutcome)> = if args.json { None } else { Some(&report) };
    let options = RunOptions {
        extensions,
        resolver,
        on_outcome,
    };
    let result = run_all(&args.directory, &options);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| CliRunError::InvalidInput(format!("Failed to write JSON: {}", e)))?;
        println!("{}", json);
    } else if result.root_error.is_none() {
        eprintln!("{}", result.summary());
    }
    finish(&result)
}
