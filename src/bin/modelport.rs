//! CLI binary for modelport.
//!
//! A thin shim over the library crate: discovers model documents, runs the
//! validate + normalize stages over them, and prints per-document results.
//! The render/encode/persist stages need a live host application and are
//! only reachable through the library API.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use modelport::{
    check_batch, BatchProgressCallback, BatchReport, ExportConfig, ExportStatus, LocalStorage,
    ProgressCallback, Storage,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per
/// document as it completes.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} models  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Checking");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Checking {total_documents} model documents…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, document: &str) {
        self.bar.set_message(document.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, document: &str, status: ExportStatus) {
        let (tick, note) = match status {
            ExportStatus::Warning => (yellow("⚠"), dim("with warnings")),
            _ => (green("✓"), String::new()),
        };
        self.bar.println(format!(
            "  {tick} {index:>3}/{total:<3}  {document}  {note}"
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, document: &str, error: &str) {
        let msg = truncate_message(error, 99);
        self.bar.println(format!(
            "  {} {index:>3}/{total:<3}  {document}  {}",
            red("✗"),
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let failed = total.saturating_sub(succeeded);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} models checked successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} models passed  ({} failed)",
                if failed == total { red("✘") } else { yellow("⚠") },
                bold(&succeeded.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Check every .bbmodel in a directory
  modelport models/

  # Check specific files
  modelport chair.bbmodel table.bbmodel

  # Machine-readable report
  modelport --json models/ > report.json

  # Treat warnings (ungrounded models, missing anchors) as failures
  modelport --strict models/

  # Custom document extension
  modelport --extension model assets/

CHECKS PERFORMED:
  parse        document must be well-formed JSON
  anchors      every anchor_* element needs identical from/to/origin
  grounding    reports when the lowest point is not at Y=0
  textures     external texture files must resolve and be readable

EXIT CODES:
  0   every document passed (warnings allowed unless --strict)
  1   at least one document failed

ENVIRONMENT VARIABLES:
  MODELPORT_EXTENSION   Document extension to discover (default: bbmodel)
  MODELPORT_JSON        Output the JSON report
  MODELPORT_QUIET       Suppress all output except errors
  RUST_LOG              Standard tracing filter, overrides -v
"#;

/// Validate and normalize 3D model documents.
#[derive(Parser, Debug)]
#[command(
    name = "modelport",
    version,
    about = "Validate and normalize 3D model documents",
    long_about = "Runs the load, validate and normalize stages of the modelport export \
pipeline over model documents: JSON parsing, anchor-point invariants, vertical grounding \
and texture resolution. A document that passes here will pass the same stages during a \
full host-driven export.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Model document files and/or directories to scan.
    inputs: Vec<PathBuf>,

    /// Document extension (without dot) used when scanning directories.
    #[arg(long, env = "MODELPORT_EXTENSION", default_value = "bbmodel")]
    extension: String,

    /// Output the full JSON report instead of human-readable lines.
    #[arg(long, env = "MODELPORT_JSON")]
    json: bool,

    /// Exit nonzero when any document has warnings.
    #[arg(long, env = "MODELPORT_STRICT")]
    strict: bool,

    /// Disable the progress bar.
    #[arg(long, env = "MODELPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MODELPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MODELPORT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let storage = LocalStorage;
    let documents = collect_documents(&cli, &storage).await?;
    if documents.is_empty() {
        anyhow::bail!(
            "no '.{}' documents found in the given inputs",
            cli.extension
        );
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let mut builder = ExportConfig::builder().document_extension(&*cli.extension);
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let report = check_batch(&documents, &storage, &config).await;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !show_progress && !cli.quiet {
        print_plain(&report);
    }

    let warned = cli.strict && report.stats.warned > 0;
    if report.stats.failed > 0 || warned {
        std::process::exit(1);
    }
    Ok(())
}

/// Expand the CLI inputs into a flat, ordered document list. Directories are
/// scanned for documents with the configured extension; files are taken
/// as-is.
async fn collect_documents(cli: &Cli, storage: &LocalStorage) -> Result<Vec<PathBuf>> {
    let suffix = format!(".{}", cli.extension.trim_start_matches('.'));
    let mut documents = Vec::new();

    for input in &cli.inputs {
        if input.is_dir() {
            let found = storage
                .list_with_suffix(input, &suffix)
                .await
                .with_context(|| format!("Failed to scan directory {}", input.display()))?;
            documents.extend(found);
        } else {
            documents.push(input.clone());
        }
    }

    Ok(documents)
}

/// Truncate very long error messages to keep output tidy. Cuts on a char
/// boundary; document paths and texture names in these messages are not
/// guaranteed to be ASCII.
fn truncate_message(error: &str, max_chars: usize) -> String {
    match error.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
        None => error.to_string(),
    }
}

/// One line per record for --no-progress runs.
fn print_plain(report: &BatchReport) {
    for record in &report.records {
        let tick = match record.status {
            ExportStatus::Success => green("ok"),
            ExportStatus::Warning => yellow("warn"),
            ExportStatus::Error => red("FAIL"),
        };
        println!("{:>6}  {}  {}", tick, record.document, dim(&record.message));
    }
    eprintln!(
        "{}/{} passed ({} warnings, {} failed) in {}ms",
        report.stats.succeeded + report.stats.warned,
        report.stats.total,
        report.stats.warned,
        report.stats.failed,
        report.stats.duration_ms
    );
}
