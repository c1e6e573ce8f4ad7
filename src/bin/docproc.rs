//! CLI binary for vlm-docproc.
//!
//! A thin shim over the library crate: maps CLI flags to `ProcessorConfig`,
//! runs the files one by one, prints each result and optionally writes the
//! `<file>_output.json` exports.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use vlm_docproc::export::{to_pretty_json, write_export};
use vlm_docproc::pipeline::intake::read_upload;
use vlm_docproc::pipeline::normalize::{classify, pdfium_available, MediaKind};
use vlm_docproc::{
    BatchOutput, BatchProgressCallback, BatchStats, DocumentProcessor, FileError, FileResult,
    ProcessorConfig, ProgressCallback, UploadedFile,
};

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

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bar across the batch plus one log line per
/// file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-file wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER_TICKS);

        bar.set_style(style);
        bar.set_prefix("Analyzing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .map(|mut m| m.remove(&index))
            .ok()
            .flatten()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_files} file(s)…"))
        ));
    }

    fn on_file_start(&self, index: usize, _total: usize, file_name: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(file_name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, file_name: &str) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            file_name,
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, file_name: &str, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Keep the log line to one row; full message follows in the report.
        let first_line = error.lines().next().unwrap_or_default();
        let msg = match first_line.char_indices().nth(80) {
            Some((cut, _)) => format!("{}\u{2026}", &first_line[..cut]),
            None => first_line.to_string(),
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total,
            file_name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} file(s) processed successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) processed  ({} failed)",
                if success_count == 0 { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Classify one document (prints JSON to stdout)
  docproc invoice.pdf

  # Several files, exports written as <file>_output.json
  docproc receipt.jpg listing.png chat.png -o results/

  # Whole batch as one JSON document
  docproc --json *.pdf > batch.json

  # A different model or an OpenAI-compatible endpoint
  docproc --model openai/gpt-4o-mini scan.png
  docproc --endpoint http://localhost:8000/v1/chat/completions scan.png

ENVIRONMENT VARIABLES:
  OPENROUTER_API_KEY      Bearer credential for the endpoint (required)
  DOCPROC_MODEL           Override model ID
  DOCPROC_ENDPOINT        Override chat-completions URL
  DOCPROC_OUTPUT_DIR      Directory for <file>_output.json exports
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, e.g. vlm_docproc=debug

Only the first page of a PDF is analyzed.
"#;

/// Classify documents and extract key information as JSON using a Vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "docproc",
    version,
    about = "Classify documents and extract key information as JSON using a Vision LLM",
    long_about = "Send PDF, PNG or JPEG documents to a vision-language model and get back a JSON \
object with the document's category (invoice, marketplace_listing_screenshot, chat_screenshot, \
website_screenshot or other), the key entities it contains, and a one-sentence description.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document files to process, in order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write each result to <DIR>/<file>_output.json.
    #[arg(short, long, env = "DOCPROC_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Bearer credential for the inference endpoint.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// VLM model ID.
    #[arg(long, env = "DOCPROC_MODEL", default_value = vlm_docproc::config::DEFAULT_MODEL)]
    model: String,

    /// Chat-completions endpoint URL.
    #[arg(long, env = "DOCPROC_ENDPOINT", default_value = vlm_docproc::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Rendering DPI for the first PDF page (72–400).
    #[arg(long, env = "DOCPROC_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Path to a text file containing a replacement extraction prompt.
    #[arg(long, env = "DOCPROC_PROMPT")]
    prompt: Option<PathBuf>,

    /// Per-request timeout in seconds (default: no timeout).
    #[arg(long, env = "DOCPROC_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Path to the pdfium library (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the whole batch as one JSON document.
    #[arg(long, env = "DOCPROC_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCPROC_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCPROC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "DOCPROC_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the per-file feedback, so INFO logs are
    // muted while it is shown.
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    if config.bearer_token().is_none() && !cli.quiet {
        eprintln!(
            "{} OPENROUTER_API_KEY is not set; every file will fail until it is.",
            yellow("⚠")
        );
    }

    let processor = DocumentProcessor::new(config).context("Failed to initialise processor")?;

    // ── Intake ───────────────────────────────────────────────────────────
    // Unreadable inputs are reported in place rather than aborting the run.
    let mut uploads: Vec<Result<UploadedFile, FileResult>> = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        uploads.push(read_upload(path).await.map_err(|e| FileResult {
            file_name: path.display().to_string(),
            media_type: "application/octet-stream".into(),
            data: None,
            error: Some(e),
            warnings: Vec::new(),
            duration_ms: 0,
        }));
    }

    let readable: Vec<UploadedFile> = uploads
        .iter()
        .filter_map(|u| u.as_ref().ok().cloned())
        .collect();

    let has_pdf = readable
        .iter()
        .any(|u| classify(&u.media_type) == MediaKind::Pdf);
    if has_pdf && !cli.quiet && !pdfium_available(processor.config().pdfium_lib_path.as_deref()) {
        eprintln!(
            "{} libpdfium not found; PDF files will fail. Set PDFIUM_LIB_PATH or --pdfium-lib.",
            yellow("⚠")
        );
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let batch = processor.process_batch(&readable).await;
    let output = merge_in_order(uploads, batch);

    // ── Present ──────────────────────────────────────────────────────────
    let results = output.files;
    let export_errors: Vec<Option<FileError>> = match cli.output_dir {
        Some(ref dir) => results
            .iter()
            .map(|r| export_result(dir, r, cli.quiet))
            .collect(),
        None => vec![None; results.len()],
    };

    let stats = recount(&results, output.stats.total_duration_ms);

    if cli.json {
        let merged = BatchOutput {
            stats,
            files: results,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&merged).context("Failed to serialise output")?
        );
        for (result, err) in merged.files.iter().zip(&export_errors) {
            if let Some(e) = err {
                eprintln!("{}: {}", result.file_name, export_failure_line(e));
            }
        }
        return finish(&merged.stats);
    }

    for (result, err) in results.iter().zip(&export_errors) {
        print_result(result, err.as_ref());
    }

    if !cli.quiet && !show_progress {
        eprintln!(
            "Processed {}/{} files in {}ms",
            stats.succeeded, stats.total_files, stats.total_duration_ms
        );
    }
    finish(&stats)
}

/// Map CLI args to `ProcessorConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ProcessorConfig> {
    let mut builder = ProcessorConfig::builder()
        .model(&cli.model)
        .endpoint(&cli.endpoint)
        .dpi(cli.dpi);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref path) = cli.prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Put unreadable inputs back at their original positions among the batch results.
fn merge_in_order(uploads: Vec<Result<UploadedFile, FileResult>>, batch: BatchOutput) -> BatchOutput {
    let mut processed = batch.files.into_iter();
    let files = uploads
        .into_iter()
        .filter_map(|u| match u {
            Ok(_) => processed.next(),
            Err(unreadable) => Some(unreadable),
        })
        .collect();
    BatchOutput {
        files,
        stats: batch.stats,
    }
}

fn recount(results: &[FileResult], total_duration_ms: u64) -> BatchStats {
    let succeeded = results.iter().filter(|r| r.is_success()).count();
    BatchStats {
        total_files: results.len(),
        succeeded,
        failed: results.len() - succeeded,
        total_duration_ms,
    }
}

/// Write the export for a successful result. A failure is returned so it
/// can be shown next to that file; the rest of the batch is unaffected.
fn export_result(dir: &std::path::Path, result: &FileResult, quiet: bool) -> Option<FileError> {
    let prepared = result.export()?;
    match prepared.and_then(|export| write_export(dir, &export)) {
        Ok(path) => {
            if !quiet {
                eprintln!("   {} {}", dim("→"), path.display());
            }
            None
        }
        Err(e) => {
            tracing::warn!("{}: {}", result.file_name, e);
            Some(e)
        }
    }
}

fn print_result(result: &FileResult, export_error: Option<&FileError>) {
    println!("{}", bold(&format!("── {} ──", result.file_name)));
    match (&result.error, &result.data) {
        (Some(e), _) => {
            eprintln!("{} Error processing file: {}", red("✗"), e);
            if let Some(raw) = e.raw_response() {
                eprintln!("{}", dim("Raw model output:"));
                eprintln!("{raw}");
            }
        }
        (None, Some(data)) => {
            print_json(data);
            for w in &result.warnings {
                eprintln!("{} {}", yellow("⚠"), w);
            }
            if let Some(e) = export_error {
                eprintln!("{}", export_failure_line(e));
            }
        }
        (None, None) => eprintln!("{} No result", red("✗")),
    }
}

/// The error's own message already names the export step.
fn export_failure_line(e: &FileError) -> String {
    format!("{} {}", red("✗"), e)
}

fn print_json(data: &serde_json::Value) {
    match to_pretty_json(data) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("{} {}", red("✗"), e),
    }
}

/// Exit non-zero when every file failed.
fn finish(stats: &BatchStats) -> Result<()> {
    if stats.total_files > 0 && stats.succeeded == 0 {
        anyhow::bail!("All {} file(s) failed", stats.total_files);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(name: &str) -> FileResult {
        FileResult {
            file_name: name.into(),
            media_type: "application/octet-stream".into(),
            data: None,
            error: Some(FileError::ReadFailed {
                path: name.into(),
                detail: "No such file or directory".into(),
            }),
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }

    fn succeeded(name: &str) -> FileResult {
        FileResult {
            file_name: name.into(),
            media_type: "image/png".into(),
            data: Some(serde_json::json!({"category": "other"})),
            error: None,
            warnings: Vec::new(),
            duration_ms: 5,
        }
    }

    #[test]
    fn export_failure_names_the_step_once() {
        let line = export_failure_line(&FileError::Serialization {
            detail: "disk full".into(),
        });
        assert_eq!(line.matches("Failed to export result").count(), 1, "{line}");
        assert!(line.ends_with("Failed to export result: disk full"), "{line}");
    }

    #[test]
    fn unreadable_inputs_keep_their_position() {
        let uploads = vec![
            Ok(UploadedFile::new("a.png", vec![1], "image/png")),
            Err(failed("missing.pdf")),
            Ok(UploadedFile::new("c.png", vec![3], "image/png")),
        ];
        let batch = BatchOutput {
            files: vec![succeeded("a.png"), succeeded("c.png")],
            stats: BatchStats::default(),
        };

        let merged = merge_in_order(uploads, batch);
        let names: Vec<&str> = merged.files.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, ["a.png", "missing.pdf", "c.png"]);

        let stats = recount(&merged.files, 7);
        assert_eq!((stats.total_files, stats.succeeded, stats.failed), (3, 2, 1));
        assert!(finish(&stats).is_ok());
    }

    #[test]
    fn all_failed_batch_is_an_error() {
        let stats = recount(&[failed("x.pdf")], 0);
        assert!(finish(&stats).is_err());
        assert!(finish(&recount(&[], 0)).is_ok());
    }
}
