//! CLI binary for remote-pdf-printer.
//!
//! A thin shim over the library crate that maps CLI flags and
//! `REMOTE_PDF_*` variables to `PrinterConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use remote_pdf_printer::pipeline::artifacts::ArtifactStore;
use remote_pdf_printer::{
    browser_status, capture_png, copy_artifact, print_pdf, print_preview, BatchProgressCallback,
    PdfRequest, PdfResponse, PngRequest, PreviewResponse, PrinterConfig, ProgressCallback,
    ScreenshotResponse,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Live progress bar with one log line per finished source. Sources finish
/// out of order, so lines are keyed by submission index.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Connecting");
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
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_jobs: usize) {
        self.bar.set_length(total_jobs as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} sources  \
                 ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_prefix("Rendering");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendering {total_jobs} sources…"))
        ));
    }

    fn on_job_start(&self, index: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(format!("source {index}"));
    }

    fn on_job_complete(&self, index: usize, total: usize, bytes: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} Source {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{:>7} KiB", bytes / 1024)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_job_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Source {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_jobs: usize, success_count: usize) {
        let failed = total_jobs.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} sources rendered",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} sources rendered  ({} left out)",
                if failed == total_jobs { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_jobs,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Merge two pages into one PDF, print the JSON response
  remote-pdf pdf https://example.com/a https://example.com/b

  # Inline HTML and a header (header needs --margin-top)
  remote-pdf pdf '<h1>Hello</h1>' --header '<span class="title"></span>' --margin-top 0.8

  # Sources from a file, download the merged PDF
  remote-pdf pdf @report.html -o report.pdf

  # Per-page previews
  remote-pdf preview https://example.com --json

  # Screenshot of one element
  remote-pdf png https://example.com --dom-id chart -o chart.png

  # Browser version and open tabs
  remote-pdf status

ENVIRONMENT VARIABLES:
  REMOTE_PDF_CHROME_URI              DevTools endpoint (host:port or ws:// URL)
  REMOTE_PDF_ROOT_DIRECTORY          Output root; files land in <root>/files/
  REMOTE_PDF_PUBLIC_URL              Base URL for returned links
  REMOTE_PDF_HEADER_STYLE_TEMPLATE   File prepended to header/footer templates
  REMOTE_PDF_DEBUG_SOURCES           Keep each request's sources in files/sources
  REMOTE_PDF_MAX_SESSIONS            Concurrent Chrome tabs per batch
  REMOTE_PDF_REPORT_FAILED           List failed source indices in responses
  POPPLER_BIN_DIR                    Directory holding pdfunite/pdfinfo/pdftocairo
"#;

/// Print web pages and HTML to PDF through a remote headless Chrome.
#[derive(Parser, Debug)]
#[command(
    name = "remote-pdf",
    version,
    about = "Print web pages and HTML to PDF through a remote headless Chrome",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// DevTools endpoint of the remote browser.
    #[arg(long, global = true, env = "REMOTE_PDF_CHROME_URI", default_value = "127.0.0.1:1337")]
    chrome_uri: String,

    /// Root directory; artifacts are written under <root>/files/.
    #[arg(long, global = true, env = "REMOTE_PDF_ROOT_DIRECTORY", default_value = ".")]
    root_dir: PathBuf,

    /// Base URL used to build links in JSON responses.
    #[arg(long, global = true, env = "REMOTE_PDF_PUBLIC_URL", default_value = "http://127.0.0.1:3000")]
    public_url: String,

    /// File whose contents are prepended to header and footer templates.
    /// Defaults to <root>/css/default-header.css.txt when it exists.
    #[arg(long, global = true, env = "REMOTE_PDF_HEADER_STYLE_TEMPLATE")]
    header_style_template: Option<PathBuf>,

    /// Persist each request's raw sources under files/sources.
    #[arg(long, global = true, env = "REMOTE_PDF_DEBUG_SOURCES")]
    debug_sources: bool,

    /// Maximum concurrent browser tabs per batch.
    #[arg(long, global = true, env = "REMOTE_PDF_MAX_SESSIONS", default_value_t = 8)]
    max_sessions: usize,

    /// Per-source render timeout in seconds.
    #[arg(long, global = true, env = "REMOTE_PDF_JOB_TIMEOUT", default_value_t = 60)]
    job_timeout: u64,

    /// Whole-batch timeout in seconds (0 disables).
    #[arg(long, global = true, env = "REMOTE_PDF_BATCH_TIMEOUT", default_value_t = 300)]
    batch_timeout: u64,

    /// Timeout for pdfunite/pdfinfo/pdftocairo in seconds.
    #[arg(long, global = true, env = "REMOTE_PDF_TOOL_TIMEOUT", default_value_t = 120)]
    tool_timeout: u64,

    /// Include failed source indices in responses.
    #[arg(long, global = true, env = "REMOTE_PDF_REPORT_FAILED")]
    report_failed: bool,

    /// Output structured JSON.
    #[arg(long, global = true, env = "REMOTE_PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "REMOTE_PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "REMOTE_PDF_DEBUG")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "REMOTE_PDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render sources and merge them into one PDF.
    Pdf(PdfArgs),
    /// Like `pdf`, plus one JPEG preview per page.
    Preview(PdfArgs),
    /// Screenshot one source.
    Png(PngArgs),
    /// Show browser version and open targets.
    Status,
}

#[derive(Args, Debug)]
struct PdfArgs {
    /// URLs or HTML documents. `@path` reads the source from a file.
    #[arg(required = true)]
    sources: Vec<String>,

    /// Copy the merged PDF here instead of printing a response.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Header template (HTML). Requires --margin-top.
    #[arg(long)]
    header: Option<String>,

    /// Footer template (HTML). Requires --margin-bottom.
    #[arg(long)]
    footer: Option<String>,

    /// Top margin in inches.
    #[arg(long)]
    margin_top: Option<f64>,

    /// Bottom margin in inches.
    #[arg(long)]
    margin_bottom: Option<f64>,

    /// Left margin in inches.
    #[arg(long)]
    margin_left: Option<f64>,

    /// Right margin in inches.
    #[arg(long)]
    margin_right: Option<f64>,

    /// Paper size as WIDTH,HEIGHT in inches.
    #[arg(long, value_delimiter = ',', num_args = 2)]
    paper_size: Vec<f64>,
}

#[derive(Args, Debug)]
struct PngArgs {
    /// URL or HTML document. `@path` reads it from a file.
    source: String,

    /// Copy the PNG here instead of printing a response.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    x: Option<f64>,
    #[arg(long)]
    y: Option<f64>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    scale: Option<f64>,

    /// Capture the element with this id.
    #[arg(long)]
    dom_id: Option<String>,

    /// Capture every element matching this XPath.
    #[arg(long)]
    xpath: Option<String>,
}

fn read_source(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading source file '{path}'")),
        None => Ok(arg.to_string()),
    }
}

fn header_style(global: &GlobalArgs) -> Result<String> {
    match &global.header_style_template {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading header style template '{}'", path.display())),
        None => {
            let default = PrinterConfig::default_header_style_path(&global.root_dir);
            Ok(std::fs::read_to_string(default).unwrap_or_default())
        }
    }
}

impl PdfArgs {
    fn to_request(&self) -> Result<PdfRequest> {
        Ok(PdfRequest {
            data: self
                .sources
                .iter()
                .map(|s| read_source(s))
                .collect::<Result<_>>()?,
            download: self.output.is_some(),
            header: self.header.clone(),
            footer: self.footer.clone(),
            margin_top: self.margin_top,
            margin_bottom: self.margin_bottom,
            margin_left: self.margin_left,
            margin_right: self.margin_right,
            paper_size: self.paper_size.clone(),
        })
    }
}

impl PngArgs {
    fn to_request(&self) -> Result<PngRequest> {
        Ok(PngRequest {
            data: read_source(&self.source)?,
            download: self.output.is_some(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            scale: self.scale,
            dom_id: self.dom_id.clone(),
            xpath: self.xpath.clone(),
        })
    }
}

fn emit_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

async fn download(artifact: &Path, dest: &Path, quiet: bool) -> Result<()> {
    let bytes = copy_artifact(artifact, dest)
        .await
        .with_context(|| format!("copying {} to {}", artifact.display(), dest.display()))?;
    if !quiet {
        eprintln!("{} Wrote {} ({} bytes)", green("✔"), bold(&dest.display().to_string()), bytes);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar covers per-source feedback, so keep library logs to
    // errors while it is showing.
    let batch_command = matches!(cli.command, Command::Pdf(_) | Command::Preview(_));
    let show_progress = batch_command && !g.quiet && !g.no_progress && !g.json;
    let filter = if g.verbose {
        "debug"
    } else if g.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Configuration ────────────────────────────────────────────────────
    let mut builder = PrinterConfig::builder()
        .chrome_uri(&g.chrome_uri)
        .root_dir(&g.root_dir)
        .public_base_url(&g.public_url)
        .header_style_template(header_style(g)?)
        .debug_sources(g.debug_sources)
        .max_sessions(g.max_sessions)
        .job_timeout_secs(g.job_timeout)
        .batch_timeout_secs((g.batch_timeout > 0).then_some(g.batch_timeout))
        .tool_timeout_secs(g.tool_timeout)
        .report_failed_jobs(g.report_failed);

    let progress = show_progress.then(CliProgressCallback::new);
    if let Some(ref cb) = progress {
        builder = builder.progress_callback(Arc::clone(cb) as ProgressCallback);
    }
    let config = builder.build().context("invalid configuration")?;

    ArtifactStore::new(&config)
        .prepare()
        .context("creating output directories")?;
    if !config.tools.all_present() {
        tracing::warn!(
            "Some poppler tools are missing ({:?}); set POPPLER_BIN_DIR",
            config.tools
        );
    }

    // ── Dispatch ─────────────────────────────────────────────────────────
    match &cli.command {
        Command::Pdf(args) => {
            let request = args.to_request()?;
            let output = print_pdf(&request, &config).await?;
            match &args.output {
                Some(dest) => download(&output.combined, dest, g.quiet).await?,
                None => emit_json(&PdfResponse::from_output(
                    &output,
                    &config.public_base_url,
                    config.report_failed_jobs,
                ))?,
            }
            if g.verbose {
                eprintln!("{}", dim(&format!("{:?}", output.stats)));
            }
        }
        Command::Preview(args) => {
            let request = args.to_request()?;
            let output = print_preview(&request, &config).await?;
            if let Some(dest) = &args.output {
                download(&output.batch.combined, dest, g.quiet).await?;
            }
            if args.output.is_none() || g.json {
                emit_json(&PreviewResponse::from_output(
                    &output,
                    &config.public_base_url,
                    config.report_failed_jobs,
                ))?;
            }
        }
        Command::Png(args) => {
            let request = args.to_request()?;
            let path = capture_png(&request, &config).await?;
            match &args.output {
                Some(dest) => download(&path, dest, g.quiet).await?,
                None => emit_json(&ScreenshotResponse::from_path(&path, &config.public_base_url))?,
            }
        }
        Command::Status => {
            let status = browser_status(&config).await?;
            if g.json {
                emit_json(&status)?;
            } else {
                println!("{} {}", bold("Browser:"), status.browser);
                println!("{} {}", bold("Protocol:"), status.protocol_version);
                println!("{} {}", bold("Targets:"), status.targets.len());
                for t in &status.targets {
                    println!("  {} {:<8} {}", dim(&t.id), t.kind, t.url);
                }
                println!("{}", bold("Tools:"));
                let tools = config.tools.clone();
                let versions = tokio::task::spawn_blocking(move || tools.versions()).await?;
                for (tool, path, version) in versions {
                    match version {
                        Ok(v) => println!("  {} {:<11} {}", green("✓"), tool.binary_name(), dim(&format!("{v}  {}", path.display()))),
                        Err(e) => println!("  {} {:<11} {}", red("✗"), tool.binary_name(), red(&e.to_string())),
                    }
                }
            }
        }
    }

    if let Some(cb) = progress {
        let errors = cb.errors.load(Ordering::SeqCst);
        if errors > 0 && config.report_failed_jobs && !g.quiet {
            eprintln!("{} {} sources failed", red("✗"), errors);
        }
    }

    Ok(())
}
