//! Batch integration tests against a scripted backend and fake poppler tools.
//!
//! The backend "prints" each source as one text line, and the fake tools
//! treat a line as a page: the merger concatenates, the info tool counts
//! lines, the rasterizer touches one file per line. That is enough to check
//! ordering, failure omission, and preview naming end to end without a
//! browser or poppler installed.
//!
//! Run with:
//!   cargo test --test batch

#![cfg(unix)]

use remote_pdf_printer::backend::{
    BackendError, BackendSession, BackendStatus, CaptureRequest, ClipRect, ElementSelector,
    RenderBackend, TargetSummary,
};
use remote_pdf_printer::pipeline::options::PrintOptions;
use remote_pdf_printer::{
    browser_status, capture_png, print_pdf, print_pdf_sync, print_preview, BatchProgressCallback,
    DocumentTools, JobError, PdfRequest, PdfResponse, PngRequest, PreviewResponse, PrinterConfig,
    PrinterError, ValidationError,
};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ── Scripted backend ─────────────────────────────────────────────────────────

/// Sources containing `fail` error on navigation, `slow-<ms>` sleeps before
/// printing, `blank` prints zero bytes. Everything else prints its own URL.
#[derive(Default)]
struct ScriptedBackend {
    sessions: AtomicUsize,
    released: Arc<AtomicUsize>,
    printed_with: Arc<Mutex<Vec<PrintOptions>>>,
    last_clip: Arc<Mutex<Option<Option<ClipRect>>>>,
    element_boxes: Vec<ClipRect>,
    image: Vec<u8>,
}

struct ScriptedSession {
    url: String,
    released: Arc<AtomicUsize>,
    printed_with: Arc<Mutex<Vec<PrintOptions>>>,
    last_clip: Arc<Mutex<Option<Option<ClipRect>>>>,
    element_boxes: Vec<ClipRect>,
    image: Vec<u8>,
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl RenderBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn open_session(&self, _timeout: Duration) -> Result<Box<dyn BackendSession>, BackendError> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            url: String::new(),
            released: Arc::clone(&self.released),
            printed_with: Arc::clone(&self.printed_with),
            last_clip: Arc::clone(&self.last_clip),
            element_boxes: self.element_boxes.clone(),
            image: self.image.clone(),
        }))
    }

    fn status(&self) -> Result<BackendStatus, BackendError> {
        Ok(BackendStatus {
            browser: "Scripted/1.0".into(),
            protocol_version: "1.3".into(),
            targets: vec![TargetSummary {
                id: "T1".into(),
                kind: "page".into(),
                title: "about:blank".into(),
                url: "about:blank".into(),
            }],
        })
    }
}

impl BackendSession for ScriptedSession {
    fn navigate(&mut self, target: &str) -> Result<(), BackendError> {
        if target.contains("fail") {
            return Err(BackendError::Navigate(format!("net::ERR_FAILED at {target}")));
        }
        self.url = target.to_string();
        Ok(())
    }

    fn print_pdf(&mut self, options: &PrintOptions) -> Result<Vec<u8>, BackendError> {
        if let Ok(mut seen) = self.printed_with.lock() {
            seen.push(options.clone());
        }
        if let Some(rest) = self.url.split("slow-").nth(1) {
            let ms: u64 = rest.split('/').next().and_then(|s| s.parse().ok()).unwrap_or(0);
            std::thread::sleep(Duration::from_millis(ms));
        }
        if self.url.contains("blank") {
            return Ok(Vec::new());
        }
        Ok(format!("{}\n", self.url).into_bytes())
    }

    fn capture(&mut self, request: &CaptureRequest) -> Result<Vec<u8>, BackendError> {
        *self.last_clip.lock().unwrap() = Some(request.clip);
        Ok(self.image.clone())
    }

    fn element_boxes(&mut self, _selector: &ElementSelector) -> Result<Vec<ClipRect>, BackendError> {
        Ok(self.element_boxes.clone())
    }
}

// ── Fake poppler tools ───────────────────────────────────────────────────────

const FAKE_PDFUNITE: &str = r#"#!/bin/sh
for last in "$@"; do :; done
: > "$last"
n=$#
i=1
for f in "$@"; do
  if [ "$i" -lt "$n" ]; then cat "$f" >> "$last"; fi
  i=$((i + 1))
done
"#;

const FAKE_PDFINFO: &str = r#"#!/bin/sh
pages=$(wc -l < "$1" | tr -d ' ')
printf 'Producer:       scripted\nPages:          %s\nPage size:      612 x 792 pts (letter)\n' "$pages"
"#;

/// Pads page numbers to the width of the page count, like poppler ≥ 0.30.
const FAKE_PDFTOCAIRO_PADDED: &str = r#"#!/bin/sh
pdf=$4
prefix=$5
pages=$(wc -l < "$pdf" | tr -d ' ')
width=${#pages}
i=1
while [ "$i" -le "$pages" ]; do
  : > "$(printf "%s-%0${width}d.jpg" "$prefix" "$i")"
  i=$((i + 1))
done
"#;

const FAKE_PDFTOCAIRO_PLAIN: &str = r#"#!/bin/sh
pdf=$4
prefix=$5
pages=$(wc -l < "$pdf" | tr -d ' ')
i=1
while [ "$i" -le "$pages" ]; do
  : > "$prefix-$i.jpg"
  i=$((i + 1))
done
"#;

fn write_script(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn fake_tools(dir: &Path, padded: bool) -> DocumentTools {
    let bin = dir.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    write_script(&bin, "pdfunite", FAKE_PDFUNITE);
    write_script(&bin, "pdfinfo", FAKE_PDFINFO);
    write_script(
        &bin,
        "pdftocairo",
        if padded { FAKE_PDFTOCAIRO_PADDED } else { FAKE_PDFTOCAIRO_PLAIN },
    );
    DocumentTools::in_dir(&bin)
}

// ── Test helpers ─────────────────────────────────────────────────────────────

struct Harness {
    _tmp: TempDir,
    root: std::path::PathBuf,
    backend: Arc<ScriptedBackend>,
    config: PrinterConfig,
}

/// Honour `RUST_LOG` when debugging a failing test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn harness_with(backend: ScriptedBackend, padded: bool, report_failed: bool) -> Harness {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("root");
    let backend = Arc::new(backend);
    let config = PrinterConfig::builder()
        .backend(backend.clone() as Arc<dyn RenderBackend>)
        .root_dir(&root)
        .public_base_url("http://printer.test")
        .tools(fake_tools(tmp.path(), padded))
        .max_sessions(4)
        .job_timeout_secs(10)
        .report_failed_jobs(report_failed)
        .build()
        .unwrap();
    Harness {
        _tmp: tmp,
        root,
        backend,
        config,
    }
}

fn harness() -> Harness {
    harness_with(ScriptedBackend::default(), true, false)
}

fn urls(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| format!("https://site/{n}")).collect()
}

fn merged_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// ── Ordering ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn merged_document_follows_submission_order() {
    let h = harness();
    // Earlier sources finish last.
    let sources = urls(&["slow-120/a", "slow-60/b", "c", "slow-30/d"]);
    let out = print_pdf(&PdfRequest::new(sources.clone()), &h.config).await.unwrap();

    assert_eq!(out.components.len(), 4);
    assert!(out.failures.is_empty());
    assert_eq!(merged_lines(&out.combined), sources);
    assert!(out
        .combined
        .to_string_lossy()
        .ends_with("-combined.pdf"));
}

#[tokio::test]
async fn index_ten_sorts_after_nine() {
    let h = harness();
    let names: Vec<String> = (0..12).map(|i| format!("page{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let sources = urls(&refs);

    let out = print_pdf(&PdfRequest::new(sources.clone()), &h.config).await.unwrap();
    assert_eq!(merged_lines(&out.combined), sources);

    let prefixes: Vec<String> = out
        .components
        .iter()
        .map(|p| {
            let name = p.file_name().unwrap().to_string_lossy().into_owned();
            name.split('-').next().unwrap().to_string()
        })
        .collect();
    let expected: Vec<String> = (0..12).map(|i| i.to_string()).collect();
    assert_eq!(prefixes, expected);
}

#[tokio::test]
async fn inline_markup_reaches_backend_as_data_uri() {
    let h = harness();
    let out = print_pdf(&PdfRequest::new(vec!["<h1>Inline</h1>".into()]), &h.config)
        .await
        .unwrap();
    let lines = merged_lines(&out.combined);
    assert!(lines[0].starts_with("data:text/html;base64,"), "got: {lines:?}");
}

// ── Partial failure ──────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_source_is_omitted() {
    let h = harness();
    let sources = urls(&["a", "fail", "c", "blank"]);
    let out = print_pdf(&PdfRequest::new(sources.clone()), &h.config).await.unwrap();

    assert_eq!(out.components.len(), 2);
    assert_eq!(merged_lines(&out.combined), vec![sources[0].clone(), sources[2].clone()]);
    assert_eq!(out.failed_indices(), vec![1, 3]);
    assert!(matches!(out.failures[0], JobError::RenderFailed { index: 1, .. }));
    assert!(matches!(out.failures[1], JobError::EmptyPayload { index: 3 }));
    assert_eq!(out.stats.rendered_jobs, 2);
    assert_eq!(out.stats.failed_jobs, 2);

    // Every session is released, failed or not.
    assert_eq!(h.backend.sessions.load(Ordering::SeqCst), 4);
    assert_eq!(h.backend.released.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn failures_are_hidden_unless_reporting_enabled() {
    let quiet = harness();
    let sources = urls(&["a", "fail", "c"]);
    let out = print_pdf(&PdfRequest::new(sources.clone()), &quiet.config).await.unwrap();
    let resp = PdfResponse::from_output(&out, &quiet.config.public_base_url, quiet.config.report_failed_jobs);
    assert_eq!(resp.failed, None);
    assert_eq!(resp.components.len(), 2);
    assert!(resp.url.starts_with("http://printer.test/pdfs/"));

    let loud = harness_with(ScriptedBackend::default(), true, true);
    let out = print_pdf(&PdfRequest::new(sources), &loud.config).await.unwrap();
    let resp = PdfResponse::from_output(&out, &loud.config.public_base_url, loud.config.report_failed_jobs);
    assert_eq!(resp.failed, Some(vec![1]));
}

#[tokio::test]
async fn all_sources_failing_is_fatal() {
    let h = harness();
    let err = print_pdf(&PdfRequest::new(urls(&["fail-1", "fail-2"])), &h.config)
        .await
        .unwrap_err();
    match err {
        PrinterError::NothingRendered { total, first_error } => {
            assert_eq!(total, 2);
            assert!(first_error.contains("Source 0"), "got: {first_error}");
        }
        other => panic!("unexpected: {other}"),
    }
}

#[tokio::test]
async fn batch_deadline_abandons_pending_jobs() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = Arc::new(ScriptedBackend::default());
    let config = PrinterConfig::builder()
        .backend(backend.clone() as Arc<dyn RenderBackend>)
        .root_dir(tmp.path())
        .tools(fake_tools(tmp.path(), true))
        .job_timeout_secs(30)
        .batch_timeout_secs(Some(1))
        .build()
        .unwrap();

    let out = print_pdf(&PdfRequest::new(urls(&["a", "slow-2500/b"])), &config)
        .await
        .unwrap();
    assert_eq!(out.components.len(), 1);
    assert!(matches!(
        out.failures[0],
        JobError::BatchDeadline { index: 1, secs: 1 }
    ));
}

// ── Validation happens before dispatch ───────────────────────────────────────

#[tokio::test]
async fn empty_sources_never_touch_backend() {
    let h = harness();
    let err = print_pdf(&PdfRequest::new(vec![]), &h.config).await.unwrap_err();
    assert!(matches!(
        err,
        PrinterError::Validation(ValidationError::EmptySources)
    ));
    assert_eq!(h.backend.sessions.load(Ordering::SeqCst), 0);
    assert!(!h.root.join("files").exists());
}

#[tokio::test]
async fn header_without_top_margin_is_rejected() {
    let h = harness();
    let mut request = PdfRequest::new(urls(&["a"]));
    request.header = Some("<span class=\"pageNumber\"></span>".into());

    let err = print_pdf(&request, &h.config).await.unwrap_err();
    assert!(matches!(
        err,
        PrinterError::Validation(ValidationError::HeaderWithoutTopMargin)
    ));
    assert_eq!(h.backend.sessions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn every_job_shares_the_derived_options() {
    let h = harness();
    let mut request = PdfRequest::new(urls(&["a", "b"]));
    request.footer = Some("<p>footer</p>".into());
    request.margin_bottom = Some(0.75);
    request.paper_size = vec![8.5, 11.0];

    print_pdf(&request, &h.config).await.unwrap();

    let seen = h.backend.printed_with.lock().unwrap();
    assert_eq!(seen.len(), 2);
    for opts in seen.iter() {
        assert!(opts.display_header_footer);
        assert!(opts.print_background);
        assert_eq!(opts.footer_template.as_deref(), Some("<p>footer</p>"));
        assert_eq!(opts.header_template.as_deref(), Some("<header></header>"));
        assert_eq!(opts.margins.bottom, Some(0.75));
        assert_eq!(opts.paper.map(|p| (p.width, p.height)), Some((8.5, 11.0)));
    }
}

#[tokio::test]
async fn debug_sources_are_dumped() {
    let tmp = tempfile::tempdir().unwrap();
    let config = PrinterConfig::builder()
        .backend(Arc::new(ScriptedBackend::default()) as Arc<dyn RenderBackend>)
        .root_dir(tmp.path())
        .tools(fake_tools(tmp.path(), true))
        .debug_sources(true)
        .build()
        .unwrap();

    print_pdf(&PdfRequest::new(urls(&["a"])), &config).await.unwrap();
    let dumped: Vec<_> = std::fs::read_dir(tmp.path().join("files/sources"))
        .unwrap()
        .collect();
    assert_eq!(dumped.len(), 1);
}

#[tokio::test]
async fn failed_source_dump_does_not_fail_the_batch() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("files")).unwrap();
    std::fs::write(tmp.path().join("files/sources"), b"not a directory").unwrap();
    let config = PrinterConfig::builder()
        .backend(Arc::new(ScriptedBackend::default()) as Arc<dyn RenderBackend>)
        .root_dir(tmp.path())
        .tools(fake_tools(tmp.path(), true))
        .debug_sources(true)
        .build()
        .unwrap();

    let out = print_pdf(&PdfRequest::new(urls(&["a", "b"])), &config)
        .await
        .unwrap();
    assert_eq!(out.components.len(), 2);
    assert_eq!(merged_lines(&out.combined), urls(&["a", "b"]));
    assert!(tmp.path().join("files/sources").is_file());
}

#[tokio::test]
async fn screenshot_source_is_dumped_when_debugging() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend {
        image: b"png".to_vec(),
        ..Default::default()
    };
    let config = PrinterConfig::builder()
        .backend(Arc::new(backend) as Arc<dyn RenderBackend>)
        .root_dir(tmp.path())
        .tools(fake_tools(tmp.path(), true))
        .debug_sources(true)
        .build()
        .unwrap();

    capture_png(&PngRequest::new("<p>shot</p>"), &config).await.unwrap();
    let dumped: Vec<_> = std::fs::read_dir(tmp.path().join("files/sources"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(dumped.len(), 1);
    let back: Vec<String> = serde_json::from_slice(&std::fs::read(&dumped[0]).unwrap()).unwrap();
    assert_eq!(back, vec!["<p>shot</p>".to_string()]);
}

// ── Previews ─────────────────────────────────────────────────────────────────

/// Swap one fake tool in the harness for a script that fails.
fn break_tool(h: &Harness, name: &str) {
    write_script(
        &h._tmp.path().join("bin"),
        name,
        "#!/bin/sh\necho 'I/O Error: broken' >&2\nexit 1\n",
    );
}

#[tokio::test]
async fn info_tool_failure_is_info_extraction_error() {
    let h = harness();
    break_tool(&h, "pdfinfo");
    let err = print_preview(&PdfRequest::new(urls(&["a"])), &h.config)
        .await
        .unwrap_err();
    match err {
        PrinterError::InfoExtraction { detail, .. } => {
            assert!(detail.contains("broken"), "got: {detail}")
        }
        other => panic!("unexpected: {other}"),
    }
}

#[tokio::test]
async fn rasterizer_failure_is_rasterize_error() {
    let h = harness();
    break_tool(&h, "pdftocairo");
    let err = print_preview(&PdfRequest::new(urls(&["a", "b"])), &h.config)
        .await
        .unwrap_err();
    match err {
        PrinterError::Rasterize { detail } => assert!(detail.contains("broken"), "got: {detail}"),
        other => panic!("unexpected: {other}"),
    }
}

#[tokio::test]
async fn previews_match_padded_rasterizer_names() {
    let h = harness();
    let names: Vec<String> = (0..12).map(|i| format!("p{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();

    let out = print_preview(&PdfRequest::new(urls(&refs)), &h.config).await.unwrap();
    assert_eq!(out.pages, 12);
    assert_eq!(out.images.len(), 12);

    let stem = out.batch.combined.file_stem().unwrap().to_string_lossy().into_owned();
    let first = out.images[0].file_name().unwrap().to_string_lossy().into_owned();
    let last = out.images[11].file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(first, format!("{stem}-01.jpg"));
    assert_eq!(last, format!("{stem}-12.jpg"));
    assert!(out.images.iter().all(|p| p.is_file()));

    let resp = PreviewResponse::from_output(&out, "http://printer.test", false);
    assert_eq!(resp.images[0], format!("http://printer.test/preview/{stem}-01.jpg"));
}

#[tokio::test]
async fn previews_match_plain_rasterizer_names() {
    let h = harness_with(ScriptedBackend::default(), false, false);
    let names: Vec<String> = (0..12).map(|i| format!("p{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();

    let out = print_preview(&PdfRequest::new(urls(&refs)), &h.config).await.unwrap();
    let stem = out.batch.combined.file_stem().unwrap().to_string_lossy().into_owned();
    let first = out.images[0].file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(first, format!("{stem}-1.jpg"));
    assert!(out.images.iter().all(|p| p.is_file()));
}

#[tokio::test]
async fn preview_counts_only_rendered_pages() {
    let h = harness();
    let out = print_preview(&PdfRequest::new(urls(&["a", "fail", "c"])), &h.config)
        .await
        .unwrap();
    assert_eq!(out.pages, 2);
    assert_eq!(out.images.len(), 2);
}

// ── Screenshots ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn element_capture_uses_union_of_boxes() {
    let backend = ScriptedBackend {
        element_boxes: vec![
            ClipRect { x: 10.0, y: 10.0, width: 20.0, height: 20.0, scale: 1.0 },
            ClipRect { x: 50.0, y: 50.0, width: 10.0, height: 10.0, scale: 1.0 },
        ],
        image: b"\x89PNG fake".to_vec(),
        ..Default::default()
    };
    let h = harness_with(backend, true, false);

    let mut request = PngRequest::new("https://site/chart");
    request.dom_id = Some("chart".into());
    let path = capture_png(&request, &h.config).await.unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG fake");
    assert!(path.starts_with(h.root.join("files/pngs")));
    let clip = h.backend.last_clip.lock().unwrap().unwrap().unwrap();
    assert_eq!((clip.x, clip.y, clip.width, clip.height), (10.0, 10.0, 50.0, 50.0));
}

#[tokio::test]
async fn explicit_clip_overrides_defaults() {
    let backend = ScriptedBackend {
        image: b"png".to_vec(),
        ..Default::default()
    };
    let h = harness_with(backend, true, false);

    let mut request = PngRequest::new("<div>hi</div>");
    request.width = Some(300.0);
    capture_png(&request, &h.config).await.unwrap();

    let clip = h.backend.last_clip.lock().unwrap().unwrap().unwrap();
    assert_eq!(
        (clip.x, clip.y, clip.width, clip.height, clip.scale),
        (0.0, 0.0, 300.0, 150.0, 1.0)
    );
}

#[tokio::test]
async fn empty_image_is_fatal() {
    let h = harness();
    let err = capture_png(&PngRequest::new("https://site/x"), &h.config)
        .await
        .unwrap_err();
    assert!(matches!(err, PrinterError::NoImageReturned));
    assert!(!h.root.join("files/pngs").exists());
}

#[tokio::test]
async fn unmatched_selector_is_capture_error() {
    let backend = ScriptedBackend {
        image: b"png".to_vec(),
        ..Default::default()
    };
    let h = harness_with(backend, true, false);
    let mut request = PngRequest::new("https://site/x");
    request.xpath = Some("//div[@id='missing']".into());

    let err = capture_png(&request, &h.config).await.unwrap_err();
    assert!(matches!(err, PrinterError::Capture { .. }), "got: {err}");
}

// ── Progress and status ──────────────────────────────────────────────────────

#[derive(Default)]
struct Counting {
    started: AtomicUsize,
    completed: AtomicUsize,
    errored: AtomicUsize,
    finished_with: AtomicUsize,
}

impl BatchProgressCallback for Counting {
    fn on_job_start(&self, _index: usize, _total: usize) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
    fn on_job_complete(&self, _index: usize, _total: usize, _bytes: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_job_error(&self, _index: usize, _total: usize, _error: &str) {
        self.errored.fetch_add(1, Ordering::SeqCst);
    }
    fn on_batch_complete(&self, _total: usize, success: usize) {
        self.finished_with.store(success, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn progress_events_cover_every_job() {
    let tmp = tempfile::tempdir().unwrap();
    let counting = Arc::new(Counting::default());
    let config = PrinterConfig::builder()
        .backend(Arc::new(ScriptedBackend::default()) as Arc<dyn RenderBackend>)
        .root_dir(tmp.path())
        .tools(fake_tools(tmp.path(), true))
        .progress_callback(counting.clone())
        .build()
        .unwrap();

    print_pdf(&PdfRequest::new(urls(&["a", "fail", "c"])), &config)
        .await
        .unwrap();
    assert_eq!(counting.started.load(Ordering::SeqCst), 3);
    assert_eq!(counting.completed.load(Ordering::SeqCst), 2);
    assert_eq!(counting.errored.load(Ordering::SeqCst), 1);
    assert_eq!(counting.finished_with.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn status_comes_from_backend() {
    let h = harness();
    let status = browser_status(&h.config).await.unwrap();
    assert_eq!(status.browser, "Scripted/1.0");
    assert_eq!(status.targets.len(), 1);
}

#[tokio::test]
async fn merge_tool_failure_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let bin = tmp.path().join("broken");
    std::fs::create_dir_all(&bin).unwrap();
    write_script(&bin, "pdfunite", "#!/bin/sh\necho 'Syntax Error' >&2\nexit 1\n");

    let config = PrinterConfig::builder()
        .backend(Arc::new(ScriptedBackend::default()) as Arc<dyn RenderBackend>)
        .root_dir(tmp.path())
        .tools(DocumentTools::in_dir(&bin))
        .build()
        .unwrap();

    let err = print_pdf(&PdfRequest::new(urls(&["a"])), &config)
        .await
        .unwrap_err();
    match err {
        PrinterError::Merge { detail } => assert!(detail.contains("Syntax Error"), "got: {detail}"),
        other => panic!("unexpected: {other}"),
    }
}

#[test]
fn sync_wrapper_runs_its_own_runtime() {
    let h = harness();
    let out = print_pdf_sync(&PdfRequest::new(urls(&["a", "b"])), &h.config).unwrap();
    assert_eq!(out.components.len(), 2);
}
