//! Remote headless Chrome backend over the DevTools protocol.
//!
//! ## Why connect per session?
//!
//! Each job gets its own WebSocket connection and its own tab, so a crashed
//! renderer or a wedged navigation in one job cannot poison its siblings.
//! Connecting is cheap compared to printing; the browser process itself is
//! long-lived and owned by whoever runs it (usually a sidecar container).
//!
//! ## Endpoint forms
//!
//! `chrome_uri` may be either the DevTools HTTP address (`host:port`,
//! optionally prefixed with `http://`/`ws://`) or a complete browser
//! WebSocket URL (`ws://host:port/devtools/browser/<id>`). The short form is
//! resolved through `/json/version` on every session open, because the
//! browser id changes whenever the browser restarts.

use super::{
    BackendError, BackendSession, BackendStatus, CaptureRequest, ClipRect, ElementSelector,
    RenderBackend, TargetSummary,
};
use crate::pipeline::options::PrintOptions;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, Tab};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Bounding box of `this` in document coordinates, as JSON text.
const CLIENT_RECT_JS: &str = "function() { \
    const r = this.getBoundingClientRect(); \
    return JSON.stringify({ x: r.left + window.scrollX, y: r.top + window.scrollY, \
                            width: r.width, height: r.height }); }";

/// Timeout for the discovery/status HTTP calls.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Parsed form of the configured DevTools address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A full browser WebSocket URL; used as-is.
    WebSocket(String),
    /// `host:port` of the DevTools HTTP server.
    Http(String),
}

impl Endpoint {
    pub fn parse(uri: &str) -> Self {
        let uri = uri.trim();
        if (uri.starts_with("ws://") || uri.starts_with("wss://")) && uri.contains("/devtools/") {
            return Endpoint::WebSocket(uri.to_string());
        }
        let authority = ["ws://", "wss://", "http://", "https://"]
            .iter()
            .find_map(|p| uri.strip_prefix(p))
            .unwrap_or(uri)
            .trim_end_matches('/');
        Endpoint::Http(authority.to_string())
    }

    fn http_url(authority: &str, path: &str) -> String {
        format!("http://{authority}{path}")
    }
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "Browser", default)]
    browser: String,
    #[serde(rename = "Protocol-Version", default)]
    protocol_version: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

#[derive(Debug, Deserialize)]
struct ClientRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Rewrite the authority of a discovered WebSocket URL to the one we were
/// configured with. Chrome reports the address it bound to (often
/// `127.0.0.1` inside a container), which is not necessarily reachable.
pub fn rebase_ws_url(discovered: &str, authority: &str) -> String {
    match discovered.find("/devtools/") {
        Some(pos) => format!("ws://{authority}{}", &discovered[pos..]),
        None => discovered.to_string(),
    }
}

/// [`RenderBackend`] backed by a remote Chrome/Chromium instance.
#[derive(Debug, Clone)]
pub struct ChromeBackend {
    endpoint: Endpoint,
}

impl ChromeBackend {
    pub fn new(chrome_uri: &str) -> Self {
        Self {
            endpoint: Endpoint::parse(chrome_uri),
        }
    }

    fn http_client() -> Result<reqwest::blocking::Client, BackendError> {
        reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Connect(e.to_string()))
    }

    fn version_info(authority: &str) -> Result<VersionInfo, BackendError> {
        let url = Endpoint::http_url(authority, "/json/version");
        Self::http_client()?
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<VersionInfo>())
            .map_err(|e| BackendError::Connect(format!("GET {url}: {e}")))
    }

    fn websocket_url(&self) -> Result<String, BackendError> {
        match &self.endpoint {
            Endpoint::WebSocket(url) => Ok(url.clone()),
            Endpoint::Http(authority) => {
                let info = Self::version_info(authority)?;
                Ok(rebase_ws_url(&info.web_socket_debugger_url, authority))
            }
        }
    }
}

impl RenderBackend for ChromeBackend {
    fn name(&self) -> &str {
        "chrome"
    }

    fn open_session(&self, timeout: Duration) -> Result<Box<dyn BackendSession>, BackendError> {
        let ws_url = self.websocket_url()?;
        debug!("Connecting to {}", ws_url);

        let browser = Browser::connect(ws_url).map_err(|e| BackendError::Connect(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| BackendError::Connect(format!("new tab: {e}")))?;
        tab.set_default_timeout(timeout);

        Ok(Box::new(ChromeSession {
            tab,
            _browser: browser,
        }))
    }

    fn status(&self) -> Result<BackendStatus, BackendError> {
        let authority = match &self.endpoint {
            Endpoint::Http(a) => a.clone(),
            Endpoint::WebSocket(url) => url
                .split("://")
                .nth(1)
                .and_then(|rest| rest.split('/').next())
                .unwrap_or_default()
                .to_string(),
        };

        let info = Self::version_info(&authority).map_err(|e| BackendError::Status(e.to_string()))?;
        let url = Endpoint::http_url(&authority, "/json/list");
        let targets = Self::http_client()?
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<Vec<TargetSummary>>())
            .map_err(|e| BackendError::Status(format!("GET {url}: {e}")))?;

        Ok(BackendStatus {
            browser: info.browser,
            protocol_version: info.protocol_version,
            targets,
        })
    }
}

/// One tab on the remote browser; the tab is closed on drop.
struct ChromeSession {
    tab: Arc<Tab>,
    // Keeps the DevTools connection alive for as long as the tab is used.
    _browser: Browser,
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            debug!("Closing tab failed (already gone?): {}", e);
        }
    }
}

fn to_viewport(clip: &ClipRect) -> Page::Viewport {
    Page::Viewport {
        x: clip.x,
        y: clip.y,
        width: clip.width,
        height: clip.height,
        scale: clip.scale,
    }
}

fn to_pdf_options(options: &PrintOptions) -> PrintToPdfOptions {
    PrintToPdfOptions {
        display_header_footer: Some(options.display_header_footer),
        print_background: Some(options.print_background),
        paper_width: options.paper.map(|p| p.width),
        paper_height: options.paper.map(|p| p.height),
        margin_top: options.margins.top,
        margin_bottom: options.margins.bottom,
        margin_left: options.margins.left,
        margin_right: options.margins.right,
        header_template: options.header_template.clone(),
        footer_template: options.footer_template.clone(),
        ..Default::default()
    }
}

impl BackendSession for ChromeSession {
    fn navigate(&mut self, target: &str) -> Result<(), BackendError> {
        self.tab
            .navigate_to(target)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ())
            .map_err(|e| BackendError::Navigate(e.to_string()))
    }

    fn print_pdf(&mut self, options: &PrintOptions) -> Result<Vec<u8>, BackendError> {
        self.tab
            .print_to_pdf(Some(to_pdf_options(options)))
            .map_err(|e| BackendError::Print(e.to_string()))
    }

    fn capture(&mut self, request: &CaptureRequest) -> Result<Vec<u8>, BackendError> {
        self.tab
            .capture_screenshot(
                Page::CaptureScreenshotFormatOption::Png,
                None,
                request.clip.as_ref().map(to_viewport),
                request.from_surface,
            )
            .map_err(|e| BackendError::Capture(e.to_string()))
    }

    fn element_boxes(&mut self, selector: &ElementSelector) -> Result<Vec<ClipRect>, BackendError> {
        let elements = match selector {
            ElementSelector::Css(css) => self.tab.find_elements(css),
            ElementSelector::XPath(xpath) => self.tab.find_elements_by_xpath(xpath),
        }
        .map_err(|e| BackendError::Query(format!("{selector:?}: {e}")))?;

        elements
            .iter()
            .map(|element| {
                let object = element
                    .call_js_fn(CLIENT_RECT_JS, vec![], false)
                    .map_err(|e| BackendError::Query(e.to_string()))?;
                let json = object
                    .value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| BackendError::Query("bounding box not returned".into()))?;
                let rect: ClientRect =
                    serde_json::from_str(json).map_err(|e| BackendError::Query(e.to_string()))?;
                Ok(ClipRect {
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    scale: 1.0,
                })
            })
            .collect()
    }
}
