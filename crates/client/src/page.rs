//! Page - a single tab, with navigation, input, evaluation, interception,
//! and capture operations.

use crate::browser_context::BrowserContext;
use crate::element::ElementHandle;
use crate::handle::{HandleCore, ObjectRef};
use crate::route::{
    FulfillOptions, Resolution, RouteBinding, RouteEntry, RouteRegistry, matches_pattern,
    next_route_id, resolve,
};
use crate::wait::{PendingWaiter, Waiter, WaiterKind};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use parking_lot::Mutex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use trypw_protocol::{
    DEFAULT_TIMEOUT_MS, GotoOptions, PdfOptions, RequestRecord, ResponseRecord, ScreenshotOptions,
};
use trypw_runtime::channel::Channel;
use trypw_runtime::connection::Event;
use trypw_runtime::error::{Error, Result};

/// A single page (tab).
///
/// Cheap to clone; all clones share the same remote object. A page created
/// through `Browser::new_page` owns its implicit context and closes it along
/// with itself.
#[derive(Clone)]
pub struct Page {
    inner: Arc<PageInner>,
}

struct PageInner {
    core: Arc<HandleCore>,
    routes: RouteRegistry,
    waiters: Mutex<Vec<PendingWaiter>>,
    current_url: Mutex<String>,
    owned_context: Option<BrowserContext>,
}

#[derive(Deserialize)]
struct ValueResult {
    value: Value,
}

#[derive(Deserialize)]
struct BinaryResult {
    binary: String,
}

#[derive(Deserialize)]
struct ElementsResult {
    #[serde(default)]
    elements: Vec<ObjectRef>,
}

#[derive(Deserialize)]
struct ElementResult {
    #[serde(default)]
    element: Option<ObjectRef>,
}

#[derive(Deserialize)]
struct VideoResult {
    #[serde(default)]
    path: Option<String>,
}

impl Page {
    pub(crate) fn wire(channel: Channel, owned_context: Option<BrowserContext>) -> Self {
        let core = HandleCore::new(channel.clone(), "Page");
        let inner = Arc::new(PageInner {
            core: Arc::clone(&core),
            routes: Arc::new(Mutex::new(Vec::new())),
            waiters: Mutex::new(Vec::new()),
            current_url: Mutex::new("about:blank".to_string()),
            owned_context,
        });

        let mut events = channel.subscribe();
        let weak = Arc::downgrade(&inner);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(inner) = weak.upgrade() else { break };
                PageInner::on_event(&inner, event).await;
            }
        });

        core.activate();
        Self { inner }
    }

    pub(crate) fn core(&self) -> Arc<HandleCore> {
        Arc::clone(&self.inner.core)
    }

    /// The page's current URL, updated from navigation events.
    pub fn url(&self) -> String {
        self.inner.current_url.lock().clone()
    }

    /// Navigates to `url` and waits for the default load condition.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.goto_with_options(url, GotoOptions::default()).await
    }

    /// Navigates to `url` with an explicit timeout or load condition.
    ///
    /// A driver-side navigation timeout surfaces as
    /// [`Error::NavigationTimeout`] carrying the URL and the effective
    /// timeout.
    pub async fn goto_with_options(&self, url: &str, options: GotoOptions) -> Result<()> {
        self.inner.core.ensure_open("goto")?;

        let timeout_ms = options.timeout.unwrap_or(DEFAULT_TIMEOUT_MS);
        let mut params = serde_json::to_value(&options)?;
        params["url"] = json!(url);

        match self.inner.core.channel().send_no_result("goto", params).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_timeout() => Err(Error::NavigationTimeout {
                url: url.to_string(),
                duration_ms: timeout_ms as u64,
            }),
            Err(e) => Err(e),
        }
    }

    /// Clicks the first element matching `selector`, waiting for it to be
    /// actionable.
    pub async fn click(&self, selector: &str) -> Result<()> {
        self.inner.core.ensure_open("click")?;
        self.inner
            .core
            .channel()
            .send_no_result("click", json!({ "selector": selector }))
            .await
    }

    /// Fills the matching input element with `value`.
    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.inner.core.ensure_open("fill")?;
        self.inner
            .core
            .channel()
            .send_no_result("fill", json!({ "selector": selector, "value": value }))
            .await
    }

    /// Focuses the matching element and presses a key ("Enter", "a", ...).
    pub async fn press(&self, selector: &str, key: &str) -> Result<()> {
        self.inner.core.ensure_open("press")?;
        self.inner
            .core
            .channel()
            .send_no_result("press", json!({ "selector": selector, "key": key }))
            .await
    }

    /// Reloads the page, waiting for the default load condition.
    pub async fn reload(&self) -> Result<()> {
        self.inner.core.ensure_open("reload")?;
        self.inner
            .core
            .channel()
            .send_no_result("reload", json!({}))
            .await
    }

    /// Returns the document title.
    pub async fn title(&self) -> Result<String> {
        self.inner.core.ensure_open("title")?;
        let result: ValueResult = self.inner.core.channel().send_no_params("title").await?;
        serde_json::from_value(result.value).map_err(Into::into)
    }

    /// Evaluates a JavaScript expression in the page and returns the result
    /// as JSON. Page exceptions surface as the driver's remote error.
    pub async fn evaluate_json(&self, expression: &str) -> Result<Value> {
        self.inner.core.ensure_open("evaluate")?;
        let result: ValueResult = self
            .inner
            .core
            .channel()
            .send("evaluateExpression", json!({ "expression": expression }))
            .await?;
        Ok(result.value)
    }

    /// Evaluates an expression and deserializes the result.
    pub async fn evaluate_typed<T: DeserializeOwned>(&self, expression: &str) -> Result<T> {
        let value = self.evaluate_json(expression).await?;
        serde_json::from_value(value).map_err(Into::into)
    }

    /// Returns a handle to every element matching the CSS selector, in
    /// document order. Empty when nothing matches.
    pub async fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        self.inner.core.ensure_open("querySelectorAll")?;
        let result: ElementsResult = self
            .inner
            .core
            .channel()
            .send("querySelectorAll", json!({ "selector": selector }))
            .await?;
        let channel = self.inner.core.channel();
        Ok(result
            .elements
            .iter()
            .map(|object| ElementHandle::from_ref(channel, object))
            .collect())
    }

    /// Returns a handle to the first element matching the CSS selector.
    pub async fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>> {
        self.inner.core.ensure_open("querySelector")?;
        let result: ElementResult = self
            .inner
            .core
            .channel()
            .send("querySelector", json!({ "selector": selector }))
            .await?;
        Ok(result
            .element
            .map(|object| ElementHandle::from_ref(self.inner.core.channel(), &object)))
    }

    /// Returns a future resolving with the first request whose URL matches
    /// the glob pattern.
    ///
    /// The waiter is registered before this call returns, so the usual shape
    /// is: create the waiter, perform the action that triggers the traffic,
    /// then await the waiter.
    pub fn wait_for_request(&self, pattern: impl Into<String>) -> Waiter<RequestRecord> {
        Waiter::new(self.inner.register_waiter(WaiterKind::Request, pattern.into()))
    }

    /// Returns a future resolving with the first response whose URL matches
    /// the glob pattern. See [`wait_for_request`](Self::wait_for_request)
    /// for the registration timing.
    pub fn wait_for_response(&self, pattern: impl Into<String>) -> Waiter<ResponseRecord> {
        Waiter::new(self.inner.register_waiter(WaiterKind::Response, pattern.into()))
    }

    /// Returns the path of the video recorded for this page.
    ///
    /// `None` unless the context was created with a `record_video_dir`.
    pub async fn video_path(&self) -> Result<Option<PathBuf>> {
        self.inner.core.ensure_open("video")?;
        let result: VideoResult = self.inner.core.channel().send_no_params("video").await?;
        Ok(result.path.map(PathBuf::from))
    }

    /// Registers a request interception handler for URLs matching `pattern`.
    ///
    /// Handlers are consulted in registration order; the first whose pattern
    /// matches decides the request's [`Resolution`]. Requests no handler
    /// matches continue to the network. The returned binding keeps the
    /// handler registered; dropping it unregisters.
    pub async fn route<F>(&self, pattern: impl Into<String>, handler: F) -> Result<RouteBinding>
    where
        F: Fn(&RequestRecord) -> Resolution + Send + Sync + 'static,
    {
        self.inner.core.ensure_open("route")?;

        let id = next_route_id();
        self.inner.routes.lock().push(RouteEntry {
            id,
            pattern: pattern.into(),
            handler: Arc::new(handler),
        });

        self.update_interception_patterns().await?;
        Ok(RouteBinding::new(id, &self.inner.routes))
    }

    async fn update_interception_patterns(&self) -> Result<()> {
        let patterns: Vec<Value> = self
            .inner
            .routes
            .lock()
            .iter()
            .map(|entry| json!({ "glob": entry.pattern }))
            .collect();

        self.inner
            .core
            .channel()
            .send_no_result(
                "setNetworkInterceptionPatterns",
                json!({ "patterns": patterns }),
            )
            .await
    }

    /// Captures a screenshot and returns the image bytes.
    pub async fn screenshot(&self, options: ScreenshotOptions) -> Result<Vec<u8>> {
        self.inner.core.ensure_open("screenshot")?;
        let result: BinaryResult = self.inner.core.channel().send("screenshot", options).await?;
        BASE64
            .decode(result.binary.as_bytes())
            .map_err(|e| Error::Protocol(format!("Invalid base64 screenshot payload: {e}")))
    }

    /// Captures a screenshot and writes it to `path`.
    pub async fn screenshot_to_file(
        &self,
        path: impl AsRef<Path>,
        options: ScreenshotOptions,
    ) -> Result<()> {
        let bytes = self.screenshot(options).await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Renders the page to PDF and returns the document bytes. Chromium only.
    pub async fn pdf(&self, options: PdfOptions) -> Result<Vec<u8>> {
        self.inner.core.ensure_open("pdf")?;
        let result: BinaryResult = self.inner.core.channel().send("pdf", options).await?;
        BASE64
            .decode(result.binary.as_bytes())
            .map_err(|e| Error::Protocol(format!("Invalid base64 pdf payload: {e}")))
    }

    /// Renders the page to PDF and writes it to `path`.
    pub async fn pdf_to_file(&self, path: impl AsRef<Path>, options: PdfOptions) -> Result<()> {
        let bytes = self.pdf(options).await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Closes the page, and its implicit context when the page owns one.
    /// Idempotent.
    pub async fn close(&self) -> Result<()> {
        if !self.inner.core.begin_close() {
            return Ok(());
        }
        self.inner.core.channel().unsubscribe();
        self.inner.fail_waiters();

        let close_result = match self
            .inner
            .core
            .channel()
            .send_no_result("close", json!({}))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_target_closed() => Ok(()),
            Err(e) => Err(e),
        };

        if let Some(context) = &self.inner.owned_context {
            let context_result = context.close().await;
            return close_result.and(context_result);
        }
        close_result
    }

    pub fn is_closed(&self) -> bool {
        self.inner.core.is_closed()
    }
}

impl PageInner {
    async fn on_event(inner: &Arc<PageInner>, event: Event) {
        match event.method.as_str() {
            "route" => Self::on_route_event(inner, event.params).await,
            "request" => inner.fire_waiters(WaiterKind::Request, &event.params["request"]),
            "response" => inner.fire_waiters(WaiterKind::Response, &event.params["response"]),
            "navigated" => {
                if let Some(url) = event.params["url"].as_str() {
                    *inner.current_url.lock() = url.to_string();
                }
            }
            "close" => {
                inner.core.mark_closed();
                inner.fail_waiters();
            }
            other => {
                tracing::trace!(guid = inner.core.guid(), method = other, "unhandled page event");
            }
        }
    }

    /// Registers a network-event waiter. A waiter registered on a closed
    /// page fails immediately.
    fn register_waiter(&self, kind: WaiterKind, pattern: String) -> oneshot::Receiver<Value> {
        let (tx, rx) = oneshot::channel();
        if !self.core.is_closed() {
            self.waiters.lock().push(PendingWaiter { kind, pattern, tx });
        }
        rx
    }

    /// Delivers a network event to every pending waiter whose pattern
    /// matches, removing the matched waiters.
    fn fire_waiters(&self, kind: WaiterKind, record: &Value) {
        let Some(url) = record["url"].as_str() else {
            tracing::warn!(guid = self.core.guid(), "network event without a url");
            return;
        };

        let mut waiters = self.waiters.lock();
        let mut index = 0;
        while index < waiters.len() {
            if waiters[index].kind == kind && matches_pattern(&waiters[index].pattern, url) {
                let waiter = waiters.remove(index);
                let _ = waiter.tx.send(record.clone());
            } else {
                index += 1;
            }
        }
    }

    /// Drops every pending waiter, failing their futures.
    fn fail_waiters(&self) {
        self.waiters.lock().clear();
    }

    /// Resolves one intercepted request and sends the decision to the driver.
    async fn on_route_event(inner: &Arc<PageInner>, params: Value) {
        let Some(route_guid) = params["route"]["guid"].as_str() else {
            tracing::warn!(guid = inner.core.guid(), "route event without route guid");
            return;
        };

        let request: RequestRecord = match serde_json::from_value(params["request"].clone()) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(guid = inner.core.guid(), "malformed route request: {e}");
                return;
            }
        };

        let resolution = resolve(&inner.routes, &request);
        let route_channel = inner.core.channel().for_guid(route_guid);

        let outcome = match resolution {
            Resolution::Continue => route_channel.send_no_result("continue", json!({})).await,
            Resolution::Fulfill(options) => {
                route_channel
                    .send_no_result("fulfill", fulfill_params(options))
                    .await
            }
            Resolution::Abort(error_code) => {
                route_channel
                    .send_no_result("abort", json!({ "errorCode": error_code }))
                    .await
            }
        };

        if let Err(e) = outcome {
            tracing::error!(url = request.url(), "failed to resolve intercepted request: {e}");
        }
    }
}

fn fulfill_params(options: FulfillOptions) -> Value {
    let mut headers: Vec<Value> = options
        .headers
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect();
    if let Some(content_type) = options.content_type {
        headers.push(json!({ "name": "content-type", "value": content_type }));
    }

    json!({
        "status": options.status.unwrap_or(200),
        "headers": headers,
        "body": BASE64.encode(options.body.unwrap_or_default()),
        "isBase64": true,
    })
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("guid", &self.inner.core.guid())
            .field("url", &*self.inner.current_url.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfill_params_encode_body_and_headers() {
        let params = fulfill_params(
            FulfillOptions::default()
                .status(201)
                .json_body(&json!({"ok": true}))
                .header("x-robot", "yes"),
        );

        assert_eq!(params["status"], 201);
        assert_eq!(params["isBase64"], true);
        let decoded = BASE64.decode(params["body"].as_str().unwrap()).unwrap();
        assert_eq!(decoded, br#"{"ok":true}"#);

        let headers = params["headers"].as_array().unwrap();
        assert!(headers.iter().any(|h| h["name"] == "x-robot"));
        assert!(
            headers
                .iter()
                .any(|h| h["name"] == "content-type" && h["value"] == "application/json")
        );
    }

    #[test]
    fn fulfill_params_default_to_200_empty_body() {
        let params = fulfill_params(FulfillOptions::default());
        assert_eq!(params["status"], 200);
        assert_eq!(params["body"], "");
    }
}
