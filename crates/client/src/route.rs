//! Request interception: patterns, handlers, and resolutions.
//!
//! A route handler is a synchronous decision function over the intercepted
//! request. It returns a [`Resolution`], so every intercepted request is
//! resolved by construction; there is no way to leave a request hanging.
//! The page's event task performs the wire send for the chosen resolution.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use trypw_protocol::RequestRecord;

/// Decision for an intercepted request.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Let the request proceed to the network unchanged.
    Continue,
    /// Answer the request with a synthetic response.
    Fulfill(FulfillOptions),
    /// Fail the request with the given error code ("failed", "aborted", ...).
    Abort(&'static str),
}

/// Synthetic response for [`Resolution::Fulfill`].
#[derive(Debug, Clone, Default)]
pub struct FulfillOptions {
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub body: Option<Vec<u8>>,
    pub headers: Option<Vec<(String, String)>>,
}

impl FulfillOptions {
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Convenience for JSON bodies: sets the body and the content type.
    pub fn json_body(mut self, value: &serde_json::Value) -> Self {
        self.body = Some(value.to_string().into_bytes());
        self.content_type = Some("application/json".to_string());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }
}

pub(crate) type RouteHandler = Arc<dyn Fn(&RequestRecord) -> Resolution + Send + Sync>;

pub(crate) struct RouteEntry {
    pub(crate) id: u64,
    pub(crate) pattern: String,
    pub(crate) handler: RouteHandler,
}

pub(crate) type RouteRegistry = Arc<Mutex<Vec<RouteEntry>>>;

static NEXT_ROUTE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_route_id() -> u64 {
    NEXT_ROUTE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Checks whether a URL matches a route glob pattern.
///
/// `*` and `?` have their usual glob meaning; an invalid pattern falls back
/// to exact string comparison.
pub(crate) fn matches_pattern(pattern: &str, url: &str) -> bool {
    match glob::Pattern::new(pattern) {
        Ok(glob_pattern) => glob_pattern.matches(url),
        Err(_) => pattern == url,
    }
}

/// Resolves an intercepted request against the registry.
///
/// Handlers are consulted in registration order and the first whose pattern
/// matches decides. A request no handler matches continues to the network.
pub(crate) fn resolve(registry: &RouteRegistry, request: &RequestRecord) -> Resolution {
    let entries = registry.lock();
    for entry in entries.iter() {
        if matches_pattern(&entry.pattern, request.url()) {
            return (entry.handler)(request);
        }
    }
    Resolution::Continue
}

/// Keeps a route handler registered; dropping it unregisters the handler.
pub struct RouteBinding {
    id: u64,
    registry: RouteRegistry,
}

impl RouteBinding {
    pub(crate) fn new(id: u64, registry: &RouteRegistry) -> Self {
        Self {
            id,
            registry: Arc::clone(registry),
        }
    }
}

impl Drop for RouteBinding {
    fn drop(&mut self) {
        self.registry.lock().retain(|entry| entry.id != self.id);
    }
}
