//! Browser - a launched engine instance.

use crate::browser_context::BrowserContext;
use crate::handle::{HandleCore, ObjectRef};
use crate::page::Page;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use trypw_protocol::ContextOptions;
use trypw_runtime::Result;
use trypw_runtime::channel::Channel;

/// A running browser instance.
///
/// Creates isolated [`BrowserContext`]s; closing the browser closes every
/// context and page created from it.
#[derive(Clone)]
pub struct Browser {
    core: Arc<HandleCore>,
    name: &'static str,
}

#[derive(Deserialize)]
struct NewContextResult {
    context: ObjectRef,
}

impl Browser {
    pub(crate) fn wire(channel: Channel, name: &'static str) -> Self {
        let core = HandleCore::new(channel, "Browser");
        core.activate();
        Self { core, name }
    }

    /// Returns the engine name this browser was launched from.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Creates an isolated browsing context.
    ///
    /// Use [`ContextOptions::builder`](trypw_protocol::ContextOptions::builder)
    /// for device emulation; a preset's fields are merged underneath any
    /// explicitly set options.
    pub async fn new_context(&self, options: ContextOptions) -> Result<BrowserContext> {
        self.core.ensure_open("new_context")?;
        let result: NewContextResult = self.core.channel().send("newContext", options).await?;
        let context = BrowserContext::wire(self.core.channel().for_guid(&result.context.guid));
        self.core.adopt_child(context.core());
        Ok(context)
    }

    /// Creates a page in a fresh default context.
    ///
    /// The implicit context is owned by the page and closed with it.
    pub async fn new_page(&self) -> Result<Page> {
        self.core.ensure_open("new_page")?;
        let context = self.new_context(ContextOptions::default()).await?;
        context.new_owned_page().await
    }

    /// Closes the browser and everything in it. Idempotent.
    pub async fn close(&self) -> Result<()> {
        if !self.core.begin_close() {
            return Ok(());
        }
        match self.core.channel().send_no_result("close", json!({})).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_target_closed() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Whether `close()` has been called or the driver reported the browser
    /// gone.
    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser")
            .field("name", &self.name)
            .field("guid", &self.core.guid())
            .finish()
    }
}
