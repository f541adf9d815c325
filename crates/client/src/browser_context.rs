//! BrowserContext - an isolated browsing profile.

use crate::handle::{HandleCore, ObjectRef};
use crate::page::Page;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use trypw_runtime::Result;
use trypw_runtime::channel::Channel;

/// An isolated browsing context with its own cookies, permissions, and
/// emulation settings.
#[derive(Clone)]
pub struct BrowserContext {
    core: Arc<HandleCore>,
}

#[derive(Deserialize)]
struct NewPageResult {
    page: ObjectRef,
}

impl BrowserContext {
    pub(crate) fn wire(channel: Channel) -> Self {
        let core = HandleCore::new(channel, "BrowserContext");
        core.activate();
        Self { core }
    }

    pub(crate) fn core(&self) -> Arc<HandleCore> {
        Arc::clone(&self.core)
    }

    /// Opens a new page in this context.
    pub async fn new_page(&self) -> Result<Page> {
        self.open_page(None).await
    }

    /// Opens a page that owns this context and closes it when the page
    /// closes. Used by browser-level page creation.
    pub(crate) async fn new_owned_page(&self) -> Result<Page> {
        self.open_page(Some(self.clone())).await
    }

    async fn open_page(&self, owned_context: Option<BrowserContext>) -> Result<Page> {
        self.core.ensure_open("new_page")?;
        let result: NewPageResult = self.core.channel().send("newPage", json!({})).await?;
        let page = Page::wire(
            self.core.channel().for_guid(&result.page.guid),
            owned_context,
        );
        self.core.adopt_child(page.core());
        Ok(page)
    }

    /// Closes the context and all its pages. Idempotent.
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

    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }
}

impl std::fmt::Debug for BrowserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserContext")
            .field("guid", &self.core.guid())
            .finish()
    }
}
