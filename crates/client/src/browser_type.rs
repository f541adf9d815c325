//! BrowserType - one of the driver's browser engines.

use crate::browser::Browser;
use crate::handle::ObjectRef;
use serde::Deserialize;
use trypw_protocol::LaunchOptions;
use trypw_runtime::Result;
use trypw_runtime::channel::Channel;

/// A browser engine (chromium, firefox, or webkit).
///
/// Obtained from the session handle; launches [`Browser`] instances.
#[derive(Clone)]
pub struct BrowserType {
    name: &'static str,
    channel: Channel,
}

#[derive(Deserialize)]
struct LaunchResult {
    browser: ObjectRef,
}

impl BrowserType {
    pub(crate) fn new(name: &'static str, channel: Channel) -> Self {
        Self { name, channel }
    }

    /// Returns the engine name ("chromium", "firefox", or "webkit").
    pub fn name(&self) -> &str {
        self.name
    }

    /// Launches a browser instance with default options.
    pub async fn launch(&self) -> Result<Browser> {
        self.launch_with_options(LaunchOptions::default()).await
    }

    /// Launches a browser instance.
    ///
    /// An engine that cannot start (missing binary, launch timeout) surfaces
    /// as the driver's remote error.
    pub async fn launch_with_options(&self, options: LaunchOptions) -> Result<Browser> {
        let result: LaunchResult = self.channel.send("launch", options).await?;
        Ok(Browser::wire(
            self.channel.for_guid(&result.browser.guid),
            self.name,
        ))
    }
}

impl std::fmt::Debug for BrowserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserType")
            .field("name", &self.name)
            .field("guid", &self.channel.guid())
            .finish()
    }
}
