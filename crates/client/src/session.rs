//! Session - owns the driver process and the connection.
//!
//! The handshake with the driver is fixed: the client sends `initialize` on
//! the root object (guid `""`) with `{"sdkLanguage": "rust"}`, and the
//! driver's result must inline the engine object references:
//!
//! ```json
//! {
//!   "playwright": {
//!     "guid": "...",
//!     "chromium": { "guid": "..." },
//!     "firefox":  { "guid": "..." },
//!     "webkit":   { "guid": "..." }
//!   }
//! }
//! ```
//!
//! A driver that announces its objects through side events instead has to be
//! fronted by a shim that answers this handshake; a result without the three
//! engine references fails the connect with a protocol error.

use crate::browser_type::BrowserType;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use trypw_runtime::channel::Channel;
use trypw_runtime::connection::Connection;
use trypw_runtime::error::{Error, Result};
use trypw_runtime::server::DriverServer;
use trypw_runtime::transport::PipeTransport;

/// Root handle for one driver session.
///
/// Launching a session spawns the driver process and performs the
/// `initialize` handshake; the resulting handle exposes the three browser
/// engines. Dropping the session force-kills the driver, so the process is
/// released on every exit path, including mid-sequence errors.
pub struct Session {
    server: Option<DriverServer>,
    run_task: JoinHandle<()>,
    chromium: BrowserType,
    firefox: BrowserType,
    webkit: BrowserType,
}

impl Session {
    /// Spawns the driver process and connects to it.
    pub async fn launch() -> Result<Self> {
        let mut server = DriverServer::launch().await?;
        let stdin = server
            .process
            .stdin
            .take()
            .ok_or_else(|| Error::LaunchFailed("driver stdin was not captured".to_string()))?;
        let stdout = server
            .process
            .stdout
            .take()
            .ok_or_else(|| Error::LaunchFailed("driver stdout was not captured".to_string()))?;

        Self::connect(Some(server), stdin, stdout).await
    }

    /// Attaches to an already-running driver over arbitrary async pipes.
    ///
    /// The caller keeps ownership of the driver's lifetime. Used by tests
    /// and custom deployments.
    pub async fn over_pipe(
        writer: impl AsyncWrite + Send + Unpin + 'static,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Result<Self> {
        Self::connect(None, writer, reader).await
    }

    async fn connect(
        server: Option<DriverServer>,
        writer: impl AsyncWrite + Send + Unpin + 'static,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Result<Self> {
        let (transport, message_rx) = PipeTransport::new(writer, reader);
        let parts = transport.into_transport_parts(message_rx);
        let connection = Arc::new(Connection::new(parts));

        let run_task = {
            let connection = Arc::clone(&connection);
            tokio::spawn(async move {
                connection.run().await;
            })
        };

        let root = Channel::new(Arc::from(""), connection);
        let init: Value = root
            .send("initialize", json!({ "sdkLanguage": "rust" }))
            .await?;

        let engine = |name: &'static str| -> Result<BrowserType> {
            match init["playwright"][name]["guid"].as_str() {
                Some(guid) => Ok(BrowserType::new(name, root.for_guid(guid))),
                None => Err(Error::Protocol(format!(
                    "initialize result has no playwright.{name} object reference; \
                     the driver must inline the engine references in the handshake"
                ))),
            }
        };

        Ok(Self {
            server,
            run_task,
            chromium: engine("chromium")?,
            firefox: engine("firefox")?,
            webkit: engine("webkit")?,
        })
    }

    pub fn chromium(&self) -> &BrowserType {
        &self.chromium
    }

    pub fn firefox(&self) -> &BrowserType {
        &self.firefox
    }

    pub fn webkit(&self) -> &BrowserType {
        &self.webkit
    }

    /// Stops the driver process and tears down the connection.
    pub async fn shutdown(mut self) -> Result<()> {
        self.run_task.abort();
        if let Some(server) = self.server.take() {
            server.shutdown().await?;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.run_task.abort();
        if let Some(server) = &mut self.server {
            // Best-effort kill; shutdown() is the graceful path.
            let _ = server.process.start_kill();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("owns_driver", &self.server.is_some())
            .finish()
    }
}
