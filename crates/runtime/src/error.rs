//! Error types for the trypw runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a browser session.
#[derive(Debug, Error)]
pub enum Error {
    /// The automation driver could not be located on this host.
    #[error("Automation driver not found. Install with: npm install playwright")]
    DriverNotFound,

    /// Failed to launch the driver process.
    #[error("Failed to launch driver: {0}. Check that Node.js is installed.")]
    LaunchFailed(String),

    /// Transport-level error (stdio framing or pipe failure).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol-level error (malformed or unexpected message).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error reported by the driver, with its original name and message.
    #[error("{name}: {message}")]
    Remote {
        /// Error type name (e.g. "TimeoutError", "TargetClosedError").
        name: String,
        /// Human-readable message.
        message: String,
        /// Driver-side stack trace, when available.
        stack: Option<String>,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout waiting for an operation.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Navigation did not reach its load condition in time.
    #[error("Navigation timeout after {duration_ms}ms navigating to '{url}'")]
    NavigationTimeout { url: String, duration_ms: u64 },

    /// Operation attempted on a closed browser, context, or page.
    #[error("Target closed: cannot perform operation on closed {target_type}. {context}")]
    TargetClosed {
        target_type: &'static str,
        context: String,
    },

    /// The connection to the driver went away.
    #[error("Connection closed unexpectedly")]
    ChannelClosed,
}

impl Error {
    /// Returns true if this is a timeout of any kind.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::NavigationTimeout { .. } => true,
            Error::Remote { name, .. } => name == "TimeoutError",
            _ => false,
        }
    }

    /// Returns true if the target (browser/context/page) is gone.
    pub fn is_target_closed(&self) -> bool {
        match self {
            Error::TargetClosed { .. } => true,
            Error::Remote { name, .. } => name == "TargetClosedError",
            _ => false,
        }
    }

    /// Returns the remote error name, if this error came from the driver.
    pub fn remote_name(&self) -> Option<&str> {
        match self {
            Error::Remote { name, .. } => Some(name),
            _ => None,
        }
    }
}
