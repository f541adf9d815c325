//! Shared lifecycle state for the typed handles.
//!
//! Every remote object handle (browser, context, page) wraps a [`HandleCore`]
//! that tracks the object's lifecycle and its children. Closing a handle
//! locally closes every descendant, mirroring the driver's own cascade, so
//! use-after-close is caught on this side of the pipe without a round trip.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trypw_runtime::channel::Channel;
use trypw_runtime::error::{Error, Result};

/// Lifecycle of a remote object handle.
///
/// `Created` covers the window between receiving the object's GUID and
/// finishing local wiring (event subscription, registry setup); `Active` is
/// the normal operating state; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandleState {
    Created,
    Active,
    Closed,
}

pub(crate) struct HandleCore {
    channel: Channel,
    target_type: &'static str,
    state: Mutex<HandleState>,
    children: Mutex<Vec<Arc<HandleCore>>>,
}

impl HandleCore {
    pub(crate) fn new(channel: Channel, target_type: &'static str) -> Arc<Self> {
        Arc::new(Self {
            channel,
            target_type,
            state: Mutex::new(HandleState::Created),
            children: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn channel(&self) -> &Channel {
        &self.channel
    }

    pub(crate) fn guid(&self) -> &str {
        self.channel.guid()
    }

    pub(crate) fn target_type(&self) -> &'static str {
        self.target_type
    }

    /// Marks local wiring complete.
    pub(crate) fn activate(&self) {
        let mut state = self.state.lock();
        if *state == HandleState::Created {
            *state = HandleState::Active;
        }
    }

    /// Fails with `TargetClosed` if the handle has been closed.
    pub(crate) fn ensure_open(&self, operation: &str) -> Result<()> {
        if *self.state.lock() == HandleState::Closed {
            return Err(Error::TargetClosed {
                target_type: self.target_type,
                context: format!("Cannot call {operation} after close"),
            });
        }
        Ok(())
    }

    pub(crate) fn is_closed(&self) -> bool {
        *self.state.lock() == HandleState::Closed
    }

    /// Transitions to `Closed`, returning false if already closed.
    ///
    /// Exactly one caller observes `true`, which keeps the close RPC from
    /// being sent twice. Children are closed recursively.
    pub(crate) fn begin_close(&self) -> bool {
        {
            let mut state = self.state.lock();
            if *state == HandleState::Closed {
                return false;
            }
            *state = HandleState::Closed;
        }
        self.close_children();
        true
    }

    /// Marks this handle and all descendants closed without sending anything.
    ///
    /// Used when the driver reports the object gone (close event, parent
    /// cascade).
    pub(crate) fn mark_closed(&self) {
        {
            let mut state = self.state.lock();
            if *state == HandleState::Closed {
                return;
            }
            *state = HandleState::Closed;
        }
        self.close_children();
    }

    fn close_children(&self) {
        let children = std::mem::take(&mut *self.children.lock());
        for child in children {
            child.mark_closed();
        }
    }

    /// Registers a child whose lifetime is bounded by this handle's.
    pub(crate) fn adopt_child(&self, child: Arc<HandleCore>) {
        self.children.lock().push(child);
    }
}

impl std::fmt::Debug for HandleCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleCore")
            .field("guid", &self.guid())
            .field("target_type", &self.target_type)
            .field("state", &*self.state.lock())
            .finish()
    }
}

/// GUID reference to a remote object, as embedded in driver responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ObjectRef {
    #[serde(
        serialize_with = "trypw_runtime::connection::serialize_arc_str",
        deserialize_with = "trypw_runtime::connection::deserialize_arc_str"
    )]
    pub(crate) guid: Arc<str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use tokio::io::duplex;
    use trypw_runtime::connection::Connection;
    use trypw_runtime::transport::PipeTransport;

    fn test_channel(guid: &str) -> Channel {
        let (_a, b) = duplex(64);
        let (_c, d) = duplex(64);
        let (transport, message_rx) = PipeTransport::new(b, d);
        let connection = StdArc::new(Connection::new(transport.into_transport_parts(message_rx)));
        Channel::new(StdArc::from(guid), connection)
    }

    #[test]
    fn close_is_observed_exactly_once() {
        let core = HandleCore::new(test_channel("page@1"), "Page");
        core.activate();

        assert!(core.begin_close());
        assert!(!core.begin_close());
        assert!(!core.begin_close());
    }

    #[test]
    fn operations_fail_after_close() {
        let core = HandleCore::new(test_channel("page@1"), "Page");
        core.activate();
        assert!(core.ensure_open("goto").is_ok());

        core.begin_close();
        let err = core.ensure_open("goto").unwrap_err();
        assert!(err.is_target_closed());
        assert!(err.to_string().contains("goto"));
    }

    #[test]
    fn closing_parent_closes_children() {
        let browser = HandleCore::new(test_channel("browser@1"), "Browser");
        let context = HandleCore::new(test_channel("browser-context@1"), "BrowserContext");
        let page = HandleCore::new(test_channel("page@1"), "Page");

        context.adopt_child(Arc::clone(&page));
        browser.adopt_child(Arc::clone(&context));

        browser.begin_close();
        assert!(context.is_closed());
        assert!(page.is_closed());
    }
}
