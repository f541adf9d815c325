//! Futures that resolve when the page sees a matching network event.
//!
//! A waiter is registered synchronously, so it observes every event emitted
//! after the call that created it, even while the caller is still awaiting
//! the action that triggers the traffic.

use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use trypw_runtime::error::{Error, Result};

/// Which event stream a pending waiter watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaiterKind {
    Request,
    Response,
}

/// A registered waiter, held by the page until its pattern matches.
pub(crate) struct PendingWaiter {
    pub(crate) kind: WaiterKind,
    pub(crate) pattern: String,
    pub(crate) tx: oneshot::Sender<Value>,
}

/// Future returned by `Page::wait_for_request` / `wait_for_response`.
///
/// Resolves with the first matching event's record. Fails with
/// [`Error::TargetClosed`] if the page closes before a match arrives.
pub struct Waiter<T> {
    rx: oneshot::Receiver<Value>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Waiter<T> {
    pub(crate) fn new(rx: oneshot::Receiver<Value>) -> Self {
        Self {
            rx,
            _record: PhantomData,
        }
    }
}

impl<T: serde::de::DeserializeOwned> Future for Waiter<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(value)) => {
                Poll::Ready(serde_json::from_value(value).map_err(Into::into))
            }
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::TargetClosed {
                target_type: "Page",
                context: "Page closed while waiting for a network event".to_string(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}
