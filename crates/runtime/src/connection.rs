//! JSON-RPC connection layer on top of the pipe transport.
//!
//! This module implements request/response correlation and event dispatch:
//!
//! 1. A caller invokes `send_message()` with a target GUID, method, and params
//! 2. The connection assigns a sequential ID and registers a oneshot callback
//! 3. The request is queued to the writer task and the caller awaits the oneshot
//! 4. The message loop reads inbound frames, correlates responses by ID, and
//!    forwards events to the subscriber registered for the emitting GUID

use crate::error::{Error, Result};
use crate::transport::{PipeReceiver, PipeSender, TransportParts};
use parking_lot::Mutex as ParkingLotMutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{mpsc, oneshot};

/// Metadata attached to every protocol request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Unix timestamp in milliseconds.
    #[serde(rename = "wallTime")]
    pub wall_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal: Option<bool>,
}

impl Metadata {
    /// Minimal metadata with the current timestamp.
    pub fn now() -> Self {
        let wall_time = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self {
            wall_time,
            internal: Some(false),
        }
    }
}

/// Protocol request sent to the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Unique request ID for correlating responses.
    pub id: u32,
    /// GUID of the target object (format: "type@hash").
    #[serde(
        serialize_with = "serialize_arc_str",
        deserialize_with = "deserialize_arc_str"
    )]
    pub guid: Arc<str>,
    /// Method name to invoke.
    pub method: String,
    /// Method parameters as a JSON object.
    pub params: Value,
    pub metadata: Metadata,
}

pub fn serialize_arc_str<S>(arc: &Arc<str>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(arc)
}

pub fn deserialize_arc_str<'de, D>(deserializer: D) -> std::result::Result<Arc<str>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    Ok(Arc::from(s.as_str()))
}

/// Protocol response from the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID this response correlates to.
    pub id: u32,
    /// Success result (mutually exclusive with `error`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error result (mutually exclusive with `result`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorWrapper>,
}

/// Wrapper for the driver's error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorWrapper {
    pub error: ErrorPayload,
}

/// Driver-side error details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    /// Error type name (e.g. "TimeoutError", "TargetClosedError").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Protocol event emitted by a driver-side object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// GUID of the object that emitted the event.
    #[serde(
        serialize_with = "serialize_arc_str",
        deserialize_with = "deserialize_arc_str"
    )]
    pub guid: Arc<str>,
    /// Event method name.
    pub method: String,
    /// Event parameters as a JSON object.
    pub params: Value,
}

/// Discriminated union of inbound protocol messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// Response message (has an `id` field).
    Response(Response),
    /// Event message (no `id` field).
    Event(Event),
    /// Forward-compatible catch-all.
    Unknown(Value),
}

/// Pending request callbacks keyed by request ID.
type CallbackMap = Arc<TokioMutex<HashMap<u32, oneshot::Sender<Result<Value>>>>>;

/// Event subscribers keyed by the GUID of the emitting object.
type SubscriberMap = ParkingLotMutex<HashMap<Arc<str>, mpsc::UnboundedSender<Event>>>;

/// RAII guard ensuring callback cleanup when a request future is dropped.
struct CancelGuard {
    id: u32,
    callbacks: CallbackMap,
    completed: bool,
}

impl CancelGuard {
    fn new(id: u32, callbacks: CallbackMap) -> Self {
        Self {
            id,
            callbacks,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        let id = self.id;
        let callbacks = Arc::clone(&self.callbacks);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if callbacks.lock().await.remove(&id).is_some() {
                    tracing::debug!(id, "removed orphaned callback for cancelled request");
                }
            });
        }
    }
}

/// Future returned by [`Connection::send_message`] with cancellation cleanup.
struct ResponseFuture {
    rx: oneshot::Receiver<Result<Value>>,
    guard: CancelGuard,
}

impl Future for ResponseFuture {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(result) => {
                self.guard.complete();
                Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// JSON-RPC connection to the automation driver.
///
/// Uses sequential request IDs and oneshot channels for correlation. Events
/// are routed to at most one subscriber per GUID; events for GUIDs without a
/// subscriber are logged and dropped.
pub struct Connection {
    /// Sequential request ID counter.
    last_id: AtomicU32,
    /// Pending request callbacks keyed by request ID.
    callbacks: CallbackMap,
    /// Queue feeding the writer task.
    outbound_tx: mpsc::UnboundedSender<Value>,
    /// Transport sender, taken by `run()` to start the writer task.
    transport_sender: TokioMutex<Option<PipeSender>>,
    /// Transport receiver, taken by `run()` to start the reader task.
    transport_receiver: TokioMutex<Option<PipeReceiver>>,
    /// Inbound messages from the transport, taken by `run()`.
    message_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
    /// Outbound queue receiver, taken by `run()`.
    outbound_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
    /// Per-GUID event subscribers (parking_lot for sync access from Drop impls).
    subscribers: SubscriberMap,
}

impl Connection {
    /// Creates a connection over the given transport parts.
    pub fn new(parts: TransportParts) -> Self {
        let TransportParts {
            sender,
            receiver,
            message_rx,
        } = parts;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Self {
            last_id: AtomicU32::new(0),
            callbacks: Arc::new(TokioMutex::new(HashMap::new())),
            outbound_tx,
            transport_sender: TokioMutex::new(Some(sender)),
            transport_receiver: TokioMutex::new(Some(receiver)),
            message_rx: TokioMutex::new(Some(message_rx)),
            outbound_rx: TokioMutex::new(Some(outbound_rx)),
            subscribers: ParkingLotMutex::new(HashMap::new()),
        }
    }

    /// Sends a request to the driver and awaits the correlated response.
    pub async fn send_message(&self, guid: &str, method: &str, params: Value) -> Result<Value> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(id, guid, method, "sending request");

        let (tx, rx) = oneshot::channel();
        self.callbacks.lock().await.insert(id, tx);

        let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

        let request = Request {
            id,
            guid: Arc::from(guid),
            method: method.to_string(),
            params,
            metadata: Metadata::now(),
        };

        let request_value = serde_json::to_value(&request)?;

        if self.outbound_tx.send(request_value).is_err() {
            tracing::error!(id, "failed to queue request: outbound channel closed");
            return Err(Error::ChannelClosed);
        }

        ResponseFuture { rx, guard }.await
    }

    /// Subscribes to events emitted by the object with the given GUID.
    ///
    /// Replaces any previous subscriber for that GUID.
    pub fn subscribe(&self, guid: &str) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().insert(Arc::from(guid), tx);
        rx
    }

    /// Removes the event subscriber for a GUID, if any.
    pub fn unsubscribe(&self, guid: &str) {
        self.subscribers.lock().remove(guid);
    }

    /// Runs the message dispatch loop until the transport closes.
    ///
    /// Spawns the reader and writer tasks, then dispatches inbound messages.
    /// Pending requests are failed with [`Error::ChannelClosed`] on exit.
    pub async fn run(self: &Arc<Self>) {
        let transport_receiver = self
            .transport_receiver
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport receiver already taken");

        let mut transport_sender = self
            .transport_sender
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport sender already taken");

        let mut outbound_rx = self
            .outbound_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once - outbound receiver already taken");

        let reader_handle = tokio::spawn(async move {
            if let Err(e) = transport_receiver.run().await {
                tracing::error!("transport read error: {e}");
            }
        });

        let writer_handle = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = transport_sender.send(message).await {
                    tracing::error!("transport write error: {e}");
                    break;
                }
            }
        });

        let mut message_rx = self
            .message_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once - message receiver already taken");

        while let Some(message_value) = message_rx.recv().await {
            match serde_json::from_value::<Message>(message_value) {
                Ok(message) => {
                    if let Err(e) = self.dispatch_internal(message).await {
                        tracing::error!("error dispatching message: {e}");
                    }
                }
                Err(e) => {
                    tracing::error!("failed to parse message: {e}");
                }
            }
        }

        // Driver is gone. Anyone still waiting gets ChannelClosed.
        for (_, callback) in self.callbacks.lock().await.drain() {
            let _ = callback.send(Err(Error::ChannelClosed));
        }

        let _ = reader_handle.await;
        let _ = writer_handle.await;
    }

    /// Dispatches an incoming message (test-only public version).
    #[cfg(test)]
    pub async fn dispatch(self: &Arc<Self>, message: Message) -> Result<()> {
        self.dispatch_internal(message).await
    }

    async fn dispatch_internal(self: &Arc<Self>, message: Message) -> Result<()> {
        match message {
            Message::Response(response) => {
                let callback = self
                    .callbacks
                    .lock()
                    .await
                    .remove(&response.id)
                    .ok_or_else(|| {
                        Error::Protocol(format!(
                            "Cannot find request to respond: id={}",
                            response.id
                        ))
                    })?;

                let result = if let Some(wrapper) = response.error {
                    Err(parse_protocol_error(wrapper.error))
                } else {
                    Ok(response.result.unwrap_or(Value::Null))
                };

                let _ = callback.send(result);
                Ok(())
            }
            Message::Event(event) => {
                let subscriber = self.subscribers.lock().get(&event.guid).cloned();
                match subscriber {
                    Some(tx) => {
                        if tx.send(event.clone()).is_err() {
                            // Subscriber dropped its receiver; clean up.
                            self.subscribers.lock().remove(&event.guid);
                        }
                        Ok(())
                    }
                    None => {
                        tracing::debug!(
                            guid = %event.guid,
                            method = %event.method,
                            "event for unsubscribed object (ignored)"
                        );
                        Ok(())
                    }
                }
            }
            Message::Unknown(value) => {
                tracing::debug!(
                    "unknown message shape (ignored): {}",
                    serde_json::to_string(&value)
                        .unwrap_or_else(|_| "<serialization failed>".to_string())
                );
                Ok(())
            }
        }
    }
}

/// Converts a driver [`ErrorPayload`] into [`Error::Remote`].
fn parse_protocol_error(error: ErrorPayload) -> Error {
    Error::Remote {
        name: error.name.unwrap_or_else(|| "Error".to_string()),
        message: error.message,
        stack: error.stack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::PipeTransport;
    use tokio::io::duplex;

    fn create_test_connection() -> (Connection, tokio::io::DuplexStream, tokio::io::DuplexStream) {
        let (stdin_read, stdin_write) = duplex(1024);
        let (stdout_read, stdout_write) = duplex(1024);

        let (transport, message_rx) = PipeTransport::new(stdin_write, stdout_read);
        let parts = transport.into_transport_parts(message_rx);
        let connection = Connection::new(parts);

        (connection, stdin_read, stdout_write)
    }

    #[test]
    fn request_ids_increment() {
        let (connection, _, _) = create_test_connection();

        let id1 = connection.last_id.fetch_add(1, Ordering::SeqCst);
        let id2 = connection.last_id.fetch_add(1, Ordering::SeqCst);

        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
    }

    #[tokio::test]
    async fn dispatch_correlates_success_response() {
        let (connection, _, _) = create_test_connection();

        let id = connection.last_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        connection.callbacks.lock().await.insert(id, tx);

        let response = Message::Response(Response {
            id,
            result: Some(serde_json::json!({"status": "ok"})),
            error: None,
        });

        Arc::new(connection).dispatch(response).await.unwrap();

        let result = rx.await.unwrap().unwrap();
        assert_eq!(result["status"], "ok");
    }

    #[tokio::test]
    async fn dispatch_correlates_error_response() {
        let (connection, _, _) = create_test_connection();

        let id = connection.last_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        connection.callbacks.lock().await.insert(id, tx);

        let response = Message::Response(Response {
            id,
            result: None,
            error: Some(ErrorWrapper {
                error: ErrorPayload {
                    message: "Timeout 30000ms exceeded".to_string(),
                    name: Some("TimeoutError".to_string()),
                    stack: None,
                },
            }),
        });

        Arc::new(connection).dispatch(response).await.unwrap();

        let err = rx.await.unwrap().unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got: {err:?}");
    }

    #[tokio::test]
    async fn dispatch_routes_event_to_subscriber() {
        let (connection, _, _) = create_test_connection();
        let connection = Arc::new(connection);

        let mut events = connection.subscribe("page@abc");

        connection
            .dispatch(Message::Event(Event {
                guid: Arc::from("page@abc"),
                method: "route".to_string(),
                params: serde_json::json!({"url": "https://a.test"}),
            }))
            .await
            .unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.method, "route");
        assert_eq!(event.params["url"], "https://a.test");
    }

    #[tokio::test]
    async fn event_without_subscriber_is_dropped() {
        let (connection, _, _) = create_test_connection();
        let connection = Arc::new(connection);

        let result = connection
            .dispatch(Message::Event(Event {
                guid: Arc::from("page@nobody"),
                method: "console".to_string(),
                params: serde_json::json!({}),
            }))
            .await;

        assert!(result.is_ok());
    }

    #[test]
    fn message_deserializes_response() {
        let json = r#"{"id": 42, "result": {"status": "ok"}}"#;
        let message: Message = serde_json::from_str(json).unwrap();

        match message {
            Message::Response(response) => {
                assert_eq!(response.id, 42);
                assert!(response.result.is_some());
                assert!(response.error.is_none());
            }
            _ => panic!("expected Response"),
        }
    }

    #[test]
    fn message_deserializes_event() {
        let json = r#"{"guid": "page@abc", "method": "console", "params": {"text": "hi"}}"#;
        let message: Message = serde_json::from_str(json).unwrap();

        match message {
            Message::Event(event) => {
                assert_eq!(event.guid.as_ref(), "page@abc");
                assert_eq!(event.method, "console");
                assert_eq!(event.params["text"], "hi");
            }
            _ => panic!("expected Event"),
        }
    }

    #[test]
    fn protocol_error_maps_to_remote() {
        let error = parse_protocol_error(ErrorPayload {
            message: "timeout".to_string(),
            name: Some("TimeoutError".to_string()),
            stack: Some("stack trace".to_string()),
        });
        assert!(error.is_timeout());
        match &error {
            Error::Remote {
                name,
                message,
                stack,
            } => {
                assert_eq!(name, "TimeoutError");
                assert_eq!(message, "timeout");
                assert_eq!(stack.as_deref(), Some("stack trace"));
            }
            _ => panic!("expected Remote error"),
        }
    }
}
