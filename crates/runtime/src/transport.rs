//! Framed JSON transport over the driver's stdio pipes.
//!
//! Both directions use the same framing: a 4-byte little-endian length
//! prefix followed by exactly that many bytes of JSON. The receiver half
//! runs as its own task and forwards decoded messages on an unbounded
//! channel; the sender half is driven by the connection's writer task.

use crate::error::{Error, Result};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Writer half of the pipe transport.
pub struct PipeSender {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl PipeSender {
    /// Serializes and writes one framed message.
    pub async fn send(&mut self, message: Value) -> Result<()> {
        let payload = serde_json::to_vec(&message)?;
        let length = u32::try_from(payload.len())
            .map_err(|_| Error::Transport("Message exceeds u32 frame size".to_string()))?;

        self.writer
            .write_all(&length.to_le_bytes())
            .await
            .map_err(|e| Error::Transport(format!("Failed to write length prefix: {e}")))?;
        self.writer
            .write_all(&payload)
            .await
            .map_err(|e| Error::Transport(format!("Failed to write message body: {e}")))?;
        self.writer
            .flush()
            .await
            .map_err(|e| Error::Transport(format!("Failed to flush pipe: {e}")))?;

        Ok(())
    }
}

/// Reader half of the pipe transport.
pub struct PipeReceiver {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    message_tx: mpsc::UnboundedSender<Value>,
}

impl PipeReceiver {
    /// Reads framed messages until EOF or until the message channel closes.
    ///
    /// A clean EOF after a complete frame ends the loop with `Ok(())`; an
    /// incomplete length prefix or body is a transport error.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let mut length_buf = [0u8; 4];
            match self.reader.read_exact(&mut length_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // Pipe closed between frames: normal shutdown.
                    return Ok(());
                }
                Err(e) => {
                    return Err(Error::Transport(format!(
                        "Failed to read length prefix: {e}"
                    )));
                }
            }

            let length = u32::from_le_bytes(length_buf) as usize;
            let mut payload = vec![0u8; length];
            self.reader
                .read_exact(&mut payload)
                .await
                .map_err(|e| Error::Transport(format!("Failed to read message body: {e}")))?;

            let message: Value = serde_json::from_slice(&payload)
                .map_err(|e| Error::Transport(format!("Failed to parse message JSON: {e}")))?;

            if self.message_tx.send(message).is_err() {
                // Connection dropped its receiver: stop reading.
                return Ok(());
            }
        }
    }
}

/// Bidirectional framed transport over a pair of async pipes.
pub struct PipeTransport {
    sender: PipeSender,
    receiver: PipeReceiver,
}

/// The pieces the connection needs to take ownership of.
pub struct TransportParts {
    pub sender: PipeSender,
    pub receiver: PipeReceiver,
    pub message_rx: mpsc::UnboundedReceiver<Value>,
}

impl PipeTransport {
    /// Creates a transport writing to `writer` and reading from `reader`.
    ///
    /// Returns the transport and the receiving end of the inbound message
    /// channel. Works over child process stdio as well as in-memory duplex
    /// pipes in tests.
    pub fn new(
        writer: impl AsyncWrite + Send + Unpin + 'static,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let transport = Self {
            sender: PipeSender {
                writer: Box::new(writer),
            },
            receiver: PipeReceiver {
                reader: Box::new(reader),
                message_tx,
            },
        };
        (transport, message_rx)
    }

    /// Splits into sender and receiver halves.
    pub fn into_parts(self) -> (PipeSender, PipeReceiver) {
        (self.sender, self.receiver)
    }

    /// Bundles the halves with the inbound channel for the connection.
    pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<Value>) -> TransportParts {
        let (sender, receiver) = self.into_parts();
        TransportParts {
            sender,
            receiver,
            message_rx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    #[test]
    fn length_prefix_is_little_endian() {
        let length: u32 = 1234;
        let bytes = length.to_le_bytes();
        assert_eq!(bytes[0], (length & 0xFF) as u8);
        assert_eq!(bytes[1], ((length >> 8) & 0xFF) as u8);
        assert_eq!(u32::from_le_bytes(bytes), length);
    }

    #[tokio::test]
    async fn send_writes_framed_message() {
        let (mut our_end, their_end) = duplex(1024);
        let (_unused_read, unused_write) = duplex(1024);

        let (transport, _rx) = PipeTransport::new(their_end, unused_write);
        let (mut sender, _receiver) = transport.into_parts();

        let message = json!({"id": 1, "method": "goto", "params": {"url": "https://a.test"}});
        sender.send(message.clone()).await.unwrap();

        let mut length_buf = [0u8; 4];
        our_end.read_exact(&mut length_buf).await.unwrap();
        let length = u32::from_le_bytes(length_buf) as usize;

        let mut payload = vec![0u8; length];
        our_end.read_exact(&mut payload).await.unwrap();

        let received: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(received, message);
    }

    #[tokio::test]
    async fn receives_multiple_messages_in_order() {
        let (_unused_read, unused_write) = duplex(4096);
        let (mut driver_end, client_end) = duplex(4096);

        let (transport, mut rx) = PipeTransport::new(unused_write, client_end);
        let (_sender, receiver) = transport.into_parts();
        let read_task = tokio::spawn(receiver.run());

        let messages = vec![
            json!({"id": 1, "result": {}}),
            json!({"guid": "page@1", "method": "route", "params": {}}),
            json!({"id": 2, "result": {"value": 3}}),
        ];

        for message in &messages {
            let payload = serde_json::to_vec(message).unwrap();
            driver_end
                .write_all(&(payload.len() as u32).to_le_bytes())
                .await
                .unwrap();
            driver_end.write_all(&payload).await.unwrap();
        }
        driver_end.flush().await.unwrap();

        for expected in &messages {
            assert_eq!(&rx.recv().await.unwrap(), expected);
        }

        drop(driver_end);
        assert!(read_task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn large_message_round_trips() {
        let (_unused_read, unused_write) = duplex(1024 * 1024);
        let (mut driver_end, client_end) = duplex(1024 * 1024);

        let (transport, mut rx) = PipeTransport::new(unused_write, client_end);
        let (_sender, receiver) = transport.into_parts();
        let read_task = tokio::spawn(receiver.run());

        let message = json!({"id": 1, "data": "x".repeat(100_000)});
        let payload = serde_json::to_vec(&message).unwrap();
        assert!(payload.len() > 32_768);

        driver_end
            .write_all(&(payload.len() as u32).to_le_bytes())
            .await
            .unwrap();
        driver_end.write_all(&payload).await.unwrap();
        driver_end.flush().await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), message);

        drop(driver_end);
        let _ = read_task.await;
    }

    #[tokio::test]
    async fn truncated_length_prefix_is_an_error() {
        let (_unused_read, unused_write) = duplex(1024);
        let (mut driver_end, client_end) = duplex(1024);

        let (transport, _rx) = PipeTransport::new(unused_write, client_end);
        let (_sender, receiver) = transport.into_parts();

        driver_end.write_all(&[0x01, 0x02]).await.unwrap();
        driver_end.flush().await.unwrap();
        drop(driver_end);

        let result = receiver.run().await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read length prefix")
        );
    }

    #[tokio::test]
    async fn eof_between_frames_is_clean_shutdown() {
        let (_unused_read, unused_write) = duplex(1024);
        let (driver_end, client_end) = duplex(1024);

        let (transport, _rx) = PipeTransport::new(unused_write, client_end);
        let (_sender, receiver) = transport.into_parts();

        drop(driver_end);
        assert!(receiver.run().await.is_ok());
    }

    #[tokio::test]
    async fn truncated_body_is_an_error() {
        let (_unused_read, unused_write) = duplex(1024);
        let (mut driver_end, client_end) = duplex(1024);

        let (transport, _rx) = PipeTransport::new(unused_write, client_end);
        let (_sender, receiver) = transport.into_parts();

        // Announce 100 bytes, deliver 3.
        driver_end.write_all(&100u32.to_le_bytes()).await.unwrap();
        driver_end.write_all(b"abc").await.unwrap();
        driver_end.flush().await.unwrap();
        drop(driver_end);

        let result = receiver.run().await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read message body")
        );
    }
}
