//! Runtime infrastructure for talking to the automation driver.
//!
//! This crate owns everything below the typed handle API:
//!
//! - **Driver discovery**: locating a Node.js executable and the driver's
//!   `cli.js` on the host.
//! - **Driver process**: spawning `node cli.js run-driver` and tearing it
//!   down again.
//! - **Transport**: framed bidirectional JSON over the driver's stdio pipes.
//! - **Connection**: request/response correlation and event dispatch on top
//!   of the transport.
//!
//! The typed handles in the client crate sit on a [`Channel`] each, which is
//! a thin GUID-scoped proxy over the shared [`Connection`].

pub mod channel;
pub mod connection;
pub mod driver;
pub mod error;
pub mod server;
pub mod transport;

pub use channel::Channel;
pub use connection::{Connection, ErrorPayload, ErrorWrapper, Event, Message, Request, Response};
pub use driver::locate_driver;
pub use error::{Error, Result};
pub use server::DriverServer;
pub use transport::{PipeTransport, TransportParts};
