//! Channel - GUID-scoped RPC proxy over the shared connection.
//!
//! Every typed handle owns a Channel that sends method calls to the driver
//! on behalf of one driver-side object.

use crate::connection::{Connection, Event};
use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// RPC proxy bound to a single driver-side object.
#[derive(Clone)]
pub struct Channel {
    guid: Arc<str>,
    connection: Arc<Connection>,
}

impl Channel {
    /// Creates a channel for the given object GUID.
    pub fn new(guid: Arc<str>, connection: Arc<Connection>) -> Self {
        Self { guid, connection }
    }

    /// Sends a method call and deserializes the response.
    pub async fn send<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R> {
        let params_value = serde_json::to_value(params)?;
        let response = self
            .connection
            .send_message(&self.guid, method, params_value)
            .await?;
        serde_json::from_value(response).map_err(Into::into)
    }

    /// Sends a method call with no parameters.
    pub async fn send_no_params<R: DeserializeOwned>(&self, method: &str) -> Result<R> {
        self.send(method, serde_json::json!({})).await
    }

    /// Sends a method call whose result is discarded.
    pub async fn send_no_result<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
        let _: Value = self.send(method, params).await?;
        Ok(())
    }

    /// Subscribes to events emitted by this channel's object.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Event> {
        self.connection.subscribe(&self.guid)
    }

    /// Drops any event subscription for this channel's object.
    pub fn unsubscribe(&self) {
        self.connection.unsubscribe(&self.guid);
    }

    /// Returns the GUID this channel represents.
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Returns the shared connection.
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Creates a sibling channel for another GUID on the same connection.
    pub fn for_guid(&self, guid: &str) -> Channel {
        Channel::new(Arc::from(guid), Arc::clone(&self.connection))
    }
}
