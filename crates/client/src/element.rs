//! ElementHandle - a reference to a DOM element inside a page.
//!
//! Handles come from the page's query operations and stay valid as long as
//! the element is attached; the driver reports a remote error otherwise.
//! Elements have no local lifecycle of their own, they die with their page.

use crate::handle::ObjectRef;
use serde::Deserialize;
use serde_json::json;
use trypw_runtime::channel::Channel;
use trypw_runtime::error::Result;

/// Reference to a single DOM element.
#[derive(Clone)]
pub struct ElementHandle {
    channel: Channel,
}

#[derive(Deserialize)]
struct ElementResult {
    #[serde(default)]
    element: Option<ObjectRef>,
}

#[derive(Deserialize)]
struct TextResult {
    value: String,
}

impl ElementHandle {
    pub(crate) fn wire(channel: Channel) -> Self {
        Self { channel }
    }

    pub(crate) fn from_ref(channel: &Channel, object: &ObjectRef) -> Self {
        Self::wire(channel.for_guid(&object.guid))
    }

    /// Queries for the first descendant matching the CSS selector.
    pub async fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>> {
        let result: ElementResult = self
            .channel
            .send("querySelector", json!({ "selector": selector }))
            .await?;
        Ok(result
            .element
            .map(|object| ElementHandle::from_ref(&self.channel, &object)))
    }

    /// Returns the element's rendered text.
    pub async fn inner_text(&self) -> Result<String> {
        let result: TextResult = self.channel.send_no_params("innerText").await?;
        Ok(result.value)
    }
}

impl std::fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementHandle")
            .field("guid", &self.channel.guid())
            .finish()
    }
}
