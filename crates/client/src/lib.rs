//! Typed session handles for a Playwright-style browser automation driver.
//!
//! The entry point is [`Session::launch`], which spawns the driver process
//! and returns a handle to the three browser engines. From there the handle
//! chain mirrors the driver's object model:
//!
//! ```text
//! Session -> BrowserType -> Browser -> BrowserContext -> Page
//! ```
//!
//! Handles are cheap clones over GUID-addressed remote objects. Closing a
//! handle cascades to its children; any operation on a closed handle fails
//! with a target-closed error. Dropping the session kills the driver.

pub mod browser;
pub mod browser_context;
pub mod browser_type;
pub mod element;
mod handle;
pub mod page;
pub mod route;
pub mod session;
pub mod wait;

pub use browser::Browser;
pub use browser_context::BrowserContext;
pub use browser_type::BrowserType;
pub use element::ElementHandle;
pub use page::Page;
pub use route::{FulfillOptions, Resolution, RouteBinding};
pub use session::Session;
pub use wait::Waiter;

pub use trypw_protocol::{
    ContextOptions, ContextOptionsBuilder, DeviceDescriptor, Geolocation, GotoOptions,
    LaunchOptions, PdfOptions, RequestRecord, ResponseRecord, ScreenshotOptions, ScreenshotType,
    Viewport, WaitUntil, device, devices,
};
pub use trypw_runtime::{Error, Result};
