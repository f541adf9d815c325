//! Wire types shared between the trypw client and the automation driver.
//!
//! Everything here is plain data: option bags serialized as camelCase JSON
//! objects, value types carried inside protocol messages, and the device
//! preset registry used for emulation. No I/O happens in this crate.

pub mod devices;
pub mod options;
pub mod types;

pub use devices::{DeviceDescriptor, device};
pub use options::{
    ContextOptions, ContextOptionsBuilder, GotoOptions, LaunchOptions, PdfOptions, ScreenshotClip,
    ScreenshotOptions, ScreenshotType, WaitUntil,
};
pub use types::{Geolocation, RequestRecord, ResponseRecord, Viewport};

/// Default timeout in milliseconds for driver operations, matching the
/// standard default across the official driver bindings.
pub const DEFAULT_TIMEOUT_MS: f64 = 30_000.0;
