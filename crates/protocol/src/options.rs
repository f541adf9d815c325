//! Option bags for driver operations.
//!
//! All option structs serialize to the camelCase JSON objects the driver
//! expects, omitting unset fields so the driver applies its own defaults.

use crate::DEFAULT_TIMEOUT_MS;
use crate::devices::DeviceDescriptor;
use crate::types::{Geolocation, Viewport};
use serde::Serialize;

/// Options for launching a browser engine.
///
/// See the `launch` operation on a browser type handle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchOptions {
    /// Run without a visible window. The driver defaults to headless; the
    /// client always sends an explicit value so scripts behave the same
    /// against any driver version.
    pub headless: bool,

    /// Additional engine command-line arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    /// Slows every operation down by the given milliseconds. Useful for
    /// watching headed runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slow_mo: Option<f64>,

    /// Maximum time to wait for the engine to start, in milliseconds.
    pub timeout: f64,

    /// Path to an engine binary, overriding the driver's bundled one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            args: None,
            slow_mo: None,
            timeout: DEFAULT_TIMEOUT_MS,
            executable_path: None,
        }
    }
}

impl LaunchOptions {
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = Some(args);
        self
    }

    pub fn slow_mo(mut self, slow_mo: f64) -> Self {
        self.slow_mo = Some(slow_mo);
        self
    }

    pub fn timeout(mut self, timeout: f64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }
}

/// Options for creating a browsing context: an isolated profile with its own
/// cookies, permissions, viewport, and emulation settings.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<Geolocation>,
    /// Permissions granted to all pages in the context ("geolocation", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_scale_factor: Option<f64>,
    /// Whether the meta viewport tag is respected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mobile: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_touch: Option<bool>,
    /// Directory to save videos to. Enables recording for all pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_video_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_video_size: Option<Viewport>,
}

impl ContextOptions {
    pub fn builder() -> ContextOptionsBuilder {
        ContextOptionsBuilder::default()
    }
}

/// Builder for [`ContextOptions`].
///
/// A device preset supplied via [`device`](Self::device) seeds viewport, user
/// agent, scale factor, and mobile/touch flags; any field set explicitly on
/// the builder overrides the preset, regardless of call order. Preset fields
/// that were not overridden survive into the built options.
#[derive(Debug, Clone, Default)]
pub struct ContextOptionsBuilder {
    device: Option<&'static DeviceDescriptor>,
    viewport: Option<Viewport>,
    user_agent: Option<String>,
    locale: Option<String>,
    timezone_id: Option<String>,
    geolocation: Option<Geolocation>,
    permissions: Option<Vec<String>>,
    device_scale_factor: Option<f64>,
    is_mobile: Option<bool>,
    has_touch: Option<bool>,
    record_video_dir: Option<String>,
    record_video_size: Option<Viewport>,
}

impl ContextOptionsBuilder {
    /// Emulate a named device. Explicit builder values take precedence over
    /// the preset's fields.
    pub fn device(mut self, descriptor: &'static DeviceDescriptor) -> Self {
        self.device = Some(descriptor);
        self
    }

    pub fn viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn timezone_id(mut self, timezone_id: impl Into<String>) -> Self {
        self.timezone_id = Some(timezone_id.into());
        self
    }

    pub fn geolocation(mut self, geolocation: Geolocation) -> Self {
        self.geolocation = Some(geolocation);
        self
    }

    pub fn permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn device_scale_factor(mut self, factor: f64) -> Self {
        self.device_scale_factor = Some(factor);
        self
    }

    pub fn is_mobile(mut self, is_mobile: bool) -> Self {
        self.is_mobile = Some(is_mobile);
        self
    }

    pub fn has_touch(mut self, has_touch: bool) -> Self {
        self.has_touch = Some(has_touch);
        self
    }

    pub fn record_video_dir(mut self, dir: impl Into<String>) -> Self {
        self.record_video_dir = Some(dir.into());
        self
    }

    pub fn record_video_size(mut self, size: Viewport) -> Self {
        self.record_video_size = Some(size);
        self
    }

    /// Builds the options, merging the device preset (if any) underneath the
    /// explicitly set fields.
    pub fn build(self) -> ContextOptions {
        let mut options = ContextOptions::default();

        if let Some(device) = self.device {
            options.viewport = Some(device.viewport);
            options.user_agent = Some(device.user_agent.to_string());
            options.device_scale_factor = Some(device.device_scale_factor);
            options.is_mobile = Some(device.is_mobile);
            options.has_touch = Some(device.has_touch);
        }

        if self.viewport.is_some() {
            options.viewport = self.viewport;
        }
        if self.user_agent.is_some() {
            options.user_agent = self.user_agent;
        }
        if self.device_scale_factor.is_some() {
            options.device_scale_factor = self.device_scale_factor;
        }
        if self.is_mobile.is_some() {
            options.is_mobile = self.is_mobile;
        }
        if self.has_touch.is_some() {
            options.has_touch = self.has_touch;
        }

        options.locale = self.locale;
        options.timezone_id = self.timezone_id;
        options.geolocation = self.geolocation;
        options.permissions = self.permissions;
        options.record_video_dir = self.record_video_dir;
        options.record_video_size = self.record_video_size;

        options
    }
}

/// Load condition a navigation waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    /// The `load` event fired.
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    /// No network connections for at least 500ms.
    #[serde(rename = "networkidle")]
    NetworkIdle,
    /// Network response received and the document started loading.
    Commit,
}

/// Options for a page navigation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GotoOptions {
    /// Maximum navigation time in milliseconds. Unset means the driver
    /// default of 30 seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_until: Option<WaitUntil>,
}

impl GotoOptions {
    pub fn timeout(mut self, timeout: f64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn wait_until(mut self, wait_until: WaitUntil) -> Self {
        self.wait_until = Some(wait_until);
        self
    }
}

/// Image format for screenshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotType {
    Png,
    Jpeg,
}

/// Rectangular clip region for screenshots, in CSS pixels.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScreenshotClip {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Options for capturing a page screenshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotOptions {
    #[serde(rename = "type")]
    pub image_type: ScreenshotType,
    /// JPEG quality 0-100; not applicable to PNG.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    /// Capture the full scrollable page instead of the viewport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_page: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<ScreenshotClip>,
    /// Hide the default white background, allowing transparent PNGs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omit_background: Option<bool>,
    pub timeout: f64,
}

impl Default for ScreenshotOptions {
    fn default() -> Self {
        Self {
            image_type: ScreenshotType::Png,
            quality: None,
            full_page: None,
            clip: None,
            omit_background: None,
            timeout: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ScreenshotOptions {
    pub fn image_type(mut self, image_type: ScreenshotType) -> Self {
        self.image_type = image_type;
        self
    }

    pub fn full_page(mut self, full_page: bool) -> Self {
        self.full_page = Some(full_page);
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn clip(mut self, clip: ScreenshotClip) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn omit_background(mut self, omit: bool) -> Self {
        self.omit_background = Some(omit);
        self
    }
}

/// Options for rendering a page to PDF. Only supported by Chromium.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landscape: Option<bool>,
    /// Paper format ("A4", "Letter", ...). Takes precedence over width/height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_background: Option<bool>,
    /// Rendering scale, between 0.1 and 2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl PdfOptions {
    pub fn landscape(mut self, landscape: bool) -> Self {
        self.landscape = Some(landscape);
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn print_background(mut self, print_background: bool) -> Self {
        self.print_background = Some(print_background);
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices;

    #[test]
    fn launch_options_serialize_camel_case() {
        let options = LaunchOptions::default().slow_mo(100.0);
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["headless"], true);
        assert_eq!(json["slowMo"], 100.0);
        assert_eq!(json["timeout"], DEFAULT_TIMEOUT_MS);
        assert!(json.get("executablePath").is_none());
    }

    #[test]
    fn context_options_omit_unset_fields() {
        let options = ContextOptions::builder().locale("de-DE").build();
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["locale"], "de-DE");
        assert!(json.get("viewport").is_none());
        assert!(json.get("userAgent").is_none());
    }

    #[test]
    fn device_preset_seeds_context_options() {
        let pixel = devices::device("Pixel 5").unwrap();
        let options = ContextOptions::builder()
            .device(pixel)
            .geolocation(Geolocation::new(41.889938, 12.492507))
            .permissions(vec!["geolocation".into()])
            .build();

        // Preset fields survive untouched.
        assert_eq!(options.viewport, Some(pixel.viewport));
        assert_eq!(options.user_agent.as_deref(), Some(pixel.user_agent));
        assert_eq!(options.device_scale_factor, Some(2.75));
        assert_eq!(options.is_mobile, Some(true));
        assert_eq!(options.has_touch, Some(true));

        // Explicit fields extend the preset.
        assert!(options.geolocation.is_some());
        assert_eq!(options.permissions.as_deref(), Some(&["geolocation".to_string()][..]));
    }

    #[test]
    fn explicit_values_override_device_preset() {
        let pixel = devices::device("Pixel 5").unwrap();

        // Setter before device(): explicit still wins.
        let options = ContextOptionsBuilder::default()
            .user_agent("custom-agent")
            .device(pixel)
            .viewport(Viewport::new(800, 600))
            .build();

        assert_eq!(options.user_agent.as_deref(), Some("custom-agent"));
        assert_eq!(options.viewport, Some(Viewport::new(800, 600)));
        // Non-overridden preset fields are kept.
        assert_eq!(options.device_scale_factor, Some(pixel.device_scale_factor));
    }

    #[test]
    fn goto_options_wait_until_wire_names() {
        let options = GotoOptions::default().wait_until(WaitUntil::NetworkIdle);
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["waitUntil"], "networkidle");
        assert!(json.get("timeout").is_none());

        let options = GotoOptions::default().wait_until(WaitUntil::DomContentLoaded);
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["waitUntil"], "domcontentloaded");
    }

    #[test]
    fn screenshot_options_rename_type_field() {
        let options = ScreenshotOptions::default().full_page(true);
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["type"], "png");
        assert_eq!(json["fullPage"], true);
        assert!(json.get("quality").is_none());
    }
}
