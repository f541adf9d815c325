//! Device emulation presets.
//!
//! A preset bundles the emulation parameters of a known device. Presets are
//! merged into [`ContextOptions`](crate::options::ContextOptions) by the
//! options builder: explicit values always win, unspecified preset fields
//! survive.

use crate::types::Viewport;

/// A named bundle of device emulation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    pub name: &'static str,
    pub viewport: Viewport,
    pub user_agent: &'static str,
    pub device_scale_factor: f64,
    pub is_mobile: bool,
    pub has_touch: bool,
}

/// The built-in preset registry. Descriptors mirror the driver's own device
/// catalogue for the handful of devices the example scripts use.
static DEVICES: &[DeviceDescriptor] = &[
    DeviceDescriptor {
        name: "Pixel 5",
        viewport: Viewport {
            width: 393,
            height: 851,
        },
        user_agent: "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/90.0.4430.91 Mobile Safari/537.36",
        device_scale_factor: 2.75,
        is_mobile: true,
        has_touch: true,
    },
    DeviceDescriptor {
        name: "iPhone 11",
        viewport: Viewport {
            width: 414,
            height: 896,
        },
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 13_2_3 like Mac OS X) \
                     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.0.3 \
                     Mobile/15E148 Safari/604.1",
        device_scale_factor: 2.0,
        is_mobile: true,
        has_touch: true,
    },
    DeviceDescriptor {
        name: "iPad Pro 11",
        viewport: Viewport {
            width: 834,
            height: 1194,
        },
        user_agent: "Mozilla/5.0 (iPad; CPU OS 13_3 like Mac OS X) AppleWebKit/605.1.15 \
                     (KHTML, like Gecko) Version/13.0.4 Mobile/15E148 Safari/604.1",
        device_scale_factor: 2.0,
        is_mobile: true,
        has_touch: true,
    },
    DeviceDescriptor {
        name: "Galaxy S9+",
        viewport: Viewport {
            width: 320,
            height: 658,
        },
        user_agent: "Mozilla/5.0 (Linux; Android 8.0.0; SM-G965U) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/87.0.4280.141 Mobile Safari/537.36",
        device_scale_factor: 4.5,
        is_mobile: true,
        has_touch: true,
    },
    DeviceDescriptor {
        name: "Desktop Chrome",
        viewport: Viewport {
            width: 1280,
            height: 720,
        },
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/106.0.0.0 Safari/537.36",
        device_scale_factor: 1.0,
        is_mobile: false,
        has_touch: false,
    },
];

/// Looks up a device preset by name.
pub fn device(name: &str) -> Option<&'static DeviceDescriptor> {
    DEVICES.iter().find(|d| d.name == name)
}

/// Returns all built-in presets.
pub fn all() -> &'static [DeviceDescriptor] {
    DEVICES
}
