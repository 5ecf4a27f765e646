//! Display configuration types

use psxio_protocol::gp0::Rgb;
use psxio_protocol::gp1::VideoStandard;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Video standard selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VideoMode {
    /// Keep whatever standard the GPU reports at boot
    #[default]
    Auto,
    Ntsc,
    Pal,
}

impl VideoMode {
    /// Resolve `Auto` against the standard the GPU currently reports
    pub fn resolve(self, detected: VideoStandard) -> VideoStandard {
        match self {
            VideoMode::Auto => detected,
            VideoMode::Ntsc => VideoStandard::Ntsc,
            VideoMode::Pal => VideoStandard::Pal,
        }
    }
}

/// Display and framebuffer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VideoConfig {
    pub mode: VideoMode,
    /// Framebuffer width in pixels
    pub width: u16,
    /// Framebuffer height in lines
    pub height: u16,
    /// Colour each frame is cleared to before drawing (none = keep)
    pub clear_color: Option<Rgb>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            mode: VideoMode::Auto,
            width: 320,
            height: 240,
            clear_color: Some(Rgb::new(64, 64, 64)),
        }
    }
}
