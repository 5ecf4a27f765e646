//! Top-level front-end configuration

use heapless::String;
use psxio_protocol::pad::MAX_GAME_ID_LEN;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::bus::{BusTiming, SioConfig};
use super::video::VideoConfig;

/// Complete I/O core configuration
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FrontendConfig {
    /// ID announced to memory card adaptors at boot (empty = none)
    pub game_id: String<MAX_GAME_ID_LEN>,
    pub bus: BusTiming,
    pub sio: SioConfig,
    pub video: VideoConfig,
}
