//! Build-time configuration
//!
//! Generated by build.rs from console.toml. Edit console.toml and rebuild
//! to change it.

use psxio_core::config::{BusTiming, SioConfig, VideoConfig, VideoMode};
#[allow(unused_imports)]
use psxio_protocol::gp0::Rgb;

include!(concat!(env!("OUT_DIR"), "/console_config.rs"));
