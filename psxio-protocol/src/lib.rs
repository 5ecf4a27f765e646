//! Console I/O wire formats
//!
//! This crate defines the bit-exact formats the I/O core speaks: the
//! controller/memory card serial bus packets and the 32-bit command words
//! consumed by the GPU.
//!
//! # Controller bus
//!
//! Every packet starts with an address byte selecting the device class,
//! followed by a command and its parameters. The device answers in the
//! same clock cycles:
//! ```text
//! host   │ ADDR │ CMD  │ 0x00 │ 0x00 │ 0x00 │ 0x00 │ ...
//! device │ 0xFF │ TYPE │ 0x5A │ BTN0 │ BTN1 │ EXT  │ ...
//! ```
//!
//! # GPU command chain
//!
//! Command packets are walked by DMA as a linked list. Each packet starts
//! with a tag word:
//! ```text
//! ┌────────┬──────────────────────────┐
//! │ COUNT  │ NEXT ADDRESS             │
//! │ 31..24 │ 23..0 (0xFFFFFF = end)   │
//! └────────┴──────────────────────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod chain;
pub mod gp0;
pub mod gp1;
pub mod pad;

pub use chain::{tag, TagWord, END_OF_CHAIN};
pub use gp0::{BlendMode, ColorDepth, Rgb};
pub use gp1::{DmaRequestMode, HorizontalRes, VerticalRes, VideoStandard};
pub use pad::{
    build_game_id_packet, Buttons, DeviceAddress, DeviceType, PacketError, PadCommand,
    ResponseHeader,
};
