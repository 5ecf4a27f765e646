//! Board-agnostic core logic for the console I/O front-end
//!
//! This crate contains the I/O logic that does not depend on register
//! addresses:
//!
//! - Controller bus transport, acknowledge handshake and packet framing
//! - Controller polling and button edge detection
//! - GPU command chain allocation
//! - DMA transfers of command chains and VRAM images
//! - Texture upload
//! - Double-buffered frame pacing and display setup
//! - Configuration type definitions
//!
//! Everything talks to hardware through the `psxio-hal` traits, so the
//! whole crate runs on the host against the software console in [`sim`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod gpu;
pub mod pad;

#[cfg(any(test, feature = "sim"))]
pub mod sim;
