//! Configuration types
//!
//! Board-agnostic configuration structures. The firmware fills them from
//! `console.toml` at build time; `Default` reproduces the stock console
//! timings.

pub mod bus;
pub mod frontend;
pub mod video;

pub use bus::*;
pub use frontend::*;
pub use video::*;
