//! psxio Hardware Abstraction Layer
//!
//! This crate defines the hardware capabilities the console I/O core is
//! written against. The real console implements them with memory-mapped
//! registers; tests implement them with software device models. Keeping the
//! protocol and allocator logic behind these traits is what lets the core be
//! unit-tested without silicon.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (psxio-firmware)           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  psxio-core (pad bus, chains, DMA)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  psxio-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ psxio-hal-ps1 │       │ psxio-core    │
//! │ (MMIO)        │       │ ::sim (tests) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`sio::SioPort`] - Controller/memory card serial bus port
//! - [`gpu::GpuPorts`] - GPU command (GP0) and control (GP1) ports
//! - [`dma::DmaChannel`] - One channel of the DMA controller
//! - [`irq::InterruptController`] - Interrupt status latches
//!
//! Time is not modelled here: busy-wait delays use
//! `embedded_hal::delay::DelayNs`.

#![no_std]
#![deny(unsafe_code)]

pub mod dma;
pub mod gpu;
pub mod irq;
pub mod sio;

// Re-export key traits at crate root for convenience
pub use dma::{DmaChannel, DmaControl};
pub use gpu::{GpuPorts, GpuStatus};
pub use irq::{InterruptController, Irq};
pub use sio::{SioControl, SioMode, SioPort, SioStatus};
