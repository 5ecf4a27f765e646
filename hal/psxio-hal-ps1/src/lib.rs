//! Console HAL for the psxio I/O core
//!
//! This crate implements the shared `psxio-hal` traits on top of the
//! console's memory-mapped I/O registers:
//!
//! - SIO0 controller/memory card port ([`sio::Sio0`])
//! - SIO1 debug serial port ([`sio::Sio1`])
//! - GPU command and control ports ([`gpu::Ps1Gpu`])
//! - DMA channels ([`dma::Ps1DmaChannel`])
//! - Interrupt status latches ([`irq::Ps1Irq`])
//! - Cycle-counted busy-wait delay ([`delay::CycleDelay`])
//!
//! All register access goes through [`regs`]; no other module touches raw
//! addresses.

#![no_std]

pub mod delay;
pub mod dma;
pub mod gpu;
pub mod irq;
pub mod regs;
pub mod sio;

pub use delay::CycleDelay;
pub use dma::Ps1DmaChannel;
pub use gpu::Ps1Gpu;
pub use irq::Ps1Irq;
pub use sio::{Sio0, Sio1};

use psxio_hal::dma::DmaChannelId;

/// CPU clock frequency
pub const F_CPU: u32 = 33_868_800;

/// Console peripherals used by the I/O core
pub struct Peripherals {
    pub sio0: Sio0,
    pub sio1: Sio1,
    pub gpu: Ps1Gpu,
    pub gpu_dma: Ps1DmaChannel,
    pub irq: Ps1Irq,
    pub delay: CycleDelay,
}

impl Peripherals {
    /// Get handles to the peripherals
    ///
    /// # Safety
    ///
    /// Each peripheral must have a single owner. Call this once at startup
    /// and do not create other handles to the same registers.
    pub unsafe fn steal() -> Self {
        Self {
            sio0: Sio0::new(),
            sio1: Sio1::new(),
            gpu: Ps1Gpu::new(),
            gpu_dma: Ps1DmaChannel::new(DmaChannelId::Gpu),
            irq: Ps1Irq::new(),
            delay: CycleDelay::new(F_CPU),
        }
    }
}
