//! DMA channel abstractions
//!
//! Each DMA channel has a base address register (MADR), a block control
//! register (BCR) and a channel control register (CHCR). A transfer starts
//! when CHCR is written with `ENABLE` set and the channel clears `ENABLE`
//! itself once the transfer is complete.

use bitflags::bitflags;

bitflags! {
    /// DMA channel control register (CHCR)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DmaControl: u32 {
        /// Transfer direction: RAM to device (clear = device to RAM)
        const FROM_RAM = 1 << 0;
        /// Walk RAM addresses downwards
        const REVERSE = 1 << 1;
        const CHOPPING = 1 << 8;
        /// Sync mode 1: blocks paced by the device's DMA request line
        const MODE_SLICE = 1 << 9;
        /// Sync mode 2: linked list of tagged packets
        const MODE_LIST = 1 << 10;
        /// Transfer in progress; cleared by hardware on completion
        const ENABLE = 1 << 24;
        /// Start a burst transfer without waiting for a request
        const TRIGGER = 1 << 28;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DmaControl {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "DmaControl({=u32:#x})", self.bits());
    }
}

/// DMA channel identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DmaChannelId {
    MdecIn = 0,
    MdecOut = 1,
    Gpu = 2,
    Cdrom = 3,
    Spu = 4,
    Pio = 5,
    Otc = 6,
}

impl DmaChannelId {
    /// Get the channel index
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One channel of the DMA controller
pub trait DmaChannel {
    /// Enable this channel in the DMA controller's priority register
    fn enable(&mut self);

    /// Write the base address register (MADR)
    fn set_address(&mut self, address: u32);

    /// Write the block control register (BCR)
    fn set_block(&mut self, block: u32);

    /// Read the channel control register (CHCR)
    fn control(&self) -> DmaControl;

    /// Write the channel control register (CHCR)
    fn set_control(&mut self, control: DmaControl);

    /// Check whether a transfer is in progress
    fn is_busy(&self) -> bool {
        self.control().contains(DmaControl::ENABLE)
    }
}
