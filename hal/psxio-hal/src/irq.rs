//! Interrupt controller abstractions
//!
//! Nothing in the I/O core takes interrupts. Interrupt status bits are only
//! polled as latches: the vertical blank latch paces the frame loop.

/// Interrupt sources, numbered by their bit in the status register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Irq {
    VBlank = 0,
    Gpu = 1,
    Cdrom = 2,
    Dma = 3,
    Timer0 = 4,
    Timer1 = 5,
    Timer2 = 6,
    /// Controller/memory card bus (DSR pulse)
    Sio0 = 7,
    Sio1 = 8,
    Spu = 9,
    Lightgun = 10,
}

impl Irq {
    /// Get the status register mask for this source
    pub fn mask(self) -> u32 {
        1 << (self as u32)
    }
}

/// Interrupt status latches
pub trait InterruptController {
    /// Check whether `irq` has been latched
    fn is_pending(&self, irq: Irq) -> bool;

    /// Clear the latch for `irq`
    fn acknowledge(&mut self, irq: Irq);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irq_masks() {
        assert_eq!(Irq::VBlank.mask(), 0x001);
        assert_eq!(Irq::Sio0.mask(), 0x080);
        assert_eq!(Irq::Lightgun.mask(), 0x400);
    }
}
