//! DMA channels

use psxio_hal::dma::{DmaChannel, DmaChannelId, DmaControl};

use crate::regs::{dma_bcr, dma_chcr, dma_madr, DMA_DPCR};

/// Channel enable bit within each channel's DPCR nibble
const DPCR_ENABLE: u32 = 1 << 3;

pub struct Ps1DmaChannel {
    id: DmaChannelId,
}

impl Ps1DmaChannel {
    pub(crate) fn new(id: DmaChannelId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> DmaChannelId {
        self.id
    }
}

impl DmaChannel for Ps1DmaChannel {
    fn enable(&mut self) {
        let shift = self.id.index() * 4;
        DMA_DPCR.modify(|dpcr| dpcr | (DPCR_ENABLE << shift));
    }

    fn set_address(&mut self, address: u32) {
        dma_madr(self.id.index()).write(address);
    }

    fn set_block(&mut self, block: u32) {
        dma_bcr(self.id.index()).write(block);
    }

    fn control(&self) -> DmaControl {
        DmaControl::from_bits_retain(dma_chcr(self.id.index()).read())
    }

    fn set_control(&mut self, control: DmaControl) {
        dma_chcr(self.id.index()).write(control.bits());
    }
}
