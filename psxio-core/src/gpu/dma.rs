//! GPU DMA transfers
//!
//! Two kinds of transfer go through the GPU channel:
//!
//! - Linked list: the controller walks a [`CommandChain`] and feeds every
//!   packet payload to GP0
//! - Block: a rectangle of pixel data is streamed into VRAM after a
//!   VRAM-write command, in fixed-size chunks paced by the GPU
//!
//! Both return as soon as the transfer is started. Source buffers must not
//! be touched until [`DmaEngine::wait_done`] returns.

use psxio_hal::dma::{DmaChannel, DmaControl};
use psxio_hal::gpu::GpuPorts;
use psxio_protocol::gp0::{self, VRAM_HEIGHT, VRAM_WIDTH};

use super::chain::CommandChain;

/// Words per DMA request in block mode
pub const DMA_MAX_CHUNK_SIZE: usize = 16;

/// Errors that can occur when starting a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Source buffer is not 4-byte aligned
    Misaligned,
    /// Pixel count does not split into whole words and chunks
    UnevenLength,
    /// Source buffer is shorter than the rectangle
    BufferTooShort,
    /// Rectangle extends past the edge of VRAM
    OutOfVram,
    /// Zero-sized rectangle
    Empty,
    /// Chain has no end tag
    Unterminated,
}

/// Block transfer geometry: `count` chunks of `chunk` words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockLayout {
    pub chunk: usize,
    pub count: usize,
}

impl BlockLayout {
    /// Split `width * height` 16-bit pixels into DMA chunks
    ///
    /// Transfers shorter than one chunk go in a single chunk; longer ones
    /// must be a whole number of chunks.
    pub fn for_rect(width: u16, height: u16) -> Result<Self, DmaError> {
        let pixels = width as usize * height as usize;
        if pixels == 0 {
            return Err(DmaError::Empty);
        }
        if pixels % 2 != 0 {
            return Err(DmaError::UnevenLength);
        }

        let length = pixels / 2;
        if length < DMA_MAX_CHUNK_SIZE {
            return Ok(Self {
                chunk: length,
                count: 1,
            });
        }
        if length % DMA_MAX_CHUNK_SIZE != 0 {
            return Err(DmaError::UnevenLength);
        }

        Ok(Self {
            chunk: DMA_MAX_CHUNK_SIZE,
            count: length / DMA_MAX_CHUNK_SIZE,
        })
    }

    /// Total words transferred
    pub fn words(&self) -> usize {
        self.chunk * self.count
    }

    /// Block control register value
    pub fn to_bcr(&self) -> u32 {
        self.chunk as u32 | ((self.count as u32) << 16)
    }
}

/// DMA engine driving the GPU channel
pub struct DmaEngine<G: GpuPorts, C: DmaChannel> {
    gpu: G,
    channel: C,
}

impl<G: GpuPorts, C: DmaChannel> DmaEngine<G, C> {
    pub fn new(gpu: G, channel: C) -> Self {
        Self { gpu, channel }
    }

    /// Enable the channel in the DMA controller
    pub fn enable(&mut self) {
        self.channel.enable();
    }

    /// Start walking `chain` into GP0
    ///
    /// Relinks the chain if it has moved, then waits for any previous
    /// transfer. The chain must not move until the walk is done.
    pub fn transfer_linked<const N: usize>(
        &mut self,
        chain: &mut CommandChain<N>,
    ) -> Result<(), DmaError> {
        if !chain.is_terminated() {
            return Err(DmaError::Unterminated);
        }
        chain.relink();
        let address = chain.bus_address();
        if address % 4 != 0 {
            return Err(DmaError::Misaligned);
        }

        self.wait_done();
        self.channel.set_address(address);
        self.channel
            .set_control(DmaControl::FROM_RAM | DmaControl::MODE_LIST | DmaControl::ENABLE);
        Ok(())
    }

    /// Start streaming `data` into the VRAM rectangle at `(x, y)`
    ///
    /// `data` holds `width * height` 16-bit pixels, two per word. Waits
    /// for any previous transfer first.
    pub fn transfer_block(
        &mut self,
        data: &[u8],
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<(), DmaError> {
        let layout = self.check_block(data, x, y, width, height).inspect_err(|_error| {
            #[cfg(feature = "defmt")]
            defmt::warn!("VRAM transfer rejected: {}", _error);
        })?;

        self.wait_done();
        self.wait_gp0_ready();
        self.gpu.write_gp0(gp0::vram_write());
        self.gpu.write_gp0(gp0::xy(x as i32, y as i32));
        self.gpu.write_gp0(gp0::xy(width as i32, height as i32));

        self.channel.set_address(data.as_ptr() as usize as u32);
        self.channel.set_block(layout.to_bcr());
        self.channel
            .set_control(DmaControl::FROM_RAM | DmaControl::MODE_SLICE | DmaControl::ENABLE);
        Ok(())
    }

    fn check_block(
        &self,
        data: &[u8],
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<BlockLayout, DmaError> {
        if data.as_ptr() as usize % 4 != 0 {
            return Err(DmaError::Misaligned);
        }
        let layout = BlockLayout::for_rect(width, height)?;
        if data.len() < layout.words() * 4 {
            return Err(DmaError::BufferTooShort);
        }
        if x as u32 + width as u32 > VRAM_WIDTH as u32
            || y as u32 + height as u32 > VRAM_HEIGHT as u32
        {
            return Err(DmaError::OutOfVram);
        }
        Ok(layout)
    }

    /// Block until the channel is idle
    pub fn wait_done(&self) {
        while self.channel.is_busy() {
            core::hint::spin_loop();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.channel.is_busy()
    }

    /// Block until GP0 accepts another command
    pub fn wait_gp0_ready(&self) {
        while !self.gpu.is_command_ready() {
            core::hint::spin_loop();
        }
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{AlignedPixels, SimDma, SimGpu};

    fn engine() -> DmaEngine<SimGpu, SimDma> {
        DmaEngine::new(SimGpu::new(), SimDma::new())
    }

    #[test]
    fn test_block_layout() {
        assert_eq!(
            BlockLayout::for_rect(16, 16),
            Ok(BlockLayout { chunk: 16, count: 8 })
        );
        // Shorter than one chunk
        assert_eq!(
            BlockLayout::for_rect(16, 1),
            Ok(BlockLayout { chunk: 8, count: 1 })
        );
        assert_eq!(BlockLayout::for_rect(3, 1), Err(DmaError::UnevenLength));
        // 34 words is not a whole number of chunks
        assert_eq!(BlockLayout::for_rect(68, 1), Err(DmaError::UnevenLength));
        assert_eq!(BlockLayout::for_rect(0, 10), Err(DmaError::Empty));
        assert_eq!(BlockLayout::for_rect(16, 16).unwrap().to_bcr(), 0x0008_0010);
    }

    #[test]
    fn test_transfer_block_registers() {
        let pixels = AlignedPixels::<512>::new();
        let mut dma = engine();

        dma.transfer_block(pixels.as_bytes(), 640, 256, 16, 16).unwrap();

        assert_eq!(
            dma.gpu().gp0(),
            &[0xA000_0000, gp0::xy(640, 256), gp0::xy(16, 16)]
        );
        let transfer = dma.channel().transfers()[0];
        assert_eq!(transfer.address, pixels.as_bytes().as_ptr() as usize as u32);
        assert_eq!(transfer.block, 0x0008_0010);
        assert_eq!(
            transfer.control,
            DmaControl::FROM_RAM | DmaControl::MODE_SLICE | DmaControl::ENABLE
        );
    }

    #[test]
    fn test_transfer_block_rejects_bad_input() {
        let pixels = AlignedPixels::<512>::new();
        let mut dma = engine();

        assert_eq!(
            dma.transfer_block(&pixels.as_bytes()[1..], 0, 0, 2, 1),
            Err(DmaError::Misaligned)
        );
        assert_eq!(
            dma.transfer_block(pixels.as_bytes(), 0, 0, 17, 3),
            Err(DmaError::UnevenLength)
        );
        assert_eq!(
            dma.transfer_block(pixels.as_bytes(), 0, 0, 32, 32),
            Err(DmaError::BufferTooShort)
        );
        assert_eq!(
            dma.transfer_block(pixels.as_bytes(), 1016, 0, 16, 16),
            Err(DmaError::OutOfVram)
        );
        assert_eq!(
            dma.transfer_block(pixels.as_bytes(), 0, 500, 16, 16),
            Err(DmaError::OutOfVram)
        );

        // Nothing reached the hardware
        assert!(dma.gpu().gp0().is_empty());
        assert!(dma.channel().transfers().is_empty());
    }

    #[test]
    fn test_transfers_never_overlap() {
        let pixels = AlignedPixels::<512>::new();
        let mut dma = DmaEngine::new(SimGpu::new(), SimDma::with_busy_polls(5));

        dma.transfer_block(pixels.as_bytes(), 0, 0, 16, 16).unwrap();
        assert!(dma.is_busy());
        dma.transfer_block(pixels.as_bytes(), 16, 0, 16, 16).unwrap();

        assert_eq!(dma.channel().transfers().len(), 2);
        assert!(!dma.channel().overlapped());
    }

    #[test]
    fn test_waits_for_gp0_ready() {
        let pixels = AlignedPixels::<512>::new();
        let mut gpu = SimGpu::new();
        gpu.set_busy_polls(3);
        let mut dma = DmaEngine::new(gpu, SimDma::new());

        dma.transfer_block(pixels.as_bytes(), 0, 0, 2, 2).unwrap();
        assert_eq!(dma.gpu().status_polls(), 4);
    }

    #[test]
    fn test_transfer_linked() {
        let mut chain: CommandChain<16> = CommandChain::new();
        chain.allocate(1)[0] = 0x0200_0000;

        let mut dma = engine();
        assert_eq!(dma.transfer_linked(&mut chain), Err(DmaError::Unterminated));

        chain.terminate();
        dma.transfer_linked(&mut chain).unwrap();

        let transfer = dma.channel().transfers()[0];
        assert_eq!(transfer.address, chain.bus_address());
        assert_eq!(
            transfer.control,
            DmaControl::FROM_RAM | DmaControl::MODE_LIST | DmaControl::ENABLE
        );
    }

    #[test]
    fn test_wait_done() {
        let mut dma = DmaEngine::new(SimGpu::new(), SimDma::with_busy_polls(3));
        let mut chain: CommandChain<4> = CommandChain::new();
        chain.terminate();

        dma.transfer_linked(&mut chain).unwrap();
        dma.wait_done();
        assert!(!dma.is_busy());
    }

    #[test]
    fn test_transfer_linked_after_move() {
        let mut chain: CommandChain<16> = CommandChain::new();
        chain.allocate(2);
        chain.terminate();
        let mut moved = Box::new(chain);

        let mut dma = engine();
        dma.transfer_linked(&mut *moved).unwrap();

        let base = moved.bus_address();
        assert_eq!(dma.channel().transfers()[0].address, base);
        let first = psxio_protocol::chain::TagWord::from_word(moved.words()[0]);
        assert_eq!(first.next, base.wrapping_add(12) & 0x00FF_FFFF);
        assert_eq!(moved.packets().count(), 2);
    }
}
