//! GPU port abstractions
//!
//! The GPU exposes two 32-bit ports: GP0 accepts rendering and VRAM
//! transfer commands, GP1 accepts display control commands and reads back
//! the status register.

use bitflags::bitflags;

bitflags! {
    /// GPU status register (GP1 read)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GpuStatus: u32 {
        /// Video output is PAL (clear = NTSC)
        const PAL = 1 << 20;
        /// 24bpp display colour depth
        const COLOR_24BPP = 1 << 21;
        const INTERLACED = 1 << 22;
        /// Display output is blanked
        const DISPLAY_DISABLED = 1 << 23;
        /// GP0 can accept a new command word
        const CMD_READY = 1 << 26;
        /// VRAM-to-CPU transfer data available
        const VRAM_READY = 1 << 27;
        /// GP0 can accept a DMA block
        const DMA_READY = 1 << 28;
        /// Currently drawing an odd line
        const ODD_LINE = 1 << 31;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for GpuStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "GpuStatus({=u32:#x})", self.bits());
    }
}

/// GPU command and control ports
pub trait GpuPorts {
    /// Write a word to the GP0 command port
    fn write_gp0(&mut self, word: u32);

    /// Write a word to the GP1 control port
    fn write_gp1(&mut self, word: u32);

    /// Read the GPU status register
    fn status(&self) -> GpuStatus;

    /// Check whether GP0 can accept another command word
    fn is_command_ready(&self) -> bool {
        self.status().contains(GpuStatus::CMD_READY)
    }
}
