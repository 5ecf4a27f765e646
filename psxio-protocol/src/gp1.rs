//! GP1 display control command words

/// Horizontal resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HorizontalRes {
    H256,
    H320,
    H368,
    H512,
    H640,
}

impl HorizontalRes {
    /// Dot clock cycles per pixel, used to size the horizontal range
    pub fn clock_multiplier(self) -> u16 {
        match self {
            HorizontalRes::H256 => 10,
            HorizontalRes::H320 => 8,
            HorizontalRes::H368 => 7,
            HorizontalRes::H512 => 5,
            HorizontalRes::H640 => 4,
        }
    }

    fn mode_bits(self) -> u32 {
        match self {
            HorizontalRes::H256 => 0,
            HorizontalRes::H320 => 1,
            HorizontalRes::H512 => 2,
            HorizontalRes::H640 => 3,
            HorizontalRes::H368 => 1 << 6,
        }
    }
}

/// Vertical resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VerticalRes {
    /// Progressive, up to 256 lines
    V256,
    /// Interlaced, up to 512 lines
    V512,
}

impl VerticalRes {
    /// Framebuffer lines per displayed line
    pub fn clock_divider(self) -> u16 {
        match self {
            VerticalRes::V256 => 1,
            VerticalRes::V512 => 2,
        }
    }
}

/// Video standard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VideoStandard {
    Ntsc,
    Pal,
}

/// DMA request source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DmaRequestMode {
    None = 0,
    Fifo = 1,
    /// Request data for GP0 writes
    Gp0Write = 2,
    /// Request data for VRAM reads
    GpuRead = 3,
}

// Command bytes
const CMD_RESET: u32 = 0x00;
const CMD_DISPLAY_BLANK: u32 = 0x03;
const CMD_DMA_REQUEST_MODE: u32 = 0x04;
const CMD_DISPLAY_START: u32 = 0x05;
const CMD_RANGE_H: u32 = 0x06;
const CMD_RANGE_V: u32 = 0x07;
const CMD_VIDEO_MODE: u32 = 0x08;

/// Reset the GPU and blank the display
pub const fn reset() -> u32 {
    CMD_RESET << 24
}

/// Enable or blank video output
pub const fn display_blank(blank: bool) -> u32 {
    (CMD_DISPLAY_BLANK << 24) | (blank as u32)
}

pub const fn dma_request_mode(mode: DmaRequestMode) -> u32 {
    (CMD_DMA_REQUEST_MODE << 24) | (mode as u32)
}

/// Top-left VRAM coordinate of the displayed area
pub const fn display_start(x: u16, y: u16) -> u32 {
    (CMD_DISPLAY_START << 24) | ((x as u32) & 0x3FF) | (((y as u32) & 0x1FF) << 10)
}

/// Horizontal display range in dot clock cycles
pub const fn range_h(low: u16, high: u16) -> u32 {
    (CMD_RANGE_H << 24) | ((low as u32) & 0xFFF) | (((high as u32) & 0xFFF) << 12)
}

/// Vertical display range in scanlines
pub const fn range_v(low: u16, high: u16) -> u32 {
    (CMD_RANGE_V << 24) | ((low as u32) & 0x3FF) | (((high as u32) & 0x3FF) << 10)
}

/// Video mode
pub fn video_mode(
    horizontal: HorizontalRes,
    vertical: VerticalRes,
    standard: VideoStandard,
    interlace: bool,
    color_24bpp: bool,
) -> u32 {
    let mut word = (CMD_VIDEO_MODE << 24) | horizontal.mode_bits();
    if vertical == VerticalRes::V512 {
        word |= 1 << 2;
    }
    if standard == VideoStandard::Pal {
        word |= 1 << 3;
    }
    if color_24bpp {
        word |= 1 << 4;
    }
    if interlace {
        word |= 1 << 5;
    }
    word
}
