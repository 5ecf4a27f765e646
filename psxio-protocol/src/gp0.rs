//! GP0 rendering and VRAM transfer command words
//!
//! Each function returns one 32-bit word. Commands with parameters are
//! written as a command word followed by packed parameter words built with
//! [`xy`], [`uv`] and friends.

/// VRAM is 1024 halfwords wide
pub const VRAM_WIDTH: u16 = 1024;
/// VRAM is 512 lines tall
pub const VRAM_HEIGHT: u16 = 512;

/// Texture page width in halfwords
pub const PAGE_WIDTH: u16 = 64;
/// Texture page height in lines
pub const PAGE_HEIGHT: u16 = 256;

/// Texture colour depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ColorDepth {
    Indexed4 = 0,
    Indexed8 = 1,
    Direct16 = 2,
}

impl ColorDepth {
    /// Pixels packed into one VRAM halfword
    pub fn pixels_per_halfword(self) -> u16 {
        match self {
            ColorDepth::Indexed4 => 4,
            ColorDepth::Indexed8 => 2,
            ColorDepth::Direct16 => 1,
        }
    }

    /// Palette entries used by this depth (zero for direct colour)
    pub fn palette_len(self) -> u16 {
        match self {
            ColorDepth::Indexed4 => 16,
            ColorDepth::Indexed8 => 256,
            ColorDepth::Direct16 => 0,
        }
    }
}

/// Semi-transparency blending mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BlendMode {
    /// Average of background and foreground
    SemiTransparent = 0,
    Add = 1,
    Subtract = 2,
    /// Background plus a quarter of the foreground
    AddQuarter = 3,
}

/// 24-bit colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into the low 24 bits of a command word
    pub const fn to_word(self) -> u32 {
        rgb(self.r, self.g, self.b)
    }
}

// Command bytes
const CMD_VRAM_FILL: u32 = 0x02;
const CMD_RECTANGLE: u32 = 0x60;
const CMD_VRAM_WRITE: u32 = 0xA0;
const CMD_TEXPAGE: u32 = 0xE1;
const CMD_DRAW_AREA_TOP_LEFT: u32 = 0xE3;
const CMD_DRAW_AREA_BOTTOM_RIGHT: u32 = 0xE4;
const CMD_DRAW_OFFSET: u32 = 0xE5;

/// Pack a colour into the low 24 bits
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16)
}

/// Pack a coordinate or size pair
pub const fn xy(x: i32, y: i32) -> u32 {
    ((x as u32) & 0xFFFF) | (((y as u32) & 0xFFFF) << 16)
}

/// Pack texture coordinates and a CLUT selector
pub const fn uv(u: u8, v: u8, clut: u16) -> u32 {
    (u as u32) | ((v as u32) << 8) | ((clut as u32) << 16)
}

/// Texture page selector
///
/// `x` is in 64-halfword units, `y` in 256-line units.
pub const fn page(x: u16, y: u16, blend: BlendMode, depth: ColorDepth) -> u16 {
    (x & 15) | ((y & 1) << 4) | (((blend as u16) & 3) << 5) | (((depth as u16) & 3) << 7)
}

/// Palette selector
///
/// `x` is in 16-halfword units, `y` in lines.
pub const fn clut(x: u16, y: u16) -> u16 {
    (x & 0x3F) | ((y & 0x3FF) << 6)
}

/// Start a CPU-to-VRAM transfer; followed by position and size words
pub const fn vram_write() -> u32 {
    CMD_VRAM_WRITE << 24
}

/// Fill a VRAM rectangle; OR in a colour, followed by position and size
pub const fn vram_fill() -> u32 {
    CMD_VRAM_FILL << 24
}

/// Variable-size rectangle; OR in a colour, followed by position,
/// (texture coordinates,) and size
pub const fn rectangle(textured: bool, semi_transparent: bool, raw: bool) -> u32 {
    (CMD_RECTANGLE << 24)
        | ((textured as u32) << 26)
        | ((semi_transparent as u32) << 25)
        | ((raw as u32) << 24)
}

/// Select the texture page used by untextured-page primitives
pub const fn texpage(page: u16, dither: bool, unlock_framebuffer: bool) -> u32 {
    (CMD_TEXPAGE << 24)
        | ((page as u32) & 0x9FF)
        | ((dither as u32) << 9)
        | ((unlock_framebuffer as u32) << 10)
}

/// Top-left corner of the drawing area
pub const fn draw_area_top_left(x: u16, y: u16) -> u32 {
    (CMD_DRAW_AREA_TOP_LEFT << 24) | ((x as u32) & 0x3FF) | (((y as u32) & 0x3FF) << 10)
}

/// Bottom-right corner of the drawing area (inclusive)
pub const fn draw_area_bottom_right(x: u16, y: u16) -> u32 {
    (CMD_DRAW_AREA_BOTTOM_RIGHT << 24) | ((x as u32) & 0x3FF) | (((y as u32) & 0x3FF) << 10)
}

/// Offset added to every vertex
pub const fn draw_offset(x: u16, y: u16) -> u32 {
    (CMD_DRAW_OFFSET << 24) | ((x as u32) & 0x7FF) | (((y as u32) & 0x7FF) << 11)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packers() {
        assert_eq!(rgb(64, 64, 64), 0x0040_4040);
        assert_eq!(xy(320, 240), 0x00F0_0140);
        assert_eq!(xy(-1, 0), 0x0000_FFFF);
        assert_eq!(uv(16, 32, 0x1234), 0x1234_2010);
    }

    #[test]
    fn test_command_words() {
        assert_eq!(vram_write(), 0xA000_0000);
        assert_eq!(rgb(1, 2, 3) | vram_fill(), 0x0203_0201);
        assert_eq!(rectangle(false, false, false), 0x6000_0000);
        assert_eq!(rectangle(true, true, true), 0x6700_0000);
        assert_eq!(texpage(0, true, false), 0xE100_0200);
    }

    #[test]
    fn test_drawing_environment() {
        assert_eq!(draw_area_top_left(320, 0), 0xE300_0140);
        assert_eq!(draw_area_bottom_right(639, 239), 0xE403_BE7F);
        assert_eq!(draw_offset(320, 0), 0xE500_0140);
    }

    #[test]
    fn test_page_and_clut() {
        // Page at x = 640, y = 0: 16bpp, average blending
        assert_eq!(
            page(10, 0, BlendMode::SemiTransparent, ColorDepth::Direct16),
            0x010A
        );
        assert_eq!(
            page(3, 1, BlendMode::Add, ColorDepth::Indexed4),
            0x0033
        );
        // Palette at x = 640, y = 480
        assert_eq!(clut(40, 480), 40 | (480 << 6));
    }

    #[test]
    fn test_depth_packing() {
        assert_eq!(ColorDepth::Indexed4.pixels_per_halfword(), 4);
        assert_eq!(ColorDepth::Indexed8.palette_len(), 256);
        assert_eq!(ColorDepth::Direct16.palette_len(), 0);
    }
}
