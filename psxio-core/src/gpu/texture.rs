//! Texture upload
//!
//! Copies images (and palettes) into VRAM and records where they landed as
//! the page, CLUT and texture coordinate values draw commands embed.

use psxio_hal::dma::DmaChannel;
use psxio_hal::gpu::GpuPorts;
use psxio_protocol::gp0::{
    self, BlendMode, ColorDepth, PAGE_HEIGHT, PAGE_WIDTH, VRAM_HEIGHT, VRAM_WIDTH,
};

use super::dma::{DmaEngine, DmaError};

/// Largest texture a page can address
pub const MAX_TEXTURE_SIZE: u16 = 256;

/// Palettes start on 16-halfword boundaries
const CLUT_ALIGNMENT: u16 = 16;

/// Errors that can occur during texture upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadError {
    /// Wider or taller than a texture page can address
    TooLarge,
    /// Palette X is not a multiple of 16
    PaletteMisaligned,
    /// Palette runs past the edge of VRAM
    PaletteOutOfRange,
    /// Indexed upload requested with a direct colour depth
    NotIndexed,
    Dma(DmaError),
}

impl From<DmaError> for UploadError {
    fn from(e: DmaError) -> Self {
        UploadError::Dma(e)
    }
}

/// Where a texture lives in VRAM, in draw command terms
///
/// Only produced by [`TextureUploader`]; embed it verbatim in draw
/// commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TextureDescriptor {
    page: u16,
    clut: u16,
    u: u8,
    v: u8,
    width: u16,
    height: u16,
}

impl TextureDescriptor {
    /// Texture page selector
    pub fn page(&self) -> u16 {
        self.page
    }

    /// Palette selector (zero for direct colour textures)
    pub fn clut(&self) -> u16 {
        self.clut
    }

    /// Left edge within the page, in texels
    pub fn u(&self) -> u8 {
        self.u
    }

    /// Top edge within the page
    pub fn v(&self) -> u8 {
        self.v
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Texture coordinate word for the texel at `(du, dv)` inside the texture
    pub fn uv_word(&self, du: u8, dv: u8) -> u32 {
        gp0::uv(self.u.wrapping_add(du), self.v.wrapping_add(dv), self.clut)
    }

    /// Texpage command selecting this texture's page
    pub fn texpage_word(&self) -> u32 {
        gp0::texpage(self.page, false, false)
    }
}

/// One-shot texture uploads over a [`DmaEngine`]
pub struct TextureUploader<'a, G: GpuPorts, C: DmaChannel> {
    dma: &'a mut DmaEngine<G, C>,
}

impl<'a, G: GpuPorts, C: DmaChannel> TextureUploader<'a, G, C> {
    pub fn new(dma: &'a mut DmaEngine<G, C>) -> Self {
        Self { dma }
    }

    /// Upload a 16bpp image to `(x, y)`
    ///
    /// Blocks until the transfer is done.
    pub fn upload_direct(
        &mut self,
        data: &[u8],
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<TextureDescriptor, UploadError> {
        if width > MAX_TEXTURE_SIZE || height > MAX_TEXTURE_SIZE {
            return Err(UploadError::TooLarge);
        }

        self.dma.transfer_block(data, x, y, width, height)?;
        self.dma.wait_done();

        Ok(TextureDescriptor {
            page: gp0::page(
                x / PAGE_WIDTH,
                y / PAGE_HEIGHT,
                BlendMode::SemiTransparent,
                ColorDepth::Direct16,
            ),
            clut: 0,
            u: (x % PAGE_WIDTH) as u8,
            v: (y % PAGE_HEIGHT) as u8,
            width,
            height,
        })
    }

    /// Upload a palette-indexed image to `(x, y)` and its palette to
    /// `(palette_x, palette_y)`
    ///
    /// `width` is in texels; the image occupies `width / 2` (8bpp) or
    /// `width / 4` (4bpp) halfwords of VRAM. Blocks until both transfers
    /// are done.
    #[allow(clippy::too_many_arguments)]
    pub fn upload_indexed(
        &mut self,
        image: &[u8],
        palette: &[u8],
        x: u16,
        y: u16,
        palette_x: u16,
        palette_y: u16,
        width: u16,
        height: u16,
        depth: ColorDepth,
    ) -> Result<TextureDescriptor, UploadError> {
        if width > MAX_TEXTURE_SIZE || height > MAX_TEXTURE_SIZE {
            return Err(UploadError::TooLarge);
        }
        if depth == ColorDepth::Direct16 {
            return Err(UploadError::NotIndexed);
        }

        let colors = depth.palette_len();
        let divider = depth.pixels_per_halfword();
        if palette_x % CLUT_ALIGNMENT != 0 {
            return Err(UploadError::PaletteMisaligned);
        }
        if palette_x + colors > VRAM_WIDTH || palette_y >= VRAM_HEIGHT {
            return Err(UploadError::PaletteOutOfRange);
        }
        if width % divider != 0 {
            return Err(DmaError::UnevenLength.into());
        }

        self.dma.transfer_block(image, x, y, width / divider, height)?;
        self.dma.wait_done();
        self.dma.transfer_block(palette, palette_x, palette_y, colors, 1)?;
        self.dma.wait_done();

        Ok(TextureDescriptor {
            page: gp0::page(x / PAGE_WIDTH, y / PAGE_HEIGHT, BlendMode::SemiTransparent, depth),
            clut: gp0::clut(palette_x / CLUT_ALIGNMENT, palette_y),
            u: ((x % PAGE_WIDTH) * divider) as u8,
            v: (y % PAGE_HEIGHT) as u8,
            width,
            height,
        })
    }
}
