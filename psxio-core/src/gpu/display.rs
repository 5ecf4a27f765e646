//! Display timing setup

use psxio_hal::gpu::{GpuPorts, GpuStatus};
use psxio_protocol::gp1::{self, DmaRequestMode, HorizontalRes, VerticalRes, VideoStandard};

use crate::config::VideoConfig;

/// Horizontal centre of the visible area, in dot clock cycles
const CENTER_X: u16 = 0x760;
/// Vertical centre of the visible area, in scanlines
const CENTER_Y_NTSC: u16 = 0x88;
const CENTER_Y_PAL: u16 = 0xA3;

/// Progressive modes top out at this many lines
const MAX_PROGRESSIVE_LINES: u16 = 256;

/// Smallest horizontal mode at least `width` pixels wide
fn horizontal_res(width: u16) -> HorizontalRes {
    match width {
        0..=256 => HorizontalRes::H256,
        257..=320 => HorizontalRes::H320,
        321..=368 => HorizontalRes::H368,
        369..=512 => HorizontalRes::H512,
        _ => HorizontalRes::H640,
    }
}

/// Video standard the GPU is currently producing
pub fn detect_standard<G: GpuPorts>(gpu: &G) -> VideoStandard {
    if gpu.status().contains(GpuStatus::PAL) {
        VideoStandard::Pal
    } else {
        VideoStandard::Ntsc
    }
}

/// Reset the GPU and program the display for `config`
///
/// The visible area is centred on the standard's nominal picture centre.
/// Heights above 256 lines switch to interlaced output. Leaves the display
/// enabled and GP0 DMA requests selected, and returns the standard in use.
pub fn setup_display<G: GpuPorts>(gpu: &mut G, config: &VideoConfig) -> VideoStandard {
    let standard = config.mode.resolve(detect_standard(gpu));

    let horizontal = horizontal_res(config.width);
    let vertical = if config.height > MAX_PROGRESSIVE_LINES {
        VerticalRes::V512
    } else {
        VerticalRes::V256
    };
    let center_y = match standard {
        VideoStandard::Ntsc => CENTER_Y_NTSC,
        VideoStandard::Pal => CENTER_Y_PAL,
    };

    let offset_x = config.width * horizontal.clock_multiplier() / 2;
    let offset_y = config.height / vertical.clock_divider() / 2;

    gpu.write_gp1(gp1::reset());
    gpu.write_gp1(gp1::range_h(CENTER_X.saturating_sub(offset_x), CENTER_X + offset_x));
    gpu.write_gp1(gp1::range_v(center_y.saturating_sub(offset_y), center_y + offset_y));
    gpu.write_gp1(gp1::video_mode(
        horizontal,
        vertical,
        standard,
        vertical == VerticalRes::V512,
        false,
    ));
    gpu.write_gp1(gp1::display_start(0, 0));
    gpu.write_gp1(gp1::dma_request_mode(DmaRequestMode::Gp0Write));
    gpu.write_gp1(gp1::display_blank(false));

    #[cfg(feature = "defmt")]
    defmt::debug!(
        "Display {=u16}x{=u16} {}",
        config.width,
        config.height,
        standard
    );

    standard
}
