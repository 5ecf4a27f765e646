//! Button state visualisation
//!
//! One row of boxes per controller port, one box per button in bit order.
//! Held buttons light up, buttons pressed this frame flash, and a
//! textured marker sits over the box of the last button pressed.

use psxio_core::gpu::{CommandChain, TextureDescriptor};
use psxio_core::pad::InputState;
use psxio_protocol::gp0::{self, Rgb};
use psxio_protocol::pad::Buttons;

const BOX_SIZE: i32 = 16;
const BOX_GAP: i32 = 2;
const ROW_X: i32 = 16;
const ROW_Y: [i32; 2] = [96, 128];

const IDLE: Rgb = Rgb::new(32, 32, 48);
const HELD: Rgb = Rgb::new(96, 192, 96);
const PRESSED: Rgb = Rgb::new(255, 224, 64);
const ABSENT: Rgb = Rgb::new(96, 24, 24);

pub const MARKER_SIZE: u16 = 16;

/// Word-aligned bytes, as DMA requires
#[repr(C, align(4))]
pub struct Aligned<const N: usize>(pub [u8; N]);

/// 16x16 4bpp outline square: palette index 1 on the border, 0
/// (transparent) inside
pub static MARKER_IMAGE: Aligned<128> = Aligned(marker_texels());

/// Palette: transparent black, then white
pub static MARKER_PALETTE: Aligned<32> = Aligned(marker_palette());

const fn marker_texels() -> [u8; 128] {
    let mut texels = [0u8; 128];
    let mut y = 0;
    while y < 16 {
        let mut x = 0;
        while x < 16 {
            if x == 0 || y == 0 || x == 15 || y == 15 {
                // Two texels per byte, the first in the low nibble
                texels[y * 8 + x / 2] |= 1 << ((x % 2) * 4);
            }
            x += 1;
        }
        y += 1;
    }
    texels
}

const fn marker_palette() -> [u8; 32] {
    let mut palette = [0u8; 32];
    palette[2] = 0xFF;
    palette[3] = 0x7F;
    palette
}

/// What one port showed this frame
pub struct PortView<'a> {
    pub connected: bool,
    pub input: &'a InputState,
}

/// Scene state carried across frames
pub struct Scene {
    marker: TextureDescriptor,
    last_pressed: Option<(usize, usize)>,
}

impl Scene {
    pub fn new(marker: TextureDescriptor) -> Self {
        Self {
            marker,
            last_pressed: None,
        }
    }

    /// Append this frame's draw commands to `chain`
    pub fn draw<const N: usize>(&mut self, chain: &mut CommandChain<N>, ports: [PortView<'_>; 2]) {
        for (row, port) in ports.iter().enumerate() {
            let held = port.input.pressed();
            let pressed = port.input.just_pressed();

            for bit in 0..16 {
                let button = Buttons::from_bits_retain(1 << bit);
                let color = if !port.connected {
                    ABSENT
                } else if pressed.contains(button) {
                    self.last_pressed = Some((row, bit));
                    PRESSED
                } else if held.contains(button) {
                    HELD
                } else {
                    IDLE
                };

                let (x, y) = box_origin(row, bit);
                let rect = chain.allocate(3);
                rect[0] = color.to_word() | gp0::rectangle(false, false, false);
                rect[1] = gp0::xy(x, y);
                rect[2] = gp0::xy(BOX_SIZE, BOX_SIZE);
            }
        }

        if let Some((row, bit)) = self.last_pressed {
            self.draw_marker(chain, row, bit);
        }
    }

    fn draw_marker<const N: usize>(&self, chain: &mut CommandChain<N>, row: usize, bit: usize) {
        let (x, y) = box_origin(row, bit);
        let marker = &self.marker;

        let sprite = chain.allocate(5);
        sprite[0] = marker.texpage_word();
        sprite[1] = gp0::rectangle(true, false, true);
        sprite[2] = gp0::xy(x, y);
        sprite[3] = marker.uv_word(0, 0);
        sprite[4] = gp0::xy(marker.width() as i32, marker.height() as i32);
    }
}

fn box_origin(row: usize, bit: usize) -> (i32, i32) {
    (ROW_X + bit as i32 * (BOX_SIZE + BOX_GAP), ROW_Y[row])
}
