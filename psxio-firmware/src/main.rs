//! psxio - console front-end I/O firmware
//!
//! Bare-metal frame loop for the console. Each frame it polls both
//! controller ports, builds a command chain showing the button state and
//! hands it to the GPU on the next vertical blank.
//!
//! Process startup (stack, BSS, jump to `main`) and interrupt controller
//! setup come from the console's startup object, not from this crate.

#![no_std]
#![no_main]

mod config;
mod logger;
mod scene;

use defmt::{debug, info, warn};
use psxio_core::gpu::{setup_display, DmaEngine, FrameContext, FramePacer, TextureUploader};
use psxio_core::pad::{InputPoller, InputState, PacketProtocol, PadState, Port};
use psxio_hal_ps1::{Peripherals, F_CPU};
use psxio_protocol::gp0::ColorDepth;
use psxio_protocol::pad::DeviceType;

use crate::scene::{PortView, Scene, MARKER_IMAGE, MARKER_PALETTE, MARKER_SIZE};

/// VRAM placement of the marker texture and its palette, clear of both
/// framebuffers
const MARKER_VRAM: (u16, u16) = (640, 256);
const MARKER_CLUT_VRAM: (u16, u16) = (640, 480);

/// Main entry point, called by the startup object
#[no_mangle]
pub extern "C" fn main() -> ! {
    // SAFETY: called once; nothing else creates peripheral handles
    let p = unsafe { Peripherals::steal() };

    logger::init(p.sio1, F_CPU);
    info!("psxio starting");

    // GPU and display
    let mut dma = DmaEngine::new(p.gpu, p.gpu_dma);
    dma.enable();
    let standard = setup_display(dma.gpu_mut(), &config::VIDEO);
    info!("Display up: {}", standard);

    let marker = match TextureUploader::new(&mut dma).upload_indexed(
        &MARKER_IMAGE.0,
        &MARKER_PALETTE.0,
        MARKER_VRAM.0,
        MARKER_VRAM.1,
        MARKER_CLUT_VRAM.0,
        MARKER_CLUT_VRAM.1,
        MARKER_SIZE,
        MARKER_SIZE,
        ColorDepth::Indexed4,
    ) {
        Ok(texture) => texture,
        Err(e) => defmt::panic!("Marker upload failed: {}", e),
    };

    // Controller bus
    let mut protocol = PacketProtocol::new(p.sio0, p.delay, config::BUS_TIMING);
    protocol.init_bus(&config::SIO);
    let mut poller = InputPoller::new(protocol);

    if !config::GAME_ID.is_empty() {
        match poller.send_game_id(config::GAME_ID) {
            Ok(()) => info!("Announced game ID {}", config::GAME_ID),
            Err(e) => warn!("Game ID not sent: {}", e),
        }
    }

    // Frame loop
    let mut pacer = FramePacer::new(dma, p.irq, config::VIDEO);
    let mut ctx: FrameContext = FrameContext::new();
    let mut port_two = InputState::new();
    let mut scene = Scene::new(marker);
    let mut devices: [Option<DeviceType>; 2] = [None, None];

    info!("Entering frame loop");
    loop {
        let one = poller.poll(Port::One);
        let two = poller.poll(Port::Two);
        port_two.update(two.as_ref().map(|state| state.buttons).unwrap_or_default());

        let frame = pacer.begin_frame(&mut ctx);
        frame
            .input
            .update(one.as_ref().map(|state| state.buttons).unwrap_or_default());

        scene.draw(
            frame.chain,
            [
                PortView {
                    connected: one.is_some(),
                    input: frame.input,
                },
                PortView {
                    connected: two.is_some(),
                    input: &port_two,
                },
            ],
        );

        log_port(Port::One, one.as_ref(), &mut devices[0], frame.input);
        log_port(Port::Two, two.as_ref(), &mut devices[1], &port_two);

        if let Err(e) = pacer.end_frame(&mut ctx) {
            defmt::panic!("Frame submission failed: {}", e);
        }
    }
}

/// Log device changes and newly pressed buttons on one port
fn log_port(
    port: Port,
    state: Option<&PadState>,
    seen: &mut Option<DeviceType>,
    input: &InputState,
) {
    let device = state.map(|state| state.header.device);
    if device != *seen {
        match device {
            Some(device) => info!("{}: {} connected", port, device.name()),
            None => info!("{}: disconnected", port),
        }
        *seen = device;
    }

    for name in input.just_pressed().names() {
        debug!("{}: {} pressed", port, name);
    }
}
