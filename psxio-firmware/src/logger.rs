//! defmt transport over the debug serial port
//!
//! Frames go out on SIO1 as raw defmt bytes; decode them on the host with
//! `defmt-print` against the firmware ELF. The firmware takes no
//! interrupts, so the logger only has to guard against re-entry from a
//! panic raised while a frame is being written.

use core::cell::{Cell, UnsafeCell};

use psxio_hal_ps1::Sio1;

/// Debug port bit rate
pub const LOG_BAUD_RATE: u32 = 115_200;

struct LoggerState {
    taken: Cell<bool>,
    encoder: UnsafeCell<defmt::Encoder>,
    port: UnsafeCell<Option<Sio1>>,
}

// Single core, no interrupt handlers: only the main loop touches this
unsafe impl Sync for LoggerState {}

static STATE: LoggerState = LoggerState {
    taken: Cell::new(false),
    encoder: UnsafeCell::new(defmt::Encoder::new()),
    port: UnsafeCell::new(None),
};

/// Configure SIO1 and start sending log frames through it
///
/// Frames logged before this are dropped.
pub fn init(mut port: Sio1, cpu_clock_hz: u32) {
    port.init(cpu_clock_hz, LOG_BAUD_RATE);
    // SAFETY: nothing is being logged while the port is installed
    unsafe { *STATE.port.get() = Some(port) };
}

fn write_port(bytes: &[u8]) {
    // SAFETY: only called between acquire and release
    if let Some(port) = unsafe { &mut *STATE.port.get() } {
        port.write_bytes(bytes);
    }
}

#[defmt::global_logger]
struct Sio1Logger;

unsafe impl defmt::Logger for Sio1Logger {
    fn acquire() {
        if STATE.taken.replace(true) {
            // Re-entered from inside a frame; nothing sane to do
            loop {
                core::hint::spin_loop();
            }
        }
        // SAFETY: `taken` gives exclusive access until release
        unsafe { (*STATE.encoder.get()).start_frame(write_port) };
    }

    unsafe fn flush() {}

    unsafe fn release() {
        (*STATE.encoder.get()).end_frame(write_port);
        STATE.taken.set(false);
    }

    unsafe fn write(bytes: &[u8]) {
        (*STATE.encoder.get()).write(bytes, write_port);
    }
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    defmt::error!("{}", defmt::Display2Format(info));
    loop {
        core::hint::spin_loop();
    }
}
