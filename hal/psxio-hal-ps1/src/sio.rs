//! Serial ports
//!
//! SIO0 carries the controller/memory card bus. SIO1 is the console's
//! general purpose UART, used here as the debug log output.

use psxio_hal::irq::Irq;
use psxio_hal::sio::{SioControl, SioMode, SioPort, SioStatus};

use crate::regs::{sio_baud, sio_ctrl, sio_data, sio_mode, sio_stat, IRQ_STAT};

const SIO0: usize = 0;
const SIO1: usize = 1;

/// Controller/memory card port
///
/// The DSR acknowledge pulse is latched in the interrupt controller's
/// status register, so this port reads and clears that bit as well.
pub struct Sio0 {
    _private: (),
}

impl Sio0 {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl SioPort for Sio0 {
    fn status(&self) -> SioStatus {
        SioStatus::from_bits_retain(sio_stat(SIO0).read())
    }

    fn read_data(&mut self) -> u8 {
        sio_data(SIO0).read()
    }

    fn write_data(&mut self, value: u8) {
        sio_data(SIO0).write(value);
    }

    fn control(&self) -> SioControl {
        SioControl::from_bits_retain(sio_ctrl(SIO0).read())
    }

    fn set_control(&mut self, control: SioControl) {
        sio_ctrl(SIO0).write(control.bits());
    }

    fn set_mode(&mut self, mode: SioMode) {
        sio_mode(SIO0).write(mode.bits());
    }

    fn set_baud_reload(&mut self, reload: u16) {
        sio_baud(SIO0).write(reload);
    }

    fn acknowledge_pending(&self) -> bool {
        IRQ_STAT.read() & Irq::Sio0.mask() != 0
    }

    fn clear_acknowledge_latch(&mut self) {
        // Writing 0 clears a status bit, writing 1 leaves it alone
        IRQ_STAT.write(!Irq::Sio0.mask());
    }
}

/// Debug UART
pub struct Sio1 {
    _private: (),
}

impl Sio1 {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }

    /// Configure for 8N1 at `baud_rate`
    pub fn init(&mut self, cpu_clock_hz: u32, baud_rate: u32) {
        sio_ctrl(SIO1).write(SioControl::RESET.bits());
        sio_mode(SIO1).write((SioMode::BAUD_DIV16 | SioMode::DATA_8 | SioMode::STOP_1).bits());
        sio_baud(SIO1).write((cpu_clock_hz / (16 * baud_rate)) as u16);
        let control = SioControl::TX_ENABLE | SioControl::RX_ENABLE | SioControl::RTS;
        sio_ctrl(SIO1).write(control.bits());
    }

    /// Write bytes, blocking while the transmitter is full
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            while sio_stat(SIO1).read() & SioStatus::TX_NOT_FULL.bits() == 0 {
                core::hint::spin_loop();
            }
            sio_data(SIO1).write(byte);
        }
    }
}
