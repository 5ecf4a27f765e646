//! Byte-level serial bus transport

use psxio_hal::sio::{SioControl, SioMode, SioPort, SioStatus};

use super::Port;
use crate::config::SioConfig;

/// Full-duplex byte exchange over the controller bus
pub struct SerialTransport<P: SioPort> {
    port: P,
}

impl<P: SioPort> SerialTransport<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    /// Reset the port and configure it for controllers and memory cards
    ///
    /// 8 data bits, no parity, divide-by-1 clock, with an interrupt latched
    /// on every DSR pulse. Safe to call again; it resets the port first.
    pub fn init_bus(&mut self, config: &SioConfig) {
        self.port.set_control(SioControl::RESET);
        self.port.set_mode(SioMode::BAUD_DIV1 | SioMode::DATA_8);
        self.port.set_baud_reload(config.baud_reload());
        self.port.set_control(
            SioControl::TX_ENABLE | SioControl::RX_ENABLE | SioControl::DSR_IRQ_ENABLE,
        );
    }

    /// Route DTR to one of the two port groups
    ///
    /// The bus itself is shared; devices ignore packets unless DTR is
    /// asserted on their port.
    pub fn select_port(&mut self, port: Port) {
        match port {
            Port::One => self
                .port
                .modify_control(SioControl::empty(), SioControl::CS_PORT_2),
            Port::Two => self
                .port
                .modify_control(SioControl::CS_PORT_2, SioControl::empty()),
        }
    }

    /// Assert or release DTR on the selected port
    ///
    /// Asserting also strobes `ACKNOWLEDGE` so a stale DSR pulse from the
    /// previous packet cannot be latched.
    pub fn set_select(&mut self, asserted: bool) {
        if asserted {
            self.port.modify_control(
                SioControl::DTR | SioControl::ACKNOWLEDGE,
                SioControl::empty(),
            );
        } else {
            self.port.modify_control(SioControl::empty(), SioControl::DTR);
        }
    }

    /// Send one byte and return the byte clocked in at the same time
    ///
    /// Blocks on the port status with no timeout; the callers bound how
    /// many bytes they exchange.
    pub fn exchange_byte(&mut self, value: u8) -> u8 {
        while !self.port.status().contains(SioStatus::TX_NOT_FULL) {
            core::hint::spin_loop();
        }
        self.port.write_data(value);

        while !self.port.status().contains(SioStatus::RX_NOT_EMPTY) {
            core::hint::spin_loop();
        }
        self.port.read_data()
    }

    /// Start sending a byte without waiting for the reply
    pub fn send_byte(&mut self, value: u8) {
        self.port.write_data(value);
    }

    /// Discard any received bytes
    pub fn drain(&mut self) {
        while self.port.status().contains(SioStatus::RX_NOT_EMPTY) {
            self.port.read_data();
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Give the port back
    pub fn release(self) -> P {
        self.port
    }
}
