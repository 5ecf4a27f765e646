//! Serial bus port abstractions
//!
//! Controllers and memory cards share one synchronous serial bus (SIO0).
//! The host clocks one byte out and one byte in per transfer, and devices
//! pulse the DSR line after each byte when they have more to say. The DSR
//! pulse is latched by the interrupt controller, which is why the latch is
//! part of the port capability rather than a separate interrupt trait.

use bitflags::bitflags;

bitflags! {
    /// SIO status register (read-only)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SioStatus: u32 {
        /// Transmit stage can accept another byte
        const TX_NOT_FULL = 1 << 0;
        /// A received byte is waiting in the data register
        const RX_NOT_EMPTY = 1 << 1;
        /// Transmit shift register is idle
        const TX_EMPTY = 1 << 2;
        const RX_PARITY_ERROR = 1 << 3;
        const RX_OVERRUN = 1 << 4;
        const RX_STOP_ERROR = 1 << 5;
        const RX_INVERTED = 1 << 6;
        /// Current level of the DSR (acknowledge) input
        const DSR = 1 << 7;
        const CTS = 1 << 8;
        /// Interrupt request pending in the port itself
        const IRQ = 1 << 9;
    }
}

bitflags! {
    /// SIO control register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SioControl: u16 {
        const TX_ENABLE = 1 << 0;
        /// Device select line (DTR), asserted for the duration of a packet
        const DTR = 1 << 1;
        const RX_ENABLE = 1 << 2;
        const TX_INVERT = 1 << 3;
        /// Write-only strobe: clears the port's latched interrupt state
        const ACKNOWLEDGE = 1 << 4;
        const RTS = 1 << 5;
        /// Write-only strobe: resets the port
        const RESET = 1 << 6;
        const TX_IRQ_ENABLE = 1 << 10;
        const RX_IRQ_ENABLE = 1 << 11;
        /// Raise an interrupt on every DSR pulse
        const DSR_IRQ_ENABLE = 1 << 12;
        /// Select the second port group (clear = first port group)
        const CS_PORT_2 = 1 << 13;
    }
}

bitflags! {
    /// SIO mode register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SioMode: u16 {
        const BAUD_DIV1 = 1;
        const BAUD_DIV16 = 2;
        const BAUD_DIV64 = 3;
        const DATA_5 = 0 << 2;
        const DATA_6 = 1 << 2;
        const DATA_7 = 2 << 2;
        const DATA_8 = 3 << 2;
        const PARITY_ENABLE = 1 << 4;
        const PARITY_ODD = 1 << 5;
        const STOP_1 = 1 << 6;
        const STOP_1_5 = 2 << 6;
        const STOP_2 = 3 << 6;
        const SCK_INVERT = 1 << 8;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SioStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "SioStatus({=u32:#x})", self.bits());
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SioControl {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "SioControl({=u16:#x})", self.bits());
    }
}

/// Controller/memory card serial port
///
/// Register-level access to one synchronous serial port. All methods are
/// single register reads or writes; sequencing (select, handshake,
/// timeouts) is the caller's job.
pub trait SioPort {
    /// Read the status register
    fn status(&self) -> SioStatus;

    /// Read the received byte from the data register
    fn read_data(&mut self) -> u8;

    /// Write a byte to the data register, starting a transfer
    fn write_data(&mut self, value: u8);

    /// Read back the control register
    ///
    /// Strobe bits (`ACKNOWLEDGE`, `RESET`) never read back as set.
    fn control(&self) -> SioControl;

    /// Write the control register
    fn set_control(&mut self, control: SioControl);

    /// Write the mode register
    fn set_mode(&mut self, mode: SioMode);

    /// Write the baud rate reload value
    fn set_baud_reload(&mut self, reload: u16);

    /// Check the interrupt latch raised by a DSR pulse on this port
    fn acknowledge_pending(&self) -> bool;

    /// Clear the interrupt latch for this port
    ///
    /// The port itself must also be re-armed with the `ACKNOWLEDGE`
    /// control strobe before another pulse can be latched.
    fn clear_acknowledge_latch(&mut self);

    /// Set or clear control bits, leaving the others untouched
    fn modify_control(&mut self, set: SioControl, clear: SioControl) {
        let control = (self.control() | set) - clear;
        self.set_control(control);
    }
}
