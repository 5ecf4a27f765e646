//! Controller and memory card bus
//!
//! Layered bottom-up:
//!
//! - [`SerialTransport`] - one full-duplex byte at a time, port selection
//! - [`AcknowledgeMonitor`] - bounded wait for the DSR pulse after a byte
//! - [`PacketProtocol`] - addressed request/response framing
//! - [`InputPoller`] - controller polling and button decoding
//!
//! A device that never acknowledges is not an error anywhere in this
//! stack. It shows up as a short or empty response.

pub mod ack;
pub mod input;
pub mod packet;
pub mod poller;
pub mod transport;

pub use ack::AcknowledgeMonitor;
pub use input::InputState;
pub use packet::PacketProtocol;
pub use poller::{InputPoller, PadState};
pub use transport::SerialTransport;

/// Controller port group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    One,
    Two,
}

impl Port {
    /// Both ports, in bus order
    pub const ALL: [Port; 2] = [Port::One, Port::Two];

    /// Zero-based port index
    pub fn index(self) -> usize {
        match self {
            Port::One => 0,
            Port::Two => 1,
        }
    }
}
