//! Controller polling

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use psxio_hal::sio::SioPort;
use psxio_protocol::pad::{
    build_game_id_packet, Buttons, DeviceAddress, PacketError, ResponseHeader,
    MAX_POLL_RESPONSE, MIN_POLL_RESPONSE, POLL_REQUEST,
};

use super::packet::PacketProtocol;
use super::Port;

/// Device-specific bytes after the button field (analog axes etc.)
pub const MAX_EXTRA_BYTES: usize = MAX_POLL_RESPONSE - MIN_POLL_RESPONSE;

/// Decoded poll response
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadState {
    pub header: ResponseHeader,
    pub buttons: Buttons,
    /// Raw bytes following the button field
    pub extra: Vec<u8, MAX_EXTRA_BYTES>,
}

/// Polls controllers over the packet protocol
///
/// Polling is slow (several hundred microseconds per port), so poll each
/// port at most once per frame unless a higher rate is really needed.
pub struct InputPoller<P: SioPort, D: DelayNs> {
    protocol: PacketProtocol<P, D>,
}

impl<P: SioPort, D: DelayNs> InputPoller<P, D> {
    pub fn new(protocol: PacketProtocol<P, D>) -> Self {
        Self { protocol }
    }

    /// Poll `port` and decode the whole response
    ///
    /// Returns `None` when fewer than four bytes came back, which is how a
    /// disconnected port looks.
    pub fn poll(&mut self, port: Port) -> Option<PadState> {
        let mut response = [0u8; MAX_POLL_RESPONSE];

        self.protocol.select_port(port);
        let length =
            self.protocol
                .exchange_packet(DeviceAddress::Controller, &POLL_REQUEST, &mut response);

        if length < MIN_POLL_RESPONSE {
            #[cfg(feature = "defmt")]
            defmt::trace!("No controller on port {}", port);
            return None;
        }

        let mut extra = Vec::new();
        // Cannot fail: at most MAX_POLL_RESPONSE - MIN_POLL_RESPONSE bytes
        let _ = extra.extend_from_slice(&response[MIN_POLL_RESPONSE..length]);

        Some(PadState {
            header: ResponseHeader::from_byte(response[0]),
            buttons: Buttons::from_response(response[2], response[3]),
            extra,
        })
    }

    /// Poll `port` for pressed buttons
    ///
    /// A disconnected port reports nothing pressed.
    pub fn poll_buttons(&mut self, port: Port) -> Buttons {
        self.poll(port)
            .map(|state| state.buttons)
            .unwrap_or(Buttons::empty())
    }

    /// Announce the running game's ID to memory card adaptors on both ports
    pub fn send_game_id(&mut self, id: &str) -> Result<(), PacketError> {
        let packet = build_game_id_packet(id)?;

        for port in Port::ALL {
            self.protocol.select_port(port);
            self.protocol
                .send_packet_no_acknowledge(DeviceAddress::MemoryCard, &packet);
        }

        Ok(())
    }

    pub fn protocol(&self) -> &PacketProtocol<P, D> {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut PacketProtocol<P, D> {
        &mut self.protocol
    }
}
