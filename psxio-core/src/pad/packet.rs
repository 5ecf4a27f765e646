//! Addressed packet framing
//!
//! Packet exchange sequence:
//! 1. Clear the acknowledge latch, assert DTR, wait for the device to wake
//! 2. Send the address byte and wait for the first DSR pulse
//! 3. Exchange request bytes (then zero filler) while the device keeps
//!    acknowledging, up to the response buffer size
//! 4. Wait, release DTR, wait
//!
//! No pulse after the address byte means no device answered; the exchange
//! returns zero bytes. Any later missing pulse ends the packet early.

use embedded_hal::delay::DelayNs;
use psxio_hal::sio::SioPort;
use psxio_protocol::pad::DeviceAddress;

use super::ack::AcknowledgeMonitor;
use super::transport::SerialTransport;
use super::Port;
use crate::config::{BusTiming, SioConfig};

/// Request/response packets over the controller bus
pub struct PacketProtocol<P: SioPort, D: DelayNs> {
    transport: SerialTransport<P>,
    ack: AcknowledgeMonitor,
    delay: D,
    timing: BusTiming,
}

impl<P: SioPort, D: DelayNs> PacketProtocol<P, D> {
    pub fn new(port: P, delay: D, timing: BusTiming) -> Self {
        Self {
            transport: SerialTransport::new(port),
            ack: AcknowledgeMonitor::new(timing.ack_poll_step_us),
            delay,
            timing,
        }
    }

    /// Reset and configure the bus
    pub fn init_bus(&mut self, config: &SioConfig) {
        self.transport.init_bus(config);
    }

    /// Select the port group the next packet goes to
    pub fn select_port(&mut self, port: Port) {
        self.transport.select_port(port);
    }

    /// Exchange a packet with the device at `address`
    ///
    /// Bytes past the end of `request` are sent as zero. Returns the number
    /// of bytes written to `response`, which may be anything from zero (no
    /// device) up to `response.len()`, and may exceed `request.len()`.
    pub fn exchange_packet(
        &mut self,
        address: DeviceAddress,
        request: &[u8],
        response: &mut [u8],
    ) -> usize {
        self.begin_packet();
        self.transport.send_byte(address.to_byte());

        let mut length = 0;
        if self.wait_for_acknowledge() {
            self.transport.drain();

            let mut request = request.iter();
            while length < response.len() {
                let value = request.next().copied().unwrap_or(0);
                response[length] = self.transport.exchange_byte(value);
                length += 1;

                // Devices keep pulsing DSR while there is more to transfer
                if !self.wait_for_acknowledge() {
                    break;
                }
            }
        }

        self.end_packet();
        length
    }

    /// Send a packet without waiting for per-byte acknowledge
    ///
    /// For devices that listen but never reply. Exactly `request.len()`
    /// bytes follow the address, spaced by the configured byte delay.
    pub fn send_packet_no_acknowledge(&mut self, address: DeviceAddress, request: &[u8]) {
        self.transport.port_mut().clear_acknowledge_latch();
        self.transport.set_select(true);
        self.delay.delay_us(self.timing.dtr_delay_us);

        self.transport.send_byte(address.to_byte());
        self.delay.delay_us(self.timing.byte_delay_us);
        self.transport.drain();

        for &byte in request {
            self.transport.exchange_byte(byte);
            self.delay.delay_us(self.timing.byte_delay_us);
        }

        self.delay.delay_us(self.timing.dtr_delay_us);
        self.transport.set_select(false);
    }

    fn begin_packet(&mut self) {
        self.delay.delay_us(self.timing.dtr_pre_delay_us);
        self.transport.port_mut().clear_acknowledge_latch();
        self.transport.set_select(true);
        self.delay.delay_us(self.timing.dtr_delay_us);
    }

    fn end_packet(&mut self) {
        self.delay.delay_us(self.timing.dtr_delay_us);
        self.transport.set_select(false);
        self.delay.delay_us(self.timing.dtr_post_delay_us);
    }

    fn wait_for_acknowledge(&mut self) -> bool {
        self.ack.wait(
            self.transport.port_mut(),
            &mut self.delay,
            self.timing.ack_timeout_us,
        )
    }

    pub fn timing(&self) -> &BusTiming {
        &self.timing
    }

    pub fn port(&self) -> &P {
        self.transport.port()
    }

    pub fn port_mut(&mut self) -> &mut P {
        self.transport.port_mut()
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimBus, SimClock, SimPad};
    use proptest::prelude::*;
    use psxio_hal::sio::SioControl;
    use psxio_protocol::pad::POLL_REQUEST;

    fn protocol(pad: Option<SimPad>) -> PacketProtocol<SimBus, SimClock> {
        let mut bus = SimBus::new();
        if let Some(pad) = pad {
            bus.attach(Port::One, pad);
        }
        let mut protocol = PacketProtocol::new(bus, SimClock::new(), BusTiming::default());
        protocol.init_bus(&SioConfig::default());
        protocol.select_port(Port::One);
        protocol
    }

    #[test]
    fn test_no_device_returns_empty() {
        let mut protocol = protocol(None);
        let mut response = [0u8; 8];

        let length =
            protocol.exchange_packet(DeviceAddress::Controller, &POLL_REQUEST, &mut response);

        assert_eq!(length, 0);
        assert!(!protocol.port().control().contains(SioControl::DTR));
        assert_eq!(protocol.port().select_cycles(), 1);
        // Only the address byte went out
        assert_eq!(protocol.port().sent(), &[0x01]);
    }

    #[test]
    fn test_wrong_address_is_ignored() {
        let mut protocol = protocol(Some(SimPad::memory_card()));
        let mut response = [0u8; 8];

        let length =
            protocol.exchange_packet(DeviceAddress::Controller, &POLL_REQUEST, &mut response);
        assert_eq!(length, 0);
    }

    #[test]
    fn test_digital_pad_response() {
        let mut protocol = protocol(Some(SimPad::digital(!0x0010)));
        let mut response = [0u8; 8];

        let length =
            protocol.exchange_packet(DeviceAddress::Controller, &POLL_REQUEST, &mut response);

        assert_eq!(length, 4);
        assert_eq!(&response[..4], &[0x41, 0x5A, 0xEF, 0xFF]);
        assert!(!protocol.port().control().contains(SioControl::DTR));

        let pad = protocol.port().device(Port::One).unwrap();
        assert_eq!(pad.last_packet(), &POLL_REQUEST);
    }

    #[test]
    fn test_response_longer_than_request_is_zero_padded() {
        let mut protocol = protocol(Some(SimPad::analog(0xFFFF, [0x80, 0x80, 0x80, 0x80])));
        let mut response = [0u8; 8];

        let length =
            protocol.exchange_packet(DeviceAddress::Controller, &POLL_REQUEST, &mut response);

        assert_eq!(length, 8);
        let pad = protocol.port().device(Port::One).unwrap();
        assert_eq!(pad.last_packet(), &[0x42, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_response_truncated_to_buffer() {
        let mut protocol = protocol(Some(SimPad::analog(0xFFFF, [0x80, 0x80, 0x80, 0x80])));
        let mut response = [0u8; 5];

        let length =
            protocol.exchange_packet(DeviceAddress::Controller, &POLL_REQUEST, &mut response);
        assert_eq!(length, 5);
        assert_eq!(response[0], 0x73);
    }

    #[test]
    fn test_exchange_timing() {
        let mut protocol = protocol(Some(SimPad::digital(0xFFFF)));
        let mut response = [0u8; 8];

        protocol.exchange_packet(DeviceAddress::Controller, &POLL_REQUEST, &mut response);

        // Handshake delays plus one full timeout after the last byte
        let timing = BusTiming::default();
        let expected = timing.dtr_pre_delay_us
            + 2 * timing.dtr_delay_us
            + timing.dtr_post_delay_us
            + timing.ack_timeout_us;
        assert_eq!(protocol.delay_mut().elapsed_us(), expected as u64);
    }

    #[test]
    fn test_send_without_acknowledge() {
        let mut bus = SimBus::new();
        bus.attach(Port::Two, SimPad::memory_card());
        let mut protocol = PacketProtocol::new(bus, SimClock::new(), BusTiming::default());
        protocol.init_bus(&SioConfig::default());
        protocol.select_port(Port::Two);
        // Left over from an earlier exchange
        protocol.port_mut().push_rx(0xAB);

        let request = [0x20, 0x00, 0x02, b'A', 0x00];
        protocol.send_packet_no_acknowledge(DeviceAddress::MemoryCard, &request);

        let card = protocol.port().device(Port::Two).unwrap();
        assert_eq!(card.last_packet(), &request);
        assert!(!protocol.port().control().contains(SioControl::DTR));

        // Stale byte and address reply are drained before the first request byte
        assert_eq!(protocol.port().backlog(), &[1, 0, 0, 0, 0, 0]);
        assert_eq!(protocol.port().rx_len(), 0);
    }

    #[test]
    fn test_send_without_acknowledge_to_empty_port() {
        let mut protocol = protocol(None);
        protocol.send_packet_no_acknowledge(DeviceAddress::MemoryCard, &[0x20, 0x00]);

        // Every byte still goes out
        assert_eq!(protocol.port().sent(), &[0x81, 0x20, 0x00]);
    }

    proptest! {
        #[test]
        fn test_response_length_bounds(
            extra in proptest::collection::vec(any::<u8>(), 0..12),
            budget in 0usize..16,
        ) {
            let pad = SimPad::with_response(DeviceAddress::Controller, &extra);
            let mut protocol = protocol(Some(pad));
            let mut response = [0u8; 16];

            let length = protocol.exchange_packet(
                DeviceAddress::Controller,
                &POLL_REQUEST,
                &mut response[..budget],
            );

            prop_assert_eq!(length, extra.len().min(budget));
            prop_assert_eq!(&response[..length], &extra[..length]);
            prop_assert!(!protocol.port().control().contains(SioControl::DTR));
        }
    }
}
