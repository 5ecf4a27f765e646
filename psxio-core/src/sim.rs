//! Software model of the console's I/O hardware
//!
//! Register-level stand-ins for the `psxio-hal` traits, detailed enough to
//! run the whole core on the host:
//!
//! - [`SimBus`] - controller bus with a [`SimPad`] device on each port
//! - [`SimClock`] - delay that only accumulates elapsed time
//! - [`SimGpu`], [`SimDma`], [`SimIrq`] - record writes and report
//!   ready / busy / vblank after a set number of polls
//!
//! Devices answer instantly: the reply byte is ready and the DSR pulse
//! latched as soon as the host writes a byte.

use core::cell::Cell;

use embedded_hal::delay::DelayNs;
use heapless::{Deque, Vec};
use psxio_hal::dma::{DmaChannel, DmaControl};
use psxio_hal::gpu::{GpuPorts, GpuStatus};
use psxio_hal::irq::{InterruptController, Irq};
use psxio_hal::sio::{SioControl, SioMode, SioPort, SioStatus};
use psxio_protocol::pad::{DeviceAddress, RESPONSE_MARKER};

use crate::pad::Port;

const MAX_RESPONSE: usize = 32;
const MAX_PACKET: usize = 64;
const MAX_SENT: usize = 512;

/// Depth of the receive FIFO
const RX_FIFO_DEPTH: usize = 8;
const MAX_GPU_WORDS: usize = 256;
const MAX_TRANSFERS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PadPhase {
    /// Waiting for an address byte
    Idle,
    /// Addressed; `position` bytes of the response sent so far
    Active { position: usize },
    /// Another device was addressed; ignore the rest of the packet
    Ignoring,
}

/// A device on one controller port
///
/// Answers packets sent to its address with a fixed response, pulsing DSR
/// after every byte except the last one of the response.
#[derive(Debug, Clone)]
pub struct SimPad {
    address: u8,
    response: Vec<u8, MAX_RESPONSE>,
    phase: PadPhase,
    received: Vec<u8, MAX_PACKET>,
    last_packet: Vec<u8, MAX_PACKET>,
    packet_count: usize,
}

impl SimPad {
    /// Device answering `address` with `response`
    ///
    /// An empty response means the device never acknowledges.
    pub fn with_response(address: DeviceAddress, response: &[u8]) -> Self {
        let mut bytes = Vec::new();
        let _ = bytes.extend_from_slice(&response[..response.len().min(MAX_RESPONSE)]);
        Self {
            address: address.to_byte(),
            response: bytes,
            phase: PadPhase::Idle,
            received: Vec::new(),
            last_packet: Vec::new(),
            packet_count: 0,
        }
    }

    /// Digital pad reporting the active-low button `field`
    pub fn digital(field: u16) -> Self {
        let [low, high] = field.to_le_bytes();
        Self::with_response(DeviceAddress::Controller, &[0x41, RESPONSE_MARKER, low, high])
    }

    /// Analog pad reporting `field` and four stick axes
    pub fn analog(field: u16, axes: [u8; 4]) -> Self {
        let [low, high] = field.to_le_bytes();
        Self::with_response(
            DeviceAddress::Controller,
            &[0x73, RESPONSE_MARKER, low, high, axes[0], axes[1], axes[2], axes[3]],
        )
    }

    /// Memory card, answering with its ID bytes
    pub fn memory_card() -> Self {
        Self::with_response(DeviceAddress::MemoryCard, &[0x08, RESPONSE_MARKER, 0x5D])
    }

    /// Change the reported button field of a pad
    pub fn set_buttons(&mut self, field: u16) {
        let [low, high] = field.to_le_bytes();
        if self.response.len() >= 4 {
            self.response[2] = low;
            self.response[3] = high;
        }
    }

    /// Bytes the host sent after the address in the last packet for this
    /// device
    pub fn last_packet(&self) -> &[u8] {
        &self.last_packet
    }

    /// Packets addressed to this device so far
    pub fn packet_count(&self) -> usize {
        self.packet_count
    }

    /// Take one byte from the host; returns the reply and whether DSR is
    /// pulsed afterwards
    fn on_byte(&mut self, value: u8) -> (u8, bool) {
        match self.phase {
            PadPhase::Idle => {
                if value == self.address {
                    self.phase = PadPhase::Active { position: 0 };
                    self.received.clear();
                    self.packet_count += 1;
                    (0xFF, !self.response.is_empty())
                } else {
                    self.phase = PadPhase::Ignoring;
                    (0xFF, false)
                }
            }
            PadPhase::Active { position } => {
                let _ = self.received.push(value);
                self.phase = PadPhase::Active {
                    position: position + 1,
                };
                let reply = self.response.get(position).copied().unwrap_or(0xFF);
                (reply, position + 1 < self.response.len())
            }
            PadPhase::Ignoring => (0xFF, false),
        }
    }

    /// DTR released: the packet is over
    fn on_deselect(&mut self) {
        if let PadPhase::Active { .. } = self.phase {
            self.last_packet = self.received.clone();
        }
        self.phase = PadPhase::Idle;
    }
}

/// Controller bus with one optional device per port
pub struct SimBus {
    devices: [Option<SimPad>; 2],
    control: SioControl,
    mode: SioMode,
    baud_reload: u16,
    rx: Deque<u8, RX_FIFO_DEPTH>,
    /// Port interrupt state; a pulse only latches while this is clear
    port_irq: bool,
    /// Interrupt controller latch for the bus
    latch: bool,
    sent: Vec<u8, MAX_SENT>,
    /// Unread receive bytes at the time of each write
    backlog: Vec<usize, MAX_SENT>,
    reset_count: usize,
    select_cycles: usize,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            devices: [None, None],
            control: SioControl::empty(),
            mode: SioMode::empty(),
            baud_reload: 0,
            rx: Deque::new(),
            port_irq: false,
            latch: false,
            sent: Vec::new(),
            backlog: Vec::new(),
            reset_count: 0,
            select_cycles: 0,
        }
    }

    /// Plug `pad` into `port`
    pub fn attach(&mut self, port: Port, pad: SimPad) {
        self.devices[port.index()] = Some(pad);
    }

    /// Unplug whatever is in `port`
    pub fn detach(&mut self, port: Port) -> Option<SimPad> {
        self.devices[port.index()].take()
    }

    pub fn device(&self, port: Port) -> Option<&SimPad> {
        self.devices[port.index()].as_ref()
    }

    pub fn device_mut(&mut self, port: Port) -> Option<&mut SimPad> {
        self.devices[port.index()].as_mut()
    }

    pub fn mode(&self) -> SioMode {
        self.mode
    }

    pub fn baud_reload(&self) -> u16 {
        self.baud_reload
    }

    /// Times the port was reset
    pub fn reset_count(&self) -> usize {
        self.reset_count
    }

    /// Every byte the host wrote, in order
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Receive FIFO depth seen by each write, in the order of [`SimBus::sent`]
    pub fn backlog(&self) -> &[usize] {
        &self.backlog
    }

    /// Queue a byte in the receive FIFO as if it arrived earlier
    pub fn push_rx(&mut self, value: u8) {
        let _ = self.rx.push_back(value);
    }

    /// Unread bytes in the receive FIFO
    pub fn rx_len(&self) -> usize {
        self.rx.len()
    }

    /// Times DTR was released after being asserted
    pub fn select_cycles(&self) -> usize {
        self.select_cycles
    }

    /// Port whose device sees the bus under `control`, if DTR is asserted
    fn selected(control: SioControl) -> Option<Port> {
        if !control.contains(SioControl::DTR) {
            None
        } else if control.contains(SioControl::CS_PORT_2) {
            Some(Port::Two)
        } else {
            Some(Port::One)
        }
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SioPort for SimBus {
    fn status(&self) -> SioStatus {
        let mut status = SioStatus::TX_NOT_FULL | SioStatus::TX_EMPTY;
        if !self.rx.is_empty() {
            status |= SioStatus::RX_NOT_EMPTY;
        }
        if self.port_irq {
            status |= SioStatus::IRQ;
        }
        status
    }

    fn read_data(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0xFF)
    }

    fn write_data(&mut self, value: u8) {
        let _ = self.sent.push(value);
        let _ = self.backlog.push(self.rx.len());

        let device = Self::selected(self.control)
            .and_then(|port| self.devices[port.index()].as_mut());
        let (reply, acknowledge) = match device {
            Some(pad) => pad.on_byte(value),
            None => (0xFF, false),
        };

        // A full FIFO drops the new byte
        let _ = self.rx.push_back(reply);
        if acknowledge && !self.port_irq {
            self.port_irq = true;
            self.latch = true;
        }
    }

    fn control(&self) -> SioControl {
        self.control
    }

    fn set_control(&mut self, control: SioControl) {
        if control.contains(SioControl::RESET) {
            self.reset_count += 1;
            self.rx.clear();
            self.port_irq = false;
        }
        if control.contains(SioControl::ACKNOWLEDGE) {
            self.port_irq = false;
        }

        let value = control - (SioControl::RESET | SioControl::ACKNOWLEDGE);
        let before = Self::selected(self.control);
        let after = Self::selected(value);
        if before.is_some() && after.is_none() {
            self.select_cycles += 1;
        }
        if let Some(port) = before.filter(|&port| Some(port) != after) {
            if let Some(pad) = self.devices[port.index()].as_mut() {
                pad.on_deselect();
            }
        }

        self.control = value;
    }

    fn set_mode(&mut self, mode: SioMode) {
        self.mode = mode;
    }

    fn set_baud_reload(&mut self, reload: u16) {
        self.baud_reload = reload;
    }

    fn acknowledge_pending(&self) -> bool {
        self.latch
    }

    fn clear_acknowledge_latch(&mut self) {
        self.latch = false;
    }
}

/// Delay that advances a counter instead of waiting
#[derive(Debug, Default)]
pub struct SimClock {
    elapsed_ns: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_ns / 1_000
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += ns as u64;
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_ns += us as u64 * 1_000;
    }
}

/// GPU ports recording every command word
pub struct SimGpu {
    gp0: Vec<u32, MAX_GPU_WORDS>,
    gp1: Vec<u32, MAX_GPU_WORDS>,
    status: GpuStatus,
    busy_polls: Cell<u32>,
    status_polls: Cell<u32>,
}

impl SimGpu {
    pub fn new() -> Self {
        Self {
            gp0: Vec::new(),
            gp1: Vec::new(),
            status: GpuStatus::DMA_READY,
            busy_polls: Cell::new(0),
            status_polls: Cell::new(0),
        }
    }

    /// Report GP0 busy for the next `polls` status reads
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.busy_polls.set(polls);
    }

    /// Report PAL (or NTSC) output
    pub fn set_pal(&mut self, pal: bool) {
        self.status.set(GpuStatus::PAL, pal);
    }

    pub fn gp0(&self) -> &[u32] {
        &self.gp0
    }

    pub fn gp1(&self) -> &[u32] {
        &self.gp1
    }

    /// Status register reads so far
    pub fn status_polls(&self) -> u32 {
        self.status_polls.get()
    }
}

impl Default for SimGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuPorts for SimGpu {
    fn write_gp0(&mut self, word: u32) {
        let _ = self.gp0.push(word);
    }

    fn write_gp1(&mut self, word: u32) {
        let _ = self.gp1.push(word);
    }

    fn status(&self) -> GpuStatus {
        self.status_polls.set(self.status_polls.get() + 1);
        match self.busy_polls.get() {
            0 => self.status | GpuStatus::CMD_READY,
            n => {
                self.busy_polls.set(n - 1);
                self.status
            }
        }
    }
}

/// A transfer started on a [`SimDma`] channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaTransfer {
    pub address: u32,
    pub block: u32,
    pub control: DmaControl,
}

/// DMA channel recording every transfer it starts
pub struct SimDma {
    enabled: bool,
    address: u32,
    block: u32,
    busy_polls: u32,
    remaining: Cell<u32>,
    transfers: Vec<DmaTransfer, MAX_TRANSFERS>,
    overlapped: bool,
}

impl SimDma {
    /// Channel that finishes every transfer immediately
    pub fn new() -> Self {
        Self::with_busy_polls(0)
    }

    /// Channel that stays busy for `polls` control reads per transfer
    pub fn with_busy_polls(polls: u32) -> Self {
        Self {
            enabled: false,
            address: 0,
            block: 0,
            busy_polls: polls,
            remaining: Cell::new(0),
            transfers: Vec::new(),
            overlapped: false,
        }
    }

    pub fn transfers(&self) -> &[DmaTransfer] {
        &self.transfers
    }

    /// Whether a register was written while a transfer was running
    pub fn overlapped(&self) -> bool {
        self.overlapped
    }

    /// Whether the channel was enabled in the controller
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn check_idle(&mut self) {
        if self.remaining.get() > 0 {
            self.overlapped = true;
        }
    }
}

impl Default for SimDma {
    fn default() -> Self {
        Self::new()
    }
}

impl DmaChannel for SimDma {
    fn enable(&mut self) {
        self.enabled = true;
    }

    fn set_address(&mut self, address: u32) {
        self.check_idle();
        self.address = address;
    }

    fn set_block(&mut self, block: u32) {
        self.check_idle();
        self.block = block;
    }

    fn control(&self) -> DmaControl {
        match self.remaining.get() {
            0 => DmaControl::empty(),
            n => {
                self.remaining.set(n - 1);
                DmaControl::ENABLE
            }
        }
    }

    fn set_control(&mut self, control: DmaControl) {
        self.check_idle();
        if control.contains(DmaControl::ENABLE) {
            let _ = self.transfers.push(DmaTransfer {
                address: self.address,
                block: self.block,
                control,
            });
            self.remaining.set(self.busy_polls);
        }
    }
}

/// Interrupt latches with a periodic vertical blank
pub struct SimIrq {
    vblank_period: u32,
    countdown: Cell<u32>,
    vblank_polls: Cell<u32>,
    vblanks_acknowledged: u32,
    pending: u32,
}

impl SimIrq {
    /// Vertical blank latches on the poll after `period` misses
    pub fn with_vblank_period(period: u32) -> Self {
        Self {
            vblank_period: period,
            countdown: Cell::new(period),
            vblank_polls: Cell::new(0),
            vblanks_acknowledged: 0,
            pending: 0,
        }
    }

    /// Latch `irq` now
    pub fn raise(&mut self, irq: Irq) {
        if irq == Irq::VBlank {
            self.countdown.set(0);
        } else {
            self.pending |= irq.mask();
        }
    }

    pub fn vblank_polls(&self) -> u32 {
        self.vblank_polls.get()
    }

    pub fn vblanks_acknowledged(&self) -> u32 {
        self.vblanks_acknowledged
    }
}

impl InterruptController for SimIrq {
    fn is_pending(&self, irq: Irq) -> bool {
        if irq != Irq::VBlank {
            return self.pending & irq.mask() != 0;
        }

        self.vblank_polls.set(self.vblank_polls.get() + 1);
        match self.countdown.get() {
            0 => true,
            n => {
                self.countdown.set(n - 1);
                false
            }
        }
    }

    fn acknowledge(&mut self, irq: Irq) {
        if irq == Irq::VBlank {
            self.vblanks_acknowledged += 1;
            self.countdown.set(self.vblank_period);
        } else {
            self.pending &= !irq.mask();
        }
    }
}

/// Word-aligned pixel buffer for DMA tests
#[repr(C, align(4))]
pub struct AlignedPixels<const BYTES: usize> {
    bytes: [u8; BYTES],
}

impl<const BYTES: usize> AlignedPixels<BYTES> {
    pub fn new() -> Self {
        Self { bytes: [0; BYTES] }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<const BYTES: usize> Default for AlignedPixels<BYTES> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_only_answers_its_address() {
        let mut pad = SimPad::digital(0xFFFF);

        assert_eq!(pad.on_byte(0x81), (0xFF, false));
        assert_eq!(pad.on_byte(0x42), (0xFF, false));
        pad.on_deselect();

        assert_eq!(pad.on_byte(0x01), (0xFF, true));
        assert_eq!(pad.on_byte(0x42), (0x41, true));
        assert_eq!(pad.on_byte(0x00), (0x5A, true));
        assert_eq!(pad.on_byte(0x00), (0xFF, true));
        // Last byte of the response: no pulse
        assert_eq!(pad.on_byte(0x00), (0xFF, false));
        pad.on_deselect();

        assert_eq!(pad.last_packet(), &[0x42, 0, 0, 0]);
        assert_eq!(pad.packet_count(), 1);
    }

    #[test]
    fn test_set_buttons() {
        let mut pad = SimPad::digital(0xFFFF);
        pad.set_buttons(0x1234);

        pad.on_byte(0x01);
        pad.on_byte(0x42);
        pad.on_byte(0x00);
        assert_eq!(pad.on_byte(0x00).0, 0x34);
        assert_eq!(pad.on_byte(0x00).0, 0x12);
    }

    #[test]
    fn test_bus_routes_to_selected_port() {
        let mut bus = SimBus::new();
        bus.attach(Port::Two, SimPad::digital(0xFFFF));

        // DTR low: nobody listens
        bus.write_data(0x01);
        assert!(!bus.acknowledge_pending());

        bus.set_control(SioControl::DTR | SioControl::CS_PORT_2);
        bus.write_data(0x01);
        assert!(bus.acknowledge_pending());
        assert_eq!(bus.device(Port::Two).unwrap().packet_count(), 1);

        bus.set_control(SioControl::empty());
        assert_eq!(bus.select_cycles(), 1);
        assert!(bus.detach(Port::Two).is_some());
    }

    #[test]
    fn test_rx_fifo_order() {
        let mut bus = SimBus::new();
        bus.push_rx(0xAB);
        bus.write_data(0x01);

        assert_eq!(bus.backlog(), &[1]);
        assert_eq!(bus.read_data(), 0xAB);
        assert_eq!(bus.read_data(), 0xFF);
        assert!(!bus.status().contains(SioStatus::RX_NOT_EMPTY));

        bus.push_rx(0x12);
        bus.set_control(SioControl::RESET);
        assert_eq!(bus.rx_len(), 0);
    }

    #[test]
    fn test_strobes_do_not_read_back() {
        let mut bus = SimBus::new();
        bus.set_control(SioControl::RESET | SioControl::TX_ENABLE);
        bus.set_control(bus.control() | SioControl::ACKNOWLEDGE);

        assert_eq!(bus.control(), SioControl::TX_ENABLE);
        assert_eq!(bus.reset_count(), 1);
    }

    #[test]
    fn test_clock_accumulates() {
        let mut clock = SimClock::new();
        clock.delay_us(150);
        clock.delay_ns(2_500);
        clock.delay_ms(1);

        assert_eq!(clock.elapsed_us(), 1_152);
    }

    #[test]
    fn test_dma_busy_countdown() {
        let mut dma = SimDma::with_busy_polls(2);
        dma.set_control(DmaControl::ENABLE);

        assert!(dma.is_busy());
        assert!(dma.is_busy());
        assert!(!dma.is_busy());
        assert_eq!(dma.transfers().len(), 1);
    }

    #[test]
    fn test_irq_raise_and_acknowledge() {
        let mut irq = SimIrq::with_vblank_period(100);
        assert!(!irq.is_pending(Irq::VBlank));

        irq.raise(Irq::VBlank);
        irq.raise(Irq::Dma);
        assert!(irq.is_pending(Irq::VBlank));
        assert!(irq.is_pending(Irq::Dma));

        irq.acknowledge(Irq::Dma);
        assert!(!irq.is_pending(Irq::Dma));
    }
}
