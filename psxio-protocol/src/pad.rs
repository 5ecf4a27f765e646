//! Controller and memory card bus packets
//!
//! Packet format (host to device):
//! - ADDRESS (1 byte): device class that should respond
//! - COMMAND (1 byte): device-specific command
//! - PARAMETERS (0+ bytes): command-specific, zero-padded on the wire
//!
//! Response format (device to host, clocked in parallel):
//! - HEADER (1 byte): device type in the upper nibble, payload length in
//!   16-bit units in the lower nibble
//! - MARKER (1 byte): always 0x5A
//! - PAYLOAD: button field (2 bytes, active-low) and device-specific data

use bitflags::bitflags;
use heapless::Vec;

/// Second byte of every well-formed response
pub const RESPONSE_MARKER: u8 = 0x5A;

/// Number of bytes every connected controller replies with at minimum
pub const MIN_POLL_RESPONSE: usize = 4;

/// Largest poll response any supported controller sends
pub const MAX_POLL_RESPONSE: usize = 8;

/// Poll request: command, multitap address, two rumble motor bytes
pub const POLL_REQUEST: [u8; 4] = [PadCommand::Poll as u8, 0x00, 0x00, 0x00];

/// Maximum encoded size of a game-ID packet
pub const MAX_GAME_ID_PACKET: usize = 64;

/// Maximum length of a game ID string, excluding the terminator
pub const MAX_GAME_ID_LEN: usize = MAX_GAME_ID_PACKET - 4;

/// Device class selected by the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DeviceAddress {
    Controller = 0x01,
    MemoryCard = 0x81,
}

impl DeviceAddress {
    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Controller command bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PadCommand {
    InitPressure = 0x40,
    GetButtonMask = 0x41,
    /// Read buttons and analog axes
    Poll = 0x42,
    /// Enter or leave configuration mode
    ConfigMode = 0x43,
    SetAnalog = 0x44,
    GetAnalog = 0x45,
    GetMotorInfo = 0x46,
    GetMotorList = 0x47,
    GetMotorState = 0x48,
    GetModeList = 0x4C,
    RequestConfig = 0x4D,
    SetButtonMask = 0x4F,
}

/// Memory card command bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MemoryCardCommand {
    /// Announce the running game's ID to memory card adaptors
    GameIdSend = 0x20,
}

/// Device type reported in the upper nibble of the response header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceType {
    Mouse,
    NeGcon,
    Justifier,
    Digital,
    AnalogStick,
    Guncon,
    Analog,
    Multitap,
    Keyboard,
    Jogcon,
    ConfigMode,
    Unknown(u8),
}

impl DeviceType {
    /// Decode from the header's upper nibble
    pub fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0F {
            0x1 => DeviceType::Mouse,
            0x2 => DeviceType::NeGcon,
            0x3 => DeviceType::Justifier,
            0x4 => DeviceType::Digital,
            0x5 => DeviceType::AnalogStick,
            0x6 => DeviceType::Guncon,
            0x7 => DeviceType::Analog,
            0x8 => DeviceType::Multitap,
            0x9 => DeviceType::Keyboard,
            0xE => DeviceType::Jogcon,
            0xF => DeviceType::ConfigMode,
            other => DeviceType::Unknown(other),
        }
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            DeviceType::Mouse => "Mouse",
            DeviceType::NeGcon => "neGcon",
            DeviceType::Justifier => "Konami Justifier",
            DeviceType::Digital => "Digital controller",
            DeviceType::AnalogStick => "Analog stick",
            DeviceType::Guncon => "Guncon",
            DeviceType::Analog => "Analog controller",
            DeviceType::Multitap => "Multitap",
            DeviceType::Keyboard => "Keyboard",
            DeviceType::Jogcon => "Jogcon",
            DeviceType::ConfigMode => "Configuration mode",
            DeviceType::Unknown(_) => "Unknown",
        }
    }
}

/// Decoded first byte of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResponseHeader {
    pub device: DeviceType,
    /// Payload length in 16-bit units
    pub halfwords: u8,
}

impl ResponseHeader {
    /// Parse a header from its wire format byte
    pub fn from_byte(byte: u8) -> Self {
        Self {
            device: DeviceType::from_nibble(byte >> 4),
            halfwords: byte & 0x0F,
        }
    }

    /// Payload length in bytes
    pub fn payload_len(&self) -> usize {
        self.halfwords as usize * 2
    }
}

bitflags! {
    /// Pressed buttons, one bit per button (set = pressed)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u16 {
        const SELECT = 1 << 0;
        const L3 = 1 << 1;
        const R3 = 1 << 2;
        const START = 1 << 3;
        const UP = 1 << 4;
        const RIGHT = 1 << 5;
        const DOWN = 1 << 6;
        const LEFT = 1 << 7;
        const L2 = 1 << 8;
        const R2 = 1 << 9;
        const L1 = 1 << 10;
        const R1 = 1 << 11;
        const TRIANGLE = 1 << 12;
        const CIRCLE = 1 << 13;
        const CROSS = 1 << 14;
        const SQUARE = 1 << 15;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Buttons {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Buttons({=u16:#06x})", self.bits());
    }
}

/// Button names indexed by bit position
pub const BUTTON_NAMES: [&str; 16] = [
    "Select", "L3", "R3", "Start", "Up", "Right", "Down", "Left", "L2", "R2", "L1", "R1",
    "Triangle", "Circle", "X", "Square",
];

impl Buttons {
    /// Names of the buttons set, in bit order
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        BUTTON_NAMES
            .iter()
            .enumerate()
            .filter(move |&(bit, _)| self.bits() & (1 << bit) != 0)
            .map(|(_, name)| *name)
    }

    /// Decode the active-low wire field
    pub fn from_wire(field: u16) -> Self {
        Self::from_bits_retain(!field)
    }

    /// Decode the button field from response bytes 2 and 3
    pub fn from_response(low: u8, high: u8) -> Self {
        Self::from_wire(u16::from_le_bytes([low, high]))
    }

    /// Buttons pressed now that were released in `previous`
    pub fn just_pressed(self, previous: Buttons) -> Self {
        self & !previous
    }

    /// Buttons released now that were pressed in `previous`
    pub fn just_released(self, previous: Buttons) -> Self {
        previous & !self
    }
}

/// Errors that can occur while building a request packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Request does not fit the packet buffer
    RequestTooLarge,
}

/// Build the memory card game-ID announcement packet
///
/// Layout: `[0x20, 0x00, len, id..., 0x00]` where `len` counts the ID and
/// its terminator.
pub fn build_game_id_packet(id: &str) -> Result<Vec<u8, MAX_GAME_ID_PACKET>, PacketError> {
    let bytes = id.as_bytes();
    if bytes.len() > MAX_GAME_ID_LEN {
        return Err(PacketError::RequestTooLarge);
    }

    let mut packet = Vec::new();
    packet
        .extend_from_slice(&[
            MemoryCardCommand::GameIdSend as u8,
            0x00,
            (bytes.len() + 1) as u8,
        ])
        .map_err(|_| PacketError::RequestTooLarge)?;
    packet
        .extend_from_slice(bytes)
        .map_err(|_| PacketError::RequestTooLarge)?;
    packet.push(0x00).map_err(|_| PacketError::RequestTooLarge)?;

    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_idle_field_is_empty() {
        assert_eq!(Buttons::from_wire(0xFFFF), Buttons::empty());
        assert_eq!(Buttons::from_wire(0x0000), Buttons::all());
    }

    #[test]
    fn test_from_response_is_little_endian() {
        // Select pressed in the low byte, Square in the high byte
        assert_eq!(Buttons::from_response(0xFE, 0xFF), Buttons::SELECT);
        assert_eq!(Buttons::from_response(0xFF, 0x7F), Buttons::SQUARE);
        assert_eq!(
            Buttons::from_response(0xEF, 0xBF),
            Buttons::UP | Buttons::CROSS
        );
    }

    #[test]
    fn test_just_pressed() {
        let previous = Buttons::UP | Buttons::CROSS;
        let current = Buttons::UP | Buttons::START;
        assert_eq!(current.just_pressed(previous), Buttons::START);
        assert_eq!(current.just_released(previous), Buttons::CROSS);
    }

    #[test]
    fn test_button_names() {
        let names: std::vec::Vec<&str> = (Buttons::START | Buttons::CROSS).names().collect();
        assert_eq!(names, ["Start", "X"]);
        assert_eq!(Buttons::empty().names().count(), 0);
        assert_eq!(Buttons::all().names().count(), 16);
    }

    #[test]
    fn test_response_header() {
        let header = ResponseHeader::from_byte(0x41);
        assert_eq!(header.device, DeviceType::Digital);
        assert_eq!(header.payload_len(), 2);

        let header = ResponseHeader::from_byte(0x73);
        assert_eq!(header.device, DeviceType::Analog);
        assert_eq!(header.payload_len(), 6);
        assert_eq!(header.device.name(), "Analog controller");

        assert_eq!(
            ResponseHeader::from_byte(0xB1).device,
            DeviceType::Unknown(0xB)
        );
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(POLL_REQUEST[0], 0x42);
        assert_eq!(PadCommand::ConfigMode as u8, 0x43);
        assert_eq!(MemoryCardCommand::GameIdSend as u8, 0x20);
        assert_eq!(DeviceAddress::Controller.to_byte(), 0x01);
        assert_eq!(DeviceAddress::MemoryCard.to_byte(), 0x81);
    }

    #[test]
    fn test_game_id_packet() {
        let packet = build_game_id_packet("cdrom:\\SLUS_000.01;1").unwrap();
        assert_eq!(&packet[..3], &[0x20, 0x00, 21]);
        assert_eq!(&packet[3..23], b"cdrom:\\SLUS_000.01;1");
        assert_eq!(packet[23], 0x00);
        assert_eq!(packet.len(), 24);
    }

    #[test]
    fn test_game_id_too_long() {
        let id = [b'A'; MAX_GAME_ID_LEN + 1];
        let id = core::str::from_utf8(&id).unwrap();
        assert_eq!(build_game_id_packet(id), Err(PacketError::RequestTooLarge));

        let packet = build_game_id_packet(&id[..MAX_GAME_ID_LEN]).unwrap();
        assert_eq!(packet.len(), MAX_GAME_ID_PACKET);
    }

    proptest! {
        #[test]
        fn test_wire_inversion(field in any::<u16>()) {
            let buttons = Buttons::from_wire(field);
            prop_assert_eq!(buttons.bits(), field ^ 0xFFFF);
        }

        #[test]
        fn test_edge_detection(previous in any::<u16>(), current in any::<u16>()) {
            let previous = Buttons::from_bits_retain(previous);
            let current = Buttons::from_bits_retain(current);
            let pressed = current.just_pressed(previous);
            prop_assert_eq!(pressed.bits(), !previous.bits() & current.bits());
            prop_assert!((pressed & previous).is_empty());
        }
    }
}
