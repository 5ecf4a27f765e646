//! Command chain tag words
//!
//! The DMA controller walks GPU command packets as a linked list. The
//! first word of each packet holds the number of payload words that follow
//! and the 24-bit bus address of the next packet's tag.

/// Next-address value marking the last packet of a chain
pub const END_OF_CHAIN: u32 = 0x00FF_FFFF;

/// Largest payload a single tag can describe
pub const MAX_PACKET_WORDS: usize = 0xFF;

const ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Encode a tag word
pub const fn tag(count: usize, next: u32) -> u32 {
    ((count as u32) << 24) | (next & ADDRESS_MASK)
}

/// Decoded tag word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TagWord {
    /// Payload words following the tag
    pub count: usize,
    /// Bus address of the next tag, or [`END_OF_CHAIN`]
    pub next: u32,
}

impl TagWord {
    /// Decode a tag word
    pub fn from_word(word: u32) -> Self {
        Self {
            count: (word >> 24) as usize,
            next: word & ADDRESS_MASK,
        }
    }

    /// Encode this tag
    pub fn to_word(self) -> u32 {
        tag(self.count, self.next)
    }

    /// Returns true if this is the last packet of the chain
    pub fn is_end(&self) -> bool {
        self.next == END_OF_CHAIN
    }
}
