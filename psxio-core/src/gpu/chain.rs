//! GPU command chain allocation
//!
//! A chain is a fixed buffer of command words carved into packets. Each
//! packet is one tag word followed by its payload; the tag holds the
//! payload length and the bus address of the next tag, so the DMA
//! controller can walk the packets as a linked list:
//!
//! ```text
//! ┌─────┬─────────┬─────┬───────────────┬─────┐
//! │ TAG │ payload │ TAG │ payload       │ END │
//! └──┬──┴─────────┴──▲──┴───────────────┴──▲──┘
//!    └───────────────┘  └──────────────────┘
//! ```
//!
//! Tags are written against the chain's current location. A chain that
//! has been moved is relinked on its next allocation or by
//! [`CommandChain::relink`], which the DMA engine calls before a walk. It
//! must stay in place while that walk is in flight.

use psxio_protocol::chain::{tag, TagWord, END_OF_CHAIN, MAX_PACKET_WORDS};

/// Default chain capacity in words
pub const CHAIN_BUFFER_SIZE: usize = 1024;

const ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Errors that can occur while building a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChainError {
    /// Not enough words left for the packet and the end tag
    CapacityExceeded { requested: usize, available: usize },
    /// Payload longer than a tag can describe
    PacketTooLarge { words: usize },
    /// Chain already terminated; reset it first
    Terminated,
}

/// Linked list of GPU command packets in a fixed buffer
pub struct CommandChain<const N: usize = CHAIN_BUFFER_SIZE> {
    words: [u32; N],
    cursor: usize,
    terminated: bool,
    /// Bus address the written tags point into
    linked_base: Option<u32>,
}

impl<const N: usize> CommandChain<N> {
    pub const fn new() -> Self {
        Self {
            words: [0; N],
            cursor: 0,
            terminated: false,
            linked_base: None,
        }
    }

    /// Rewind to an empty chain
    ///
    /// Old contents are left in place; nothing is zeroed.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.terminated = false;
        self.linked_base = None;
    }

    /// Reserve a packet of `count` payload words
    ///
    /// Writes the tag linking to the word after the payload and returns the
    /// payload for the caller to fill. One word is always kept back for the
    /// end tag. Nothing is written on error.
    pub fn try_allocate(&mut self, count: usize) -> Result<&mut [u32], ChainError> {
        if self.terminated {
            return Err(ChainError::Terminated);
        }
        if count > MAX_PACKET_WORDS {
            return Err(ChainError::PacketTooLarge { words: count });
        }

        let requested = count + 1;
        let available = self.remaining();
        if requested > available {
            return Err(ChainError::CapacityExceeded {
                requested,
                available,
            });
        }

        self.relink();
        let base = self.bus_address();
        self.linked_base = Some(base);

        let start = self.cursor;
        self.cursor += requested;
        self.words[start] = tag(count, address_in(base, self.cursor));

        Ok(&mut self.words[start + 1..self.cursor])
    }

    /// Reserve a packet of `count` payload words
    ///
    /// # Panics
    ///
    /// Panics if the chain is full or terminated. Chains are sized for the
    /// worst-case frame; running out means the command stream is already
    /// wrong and must not reach the GPU.
    pub fn allocate(&mut self, count: usize) -> &mut [u32] {
        match self.try_allocate(count) {
            Ok(payload) => payload,
            Err(error) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Command chain allocation failed: {}", error);
                panic!("command chain allocation failed: {:?}", error)
            }
        }
    }

    /// Close the chain with an end tag
    ///
    /// Calling it again before [`CommandChain::reset`] has no effect.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        // try_allocate always leaves this word free
        self.words[self.cursor] = tag(0, END_OF_CHAIN);
        self.terminated = true;
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Returns true if every tag points into the chain where it is now
    pub fn is_linked(&self) -> bool {
        self.linked_base.map_or(true, |base| base == self.bus_address())
    }

    /// Rewrite the tags for the chain's current location
    ///
    /// No-op unless the chain has moved since its tags were written.
    pub fn relink(&mut self) {
        let Some(old_base) = self.linked_base else {
            return;
        };
        let base = self.bus_address();
        if old_base == base {
            return;
        }

        let mut index = 0;
        while index < self.cursor {
            let link = TagWord::from_word(self.words[index]);
            let next = index_in(old_base, link.next);
            if next <= index || next > self.cursor {
                break;
            }
            self.words[index] = tag(link.count, address_in(base, next));
            index = next;
        }
        self.linked_base = Some(base);
    }

    /// Words used so far, end tag included
    pub fn len(&self) -> usize {
        self.cursor + self.terminated as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Words still available for packets (tags included)
    pub fn remaining(&self) -> usize {
        N.saturating_sub(self.cursor + 1)
    }

    /// Address the DMA controller starts walking from
    pub fn bus_address(&self) -> u32 {
        self.words.as_ptr() as usize as u32
    }

    /// Written words, end tag included
    pub fn words(&self) -> &[u32] {
        &self.words[..self.len()]
    }

    /// Walk the packets the way the DMA controller does
    ///
    /// Yields each packet's payload, ending with the empty end packet when
    /// the chain is terminated.
    pub fn packets(&self) -> Packets<'_, N> {
        Packets {
            chain: self,
            index: Some(0),
            steps: 0,
        }
    }

    fn index_of(&self, address: u32) -> usize {
        index_in(self.linked_base.unwrap_or_else(|| self.bus_address()), address)
    }
}

fn address_in(base: u32, index: usize) -> u32 {
    base.wrapping_add((index * 4) as u32) & ADDRESS_MASK
}

fn index_in(base: u32, address: u32) -> usize {
    (address.wrapping_sub(base) & ADDRESS_MASK) as usize / 4
}

impl<const N: usize> Default for CommandChain<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the packets of a [`CommandChain`]
pub struct Packets<'a, const N: usize> {
    chain: &'a CommandChain<N>,
    index: Option<usize>,
    steps: usize,
}

impl<'a, const N: usize> Iterator for Packets<'a, N> {
    type Item = &'a [u32];

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index.take()?;
        let words = self.chain.words();
        if index >= words.len() || self.steps >= N {
            return None;
        }
        self.steps += 1;

        let tag = TagWord::from_word(words[index]);
        let payload = words.get(index + 1..index + 1 + tag.count)?;
        if !tag.is_end() {
            self.index = Some(self.chain.index_of(tag.next));
        }

        Some(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_allocate_links_packets() {
        let mut chain: CommandChain<32> = CommandChain::new();

        chain.allocate(2).copy_from_slice(&[0xAAAA_0001, 0xAAAA_0002]);
        chain.allocate(3).copy_from_slice(&[0xBBBB_0001, 0xBBBB_0002, 0xBBBB_0003]);
        chain.terminate();

        let base = chain.bus_address();
        let words = chain.words();
        assert_eq!(words.len(), 8);
        assert_eq!(words[0], tag(2, base.wrapping_add(12)));
        assert_eq!(words[3], tag(3, base.wrapping_add(28)));
        assert_eq!(words[7], 0x00FF_FFFF);

        let packets: Vec<&[u32]> = chain.packets().collect();
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0], &[0xAAAA_0001, 0xAAAA_0002]);
        assert_eq!(packets[1], &[0xBBBB_0001, 0xBBBB_0002, 0xBBBB_0003]);
        assert!(packets[2].is_empty());
    }

    #[test]
    fn test_empty_chain() {
        let mut chain: CommandChain<4> = CommandChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.packets().count(), 0);

        chain.terminate();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.packets().count(), 1);
    }

    #[test]
    fn test_capacity_keeps_room_for_end_tag() {
        let mut chain: CommandChain<8> = CommandChain::new();
        assert_eq!(chain.remaining(), 7);

        chain.allocate(6);
        assert_eq!(chain.remaining(), 0);
        assert_eq!(
            chain.try_allocate(0),
            Err(ChainError::CapacityExceeded {
                requested: 1,
                available: 0
            })
        );

        chain.terminate();
        assert_eq!(chain.len(), 8);
    }

    #[test]
    fn test_overflow_writes_nothing() {
        let mut chain: CommandChain<8> = CommandChain::new();
        chain.allocate(2).fill(0x1234_5678);
        let before: Vec<u32> = chain.words().to_vec();

        assert!(chain.try_allocate(5).is_err());
        assert_eq!(chain.words(), before.as_slice());
        assert_eq!(chain.remaining(), 4);
    }

    #[test]
    #[should_panic(expected = "command chain allocation failed")]
    fn test_allocate_panics_on_overflow() {
        let mut chain: CommandChain<4> = CommandChain::new();
        chain.allocate(4);
    }

    #[test]
    fn test_allocate_after_terminate() {
        let mut chain: CommandChain<16> = CommandChain::new();
        chain.terminate();
        assert_eq!(chain.try_allocate(1), Err(ChainError::Terminated));

        chain.reset();
        assert!(chain.try_allocate(1).is_ok());
    }

    #[test]
    fn test_packet_too_large() {
        let mut chain: CommandChain<512> = CommandChain::new();
        assert_eq!(
            chain.try_allocate(256),
            Err(ChainError::PacketTooLarge { words: 256 })
        );
        assert!(chain.try_allocate(255).is_ok());
    }

    #[test]
    fn test_reset_does_not_zero() {
        let mut chain: CommandChain<16> = CommandChain::new();
        chain.allocate(1)[0] = 0xDEAD_BEEF;
        chain.terminate();
        chain.reset();

        assert!(chain.is_empty());
        // The next allocation sees the stale payload
        assert_eq!(chain.allocate(1)[0], 0xDEAD_BEEF);
    }

    #[test]
    fn test_moved_chain_is_relinked() {
        let mut chain: CommandChain<16> = CommandChain::new();
        chain.allocate(2).copy_from_slice(&[1, 2]);
        chain.allocate(1)[0] = 3;
        chain.terminate();

        let mut moved = Box::new(chain);
        assert!(!moved.is_linked());
        // Stale tags still walk as the chain was built
        assert_eq!(moved.packets().count(), 3);

        moved.relink();
        assert!(moved.is_linked());
        let base = moved.bus_address();
        let words = moved.words();
        assert_eq!(words[0], tag(2, base.wrapping_add(12)));
        assert_eq!(words[3], tag(1, base.wrapping_add(20)));
        assert_eq!(words[5], END_OF_CHAIN);

        let packets: Vec<&[u32]> = moved.packets().collect();
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0], &[1, 2]);
        assert_eq!(packets[1], &[3]);
        assert!(packets[2].is_empty());
    }

    #[test]
    fn test_allocate_after_move_relinks_earlier_packets() {
        let mut chain: CommandChain<16> = CommandChain::new();
        chain.allocate(2);

        let mut moved = Box::new(chain);
        moved.allocate(1);
        moved.terminate();

        assert!(moved.is_linked());
        let base = moved.bus_address();
        let words = moved.words();
        assert_eq!(words[0], tag(2, base.wrapping_add(12)));
        assert_eq!(words[3], tag(1, base.wrapping_add(20)));
    }

    proptest! {
        #[test]
        fn test_chain_linkage(sizes in proptest::collection::vec(0usize..12, 0..40)) {
            let mut chain: CommandChain<256> = CommandChain::new();
            let mut starts = Vec::new();

            for (i, &size) in sizes.iter().enumerate() {
                let start = chain.len();
                match chain.try_allocate(size) {
                    Ok(payload) => {
                        payload.fill(i as u32);
                        starts.push(start);
                    }
                    Err(ChainError::CapacityExceeded { .. }) => break,
                    Err(other) => return Err(TestCaseError::fail(format!("{:?}", other))),
                }
            }
            let end = chain.len();
            chain.terminate();

            // Node k points at node k + 1, the last one at the end tag
            let base = chain.bus_address();
            let words = chain.words();
            for (k, &start) in starts.iter().enumerate() {
                let next = starts.get(k + 1).copied().unwrap_or(end);
                let tag = TagWord::from_word(words[start]);
                prop_assert_eq!(tag.next, base.wrapping_add(next as u32 * 4) & 0x00FF_FFFF);
            }
            prop_assert!(TagWord::from_word(words[end]).is_end());
            prop_assert!(end < chain.capacity());

            let packets: Vec<&[u32]> = chain.packets().collect();
            prop_assert_eq!(packets.len(), starts.len() + 1);
            for (k, payload) in packets.iter().take(starts.len()).enumerate() {
                prop_assert_eq!(payload.len(), sizes[k]);
                prop_assert!(payload.iter().all(|&word| word == k as u32));
            }
        }
    }
}
