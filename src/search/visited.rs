// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Fixed-size bitset of visited node slots, indexed by [MapStore::node_offset_id](crate::MapStore::node_offset_id).
///
/// Visited state is kept per address, not per junction: copies of a junction
/// stored in different tiles occupy different bits.
#[derive(Debug, Clone)]
pub(crate) struct VisitedSet {
    bits: Vec<u8>,
}

impl VisitedSet {
    /// Creates an empty set able to hold `slots` bits, allocated upfront.
    pub(crate) fn new(slots: usize) -> Self {
        Self {
            bits: vec![0; slots.div_ceil(8)],
        }
    }

    #[inline]
    pub(crate) fn contains(&self, slot: usize) -> bool {
        self.bits[slot / 8] & (1 << (slot % 8)) != 0
    }

    #[inline]
    pub(crate) fn insert(&mut self, slot: usize) {
        self.bits[slot / 8] |= 1 << (slot % 8);
    }
}
