// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Fixed-size ring buffers for embedded systems
//!
//! Slots live inline; `N` must cover `RingBufferLayout::len()`.

use crate::traits::{Result, RingBufferStorage, RuntimeError};
use spikecore_npu_neural::RingBufferLayout;

/// Inline ring buffers with a compile-time slot count
pub struct FixedRingBuffers<const N: usize> {
    layout: RingBufferLayout,
    slots: [u16; N],
}

impl<const N: usize> FixedRingBuffers<N> {
    /// Zeroed buffers for `layout`
    ///
    /// # Errors
    /// `RuntimeError::CapacityExceeded` when the layout addresses more than
    /// `N` slots.
    pub fn new(layout: RingBufferLayout) -> Result<Self> {
        if layout.len() > N {
            return Err(RuntimeError::CapacityExceeded {
                requested: layout.len(),
                available: N,
            });
        }
        Ok(Self {
            layout,
            slots: [0; N],
        })
    }

    pub fn layout(&self) -> RingBufferLayout {
        self.layout
    }

    pub fn get(&self, time: u32, synapse_type: u32, neuron: u32) -> u16 {
        self.slots
            .get(self.layout.index(time, synapse_type, neuron))
            .copied()
            .unwrap_or(0)
    }

    /// Zero the slots for `time` after the neuron side has read them
    pub fn clear_timestep(&mut self, time: u32) {
        let start = self.layout.index(time, 0, 0);
        let end = start + self.layout.slots_per_timestep();
        self.slots[start..end].fill(0);
    }

    /// Get memory footprint in bytes
    pub const fn memory_footprint() -> usize {
        core::mem::size_of::<Self>()
    }
}

impl<const N: usize> RingBufferStorage for FixedRingBuffers<N> {
    fn slot_count(&self) -> usize {
        self.layout.len()
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut u16> {
        if index < self.layout.len() {
            self.slots.get_mut(index)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_must_fit() {
        let layout = RingBufferLayout::new(4, 1, 4); // 512 slots
        assert!(FixedRingBuffers::<512>::new(layout).is_ok());
        assert!(matches!(
            FixedRingBuffers::<256>::new(layout),
            Err(RuntimeError::CapacityExceeded { requested: 512, available: 256 })
        ));
    }

    #[test]
    fn test_accumulate_and_clear() {
        let layout = RingBufferLayout::new(2, 1, 1);
        let mut buffers = FixedRingBuffers::<64>::new(layout).unwrap();
        let index = layout.index(1, 1, 2);
        assert_eq!(buffers.accumulate(index, 9), Ok(false));
        assert_eq!(buffers.get(1, 1, 2), 9);
        // beyond the layout even though inside the array
        assert!(buffers.accumulate(layout.len(), 1).is_err());
        buffers.clear_timestep(1);
        assert_eq!(buffers.get(1, 1, 2), 0);
    }

    #[test]
    fn test_memory_footprint() {
        assert!(FixedRingBuffers::<1024>::memory_footprint() >= 2048);
    }
}
