// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Ring-buffer and transmitter abstractions
//!
//! ## Design Philosophy
//!
//! - **Add-only**: the engine adds to ring-buffer slots and never reads them back
//! - **Zero-Cost**: traits compile to direct calls on slices and fixed arrays
//! - **Platform-Agnostic**: the same engine code drives `Vec`, fixed arrays and raw slices

use crate::traits::error::{Result, RuntimeError};
use spikecore_npu_neural::synapse::saturating_accumulate;

/// Accumulator storage owned by the neuron side of a core
///
/// Implementors expose their 16-bit slots; the saturating add itself is
/// shared so every backend clamps identically.
pub trait RingBufferStorage {
    /// Number of addressable slots
    fn slot_count(&self) -> usize;

    /// Mutable access to one slot
    fn slot_mut(&mut self, index: usize) -> Option<&mut u16>;

    /// Saturating add into one slot
    ///
    /// Returns `Ok(true)` when the add clamped at the 16-bit maximum.
    fn accumulate(&mut self, index: usize, amount: u16) -> Result<bool> {
        let len = self.slot_count();
        match self.slot_mut(index) {
            Some(slot) => Ok(saturating_accumulate(slot, amount)),
            None => Err(RuntimeError::IndexOutOfRange { index, len }),
        }
    }
}

impl RingBufferStorage for [u16] {
    fn slot_count(&self) -> usize {
        self.len()
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut u16> {
        self.get_mut(index)
    }
}

impl<const N: usize> RingBufferStorage for [u16; N] {
    fn slot_count(&self) -> usize {
        N
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut u16> {
        self.get_mut(index)
    }
}

/// Outgoing-spike interface to the network layer
pub trait SpikeTransmitter {
    /// Send one key; returns `false` if the layer refused it
    fn emit(&mut self, key: u32) -> bool;
}

/// Any `FnMut(u32) -> bool` is a transmitter
impl<F> SpikeTransmitter for F
where
    F: FnMut(u32) -> bool,
{
    fn emit(&mut self, key: u32) -> bool {
        self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_storage_saturates() {
        let mut slots = [0u16; 4];
        slots[2] = u16::MAX - 1;
        let storage: &mut [u16] = &mut slots;
        assert_eq!(storage.accumulate(0, 5), Ok(false));
        assert_eq!(storage.accumulate(2, 10), Ok(true));
        assert_eq!(slots, [5, 0, u16::MAX, 0]);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut slots = [0u16; 4];
        assert_eq!(
            slots.accumulate(4, 1),
            Err(RuntimeError::IndexOutOfRange { index: 4, len: 4 })
        );
    }

    #[test]
    fn test_closure_transmitter() {
        let mut sent = 0u32;
        let mut transmitter = |key: u32| {
            sent += key;
            true
        };
        assert!(transmitter.emit(3));
        assert!(transmitter.emit(4));
        assert_eq!(sent, 7);
    }
}
