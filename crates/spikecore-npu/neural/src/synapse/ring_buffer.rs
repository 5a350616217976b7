// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Ring-buffer index layout
//!
//! The ring buffer is one flat array of 16-bit slots. An index packs, from
//! high to low bits: the arrival timestep (masked to the delay window), the
//! synapse type, and the post-synaptic neuron id.
//!
//! ```text
//! | time & delay_mask | synapse type | neuron |
//!                      ^ type_shift   ^ neuron_bits
//! ```

/// Bit layout of ring-buffer indices for one core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct RingBufferLayout {
    /// Bits for the neuron id (`synapse_index_bits`)
    pub neuron_bits: u32,
    /// Shift of the time field (`synapse_index_bits + synapse_type_bits`)
    pub type_shift: u32,
    /// Bits for the arrival time
    pub delay_bits: u32,
}

impl RingBufferLayout {
    /// Layout from explicit bit widths
    pub const fn new(log_n_neurons: u32, log_n_synapse_types: u32, delay_bits: u32) -> Self {
        Self {
            neuron_bits: log_n_neurons,
            type_shift: log_n_neurons + log_n_synapse_types,
            delay_bits,
        }
    }

    /// Layout wide enough for `n_neurons` neurons and `n_synapse_types` types
    pub fn for_counts(n_neurons: u32, n_synapse_types: u32, delay_bits: u32) -> Self {
        Self::new(ceil_log2(n_neurons), ceil_log2(n_synapse_types), delay_bits)
    }

    #[inline]
    pub const fn delay_mask(&self) -> u32 {
        (1 << self.delay_bits) - 1
    }

    /// Slot index for a contribution arriving at `time`
    #[inline]
    pub const fn index(&self, time: u32, synapse_type: u32, neuron: u32) -> usize {
        (((time & self.delay_mask()) << self.type_shift)
            | (synapse_type << self.neuron_bits)
            | neuron) as usize
    }

    /// Number of slots the layout can address
    #[inline]
    pub const fn len(&self) -> usize {
        1usize << (self.delay_bits + self.type_shift)
    }

    /// Number of slots for one timestep (all types, all neurons)
    #[inline]
    pub const fn slots_per_timestep(&self) -> usize {
        1usize << self.type_shift
    }

    /// Number of synapse types the layout can address
    #[inline]
    pub const fn n_synapse_types(&self) -> u32 {
        1 << (self.type_shift - self.neuron_bits)
    }

    /// Number of neurons the layout can address
    #[inline]
    pub const fn n_neurons(&self) -> u32 {
        1 << self.neuron_bits
    }
}

/// `ceil(log2(value))`, with `0` and `1` both mapping to `0`
#[inline]
pub fn ceil_log2(value: u32) -> u32 {
    if value <= 1 {
        0
    } else {
        32 - (value - 1).leading_zeros()
    }
}
