// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Vec-backed ring buffers for host-side runs

use std::vec;
use std::vec::Vec;

use crate::traits::RingBufferStorage;
use spikecore_npu_neural::RingBufferLayout;

/// Ring buffers for one core, addressed through a [`RingBufferLayout`]
#[derive(Debug, Clone)]
pub struct VecRingBuffers {
    layout: RingBufferLayout,
    slots: Vec<u16>,
}

impl VecRingBuffers {
    /// Zeroed buffers covering every index the layout can produce
    pub fn new(layout: RingBufferLayout) -> Self {
        Self {
            layout,
            slots: vec![0; layout.len()],
        }
    }

    pub fn layout(&self) -> RingBufferLayout {
        self.layout
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.slots
    }

    /// Value accumulated for (`time`, `synapse_type`, `neuron`)
    pub fn get(&self, time: u32, synapse_type: u32, neuron: u32) -> u16 {
        self.slots
            .get(self.layout.index(time, synapse_type, neuron))
            .copied()
            .unwrap_or(0)
    }

    /// Non-zero slots as `(index, value)` pairs, in index order
    pub fn non_zero(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0)
            .map(|(index, value)| (index, *value))
    }

    /// Read and zero the slots for `time`, the way the neuron side consumes
    /// its inputs at the start of a timestep
    ///
    /// The result is indexed `synapse_type << neuron_bits | neuron`.
    pub fn take_timestep(&mut self, time: u32) -> Vec<u16> {
        let per_step = self.layout.slots_per_timestep();
        let start = self.layout.index(time, 0, 0);
        let window = &mut self.slots[start..start + per_step];
        let taken = window.to_vec();
        window.fill(0);
        taken
    }

    pub fn clear(&mut self) {
        self.slots.fill(0);
    }
}

impl RingBufferStorage for VecRingBuffers {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut u16> {
        self.slots.get_mut(index)
    }
}
