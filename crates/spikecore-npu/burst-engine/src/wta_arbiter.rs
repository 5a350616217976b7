// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Winner-take-all arbitration
//!
//! One record per output neuron, reset at the start of every timestep.
//! Offers replace the record only when strictly greater, so among equal
//! values the first one offered wins. Deciding yields each neuron that saw
//! at least one offer, in neuron order.

use spikecore_npu_neural::S1615;

/// Phase of the arbiter within a timestep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterPhase {
    /// No timestep started yet
    Idle,
    /// Taking offers
    Accumulating,
    /// Winners read out; no more offers until the next timestep
    Decided,
}

/// Best offer seen for one neuron
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Winner {
    pub source_index: usize,
    pub value: S1615,
}

/// Result of offering one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Became the neuron's best
    Accepted,
    /// Not strictly greater than the current best
    Rejected,
    /// Neuron id outside the arbiter
    OutOfRange,
    /// Arbiter is not accumulating
    Closed,
}

#[derive(Debug, Clone)]
pub struct WtaArbiter {
    best: Vec<Option<Winner>>,
    phase: ArbiterPhase,
}

impl WtaArbiter {
    pub fn new(n_neurons: usize) -> Self {
        Self {
            best: vec![None; n_neurons],
            phase: ArbiterPhase::Idle,
        }
    }

    pub fn n_neurons(&self) -> usize {
        self.best.len()
    }

    pub fn phase(&self) -> ArbiterPhase {
        self.phase
    }

    /// Clear every record and start taking offers
    pub fn begin_timestep(&mut self) {
        self.best.iter_mut().for_each(|record| *record = None);
        self.phase = ArbiterPhase::Accumulating;
    }

    pub fn offer(&mut self, neuron_id: u32, source_index: usize, value: S1615) -> Offer {
        if self.phase != ArbiterPhase::Accumulating {
            return Offer::Closed;
        }
        let Some(record) = self.best.get_mut(neuron_id as usize) else {
            return Offer::OutOfRange;
        };
        match *record {
            Some(current) if value <= current.value => Offer::Rejected,
            _ => {
                *record = Some(Winner {
                    source_index,
                    value,
                });
                Offer::Accepted
            }
        }
    }

    pub fn winner(&self, neuron_id: u32) -> Option<Winner> {
        self.best.get(neuron_id as usize).copied().flatten()
    }

    /// Close the timestep and list `(neuron_id, winner)` pairs
    pub fn decide(&mut self) -> impl Iterator<Item = (u32, Winner)> + '_ {
        self.phase = ArbiterPhase::Decided;
        self.best
            .iter()
            .enumerate()
            .filter_map(|(neuron, record)| record.map(|winner| (neuron as u32, winner)))
    }
}
