// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! # Spikecore Burst Engine
//!
//! Per-tick event processing for one core of a spiking network.
//!
//! ## Execution contexts
//! - **Receive**: [`SpikeReceiver::on_event_received`] only enqueues
//! - **Tick**: `on_timestep_tick` drains the queue, decodes keys and
//!   accumulates into ring buffers (convolution) or arbitrates and emits
//!   keys (winner-take-all)
//!
//! ## Architecture
//! - Static tables (sources, connectors, weights) are read-only after
//!   initialisation
//! - Per-tick work only touches the queue, the ring buffers and counters
//! - Anomalies are counted in [`Provenance`], never raised

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod convolution_core;
pub mod coordinate_transform;
pub mod error;
pub mod key_decoder;
pub mod provenance;
pub mod spike_processing;
pub mod synaptic_accumulation;
pub mod wta_arbiter;
pub mod wta_core;

pub use convolution_core::{ConvolutionCore, ConvolutionPipeline};
pub use coordinate_transform::{map_pre_to_post, PostMapping};
pub use error::{EngineError, EngineResult};
pub use key_decoder::{ResolvedKey, SourceTable};
pub use provenance::Provenance;
pub use spike_processing::{drain_tick, DrainOutcome, SpikeReceiver, TickBudget};
pub use synaptic_accumulation::{AccumulationEngine, AccumulationStats};
pub use wta_arbiter::{ArbiterPhase, Offer, Winner, WtaArbiter};
pub use wta_core::WtaCore;

/// What one `on_timestep_tick` did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub timestep: u32,
    /// Events taken from the queue
    pub processed: u32,
    /// Late events discarded
    pub dropped: u32,
    /// Late events left for the next tick
    pub carried: u32,
    /// Events whose key matched no source
    pub unmatched: u32,
    /// WTA neuron ids or key indices out of range
    pub out_of_range: u32,
    pub accumulation: AccumulationStats,
    /// WTA keys accepted by the transmitter
    pub emitted: u32,
}

impl TickReport {
    /// Share of this tick's events that matched a source
    pub fn match_ratio(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            (self.processed - self.unmatched) as f64 / self.processed as f64
        }
    }

    /// Whether the queue was empty when the tick ended
    pub fn kept_up(&self) -> bool {
        self.dropped == 0 && self.carried == 0
    }
}
