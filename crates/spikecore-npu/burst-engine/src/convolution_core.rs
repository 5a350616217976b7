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

//! # Convolution Core
//!
//! Context object for one convolution core. Built once by
//! [`ConvolutionCore::initialize`], which also hands back the
//! [`SpikeReceiver`] for the receive context. Every timestep the runtime
//! calls [`ConvolutionCore::on_timestep_tick`] with the ring buffers the
//! neuron side owns.
//!
//! ## Per event
//! 1. Match the key against the source table (first match wins)
//! 2. For each connector of that source whose delay stage owns the sender,
//!    place the sender in the source population
//! 3. Walk the connector's kernel into the ring buffers

use spikecore_config::{
    load_descriptor, validate_descriptor, CoreOptions, CoreParameters, Descriptor,
};
use spikecore_npu_neural::{Connector, PostRegion, RingBufferLayout, NO_SYNAPSE_TYPE};
use spikecore_npu_runtime::{spike_queue, QueueStats, RingBufferStorage, SpikeConsumer};
use tracing::{debug, error, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::key_decoder::SourceTable;
use crate::provenance::Provenance;
use crate::spike_processing::{drain_tick, SpikeReceiver, TickBudget};
use crate::synaptic_accumulation::{AccumulationEngine, AccumulationStats};
use crate::TickReport;

/// Static decode-and-accumulate state, read-only after initialisation
#[derive(Debug, Clone)]
pub struct ConvolutionPipeline {
    sources: SourceTable,
    connectors: Vec<Connector>,
    engine: AccumulationEngine,
}

impl ConvolutionPipeline {
    pub fn new(sources: SourceTable, connectors: Vec<Connector>, engine: AccumulationEngine) -> Self {
        Self {
            sources,
            connectors,
            engine,
        }
    }

    pub fn sources(&self) -> &SourceTable {
        &self.sources
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn engine(&self) -> &AccumulationEngine {
        &self.engine
    }

    /// Decode one key and accumulate it for every applicable connector
    ///
    /// Returns `Ok(None)` when the key matches no source.
    pub fn process_spike<R: RingBufferStorage + ?Sized>(
        &self,
        timestep: u32,
        key: u32,
        ring_buffers: &mut R,
    ) -> spikecore_npu_runtime::Result<Option<AccumulationStats>> {
        let Some(resolved) = self.sources.resolve(key) else {
            debug!(
                target: "spikecore-burst-engine",
                "Spike 0x{:08x} didn't match any source",
                key
            );
            return Ok(None);
        };

        let range = self
            .sources
            .get(resolved.source_index)
            .map(|source| source.key_info.connector_range())
            .unwrap_or(0..0);

        let mut stats = AccumulationStats::default();
        for connector in self.connectors.get(range).unwrap_or(&[]) {
            let Some(pre) = resolved.pre_coord(connector.delay_stage) else {
                continue;
            };
            debug!(
                target: "spikecore-burst-engine",
                "Spike 0x{:08x}: source {} local {} -> pre ({}, {}) delay stage {}",
                key,
                resolved.source_index,
                resolved.local_id,
                pre.row,
                pre.col,
                connector.delay_stage
            );
            stats.merge(self.engine.accumulate(timestep, pre, connector, ring_buffers)?);
        }
        Ok(Some(stats))
    }
}

/// One convolution core
#[derive(Debug)]
pub struct ConvolutionCore {
    pipeline: ConvolutionPipeline,
    queue: SpikeConsumer,
    budget: TickBudget,
    provenance: Provenance,
}

impl ConvolutionCore {
    /// Load the descriptor (and optional core parameters) and build the core
    ///
    /// Without a core-parameter region the ring-buffer layout comes from
    /// `options.ring_buffer`.
    ///
    /// # Errors
    /// Any descriptor or parameter decode failure, a layout too small for
    /// the descriptor, or an invalid queue capacity. Nothing is built on
    /// failure.
    pub fn initialize(
        descriptor_bytes: &[u8],
        core_params: Option<&[u8]>,
        options: &CoreOptions,
    ) -> EngineResult<(Self, SpikeReceiver)> {
        let descriptor = load_descriptor(descriptor_bytes, options.descriptor.layout)?;
        let params = core_params.map(CoreParameters::decode).transpose()?;
        Self::build(descriptor, params.as_ref(), options)
    }

    /// Build from an already decoded descriptor
    pub fn from_descriptor(
        descriptor: Descriptor,
        params: Option<&CoreParameters>,
        options: &CoreOptions,
    ) -> EngineResult<(Self, SpikeReceiver)> {
        validate_descriptor(&descriptor)?;
        Self::build(descriptor, params, options)
    }

    fn build(
        descriptor: Descriptor,
        params: Option<&CoreParameters>,
        options: &CoreOptions,
    ) -> EngineResult<(Self, SpikeReceiver)> {
        let layout = match params {
            Some(params) => params.ring_buffer_layout(options.ring_buffer.delay_bits),
            None => options.ring_buffer.layout(),
        };
        check_layout(&descriptor.post, &descriptor.connectors, layout).map_err(|err| {
            error!(target: "spikecore-burst-engine", "Convolution core init failed: {}", err);
            err
        })?;

        let sources = SourceTable::new(descriptor.sources);
        for (first, shadowed) in sources.overlapping_pairs() {
            warn!(
                target: "spikecore-burst-engine",
                "Sources {} and {} have overlapping keys; source {} wins",
                first,
                shadowed,
                first
            );
        }

        let (producer, queue) = spike_queue(options.queue.capacity)?;

        let engine = AccumulationEngine::new(descriptor.post, descriptor.weights, layout)
            .with_trace_increment(options.accumulation.trace_increment)
            .with_multisynaptic(options.accumulation.multisynaptic);

        info!(
            target: "spikecore-burst-engine",
            "Convolution core ready: {} sources, {} connectors, {} post neurons, queue {} slots, ring buffer {} slots",
            sources.len(),
            descriptor.connectors.len(),
            descriptor.post.n_neurons(),
            queue.capacity(),
            layout.len()
        );

        let core = Self {
            pipeline: ConvolutionPipeline::new(sources, descriptor.connectors, engine),
            queue,
            budget: TickBudget::from(&options.queue),
            provenance: Provenance::default(),
        };
        Ok((core, SpikeReceiver::new(producer)))
    }

    pub fn pipeline(&self) -> &ConvolutionPipeline {
        &self.pipeline
    }

    pub fn layout(&self) -> RingBufferLayout {
        self.pipeline.engine.layout()
    }

    pub fn post(&self) -> &PostRegion {
        self.pipeline.engine.post()
    }

    /// Whether `key` comes from a WTA reset source
    pub fn is_reset_key(&self, key: u32) -> bool {
        self.pipeline.sources.is_reset_key(key)
    }

    /// Drain this tick's events into `ring_buffers`
    ///
    /// # Errors
    /// `RingBufferTooSmall` if the storage cannot hold the core's layout.
    /// Queued events are left untouched in that case.
    pub fn on_timestep_tick<R: RingBufferStorage + ?Sized>(
        &mut self,
        timestep: u32,
        ring_buffers: &mut R,
    ) -> EngineResult<TickReport> {
        let needed = self.layout().len();
        let available = ring_buffers.slot_count();
        if available < needed {
            return Err(EngineError::RingBufferTooSmall { needed, available });
        }

        let mut report = TickReport {
            timestep,
            ..TickReport::default()
        };
        let pipeline = &self.pipeline;
        let drain = drain_tick(&mut self.queue, self.budget, |event| {
            match pipeline.process_spike(timestep, event.key, ring_buffers)? {
                Some(stats) => report.accumulation.merge(stats),
                None => report.unmatched += 1,
            }
            Ok::<(), spikecore_npu_runtime::RuntimeError>(())
        })?;

        report.processed = drain.processed;
        report.dropped = drain.dropped;
        report.carried = drain.carried;

        let provenance = &mut self.provenance;
        provenance.record_tick(timestep, drain.processed, drain.dropped);
        provenance.n_unmatched_events = provenance.n_unmatched_events.saturating_add(report.unmatched);
        provenance.n_saturations = provenance
            .n_saturations
            .saturating_add(report.accumulation.saturations);

        debug!(
            target: "spikecore-burst-engine",
            "Tick {}: {} events, {} unmatched, {} weights, {} saturated",
            timestep,
            report.processed,
            report.unmatched,
            report.accumulation.weights_added,
            report.accumulation.saturations
        );
        Ok(report)
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance.with_queue_stats(self.queue.stats())
    }
}

/// Reject layouts that cannot address every post neuron, synapse type and delay
fn check_layout(
    post: &PostRegion,
    connectors: &[Connector],
    layout: RingBufferLayout,
) -> EngineResult<()> {
    if post.n_neurons() > layout.n_neurons() {
        return Err(EngineError::LayoutTooSmall {
            what: "post neurons",
            needed: post.n_neurons(),
            available: layout.n_neurons(),
        });
    }

    let delay_slots = layout.delay_mask() + 1;
    for connector in connectors {
        let mut types = vec![connector.positive_synapse_type, connector.negative_synapse_type];
        if connector.trace_synapse_type != NO_SYNAPSE_TYPE {
            types.push(connector.trace_synapse_type);
        }
        if let Some(&widest) = types.iter().max() {
            if widest as u32 >= layout.n_synapse_types() {
                return Err(EngineError::LayoutTooSmall {
                    what: "synapse types",
                    needed: widest as u32 + 1,
                    available: layout.n_synapse_types(),
                });
            }
        }
        if connector.delay as u32 >= delay_slots {
            return Err(EngineError::LayoutTooSmall {
                what: "connector delay",
                needed: connector.delay as u32 + 1,
                available: delay_slots,
            });
        }
    }
    Ok(())
}
