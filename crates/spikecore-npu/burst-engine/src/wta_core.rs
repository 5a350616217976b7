// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # WTA Core
//!
//! Winner-take-all across sources. Each received event carries a value in
//! its payload; for every output neuron the source that offered the largest
//! value this timestep wins, and the core emits that source's key for the
//! neuron at the end of the tick.
//!
//! The neuron id is the sender's local id; sources are expected to share
//! the shape of the first source. Outgoing keys are laid out source-major:
//! `neuron_keys[source_index * neurons_per_source + neuron_id]`.

use std::convert::Infallible;

use spikecore_config::{load_descriptor, validate_descriptor, CoreOptions, CoreParameters, Descriptor};
use spikecore_npu_runtime::{spike_queue, QueueStats, SpikeConsumer, SpikeTransmitter};
use tracing::{debug, error, info};

use crate::error::{EngineError, EngineResult};
use crate::key_decoder::SourceTable;
use crate::provenance::{bump, Provenance};
use crate::spike_processing::{drain_tick, SpikeReceiver, TickBudget};
use crate::wta_arbiter::{Offer, WtaArbiter};
use crate::TickReport;

#[derive(Debug)]
pub struct WtaCore {
    sources: SourceTable,
    params: CoreParameters,
    arbiter: WtaArbiter,
    neurons_per_source: u32,
    queue: SpikeConsumer,
    budget: TickBudget,
    provenance: Provenance,
}

impl WtaCore {
    /// Load the descriptor and core parameters and build the core
    ///
    /// # Errors
    /// `MissingCoreParameters` when `core_params` is `None`; otherwise any
    /// decode or validation failure.
    pub fn initialize(
        descriptor_bytes: &[u8],
        core_params: Option<&[u8]>,
        options: &CoreOptions,
    ) -> EngineResult<(Self, SpikeReceiver)> {
        let Some(param_bytes) = core_params else {
            error!(target: "spikecore-burst-engine", "WTA core initialised without core parameters");
            return Err(EngineError::MissingCoreParameters);
        };
        let params = CoreParameters::decode(param_bytes)?;
        let descriptor = load_descriptor(descriptor_bytes, options.descriptor.layout)?;
        Self::build(descriptor, params, options)
    }

    pub fn from_parts(
        descriptor: Descriptor,
        params: CoreParameters,
        options: &CoreOptions,
    ) -> EngineResult<(Self, SpikeReceiver)> {
        validate_descriptor(&descriptor)?;
        Self::build(descriptor, params, options)
    }

    fn build(
        descriptor: Descriptor,
        params: CoreParameters,
        options: &CoreOptions,
    ) -> EngineResult<(Self, SpikeReceiver)> {
        let neurons_per_source = descriptor
            .sources
            .first()
            .map(|source| source.per_core.area())
            .ok_or(spikecore_config::LoadError::NoSources)?;

        let (producer, queue) = spike_queue(options.queue.capacity)?;
        let sources = SourceTable::new(descriptor.sources);

        info!(
            target: "spikecore-burst-engine",
            "WTA core ready: {} sources x {} neurons, has_key={}, queue {} slots",
            sources.len(),
            neurons_per_source,
            params.has_key,
            queue.capacity()
        );

        let core = Self {
            sources,
            params,
            arbiter: WtaArbiter::new(neurons_per_source as usize),
            neurons_per_source,
            queue,
            budget: TickBudget::from(&options.queue),
            provenance: Provenance::default(),
        };
        Ok((core, SpikeReceiver::new(producer)))
    }

    pub fn neurons_per_source(&self) -> u32 {
        self.neurons_per_source
    }

    pub fn arbiter(&self) -> &WtaArbiter {
        &self.arbiter
    }

    /// Arbitrate this tick's events and emit one key per winning neuron
    ///
    /// Emission happens once the queue is drained, in neuron order. A core
    /// without `has_key` arbitrates but sends nothing.
    pub fn on_timestep_tick<T: SpikeTransmitter + ?Sized>(
        &mut self,
        timestep: u32,
        transmitter: &mut T,
    ) -> TickReport {
        let mut report = TickReport {
            timestep,
            ..TickReport::default()
        };

        self.arbiter.begin_timestep();

        let sources = &self.sources;
        let arbiter = &mut self.arbiter;
        let drained = drain_tick(&mut self.queue, self.budget, |event| {
            let Some((source_index, source)) = sources.match_source(event.key) else {
                debug!(
                    target: "spikecore-burst-engine",
                    "WTA spike 0x{:08x} didn't match any source",
                    event.key
                );
                report.unmatched += 1;
                return Ok::<(), Infallible>(());
            };
            let neuron_id = source.key_info.local_id(event.key);
            if arbiter.offer(neuron_id, source_index, event.value()) == Offer::OutOfRange {
                report.out_of_range += 1;
            }
            Ok(())
        });
        let drain = match drained {
            Ok(drain) => drain,
            Err(never) => match never {},
        };
        report.processed = drain.processed;
        report.dropped = drain.dropped;
        report.carried = drain.carried;

        for (neuron_id, winner) in self.arbiter.decide() {
            if !self.params.has_key {
                break;
            }
            let index = winner.source_index as u64 * self.neurons_per_source as u64 + neuron_id as u64;
            let key = usize::try_from(index)
                .ok()
                .and_then(|index| self.params.neuron_key(index));
            match key {
                Some(key) if transmitter.emit(key) => {
                    report.emitted += 1;
                    bump(&mut self.provenance.n_wta_spikes_sent);
                }
                Some(key) => {
                    debug!(target: "spikecore-burst-engine", "Transmitter refused WTA key 0x{:08x}", key);
                    bump(&mut self.provenance.n_wta_transmit_refused);
                }
                None => report.out_of_range += 1,
            }
        }

        let provenance = &mut self.provenance;
        provenance.record_tick(timestep, drain.processed, drain.dropped);
        provenance.n_unmatched_events = provenance.n_unmatched_events.saturating_add(report.unmatched);
        provenance.n_wta_out_of_range = provenance.n_wta_out_of_range.saturating_add(report.out_of_range);

        debug!(
            target: "spikecore-burst-engine",
            "WTA tick {}: {} events, {} winners sent",
            timestep,
            report.processed,
            report.emitted
        );
        report
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance.with_queue_stats(self.queue.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikecore_config::DescriptorLayout;
    use spikecore_npu_neural::{Coord, KeyInfo, PostRegion, Shape, SourceInfo, S1615};
    use spikecore_npu_runtime::RecordingTransmitter;

    fn source(key: u32) -> SourceInfo {
        let key_info = KeyInfo {
            key,
            mask: 0xFFFF_FF00,
            ..KeyInfo::default()
        };
        SourceInfo::single_core(key_info, Shape::new(2, 4)).unwrap()
    }

    fn descriptor() -> Descriptor {
        Descriptor {
            layout: DescriptorLayout::Convolution,
            post: PostRegion::from_origin(Coord::new(0, 0), Shape::new(2, 4)),
            sources: vec![source(0x100), source(0x200)],
            connectors: Vec::new(),
            weights: Vec::new(),
        }
    }

    fn params(has_key: bool) -> CoreParameters {
        CoreParameters {
            has_key,
            n_neurons: 16,
            n_neurons_peak: 16,
            n_colour_bits: 0,
            n_synapse_types: 2,
            ring_buffer_shifts: vec![0, 0],
            neuron_keys: (0..16).map(|i| 0x9000 + i).collect(),
        }
    }

    fn payload(value: i32) -> u32 {
        S1615::from_raw(value << S1615::FRACTIONAL_BITS).to_bits()
    }

    #[test]
    fn test_requires_core_parameters() {
        let result = WtaCore::initialize(&descriptor().encode(), None, &CoreOptions::default());
        assert!(matches!(result, Err(EngineError::MissingCoreParameters)));
    }

    #[test]
    fn test_initialize_from_bytes() {
        let (core, _rx) = WtaCore::initialize(
            &descriptor().encode(),
            Some(&params(true).encode()),
            &CoreOptions::default(),
        )
        .unwrap();
        assert_eq!(core.neurons_per_source(), 8);
        assert_eq!(core.arbiter().n_neurons(), 8);
    }

    #[test]
    fn test_larger_value_wins() {
        let (mut core, mut rx) =
            WtaCore::from_parts(descriptor(), params(true), &CoreOptions::default()).unwrap();
        let mut tx = RecordingTransmitter::new();

        rx.on_event_received(0x105, payload(10));
        rx.on_event_received(0x205, payload(20));
        let report = core.on_timestep_tick(0, &mut tx);

        assert_eq!(report.emitted, 1);
        assert_eq!(tx.sent(), &[0x9000 + 8 + 5]);
    }

    #[test]
    fn test_nothing_sent_without_key() {
        let (mut core, mut rx) =
            WtaCore::from_parts(descriptor(), params(false), &CoreOptions::default()).unwrap();
        let mut tx = RecordingTransmitter::new();

        rx.on_event_received(0x101, payload(3));
        let report = core.on_timestep_tick(0, &mut tx);

        assert_eq!(report.processed, 1);
        assert_eq!(report.emitted, 0);
        assert!(tx.sent().is_empty());
    }

    #[test]
    fn test_unmatched_and_out_of_range_counted() {
        let (mut core, mut rx) =
            WtaCore::from_parts(descriptor(), params(true), &CoreOptions::default()).unwrap();
        let mut tx = RecordingTransmitter::new();

        rx.on_event_received(0x300, payload(1));
        rx.on_event_received(0x109, payload(1));
        rx.on_event_received(0x102, payload(1));
        let report = core.on_timestep_tick(4, &mut tx);

        assert_eq!(report.unmatched, 1);
        assert_eq!(report.out_of_range, 1);
        assert_eq!(tx.sent(), &[0x9002]);

        let provenance = core.provenance();
        assert_eq!(provenance.current_timestep, Some(4));
        assert_eq!(provenance.n_unmatched_events, 1);
        assert_eq!(provenance.n_wta_out_of_range, 1);
        assert_eq!(provenance.n_wta_spikes_sent, 1);
    }

    #[test]
    fn test_refused_keys_counted() {
        let (mut core, mut rx) =
            WtaCore::from_parts(descriptor(), params(true), &CoreOptions::default()).unwrap();
        let mut refuse = |_key: u32| false;

        rx.on_event_received(0x100, payload(1));
        rx.on_event_received(0x101, payload(1));
        let report = core.on_timestep_tick(0, &mut refuse);

        assert_eq!(report.emitted, 0);
        assert_eq!(core.provenance().n_wta_transmit_refused, 2);
    }

    #[test]
    fn test_records_reset_each_tick() {
        let (mut core, mut rx) =
            WtaCore::from_parts(descriptor(), params(true), &CoreOptions::default()).unwrap();
        let mut tx = RecordingTransmitter::new();

        rx.on_event_received(0x203, payload(50));
        core.on_timestep_tick(0, &mut tx);
        rx.on_event_received(0x103, payload(1));
        core.on_timestep_tick(1, &mut tx);

        assert_eq!(tx.sent(), &[0x9000 + 8 + 3, 0x9003]);
    }
}
