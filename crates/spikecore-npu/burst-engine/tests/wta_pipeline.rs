// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Integration Tests: WTA Core
//!
//! Two sources compete for the same eight output neurons. Keys are laid
//! out source-major, so source 0 owns keys 0xA000..0xA008 and source 1
//! owns 0xA008..0xA010.

use spikecore_config::{CoreOptions, CoreParameters, Descriptor, DescriptorLayout};
use spikecore_npu_burst_engine::{SpikeReceiver, WtaCore};
use spikecore_npu_neural::{Coord, KeyInfo, PostRegion, Shape, SourceInfo, S1615};
use spikecore_npu_runtime::RecordingTransmitter;

const SOURCE_A: u32 = 0x0001_0000;
const SOURCE_B: u32 = 0x0002_0000;
const NEURON: u32 = 5;

fn source(key: u32) -> SourceInfo {
    let key_info = KeyInfo {
        key,
        mask: 0xFFFF_0000,
        ..KeyInfo::default()
    };
    SourceInfo::single_core(key_info, Shape::new(2, 4)).unwrap()
}

fn core() -> (WtaCore, SpikeReceiver) {
    let descriptor = Descriptor {
        layout: DescriptorLayout::Convolution,
        post: PostRegion::from_origin(Coord::new(0, 0), Shape::new(2, 4)),
        sources: vec![source(SOURCE_A), source(SOURCE_B)],
        connectors: Vec::new(),
        weights: Vec::new(),
    };
    let params = CoreParameters {
        has_key: true,
        n_neurons: 16,
        n_neurons_peak: 16,
        n_colour_bits: 0,
        n_synapse_types: 1,
        ring_buffer_shifts: vec![0],
        neuron_keys: (0..16).map(|i| 0xA000 + i).collect(),
    };
    WtaCore::initialize(
        &descriptor.encode(),
        Some(&params.encode()),
        &CoreOptions::default(),
    )
    .unwrap()
}

fn value(v: i32) -> u32 {
    S1615::from_raw(v << S1615::FRACTIONAL_BITS).to_bits()
}

fn key_of(source_index: u32, neuron: u32) -> u32 {
    0xA000 + source_index * 8 + neuron
}

#[test]
fn test_higher_value_wins_in_arrival_order() {
    let (mut core, mut rx) = core();
    let mut tx = RecordingTransmitter::new();

    rx.on_event_received(SOURCE_A | NEURON, value(10));
    rx.on_event_received(SOURCE_B | NEURON, value(20));
    core.on_timestep_tick(0, &mut tx);

    assert_eq!(tx.sent(), &[key_of(1, NEURON)]);
}

#[test]
fn test_higher_value_wins_in_reverse_order() {
    let (mut core, mut rx) = core();
    let mut tx = RecordingTransmitter::new();

    rx.on_event_received(SOURCE_B | NEURON, value(20));
    rx.on_event_received(SOURCE_A | NEURON, value(10));
    core.on_timestep_tick(0, &mut tx);

    assert_eq!(tx.sent(), &[key_of(1, NEURON)]);
}

#[test]
fn test_tie_goes_to_first_processed() {
    for (first, second, expected) in [(SOURCE_A, SOURCE_B, 0), (SOURCE_B, SOURCE_A, 1)] {
        let (mut core, mut rx) = core();
        let mut tx = RecordingTransmitter::new();

        rx.on_event_received(first | NEURON, value(7));
        rx.on_event_received(second | NEURON, value(7));
        core.on_timestep_tick(0, &mut tx);

        assert_eq!(tx.sent(), &[key_of(expected, NEURON)]);
    }
}

#[test]
fn test_independent_neurons_emit_in_neuron_order() {
    let (mut core, mut rx) = core();
    let mut tx = RecordingTransmitter::new();

    rx.on_event_received(SOURCE_B | 6, value(1));
    rx.on_event_received(SOURCE_A | 2, value(1));
    rx.on_event_received(SOURCE_A | 6, value(3));
    let report = core.on_timestep_tick(0, &mut tx);

    assert_eq!(report.emitted, 2);
    assert_eq!(tx.sent(), &[key_of(0, 2), key_of(0, 6)]);
}

#[test]
fn test_each_tick_starts_fresh() {
    let (mut core, mut rx) = core();
    let mut tx = RecordingTransmitter::new();

    rx.on_event_received(SOURCE_B | NEURON, value(100));
    core.on_timestep_tick(0, &mut tx);
    rx.on_event_received(SOURCE_A | NEURON, value(1));
    core.on_timestep_tick(1, &mut tx);
    core.on_timestep_tick(2, &mut tx);

    assert_eq!(tx.take(), vec![key_of(1, NEURON), key_of(0, NEURON)]);
    assert_eq!(core.provenance().n_wta_spikes_sent, 2);
    assert_eq!(core.provenance().current_timestep, Some(2));
}

#[test]
fn test_transmit_limit_counts_refusals() {
    let (mut core, mut rx) = core();
    let mut tx = RecordingTransmitter::with_limit(1);

    rx.on_event_received(SOURCE_A | 1, value(1));
    rx.on_event_received(SOURCE_A | 3, value(1));
    core.on_timestep_tick(0, &mut tx);

    assert_eq!(tx.sent().len(), 1);
    assert_eq!(tx.refused(), 1);
    assert_eq!(core.provenance().n_wta_transmit_refused, 1);
}
