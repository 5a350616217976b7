// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Integration Tests: Fixed-Size Collaborators
//!
//! Both cores driven against the heap-free ring buffers and transmitter
//! from the runtime's `embedded` feature.

use spikecore_config::{CoreOptions, CoreParameters, Descriptor, DescriptorLayout};
use spikecore_npu_burst_engine::{ConvolutionCore, SpikeReceiver, WtaCore};
use spikecore_npu_neural::{
    Connector, Coord, KeyInfo, PostRegion, Shape, SourceInfo, Stride, S1615,
};
use spikecore_npu_runtime::{FixedRingBuffers, FixedTransmitter, RuntimeError};

// ═══════════════════════════════════════════════════════════
// Helper Functions
// ═══════════════════════════════════════════════════════════

const KEY: u32 = 0x0000_0100;
const SOURCE_A: u32 = 0x0001_0000;
const SOURCE_B: u32 = 0x0002_0000;

/// 16 neurons, 2 synapse types, 16 delay slots: 512 slots
fn small_options() -> CoreOptions {
    let mut options = CoreOptions::default();
    options.ring_buffer.log_n_neurons = 4;
    options.ring_buffer.log_n_synapse_types = 1;
    options.ring_buffer.delay_bits = 4;
    options
}

fn convolution_core(weights: Vec<i16>) -> (ConvolutionCore, SpikeReceiver) {
    let key_info = KeyInfo {
        key: KEY,
        mask: 0xFFFF_FF00,
        start: 0,
        count: 1,
        ..KeyInfo::default()
    };
    let descriptor = Descriptor {
        layout: DescriptorLayout::Convolution,
        post: PostRegion::from_origin(Coord::new(-1, -1), Shape::new(3, 3)),
        sources: vec![SourceInfo::single_core(key_info, Shape::new(3, 3)).unwrap()],
        connectors: vec![Connector::new(
            Shape::new(3, 3),
            Shape::new(0, 0),
            Stride::UNIT,
            Stride::UNIT,
            0,
        )
        .unwrap()],
        weights,
    };
    ConvolutionCore::initialize(&descriptor.encode(), None, &small_options()).unwrap()
}

fn wta_core() -> (WtaCore, SpikeReceiver) {
    let source = |key| {
        let key_info = KeyInfo {
            key,
            mask: 0xFFFF_0000,
            ..KeyInfo::default()
        };
        SourceInfo::single_core(key_info, Shape::new(2, 4)).unwrap()
    };
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

// ═══════════════════════════════════════════════════════════
// Convolution core → FixedRingBuffers
// ═══════════════════════════════════════════════════════════

#[test]
fn test_convolution_into_fixed_ring_buffers() {
    let weights = vec![1, 2, 3, 4, 0, 6, 7, -8, 9];
    let (mut core, mut rx) = convolution_core(weights.clone());
    let mut rb = FixedRingBuffers::<512>::new(core.layout()).unwrap();

    rx.on_event_received(KEY | 4, 0);
    let report = core.on_timestep_tick(0, &mut rb).unwrap();
    assert_eq!(report.accumulation.taps, 9);
    assert_eq!(report.accumulation.weights_added, 8);

    for (neuron, &weight) in weights.iter().enumerate() {
        let neuron = neuron as u32;
        match weight {
            0 => assert_eq!((rb.get(0, 0, neuron), rb.get(0, 1, neuron)), (0, 0)),
            w if w > 0 => assert_eq!(rb.get(0, 0, neuron), w as u16),
            w => assert_eq!(rb.get(0, 1, neuron), w.unsigned_abs()),
        }
    }

    // Neuron side consumes the timestep
    rb.clear_timestep(0);
    assert!((0..9).all(|neuron| rb.get(0, 0, neuron) == 0 && rb.get(0, 1, neuron) == 0));
}

#[test]
fn test_fixed_ring_buffers_saturate() {
    let (mut core, mut rx) = convolution_core(vec![i16::MAX; 9]);
    let mut rb = FixedRingBuffers::<512>::new(core.layout()).unwrap();

    for _ in 0..3 {
        rx.on_event_received(KEY | 4, 0);
    }
    let report = core.on_timestep_tick(0, &mut rb).unwrap();

    assert_eq!(report.processed, 3);
    assert_eq!(rb.get(0, 0, 4), u16::MAX);
    assert!(core.provenance().n_saturations > 0);
}

#[test]
fn test_fixed_ring_buffers_must_hold_core_layout() {
    let (core, _rx) = convolution_core(vec![1; 9]);
    assert!(matches!(
        FixedRingBuffers::<256>::new(core.layout()),
        Err(RuntimeError::CapacityExceeded { requested: 512, available: 256 })
    ));
}

// ═══════════════════════════════════════════════════════════
// WTA core → FixedTransmitter
// ═══════════════════════════════════════════════════════════

#[test]
fn test_wta_into_fixed_transmitter() {
    let (mut core, mut rx) = wta_core();
    let mut tx = FixedTransmitter::<2>::new();

    rx.on_event_received(SOURCE_A | 1, value(3));
    rx.on_event_received(SOURCE_A | 3, value(3));
    rx.on_event_received(SOURCE_B | 5, value(3));
    core.on_timestep_tick(0, &mut tx);

    // Winners go out in neuron order until the buffer is full
    assert_eq!(tx.pending(), &[0xA000 + 1, 0xA000 + 3]);
    assert_eq!(tx.refused(), 1);
    let provenance = core.provenance();
    assert_eq!(provenance.n_wta_spikes_sent, 2);
    assert_eq!(provenance.n_wta_transmit_refused, 1);

    let mut flushed = Vec::new();
    tx.flush(|key| flushed.push(key));
    assert_eq!(flushed, vec![0xA001, 0xA003]);

    rx.on_event_received(SOURCE_B | 5, value(1));
    core.on_timestep_tick(1, &mut tx);
    assert_eq!(tx.pending(), &[0xA000 + 8 + 5]);
}
