// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runtime option types
//!
//! This module defines the structs that map to sections in `spikecore.toml`.
//! Every section and field has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};

use crate::descriptor::DescriptorLayout;
use spikecore_npu_neural::RingBufferLayout;

/// Root options structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CoreOptions {
    pub queue: QueueOptions,
    pub ring_buffer: RingBufferOptions,
    pub accumulation: AccumulationOptions,
    pub descriptor: DescriptorOptions,
}

/// Input spike queue
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueOptions {
    /// Requested capacity; rounded up to a power of two
    pub capacity: usize,
    /// Drop events still queued when a tick's budget runs out (otherwise carry them)
    pub discard_late_events: bool,
    /// Events processed per tick before the budget is spent (`None` = drain fully)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_events_per_tick: Option<u32>,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            capacity: 8192,
            discard_late_events: true,
            max_events_per_tick: None,
        }
    }
}

/// Ring-buffer layout used when no core-parameter region is supplied
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RingBufferOptions {
    pub delay_bits: u32,
    pub log_n_neurons: u32,
    pub log_n_synapse_types: u32,
}

impl Default for RingBufferOptions {
    fn default() -> Self {
        Self {
            delay_bits: 4,
            log_n_neurons: 8,
            // excitatory, inhibitory, trace
            log_n_synapse_types: 2,
        }
    }
}

impl RingBufferOptions {
    pub fn layout(&self) -> RingBufferLayout {
        RingBufferLayout::new(self.log_n_neurons, self.log_n_synapse_types, self.delay_bits)
    }
}

/// Accumulation behaviour
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AccumulationOptions {
    /// Fan each tap out into delay-staggered sub-events
    pub multisynaptic: bool,
    /// Amount added to a presynaptic trace slot per in-bounds tap
    pub trace_increment: u16,
}

impl Default for AccumulationOptions {
    fn default() -> Self {
        Self {
            multisynaptic: false,
            trace_increment: 1,
        }
    }
}

/// Descriptor decoding
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DescriptorOptions {
    pub layout: DescriptorLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let options: CoreOptions = toml::from_str("").unwrap();
        assert_eq!(options, CoreOptions::default());
        assert!(options.queue.discard_late_events);
        assert_eq!(options.queue.max_events_per_tick, None);
        assert_eq!(options.descriptor.layout, DescriptorLayout::Convolution);
    }

    #[test]
    fn test_partial_sections() {
        let options: CoreOptions = toml::from_str(
            r#"
            [queue]
            max_events_per_tick = 100

            [descriptor]
            layout = "wta"
            "#,
        )
        .unwrap();
        assert_eq!(options.queue.capacity, 8192);
        assert_eq!(options.queue.max_events_per_tick, Some(100));
        assert_eq!(options.descriptor.layout, DescriptorLayout::Wta);
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut options = CoreOptions::default();
        options.accumulation.multisynaptic = true;
        let text = toml::to_string(&options).unwrap();
        let back: CoreOptions = toml::from_str(&text).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn test_ring_buffer_layout() {
        let layout = RingBufferOptions::default().layout();
        assert_eq!(layout, RingBufferLayout::new(8, 2, 4));
    }
}
