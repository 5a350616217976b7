// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Read-only diagnostic counters for periodic collection

use spikecore_npu_runtime::QueueStats;

/// Counter snapshot for one core
///
/// Counters saturate instead of wrapping. Resetting and reporting cadence
/// belong to whoever collects them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Provenance {
    /// Last timestep handed to `on_timestep_tick`
    pub current_timestep: Option<u32>,
    /// Most events processed in a single tick
    pub max_spikes_received_per_timestep: u32,
    /// Events discarded because the tick budget ran out
    pub n_spikes_dropped: u32,
    /// Events refused by a full input queue
    pub n_spikes_lost_from_input: u32,
    /// Highest input queue occupancy observed
    pub max_input_buffer_size: u32,
    /// Events whose key matched no source
    pub n_unmatched_events: u32,
    /// Events taken from the queue and handled
    pub n_events_processed: u32,
    /// Ring-buffer adds that clamped
    pub n_saturations: u32,
    /// WTA events whose neuron id or outgoing key index was out of range
    pub n_wta_out_of_range: u32,
    /// WTA keys accepted by the transmitter
    pub n_wta_spikes_sent: u32,
    /// WTA keys the transmitter refused
    pub n_wta_transmit_refused: u32,
}

impl Provenance {
    /// Fold queue diagnostics into the snapshot
    pub fn with_queue_stats(mut self, stats: QueueStats) -> Self {
        self.n_spikes_lost_from_input = stats.overflows;
        self.max_input_buffer_size = u32::try_from(stats.max_occupancy).unwrap_or(u32::MAX);
        self
    }

    pub(crate) fn record_tick(&mut self, timestep: u32, processed: u32, dropped: u32) {
        self.current_timestep = Some(timestep);
        self.max_spikes_received_per_timestep = self.max_spikes_received_per_timestep.max(processed);
        self.n_events_processed = self.n_events_processed.saturating_add(processed);
        self.n_spikes_dropped = self.n_spikes_dropped.saturating_add(dropped);
    }
}

/// Saturating `+= 1`
#[inline]
pub(crate) fn bump(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tick_tracks_maximum() {
        let mut p = Provenance::default();
        p.record_tick(0, 5, 0);
        p.record_tick(1, 3, 2);
        assert_eq!(p.current_timestep, Some(1));
        assert_eq!(p.max_spikes_received_per_timestep, 5);
        assert_eq!(p.n_events_processed, 8);
        assert_eq!(p.n_spikes_dropped, 2);
    }

    #[test]
    fn test_queue_stats_folded() {
        let stats = QueueStats {
            capacity: 8,
            len: 0,
            overflows: 3,
            max_occupancy: 8,
        };
        let p = Provenance::default().with_queue_stats(stats);
        assert_eq!(p.n_spikes_lost_from_input, 3);
        assert_eq!(p.max_input_buffer_size, 8);
    }

    #[test]
    fn test_bump_saturates() {
        let mut counter = u32::MAX;
        bump(&mut counter);
        assert_eq!(counter, u32::MAX);
    }
}
