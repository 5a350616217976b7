// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Receive side and per-tick draining
//!
//! [`SpikeReceiver`] is the only thing the receive context touches; it owns
//! the producer half of the input queue and never decodes. The tick context
//! drains the consumer half through [`drain_tick`] within its budget.

use spikecore_config::QueueOptions;
use spikecore_npu_neural::SpikeEvent;
use spikecore_npu_runtime::{QueueStats, SpikeConsumer, SpikeProducer};
use tracing::{debug, warn};

/// Producer handle for the receive context
#[derive(Debug)]
pub struct SpikeReceiver {
    producer: SpikeProducer,
}

impl SpikeReceiver {
    pub(crate) fn new(producer: SpikeProducer) -> Self {
        Self { producer }
    }

    /// Queue a received spike; `false` if the queue was full (event lost)
    #[inline]
    pub fn on_event_received(&mut self, key: u32, payload: u32) -> bool {
        self.producer.enqueue(SpikeEvent::new(key, payload))
    }

    pub fn stats(&self) -> QueueStats {
        self.producer.stats()
    }
}

/// How much of the queue one tick may consume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickBudget {
    /// Events processed before the budget is spent (`None` = until empty)
    pub max_events: Option<u32>,
    /// Drop what is left once the budget is spent, otherwise carry it
    pub discard_late: bool,
}

impl From<&QueueOptions> for TickBudget {
    fn from(options: &QueueOptions) -> Self {
        Self {
            max_events: options.max_events_per_tick,
            discard_late: options.discard_late_events,
        }
    }
}

/// What one drain did with the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    pub processed: u32,
    /// Late events discarded
    pub dropped: u32,
    /// Late events left queued for the next tick
    pub carried: u32,
}

/// Drain the queue into `handle` until it is empty or the budget is spent
///
/// An error from `handle` stops the drain; the failing event is counted as
/// processed and the rest stay queued.
pub fn drain_tick<E, F>(
    consumer: &mut SpikeConsumer,
    budget: TickBudget,
    mut handle: F,
) -> Result<DrainOutcome, E>
where
    F: FnMut(SpikeEvent) -> Result<(), E>,
{
    let mut outcome = DrainOutcome::default();

    loop {
        if let Some(max) = budget.max_events {
            if outcome.processed >= max {
                break;
            }
        }
        let Some(event) = consumer.dequeue() else {
            return Ok(outcome);
        };
        outcome.processed += 1;
        handle(event)?;
    }

    if consumer.is_empty() {
        return Ok(outcome);
    }

    if budget.discard_late {
        outcome.dropped = u32::try_from(consumer.clear()).unwrap_or(u32::MAX);
        warn!(
            target: "spikecore-burst-engine",
            "Tick budget of {} spent, discarded {} late events",
            outcome.processed,
            outcome.dropped
        );
    } else {
        outcome.carried = u32::try_from(consumer.len()).unwrap_or(u32::MAX);
        debug!(
            target: "spikecore-burst-engine",
            "Tick budget of {} spent, carrying {} events",
            outcome.processed,
            outcome.carried
        );
    }
    Ok(outcome)
}
