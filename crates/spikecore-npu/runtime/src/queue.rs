// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Lock-free single-producer / single-consumer spike queue
//!
//! The receive interrupt pushes events through a [`SpikeProducer`]; the
//! per-timestep tick drains them through a [`SpikeConsumer`]. The two
//! handles are the only way to reach the buffer and neither is `Clone`, so
//! there is exactly one writer of each index.
//!
//! ## Ordering
//!
//! - The producer writes the slot, then publishes `write` with `Release`.
//!   The consumer loads `write` with `Acquire` before reading the slot.
//! - The consumer reads the slot, then publishes `read` with `Release`.
//!   The producer loads `read` with `Acquire` before overwriting a slot.
//!
//! Indices run freely and wrap; the slot is `index & mask`, so the full
//! power-of-two capacity is usable. Keys and payloads live in two 32-bit
//! atomic arrays so targets without 64-bit atomics can host the queue.

extern crate alloc;

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::traits::error::{Result, RuntimeError};
use spikecore_npu_neural::SpikeEvent;

/// Largest queue capacity accepted (after rounding)
pub const MAX_QUEUE_CAPACITY: usize = 1 << 24;

struct Shared {
    keys: Box<[AtomicU32]>,
    payloads: Box<[AtomicU32]>,
    mask: usize,
    /// Written only by the producer
    write: AtomicUsize,
    /// Written only by the consumer
    read: AtomicUsize,
    overflows: AtomicU32,
    max_occupancy: AtomicUsize,
}

impl Shared {
    #[inline]
    fn capacity(&self) -> usize {
        self.mask + 1
    }

    #[inline]
    fn occupancy(&self) -> usize {
        // read first: a later load of write can never be behind it
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    fn stats(&self) -> QueueStats {
        QueueStats {
            capacity: self.capacity(),
            len: self.occupancy(),
            overflows: self.overflows.load(Ordering::Relaxed),
            max_occupancy: self.max_occupancy.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of queue diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Slots in the buffer (a power of two)
    pub capacity: usize,
    /// Events currently queued
    pub len: usize,
    /// Events refused because the queue was full
    pub overflows: u32,
    /// Highest occupancy ever observed after an enqueue
    pub max_occupancy: usize,
}

/// Create a queue holding at least `capacity` events
///
/// The capacity is rounded up to the next power of two.
///
/// # Errors
/// `RuntimeError::InvalidCapacity` for zero or for capacities above
/// [`MAX_QUEUE_CAPACITY`] after rounding.
///
/// # Example
/// ```
/// use spikecore_npu_runtime::queue::spike_queue;
/// use spikecore_npu_neural::SpikeEvent;
///
/// let (mut tx, mut rx) = spike_queue(5).unwrap();
/// assert_eq!(rx.capacity(), 8);
/// assert!(tx.enqueue(SpikeEvent::key_only(42)));
/// assert_eq!(rx.dequeue(), Some(SpikeEvent::key_only(42)));
/// assert_eq!(rx.dequeue(), None);
/// ```
pub fn spike_queue(capacity: usize) -> Result<(SpikeProducer, SpikeConsumer)> {
    let rounded = match capacity.checked_next_power_of_two() {
        Some(rounded) if capacity > 0 && rounded <= MAX_QUEUE_CAPACITY => rounded,
        _ => return Err(RuntimeError::InvalidCapacity { requested: capacity }),
    };

    let keys: Vec<AtomicU32> = (0..rounded).map(|_| AtomicU32::new(0)).collect();
    let payloads: Vec<AtomicU32> = (0..rounded).map(|_| AtomicU32::new(0)).collect();
    let shared = Arc::new(Shared {
        keys: keys.into_boxed_slice(),
        payloads: payloads.into_boxed_slice(),
        mask: rounded - 1,
        write: AtomicUsize::new(0),
        read: AtomicUsize::new(0),
        overflows: AtomicU32::new(0),
        max_occupancy: AtomicUsize::new(0),
    });

    Ok((
        SpikeProducer {
            shared: Arc::clone(&shared),
        },
        SpikeConsumer { shared },
    ))
}

/// Interrupt-side handle: the only writer of the `write` index
pub struct SpikeProducer {
    shared: Arc<Shared>,
}

impl SpikeProducer {
    /// Push one event without blocking
    ///
    /// Returns `false` and counts an overflow when the queue is full. The
    /// read index and the queued events are left untouched.
    #[inline]
    pub fn enqueue(&mut self, event: SpikeEvent) -> bool {
        let shared = &*self.shared;
        let write = shared.write.load(Ordering::Relaxed);
        let read = shared.read.load(Ordering::Acquire);
        let occupancy = write.wrapping_sub(read);

        if occupancy >= shared.capacity() {
            // saturates: Err means the counter is already at u32::MAX
            let _ = shared
                .overflows
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1));
            return false;
        }

        let slot = write & shared.mask;
        shared.keys[slot].store(event.key, Ordering::Relaxed);
        shared.payloads[slot].store(event.payload, Ordering::Relaxed);
        shared.write.store(write.wrapping_add(1), Ordering::Release);
        shared
            .max_occupancy
            .fetch_max(occupancy + 1, Ordering::Relaxed);
        true
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.stats()
    }
}

impl fmt::Debug for SpikeProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpikeProducer")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Tick-side handle: the only writer of the `read` index
pub struct SpikeConsumer {
    shared: Arc<Shared>,
}

impl SpikeConsumer {
    /// Pop the oldest event, `None` when empty
    #[inline]
    pub fn dequeue(&mut self) -> Option<SpikeEvent> {
        let shared = &*self.shared;
        let read = shared.read.load(Ordering::Relaxed);
        let write = shared.write.load(Ordering::Acquire);
        if read == write {
            return None;
        }

        let slot = read & shared.mask;
        let event = SpikeEvent::new(
            shared.keys[slot].load(Ordering::Relaxed),
            shared.payloads[slot].load(Ordering::Relaxed),
        );
        shared.read.store(read.wrapping_add(1), Ordering::Release);
        Some(event)
    }

    /// Iterator that dequeues until the queue is empty
    pub fn drain(&mut self) -> Drain<'_> {
        Drain { consumer: self }
    }

    /// Discard everything queued so far; returns how many events were dropped
    pub fn clear(&mut self) -> usize {
        let shared = &*self.shared;
        let read = shared.read.load(Ordering::Relaxed);
        let write = shared.write.load(Ordering::Acquire);
        shared.read.store(write, Ordering::Release);
        write.wrapping_sub(read)
    }

    pub fn len(&self) -> usize {
        self.shared.occupancy()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.stats()
    }
}

impl fmt::Debug for SpikeConsumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpikeConsumer")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Draining iterator returned by [`SpikeConsumer::drain`]
pub struct Drain<'a> {
    consumer: &'a mut SpikeConsumer,
}

impl Iterator for Drain<'_> {
    type Item = SpikeEvent;

    fn next(&mut self) -> Option<SpikeEvent> {
        self.consumer.dequeue()
    }
}
