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

//! # Convolutional Accumulation
//!
//! Adds one pre-synaptic event's kernel into the ring buffers.
//!
//! ## Kernel walk
//! Rows and columns are walked from the mapped kernel start in stride-sized
//! steps while the post coordinate moves back one neuron per step:
//!
//! ```text
//! i = start, start + stride, ... < kernel size
//! post = mapped, mapped - 1, ...
//! tap = kernel size - 1 - i
//! ```
//!
//! Taps whose post coordinate falls outside the core's post region are
//! skipped. Zero weights never touch a slot. The sign of a weight selects
//! the positive or negative synapse type and the magnitude is added with
//! 16-bit saturation.
//!
//! ## Trace channel
//! A connector with a presynaptic trace type adds `trace_increment` to the
//! trace slot of every in-bounds tap, before and regardless of the weight.
//!
//! ## Multisynaptic fan-out
//! When enabled, the walk repeats for sub-events `s = 1, 2, ...` with delay
//! `delay - s` and kernel base `kernel_index - s * kernel_len`, until either
//! would go negative.

use spikecore_npu_neural::{route_weight, Connector, Coord, PostRegion, RingBufferLayout};
use spikecore_npu_runtime::{Result, RingBufferStorage};
use tracing::{trace, warn};

use crate::coordinate_transform::map_pre_to_post;

/// Counts from one or more accumulate calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulationStats {
    /// In-bounds taps visited
    pub taps: u32,
    /// Non-zero weights added
    pub weights_added: u32,
    /// Trace increments added
    pub trace_updates: u32,
    /// Adds that clamped at the slot maximum
    pub saturations: u32,
    /// Taps whose weight index fell outside the weight table
    pub missing_weights: u32,
}

impl AccumulationStats {
    pub fn merge(&mut self, other: AccumulationStats) {
        self.taps = self.taps.saturating_add(other.taps);
        self.weights_added = self.weights_added.saturating_add(other.weights_added);
        self.trace_updates = self.trace_updates.saturating_add(other.trace_updates);
        self.saturations = self.saturations.saturating_add(other.saturations);
        self.missing_weights = self.missing_weights.saturating_add(other.missing_weights);
    }
}

/// Read-only accumulation state for one core
#[derive(Debug, Clone)]
pub struct AccumulationEngine {
    post: PostRegion,
    weights: Vec<i16>,
    layout: RingBufferLayout,
    trace_increment: u16,
    multisynaptic: bool,
}

impl AccumulationEngine {
    pub fn new(post: PostRegion, weights: Vec<i16>, layout: RingBufferLayout) -> Self {
        Self {
            post,
            weights,
            layout,
            trace_increment: 1,
            multisynaptic: false,
        }
    }

    pub fn with_trace_increment(mut self, trace_increment: u16) -> Self {
        self.trace_increment = trace_increment;
        self
    }

    pub fn with_multisynaptic(mut self, multisynaptic: bool) -> Self {
        self.multisynaptic = multisynaptic;
        self
    }

    pub fn post(&self) -> &PostRegion {
        &self.post
    }

    pub fn layout(&self) -> RingBufferLayout {
        self.layout
    }

    pub fn weights(&self) -> &[i16] {
        &self.weights
    }

    /// Accumulate one event's kernel at `pre` for a connector
    ///
    /// # Errors
    /// Propagates `IndexOutOfRange` from storage smaller than the layout.
    pub fn accumulate<R: RingBufferStorage + ?Sized>(
        &self,
        timestep: u32,
        pre: Coord,
        connector: &Connector,
        ring_buffers: &mut R,
    ) -> Result<AccumulationStats> {
        let mut stats = AccumulationStats::default();
        let kernel_index = connector.kernel_index as usize;

        if !self.multisynaptic {
            self.convolve(
                timestep,
                pre,
                connector,
                connector.delay,
                kernel_index,
                ring_buffers,
                &mut stats,
            )?;
            return Ok(stats);
        }

        let kernel_len = connector.kernel_len();
        let mut sub_event = 0u16;
        loop {
            let Some(delay) = connector.delay.checked_sub(sub_event) else {
                break;
            };
            let Some(base) = (sub_event as usize)
                .checked_mul(kernel_len)
                .and_then(|offset| kernel_index.checked_sub(offset))
            else {
                break;
            };
            trace!(
                target: "spikecore-burst-engine",
                "[ACCUM] sub-event {} delay {} kernel base {}",
                sub_event,
                delay,
                base
            );
            self.convolve(timestep, pre, connector, delay, base, ring_buffers, &mut stats)?;

            match sub_event.checked_add(1) {
                Some(next) => sub_event = next,
                None => break,
            }
        }
        Ok(stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn convolve<R: RingBufferStorage + ?Sized>(
        &self,
        timestep: u32,
        pre: Coord,
        connector: &Connector,
        delay: u16,
        kernel_base: usize,
        ring_buffers: &mut R,
        stats: &mut AccumulationStats,
    ) -> Result<()> {
        let mapping = map_pre_to_post(connector, pre);
        let kernel_height = connector.kernel.height as i32;
        let kernel_width = connector.kernel.width as i32;
        let arrival = timestep.wrapping_add(delay as u32);
        let stride_row = (connector.strides.row as usize).max(1);
        let stride_col = (connector.strides.col as usize).max(1);

        trace!(
            target: "spikecore-burst-engine",
            "[ACCUM] pre ({}, {}) -> post ({}, {}) start ({}, {})",
            pre.row,
            pre.col,
            mapping.post.row,
            mapping.post.col,
            mapping.kernel_start.row,
            mapping.kernel_start.col
        );

        let rows = (mapping.kernel_start.row..kernel_height).step_by(stride_row);
        for (row_step, i_row) in rows.enumerate() {
            let post_row = mapping.post.row - row_step as i32;
            if !self.post.contains_row(post_row) {
                continue;
            }
            let kr = (kernel_height - 1 - i_row) as u32;

            let cols = (mapping.kernel_start.col..kernel_width).step_by(stride_col);
            for (col_step, i_col) in cols.enumerate() {
                let post_col = mapping.post.col - col_step as i32;
                let Some(post_index) = self.post.neuron_index(Coord::new(post_row, post_col))
                else {
                    continue;
                };
                let kc = (kernel_width - 1 - i_col) as u32;
                stats.taps += 1;

                if connector.has_trace() {
                    let index = self.layout.index(
                        arrival,
                        connector.trace_synapse_type as u32,
                        post_index,
                    );
                    if ring_buffers.accumulate(index, self.trace_increment)? {
                        stats.saturations += 1;
                    }
                    stats.trace_updates += 1;
                }

                let weight_index = connector.weight_index(kernel_base, kr, kc);
                let Some(&weight) = self.weights.get(weight_index) else {
                    warn!(
                        target: "spikecore-burst-engine",
                        "[ACCUM] weight {} outside table of {} (kernel base {})",
                        weight_index,
                        self.weights.len(),
                        kernel_base
                    );
                    stats.missing_weights += 1;
                    continue;
                };
                let Some(route) = route_weight(
                    weight,
                    connector.positive_synapse_type,
                    connector.negative_synapse_type,
                ) else {
                    continue;
                };

                let index = self
                    .layout
                    .index(arrival, route.synapse_type as u32, post_index);
                trace!(
                    target: "spikecore-burst-engine",
                    "[ACCUM] post {} ({}, {}) type {} += {} at slot {}",
                    post_index,
                    post_row,
                    post_col,
                    route.synapse_type,
                    route.magnitude,
                    index
                );
                if ring_buffers.accumulate(index, route.magnitude)? {
                    stats.saturations += 1;
                }
                stats.weights_added += 1;
            }
        }
        Ok(())
    }
}
