// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Synaptic contribution calculation
//!
//! Ring-buffer slots are 16-bit unsigned accumulators. Signed kernel weights
//! are never stored signed: the sign picks the channel (positive or negative
//! synapse type) and the magnitude is added.

/// Largest value a ring-buffer slot can hold
pub const MAX_ACCUMULATION: u16 = u16::MAX;

/// Bit that is set in the 32-bit sum exactly when a 16-bit add overflowed
pub const SATURATION_BIT: u32 = 0x1_0000;

/// Add `amount` to a ring-buffer slot, clamping at [`MAX_ACCUMULATION`]
///
/// Returns `true` when the add saturated.
///
/// # Example
/// ```
/// use spikecore_npu_neural::synapse::{saturating_accumulate, MAX_ACCUMULATION};
///
/// let mut slot = MAX_ACCUMULATION - 1;
/// assert!(!saturating_accumulate(&mut slot, 1));
/// assert_eq!(slot, MAX_ACCUMULATION);
///
/// let mut slot = MAX_ACCUMULATION - 1;
/// assert!(saturating_accumulate(&mut slot, 2));
/// assert_eq!(slot, MAX_ACCUMULATION);
/// ```
#[inline]
pub fn saturating_accumulate(slot: &mut u16, amount: u16) -> bool {
    let accumulation = *slot as u32 + amount as u32;
    let saturated = accumulation & SATURATION_BIT;
    if saturated != 0 {
        *slot = (saturated - 1) as u16;
        true
    } else {
        *slot = accumulation as u16;
        false
    }
}

/// Channel and magnitude for one non-zero weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightRoute {
    pub synapse_type: u16,
    pub magnitude: u16,
}

/// Route a signed kernel weight to its accumulation channel
///
/// Positive weights go to `positive_type`, negative ones to `negative_type`
/// with their magnitude. Zero weights produce no route.
#[inline]
pub fn route_weight(weight: i16, positive_type: u16, negative_type: u16) -> Option<WeightRoute> {
    match weight {
        0 => None,
        w if w > 0 => Some(WeightRoute {
            synapse_type: positive_type,
            magnitude: w as u16,
        }),
        w => Some(WeightRoute {
            synapse_type: negative_type,
            magnitude: w.unsigned_abs(),
        }),
    }
}
