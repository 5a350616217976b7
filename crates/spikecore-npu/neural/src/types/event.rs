// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spike events as they travel from the receive interrupt to the tick handler

use crate::numeric::S1615;

/// One received spike: routing key plus a 32-bit payload
///
/// The payload is unused by convolution cores and carries an S16.15 value
/// on winner-take-all cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct SpikeEvent {
    pub key: u32,
    pub payload: u32,
}

impl SpikeEvent {
    #[inline]
    pub const fn new(key: u32, payload: u32) -> Self {
        Self { key, payload }
    }

    /// Event without a payload
    #[inline]
    pub const fn key_only(key: u32) -> Self {
        Self { key, payload: 0 }
    }

    /// Payload reinterpreted as a signed S16.15 value
    #[inline]
    pub const fn value(self) -> S1615 {
        S1615::from_bits(self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_payload_value() {
        let event = SpikeEvent::new(1, (-(1i32 << 15)) as u32);
        assert_eq!(event.value(), S1615::from_raw(-(1 << 15)));
    }
}
