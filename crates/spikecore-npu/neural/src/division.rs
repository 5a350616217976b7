// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Reciprocal-multiply division
//!
//! The target cores have no hardware divider, so every division by a
//! configured dimension (width per core, cores per row, strides, pooling
//! strides) is a multiply by a precomputed reciprocal followed by two shifts
//! (Granlund–Montgomery, N = 16).
//!
//! The constants are exact for every dividend in `0..=u16::MAX` and every
//! divisor in `1..=u16::MAX`. Negative dividends are floored
//! (round toward negative infinity), matching `i32::div_euclid` for
//! positive divisors.

use crate::synapse::ring_buffer::ceil_log2;
use crate::types::error::{NeuralError, Result};

/// Largest divisor a [`DivConst`] can represent (16-bit dimension fields).
pub const MAX_DIVISOR: u32 = u16::MAX as u32;

/// Largest dividend for which [`DivConst::divide`] is exact.
pub const MAX_DIVIDEND: u32 = u16::MAX as u32;

/// Precomputed reciprocal for division by a fixed 16-bit value.
///
/// Wire form is one little-endian word: `m` in bits 0-15, `sh1` in bits
/// 16-23, `sh2` in bits 24-31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct DivConst {
    /// Reciprocal multiplier (low 16 bits of `2^16 * (2^l - d) / d + 1`)
    pub m: u16,
    /// First shift, `min(l, 1)`
    pub sh1: u8,
    /// Second shift, `max(l - 1, 0)`
    pub sh2: u8,
}

impl DivConst {
    /// Reciprocal for division by one (the identity).
    pub const IDENTITY: DivConst = DivConst { m: 1, sh1: 0, sh2: 0 };

    /// Compute the reciprocal constants for `divisor`.
    ///
    /// # Errors
    /// `NeuralError::InvalidDivisor` when `divisor` is zero or does not fit in
    /// 16 bits.
    ///
    /// # Example
    /// ```
    /// use spikecore_npu_neural::DivConst;
    ///
    /// let by_three = DivConst::new(3).unwrap();
    /// assert_eq!(by_three.divide(100), 33);
    /// assert_eq!(by_three.divide_signed(-1), -1);
    /// ```
    pub fn new(divisor: u32) -> Result<Self> {
        if divisor == 0 || divisor > MAX_DIVISOR {
            return Err(NeuralError::InvalidDivisor { divisor });
        }

        let log_d = ceil_log2(divisor);
        let d = divisor as u64;
        let m = (((1u64 << 16) * ((1u64 << log_d) - d)) / d) + 1;

        Ok(Self {
            m: m as u16,
            sh1: log_d.min(1) as u8,
            sh2: log_d.saturating_sub(1) as u8,
        })
    }

    /// Decode from the packed configuration word.
    #[inline]
    pub const fn from_word(word: u32) -> Self {
        Self {
            m: (word & 0xFFFF) as u16,
            sh1: ((word >> 16) & 0xFF) as u8,
            sh2: (word >> 24) as u8,
        }
    }

    /// Encode into the packed configuration word.
    #[inline]
    pub const fn to_word(self) -> u32 {
        (self.m as u32) | ((self.sh1 as u32) << 16) | ((self.sh2 as u32) << 24)
    }

    /// Floor division of a non-negative dividend.
    ///
    /// Exact for `n <= MAX_DIVIDEND`; larger dividends are a caller bug.
    #[inline]
    pub fn divide(self, n: u32) -> u32 {
        debug_assert!(n <= MAX_DIVIDEND, "dividend {} exceeds 16 bits", n);
        let t1 = n.wrapping_mul(self.m as u32) >> 16;
        let t2 = ((n - t1) >> self.sh1) + t1;
        t2 >> self.sh2
    }

    /// Floor division of a signed dividend (rounds toward negative infinity).
    #[inline]
    pub fn divide_signed(self, n: i32) -> i32 {
        if n >= 0 {
            self.divide(n as u32) as i32
        } else {
            // floor(n / d) == -(floor((-n - 1) / d)) - 1 for d > 0
            let magnitude = (-(n + 1)) as u32;
            -(self.divide(magnitude) as i32) - 1
        }
    }
}

impl Default for DivConst {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// True remainder of a division whose quotient is already known.
///
/// Always in `0..divisor` when `quotient` is the floored quotient.
#[inline]
pub fn remainder(dividend: i32, divisor: i32, quotient: i32) -> i32 {
    dividend - quotient * divisor
}
