// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! S16.15 fixed-point values
//!
//! Winner-take-all cores compare spike payloads as signed fixed-point
//! numbers with 15 fractional bits. Comparison is plain integer comparison
//! of the raw bits.

/// Signed 16.15 fixed-point number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct S1615(i32);

impl S1615 {
    pub const FRACTIONAL_BITS: u32 = 15;
    pub const ONE: S1615 = S1615(1 << 15);
    pub const MIN: S1615 = S1615(i32::MIN);
    pub const MAX: S1615 = S1615(i32::MAX);

    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Reinterpret a 32-bit payload word
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits as i32)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn to_bits(self) -> u32 {
        self.0 as u32
    }

    pub fn from_f32(value: f32) -> Self {
        let scaled = value * (1u32 << Self::FRACTIONAL_BITS) as f32;
        // float-to-int casts saturate
        Self(scaled as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / (1u32 << Self::FRACTIONAL_BITS) as f32
    }
}
