// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for neural record construction

use core::fmt;

#[cfg(feature = "std")]
extern crate std;

/// Errors raised while building numeric constants or records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeuralError {
    /// Divisor is zero or wider than 16 bits
    InvalidDivisor { divisor: u32 },

    /// A dimension or field does not fit its wire width
    DimensionOutOfRange { field: &'static str, value: u32 },

    /// Kernel is empty along one axis
    EmptyKernel { height: u16, width: u16 },
}

impl fmt::Display for NeuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeuralError::InvalidDivisor { divisor } => {
                write!(f, "Invalid divisor {}: must be in 1..=65535", divisor)
            }
            NeuralError::DimensionOutOfRange { field, value } => {
                write!(f, "Dimension out of range: {} = {}", field, value)
            }
            NeuralError::EmptyKernel { height, width } => {
                write!(f, "Empty kernel: {}x{}", height, width)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NeuralError {}

pub type Result<T> = core::result::Result<T, NeuralError>;
