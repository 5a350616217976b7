// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for runtime operations

use core::fmt;

#[cfg(feature = "std")]
extern crate std;

/// Runtime errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Queue capacity is zero or too large to round to a power of two
    InvalidCapacity {
        /// Requested capacity
        requested: usize,
    },

    /// Capacity exceeded
    CapacityExceeded {
        /// Requested capacity
        requested: usize,
        /// Available capacity
        available: usize,
    },

    /// Ring-buffer index outside the storage
    IndexOutOfRange {
        /// Computed index
        index: usize,
        /// Storage length
        len: usize,
    },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::InvalidCapacity { requested } => {
                write!(f, "Invalid queue capacity: {}", requested)
            }
            RuntimeError::CapacityExceeded { requested, available } => {
                write!(
                    f,
                    "Capacity exceeded: requested {}, available {}",
                    requested, available
                )
            }
            RuntimeError::IndexOutOfRange { index, len } => {
                write!(f, "Ring buffer index {} out of range (len {})", index, len)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RuntimeError {}

/// Result type for runtime operations
pub type Result<T> = core::result::Result<T, RuntimeError>;
