// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Spikecore Runtime - Embedded (no_std)
//!
//! Collaborators for cores with no heap.
//!
//! ## Features
//! - ✅ `no_std` compatible
//! - ✅ Fixed-size arrays (no heap allocation)
//! - ✅ Deterministic memory footprint
//!
//! This module is only available when the `embedded` feature is enabled.

pub mod ring_buffers;
pub mod transmitter;

pub use ring_buffers::FixedRingBuffers;
pub use transmitter::FixedTransmitter;
