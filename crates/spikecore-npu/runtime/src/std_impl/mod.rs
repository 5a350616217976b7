// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Spikecore Runtime - Standard (Desktop/Server)
//!
//! Host-side collaborators for replay tools and tests.
//!
//! ## Features
//! - ✅ Heap-allocated ring buffers sized from a [`RingBufferLayout`]
//! - ✅ Recording transmitter that keeps every emitted key
//!
//! This module is only available when the `std` feature is enabled.
//!
//! [`RingBufferLayout`]: spikecore_npu_neural::RingBufferLayout

pub mod ring_buffers;
pub mod transmitter;

pub use ring_buffers::VecRingBuffers;
pub use transmitter::RecordingTransmitter;
