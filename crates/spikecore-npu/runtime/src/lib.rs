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

//! # Spikecore Runtime
//!
//! The concurrency seam and collaborator interfaces of a core.
//!
//! This crate provides:
//! - **Traits** (always available): `RingBufferStorage`, `SpikeTransmitter`
//! - **Spike queue** (behind `alloc`): lock-free SPSC queue between the
//!   receive interrupt and the timestep tick
//! - **Std Implementation** (behind `std` feature): `VecRingBuffers`, `RecordingTransmitter`
//! - **Embedded Implementation** (behind `embedded` feature): `FixedRingBuffers`, `FixedTransmitter`
//!
//! ## Features
//!
//! - `default` = `[]` (traits only, no_std compatible)
//! - `alloc` = heap-backed spike queue without std
//! - `std` = `alloc` plus host-side collaborators
//! - `embedded` = fixed-array collaborators (no heap)
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! spikecore-npu-runtime = { version = "0.3", features = ["std"] }
//! ```
//!
//! ```rust
//! # #[cfg(feature = "std")] {
//! use spikecore_npu_runtime::{spike_queue, VecRingBuffers};
//! use spikecore_npu_neural::RingBufferLayout;
//!
//! let (producer, consumer) = spike_queue(256).unwrap();
//! let buffers = VecRingBuffers::new(RingBufferLayout::new(8, 1, 4));
//! # }
//! ```

#![no_std]

#[cfg(feature = "std")]
extern crate std;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Traits module (always available)
pub mod traits;

pub use traits::{Result, RingBufferStorage, RuntimeError, SpikeTransmitter};

#[cfg(feature = "alloc")]
pub mod queue;

#[cfg(feature = "alloc")]
pub use queue::{spike_queue, Drain, QueueStats, SpikeConsumer, SpikeProducer, MAX_QUEUE_CAPACITY};

// Standard library implementation (behind "std" feature)
#[cfg(feature = "std")]
pub mod std_impl;

#[cfg(feature = "std")]
pub use std_impl::{RecordingTransmitter, VecRingBuffers};

// Embedded implementation (behind "embedded" feature)
#[cfg(feature = "embedded")]
pub mod embedded_impl;

#[cfg(feature = "embedded")]
pub use embedded_impl::{FixedRingBuffers, FixedTransmitter};
