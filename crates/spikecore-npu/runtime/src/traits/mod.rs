// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Collaborator traits the per-core engine writes through
//!
//! The engine never owns its outputs. Ring buffers belong to the neuron
//! side and outgoing keys go to the network layer, so both are reached
//! through these traits:
//! - **`RingBufferStorage`**: add-only access to the accumulator slots
//! - **`SpikeTransmitter`**: hand one outgoing key to the network

pub mod error;
pub mod storage;

pub use error::{Result, RuntimeError};
pub use storage::{RingBufferStorage, SpikeTransmitter};
