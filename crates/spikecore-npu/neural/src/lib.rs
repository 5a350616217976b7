// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Spikecore Neural Computation (Platform-Agnostic)
//!
//! Everything the per-core spike pipeline computes without touching I/O:
//! - **Types**: spike events, 2-D coordinates, source and connector records
//! - **Division**: reciprocal-multiply division constants (no hardware divider)
//! - **Synapse**: saturating ring-buffer accumulation and ring-buffer index layout
//! - **Numeric**: S16.15 fixed-point payload values
//!
//! ## Target Platforms
//! - ✅ Desktop (Linux, macOS, Windows) for host-side replay and tests
//! - ✅ Embedded (ARM Cortex-M, bare metal) with `default-features = false`

#![cfg_attr(not(feature = "std"), no_std)]

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod division;
pub mod numeric;
pub mod synapse;
pub mod types;

pub use division::{remainder, DivConst, MAX_DIVIDEND, MAX_DIVISOR};
pub use numeric::S1615;
pub use synapse::{
    ceil_log2, route_weight, saturating_accumulate, RingBufferLayout, WeightRoute, MAX_ACCUMULATION,
    SATURATION_BIT,
};
pub use types::{
    Connector, Coord, KeyInfo, NeuralError, PostRegion, Result, Shape, SourceInfo, SpikeEvent,
    Stride, NO_SYNAPSE_TYPE,
};
