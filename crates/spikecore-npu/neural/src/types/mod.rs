// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neural Types Module
//!
//! Records shared by the descriptor loader and the per-tick pipeline.

pub mod connectivity;
pub mod error;
pub mod event;
pub mod spatial;

pub use connectivity::{Connector, KeyInfo, SourceInfo, NO_SYNAPSE_TYPE};
pub use error::{NeuralError, Result};
pub use event::SpikeEvent;
pub use spatial::{Coord, PostRegion, Shape, Stride};
