// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Synaptic accumulation module
//!
//! Platform-agnostic pieces of ring-buffer accumulation: the saturating add,
//! sign-based channel routing, and the composite ring-buffer index.

pub mod contribution;
pub mod ring_buffer;

pub use contribution::*;
pub use ring_buffer::*;
