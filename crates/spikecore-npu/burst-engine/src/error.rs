// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine errors
//!
//! Only initialisation and collaborator mismatches are errors. Unmatched
//! keys, queue overflow, late events and saturation are counted in
//! [`Provenance`](crate::Provenance) instead.

use spikecore_config::LoadError;
use spikecore_npu_runtime::RuntimeError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("configuration load failed: {0}")]
    Load(#[from] LoadError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("WTA core requires a core-parameter region")]
    MissingCoreParameters,

    #[error("ring buffer layout too small for {what}: need {needed}, layout holds {available}")]
    LayoutTooSmall {
        what: &'static str,
        needed: u32,
        available: u32,
    },

    #[error("ring buffer storage has {available} slots, layout needs {needed}")]
    RingBufferTooSmall { needed: usize, available: usize },
}

pub type EngineResult<T> = Result<T, EngineError>;
