// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # spikecore
//!
//! Per-core event processing for spiking neural networks partitioned over
//! many small cores. Each core receives spike events identified by routing
//! keys, decodes which population and position sent them, and either
//! accumulates convolution-kernel weights into time-indexed ring buffers or
//! runs a winner-take-all arbitration across competing inputs.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! spikecore = "0.3"  # Default: config + burst-engine
//! ```
//!
//! ## Feature Flags
//!
//! - **`config`** (default): binary descriptor codec and TOML runtime options
//! - **`burst-engine`** (default): convolution and WTA cores
//! - **`observability`**: logging initialisation for host tools
//! - **`embedded`**: fixed-size ring buffers and transmitter without heap
//! - **`tools`**: the `spikecore-replay` binary
//!
//! ## Usage
//!
//! ```rust,no_run
//! use spikecore::prelude::*;
//!
//! # fn run(descriptor_bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let options = CoreOptions::default();
//! let (mut core, mut receiver) = ConvolutionCore::initialize(descriptor_bytes, None, &options)?;
//! let mut ring_buffers = VecRingBuffers::new(core.layout());
//!
//! // Receive context
//! receiver.on_event_received(0x0001_0004, 0);
//!
//! // Timestep context
//! let report = core.on_timestep_tick(0, &mut ring_buffers)?;
//! println!("processed {} events", report.processed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: spikecore-npu-neural (no_std)              │
//! │  (Coords, sources, connectors, division, saturation)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Runtime: spikecore-npu-runtime                         │
//! │  (SPSC spike queue, ring-buffer / transmitter traits)   │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Configuration: spikecore-config                        │
//! │  (Descriptor codec, core parameters, TOML options)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Algorithms: spikecore-npu-burst-engine                 │
//! │  (Key decode, kernel accumulation, WTA arbitration)     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

// Re-export foundation
pub use spikecore_npu_neural as neural;
pub use spikecore_npu_runtime as runtime;

#[cfg(feature = "config")]
pub use spikecore_config as config;

// Re-export algorithms
#[cfg(feature = "burst-engine")]
pub use spikecore_npu_burst_engine as burst_engine;

#[cfg(feature = "observability")]
pub use spikecore_observability as observability;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::neural::{Connector, Coord, KeyInfo, PostRegion, Shape, SourceInfo, SpikeEvent, Stride, S1615};
    pub use crate::runtime::{RecordingTransmitter, RingBufferStorage, SpikeTransmitter, VecRingBuffers};

    #[cfg(feature = "config")]
    pub use crate::config::{load_descriptor, load_options, CoreOptions, CoreParameters, Descriptor, DescriptorLayout};

    #[cfg(feature = "burst-engine")]
    pub use crate::burst_engine::{
        ConvolutionCore, EngineError, Provenance, SpikeReceiver, TickReport, WtaCore,
    };
}
