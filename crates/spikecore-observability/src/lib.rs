// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # spikecore-observability
//!
//! Logging setup shared by spikecore host tools, with per-crate debug
//! flag support.
//!
//! Library crates only emit `tracing` events under their own targets; the
//! binary decides what to print by calling [`init_logging`] once.
//!
//! ## Features
//! - `file-logging`: also write the log to a file

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Log targets that accept per-crate debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "spikecore-config",
    "spikecore-burst-engine",
    "spikecore-replay",
];
