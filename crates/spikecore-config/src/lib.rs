// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Spikecore Configuration System
//!
//! Everything a core reads before its first timestep:
//! - the binary connectivity descriptor (sources, connectors, kernel weights)
//! - the core-parameter region (outgoing keys, ring-buffer sizing)
//! - TOML runtime options with environment and CLI overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use spikecore_config::{load_descriptor, load_options};
//!
//! let options = load_options(None, None).expect("Failed to load options");
//! let bytes = std::fs::read("core_0.bin").expect("Failed to read descriptor");
//! let descriptor = load_descriptor(&bytes, options.descriptor.layout)
//!     .expect("Invalid descriptor");
//! println!("{} sources", descriptor.sources.len());
//! ```
//!
//! The binary formats are produced upstream and are bit-exact; this crate
//! decodes them into owned containers and can encode them back for tests
//! and tools.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod descriptor;
pub mod loader;
pub mod params;
pub mod types;
pub mod validation;

pub use descriptor::{load_descriptor, Descriptor, DescriptorLayout};
pub use loader::{
    apply_cli_overrides, apply_environment_overrides, find_options_file, load_options,
    parse_options,
};
pub use params::CoreParameters;
pub use types::*;
pub use validation::{validate_descriptor, validate_options, OptionsValidationError};

/// Re-export for convenience
pub use serde;

/// Errors raised while loading descriptors, parameters or options
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{section} truncated: need {needed} bytes, {available} available")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Descriptor has no sources")]
    NoSources,

    #[error("Invalid {section} record {index}: {reason}")]
    InvalidRecord {
        section: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Options file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read options file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<toml::de::Error> for LoadError {
    fn from(err: toml::de::Error) -> Self {
        LoadError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LoadError::Truncated {
            section: "sources",
            needed: 40,
            available: 12,
        };
        assert_eq!(err.to_string(), "sources truncated: need 40 bytes, 12 available");
        assert_eq!(LoadError::NoSources.to_string(), "Descriptor has no sources");
    }

    #[test]
    fn test_default_options_compile() {
        let options = CoreOptions::default();
        assert_eq!(options.queue.capacity, 8192);
    }
}
