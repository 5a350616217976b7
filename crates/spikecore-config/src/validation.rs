// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Options and descriptor validation
//!
//! Options errors are collected and reported together. Descriptor errors
//! stop at the first inconsistent record, since every later record would be
//! read relative to it.

use crate::{ConfigResult, CoreOptions, Descriptor, LoadError};
use spikecore_npu_neural::{Coord, PostRegion, MAX_DIVIDEND};

/// Widest ring buffer the options may describe (index bits)
pub const MAX_RING_BUFFER_BITS: u32 = 24;

/// Most neurons a sending core may hold (neuron ids are divided in 16 bits)
pub const MAX_NEURONS_PER_CORE: u32 = 1 << 16;

/// Largest population coordinate a source may span (signed 16-bit)
pub const MAX_POPULATION_COORD: u64 = i16::MAX as u64;

/// Errors that can occur during options validation
#[derive(Debug, Clone)]
pub enum OptionsValidationError {
    OutOfRange {
        field: String,
        value: u64,
        min: u64,
        max: u64,
    },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for OptionsValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => {
                write!(
                    f,
                    "{} = {} is outside valid range ({}-{})",
                    field, value, min, max
                )
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid option value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate runtime options
///
/// # Errors
///
/// Returns `LoadError::ValidationError` listing every problem found
pub fn validate_options(options: &CoreOptions) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_queue(options, &mut errors);
    validate_ring_buffer(options, &mut errors);

    if options.accumulation.trace_increment == 0 {
        errors.push(OptionsValidationError::InvalidValue {
            field: "accumulation.trace_increment".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(LoadError::ValidationError(format!(
            "Options validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_queue(options: &CoreOptions, errors: &mut Vec<OptionsValidationError>) {
    if options.queue.capacity == 0 {
        errors.push(OptionsValidationError::InvalidValue {
            field: "queue.capacity".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if options.queue.max_events_per_tick == Some(0) {
        errors.push(OptionsValidationError::InvalidValue {
            field: "queue.max_events_per_tick".to_string(),
            reason: "must be positive when set".to_string(),
        });
    }
}

fn validate_ring_buffer(options: &CoreOptions, errors: &mut Vec<OptionsValidationError>) {
    let rb = &options.ring_buffer;

    if !(1..=8).contains(&rb.delay_bits) {
        errors.push(OptionsValidationError::OutOfRange {
            field: "ring_buffer.delay_bits".to_string(),
            value: rb.delay_bits as u64,
            min: 1,
            max: 8,
        });
    }
    if rb.log_n_neurons > 16 {
        errors.push(OptionsValidationError::OutOfRange {
            field: "ring_buffer.log_n_neurons".to_string(),
            value: rb.log_n_neurons as u64,
            min: 0,
            max: 16,
        });
    }

    let total = rb.delay_bits as u64 + rb.log_n_neurons as u64 + rb.log_n_synapse_types as u64;
    if total > MAX_RING_BUFFER_BITS as u64 {
        errors.push(OptionsValidationError::InvalidValue {
            field: "ring_buffer".to_string(),
            reason: format!(
                "delay_bits + log_n_neurons + log_n_synapse_types = {} exceeds {}",
                total, MAX_RING_BUFFER_BITS
            ),
        });
    }
}

fn invalid(section: &'static str, index: usize, reason: String) -> LoadError {
    LoadError::InvalidRecord {
        section,
        index,
        reason,
    }
}

/// Validate a decoded descriptor
///
/// Checks the post region is self-consistent, every source owns a connector
/// range inside the table, every kernel fits in the weight table, and every
/// stored reciprocal agrees with the dimension it divides by.
///
/// Also keeps every value the decoder divides inside the 16-bit range the
/// reciprocals are exact for: at most [`MAX_NEURONS_PER_CORE`] neurons per
/// sending core, population coordinates up to [`MAX_POPULATION_COORD`], and
/// padded coordinates up to `MAX_DIVIDEND`.
///
/// # Errors
///
/// Returns `LoadError::NoSources` or `LoadError::InvalidRecord` for the
/// first problem found
pub fn validate_descriptor(descriptor: &Descriptor) -> ConfigResult<()> {
    if descriptor.sources.is_empty() {
        return Err(LoadError::NoSources);
    }

    validate_post_region(&descriptor.post)?;

    let n_connectors = descriptor.connectors.len();
    for (index, source) in descriptor.sources.iter().enumerate() {
        let k = &source.key_info;
        if k.key & !k.mask != 0 {
            return Err(invalid(
                "sources",
                index,
                format!("key 0x{:08x} has bits outside mask 0x{:08x}", k.key, k.mask),
            ));
        }
        if k.mask_shift >= 32 {
            return Err(invalid(
                "sources",
                index,
                format!("mask_shift {} exceeds key width", k.mask_shift),
            ));
        }
        let range = k.connector_range();
        if range.end > n_connectors {
            return Err(invalid(
                "sources",
                index,
                format!(
                    "connectors {}..{} outside table of {}",
                    range.start, range.end, n_connectors
                ),
            ));
        }
        if source.cores.height == 0 || source.cores.width == 0 {
            return Err(invalid("sources", index, "empty core grid".to_string()));
        }
        if !source.divisors_consistent() {
            return Err(invalid(
                "sources",
                index,
                "reciprocal constants disagree with dimensions".to_string(),
            ));
        }

        let per_core = source.max_neurons_per_core();
        if per_core > MAX_NEURONS_PER_CORE {
            return Err(invalid(
                "sources",
                index,
                format!(
                    "{} neurons per core exceeds {}",
                    per_core, MAX_NEURONS_PER_CORE
                ),
            ));
        }
        let (max_row, max_col) = source.max_coord();
        if max_row > MAX_POPULATION_COORD || max_col > MAX_POPULATION_COORD {
            return Err(invalid(
                "sources",
                index,
                format!(
                    "population reaches ({}, {}), beyond {}",
                    max_row, max_col, MAX_POPULATION_COORD
                ),
            ));
        }

        // Padded coordinates are divided by the stride reciprocals
        for connector_index in range {
            let padding = descriptor.connectors[connector_index].padding;
            let reach = max_row.max(max_col) + padding.height.max(padding.width) as u64;
            if reach > MAX_DIVIDEND as u64 {
                return Err(invalid(
                    "connectors",
                    connector_index,
                    format!(
                        "padded coordinate {} from source {} exceeds {}",
                        reach, index, MAX_DIVIDEND
                    ),
                ));
            }
        }
    }

    let n_weights = descriptor.weights.len();
    for (index, connector) in descriptor.connectors.iter().enumerate() {
        if connector.kernel.height == 0 || connector.kernel.width == 0 {
            return Err(invalid(
                "connectors",
                index,
                format!(
                    "empty kernel {}x{}",
                    connector.kernel.height, connector.kernel.width
                ),
            ));
        }
        let end = connector.kernel_index as usize + connector.kernel_len();
        if end > n_weights {
            return Err(invalid(
                "connectors",
                index,
                format!(
                    "kernel weights {}..{} outside table of {}",
                    connector.kernel_index, end, n_weights
                ),
            ));
        }
        if !connector.divisors_consistent() {
            return Err(invalid(
                "connectors",
                index,
                "reciprocal constants disagree with strides".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_post_region(post: &PostRegion) -> ConfigResult<()> {
    let expected_end = Coord::new(
        post.start.row + post.shape.height as i32 - 1,
        post.start.col + post.shape.width as i32 - 1,
    );
    if post.shape.height == 0 || post.shape.width == 0 || post.end != expected_end {
        return Err(invalid(
            "header",
            0,
            format!(
                "post region ({}, {})..=({}, {}) does not match shape {}x{}",
                post.start.row,
                post.start.col,
                post.end.row,
                post.end.col,
                post.shape.height,
                post.shape.width
            ),
        ));
    }
    Ok(())
}
