// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Key Decoder
//!
//! Maps a routing key to the source population that sent it and the
//! sender's position in that population.
//!
//! A key is laid out, from high to low bits, as the source's fixed key bits
//! (under `mask`), the sending core's id (under `core_mask << mask_shift`),
//! the neuron id on that core, and `n_colour_bits` colour bits. The source
//! table is scanned in order and the first matching entry wins.
//!
//! Sources may be split over a grid of cores. The last core on a row and the
//! last core in a column may hold a narrower/shorter slice, so the per-core
//! shape used to unpack the neuron id depends on the core position.

use spikecore_npu_neural::{Coord, DivConst, SourceInfo, MAX_DIVIDEND};
use tracing::trace;

/// Decoded identity of a received key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedKey {
    /// Index of the matching source in the table
    pub source_index: usize,
    pub core_row: u32,
    pub core_col: u32,
    /// Neuron id on the sending core, colour bits removed
    pub local_id: u32,
    /// Neurons on the sending core (one delay stage)
    pub neurons_per_core: u32,
    /// Width of the sending core's slice
    pub source_width: u32,
    source_width_div: DivConst,
    /// Regular per-core shape, used to place the core in the population
    per_core_height: u32,
    per_core_width: u32,
}

impl ResolvedKey {
    /// Population coordinate of the sender for connectors at `delay_stage`
    ///
    /// Each delay stage owns a consecutive block of `neurons_per_core` ids on
    /// the sending core. Returns `None` when the neuron belongs to another
    /// stage.
    pub fn pre_coord(&self, delay_stage: u16) -> Option<Coord> {
        let first = self.neurons_per_core.checked_mul(delay_stage as u32)?;
        let last = first.checked_add(self.neurons_per_core)?;
        if self.local_id < first || self.local_id >= last {
            return None;
        }

        let local = self.local_id - first;
        if local > MAX_DIVIDEND {
            // Cores this large fail descriptor validation
            trace!(
                target: "spikecore-burst-engine",
                "[KEY] neuron {} beyond the width reciprocal range",
                local
            );
            return None;
        }
        let local_row = self.source_width_div.divide(local);
        let local_col = local - local_row * self.source_width;

        Some(Coord::new(
            (self.core_row * self.per_core_height + local_row) as i32,
            (self.core_col * self.per_core_width + local_col) as i32,
        ))
    }

    /// Population coordinate ignoring delay stages
    pub fn local_coord(&self) -> Option<Coord> {
        self.pre_coord(0)
    }
}

/// Ordered, read-only source table
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    sources: Vec<SourceInfo>,
}

impl SourceTable {
    pub fn new(sources: Vec<SourceInfo>) -> Self {
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SourceInfo> {
        self.sources.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceInfo> {
        self.sources.iter()
    }

    /// First source whose masked key matches
    #[inline]
    pub fn match_source(&self, key: u32) -> Option<(usize, &SourceInfo)> {
        self.sources
            .iter()
            .enumerate()
            .find(|(_, source)| source.key_info.matches(key))
    }

    /// Decode `key` into its source and sender position
    pub fn resolve(&self, key: u32) -> Option<ResolvedKey> {
        let (source_index, source) = self.match_source(key)?;
        let info = &source.key_info;

        let core_id = info.core_id(key);
        let core_row = source.cores_per_width_div.divide(core_id);
        let core_col = core_id - core_row * source.cores.width as u32;

        let last_on_row = core_col + 1 == source.cores.width as u32;
        let last_in_col = core_row + 1 == source.cores.height as u32;

        let (source_width, source_width_div) = if last_on_row {
            (source.last_core.width as u32, source.width_last_div)
        } else {
            (source.per_core.width as u32, source.width_div)
        };
        let source_height = if last_in_col {
            source.last_core.height as u32
        } else {
            source.per_core.height as u32
        };

        let local_id = info.local_id(key);

        trace!(
            target: "spikecore-burst-engine",
            "[KEY] 0x{:08x} -> source {} core {} ({}, {}) last=({}, {}) local {}",
            key,
            source_index,
            core_id,
            core_row,
            core_col,
            last_on_row,
            last_in_col,
            local_id
        );

        Some(ResolvedKey {
            source_index,
            core_row,
            core_col,
            local_id,
            neurons_per_core: source_width * source_height,
            source_width,
            source_width_div,
            per_core_height: source.per_core.height as u32,
            per_core_width: source.per_core.width as u32,
        })
    }

    /// Whether `key` belongs to a WTA reset source (first match decides)
    pub fn is_reset_key(&self, key: u32) -> bool {
        self.match_source(key)
            .map(|(_, source)| source.is_wta_reset)
            .unwrap_or(false)
    }

    /// Pairs of sources that some key would match both of
    ///
    /// The later source of each pair is unreachable for those keys.
    pub fn overlapping_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, a) in self.sources.iter().enumerate() {
            for (j, b) in self.sources.iter().enumerate().skip(i + 1) {
                let common = a.key_info.mask & b.key_info.mask;
                if (a.key_info.key ^ b.key_info.key) & common == 0 {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}
