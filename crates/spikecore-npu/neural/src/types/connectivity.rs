// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Source and connector records
//!
//! A *source* is one input population laid out over a grid of cores. Its
//! key/mask pair selects events from that population; the bits under
//! `core_mask << mask_shift` name the sending core, and the remaining
//! unmasked bits (above the colour bits) name the neuron on that core.
//!
//! A *connector* is one receptive field from a source onto the local
//! post-synaptic grid. Sources own a contiguous run of connectors.

use core::ops::Range;

use super::error::{NeuralError, Result};
use super::spatial::{Coord, Shape, Stride};
use crate::division::DivConst;

/// Synapse type value meaning "channel not configured"
pub const NO_SYNAPSE_TYPE: u16 = 0xFFFF;

/// Routing-key match and decomposition parameters for one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyInfo {
    pub key: u32,
    pub mask: u32,
    /// First connector owned by the source (13-bit field)
    pub start: u16,
    /// Number of connectors owned by the source
    pub count: u16,
    /// Low key bits used for colouring, ignored when extracting the neuron id (3-bit field)
    pub n_colour_bits: u8,
    /// Mask for the core id after shifting
    pub core_mask: u16,
    /// Shift to bring the core id down to bit 0
    pub mask_shift: u16,
}

impl KeyInfo {
    pub const MAX_START: u16 = (1 << 13) - 1;
    pub const MAX_COLOUR_BITS: u8 = 7;

    #[inline]
    pub fn matches(&self, key: u32) -> bool {
        (key & self.mask) == self.key
    }

    /// Id of the core that sent `key`
    #[inline]
    pub fn core_id(&self, key: u32) -> u32 {
        key.checked_shr(self.mask_shift as u32).unwrap_or(0) & self.core_mask as u32
    }

    /// Neuron id on the sending core, colour bits removed
    #[inline]
    pub fn local_id(&self, key: u32) -> u32 {
        let core_bits = (self.core_mask as u32)
            .checked_shl(self.mask_shift as u32)
            .unwrap_or(0);
        let local_mask = !(self.mask | core_bits);
        (key & local_mask) >> self.n_colour_bits
    }

    /// Indices into the connector table owned by this source
    #[inline]
    pub fn connector_range(&self) -> Range<usize> {
        let start = self.start as usize;
        start..start + self.count as usize
    }
}

/// One input population mapped onto a grid of cores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceInfo {
    pub key_info: KeyInfo,
    /// Neurons per core (regular cores)
    pub per_core: Shape,
    /// Height on the last core of a column, width on the last core of a row
    pub last_core: Shape,
    /// Core grid dimensions
    pub cores: Shape,
    pub width_div: DivConst,
    pub width_last_div: DivConst,
    pub cores_per_width_div: DivConst,
    /// Only meaningful in the WTA layout
    pub is_wta_reset: bool,
}

impl SourceInfo {
    /// Build a source and precompute its reciprocal constants
    pub fn new(key_info: KeyInfo, per_core: Shape, last_core: Shape, cores: Shape) -> Result<Self> {
        if key_info.start > KeyInfo::MAX_START {
            return Err(NeuralError::DimensionOutOfRange {
                field: "key_info.start",
                value: key_info.start as u32,
            });
        }
        if key_info.n_colour_bits > KeyInfo::MAX_COLOUR_BITS {
            return Err(NeuralError::DimensionOutOfRange {
                field: "key_info.n_colour_bits",
                value: key_info.n_colour_bits as u32,
            });
        }
        if cores.height == 0 {
            return Err(NeuralError::DimensionOutOfRange {
                field: "cores.height",
                value: 0,
            });
        }

        Ok(Self {
            key_info,
            per_core,
            last_core,
            cores,
            width_div: DivConst::new(per_core.width as u32)?,
            width_last_div: DivConst::new(last_core.width as u32)?,
            cores_per_width_div: DivConst::new(cores.width as u32)?,
            is_wta_reset: false,
        })
    }

    /// Single-core source: the whole population fits on one core
    pub fn single_core(key_info: KeyInfo, shape: Shape) -> Result<Self> {
        Self::new(key_info, shape, shape, Shape::new(1, 1))
    }

    pub fn with_wta_reset(mut self, is_wta_reset: bool) -> Self {
        self.is_wta_reset = is_wta_reset;
        self
    }

    /// Most neurons any one core of this source can hold
    ///
    /// Bounds the neuron id handed to the width reciprocal.
    pub fn max_neurons_per_core(&self) -> u32 {
        let height = self.per_core.height.max(self.last_core.height) as u32;
        let width = self.per_core.width.max(self.last_core.width) as u32;
        height * width
    }

    /// Largest population (row, col) a key of this source can decode to
    pub fn max_coord(&self) -> (u64, u64) {
        let span = |cores: u16, per_core: u16, last_core: u16| {
            let before_last = (cores as u64).saturating_sub(1) * per_core as u64;
            (before_last + last_core as u64).saturating_sub(1)
        };
        (
            span(self.cores.height, self.per_core.height, self.last_core.height),
            span(self.cores.width, self.per_core.width, self.last_core.width),
        )
    }

    /// Whether the stored reciprocals agree with the stored dimensions
    pub fn divisors_consistent(&self) -> bool {
        let expect = |value: u16, stored: DivConst| {
            DivConst::new(value as u32).map(|d| d == stored).unwrap_or(false)
        };
        expect(self.per_core.width, self.width_div)
            && expect(self.last_core.width, self.width_last_div)
            && expect(self.cores.width, self.cores_per_width_div)
    }
}

/// One receptive field between a source and the local post grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Connector {
    pub kernel: Shape,
    pub padding: Shape,
    pub positive_synapse_type: u16,
    pub negative_synapse_type: u16,
    /// `NO_SYNAPSE_TYPE` disables the presynaptic trace channel
    pub trace_synapse_type: u16,
    pub delay_stage: u16,
    pub delay: u16,
    /// Offset of this kernel in the shared weight table
    pub kernel_index: u16,
    pub strides: Stride,
    pub stride_row_div: DivConst,
    pub stride_col_div: DivConst,
    pub pool_stride_row_div: DivConst,
    pub pool_stride_col_div: DivConst,
    /// WTA layout only; `NO_SYNAPSE_TYPE` when absent
    pub wta_reset_synapse_type: u16,
}

impl Connector {
    /// Build a connector with excitatory type 0, inhibitory type 1, no trace
    /// channel, zero delay and the given geometry.
    pub fn new(
        kernel: Shape,
        padding: Shape,
        strides: Stride,
        pool_strides: Stride,
        kernel_index: u16,
    ) -> Result<Self> {
        if kernel.height == 0 || kernel.width == 0 {
            return Err(NeuralError::EmptyKernel {
                height: kernel.height,
                width: kernel.width,
            });
        }
        for (field, value) in [
            ("kernel.height", kernel.height),
            ("kernel.width", kernel.width),
            ("padding.height", padding.height),
            ("padding.width", padding.width),
            ("strides.row", strides.row),
            ("strides.col", strides.col),
        ] {
            // Wire fields are signed 16-bit
            if value > i16::MAX as u16 {
                return Err(NeuralError::DimensionOutOfRange {
                    field,
                    value: value as u32,
                });
            }
        }

        Ok(Self {
            kernel,
            padding,
            positive_synapse_type: 0,
            negative_synapse_type: 1,
            trace_synapse_type: NO_SYNAPSE_TYPE,
            delay_stage: 0,
            delay: 0,
            kernel_index,
            strides,
            stride_row_div: DivConst::new(strides.row as u32)?,
            stride_col_div: DivConst::new(strides.col as u32)?,
            pool_stride_row_div: DivConst::new(pool_strides.row as u32)?,
            pool_stride_col_div: DivConst::new(pool_strides.col as u32)?,
            wta_reset_synapse_type: NO_SYNAPSE_TYPE,
        })
    }

    pub fn with_synapse_types(mut self, positive: u16, negative: u16) -> Self {
        self.positive_synapse_type = positive;
        self.negative_synapse_type = negative;
        self
    }

    pub fn with_trace(mut self, trace_synapse_type: u16) -> Self {
        self.trace_synapse_type = trace_synapse_type;
        self
    }

    pub fn with_delay(mut self, delay: u16, delay_stage: u16) -> Self {
        self.delay = delay;
        self.delay_stage = delay_stage;
        self
    }

    #[inline]
    pub fn has_trace(&self) -> bool {
        self.trace_synapse_type != NO_SYNAPSE_TYPE
    }

    /// Weights per kernel (`height * width`)
    #[inline]
    pub fn kernel_len(&self) -> usize {
        self.kernel.area() as usize
    }

    /// Weight table index of kernel tap (`kr`, `kc`) for a given kernel base
    #[inline]
    pub fn weight_index(&self, kernel_base: usize, kr: u32, kc: u32) -> usize {
        kernel_base + (kr * self.kernel.width as u32 + kc) as usize
    }

    /// Padding added to the pooled pre coordinate
    #[inline]
    pub fn padding_offset(&self) -> Coord {
        Coord::new(self.padding.height as i32, self.padding.width as i32)
    }

    /// Whether the stored reciprocals agree with the stored strides.
    ///
    /// Pooling strides are not stored on the wire, so their reciprocals
    /// can only be checked for being well formed.
    pub fn divisors_consistent(&self) -> bool {
        let expect = |value: u16, stored: DivConst| {
            DivConst::new(value as u32).map(|d| d == stored).unwrap_or(false)
        };
        let well_formed = |d: DivConst| d.sh1 <= 1 && (d.sh2 as u32) < 16 && d.m != 0;
        expect(self.strides.row, self.stride_row_div)
            && expect(self.strides.col, self.stride_col_div)
            && well_formed(self.pool_stride_row_div)
            && well_formed(self.pool_stride_col_div)
    }
}
