// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Binary connectivity descriptor
//!
//! Little-endian, no padding beyond natural field widths:
//!
//! ```text
//! header      24 bytes   post_start (row, col), post_end (row, col),
//!                        post_shape (height, width) as i16;
//!                        n_sources, n_connectors, n_weights as u32
//! sources     n_sources    x 40 bytes (44 in the WTA layout)
//! connectors  n_connectors x 40 bytes (44 in the WTA layout)
//! weights     n_weights    x i16, padded to an even count
//! ```
//!
//! Decoding is one pass into three owned containers; only the ordering of
//! the sections is kept from the blob.

use std::mem::size_of;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::validation::validate_descriptor;
use crate::{ConfigResult, LoadError};
use spikecore_npu_neural::{
    Connector, Coord, DivConst, KeyInfo, PostRegion, Shape, SourceInfo, Stride, NO_SYNAPSE_TYPE,
};

/// Header: three i16 coordinate pairs followed by three u32 counts
pub const HEADER_BYTES: usize = 6 * size_of::<i16>() + 3 * size_of::<u32>();

/// Source record: key, mask, four packed words, three reciprocal words
const SOURCE_BASE_BYTES: usize = 10 * size_of::<u32>();

/// Connector record: twelve 16-bit fields, four reciprocal words
const CONNECTOR_BASE_BYTES: usize = 12 * size_of::<u16>() + 4 * size_of::<u32>();

/// WTA layout appends one word to each source and each connector record
const WTA_EXTRA_BYTES: usize = size_of::<u32>();

const KEY_START_MASK: u32 = 0x1FFF;
const KEY_COLOUR_SHIFT: u32 = 13;
const KEY_COLOUR_MASK: u32 = 0x7;
const BITS_PER_SHORT: u32 = 16;

/// Record layout variant of the descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorLayout {
    /// Plain convolution records
    #[default]
    Convolution,
    /// Records extended with WTA reset fields
    Wta,
}

impl DescriptorLayout {
    pub const fn source_record_bytes(self) -> usize {
        match self {
            DescriptorLayout::Convolution => SOURCE_BASE_BYTES,
            DescriptorLayout::Wta => SOURCE_BASE_BYTES + WTA_EXTRA_BYTES,
        }
    }

    pub const fn connector_record_bytes(self) -> usize {
        match self {
            DescriptorLayout::Convolution => CONNECTOR_BASE_BYTES,
            DescriptorLayout::Wta => CONNECTOR_BASE_BYTES + WTA_EXTRA_BYTES,
        }
    }
}

/// Decoded connectivity for one core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub layout: DescriptorLayout,
    pub post: PostRegion,
    pub sources: Vec<SourceInfo>,
    pub connectors: Vec<Connector>,
    pub weights: Vec<i16>,
}

impl Descriptor {
    /// Decode without semantic validation
    ///
    /// Bytes past the weight section are ignored (regions are allocated
    /// with slack).
    pub fn decode(bytes: &[u8], layout: DescriptorLayout) -> ConfigResult<Self> {
        let header = section(bytes, 0, HEADER_BYTES, "header")?;
        let short = |i: usize| LittleEndian::read_i16(&header[i * 2..i * 2 + 2]);
        let count = |i: usize| LittleEndian::read_u32(&header[12 + i * 4..16 + i * 4]) as usize;

        let start = Coord::new(short(0) as i32, short(1) as i32);
        let end = Coord::new(short(2) as i32, short(3) as i32);
        let shape = Shape::new(
            non_negative(short(4), "header", 0, "post_shape.height")?,
            non_negative(short(5), "header", 0, "post_shape.width")?,
        );
        let n_sources = count(0);
        let n_connectors = count(1);
        let n_weights = count(2);

        if n_sources == 0 {
            return Err(LoadError::NoSources);
        }

        let mut offset = HEADER_BYTES;

        let source_bytes = layout.source_record_bytes();
        let sources_section = section(
            bytes,
            offset,
            checked_len(n_sources, source_bytes),
            "sources",
        )?;
        let sources = sources_section
            .chunks_exact(source_bytes)
            .map(|record| decode_source(record, layout))
            .collect::<Vec<_>>();
        offset += sources_section.len();

        let connector_bytes = layout.connector_record_bytes();
        let connectors_section = section(
            bytes,
            offset,
            checked_len(n_connectors, connector_bytes),
            "connectors",
        )?;
        let connectors = connectors_section
            .chunks_exact(connector_bytes)
            .enumerate()
            .map(|(index, record)| decode_connector(record, index, layout))
            .collect::<ConfigResult<Vec<_>>>()?;
        offset += connectors_section.len();

        let weights_section = section(
            bytes,
            offset,
            checked_len(n_weights, size_of::<i16>()),
            "weights",
        )?;
        let mut weights = vec![0i16; n_weights];
        LittleEndian::read_i16_into(weights_section, &mut weights);

        Ok(Self {
            layout,
            post: PostRegion { start, end, shape },
            sources,
            connectors,
            weights,
        })
    }

    /// Size of the encoded descriptor, including weight padding
    pub fn number_of_bytes_needed(&self) -> usize {
        let padded_weights = self.weights.len() + self.weights.len() % 2;
        HEADER_BYTES
            + self.sources.len() * self.layout.source_record_bytes()
            + self.connectors.len() * self.layout.connector_record_bytes()
            + padded_weights * size_of::<i16>()
    }

    /// Encode into the upstream wire layout
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.number_of_bytes_needed()];

        let post = &self.post;
        let shorts = [
            post.start.row as i16,
            post.start.col as i16,
            post.end.row as i16,
            post.end.col as i16,
            post.shape.height as i16,
            post.shape.width as i16,
        ];
        LittleEndian::write_i16_into(&shorts, &mut bytes[0..12]);
        LittleEndian::write_u32(&mut bytes[12..16], self.sources.len() as u32);
        LittleEndian::write_u32(&mut bytes[16..20], self.connectors.len() as u32);
        LittleEndian::write_u32(&mut bytes[20..24], self.weights.len() as u32);

        let mut offset = HEADER_BYTES;
        let source_bytes = self.layout.source_record_bytes();
        for source in &self.sources {
            encode_source(source, self.layout, &mut bytes[offset..offset + source_bytes]);
            offset += source_bytes;
        }

        let connector_bytes = self.layout.connector_record_bytes();
        for connector in &self.connectors {
            encode_connector(
                connector,
                self.layout,
                &mut bytes[offset..offset + connector_bytes],
            );
            offset += connector_bytes;
        }

        let weight_bytes = self.weights.len() * size_of::<i16>();
        LittleEndian::write_i16_into(&self.weights, &mut bytes[offset..offset + weight_bytes]);
        // trailing pad short (if any) is already zero

        bytes
    }

    /// Connectors owned by a source (empty if the source index is unknown)
    pub fn connectors_for(&self, source_index: usize) -> &[Connector] {
        self.sources
            .get(source_index)
            .and_then(|source| self.connectors.get(source.key_info.connector_range()))
            .unwrap_or(&[])
    }
}

/// Decode and validate a descriptor, logging a summary
///
/// Fails when the descriptor is truncated, has no sources, or any record is
/// inconsistent. No partial descriptor is ever returned.
pub fn load_descriptor(bytes: &[u8], layout: DescriptorLayout) -> ConfigResult<Descriptor> {
    let descriptor = Descriptor::decode(bytes, layout).map_err(|err| {
        error!(target: "spikecore-config", "Descriptor decode failed: {}", err);
        err
    })?;

    if let Err(err) = validate_descriptor(&descriptor) {
        error!(target: "spikecore-config", "Descriptor rejected: {}", err);
        return Err(err);
    }

    let post = &descriptor.post;
    info!(
        target: "spikecore-config",
        "Loaded {:?} descriptor: post_start=({}, {}) post_end=({}, {}) post_shape={}x{}, {} sources, {} connectors, {} weights",
        layout,
        post.start.row,
        post.start.col,
        post.end.row,
        post.end.col,
        post.shape.height,
        post.shape.width,
        descriptor.sources.len(),
        descriptor.connectors.len(),
        descriptor.weights.len()
    );
    for (i, source) in descriptor.sources.iter().enumerate() {
        let k = &source.key_info;
        debug!(
            target: "spikecore-config",
            "Source {}: key=0x{:08x} mask=0x{:08x} start={} count={} core_mask=0x{:x} mask_shift={} per_core={}x{} last_core={}x{} cores={}x{} wta_reset={}",
            i,
            k.key,
            k.mask,
            k.start,
            k.count,
            k.core_mask,
            k.mask_shift,
            source.per_core.height,
            source.per_core.width,
            source.last_core.height,
            source.last_core.width,
            source.cores.height,
            source.cores.width,
            source.is_wta_reset
        );
    }
    for (i, connector) in descriptor.connectors.iter().enumerate() {
        debug!(
            target: "spikecore-config",
            "Connector {}: kernel={}x{} delay={} delay_stage={} kernel_index={}",
            i,
            connector.kernel.height,
            connector.kernel.width,
            connector.delay,
            connector.delay_stage,
            connector.kernel_index
        );
    }

    Ok(descriptor)
}

fn section<'a>(
    bytes: &'a [u8],
    offset: usize,
    len: usize,
    name: &'static str,
) -> ConfigResult<&'a [u8]> {
    let available = bytes.len().saturating_sub(offset);
    if available < len {
        return Err(LoadError::Truncated {
            section: name,
            needed: len,
            available,
        });
    }
    Ok(&bytes[offset..offset + len])
}

/// Section length; an overflowing count can never be satisfied
fn checked_len(count: usize, record_bytes: usize) -> usize {
    count.checked_mul(record_bytes).unwrap_or(usize::MAX)
}

fn non_negative(
    value: i16,
    section: &'static str,
    index: usize,
    field: &str,
) -> ConfigResult<u16> {
    u16::try_from(value).map_err(|_| LoadError::InvalidRecord {
        section,
        index,
        reason: format!("{} is negative ({})", field, value),
    })
}

#[inline]
fn split_halves(word: u32) -> (u16, u16) {
    ((word & 0xFFFF) as u16, (word >> BITS_PER_SHORT) as u16)
}

#[inline]
fn join_halves(low: u16, high: u16) -> u32 {
    (low as u32) | ((high as u32) << BITS_PER_SHORT)
}

fn decode_source(record: &[u8], layout: DescriptorLayout) -> SourceInfo {
    let word = |i: usize| LittleEndian::read_u32(&record[i * 4..i * 4 + 4]);

    let packed = word(2);
    let (core_mask, mask_shift) = split_halves(word(3));
    let key_info = KeyInfo {
        key: word(0),
        mask: word(1),
        start: (packed & KEY_START_MASK) as u16,
        n_colour_bits: ((packed >> KEY_COLOUR_SHIFT) & KEY_COLOUR_MASK) as u8,
        count: (packed >> BITS_PER_SHORT) as u16,
        core_mask,
        mask_shift,
    };

    let (height, width) = split_halves(word(4));
    let (height_last, width_last) = split_halves(word(5));
    let (cores_height, cores_width) = split_halves(word(6));

    SourceInfo {
        key_info,
        per_core: Shape::new(height, width),
        last_core: Shape::new(height_last, width_last),
        cores: Shape::new(cores_height, cores_width),
        width_div: DivConst::from_word(word(7)),
        width_last_div: DivConst::from_word(word(8)),
        cores_per_width_div: DivConst::from_word(word(9)),
        is_wta_reset: layout == DescriptorLayout::Wta && word(10) != 0,
    }
}

fn encode_source(source: &SourceInfo, layout: DescriptorLayout, record: &mut [u8]) {
    let k = &source.key_info;
    let packed = (k.start as u32 & KEY_START_MASK)
        | ((k.n_colour_bits as u32 & KEY_COLOUR_MASK) << KEY_COLOUR_SHIFT)
        | ((k.count as u32) << BITS_PER_SHORT);

    let mut words = vec![
        k.key,
        k.mask,
        packed,
        join_halves(k.core_mask, k.mask_shift),
        join_halves(source.per_core.height, source.per_core.width),
        join_halves(source.last_core.height, source.last_core.width),
        join_halves(source.cores.height, source.cores.width),
        source.width_div.to_word(),
        source.width_last_div.to_word(),
        source.cores_per_width_div.to_word(),
    ];
    if layout == DescriptorLayout::Wta {
        words.push(source.is_wta_reset as u32);
    }
    LittleEndian::write_u32_into(&words, record);
}

fn decode_connector(
    record: &[u8],
    index: usize,
    layout: DescriptorLayout,
) -> ConfigResult<Connector> {
    let half = |i: usize| LittleEndian::read_u16(&record[i * 2..i * 2 + 2]);
    let signed = |i: usize, field: &str| {
        non_negative(LittleEndian::read_i16(&record[i * 2..i * 2 + 2]), "connectors", index, field)
    };
    let div = |byte: usize| DivConst::from_word(LittleEndian::read_u32(&record[byte..byte + 4]));

    Ok(Connector {
        kernel: Shape::new(signed(0, "kernel.height")?, signed(1, "kernel.width")?),
        padding: Shape::new(signed(2, "padding.height")?, signed(3, "padding.width")?),
        positive_synapse_type: half(4),
        negative_synapse_type: half(5),
        trace_synapse_type: half(6),
        delay_stage: half(7),
        delay: half(8),
        kernel_index: half(9),
        strides: Stride::new(signed(10, "strides.row")?, signed(11, "strides.col")?),
        stride_row_div: div(24),
        stride_col_div: div(28),
        pool_stride_row_div: div(32),
        pool_stride_col_div: div(36),
        wta_reset_synapse_type: match layout {
            DescriptorLayout::Wta => half(20),
            DescriptorLayout::Convolution => NO_SYNAPSE_TYPE,
        },
    })
}

fn encode_connector(connector: &Connector, layout: DescriptorLayout, record: &mut [u8]) {
    let shorts = [
        connector.kernel.height,
        connector.kernel.width,
        connector.padding.height,
        connector.padding.width,
        connector.positive_synapse_type,
        connector.negative_synapse_type,
        connector.trace_synapse_type,
        connector.delay_stage,
        connector.delay,
        connector.kernel_index,
        connector.strides.row,
        connector.strides.col,
    ];
    LittleEndian::write_u16_into(&shorts, &mut record[0..24]);

    let words = [
        connector.stride_row_div.to_word(),
        connector.stride_col_div.to_word(),
        connector.pool_stride_row_div.to_word(),
        connector.pool_stride_col_div.to_word(),
    ];
    LittleEndian::write_u32_into(&words, &mut record[24..40]);

    if layout == DescriptorLayout::Wta {
        LittleEndian::write_u16(&mut record[40..42], connector.wta_reset_synapse_type);
        // record[42..44] stays zero
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(layout: DescriptorLayout) -> Descriptor {
        let key_info = KeyInfo {
            key: 0x0001_0000,
            mask: 0xFFFF_0000,
            start: 0,
            count: 1,
            n_colour_bits: 1,
            core_mask: 0x3,
            mask_shift: 8,
        };
        let source = SourceInfo::new(key_info, Shape::new(4, 5), Shape::new(4, 3), Shape::new(2, 2))
            .unwrap()
            .with_wta_reset(layout == DescriptorLayout::Wta);
        let connector = Connector::new(
            Shape::new(3, 3),
            Shape::new(1, 1),
            Stride::new(2, 1),
            Stride::UNIT,
            0,
        )
        .unwrap()
        .with_trace(2)
        .with_delay(3, 1);
        Descriptor {
            layout,
            post: PostRegion::from_origin(Coord::new(0, 4), Shape::new(3, 3)),
            sources: vec![source],
            connectors: vec![connector],
            weights: vec![1, -2, 3, 0, 5, -6, 7, 8, 9],
        }
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(HEADER_BYTES, 24);
        assert_eq!(DescriptorLayout::Convolution.source_record_bytes(), 40);
        assert_eq!(DescriptorLayout::Convolution.connector_record_bytes(), 40);
        assert_eq!(DescriptorLayout::Wta.source_record_bytes(), 44);
        assert_eq!(DescriptorLayout::Wta.connector_record_bytes(), 44);
    }

    #[test]
    fn test_header_field_order() {
        let bytes = sample(DescriptorLayout::Convolution).encode();
        assert_eq!(LittleEndian::read_i16(&bytes[0..2]), 0); // start.row
        assert_eq!(LittleEndian::read_i16(&bytes[2..4]), 4); // start.col
        assert_eq!(LittleEndian::read_i16(&bytes[4..6]), 2); // end.row
        assert_eq!(LittleEndian::read_i16(&bytes[6..8]), 6); // end.col
        assert_eq!(LittleEndian::read_u32(&bytes[12..16]), 1);
        assert_eq!(LittleEndian::read_u32(&bytes[16..20]), 1);
        assert_eq!(LittleEndian::read_u32(&bytes[20..24]), 9);
        // 9 weights are padded to 10 shorts
        assert_eq!(bytes.len(), 24 + 40 + 40 + 20);
    }

    #[test]
    fn test_source_word_packing() {
        let bytes = sample(DescriptorLayout::Convolution).encode();
        let source = &bytes[HEADER_BYTES..HEADER_BYTES + 40];
        // count << 16 | n_colour_bits << 13 | start
        assert_eq!(LittleEndian::read_u32(&source[8..12]), (1 << 16) | (1 << 13));
        // mask_shift << 16 | core_mask
        assert_eq!(LittleEndian::read_u32(&source[12..16]), (8 << 16) | 3);
        // width << 16 | height
        assert_eq!(LittleEndian::read_u32(&source[16..20]), (5 << 16) | 4);
    }

    #[test]
    fn test_decode_matches_encoded_layouts() {
        for layout in [DescriptorLayout::Convolution, DescriptorLayout::Wta] {
            let descriptor = sample(layout);
            let decoded = Descriptor::decode(&descriptor.encode(), layout).unwrap();
            assert_eq!(decoded, descriptor);
        }
    }

    #[test]
    fn test_wta_fields_only_in_wta_layout() {
        let mut descriptor = sample(DescriptorLayout::Wta);
        descriptor.connectors[0].wta_reset_synapse_type = 3;
        let decoded = Descriptor::decode(&descriptor.encode(), DescriptorLayout::Wta).unwrap();
        assert!(decoded.sources[0].is_wta_reset);
        assert_eq!(decoded.connectors[0].wta_reset_synapse_type, 3);
    }

    #[test]
    fn test_no_sources_fails_fast() {
        let mut bytes = vec![0u8; HEADER_BYTES];
        LittleEndian::write_u32(&mut bytes[16..20], 4);
        assert!(matches!(
            Descriptor::decode(&bytes, DescriptorLayout::Convolution),
            Err(LoadError::NoSources)
        ));
    }

    #[test]
    fn test_truncated_sections() {
        let bytes = sample(DescriptorLayout::Convolution).encode();

        let err = Descriptor::decode(&bytes[..10], DescriptorLayout::Convolution).unwrap_err();
        assert!(matches!(err, LoadError::Truncated { section: "header", needed: 24, available: 10 }));

        let err = Descriptor::decode(&bytes[..50], DescriptorLayout::Convolution).unwrap_err();
        assert!(matches!(err, LoadError::Truncated { section: "sources", needed: 40, available: 26 }));

        let err = Descriptor::decode(&bytes[..100], DescriptorLayout::Convolution).unwrap_err();
        assert!(matches!(err, LoadError::Truncated { section: "connectors", .. }));

        let err = Descriptor::decode(&bytes[..110], DescriptorLayout::Convolution).unwrap_err();
        assert!(matches!(err, LoadError::Truncated { section: "weights", needed: 18, available: 6 }));

        // padding short is optional, trailing slack is ignored
        assert!(Descriptor::decode(&bytes[..bytes.len() - 2], DescriptorLayout::Convolution).is_ok());
        let mut padded = bytes.clone();
        padded.extend_from_slice(&[0xAA; 16]);
        assert!(Descriptor::decode(&padded, DescriptorLayout::Convolution).is_ok());
    }

    #[test]
    fn test_huge_counts_are_truncation() {
        let mut bytes = vec![0u8; HEADER_BYTES];
        LittleEndian::write_u32(&mut bytes[12..16], u32::MAX);
        assert!(matches!(
            Descriptor::decode(&bytes, DescriptorLayout::Wta),
            Err(LoadError::Truncated { section: "sources", .. })
        ));
    }

    #[test]
    fn test_negative_kernel_rejected() {
        let mut bytes = sample(DescriptorLayout::Convolution).encode();
        let conn = HEADER_BYTES + 40;
        LittleEndian::write_i16(&mut bytes[conn..conn + 2], -3);
        let err = Descriptor::decode(&bytes, DescriptorLayout::Convolution).unwrap_err();
        assert!(matches!(err, LoadError::InvalidRecord { section: "connectors", index: 0, .. }));
    }

    #[test]
    fn test_connectors_for() {
        let descriptor = sample(DescriptorLayout::Convolution);
        assert_eq!(descriptor.connectors_for(0).len(), 1);
        assert!(descriptor.connectors_for(5).is_empty());
    }

    #[test]
    fn test_layout_toml_names() {
        #[derive(Deserialize)]
        struct Holder {
            layout: DescriptorLayout,
        }
        let holder: Holder = toml::from_str("layout = \"convolution\"").unwrap();
        assert_eq!(holder.layout, DescriptorLayout::Convolution);
    }
}
