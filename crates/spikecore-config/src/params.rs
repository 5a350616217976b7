// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core-parameter region
//!
//! ```text
//! u32 has_key, u32 n_neurons, u32 n_neurons_peak, u32 n_colour_bits,
//! u32 n_synapse_types, u32 ring_buffer_shifts[n_synapse_types],
//! u32 neuron_keys[n_neurons]
//! ```

use std::mem::size_of;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::{ConfigResult, LoadError};
use spikecore_npu_neural::RingBufferLayout;

const FIXED_WORDS: usize = 5;
const WORD: usize = size_of::<u32>();

/// Per-core neuron parameters shared with the neuron side
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoreParameters {
    /// Whether this core sends spikes at all
    pub has_key: bool,
    pub n_neurons: u32,
    /// Neuron count rounded for ring-buffer sizing
    pub n_neurons_peak: u32,
    pub n_colour_bits: u32,
    pub n_synapse_types: u32,
    pub ring_buffer_shifts: Vec<u32>,
    /// Outgoing key per neuron (meaningless when `has_key` is false)
    pub neuron_keys: Vec<u32>,
}

impl CoreParameters {
    pub fn decode(bytes: &[u8]) -> ConfigResult<Self> {
        let fixed = take(bytes, 0, FIXED_WORDS * WORD, "core parameters")?;
        let word = |i: usize| LittleEndian::read_u32(&fixed[i * WORD..(i + 1) * WORD]);

        let has_key = word(0) != 0;
        let n_neurons = word(1);
        let n_neurons_peak = word(2);
        let n_colour_bits = word(3);
        let n_synapse_types = word(4);

        if n_neurons > n_neurons_peak {
            return Err(LoadError::InvalidRecord {
                section: "core parameters",
                index: 0,
                reason: format!(
                    "n_neurons ({}) exceeds n_neurons_peak ({})",
                    n_neurons, n_neurons_peak
                ),
            });
        }

        let mut offset = FIXED_WORDS * WORD;
        let shifts_bytes = take(
            bytes,
            offset,
            (n_synapse_types as usize).saturating_mul(WORD),
            "ring buffer shifts",
        )?;
        let mut ring_buffer_shifts = vec![0u32; n_synapse_types as usize];
        LittleEndian::read_u32_into(shifts_bytes, &mut ring_buffer_shifts);
        offset += shifts_bytes.len();

        let keys_bytes = take(
            bytes,
            offset,
            (n_neurons as usize).saturating_mul(WORD),
            "neuron keys",
        )?;
        let mut neuron_keys = vec![0u32; n_neurons as usize];
        LittleEndian::read_u32_into(keys_bytes, &mut neuron_keys);

        Ok(Self {
            has_key,
            n_neurons,
            n_neurons_peak,
            n_colour_bits,
            n_synapse_types,
            ring_buffer_shifts,
            neuron_keys,
        })
    }

    pub fn number_of_bytes_needed(&self) -> usize {
        (FIXED_WORDS + self.ring_buffer_shifts.len() + self.neuron_keys.len()) * WORD
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut words = Vec::with_capacity(self.number_of_bytes_needed() / WORD);
        words.extend_from_slice(&[
            self.has_key as u32,
            self.n_neurons,
            self.n_neurons_peak,
            self.n_colour_bits,
            self.n_synapse_types,
        ]);
        words.extend_from_slice(&self.ring_buffer_shifts);
        words.extend_from_slice(&self.neuron_keys);

        let mut bytes = vec![0u8; words.len() * WORD];
        LittleEndian::write_u32_into(&words, &mut bytes);
        bytes
    }

    /// Ring-buffer layout sized by the peak neuron count and synapse type count
    pub fn ring_buffer_layout(&self, delay_bits: u32) -> RingBufferLayout {
        RingBufferLayout::for_counts(self.n_neurons_peak, self.n_synapse_types, delay_bits)
    }

    /// Outgoing key for a neuron, if this core transmits and the index is known
    pub fn neuron_key(&self, index: usize) -> Option<u32> {
        if !self.has_key {
            return None;
        }
        self.neuron_keys.get(index).copied()
    }
}

fn take<'a>(
    bytes: &'a [u8],
    offset: usize,
    len: usize,
    section: &'static str,
) -> ConfigResult<&'a [u8]> {
    let available = bytes.len().saturating_sub(offset);
    if available < len {
        return Err(LoadError::Truncated {
            section,
            needed: len,
            available,
        });
    }
    Ok(&bytes[offset..offset + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CoreParameters {
        CoreParameters {
            has_key: true,
            n_neurons: 3,
            n_neurons_peak: 4,
            n_colour_bits: 0,
            n_synapse_types: 3,
            ring_buffer_shifts: vec![0, 0, 0],
            neuron_keys: vec![0x100, 0x101, 0x102],
        }
    }

    #[test]
    fn test_decode_encoded() {
        let original = params();
        let bytes = original.encode();
        assert_eq!(bytes.len(), (5 + 3 + 3) * 4);
        assert_eq!(LittleEndian::read_u32(&bytes[0..4]), 1);
        assert_eq!(CoreParameters::decode(&bytes).unwrap(), original);
    }

    #[test]
    fn test_ring_buffer_layout_from_counts() {
        // 4 neurons -> 2 bits, 3 types -> 2 bits
        let layout = params().ring_buffer_layout(4);
        assert_eq!(layout, RingBufferLayout::new(2, 2, 4));
    }

    #[test]
    fn test_neuron_key_lookup() {
        let mut p = params();
        assert_eq!(p.neuron_key(2), Some(0x102));
        assert_eq!(p.neuron_key(3), None);
        p.has_key = false;
        assert_eq!(p.neuron_key(0), None);
    }

    #[test]
    fn test_truncated_keys() {
        let bytes = params().encode();
        let err = CoreParameters::decode(&bytes[..bytes.len() - 4]).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Truncated { section: "neuron keys", needed: 12, available: 8 }
        ));
    }

    #[test]
    fn test_rejects_more_neurons_than_peak() {
        let mut p = params();
        p.n_neurons_peak = 2;
        assert!(matches!(
            CoreParameters::decode(&p.encode()),
            Err(LoadError::InvalidRecord { .. })
        ));
    }
}
