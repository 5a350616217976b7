// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transmitter that records every key it is handed

use std::vec::Vec;

use crate::traits::SpikeTransmitter;

/// Keeps emitted keys in order; optionally refuses keys past a limit
#[derive(Debug, Clone, Default)]
pub struct RecordingTransmitter {
    sent: Vec<u32>,
    limit: Option<usize>,
    refused: u32,
}

impl RecordingTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept at most `limit` keys, refusing the rest
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> &[u32] {
        &self.sent
    }

    pub fn refused(&self) -> u32 {
        self.refused
    }

    /// Take the recorded keys, leaving the transmitter empty
    pub fn take(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.sent)
    }
}

impl SpikeTransmitter for RecordingTransmitter {
    fn emit(&mut self, key: u32) -> bool {
        if self.limit.is_some_and(|limit| self.sent.len() >= limit) {
            self.refused += 1;
            return false;
        }
        self.sent.push(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec;

    #[test]
    fn test_records_in_order() {
        let mut tx = RecordingTransmitter::new();
        assert!(tx.emit(7));
        assert!(tx.emit(3));
        assert_eq!(tx.sent(), &[7, 3]);
        assert_eq!(tx.take(), vec![7, 3]);
        assert!(tx.sent().is_empty());
    }

    #[test]
    fn test_limit_refuses() {
        let mut tx = RecordingTransmitter::with_limit(1);
        assert!(tx.emit(1));
        assert!(!tx.emit(2));
        assert_eq!(tx.refused(), 1);
        assert_eq!(tx.sent(), &[1]);
    }
}
