// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-capacity outgoing key buffer for embedded systems

use crate::traits::SpikeTransmitter;

/// Buffers up to `N` keys per flush; keys beyond that are refused and counted
pub struct FixedTransmitter<const N: usize> {
    keys: [u32; N],
    count: usize,
    refused: u32,
}

impl<const N: usize> FixedTransmitter<N> {
    pub const fn new() -> Self {
        Self {
            keys: [0; N],
            count: 0,
            refused: 0,
        }
    }

    /// Keys buffered since the last flush
    pub fn pending(&self) -> &[u32] {
        &self.keys[..self.count]
    }

    pub fn refused(&self) -> u32 {
        self.refused
    }

    /// Hand every buffered key to `send` and empty the buffer
    pub fn flush(&mut self, mut send: impl FnMut(u32)) {
        for key in &self.keys[..self.count] {
            send(*key);
        }
        self.count = 0;
    }
}

impl<const N: usize> Default for FixedTransmitter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SpikeTransmitter for FixedTransmitter<N> {
    fn emit(&mut self, key: u32) -> bool {
        if self.count == N {
            self.refused += 1;
            return false;
        }
        self.keys[self.count] = key;
        self.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_and_flush() {
        let mut tx = FixedTransmitter::<2>::new();
        assert!(tx.emit(10));
        assert!(tx.emit(11));
        assert!(!tx.emit(12));
        assert_eq!(tx.pending(), &[10, 11]);
        assert_eq!(tx.refused(), 1);

        let mut total = 0;
        tx.flush(|key| total += key);
        assert_eq!(total, 21);
        assert!(tx.pending().is_empty());
    }
}
