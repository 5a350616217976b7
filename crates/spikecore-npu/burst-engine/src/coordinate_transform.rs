// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pre-to-post coordinate mapping
//!
//! `pre` is pooled (divided by the pooling stride), shifted by the padding,
//! then divided by the convolution stride. The remainder of that last
//! division is where the kernel walk starts, so only taps that land on a
//! post neuron are visited. All divisions use the connector's precomputed
//! reciprocals and floor toward negative infinity.

use spikecore_npu_neural::{remainder, Connector, Coord};

/// Result of mapping one pre-synaptic coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostMapping {
    /// Post coordinate reached by the kernel's last tap
    pub post: Coord,
    /// First kernel offset (row, col) to visit
    pub kernel_start: Coord,
}

pub fn map_pre_to_post(connector: &Connector, pre: Coord) -> PostMapping {
    let padding = connector.padding_offset();

    let pooled_row = connector.pool_stride_row_div.divide_signed(pre.row) + padding.row;
    let pooled_col = connector.pool_stride_col_div.divide_signed(pre.col) + padding.col;

    let post_row = connector.stride_row_div.divide_signed(pooled_row);
    let post_col = connector.stride_col_div.divide_signed(pooled_col);

    PostMapping {
        post: Coord::new(post_row, post_col),
        kernel_start: Coord::new(
            remainder(pooled_row, connector.strides.row as i32, post_row),
            remainder(pooled_col, connector.strides.col as i32, post_col),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use spikecore_npu_neural::{Shape, Stride};

    fn connector(padding: u16, stride: u16, pool: u16) -> Connector {
        Connector::new(
            Shape::new(3, 3),
            Shape::new(padding, padding),
            Stride::new(stride, stride),
            Stride::new(pool, pool),
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_unit_stride_is_identity_plus_padding() {
        let m = map_pre_to_post(&connector(1, 1, 1), Coord::new(4, 7));
        assert_eq!(m.post, Coord::new(5, 8));
        assert_eq!(m.kernel_start, Coord::new(0, 0));
    }

    #[test]
    fn test_stride_remainder_is_kernel_start() {
        let m = map_pre_to_post(&connector(0, 2, 1), Coord::new(5, 4));
        assert_eq!(m.post, Coord::new(2, 2));
        assert_eq!(m.kernel_start, Coord::new(1, 0));
    }

    #[test]
    fn test_pooling_before_padding() {
        // (7 / 2) + 1 = 4, then 4 / 3 = 1 rem 1
        let m = map_pre_to_post(&connector(1, 3, 2), Coord::new(7, 7));
        assert_eq!(m.post, Coord::new(1, 1));
        assert_eq!(m.kernel_start, Coord::new(1, 1));
    }

    #[test]
    fn test_negative_dividend_floors() {
        let m = map_pre_to_post(&connector(0, 2, 1), Coord::new(-3, -1));
        assert_eq!(m.post, Coord::new(-2, -1));
        assert_eq!(m.kernel_start, Coord::new(1, 1));
    }

    proptest! {
        #[test]
        fn prop_matches_integer_arithmetic(
            row in 0i32..2000,
            col in 0i32..2000,
            padding in 0u16..8,
            stride in 1u16..8,
            pool in 1u16..8,
        ) {
            let m = map_pre_to_post(&connector(padding, stride, pool), Coord::new(row, col));
            let expect = |v: i32| {
                let pooled = v / pool as i32 + padding as i32;
                (pooled / stride as i32, pooled % stride as i32)
            };
            prop_assert_eq!((m.post.row, m.kernel_start.row), expect(row));
            prop_assert_eq!((m.post.col, m.kernel_start.col), expect(col));
        }
    }
}
