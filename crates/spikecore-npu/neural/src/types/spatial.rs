// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spatial types for 2-D neuron grids
//!
//! Coordinates are signed so intermediate values produced while sweeping a
//! kernel can step below zero before being range-checked.

/// (row, col) position in a 2-D neuron grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    #[inline]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

/// Height and width of a grid or kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    pub height: u16,
    pub width: u16,
}

impl Shape {
    #[inline]
    pub const fn new(height: u16, width: u16) -> Self {
        Self { height, width }
    }

    /// Number of cells (`height * width`)
    #[inline]
    pub const fn area(&self) -> u32 {
        self.height as u32 * self.width as u32
    }
}

/// Row and column step of a convolution or pooling stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Stride {
    pub row: u16,
    pub col: u16,
}

impl Stride {
    pub const UNIT: Stride = Stride { row: 1, col: 1 };

    #[inline]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

impl Default for Stride {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Rectangle of the post-synaptic grid owned by one core
///
/// `start` and `end` are inclusive global coordinates. `shape` is the local
/// extent used to linearise neuron indices (row-major).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PostRegion {
    pub start: Coord,
    pub end: Coord,
    pub shape: Shape,
}

impl PostRegion {
    /// Region covering `shape` cells starting at `start`
    pub fn from_origin(start: Coord, shape: Shape) -> Self {
        Self {
            start,
            end: Coord::new(
                start.row + shape.height as i32 - 1,
                start.col + shape.width as i32 - 1,
            ),
            shape,
        }
    }

    #[inline]
    pub fn contains_row(&self, row: i32) -> bool {
        row >= self.start.row && row <= self.end.row
    }

    #[inline]
    pub fn contains_col(&self, col: i32) -> bool {
        col >= self.start.col && col <= self.end.col
    }

    #[inline]
    pub fn contains(&self, coord: Coord) -> bool {
        self.contains_row(coord.row) && self.contains_col(coord.col)
    }

    /// Local row-major neuron index of a global coordinate inside the region
    #[inline]
    pub fn neuron_index(&self, coord: Coord) -> Option<u32> {
        if !self.contains(coord) {
            return None;
        }
        let local_row = (coord.row - self.start.row) as u32;
        let local_col = (coord.col - self.start.col) as u32;
        Some(local_row * self.shape.width as u32 + local_col)
    }

    /// Neurons addressed by this region
    #[inline]
    pub fn n_neurons(&self) -> u32 {
        self.shape.area()
    }
}
