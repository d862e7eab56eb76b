// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Spaltwerk.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpaltwerkError};

/// Per-pixel brightness of a rendered page (0 = ink, 255 = blank paper).
///
/// Stored row-major. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityGrid {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl IntensityGrid {
    /// Wrap a row-major buffer. Fails if the buffer length does not match.
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> Result<Self> {
        if values.len() != width * height {
            return Err(SpaltwerkError::InvalidArgument(format!(
                "grid of {width}x{height} needs {} values, got {}",
                width * height,
                values.len()
            )));
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Build a grid by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            values,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    /// One row of the grid.
    pub fn row(&self, y: usize) -> &[f32] {
        &self.values[y * self.width..(y + 1) * self.width]
    }

    /// Iterate over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on a zero chunk size.
        self.values.chunks_exact(self.width.max(1))
    }

    /// Copy of the column band `[start, end)`, clamped to the grid width.
    pub fn column_band(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.width);
        let start = start.min(end);
        let mut values = Vec::with_capacity((end - start) * self.height);
        for row in self.rows() {
            values.extend_from_slice(&row[start..end]);
        }
        Self {
            width: end - start,
            height: if end > start { self.height } else { 0 },
            values,
        }
    }
}

/// Axis-aligned pixel rectangle. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Geometric center `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.left as f64 + self.right as f64) / 2.0,
            (self.top as f64 + self.bottom as f64) / 2.0,
        )
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// One spatially coherent region of non-blank pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub bbox: BoundingBox,
    pub area: u64,
    /// Pixels inside `bbox` darker than the blank threshold.
    pub content_pixel_count: u64,
    /// Center of `bbox`, in the coordinates of the grid it was found in.
    pub center: (f64, f64),
    /// All content forms one unbroken mass; never split or filtered.
    pub connected: bool,
}

/// Number of sections each page is cut into. Only 2 and 3 are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct SplitCount(usize);

impl SplitCount {
    pub const TWO: Self = Self(2);
    pub const THREE: Self = Self(3);

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for SplitCount {
    fn default() -> Self {
        Self::THREE
    }
}

impl TryFrom<usize> for SplitCount {
    type Error = SpaltwerkError;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            2 | 3 => Ok(Self(value)),
            other => Err(SpaltwerkError::InvalidArgument(format!(
                "number of splits must be 2 or 3, got {other}"
            ))),
        }
    }
}

impl From<SplitCount> for usize {
    fn from(value: SplitCount) -> Self {
        value.0
    }
}

impl std::fmt::Display for SplitCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Column offsets dividing one page into sections. Strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPlan {
    offsets: Vec<u32>,
}

impl SplitPlan {
    /// Accepts only strictly increasing offsets inside `(0, width)`.
    pub fn new(offsets: Vec<u32>, width: u32) -> Result<Self> {
        let increasing = offsets.windows(2).all(|pair| pair[0] < pair[1]);
        let interior = offsets.iter().all(|&offset| offset > 0 && offset < width);
        if !increasing || !interior {
            return Err(SpaltwerkError::InvalidArgument(format!(
                "split offsets {offsets:?} are not strictly increasing inside width {width}"
            )));
        }
        Ok(Self { offsets })
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Number of sections this plan produces.
    pub fn section_count(&self) -> usize {
        self.offsets.len() + 1
    }

    /// Half-open column ranges `[start, end)` of every section for a page of `width`.
    pub fn section_ranges(&self, width: u32) -> Vec<(u32, u32)> {
        let mut ranges = Vec::with_capacity(self.section_count());
        let mut start = 0;
        for &offset in &self.offsets {
            ranges.push((start, offset));
            start = offset;
        }
        ranges.push((start, width));
        ranges
    }
}

/// Cross-section result identifying dominant and isolated content on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAnalysis {
    /// Section holding the block with the most ink.
    pub main_section: usize,
    /// Section holding the block farthest from the dominant one.
    pub farthest_section: usize,
    /// Blocks at least this far from the dominant block count as isolated.
    pub distance_threshold: f64,
    /// Ink pixel count of the dominant block.
    pub dominant_pixels: u64,
    /// Center of the dominant block, in page coordinates.
    pub dominant_center: (f64, f64),
}

/// Outcome of splitting one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReport {
    pub input_pages: usize,
    pub output_pages: usize,
    /// Pages processed concurrently.
    pub workers: usize,
    pub splits: SplitCount,
}
