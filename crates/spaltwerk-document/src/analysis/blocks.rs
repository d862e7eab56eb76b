// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content block detection — locates where ink sits inside a grid using 1-D
// row/column ink-density projections.
//
// This is an approximation of connected-component labelling, not a true 2-D
// segmentation: blocks are cut only along horizontal gaps, and every block
// spans the overall column extent of the content. Regions whose boxes overlap
// on one axis but not the other are merged.

use spaltwerk_core::{BoundingBox, ContentBlock, DetectionConfig, IntensityGrid};
use tracing::{debug, trace};

use super::moving_average_same;

/// Finds content blocks in an intensity grid. Never fails: a blank grid is an
/// empty result.
#[derive(Debug, Clone, Default)]
pub struct ContentBlockDetector {
    config: DetectionConfig,
}

impl ContentBlockDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect content blocks in `grid`.
    ///
    /// Returns a single block with `connected = true` when no row gap exceeds
    /// the gap threshold; otherwise one block per run of content rows,
    /// dropping runs with too little ink.
    pub fn detect(&self, grid: &IntensityGrid) -> Vec<ContentBlock> {
        if grid.is_empty() {
            return Vec::new();
        }

        let (row_density, col_density) = self.ink_density(grid);
        let window = self.config.smoothing_window;
        let content_rows = self.content_indices(&moving_average_same(&row_density, window));
        let content_cols = self.content_indices(&moving_average_same(&col_density, window));

        let (Some(&first_col), Some(&last_col)) = (content_cols.first(), content_cols.last())
        else {
            return Vec::new();
        };
        let (Some(&first_row), Some(&last_row)) = (content_rows.first(), content_rows.last())
        else {
            return Vec::new();
        };

        let runs = split_runs(&content_rows, self.config.gap_threshold);
        if runs.len() == 1 {
            let bbox = BoundingBox {
                left: first_col as u32,
                top: first_row as u32,
                right: last_col as u32 + 1,
                bottom: last_row as u32 + 1,
            };
            let block = self.block(grid, bbox, true);
            debug!(?bbox, pixels = block.content_pixel_count, "Connected content");
            return vec![block];
        }

        let blocks: Vec<ContentBlock> = runs
            .iter()
            .filter_map(|&(top, bottom)| {
                let bbox = BoundingBox {
                    left: first_col as u32,
                    top: top as u32,
                    right: last_col as u32 + 1,
                    bottom: bottom as u32 + 1,
                };
                if bbox.is_empty() {
                    return None;
                }
                let block = self.block(grid, bbox, false);
                if block.content_pixel_count < self.config.min_content_pixels {
                    trace!(?bbox, pixels = block.content_pixel_count, "Dropping sparse run");
                    return None;
                }
                Some(block)
            })
            .collect();

        debug!(runs = runs.len(), blocks = blocks.len(), "Content blocks detected");
        blocks
    }

    /// Union of all detected block boxes, if any.
    pub fn content_bounds(&self, grid: &IntensityGrid) -> Option<BoundingBox> {
        union_bounds(&self.detect(grid))
    }

    /// Fraction of ink pixels per row and per column.
    fn ink_density(&self, grid: &IntensityGrid) -> (Vec<f32>, Vec<f32>) {
        let threshold = self.config.blank_threshold;
        let mut row_counts = vec![0u32; grid.height()];
        let mut col_counts = vec![0u32; grid.width()];
        for (y, row) in grid.rows().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                if value < threshold {
                    row_counts[y] += 1;
                    col_counts[x] += 1;
                }
            }
        }
        let width = grid.width() as f32;
        let height = grid.height() as f32;
        (
            row_counts.iter().map(|&count| count as f32 / width).collect(),
            col_counts.iter().map(|&count| count as f32 / height).collect(),
        )
    }

    fn content_indices(&self, smoothed: &[f32]) -> Vec<usize> {
        smoothed
            .iter()
            .enumerate()
            .filter(|(_, density)| **density > self.config.density_threshold)
            .map(|(index, _)| index)
            .collect()
    }

    fn block(&self, grid: &IntensityGrid, bbox: BoundingBox, connected: bool) -> ContentBlock {
        ContentBlock {
            bbox,
            area: bbox.area(),
            content_pixel_count: count_ink(grid, &bbox, self.config.blank_threshold),
            center: bbox.center(),
            connected,
        }
    }
}

/// Smallest box covering every block.
pub fn union_bounds(blocks: &[ContentBlock]) -> Option<BoundingBox> {
    blocks
        .iter()
        .map(|block| block.bbox)
        .reduce(|acc, bbox| acc.union(&bbox))
}

/// Split sorted indices into inclusive `(first, last)` runs wherever two
/// neighbours are more than `gap` apart.
fn split_runs(indices: &[usize], gap: usize) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let Some(&first) = indices.first() else {
        return runs;
    };
    let mut start = first;
    let mut previous = first;
    for &index in &indices[1..] {
        if index - previous > gap {
            runs.push((start, previous));
            start = index;
        }
        previous = index;
    }
    runs.push((start, previous));
    runs
}

fn count_ink(grid: &IntensityGrid, bbox: &BoundingBox, threshold: f32) -> u64 {
    (bbox.top as usize..bbox.bottom as usize)
        .map(|y| {
            grid.row(y)[bbox.left as usize..bbox.right as usize]
                .iter()
                .filter(|&&value| value < threshold)
                .count() as u64
        })
        .sum()
}
