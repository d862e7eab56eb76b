// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gutter search — picks the column offsets that best line up with vertical
// whitespace near the even division points of a page.

use spaltwerk_core::error::{Result, SpaltwerkError};
use spaltwerk_core::{IntensityGrid, SplitCount, SplitPlan};
use tracing::debug;

use super::moving_average_valid;

/// Locates split offsets from column brightness.
#[derive(Debug, Clone)]
pub struct SplitPositionFinder {
    /// Moving-average window applied to column means.
    smoothing_window: usize,
    /// Half-width of each search window as a fraction of one segment.
    search_fraction: f64,
}

impl Default for SplitPositionFinder {
    fn default() -> Self {
        Self {
            smoothing_window: 5,
            search_fraction: 0.10,
        }
    }
}

impl SplitPositionFinder {
    pub fn new(smoothing_window: usize, search_fraction: f64) -> Self {
        Self {
            smoothing_window: smoothing_window.max(1),
            search_fraction,
        }
    }

    /// Find `num_splits - 1` split offsets for `grid`.
    ///
    /// The smoothed brightness profile is `window - 1` columns shorter than the
    /// page (no edge padding), so every offset indexes the page width minus
    /// that trim. Ties resolve to the leftmost column.
    pub fn find_split_positions(
        &self,
        grid: &IntensityGrid,
        num_splits: usize,
    ) -> Result<SplitPlan> {
        let count = SplitCount::try_from(num_splits)?;
        self.find(grid, count)
    }

    /// Same as [`find_split_positions`](Self::find_split_positions) with a
    /// pre-validated count.
    pub fn find(&self, grid: &IntensityGrid, count: SplitCount) -> Result<SplitPlan> {
        if grid.is_empty() {
            return Err(SpaltwerkError::InvalidArgument(
                "empty intensity grid provided".into(),
            ));
        }

        let smoothed = moving_average_valid(&column_means(grid), self.smoothing_window);
        let splits = count.get();
        let width = smoothed.len();
        let segment = width / splits;
        if segment == 0 {
            return Err(SpaltwerkError::InvalidArgument(format!(
                "grid of width {} is too narrow for {splits} sections",
                grid.width()
            )));
        }

        let reach = (segment as f64 * self.search_fraction) as usize;
        let offsets: Vec<u32> = (1..splits)
            .map(|i| {
                let target = i * segment;
                let start = target.saturating_sub(reach);
                let end = (target + reach).min(width).max(start + 1);
                let best = argmax(&smoothed[start..end]);
                debug!(target, start, end, offset = start + best, "Gutter located");
                (start + best) as u32
            })
            .collect();

        SplitPlan::new(offsets, grid.width() as u32)
    }
}

/// Mean brightness of each column.
fn column_means(grid: &IntensityGrid) -> Vec<f32> {
    let mut sums = vec![0.0f64; grid.width()];
    for row in grid.rows() {
        for (sum, &value) in sums.iter_mut().zip(row) {
            *sum += value as f64;
        }
    }
    let height = grid.height() as f64;
    sums.into_iter().map(|sum| (sum / height) as f32).collect()
}

/// Index of the first maximum.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (index, &value) in values.iter().enumerate() {
        if value > values[best] {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1000x800 page with three horizontal text bands.
    fn banded_page() -> IntensityGrid {
        IntensityGrid::from_fn(800, 1000, |x, y| {
            let in_band = [(100, 200), (400, 500), (700, 800)]
                .iter()
                .any(|&(top, bottom)| (top..bottom).contains(&y));
            if in_band && (100..700).contains(&x) { 0.0 } else { 255.0 }
        })
    }

    fn assert_valid(plan: &SplitPlan, splits: usize, width: usize) {
        let offsets = plan.offsets();
        assert_eq!(offsets.len(), splits - 1);
        assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(offsets.iter().all(|&offset| offset > 0 && (offset as usize) < width));
    }

    #[test]
    fn two_splits_give_one_offset() {
        let plan = SplitPositionFinder::default()
            .find_split_positions(&banded_page(), 2)
            .unwrap();
        assert_valid(&plan, 2, 800);
    }

    #[test]
    fn three_splits_give_two_ordered_offsets() {
        let plan = SplitPositionFinder::default()
            .find_split_positions(&banded_page(), 3)
            .unwrap();
        assert_valid(&plan, 3, 800);
        assert_eq!(plan.section_count(), 3);
    }

    #[test]
    fn blank_page_still_splits() {
        let white = IntensityGrid::from_fn(800, 1000, |_, _| 255.0);
        let plan = SplitPositionFinder::default()
            .find_split_positions(&white, 2)
            .unwrap();
        assert_valid(&plan, 2, 800);
    }

    #[test]
    fn dark_page_still_splits() {
        let black = IntensityGrid::from_fn(800, 1000, |_, _| 0.0);
        let plan = SplitPositionFinder::default()
            .find_split_positions(&black, 3)
            .unwrap();
        assert_valid(&plan, 3, 800);
    }

    #[test]
    fn offset_lands_on_the_gutter() {
        // Two dark columns with a bright gutter at x in [380, 420).
        let grid = IntensityGrid::from_fn(800, 200, |x, _| {
            if (380..420).contains(&x) { 255.0 } else { 40.0 }
        });
        let plan = SplitPositionFinder::default()
            .find_split_positions(&grid, 2)
            .unwrap();
        let offset = plan.offsets()[0];
        assert!((376..420).contains(&offset), "offset {offset} misses the gutter");
    }

    #[test]
    fn identical_input_gives_identical_offsets() {
        let mut state = 0x2545_f491_u32;
        let noisy = IntensityGrid::from_fn(800, 300, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % 256) as f32
        });
        let finder = SplitPositionFinder::default();
        let first = finder.find_split_positions(&noisy, 2).unwrap();
        let second = finder.find_split_positions(&noisy, 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_unsupported_split_counts() {
        let finder = SplitPositionFinder::default();
        for splits in [0, 1, 4] {
            assert!(matches!(
                finder.find_split_positions(&banded_page(), splits),
                Err(SpaltwerkError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn rejects_empty_grid() {
        let empty = IntensityGrid::from_fn(0, 0, |_, _| 0.0);
        assert!(matches!(
            SplitPositionFinder::default().find_split_positions(&empty, 2),
            Err(SpaltwerkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn narrow_grid_still_orders_offsets() {
        let grid = IntensityGrid::from_fn(12, 4, |_, _| 255.0);
        let plan = SplitPositionFinder::default()
            .find(&grid, SplitCount::THREE)
            .unwrap();
        assert_valid(&plan, 3, 12);
    }
}
