// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page analysis — gutter search, content block detection, and cross-section
// noise analysis. Everything here is a pure function of its input grid.

pub mod blocks;
pub mod group;
pub mod splits;

use image::RgbImage;
use spaltwerk_core::IntensityGrid;

pub use blocks::ContentBlockDetector;
pub use group::{SectionGroup, SectionGroupAnalyzer};
pub use splits::SplitPositionFinder;

/// Luminance weights applied to the R, G and B channels.
const LUMA_WEIGHTS: [f32; 3] = [0.2989, 0.5870, 0.1140];

/// Derive the brightness grid of an RGB image.
pub fn intensity_grid(image: &RgbImage) -> IntensityGrid {
    let (width, height) = image.dimensions();
    IntensityGrid::from_fn(width as usize, height as usize, |x, y| {
        let [r, g, b] = image.get_pixel(x as u32, y as u32).0;
        LUMA_WEIGHTS[0] * r as f32 + LUMA_WEIGHTS[1] * g as f32 + LUMA_WEIGHTS[2] * b as f32
    })
}

/// Centered moving average, zero padded, same length as the input.
pub(crate) fn moving_average_same(values: &[f32], window: usize) -> Vec<f32> {
    let window = window.max(1);
    let half = (window - 1) / 2;
    let prefix = prefix_sums(values);
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + window - half).min(values.len());
            (prefix[end] - prefix[start]) as f32 / window as f32
        })
        .collect()
}

/// Moving average over full windows only; `window - 1` shorter than the input.
pub(crate) fn moving_average_valid(values: &[f32], window: usize) -> Vec<f32> {
    let window = window.max(1);
    if values.len() < window {
        return Vec::new();
    }
    let prefix = prefix_sums(values);
    (0..=values.len() - window)
        .map(|i| ((prefix[i + window] - prefix[i]) / window as f64) as f32)
        .collect()
}

fn prefix_sums(values: &[f32]) -> Vec<f64> {
    let mut prefix = Vec::with_capacity(values.len() + 1);
    prefix.push(0.0);
    let mut running = 0.0f64;
    for &value in values {
        running += value as f64;
        prefix.push(running);
    }
    prefix
}
