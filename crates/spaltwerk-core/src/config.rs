// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing configuration. Built once, then shared read-only by every stage.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpaltwerkError};

/// Thresholds used by the content block detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Pixels darker than this intensity count as ink.
    pub blank_threshold: f32,
    /// Smoothed ink density above which a row/column bears content.
    pub density_threshold: f32,
    /// Moving-average window, in pixels.
    pub smoothing_window: usize,
    /// Row gap, in pixels, that separates two blocks.
    pub gap_threshold: usize,
    /// Blocks with fewer ink pixels than this are noise.
    pub min_content_pixels: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            blank_threshold: 250.0,
            density_threshold: 0.01,
            smoothing_window: 5,
            gap_threshold: 50,
            min_content_pixels: 100,
        }
    }
}

/// Settings for a whole split run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Resolution source pages are rasterized at.
    pub render_dpi: u32,
    /// Resolution of the output canvas.
    pub output_ppi: u32,
    /// Output page width in inches.
    pub page_width_in: f64,
    /// Output page height in inches.
    pub page_height_in: f64,
    /// Refuse to rasterize pages larger than this many pixels.
    pub max_page_pixels: u64,
    pub detection: DetectionConfig,
    /// Half-width of the gutter search window, as a fraction of one segment.
    pub split_search_fraction: f64,
    /// Canvas margin, as a fraction of the smaller canvas dimension.
    pub margin_fraction: f64,
    /// Blocks under this fraction of the dominant block's ink may be dropped.
    pub noise_fraction: f64,
    /// Fraction of the maximum block distance beyond which a block is isolated.
    pub isolation_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            render_dpi: 250,
            output_ppi: 250,
            // A4
            page_width_in: 8.27,
            page_height_in: 11.69,
            max_page_pixels: 933_120_000,
            detection: DetectionConfig::default(),
            split_search_fraction: 0.10,
            margin_fraction: 0.03,
            noise_fraction: 0.10,
            isolation_fraction: 0.75,
        }
    }
}

impl SplitConfig {
    /// Load a JSON configuration file. Absent keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Override both render and output resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.render_dpi = dpi;
        self.output_ppi = dpi;
        self
    }

    /// Output canvas size in pixels: `(round(width_in * ppi), round(height_in * ppi))`.
    pub fn target_dimensions(&self) -> (u32, u32) {
        let ppi = self.output_ppi as f64;
        (
            (self.page_width_in * ppi).round() as u32,
            (self.page_height_in * ppi).round() as u32,
        )
    }

    /// Reject settings no stage can work with.
    pub fn validate(&self) -> Result<()> {
        if self.render_dpi == 0 || self.output_ppi == 0 {
            return Err(SpaltwerkError::ConfigError(
                "resolutions must be positive".into(),
            ));
        }
        if !(self.page_width_in > 0.0 && self.page_height_in > 0.0) {
            return Err(SpaltwerkError::ConfigError(format!(
                "page size {}x{} in is not positive",
                self.page_width_in, self.page_height_in
            )));
        }
        if self.detection.smoothing_window == 0 {
            return Err(SpaltwerkError::ConfigError(
                "smoothing window must be at least 1".into(),
            ));
        }
        if !(0.0..=255.0).contains(&self.detection.blank_threshold) {
            return Err(SpaltwerkError::ConfigError(format!(
                "blank_threshold must be in [0, 255], got {}",
                self.detection.blank_threshold
            )));
        }
        check_fraction(
            "density_threshold",
            self.detection.density_threshold as f64,
            1.0,
        )?;
        check_fraction("split_search_fraction", self.split_search_fraction, 0.25)?;
        check_fraction("margin_fraction", self.margin_fraction, 0.49)?;
        check_fraction("noise_fraction", self.noise_fraction, 1.0)?;
        check_fraction("isolation_fraction", self.isolation_fraction, 1.0)?;
        Ok(())
    }
}

fn check_fraction(name: &str, value: f64, max: f64) -> Result<()> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(SpaltwerkError::ConfigError(format!(
            "{name} must be in [0, {max}], got {value}"
        )))
    }
}
