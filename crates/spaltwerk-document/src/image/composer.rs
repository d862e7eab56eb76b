// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Section composer — scales a cropped content region to fit a fixed-size
// canvas (keeping aspect ratio), centres it, and hands back the canvas ready
// for single-page encoding.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use spaltwerk_core::error::{Result, SpaltwerkError};
use spaltwerk_core::{BoundingBox, SplitConfig};
use tracing::{debug, instrument};

use crate::analysis::{ContentBlockDetector, intensity_grid};

const PAPER_WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// A finished output page: fixed canvas size, content centred.
#[derive(Debug, Clone)]
pub struct ComposedPage {
    canvas: RgbImage,
    /// Where the scaled content landed; `None` for a blank page.
    placement: Option<BoundingBox>,
}

impl ComposedPage {
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn is_blank(&self) -> bool {
        self.placement.is_none()
    }

    /// Canvas rectangle covered by the scaled content.
    pub fn placement(&self) -> Option<BoundingBox> {
        self.placement
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.canvas
    }

    pub fn into_image(self) -> RgbImage {
        self.canvas
    }
}

/// Places section content onto a fixed target canvas.
#[derive(Debug, Clone)]
pub struct SectionComposer {
    target_width: u32,
    target_height: u32,
    margin_fraction: f64,
    detector: ContentBlockDetector,
}

impl SectionComposer {
    pub fn new(target_width: u32, target_height: u32, margin_fraction: f64) -> Result<Self> {
        if target_width == 0 || target_height == 0 {
            return Err(SpaltwerkError::InvalidArgument(format!(
                "canvas of {target_width}x{target_height} is empty"
            )));
        }
        Ok(Self {
            target_width,
            target_height,
            margin_fraction,
            detector: ContentBlockDetector::default(),
        })
    }

    /// Composer sized from `config`'s page size and output resolution.
    pub fn from_config(config: &SplitConfig) -> Result<Self> {
        let (width, height) = config.target_dimensions();
        Ok(Self::new(width, height, config.margin_fraction)?
            .with_detector(ContentBlockDetector::new(config.detection.clone())))
    }

    pub fn with_detector(mut self, detector: ContentBlockDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Canvas dimensions `(width, height)`.
    pub fn target_dimensions(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    /// Margin in pixels on every side.
    pub fn margin(&self) -> u32 {
        let smaller = self.target_width.min(self.target_height) as f64;
        (smaller * self.margin_fraction).round() as u32
    }

    /// A white canvas of the target size.
    pub fn blank(&self) -> ComposedPage {
        ComposedPage {
            canvas: RgbImage::from_pixel(self.target_width, self.target_height, PAPER_WHITE),
            placement: None,
        }
    }

    /// Compose `region` onto the canvas.
    ///
    /// A region without detectable content yields a blank canvas. Otherwise
    /// the region is scaled by the largest factor that fits inside the
    /// margins and pasted centred.
    #[instrument(skip_all, fields(width = region.width(), height = region.height()))]
    pub fn compose(&self, region: &RgbImage) -> ComposedPage {
        if region.width() == 0 || region.height() == 0 {
            return self.blank();
        }
        if self.detector.detect(&intensity_grid(region)).is_empty() {
            debug!("No content in region, emitting blank page");
            return self.blank();
        }

        let (scaled_width, scaled_height) = self.fit(region.width(), region.height());
        let scaled = imageops::resize(region, scaled_width, scaled_height, FilterType::Lanczos3);

        let x = (self.target_width - scaled_width) / 2;
        let y = (self.target_height - scaled_height) / 2;
        let mut canvas = RgbImage::from_pixel(self.target_width, self.target_height, PAPER_WHITE);
        imageops::replace(&mut canvas, &scaled, x as i64, y as i64);

        debug!(scaled_width, scaled_height, x, y, "Section placed on canvas");
        ComposedPage {
            canvas,
            placement: Some(BoundingBox {
                left: x,
                top: y,
                right: x + scaled_width,
                bottom: y + scaled_height,
            }),
        }
    }

    /// Largest aspect-preserving size for `width` x `height` inside the margins.
    fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        let margin = self.margin();
        let available_width = self.target_width.saturating_sub(2 * margin).max(1);
        let available_height = self.target_height.saturating_sub(2 * margin).max(1);

        let scale = (available_width as f64 / width as f64)
            .min(available_height as f64 / height as f64);
        let scaled_width = ((width as f64 * scale).round() as u32).clamp(1, available_width);
        let scaled_height = ((height as f64 * scale).round() as u32).clamp(1, available_height);
        (scaled_width, scaled_height)
    }
}
