// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Section image operations — cut vertical sections out of a rendered page,
// paint over suppressed noise, and crop to content bounds.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use spaltwerk_core::BoundingBox;
use tracing::{debug, instrument};

/// One vertical section of a rendered page.
///
/// Operations consume `self` and return the transformed section, so they chain:
///
/// ```ignore
/// let cropped = SectionImage::cut(&page, 0, 812)
///     .erase(&noise_boxes)
///     .crop(bounds);
/// ```
#[derive(Debug, Clone)]
pub struct SectionImage {
    image: RgbImage,
}

impl SectionImage {
    /// Copy columns `[start, end)` of `page`, full height. Clamped to the page.
    pub fn cut(page: &RgbImage, start: u32, end: u32) -> Self {
        let end = end.min(page.width());
        let start = start.min(end);
        let image =
            image::imageops::crop_imm(page, start, 0, end - start, page.height()).to_image();
        Self { image }
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_rgb(self) -> RgbImage {
        self.image
    }

    /// Paint each box white.
    #[instrument(skip_all, fields(boxes = boxes.len()))]
    pub fn erase(mut self, boxes: &[BoundingBox]) -> Self {
        for bbox in boxes.iter().filter(|bbox| !bbox.is_empty()) {
            let rect = Rect::at(bbox.left as i32, bbox.top as i32)
                .of_size(bbox.width(), bbox.height());
            draw_filled_rect_mut(&mut self.image, rect, Rgb([255, 255, 255]));
        }
        self
    }

    /// Crop to `bbox`, clamped to the image bounds.
    pub fn crop(self, bbox: BoundingBox) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let left = bbox.left.min(img_w);
        let top = bbox.top.min(img_h);
        let width = bbox.right.min(img_w).saturating_sub(left);
        let height = bbox.bottom.min(img_h).saturating_sub(top);

        debug!(left, top, width, height, "Cropping section to content");
        let image = image::imageops::crop_imm(&self.image, left, top, width, height).to_image();
        Self { image }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped_page() -> RgbImage {
        RgbImage::from_fn(90, 20, |x, _| Rgb([x as u8, 0, 0]))
    }

    #[test]
    fn cut_takes_requested_columns() {
        let section = SectionImage::cut(&striped_page(), 30, 60);
        assert_eq!((section.width(), section.height()), (30, 20));
        assert_eq!(section.as_rgb().get_pixel(0, 0).0[0], 30);
        assert_eq!(section.as_rgb().get_pixel(29, 5).0[0], 59);
    }

    #[test]
    fn cut_clamps_past_the_edge() {
        let section = SectionImage::cut(&striped_page(), 80, 200);
        assert_eq!(section.width(), 10);
    }

    #[test]
    fn erase_paints_boxes_white() {
        let ink = RgbImage::from_pixel(40, 40, Rgb([0, 0, 0]));
        let section = SectionImage::from_rgb(ink).erase(&[BoundingBox {
            left: 10,
            top: 10,
            right: 20,
            bottom: 15,
        }]);
        let image = section.as_rgb();
        assert_eq!(*image.get_pixel(10, 10), Rgb([255, 255, 255]));
        assert_eq!(*image.get_pixel(19, 14), Rgb([255, 255, 255]));
        assert_eq!(*image.get_pixel(20, 14), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(10, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn crop_is_clamped() {
        let section = SectionImage::from_rgb(striped_page()).crop(BoundingBox {
            left: 70,
            top: 5,
            right: 120,
            bottom: 50,
        });
        assert_eq!((section.width(), section.height()), (20, 15));
    }
}
