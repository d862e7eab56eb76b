// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page pipeline — everything that happens to one source page: render, locate
// gutters, cut sections, suppress stray marks, compose, and encode.
//
// A pipeline holds no mutable state, so one instance is shared by every
// worker.

use image::RgbImage;
use spaltwerk_core::error::Result;
use spaltwerk_core::{BoundingBox, SplitConfig, SplitCount};
use tracing::{debug, info, instrument};

use crate::analysis::blocks::union_bounds;
use crate::analysis::{
    ContentBlockDetector, SectionGroup, SectionGroupAnalyzer, SplitPositionFinder, intensity_grid,
};
use crate::image::{ComposedPage, SectionComposer, SectionImage};
use crate::pdf::renderer::check_pixel_budget;
use crate::pdf::{PageRenderer, PdfWriter};

/// Per-page processing, configured once from a [`SplitConfig`].
#[derive(Debug, Clone)]
pub struct PagePipeline {
    config: SplitConfig,
    finder: SplitPositionFinder,
    detector: ContentBlockDetector,
    analyzer: SectionGroupAnalyzer,
    composer: SectionComposer,
    writer: PdfWriter,
}

impl PagePipeline {
    /// Build every stage from `config`, rejecting invalid settings.
    pub fn from_config(config: SplitConfig) -> Result<Self> {
        config.validate()?;
        let detector = ContentBlockDetector::new(config.detection.clone());
        Ok(Self {
            finder: SplitPositionFinder::new(
                config.detection.smoothing_window,
                config.split_search_fraction,
            ),
            analyzer: SectionGroupAnalyzer::new(config.noise_fraction, config.isolation_fraction),
            composer: SectionComposer::from_config(&config)?,
            writer: PdfWriter::new(config.output_ppi),
            detector,
            config,
        })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Render page `page_index` and encode its sections, left to right, as
    /// single-page PDFs.
    #[instrument(skip(self, renderer), fields(page = page_index))]
    pub fn process_page(
        &self,
        renderer: &dyn PageRenderer,
        page_index: usize,
        splits: SplitCount,
    ) -> Result<Vec<Vec<u8>>> {
        let page = renderer.render_page(page_index, self.config.render_dpi)?;
        let sections = self.compose_sections(&page, splits)?;

        let encoded = sections
            .iter()
            .map(|section| self.writer.encode_page(section))
            .collect::<Result<Vec<_>>>()?;

        info!(
            width = page.width(),
            height = page.height(),
            sections = encoded.len(),
            "Page split"
        );
        Ok(encoded)
    }

    /// Cut `page` into `splits` sections and compose each onto the canvas.
    pub fn compose_sections(
        &self,
        page: &RgbImage,
        splits: SplitCount,
    ) -> Result<Vec<ComposedPage>> {
        Ok(self
            .extract_sections(page, splits)?
            .into_iter()
            .map(|section| match section {
                Some(section) => self.composer.compose(section.as_rgb()),
                None => self.composer.blank(),
            })
            .collect())
    }

    /// Cut `page` into `splits` sections and crop each to its retained
    /// content. `None` marks a section without content.
    pub fn extract_sections(
        &self,
        page: &RgbImage,
        splits: SplitCount,
    ) -> Result<Vec<Option<SectionImage>>> {
        check_pixel_budget(page.width(), page.height(), self.config.max_page_pixels)?;

        let grid = intensity_grid(page);
        let plan = self.finder.find(&grid, splits)?;
        let ranges = plan.section_ranges(page.width());
        debug!(offsets = ?plan.offsets(), "Split plan");

        let grids: Vec<_> = ranges
            .iter()
            .map(|&(start, end)| (start, grid.column_band(start as usize, end as usize)))
            .collect();
        let group = SectionGroup::detect(&self.detector, &grids);
        let analysis = self.analyzer.analyze(&group);

        let sections = ranges
            .iter()
            .enumerate()
            .map(|(index, &(start, end))| {
                let kept = self.analyzer.retained_blocks(&group, analysis.as_ref(), index);
                let bounds = union_bounds(&kept)?;
                let dropped: Vec<BoundingBox> = group
                    .blocks(index)
                    .iter()
                    .filter(|block| !kept.contains(block))
                    .map(|block| block.bbox)
                    .collect();
                debug!(
                    section = index,
                    kept = kept.len(),
                    dropped = dropped.len(),
                    ?bounds,
                    "Section content"
                );
                Some(SectionImage::cut(page, start, end).erase(&dropped).crop(bounds))
            })
            .collect();
        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::ImageSequenceRenderer;
    use image::Rgb;
    use spaltwerk_core::SpaltwerkError;

    const INK: Rgb<u8> = Rgb([0, 0, 0]);
    const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

    type Rect = (u32, u32, u32, u32);

    fn page_with_rects(width: u32, height: u32, rects: &[Rect]) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let inked = rects.iter().any(|&(left, top, right, bottom)| {
                (left..right).contains(&x) && (top..bottom).contains(&y)
            });
            if inked { INK } else { PAPER }
        })
    }

    /// 2x3 inch canvas at 100 ppi.
    fn small_pipeline() -> PagePipeline {
        let config = SplitConfig {
            output_ppi: 100,
            page_width_in: 2.0,
            page_height_in: 3.0,
            ..SplitConfig::default()
        };
        PagePipeline::from_config(config).unwrap()
    }

    fn three_column_page() -> RgbImage {
        page_with_rects(
            900,
            600,
            &[(50, 100, 250, 500), (350, 100, 550, 500), (650, 100, 850, 500)],
        )
    }

    #[test]
    fn three_columns_become_three_canvases() {
        let pipeline = small_pipeline();
        let pages = pipeline
            .compose_sections(&three_column_page(), SplitCount::THREE)
            .unwrap();

        assert_eq!(pages.len(), 3);
        for page in &pages {
            assert_eq!((page.width(), page.height()), (200, 300));
            assert!(!page.is_blank());
        }
    }

    #[test]
    fn empty_section_becomes_blank_canvas() {
        // Content only in the left half.
        let page = page_with_rects(800, 600, &[(50, 100, 300, 500)]);
        let pages = small_pipeline()
            .compose_sections(&page, SplitCount::TWO)
            .unwrap();

        assert_eq!(pages.len(), 2);
        assert!(!pages[0].is_blank());
        assert!(pages[1].is_blank());
    }

    #[test]
    fn stray_mark_is_cropped_out_of_the_farthest_section() {
        // Two text bands on the left, one on the right plus a small speck
        // near the bottom right.
        let page = page_with_rects(
            800,
            1000,
            &[
                (50, 100, 350, 300),
                (50, 500, 350, 700),
                (450, 100, 750, 300),
                (700, 900, 720, 920),
            ],
        );
        let sections = small_pipeline()
            .extract_sections(&page, SplitCount::TWO)
            .unwrap();

        let left = sections[0].as_ref().unwrap();
        let right = sections[1].as_ref().unwrap();
        // Left keeps both bands.
        assert!(left.height() > 500);
        // Right is cropped to its band alone.
        assert!(right.height() < 250, "speck survived: height {}", right.height());
    }

    #[test]
    fn connected_content_is_never_filtered() {
        // Left column is one unbroken mass.
        let page = page_with_rects(
            800,
            1000,
            &[(50, 100, 350, 900), (450, 100, 750, 300), (700, 900, 720, 920)],
        );
        let sections = small_pipeline()
            .extract_sections(&page, SplitCount::TWO)
            .unwrap();

        let right = sections[1].as_ref().unwrap();
        assert!(right.height() > 800);
    }

    #[test]
    fn process_page_encodes_one_pdf_per_section() {
        let renderer = ImageSequenceRenderer::new(vec![three_column_page()]);
        let encoded = small_pipeline()
            .process_page(&renderer, 0, SplitCount::THREE)
            .unwrap();

        assert_eq!(encoded.len(), 3);
        assert!(encoded.iter().all(|bytes| bytes.starts_with(b"%PDF")));
    }

    #[test]
    fn oversized_page_is_rejected() {
        let config = SplitConfig {
            max_page_pixels: 1_000,
            ..SplitConfig::default()
        };
        let pipeline = PagePipeline::from_config(config).unwrap();
        let result = pipeline.compose_sections(&three_column_page(), SplitCount::TWO);
        assert!(matches!(result, Err(SpaltwerkError::ResourceExhausted { .. })));
    }
}
