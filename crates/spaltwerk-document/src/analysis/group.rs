// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cross-section analysis — decides, for the sibling sections of one page,
// which content dominates and which section may only hold stray marks
// (scanner specks, bleed-through, punch holes).

use spaltwerk_core::{ContentBlock, GroupAnalysis, IntensityGrid};
use tracing::{debug, warn};

use super::blocks::ContentBlockDetector;

/// Blocks detected in each sibling section of one page, left to right.
#[derive(Debug, Clone)]
pub struct SectionGroup {
    /// Page column at which each section starts.
    origins: Vec<u32>,
    /// Blocks per section, in section-local coordinates.
    blocks: Vec<Vec<ContentBlock>>,
}

impl SectionGroup {
    /// Run `detector` over each `(origin, grid)` section.
    pub fn detect(detector: &ContentBlockDetector, sections: &[(u32, IntensityGrid)]) -> Self {
        let (origins, blocks) = sections
            .iter()
            .map(|(origin, grid)| (*origin, detector.detect(grid)))
            .unzip();
        Self { origins, blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks of one section, in section-local coordinates.
    pub fn blocks(&self, section: usize) -> &[ContentBlock] {
        &self.blocks[section]
    }

    /// Center of `block` from `section`, shifted into page coordinates.
    fn page_center(&self, section: usize, block: &ContentBlock) -> (f64, f64) {
        let (x, y) = block.center;
        (x + self.origins[section] as f64, y)
    }
}

/// Finds the dominant block of a page and the section farthest from it.
#[derive(Debug, Clone)]
pub struct SectionGroupAnalyzer {
    noise_fraction: f64,
    isolation_fraction: f64,
}

impl Default for SectionGroupAnalyzer {
    fn default() -> Self {
        Self {
            noise_fraction: 0.10,
            isolation_fraction: 0.75,
        }
    }
}

impl SectionGroupAnalyzer {
    pub fn new(noise_fraction: f64, isolation_fraction: f64) -> Self {
        Self {
            noise_fraction,
            isolation_fraction,
        }
    }

    /// Analyze a group. Returns `None` when no section has content, or when any
    /// section is a single connected mass (ambiguous, so nothing is filtered).
    pub fn analyze(&self, group: &SectionGroup) -> Option<GroupAnalysis> {
        let pooled: Vec<(usize, &ContentBlock)> = group
            .blocks
            .iter()
            .enumerate()
            .flat_map(|(section, blocks)| blocks.iter().map(move |block| (section, block)))
            .collect();

        if pooled.iter().any(|(_, block)| block.connected) {
            debug!("Connected content present, skipping noise analysis");
            return None;
        }

        // First maximum wins ties, keeping the leftmost section.
        let (main_section, dominant) = pooled.iter().copied().reduce(|best, candidate| {
            if candidate.1.content_pixel_count > best.1.content_pixel_count {
                candidate
            } else {
                best
            }
        })?;
        let dominant_center = group.page_center(main_section, dominant);

        let mut farthest_section = main_section;
        let mut max_distance = 0.0f64;
        for &(section, block) in &pooled {
            if std::ptr::eq(block, dominant) {
                continue;
            }
            let distance = euclidean(group.page_center(section, block), dominant_center);
            if distance > max_distance {
                max_distance = distance;
                farthest_section = section;
            }
        }

        let analysis = GroupAnalysis {
            main_section,
            farthest_section,
            distance_threshold: max_distance * self.isolation_fraction,
            dominant_pixels: dominant.content_pixel_count,
            dominant_center,
        };
        debug!(
            main_section,
            farthest_section,
            max_distance,
            dominant_pixels = analysis.dominant_pixels,
            "Section group analyzed"
        );
        Some(analysis)
    }

    /// Blocks of `section` that survive noise suppression.
    ///
    /// Only the farthest section is filtered: its blocks that are both weak
    /// (under the noise fraction of the dominant block's ink) and isolated
    /// (at least `distance_threshold` from the dominant block) are dropped.
    /// If that would drop every block, the section keeps all of them.
    pub fn retained_blocks(
        &self,
        group: &SectionGroup,
        analysis: Option<&GroupAnalysis>,
        section: usize,
    ) -> Vec<ContentBlock> {
        let blocks = group.blocks(section);
        let Some(analysis) = analysis.filter(|a| a.farthest_section == section) else {
            return blocks.to_vec();
        };

        let min_pixels = analysis.dominant_pixels as f64 * self.noise_fraction;
        let kept: Vec<ContentBlock> = blocks
            .iter()
            .filter(|block| {
                let weak = (block.content_pixel_count as f64) < min_pixels;
                let distance =
                    euclidean(group.page_center(section, block), analysis.dominant_center);
                let isolated = distance >= analysis.distance_threshold;
                if weak && isolated {
                    debug!(
                        section,
                        bbox = ?block.bbox,
                        pixels = block.content_pixel_count,
                        distance,
                        "Suppressing stray marks"
                    );
                }
                !(weak && isolated)
            })
            .cloned()
            .collect();

        if kept.is_empty() {
            warn!(section, "Noise filter would empty the section, keeping all blocks");
            return blocks.to_vec();
        }
        kept
    }
}

fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
