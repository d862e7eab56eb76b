// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — encode a composed section canvas as a single-page PDF using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use spaltwerk_core::error::{Result, SpaltwerkError};
use tracing::{debug, instrument, warn};

use crate::image::ComposedPage;

/// Encodes composed canvases as single-page PDFs.
///
/// The page is sized so the canvas covers it exactly at the writer's
/// resolution: a 2068x2923 canvas at 250 ppi becomes an A4 page.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    /// Pixels per inch of the canvas.
    ppi: u32,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    pub fn new(ppi: u32) -> Self {
        Self {
            ppi: ppi.max(1),
            title: "Spaltwerk Section".to_string(),
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn ppi(&self) -> u32 {
        self.ppi
    }

    /// Page dimensions for a canvas of `width` x `height` pixels.
    pub fn page_dimensions(&self, width: u32, height: u32) -> (Mm, Mm) {
        let ppi = self.ppi as f32;
        (
            Mm(width as f32 / ppi * 25.4),
            Mm(height as f32 / ppi * 25.4),
        )
    }

    /// Encode `page` as a complete single-page PDF.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn encode_page(&self, page: &ComposedPage) -> Result<Vec<u8>> {
        let (width, height) = (page.width(), page.height());
        if width == 0 || height == 0 {
            return Err(SpaltwerkError::Encoding(format!(
                "cannot encode an empty {width}x{height} canvas"
            )));
        }

        let raw = RawImage {
            pixels: RawImageData::U8(page.as_image().as_raw().clone()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(&self.title);
        let xobject_id = doc.add_image(&raw);

        // At the canvas resolution the image spans the full page.
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(self.ppi as f32),
                rotate: None,
            },
        }];

        let (page_w, page_h) = self.page_dimensions(width, height);
        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF serialisation reported warnings");
        }
        if output.is_empty() {
            return Err(SpaltwerkError::Encoding(
                "PDF serialisation produced no output".into(),
            ));
        }

        debug!(output_bytes = output.len(), "Section encoded");
        Ok(output)
    }
}
