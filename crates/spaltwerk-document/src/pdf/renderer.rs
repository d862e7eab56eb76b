// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rendering — rasterize source pages to RGB pixel buffers.
//
// PDF sources go through PDFium (dynamically linked); raster sources are
// decoded with the `image` crate and served as single pages.

use std::path::{Path, PathBuf};

use image::RgbImage;
use pdfium_render::prelude::*;
use spaltwerk_core::error::{Result, SpaltwerkError};
use tracing::{debug, info, instrument};

/// Source of rendered pages. Shared read-only by all page workers.
pub trait PageRenderer: Send + Sync {
    /// Number of pages in the source.
    fn page_count(&self) -> usize;

    /// Rasterize page `page_index` (0-based) at `dpi`.
    fn render_page(&self, page_index: usize, dpi: u32) -> Result<RgbImage>;
}

/// Open `path` with the renderer its extension calls for.
///
/// Image files (PNG, JPEG, TIFF) become a single-page source; anything else is
/// treated as PDF.
pub fn open_source(
    path: impl AsRef<Path>,
    max_page_pixels: u64,
) -> Result<Box<dyn PageRenderer>> {
    let path = path.as_ref();
    let is_raster = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "tif" | "tiff"
            )
        });
    if is_raster {
        Ok(Box::new(ImageSequenceRenderer::open(path, max_page_pixels)?))
    } else {
        Ok(Box::new(PdfiumRenderer::open(path, max_page_pixels)?))
    }
}

/// Bind PDFium.
///
/// Searches for libpdfium in:
/// 1. Current directory (./libpdfium.so)
/// 2. vendor/pdfium/lib/
/// 3. System library paths
pub fn create_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "./vendor/pdfium/lib/",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|err| {
            SpaltwerkError::Render(format!(
                "failed to load the PDFium library, install libpdfium: {err:?}"
            ))
        })?;
    Ok(Pdfium::new(bindings))
}

/// Renders PDF pages through PDFium.
///
/// The document bytes are held in memory and reopened for each page, so
/// concurrent workers never share a PDFium document handle.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
    bytes: Vec<u8>,
    page_count: usize,
    max_page_pixels: u64,
    source_path: PathBuf,
}

impl PdfiumRenderer {
    /// Load the PDF at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, max_page_pixels: u64) -> Result<Self> {
        let path = path.as_ref();
        let bytes = read_source(path)?;
        let pdfium = create_pdfium()?;

        let page_count = {
            let document = pdfium
                .load_pdf_from_byte_slice(&bytes, None)
                .map_err(|err| {
                    SpaltwerkError::Render(format!("failed to open {}: {:?}", path.display(), err))
                })?;
            document.pages().len() as usize
        };
        info!(pages = page_count, "PDF loaded");

        Ok(Self {
            pdfium,
            bytes,
            page_count,
            max_page_pixels,
            source_path: path.to_path_buf(),
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}

impl PageRenderer for PdfiumRenderer {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render_page(&self, page_index: usize, dpi: u32) -> Result<RgbImage> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(&self.bytes, None)
            .map_err(|err| SpaltwerkError::Render(format!("failed to reopen document: {err:?}")))?;
        let index = PdfPageIndex::try_from(page_index).map_err(|_| {
            SpaltwerkError::InvalidArgument(format!("page index {page_index} out of range"))
        })?;
        let page = document.pages().get(index).map_err(|err| {
            SpaltwerkError::Render(format!("failed to get page {page_index}: {err:?}"))
        })?;

        // Points are 1/72 inch.
        let pixels_per_point = dpi as f64 / 72.0;
        let width = (page.width().value as f64 * pixels_per_point).round() as u32;
        let height = (page.height().value as f64 * pixels_per_point).round() as u32;
        check_pixel_budget(width, height, self.max_page_pixels)?;

        debug!(page = page_index, width, height, dpi, "Rendering page");
        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32);
        let bitmap = page.render_with_config(&config).map_err(|err| {
            SpaltwerkError::Render(format!("failed to render page {page_index}: {err:?}"))
        })?;

        Ok(bitmap.as_image().to_rgb8())
    }
}

/// Serves in-memory images as pages. Each image is one page, rendered as-is
/// regardless of the requested resolution.
pub struct ImageSequenceRenderer {
    pages: Vec<RgbImage>,
}

impl ImageSequenceRenderer {
    pub fn new(pages: Vec<RgbImage>) -> Self {
        Self { pages }
    }

    /// Decode a single raster image file as a one-page source.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, max_page_pixels: u64) -> Result<Self> {
        let path = path.as_ref();
        let bytes = read_source(path)?;
        let decoded = image::load_from_memory(&bytes).map_err(|err| {
            SpaltwerkError::Render(format!("failed to decode {}: {}", path.display(), err))
        })?;
        check_pixel_budget(decoded.width(), decoded.height(), max_page_pixels)?;
        info!(
            width = decoded.width(),
            height = decoded.height(),
            "Image loaded"
        );
        Ok(Self::new(vec![decoded.to_rgb8()]))
    }
}

impl PageRenderer for ImageSequenceRenderer {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render_page(&self, page_index: usize, _dpi: u32) -> Result<RgbImage> {
        self.pages.get(page_index).cloned().ok_or_else(|| {
            SpaltwerkError::InvalidArgument(format!(
                "page {page_index} out of range (source has {} pages)",
                self.pages.len()
            ))
        })
    }
}

/// Read a source file, reporting a missing file as `NotFound`.
fn read_source(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => SpaltwerkError::NotFound(path.to_path_buf()),
        _ => SpaltwerkError::Io(err),
    })
}

/// Refuse pages whose pixel count would exceed `limit`.
pub fn check_pixel_budget(width: u32, height: u32, limit: u64) -> Result<()> {
    if width as u64 * height as u64 > limit {
        return Err(SpaltwerkError::ResourceExhausted {
            width,
            height,
            limit,
        });
    }
    Ok(())
}
