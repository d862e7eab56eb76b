// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// spaltwerk-document — Column splitting for scanned multi-column documents.
//
// Provides page analysis (gutter search, content block detection, cross-section
// noise analysis), section composition onto a fixed canvas, PDF rendering,
// encoding and assembly, and the concurrent document splitter tying them
// together.

pub mod analysis;
pub mod image;
pub mod pdf;
pub mod pipeline;
pub mod splitter;

// Re-export the primary structs so callers can use `spaltwerk_document::DocumentSplitter` etc.
pub use analysis::{ContentBlockDetector, SectionGroup, SectionGroupAnalyzer, SplitPositionFinder};
pub use image::{ComposedPage, SectionComposer, SectionImage};
pub use pdf::{ImageSequenceRenderer, PageRenderer, PdfAssembler, PdfWriter, PdfiumRenderer};
pub use pipeline::PagePipeline;
pub use splitter::{DocumentSplitter, split_document_blocking};
