// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — rendering source pages, encoding sections, and assembling the
// output document.

pub mod assembler;
pub mod renderer;
pub mod writer;

pub use assembler::PdfAssembler;
pub use renderer::{ImageSequenceRenderer, PageRenderer, PdfiumRenderer, open_source};
pub use writer::PdfWriter;
