// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — section cropping, stray-mark erasure, and canvas composition.

pub mod composer;
pub mod processor;

pub use composer::{ComposedPage, SectionComposer};
pub use processor::SectionImage;
