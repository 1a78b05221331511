// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mkpdf-document: the image to PDF conversion engine.
//
// Per image, strictly in order: decode (SourceImage) → colour normalisation
// (NormalizedImage) → resize/rotate/filter → placement on the page → page
// composition. The assembler appends pages in input order and writes the
// document metadata once, at finalisation.

pub mod convert;
pub mod image;
pub mod pdf;
pub mod progress;

// Re-export the primary structs so callers can use `mkpdf_document::Converter` etc.
pub use convert::{ConversionReport, Converter, SkippedInput, expand_inputs};
pub use image::decode::{ColorMode, SourceImage};
pub use image::normalize::{ColorNormalizer, NormalizedImage};
pub use image::processor::ImageTransformer;
pub use pdf::compose::{ComposedPage, PageComposer};
pub use pdf::layout::{PageLayoutEngine, PlacementRect, page_dimensions_pt};
pub use pdf::reader::{DocumentInfo, PdfReader};
pub use pdf::writer::{AssemblyState, DocumentAssembler, PageSetup, assemble};
pub use progress::{NoProgress, ProgressObserver};
