// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: decoding, colour normalisation, and resize/rotate/filter.

pub mod decode;
pub mod normalize;
pub mod processor;

pub use decode::SourceImage;
pub use normalize::{ColorNormalizer, NormalizedImage};
pub use processor::ImageTransformer;
