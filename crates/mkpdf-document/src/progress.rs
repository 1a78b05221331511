// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting hooks for batch conversions. The library never renders
// anything itself; the CLI plugs an indicatif bar in here.

use std::path::Path;

use mkpdf_core::error::ConvertError;

/// Receives per-image events from [`crate::Converter`].
///
/// Every method has a no-op default, so implementors override only what they
/// display. Indices are 0-based positions in the input list.
pub trait ProgressObserver {
    /// Called once before the first image is read.
    fn on_start(&self, total: usize) {
        let _ = total;
    }

    /// Called after an image has become a page.
    fn on_image_done(&self, index: usize, input: &Path) {
        let _ = (index, input);
    }

    /// Called when an image is left out under the skip policy.
    fn on_image_skipped(&self, index: usize, input: &Path, error: &ConvertError) {
        let _ = (index, input, error);
    }

    /// Called once after every image has been attempted, before the document
    /// is written.
    fn on_finish(&self, pages: usize) {
        let _ = pages;
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}
