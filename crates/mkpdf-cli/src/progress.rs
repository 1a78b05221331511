// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal progress bar for multi-image conversions.

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use mkpdf_core::ConvertError;
use mkpdf_document::ProgressObserver;

/// Renders one bar across all inputs. Skipped inputs only advance it; they are
/// listed once the conversion has finished.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let progress = Self::with_bar(ProgressBar::new(0));
        progress.bar.enable_steady_tick(Duration::from_millis(100));
        progress
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {pos:>3}/{len} images  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_prefix("Converting");
        Self { bar }
    }
}

fn file_name(input: &Path) -> String {
    input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

impl ProgressObserver for BarProgress {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.reset_eta();
    }

    fn on_image_done(&self, _index: usize, input: &Path) {
        self.bar.set_message(file_name(input));
        self.bar.inc(1);
    }

    fn on_image_skipped(&self, _index: usize, input: &Path, _error: &ConvertError) {
        self.bar.set_message(format!("skipped {}", file_name(input)));
        self.bar.inc(1);
    }

    fn on_finish(&self, _pages: usize) {
        self.bar.finish_and_clear();
    }
}

impl Drop for BarProgress {
    fn drop(&mut self) {
        // an aborted conversion never reaches on_finish
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn skipped_input_only_advances_the_bar() {
        let progress = BarProgress::with_bar(ProgressBar::hidden());
        progress.on_start(2);
        progress.on_image_done(0, &PathBuf::from("photos/a.jpg"));
        progress.on_image_skipped(
            1,
            &PathBuf::from("photos/b.jpg"),
            &ConvertError::Decode("bad header".into()),
        );
        assert_eq!(progress.bar.position(), 2);
        assert_eq!(progress.bar.message(), "skipped b.jpg");
    }
}
