// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch conversion of image files into one PDF file.
//
// The whole document is built in memory; the output file is written only once
// every input has been handled, so a failed conversion never leaves a partial
// PDF behind.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use mkpdf_core::config::ConvertSettings;
use mkpdf_core::error::{ConvertError, Result};
use mkpdf_core::types::FailurePolicy;
use tracing::{debug, info, instrument, warn};

use crate::image::decode::SourceImage;
use crate::pdf::writer::{DocumentAssembler, PageSetup};
use crate::progress::{NoProgress, ProgressObserver};

/// An input left out of the document under [`FailurePolicy::Skip`].
#[derive(Debug)]
pub struct SkippedInput {
    pub input: PathBuf,
    pub error: ConvertError,
}

/// Outcome of a successful conversion.
#[derive(Debug)]
pub struct ConversionReport {
    pub output: PathBuf,
    /// Pages written, one per converted image.
    pub pages: usize,
    /// Size of the written PDF in bytes.
    pub bytes: usize,
    /// Inputs that produced no page, in input order. Always empty under
    /// [`FailurePolicy::Abort`].
    pub skipped: Vec<SkippedInput>,
}

/// Converts image files to PDF with one immutable set of settings.
#[derive(Debug, Clone)]
pub struct Converter {
    settings: ConvertSettings,
}

impl Converter {
    pub fn new(settings: ConvertSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ConvertSettings {
        &self.settings
    }

    /// One image, one page.
    pub fn convert_single(&self, input: &Path, output: &Path) -> Result<ConversionReport> {
        self.convert_many(&[input.to_path_buf()], output)
    }

    /// Every input becomes one page, in the order given.
    pub fn convert_many(&self, inputs: &[PathBuf], output: &Path) -> Result<ConversionReport> {
        self.convert_many_with_progress(inputs, output, &NoProgress)
    }

    #[instrument(skip(self, inputs, observer), fields(inputs = inputs.len(), output = %output.display()))]
    pub fn convert_many_with_progress(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        observer: &dyn ProgressObserver,
    ) -> Result<ConversionReport> {
        let (pdf, pages, skipped) = self.build_pdf(inputs, observer)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| ConvertError::io(parent, err))?;
        }
        std::fs::write(output, &pdf).map_err(|err| ConvertError::io(output, err))?;

        info!(
            pages,
            skipped = skipped.len(),
            bytes = pdf.len(),
            "Wrote PDF to {}",
            output.display()
        );
        Ok(ConversionReport {
            output: output.to_path_buf(),
            pages,
            bytes: pdf.len(),
            skipped,
        })
    }

    /// Build the PDF bytes without writing anything. Returns the document, its
    /// page count, and the skipped inputs.
    pub fn build_pdf(
        &self,
        inputs: &[PathBuf],
        observer: &dyn ProgressObserver,
    ) -> Result<(Vec<u8>, usize, Vec<SkippedInput>)> {
        if inputs.is_empty() {
            return Err(ConvertError::NoImages);
        }

        let mut assembler = DocumentAssembler::new(PageSetup::from_settings(&self.settings))?;
        let mut skipped = Vec::new();
        observer.on_start(inputs.len());

        for (index, input) in inputs.iter().enumerate() {
            let added = SourceImage::open(input)
                .and_then(|source| assembler.add_image(source, &self.settings.transform))
                .map_err(|err| err.for_input(input.display()));

            match added {
                Ok(()) => {
                    debug!(index, input = %input.display(), "Image converted");
                    observer.on_image_done(index, input);
                }
                Err(err) if self.settings.failure == FailurePolicy::Skip => {
                    warn!(index, %err, "Skipping input");
                    observer.on_image_skipped(index, input, &err);
                    skipped.push(SkippedInput {
                        input: input.clone(),
                        error: err,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        let pages = assembler.page_count();
        observer.on_finish(pages);
        let pdf = assembler.finalize(&self.settings.metadata)?;
        Ok((pdf, pages, skipped))
    }
}

/// Resolve glob patterns and literal paths into an ordered list of files.
///
/// Each pattern's matches are sorted; patterns keep their given order. A path
/// reached twice is kept at its first position. Literal paths are passed
/// through unchecked so a missing file is reported when it is read.
pub fn expand_inputs<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let matches = if pattern.contains(['*', '?', '[']) {
            let paths = glob::glob(pattern).map_err(|err| {
                ConvertError::Configuration(format!("invalid pattern '{pattern}': {err}"))
            })?;
            let mut matched: Vec<PathBuf> = paths
                .filter_map(|entry| entry.ok())
                .filter(|path| path.is_file())
                .collect();
            if matched.is_empty() {
                return Err(ConvertError::NoMatch(pattern.to_string()));
            }
            matched.sort();
            matched
        } else {
            vec![PathBuf::from(pattern)]
        };

        for path in matches {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    debug!(count = files.len(), "Inputs expanded");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use image::{Rgb, RgbImage};
    use mkpdf_core::ErrorKind;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb([200, 100, 50]))
            .save(&path)
            .unwrap();
        path
    }

    fn skip_settings() -> ConvertSettings {
        ConvertSettings {
            failure: FailurePolicy::Skip,
            ..ConvertSettings::default()
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl ProgressObserver for Recorder {
        fn on_start(&self, total: usize) {
            self.events.borrow_mut().push(format!("start {total}"));
        }
        fn on_image_done(&self, index: usize, _input: &Path) {
            self.events.borrow_mut().push(format!("done {index}"));
        }
        fn on_image_skipped(&self, index: usize, _input: &Path, _error: &ConvertError) {
            self.events.borrow_mut().push(format!("skip {index}"));
        }
        fn on_finish(&self, pages: usize) {
            self.events.borrow_mut().push(format!("finish {pages}"));
        }
    }

    #[test]
    fn converts_and_writes_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_png(dir.path(), "a.png", 30, 20);
        let output = dir.path().join("out/nested/a.pdf");

        let report = Converter::new(ConvertSettings::default())
            .convert_single(&input, &output)
            .unwrap();
        assert_eq!(report.pages, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(std::fs::metadata(&output).unwrap().len() as usize, report.bytes);
    }

    #[test]
    fn abort_policy_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "good.png", 10, 10);
        let bad = dir.path().join("bad.jpg");
        std::fs::write(&bad, b"not really a jpeg").unwrap();
        let output = dir.path().join("out.pdf");

        let err = Converter::new(ConvertSettings::default())
            .convert_many(&[good, bad.clone()], &output)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.input(), Some(bad.display().to_string().as_str()));
        assert!(!output.exists());
    }

    #[test]
    fn skip_policy_reports_skipped_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_png(dir.path(), "1.png", 10, 10);
        let missing = dir.path().join("missing.png");
        let third = write_png(dir.path(), "3.png", 10, 10);
        let output = dir.path().join("out.pdf");

        let recorder = Recorder::default();
        let report = Converter::new(skip_settings())
            .convert_many_with_progress(&[first, missing.clone(), third], &output, &recorder)
            .unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].input, missing);
        assert_eq!(report.skipped[0].error.kind(), ErrorKind::Io);
        assert_eq!(
            *recorder.events.borrow(),
            ["start 3", "done 0", "skip 1", "done 2", "finish 2"]
        );
    }

    #[test]
    fn all_skipped_is_no_images() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let err = Converter::new(skip_settings())
            .convert_many(&[dir.path().join("nope.png")], &output)
            .unwrap_err();
        assert!(matches!(err, ConvertError::NoImages));
        assert!(!output.exists());
    }

    #[test]
    fn empty_input_list_is_no_images() {
        let err = Converter::new(ConvertSettings::default())
            .convert_many(&[], Path::new("unused.pdf"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn expand_sorts_matches_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.jpg", "c.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.jpg")).unwrap();

        let jpgs = format!("{}/*.jpg", dir.path().display());
        let literal = dir.path().join("a.jpg").display().to_string();
        let files = expand_inputs(&[jpgs, literal]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.jpg", "b.jpg"]);
    }

    #[test]
    fn unmatched_pattern_is_named() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.gif", dir.path().display());
        let err = expand_inputs(&[pattern.clone()]).unwrap_err();
        assert!(matches!(err, ConvertError::NoMatch(ref p) if *p == pattern));
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
