// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every technical error is mapped to a plain sentence with a concrete
// suggestion, plus the process exit code for its kind.

use crate::error::{ConvertError, ErrorKind};

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanError {
    /// One-line summary (printed after `error:`).
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    /// Process exit status for this failure.
    pub exit_code: i32,
}

/// Exit status used by the CLI for each error kind.
pub fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Configuration => 2,
        ErrorKind::Decode => 3,
        ErrorKind::Composition => 4,
        ErrorKind::Io => 5,
        ErrorKind::Usage => 6,
    }
}

/// Convert a `ConvertError` into a message a CLI user can act on.
pub fn humanize_error(err: &ConvertError) -> HumanError {
    let subject = err
        .input()
        .map(|input| format!("'{input}'"))
        .unwrap_or_else(|| "the input".to_string());

    let (message, suggestion) = match err.root() {
        ConvertError::Decode(detail) => (
            format!("{subject} is not a readable image ({detail})."),
            "Supported formats are JPEG, PNG, BMP, GIF, TIFF and WebP. \
             Re-save the file in one of them, or pass --skip-invalid to leave it out."
                .to_string(),
        ),

        ConvertError::HeifUnavailable { .. } => (
            format!("{subject} is a HEIC/HEIF photo, which this build cannot decode."),
            "Export the photo as JPEG or PNG first (most photo apps offer this).".to_string(),
        ),

        ConvertError::Configuration(detail) => (
            format!("An option has an invalid value: {detail}."),
            "Check the command-line flags, then run `mkpdf config show` to review saved defaults."
                .to_string(),
        ),

        ConvertError::ConfigFile(detail) => (
            format!("The saved configuration file could not be parsed: {detail}."),
            "Fix the JSON by hand or run `mkpdf config reset` to restore defaults.".to_string(),
        ),

        ConvertError::Composition(detail) => (
            format!("A page for {subject} could not be built: {detail}."),
            "Try a lower resolution (--width/--height) or a lower --quality.".to_string(),
        ),

        ConvertError::NoImages => (
            "There were no images to put in the PDF.".to_string(),
            "Give at least one image path or a pattern such as 'photos/*.jpg'.".to_string(),
        ),

        ConvertError::NoMatch(pattern) => (
            format!("No files match '{pattern}'."),
            "Check the pattern, and quote it so the shell does not expand it first.".to_string(),
        ),

        ConvertError::AlreadyFinalized => (
            "The document was already written; pages cannot be added afterwards.".to_string(),
            "Start a new conversion.".to_string(),
        ),

        ConvertError::Io { path, source } => (
            format!("Could not access '{}': {source}.", path.display()),
            "Check that the path exists and that you have permission to read or write it."
                .to_string(),
        ),

        // root() never returns a wrapper
        ConvertError::Input { .. } => (err.to_string(), String::new()),
    };

    HumanError {
        message,
        suggestion,
        exit_code: exit_code(err.kind()),
    }
}
