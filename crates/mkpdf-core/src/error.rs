// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for mkpdf.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all mkpdf operations.
#[derive(Debug, Error)]
pub enum ConvertError {
    // -- Input errors --
    #[error("cannot decode image: {0}")]
    Decode(String),

    #[error("HEIC/HEIF image detected (brand '{brand}'), but no HEIF decoder is available in this build")]
    HeifUnavailable { brand: String },

    // -- Option errors --
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("config file is malformed: {0}")]
    ConfigFile(#[from] serde_json::Error),

    // -- Page / document errors --
    #[error("page composition failed: {0}")]
    Composition(String),

    #[error("no images to convert")]
    NoImages,

    #[error("no files match '{0}'")]
    NoMatch(String),

    #[error("document is already finalized; no further pages can be added")]
    AlreadyFinalized,

    // -- Storage --
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -- Attribution --
    #[error("{input}: {source}")]
    Input {
        input: String,
        #[source]
        source: Box<ConvertError>,
    },
}

/// Coarse classification of a [`ConvertError`], stable across wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Source bytes are not a supported image, or a decoder is missing.
    Decode,
    /// An option value is outside its valid domain.
    Configuration,
    /// Placing or encoding a page failed.
    Composition,
    /// Reading a source or writing the destination failed.
    Io,
    /// The API was driven in an invalid order or with nothing to do.
    Usage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Decode => "decode error",
            Self::Configuration => "configuration error",
            Self::Composition => "composition error",
            Self::Io => "I/O error",
            Self::Usage => "usage error",
        };
        f.write_str(name)
    }
}

impl ConvertError {
    /// Classify this error. Wrapped errors report the kind of their cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) | Self::HeifUnavailable { .. } => ErrorKind::Decode,
            Self::Configuration(_) | Self::ConfigFile(_) => ErrorKind::Configuration,
            Self::Composition(_) => ErrorKind::Composition,
            Self::Io { .. } => ErrorKind::Io,
            Self::NoImages | Self::NoMatch(_) | Self::AlreadyFinalized => ErrorKind::Usage,
            Self::Input { source, .. } => source.kind(),
        }
    }

    /// The input identifier this error is attributed to, if any.
    pub fn input(&self) -> Option<&str> {
        match self {
            Self::Input { input, .. } => Some(input),
            _ => None,
        }
    }

    /// Attach an input identifier (usually a path). Already-attributed errors
    /// are returned unchanged.
    pub fn for_input(self, input: impl fmt::Display) -> Self {
        match self {
            Self::Input { .. } => self,
            other => Self::Input {
                input: input.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Build an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Innermost error, skipping any [`ConvertError::Input`] wrappers.
    pub fn root(&self) -> &ConvertError {
        match self {
            Self::Input { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ConvertError>;
