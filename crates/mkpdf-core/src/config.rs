// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration: persisted defaults, call-site overrides, and the
// validated settings a conversion runs with.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};
use crate::types::{
    FailurePolicy, ImageFilter, ImagePosition, PageSize, PdfMetadata, Quality, Rotation,
    ScalePolicy, TransformRequest,
};

/// Default metadata strings applied to every document unless overridden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataDefaults {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    pub creator: String,
}

impl Default for MetadataDefaults {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            subject: String::new(),
            keywords: String::new(),
            creator: "MKPDF".into(),
        }
    }
}

/// Persistent conversion defaults, stored as JSON.
///
/// Values are kept in their raw option form so a hand-edited file with an
/// out-of-range value is reported as a configuration error when settings are
/// resolved, naming the bad value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Page size name, e.g. `A4` or `LETTER_LANDSCAPE`.
    pub default_page_size: String,
    /// JPEG quality for embedded images (1-100).
    pub default_quality: i64,
    /// Anchor name, e.g. `center` or `top_left`.
    pub default_position: String,
    /// Whether the resize stage runs.
    pub default_resize: bool,
    pub default_width: Option<u32>,
    pub default_height: Option<u32>,
    /// Clockwise rotation in degrees.
    pub default_rotate: i64,
    /// Filter name, e.g. `none` or `sharpen`.
    pub default_filter: String,
    /// Allow images smaller than the page to be enlarged.
    pub allow_upscale: bool,
    /// Skip undecodable inputs instead of aborting the batch.
    pub skip_invalid: bool,
    pub default_metadata: MetadataDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_page_size: PageSize::A4.name().into(),
            default_quality: i64::from(Quality::DEFAULT.get()),
            default_position: ImagePosition::Center.name().into(),
            default_resize: false,
            default_width: None,
            default_height: None,
            default_rotate: 0,
            default_filter: ImageFilter::None.name().into(),
            allow_upscale: true,
            skip_invalid: false,
            default_metadata: MetadataDefaults::default(),
        }
    }
}

impl AppConfig {
    /// `$HOME/.mkpdf/config.json` (or `%USERPROFILE%` on Windows).
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(|home| PathBuf::from(home).join(".mkpdf").join("config.json"))
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| ConvertError::io(path, err))?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Read `path`, or write the built-in defaults there if it does not exist.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_file(path);
        }
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| ConvertError::io(parent, err))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|err| ConvertError::io(path, err))
    }

    /// Fold overrides into these defaults, for persisting them.
    ///
    /// The merged result is validated first; an invalid override leaves
    /// `self` untouched.
    pub fn apply(&mut self, overrides: &ConvertOverrides) -> Result<()> {
        ConvertSettings::resolve(self, overrides)?;

        let o = overrides.clone();
        if let Some(v) = o.page_size {
            self.default_page_size = v;
        }
        if let Some(v) = o.quality {
            self.default_quality = v;
        }
        if let Some(v) = o.position {
            self.default_position = v;
        }
        if let Some(v) = o.resize {
            self.default_resize = v;
        }
        if o.width.is_some() {
            self.default_width = o.width;
        }
        if o.height.is_some() {
            self.default_height = o.height;
        }
        if let Some(v) = o.rotate {
            self.default_rotate = v;
        }
        if let Some(v) = o.filter {
            self.default_filter = v;
        }
        if let Some(v) = o.allow_upscale {
            self.allow_upscale = v;
        }
        if let Some(v) = o.skip_invalid {
            self.skip_invalid = v;
        }

        let meta = &mut self.default_metadata;
        for (slot, value) in [
            (&mut meta.title, o.title),
            (&mut meta.author, o.author),
            (&mut meta.subject, o.subject),
            (&mut meta.keywords, o.keywords),
            (&mut meta.creator, o.creator),
        ] {
            if let Some(v) = value {
                *slot = v;
            }
        }
        Ok(())
    }
}

/// Explicit per-call options. `None` falls back to the persisted default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOverrides {
    pub page_size: Option<String>,
    pub quality: Option<i64>,
    pub position: Option<String>,
    pub resize: Option<bool>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub rotate: Option<i64>,
    pub filter: Option<String>,
    pub allow_upscale: Option<bool>,
    pub skip_invalid: Option<bool>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
}

/// Fully resolved, validated options for one conversion.
///
/// Built once, before any image is read, and passed by reference into the
/// pipeline; nothing consults the config file after this point.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertSettings {
    pub page_size: PageSize,
    pub position: ImagePosition,
    pub quality: Quality,
    pub transform: TransformRequest,
    pub scale: ScalePolicy,
    pub failure: FailurePolicy,
    pub metadata: PdfMetadata,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            position: ImagePosition::Center,
            quality: Quality::DEFAULT,
            transform: TransformRequest::identity(),
            scale: ScalePolicy::Fit,
            failure: FailurePolicy::Abort,
            metadata: PdfMetadata::default().with_creator("MKPDF"),
        }
    }
}

impl ConvertSettings {
    /// Merge `defaults ← overrides` and validate every document-wide value.
    pub fn resolve(defaults: &AppConfig, overrides: &ConvertOverrides) -> Result<Self> {
        let page_size: PageSize = overrides
            .page_size
            .as_deref()
            .unwrap_or(&defaults.default_page_size)
            .parse()?;
        page_size.validate()?;

        let position: ImagePosition = overrides
            .position
            .as_deref()
            .unwrap_or(&defaults.default_position)
            .parse()?;

        let quality = Quality::new(overrides.quality.unwrap_or(defaults.default_quality))?;

        let width = overrides.width.or(defaults.default_width);
        let height = overrides.height.or(defaults.default_height);
        let explicit_dims = overrides.width.is_some() || overrides.height.is_some();
        let resize = overrides
            .resize
            .unwrap_or(defaults.default_resize || explicit_dims);
        if resize && width.is_none() && height.is_none() {
            return Err(ConvertError::Configuration(
                "resize is enabled but neither width nor height is set".into(),
            ));
        }

        let transform = TransformRequest {
            target_width: if resize { width } else { None },
            target_height: if resize { height } else { None },
            rotation: Rotation::from_degrees(overrides.rotate.unwrap_or(defaults.default_rotate))?,
            filter: overrides
                .filter
                .as_deref()
                .unwrap_or(&defaults.default_filter)
                .parse()?,
        };
        transform.validate()?;

        let scale = if overrides.allow_upscale.unwrap_or(defaults.allow_upscale) {
            ScalePolicy::Fit
        } else {
            ScalePolicy::ShrinkOnly
        };
        let failure = if overrides.skip_invalid.unwrap_or(defaults.skip_invalid) {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        };

        let meta = &defaults.default_metadata;
        let pick = |explicit: &Option<String>, fallback: &str| -> Option<String> {
            let value = explicit.as_deref().unwrap_or(fallback);
            (!value.is_empty()).then(|| value.to_string())
        };
        let metadata = PdfMetadata {
            title: pick(&overrides.title, &meta.title),
            author: pick(&overrides.author, &meta.author),
            subject: pick(&overrides.subject, &meta.subject),
            keywords: pick(&overrides.keywords, &meta.keywords),
            creator: pick(&overrides.creator, &meta.creator),
            creation_date: None,
        };

        Ok(Self {
            page_size,
            position,
            quality,
            transform,
            scale,
            failure,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn defaults_resolve_cleanly() {
        let settings =
            ConvertSettings::resolve(&AppConfig::default(), &ConvertOverrides::default()).unwrap();
        assert_eq!(settings, ConvertSettings::default());
    }

    #[test]
    fn overrides_win_over_defaults() {
        let mut defaults = AppConfig::default();
        defaults.default_quality = 50;
        defaults.default_metadata.author = "Default Author".into();

        let overrides = ConvertOverrides {
            quality: Some(80),
            page_size: Some("letter".into()),
            title: Some("Album".into()),
            ..Default::default()
        };
        let settings = ConvertSettings::resolve(&defaults, &overrides).unwrap();
        assert_eq!(settings.quality.get(), 80);
        assert_eq!(settings.page_size, PageSize::Letter);
        assert_eq!(settings.metadata.title.as_deref(), Some("Album"));
        assert_eq!(settings.metadata.author.as_deref(), Some("Default Author"));
    }

    #[test]
    fn out_of_domain_values_fail_early() {
        let defaults = AppConfig::default();
        for overrides in [
            ConvertOverrides {
                quality: Some(0),
                ..Default::default()
            },
            ConvertOverrides {
                rotate: Some(45),
                ..Default::default()
            },
            ConvertOverrides {
                position: Some("upper_middle".into()),
                ..Default::default()
            },
            ConvertOverrides {
                resize: Some(true),
                ..Default::default()
            },
            ConvertOverrides {
                width: Some(0),
                ..Default::default()
            },
        ] {
            let err = ConvertSettings::resolve(&defaults, &overrides).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{overrides:?}");
        }
    }

    #[test]
    fn explicit_dimensions_imply_resize() {
        let overrides = ConvertOverrides {
            width: Some(800),
            ..Default::default()
        };
        let settings = ConvertSettings::resolve(&AppConfig::default(), &overrides).unwrap();
        assert_eq!(settings.transform.target_width, Some(800));

        let overrides = ConvertOverrides {
            width: Some(800),
            resize: Some(false),
            ..Default::default()
        };
        let settings = ConvertSettings::resolve(&AppConfig::default(), &overrides).unwrap();
        assert!(!settings.transform.resizes());
    }

    #[test]
    fn bad_persisted_value_is_configuration_error() {
        let mut defaults = AppConfig::default();
        defaults.default_page_size = "B99".into();
        let err = ConvertSettings::resolve(&defaults, &ConvertOverrides::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let created = AppConfig::load_or_init(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created, AppConfig::default());

        let mut config = created;
        config
            .apply(&ConvertOverrides {
                quality: Some(70),
                rotate: Some(90),
                author: Some("山田太郎".into()),
                ..Default::default()
            })
            .unwrap();
        config.save(&path).unwrap();

        let reloaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(reloaded.default_quality, 70);
        assert_eq!(reloaded.default_rotate, 90);
        assert_eq!(reloaded.default_metadata.author, "山田太郎");
    }

    #[test]
    fn apply_rejects_invalid_override_without_mutating() {
        let mut config = AppConfig::default();
        let err = config
            .apply(&ConvertOverrides {
                quality: Some(250),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "default_page_size": "LETTER" }"#).unwrap();
        assert_eq!(config.default_page_size, "LETTER");
        assert_eq!(config.default_quality, 95);
        assert_eq!(config.default_metadata.creator, "MKPDF");
    }
}
