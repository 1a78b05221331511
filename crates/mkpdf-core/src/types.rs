// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for mkpdf: page sizes, anchors, per-image transform
// requests, compression quality, and document metadata.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{ConvertError, Result};

/// Normalise a user-facing option name: lowercase, `-` and spaces become `_`.
fn option_key(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Standard page sizes. Every page of one document uses the same size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageSize {
    A4,
    A4Landscape,
    A3,
    A5,
    Letter,
    LetterLandscape,
    Legal,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PageSize {
    /// Every named size, in the order they are listed to users.
    pub const NAMED: [PageSize; 7] = [
        Self::A4,
        Self::A4Landscape,
        Self::A3,
        Self::A5,
        Self::Letter,
        Self::LetterLandscape,
        Self::Legal,
    ];

    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::A4Landscape => (297.0, 210.0),
            Self::A3 => (297.0, 420.0),
            Self::A5 => (148.0, 210.0),
            Self::Letter => (215.9, 279.4),
            Self::LetterLandscape => (279.4, 215.9),
            Self::Legal => (215.9, 355.6),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Canonical option name, e.g. `A4_LANDSCAPE`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::A4Landscape => "A4_LANDSCAPE",
            Self::A3 => "A3",
            Self::A5 => "A5",
            Self::Letter => "LETTER",
            Self::LetterLandscape => "LETTER_LANDSCAPE",
            Self::Legal => "LEGAL",
            Self::Custom { .. } => "CUSTOM",
        }
    }

    /// Reject custom sizes that cannot hold a page.
    pub fn validate(&self) -> Result<()> {
        let (w, h) = self.dimensions_mm();
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(ConvertError::Configuration(format!(
                "page size must have positive dimensions, got {w}x{h} mm"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom {
                width_mm,
                height_mm,
            } => write!(f, "{width_mm}x{height_mm}mm"),
            named => f.write_str(named.name()),
        }
    }
}

impl FromStr for PageSize {
    type Err = ConvertError;

    /// Accepts the named sizes case-insensitively, or `<w>x<h>mm` for a
    /// custom size.
    fn from_str(s: &str) -> Result<Self> {
        let key = option_key(s);
        if let Some(named) = Self::NAMED
            .iter()
            .find(|size| size.name().eq_ignore_ascii_case(&key))
        {
            return Ok(*named);
        }

        if let Some(dims) = key.strip_suffix("mm") {
            if let Some((w, h)) = dims.split_once('x') {
                if let (Ok(width_mm), Ok(height_mm)) = (w.parse::<f32>(), h.parse::<f32>()) {
                    let size = Self::Custom {
                        width_mm,
                        height_mm,
                    };
                    size.validate()?;
                    return Ok(size);
                }
            }
        }

        Err(ConvertError::Configuration(format!(
            "unknown page size '{s}' (expected one of A4, A4_LANDSCAPE, A3, A5, LETTER, \
             LETTER_LANDSCAPE, LEGAL, or <w>x<h>mm)"
        )))
    }
}

/// Where a scaled image is anchored on its page.
///
/// Axes an anchor does not name are centred: `Top` centres horizontally,
/// `Left` centres vertically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePosition {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Horizontal component of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

/// Vertical component of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAnchor {
    Top,
    Middle,
    Bottom,
}

impl ImagePosition {
    pub const ALL: [ImagePosition; 9] = [
        Self::Center,
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Option name, e.g. `top_left`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::TopLeft => "top_left",
            Self::TopRight => "top_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomRight => "bottom_right",
        }
    }

    /// Split into (horizontal, vertical) anchors.
    pub fn anchors(&self) -> (HorizontalAnchor, VerticalAnchor) {
        use HorizontalAnchor as H;
        use VerticalAnchor as V;
        match self {
            Self::Center => (H::Center, V::Middle),
            Self::Top => (H::Center, V::Top),
            Self::Bottom => (H::Center, V::Bottom),
            Self::Left => (H::Left, V::Middle),
            Self::Right => (H::Right, V::Middle),
            Self::TopLeft => (H::Left, V::Top),
            Self::TopRight => (H::Right, V::Top),
            Self::BottomLeft => (H::Left, V::Bottom),
            Self::BottomRight => (H::Right, V::Bottom),
        }
    }
}

impl fmt::Display for ImagePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImagePosition {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        let key = match option_key(s).as_str() {
            "centre" | "middle" => "center".to_string(),
            other => other.to_string(),
        };
        Self::ALL
            .iter()
            .find(|pos| pos.name() == key)
            .copied()
            .ok_or_else(|| {
                ConvertError::Configuration(format!(
                    "unknown image position '{s}' (expected center, top, bottom, left, right, \
                     top_left, top_right, bottom_left or bottom_right)"
                ))
            })
    }
}

/// Clockwise canvas rotation. Only right angles are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Parse a degree value; anything but 0, 90, 180 or 270 is rejected.
    pub fn from_degrees(degrees: i64) -> Result<Self> {
        match degrees {
            0 => Ok(Self::None),
            90 => Ok(Self::Cw90),
            180 => Ok(Self::Cw180),
            270 => Ok(Self::Cw270),
            other => Err(ConvertError::Configuration(format!(
                "rotation must be 0, 90, 180 or 270 degrees, got {other}"
            ))),
        }
    }

    pub fn degrees(&self) -> u16 {
        match self {
            Self::None => 0,
            Self::Cw90 => 90,
            Self::Cw180 => 180,
            Self::Cw270 => 270,
        }
    }

    /// Whether this rotation exchanges width and height.
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Self::Cw90 | Self::Cw270)
    }
}

/// Single visual effect applied after resize and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ImageFilter {
    #[default]
    None,
    Blur,
    Sharpen,
    EdgeDetect,
    Contour,
    Emboss,
    Smooth,
}

impl ImageFilter {
    pub const ALL: [ImageFilter; 7] = [
        Self::None,
        Self::Blur,
        Self::Sharpen,
        Self::EdgeDetect,
        Self::Contour,
        Self::Emboss,
        Self::Smooth,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Blur => "blur",
            Self::Sharpen => "sharpen",
            Self::EdgeDetect => "edge_detect",
            Self::Contour => "contour",
            Self::Emboss => "emboss",
            Self::Smooth => "smooth",
        }
    }
}

impl fmt::Display for ImageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageFilter {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        let key = option_key(s);
        Self::ALL
            .iter()
            .find(|filter| filter.name() == key)
            .copied()
            .ok_or_else(|| {
                ConvertError::Configuration(format!(
                    "unknown filter '{s}' (expected none, blur, sharpen, edge_detect, contour, \
                     emboss or smooth)"
                ))
            })
    }
}

/// Largest width or height, in pixels, an embedded page image can have
/// (the JPEG frame header stores each side in 16 bits).
pub const MAX_IMAGE_SIDE: u32 = 65_535;

/// Per-image preprocessing, applied in the fixed order resize → rotate → filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformRequest {
    /// Target width in pixels. Alone, height follows the aspect ratio.
    pub target_width: Option<u32>,
    /// Target height in pixels. Alone, width follows the aspect ratio.
    pub target_height: Option<u32>,
    pub rotation: Rotation,
    pub filter: ImageFilter,
}

impl TransformRequest {
    /// A request that leaves the image untouched.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn with_resize(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.target_width = width;
        self.target_height = height;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_filter(mut self, filter: ImageFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Target dimensions must be between 1 and [`MAX_IMAGE_SIDE`] when present.
    pub fn validate(&self) -> Result<()> {
        for (axis, value) in [("width", self.target_width), ("height", self.target_height)] {
            match value {
                Some(0) => {
                    return Err(ConvertError::Configuration(format!(
                        "target {axis} must be a positive number of pixels"
                    )));
                }
                Some(px) if px > MAX_IMAGE_SIDE => {
                    return Err(ConvertError::Configuration(format!(
                        "target {axis} of {px} pixels exceeds the {MAX_IMAGE_SIDE} pixel limit"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn resizes(&self) -> bool {
        self.target_width.is_some() || self.target_height.is_some()
    }
}

/// JPEG encoding quality for embedded page images, 1 (smallest) to 100 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const DEFAULT: Quality = Quality(95);

    pub fn new(value: i64) -> Result<Self> {
        if (1..=100).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ConvertError::Configuration(format!(
                "quality must be between 1 and 100, got {value}"
            )))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether the layout engine may scale an image beyond its pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalePolicy {
    /// Largest aspect-preserving fit; small images are enlarged.
    #[default]
    Fit,
    /// As `Fit`, but the scale factor never exceeds 1.0 (one pixel per point).
    ShrinkOnly,
}

/// What happens when one input of a batch cannot be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// The first failure aborts the whole conversion; nothing is written.
    #[default]
    Abort,
    /// Failing inputs produce no page and are reported alongside the output.
    Skip,
}

/// Document-level metadata written once into the PDF `/Info` dictionary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    /// Written as `/CreationDate` when present.
    pub creation_date: Option<DateTime<Utc>>,
}

impl PdfMetadata {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_creation_date(mut self, date: DateTime<Utc>) -> Self {
        self.creation_date = Some(date);
        self
    }

    /// `(key, value)` pairs for every string field that is set and non-empty,
    /// keyed by their `/Info` dictionary names.
    pub fn info_entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        })
        .collect()
    }

    /// `/CreationDate` in PDF date syntax (`D:YYYYMMDDHHmmSSZ`), if set.
    pub fn pdf_creation_date(&self) -> Option<String> {
        self.creation_date
            .map(|date| date.format("D:%Y%m%d%H%M%SZ").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_names_round_trip() {
        for size in PageSize::NAMED {
            assert_eq!(size.name().parse::<PageSize>().unwrap(), size);
        }
        assert_eq!("a4-landscape".parse::<PageSize>().unwrap(), PageSize::A4Landscape);
        assert_eq!("letter".parse::<PageSize>().unwrap(), PageSize::Letter);
    }

    #[test]
    fn custom_page_size_parses() {
        let size: PageSize = "100x150mm".parse().unwrap();
        assert_eq!(size.dimensions_mm(), (100.0, 150.0));
        assert!("0x150mm".parse::<PageSize>().is_err());
    }

    #[test]
    fn unknown_page_size_is_configuration_error() {
        let err = "B7".parse::<PageSize>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }

    #[test]
    fn landscape_swaps_portrait_dimensions() {
        let (w, h) = PageSize::A4.dimensions_mm();
        assert_eq!(PageSize::A4Landscape.dimensions_mm(), (h, w));
        let (w, h) = PageSize::Letter.dimensions_mm();
        assert_eq!(PageSize::LetterLandscape.dimensions_mm(), (h, w));
    }

    #[test]
    fn rotation_accepts_only_right_angles() {
        for deg in [0, 90, 180, 270] {
            assert_eq!(Rotation::from_degrees(deg).unwrap().degrees() as i64, deg);
        }
        for deg in [45, -90, 360, 1] {
            let err = Rotation::from_degrees(deg).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::Configuration);
        }
    }

    #[test]
    fn quality_bounds() {
        assert!(Quality::new(1).is_ok());
        assert!(Quality::new(100).is_ok());
        assert!(Quality::new(0).is_err());
        assert!(Quality::new(101).is_err());
        assert_eq!(Quality::default().get(), 95);
    }

    #[test]
    fn position_and_filter_parse() {
        assert_eq!("top-left".parse::<ImagePosition>().unwrap(), ImagePosition::TopLeft);
        assert_eq!("Centre".parse::<ImagePosition>().unwrap(), ImagePosition::Center);
        assert!("middle_left".parse::<ImagePosition>().is_err());
        assert_eq!("edge-detect".parse::<ImageFilter>().unwrap(), ImageFilter::EdgeDetect);
        assert!("sepia".parse::<ImageFilter>().is_err());
    }

    #[test]
    fn zero_target_dimension_rejected() {
        let req = TransformRequest::identity().with_resize(Some(0), None);
        assert!(req.validate().is_err());
        let req = TransformRequest::identity().with_resize(Some(800), Some(600));
        assert!(req.validate().is_ok());
        assert!(req.resizes());
    }

    #[test]
    fn oversized_target_dimension_rejected() {
        let req = TransformRequest::identity().with_resize(Some(200_000), Some(200_000));
        let err = req.validate().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);

        let req = TransformRequest::identity().with_resize(None, Some(MAX_IMAGE_SIDE + 1));
        assert!(req.validate().is_err());
        let req = TransformRequest::identity().with_resize(Some(MAX_IMAGE_SIDE), None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn info_entries_skip_empty_fields() {
        let meta = PdfMetadata::default()
            .with_title("旅行アルバム")
            .with_author("")
            .with_creator("MKPDF");
        assert_eq!(
            meta.info_entries(),
            vec![("Title", "旅行アルバム"), ("Creator", "MKPDF")]
        );
    }

    #[test]
    fn creation_date_uses_pdf_syntax() {
        use chrono::TimeZone;
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let meta = PdfMetadata::default().with_creation_date(date);
        assert_eq!(meta.pdf_creation_date().as_deref(), Some("D:20240309140500Z"));
        assert_eq!(PdfMetadata::default().pdf_creation_date(), None);
    }
}
