// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source image decoding. Turns encoded bytes (JPEG, PNG, BMP, GIF, TIFF, WebP)
// into a `SourceImage` tagged with its colour mode, bit depth, and alpha flag.
// Multi-frame containers contribute their first frame only.

use std::io::Cursor;
use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use mkpdf_core::error::{ConvertError, Result};
use tracing::{debug, instrument};

/// ISO-BMFF major brands that identify HEIF-family files.
const HEIF_BRANDS: [&[u8; 4]; 8] = [
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];

/// Colour layout of a decoded image, before normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Single luminance channel (includes expanded 1-bit images).
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
    /// Four subtractive channels, 8 bits each.
    Cmyk,
    /// Palette indices into an RGBA colour table.
    Indexed,
}

/// Pixel storage for the layouts the `image` crate does not model.
#[derive(Debug, Clone)]
enum Pixels {
    Decoded(DynamicImage),
    Cmyk(Vec<u8>),
    Indexed {
        indices: Vec<u8>,
        palette: Vec<[u8; 4]>,
    },
}

/// A decoded image exactly as the source described it.
///
/// Immutable once built; the pipeline consumes it when the page is normalised.
#[derive(Debug, Clone)]
pub struct SourceImage {
    width: u32,
    height: u32,
    mode: ColorMode,
    bit_depth: u8,
    format: Option<ImageFormat>,
    pixels: Pixels,
}

impl SourceImage {
    // -- Construction ---------------------------------------------------------

    /// Decode encoded image bytes. The container format is sniffed from the
    /// leading magic bytes, not from any file name.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn decode(data: &[u8]) -> Result<Self> {
        if let Some(brand) = heif_brand(data) {
            return Err(ConvertError::HeifUnavailable { brand });
        }

        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|err| ConvertError::Decode(format!("cannot read image header: {err}")))?;
        let format = reader
            .format()
            .ok_or_else(|| ConvertError::Decode("unrecognised image format".into()))?;

        let image = reader
            .decode()
            .map_err(|err| ConvertError::Decode(format!("{format:?} decoding failed: {err}")))?;

        let mut source = Self::from_dynamic(image);
        source.format = Some(format);
        debug!(
            ?format,
            width = source.width,
            height = source.height,
            mode = ?source.mode,
            "Image decoded"
        );
        Ok(source)
    }

    /// Read and decode an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|err| ConvertError::io(path, err))?;
        Self::decode(&data)
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let color = image.color();
        let mode = match color {
            ColorType::L8 | ColorType::L16 => ColorMode::Gray,
            ColorType::La8 | ColorType::La16 => ColorMode::GrayAlpha,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => ColorMode::Rgba,
            other if other.has_alpha() => ColorMode::Rgba,
            _ => ColorMode::Rgb,
        };
        let bit_depth = (color.bits_per_pixel() / u16::from(color.channel_count().max(1))) as u8;

        Self {
            width: image.width(),
            height: image.height(),
            mode,
            bit_depth,
            format: None,
            pixels: Pixels::Decoded(image),
        }
    }

    /// Build a CMYK image from interleaved 8-bit `C M Y K` samples.
    pub fn from_cmyk(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = pixel_count(width, height)? * 4;
        if data.len() != expected {
            return Err(ConvertError::Decode(format!(
                "CMYK buffer holds {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            mode: ColorMode::Cmyk,
            bit_depth: 8,
            format: None,
            pixels: Pixels::Cmyk(data),
        })
    }

    /// Build a palette image. Each index selects an RGBA entry of `palette`.
    pub fn from_indexed(
        width: u32,
        height: u32,
        indices: Vec<u8>,
        palette: Vec<[u8; 4]>,
    ) -> Result<Self> {
        let expected = pixel_count(width, height)?;
        if indices.len() != expected {
            return Err(ConvertError::Decode(format!(
                "palette image holds {} indices, expected {expected} for {width}x{height}",
                indices.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| usize::from(i) >= palette.len()) {
            return Err(ConvertError::Decode(format!(
                "palette index {bad} out of range for a {}-entry palette",
                palette.len()
            )));
        }
        Ok(Self {
            width,
            height,
            mode: ColorMode::Indexed,
            bit_depth: 8,
            format: None,
            pixels: Pixels::Indexed { indices, palette },
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    /// Bits per channel.
    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    /// Container format, when the image was decoded from bytes.
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// Whether any pixel can be less than fully opaque.
    pub fn has_alpha(&self) -> bool {
        match &self.pixels {
            Pixels::Decoded(image) => image.color().has_alpha(),
            Pixels::Cmyk(_) => false,
            Pixels::Indexed { palette, .. } => palette.iter().any(|entry| entry[3] < u8::MAX),
        }
    }

    pub(crate) fn into_pixels(self) -> SourcePixels {
        match self.pixels {
            Pixels::Decoded(image) => SourcePixels::Decoded(image),
            Pixels::Cmyk(data) => SourcePixels::Cmyk {
                width: self.width,
                height: self.height,
                data,
            },
            Pixels::Indexed { indices, palette } => SourcePixels::Indexed {
                width: self.width,
                height: self.height,
                indices,
                palette,
            },
        }
    }
}

/// Owned pixel payload handed to the normaliser.
pub(crate) enum SourcePixels {
    Decoded(DynamicImage),
    Cmyk {
        width: u32,
        height: u32,
        data: Vec<u8>,
    },
    Indexed {
        width: u32,
        height: u32,
        indices: Vec<u8>,
        palette: Vec<[u8; 4]>,
    },
}

fn pixel_count(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(ConvertError::Decode(format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| ConvertError::Decode(format!("image {width}x{height} is too large")))
}

/// Return the major brand if `data` starts with an ISO-BMFF `ftyp` box of a
/// HEIF-family file.
fn heif_brand(data: &[u8]) -> Option<String> {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return None;
    }
    let brand = &data[8..12];
    HEIF_BRANDS
        .iter()
        .any(|known| known.as_slice() == brand)
        .then(|| String::from_utf8_lossy(brand).into_owned())
}
