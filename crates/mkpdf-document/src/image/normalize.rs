// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Colour normalisation. Every source image becomes opaque 8-bit RGB before it
// is transformed or placed; transparency is flattened onto white.

use image::{DynamicImage, Rgb, RgbImage};
use tracing::{debug, instrument};

use super::decode::{SourceImage, SourcePixels};

const WHITE: u16 = 255;

/// An opaque 8-bit RGB image, the only pixel layout later stages accept.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    rgb: RgbImage,
}

impl NormalizedImage {
    /// Wrap an RGB buffer that is already opaque.
    pub fn from_rgb(rgb: RgbImage) -> Self {
        Self { rgb }
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn into_rgb(self) -> RgbImage {
        self.rgb
    }
}

/// Converts decoded images of any colour mode to [`NormalizedImage`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorNormalizer;

impl ColorNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Produce opaque RGB from `source`. Dimensions are preserved and fully
    /// opaque pixels keep their colour exactly.
    #[instrument(skip_all, fields(width = source.width(), height = source.height(), mode = ?source.mode()))]
    pub fn normalize(&self, source: SourceImage) -> NormalizedImage {
        let has_alpha = source.has_alpha();
        let rgb = match source.into_pixels() {
            SourcePixels::Decoded(DynamicImage::ImageRgb8(rgb)) => rgb,
            SourcePixels::Decoded(image) if has_alpha => flatten_rgba(&image),
            SourcePixels::Decoded(image) => image.to_rgb8(),
            SourcePixels::Cmyk {
                width,
                height,
                data,
            } => cmyk_to_rgb(width, height, &data),
            SourcePixels::Indexed {
                width,
                height,
                indices,
                palette,
            } => RgbImage::from_fn(width, height, |x, y| {
                let index = indices[(y as usize) * (width as usize) + x as usize];
                let [r, g, b, a] = palette[usize::from(index)];
                Rgb([over_white(r, a), over_white(g, a), over_white(b, a)])
            }),
        };
        debug!(has_alpha, "Image normalised to RGB");
        NormalizedImage { rgb }
    }
}

/// Composite an image with alpha over a white background.
fn flatten_rgba(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        Rgb([over_white(r, a), over_white(g, a), over_white(b, a)])
    })
}

/// Naive device conversion: `channel = (255 - ink) * (255 - black) / 255`.
fn cmyk_to_rgb(width: u32, height: u32, data: &[u8]) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let offset = ((y as usize) * (width as usize) + x as usize) * 4;
        let k = WHITE - u16::from(data[offset + 3]);
        let channel = |ink: u8| -> u8 { ((WHITE - u16::from(ink)) * k / WHITE) as u8 };
        Rgb([
            channel(data[offset]),
            channel(data[offset + 1]),
            channel(data[offset + 2]),
        ])
    })
}

fn over_white(value: u8, alpha: u8) -> u8 {
    let a = u16::from(alpha);
    ((a * u16::from(value) + (WHITE - a) * WHITE + 127) / WHITE) as u8
}
