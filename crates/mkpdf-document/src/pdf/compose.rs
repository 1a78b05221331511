// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page composition: one normalised image becomes one self-contained page: a
// white background, a DCT (JPEG) image XObject, and the content stream that
// draws it into its placement rectangle.

use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, Stream, dictionary};
use mkpdf_core::error::{ConvertError, Result};
use mkpdf_core::types::Quality;
use tracing::{debug, instrument};

use super::layout::PlacementRect;
use crate::image::normalize::NormalizedImage;

/// Resource name of the page image inside the page's `/XObject` dictionary.
pub const IMAGE_RESOURCE: &str = "Im0";

/// A finished page, independent of any document. The assembler turns it into
/// PDF objects.
#[derive(Debug, Clone)]
pub struct ComposedPage {
    page_width: f32,
    page_height: f32,
    placement: PlacementRect,
    image_width: u32,
    image_height: u32,
    jpeg: Vec<u8>,
    content: Vec<u8>,
}

impl ComposedPage {
    /// Page size in points.
    pub fn page_size(&self) -> (f32, f32) {
        (self.page_width, self.page_height)
    }

    pub fn placement(&self) -> PlacementRect {
        self.placement
    }

    /// Pixel dimensions of the embedded image.
    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Encoded JPEG bytes of the embedded image.
    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }

    /// Decoded page content stream.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// The image as a DCT-encoded XObject stream.
    pub fn image_stream(&self) -> Stream {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.image_width as i64,
            "Height" => self.image_height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        Stream::new(dict, self.jpeg.clone()).with_compression(false)
    }

    pub fn content_stream(&self) -> Stream {
        Stream::new(Dictionary::new(), self.content.clone())
    }

    /// `[0 0 width height]`.
    pub fn media_box(&self) -> Vec<Object> {
        vec![
            0.into(),
            0.into(),
            self.page_width.into(),
            self.page_height.into(),
        ]
    }
}

/// Renders one image into one page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageComposer;

impl PageComposer {
    pub fn new() -> Self {
        Self
    }

    /// Encode `image` at `quality` and draw it into `placement` on a page of
    /// `page_size` points. The rest of the page stays white.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height(), quality = quality.get()))]
    pub fn compose(
        &self,
        image: &NormalizedImage,
        placement: PlacementRect,
        page_size: (f32, f32),
        quality: Quality,
    ) -> Result<ComposedPage> {
        let (page_width, page_height) = page_size;
        if !(page_width > 0.0 && page_height > 0.0) {
            return Err(ConvertError::Configuration(format!(
                "page dimensions must be positive, got {page_width}x{page_height} pt"
            )));
        }
        if placement.x < 0.0
            || placement.y < 0.0
            || placement.x + placement.width > page_width + 0.01
            || placement.y + placement.height > page_height + 0.01
        {
            return Err(ConvertError::Composition(format!(
                "placement {placement:?} exceeds the {page_width}x{page_height} pt page"
            )));
        }

        let jpeg = encode_jpeg(image, quality)?;
        let content = page_content(placement, page_width, page_height)?;
        debug!(jpeg_len = jpeg.len(), "Page composed");

        Ok(ComposedPage {
            page_width,
            page_height,
            placement,
            image_width: image.width(),
            image_height: image.height(),
            jpeg,
            content,
        })
    }
}

fn encode_jpeg(image: &NormalizedImage, quality: Quality) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.get());
    image
        .as_rgb()
        .write_with_encoder(encoder)
        .map_err(|err| ConvertError::Composition(format!("JPEG encoding failed: {err}")))?;
    Ok(buffer)
}

fn page_content(placement: PlacementRect, page_width: f32, page_height: f32) -> Result<Vec<u8>> {
    let content = Content {
        operations: vec![
            // white background
            Operation::new("q", vec![]),
            Operation::new("g", vec![1.into()]),
            Operation::new(
                "re",
                vec![0.into(), 0.into(), page_width.into(), page_height.into()],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
            // image, unit square scaled onto the placement
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    placement.width.into(),
                    0.into(),
                    0.into(),
                    placement.height.into(),
                    placement.x.into(),
                    placement.y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    content
        .encode()
        .map_err(|err| ConvertError::Composition(format!("content stream encoding failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample(width: u32, height: u32) -> NormalizedImage {
        NormalizedImage::from_rgb(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    fn placement() -> PlacementRect {
        PlacementRect {
            x: 10.0,
            y: 20.0,
            width: 100.0,
            height: 75.0,
        }
    }

    #[test]
    fn compose_embeds_jpeg_and_draw_ops() {
        let page = PageComposer::new()
            .compose(&sample(64, 48), placement(), (595.0, 842.0), Quality::DEFAULT)
            .unwrap();
        assert_eq!(page.image_size(), (64, 48));
        assert_eq!(page.page_size(), (595.0, 842.0));
        assert_eq!(&page.jpeg()[..2], &[0xFF, 0xD8]);

        let ops = Content::decode(page.content()).unwrap().operations;
        let operators: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, ["q", "g", "re", "f", "Q", "q", "cm", "Do", "Q"]);
    }

    #[test]
    fn higher_quality_is_larger() {
        let image = sample(200, 150);
        let composer = PageComposer::new();
        let low = composer
            .compose(&image, placement(), (595.0, 842.0), Quality::new(10).unwrap())
            .unwrap();
        let high = composer
            .compose(&image, placement(), (595.0, 842.0), Quality::new(100).unwrap())
            .unwrap();
        assert!(high.jpeg().len() > low.jpeg().len());
    }

    #[test]
    fn image_stream_is_dct_rgb() {
        let page = PageComposer::new()
            .compose(&sample(8, 8), placement(), (595.0, 842.0), Quality::DEFAULT)
            .unwrap();
        let stream = page.image_stream();
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        assert_eq!(stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceRGB");
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 8);
    }

    #[test]
    fn placement_outside_page_is_rejected() {
        let rect = PlacementRect {
            x: 500.0,
            y: 0.0,
            width: 200.0,
            height: 10.0,
        };
        let err = PageComposer::new()
            .compose(&sample(4, 4), rect, (595.0, 842.0), Quality::DEFAULT)
            .unwrap_err();
        assert_eq!(err.kind(), mkpdf_core::ErrorKind::Composition);
    }
}
