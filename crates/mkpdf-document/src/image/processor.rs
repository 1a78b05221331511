// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image transformer: resize, rotate, filter. Operates on normalised RGB images
// using the `image` and `imageproc` crates.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use mkpdf_core::error::{ConvertError, Result};
use mkpdf_core::types::{ImageFilter, MAX_IMAGE_SIDE, Rotation, TransformRequest};
use tracing::{debug, instrument};

use super::normalize::NormalizedImage;

/// Standard deviation of the Gaussian used by [`ImageFilter::Blur`].
const BLUR_SIGMA: f32 = 1.5;

/// Transformation pipeline operating on a single normalised image.
///
/// Each method consumes `self` and returns the transformed image, so stages
/// chain. Only [`ImageTransformer::resize`] can fail. [`ImageTransformer::apply`] runs a whole [`TransformRequest`] in the
/// fixed order resize → rotate → filter.
///
/// ```ignore
/// let page_image = ImageTransformer::new(normalized)
///     .resize(Some(800), Some(600))?
///     .rotate(Rotation::Cw90)
///     .filter(ImageFilter::Sharpen)
///     .finish();
/// ```
pub struct ImageTransformer {
    image: RgbImage,
}

impl ImageTransformer {
    pub fn new(image: NormalizedImage) -> Self {
        Self {
            image: image.into_rgb(),
        }
    }

    /// Validate `request` and apply it to `image`.
    #[instrument(skip(image), fields(width = image.width(), height = image.height()))]
    pub fn apply(image: NormalizedImage, request: &TransformRequest) -> Result<NormalizedImage> {
        request.validate()?;
        Ok(Self::new(image)
            .resize(request.target_width, request.target_height)?
            .rotate(request.rotation)
            .filter(request.filter)
            .finish())
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn finish(self) -> NormalizedImage {
        NormalizedImage::from_rgb(self.image)
    }

    // -- Transformations ------------------------------------------------------

    /// Resize with Lanczos3 resampling.
    ///
    /// Both dimensions given: scale to exactly `width` x `height`, ignoring the
    /// aspect ratio. One given: the other follows the source aspect ratio
    /// (rounded, at least one pixel). Neither: no-op.
    ///
    /// A derived side above [`MAX_IMAGE_SIDE`] is a composition error, raised
    /// before any pixel buffer is allocated.
    pub fn resize(self, width: Option<u32>, height: Option<u32>) -> Result<Self> {
        let (src_w, src_h) = self.image.dimensions();
        let Some((new_w, new_h)) = target_dimensions(src_w, src_h, width, height)? else {
            return Ok(self);
        };
        if (new_w, new_h) == (src_w, src_h) {
            return Ok(self);
        }

        debug!(from_w = src_w, from_h = src_h, new_w, new_h, "Resizing image");
        Ok(Self {
            image: imageops::resize(&self.image, new_w, new_h, FilterType::Lanczos3),
        })
    }

    /// Rotate clockwise by a right angle. 90 and 270 swap width and height.
    pub fn rotate(self, rotation: Rotation) -> Self {
        let image = match rotation {
            Rotation::None => return self,
            Rotation::Cw90 => imageops::rotate90(&self.image),
            Rotation::Cw180 => imageops::rotate180(&self.image),
            Rotation::Cw270 => imageops::rotate270(&self.image),
        };
        debug!(degrees = rotation.degrees(), "Rotation applied");
        Self { image }
    }

    /// Apply one named effect. Dimensions never change.
    pub fn filter(self, filter: ImageFilter) -> Self {
        let image = match filter {
            ImageFilter::None => return self,
            ImageFilter::Blur => imageproc::filter::gaussian_blur_f32(&self.image, BLUR_SIGMA),
            ImageFilter::Smooth => convolve3x3(&self.image, &Kernel::SMOOTH),
            ImageFilter::Sharpen => convolve3x3(&self.image, &Kernel::SHARPEN),
            ImageFilter::EdgeDetect => convolve3x3(&self.image, &Kernel::EDGE_DETECT),
            ImageFilter::Contour => convolve3x3(&self.image, &Kernel::CONTOUR),
            ImageFilter::Emboss => convolve3x3(&self.image, &Kernel::EMBOSS),
        };
        debug!(filter = filter.name(), "Filter applied");
        Self { image }
    }
}

fn target_dimensions(
    src_w: u32,
    src_h: u32,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<Option<(u32, u32)>> {
    let derive = |given: u32, num: u32, den: u32| -> Result<u32> {
        let side = (f64::from(given) * f64::from(num) / f64::from(den)).round();
        if side > f64::from(MAX_IMAGE_SIDE) {
            return Err(ConvertError::Composition(format!(
                "resizing {src_w}x{src_h} to {given} pixels gives a {side} pixel side, \
                 above the {MAX_IMAGE_SIDE} pixel limit"
            )));
        }
        Ok((side as u32).max(1))
    };
    let dims = match (width, height) {
        (Some(w), Some(h)) => Some((w, h)),
        (Some(w), None) => Some((w, derive(w, src_h, src_w)?)),
        (None, Some(h)) => Some((derive(h, src_w, src_h)?, h)),
        (None, None) => None,
    };
    Ok(dims)
}

/// A 3x3 convolution: `out = clamp(round(sum(weights * px) / divisor + offset))`.
struct Kernel {
    weights: [i32; 9],
    divisor: i32,
    offset: i32,
}

impl Kernel {
    const SMOOTH: Kernel = Kernel {
        weights: [1, 1, 1, 1, 5, 1, 1, 1, 1],
        divisor: 13,
        offset: 0,
    };
    const SHARPEN: Kernel = Kernel {
        weights: [-2, -2, -2, -2, 32, -2, -2, -2, -2],
        divisor: 16,
        offset: 0,
    };
    const EDGE_DETECT: Kernel = Kernel {
        weights: [-1, -1, -1, -1, 8, -1, -1, -1, -1],
        divisor: 1,
        offset: 0,
    };
    const CONTOUR: Kernel = Kernel {
        weights: [-1, -1, -1, -1, 8, -1, -1, -1, -1],
        divisor: 1,
        offset: 255,
    };
    const EMBOSS: Kernel = Kernel {
        weights: [-1, 0, 0, 0, 1, 0, 0, 0, 0],
        divisor: 1,
        offset: 128,
    };
}

/// Border pixels sample with clamp-to-edge.
fn convolve3x3(image: &RgbImage, kernel: &Kernel) -> RgbImage {
    let (width, height) = image.dimensions();
    let max_x = i64::from(width) - 1;
    let max_y = i64::from(height) - 1;

    RgbImage::from_fn(width, height, |x, y| {
        let mut sums = [0i32; 3];
        for (i, weight) in kernel.weights.iter().enumerate() {
            if *weight == 0 {
                continue;
            }
            let sx = (i64::from(x) + (i % 3) as i64 - 1).clamp(0, max_x) as u32;
            let sy = (i64::from(y) + (i / 3) as i64 - 1).clamp(0, max_y) as u32;
            let Rgb(px) = *image.get_pixel(sx, sy);
            for (sum, channel) in sums.iter_mut().zip(px) {
                *sum += weight * i32::from(channel);
            }
        }
        let channel = |sum: i32| -> u8 {
            let value = sum as f32 / kernel.divisor as f32 + kernel.offset as f32;
            value.round().clamp(0.0, 255.0) as u8
        };
        Rgb([channel(sums[0]), channel(sums[1]), channel(sums[2])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkpdf_core::ErrorKind;

    fn flat(width: u32, height: u32, value: u8) -> NormalizedImage {
        NormalizedImage::from_rgb(RgbImage::from_pixel(width, height, Rgb([value; 3])))
    }

    /// Distinct pixel values so rotations can be told apart.
    fn gradient(width: u32, height: u32) -> NormalizedImage {
        NormalizedImage::from_rgb(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 10) as u8, (y * 10) as u8, 7])
        }))
    }

    #[test]
    fn literal_resize_ignores_aspect() {
        let out = ImageTransformer::new(flat(40, 40, 100))
            .resize(Some(80), Some(60))
            .unwrap()
            .finish();
        assert_eq!((out.width(), out.height()), (80, 60));
    }

    #[test]
    fn single_dimension_resize_keeps_aspect() {
        let out = ImageTransformer::new(flat(800, 600, 100))
            .resize(Some(400), None)
            .unwrap()
            .finish();
        assert_eq!((out.width(), out.height()), (400, 300));

        let out = ImageTransformer::new(flat(800, 600, 100))
            .resize(None, Some(150))
            .unwrap()
            .finish();
        assert_eq!((out.width(), out.height()), (200, 150));
    }

    #[test]
    fn derived_dimension_never_zero() {
        assert_eq!(target_dimensions(1000, 1, Some(10), None).unwrap(), Some((10, 1)));
        assert_eq!(target_dimensions(10, 10, None, None).unwrap(), None);
    }

    #[test]
    fn oversized_derived_side_fails_before_resizing() {
        // a 1x1000 strip widened to 100 px would need a 100000 px height
        let err = ImageTransformer::new(flat(1, 1000, 10))
            .resize(Some(100), None)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Composition);

        let request = TransformRequest::identity().with_resize(None, Some(MAX_IMAGE_SIDE));
        let err = ImageTransformer::apply(flat(3, 1, 10), &request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Composition);
    }

    #[test]
    fn oversized_literal_target_is_configuration_error() {
        let request = TransformRequest::identity().with_resize(Some(200_000), Some(200_000));
        let err = ImageTransformer::apply(flat(1, 1, 10), &request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn resize_then_rotate_swaps_canvas() {
        let request = TransformRequest::identity()
            .with_resize(Some(80), Some(60))
            .with_rotation(Rotation::Cw90);
        let out = ImageTransformer::apply(flat(30, 30, 50), &request).unwrap();
        assert_eq!((out.width(), out.height()), (60, 80));
    }

    #[test]
    fn rotation_round_trips() {
        let original = gradient(5, 3);
        let turned = ImageTransformer::new(original.clone())
            .rotate(Rotation::Cw90)
            .rotate(Rotation::Cw270)
            .finish();
        assert_eq!(turned, original);

        let half = ImageTransformer::new(original.clone())
            .rotate(Rotation::Cw180)
            .rotate(Rotation::Cw180)
            .finish();
        assert_eq!(half, original);
    }

    #[test]
    fn rotate_90_is_clockwise() {
        let out = ImageTransformer::new(gradient(5, 3))
            .rotate(Rotation::Cw90)
            .finish();
        assert_eq!((out.width(), out.height()), (3, 5));
        // the source's bottom-left pixel lands top-left after a clockwise turn
        assert_eq!(*out.as_rgb().get_pixel(0, 0), Rgb([0, 20, 7]));
    }

    #[test]
    fn kernels_on_flat_image() {
        let run = |filter| {
            *ImageTransformer::new(flat(4, 4, 90))
                .filter(filter)
                .finish()
                .as_rgb()
                .get_pixel(1, 1)
        };
        assert_eq!(run(ImageFilter::Smooth), Rgb([90; 3]));
        assert_eq!(run(ImageFilter::Sharpen), Rgb([90; 3]));
        assert_eq!(run(ImageFilter::EdgeDetect), Rgb([0; 3]));
        assert_eq!(run(ImageFilter::Contour), Rgb([255; 3]));
        assert_eq!(run(ImageFilter::Emboss), Rgb([128; 3]));
    }

    #[test]
    fn every_filter_preserves_dimensions() {
        for filter in ImageFilter::ALL {
            let out = ImageTransformer::new(gradient(7, 4)).filter(filter).finish();
            assert_eq!((out.width(), out.height()), (7, 4), "{filter}");
        }
    }

    #[test]
    fn zero_target_is_configuration_error() {
        let request = TransformRequest::identity().with_resize(None, Some(0));
        let err = ImageTransformer::apply(flat(2, 2, 0), &request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
