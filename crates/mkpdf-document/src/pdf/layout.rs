// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout: where an image of a given pixel size lands on a page.
//
// All coordinates are PDF user space in points, origin at the bottom-left of
// the page, y increasing upward.

use mkpdf_core::error::{ConvertError, Result};
use mkpdf_core::types::{HorizontalAnchor, ImagePosition, PageSize, ScalePolicy, VerticalAnchor};
use printpdf::Mm;

/// Page dimensions of `size` in points.
pub fn page_dimensions_pt(size: PageSize) -> (f32, f32) {
    let (w_mm, h_mm) = size.dimensions_mm();
    (Mm(w_mm).into_pt().0, Mm(h_mm).into_pt().0)
}

/// The region of a page an image is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRect {
    /// Left edge.
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PlacementRect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }
}

/// Computes aspect-preserving fit-within placements.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageLayoutEngine {
    scale: ScalePolicy,
}

impl PageLayoutEngine {
    pub fn new(scale: ScalePolicy) -> Self {
        Self { scale }
    }

    /// Place an image on a page with the default fit policy (upscaling allowed).
    pub fn layout(
        image_width: u32,
        image_height: u32,
        page_width: f32,
        page_height: f32,
        position: ImagePosition,
    ) -> Result<PlacementRect> {
        Self::new(ScalePolicy::Fit).place(
            image_width,
            image_height,
            page_width,
            page_height,
            position,
        )
    }

    /// Largest rectangle with the image's aspect ratio that fits the page,
    /// anchored per `position`. Under [`ScalePolicy::ShrinkOnly`] one image
    /// pixel never covers more than one point.
    pub fn place(
        &self,
        image_width: u32,
        image_height: u32,
        page_width: f32,
        page_height: f32,
        position: ImagePosition,
    ) -> Result<PlacementRect> {
        if image_width == 0 || image_height == 0 {
            return Err(ConvertError::Configuration(format!(
                "image dimensions must be positive, got {image_width}x{image_height}"
            )));
        }
        if !(page_width.is_finite() && page_height.is_finite())
            || page_width <= 0.0
            || page_height <= 0.0
        {
            return Err(ConvertError::Configuration(format!(
                "page dimensions must be positive, got {page_width}x{page_height} pt"
            )));
        }

        let (img_w, img_h) = (image_width as f32, image_height as f32);
        let mut scale = (page_width / img_w).min(page_height / img_h);
        if self.scale == ScalePolicy::ShrinkOnly {
            scale = scale.min(1.0);
        }

        // Rounding can push the scaled side a hair past the page edge.
        let width = (img_w * scale).min(page_width);
        let height = (img_h * scale).min(page_height);

        let (horizontal, vertical) = position.anchors();
        let x = match horizontal {
            HorizontalAnchor::Left => 0.0,
            HorizontalAnchor::Center => (page_width - width) / 2.0,
            HorizontalAnchor::Right => page_width - width,
        };
        let y = match vertical {
            VerticalAnchor::Bottom => 0.0,
            VerticalAnchor::Middle => (page_height - height) / 2.0,
            VerticalAnchor::Top => page_height - height,
        };

        Ok(PlacementRect {
            x: x.max(0.0),
            y: y.max(0.0),
            width,
            height,
        })
    }
}
