// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition of affine transforms for elements, viewports and paint servers.

use std::str::FromStr;

use peniko::kurbo::{Affine, Point, Rect, Size, Vec2};
use svgtypes::{Align, AspectRatio};

use crate::{Error, Result};

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Operations on [`Affine`] used throughout the renderer.
pub trait AffineExt: Sized {
    /// Returns the transform that applies `other` in the coordinate system
    /// established by `self`, i.e. `self * other`.
    fn concatenate(self, other: Affine) -> Affine;

    /// Inverts the transform, failing for singular matrices instead of
    /// producing non-finite coefficients.
    fn try_invert(self) -> Result<Affine>;

    /// Whether this is (numerically) the identity.
    fn is_identity(&self) -> bool;
}

impl AffineExt for Affine {
    fn concatenate(self, other: Affine) -> Affine {
        self * other
    }

    fn try_invert(self) -> Result<Affine> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return Err(Error::SingularTransform(self));
        }
        let inverse = self.inverse();
        if inverse.as_coeffs().iter().all(|c| c.is_finite()) {
            Ok(inverse)
        } else {
            Err(Error::SingularTransform(self))
        }
    }

    fn is_identity(&self) -> bool {
        *self == Affine::IDENTITY
    }
}

/// Parses a transform list such as `translate(10 20) rotate(45)`.
///
/// Translations are expressed in target units: `unit_scale` converts the
/// pixel-based translation components.
pub fn parse_transform(value: &str, unit_scale: f64) -> Result<Affine> {
    let ts = svgtypes::Transform::from_str(value)?;
    Ok(Affine::new([
        ts.a,
        ts.b,
        ts.c,
        ts.d,
        ts.e * unit_scale,
        ts.f * unit_scale,
    ]))
}

/// Maps object bounding box space (scaled by `unit_scale`) onto user space.
///
/// Coordinates in bounding box units are multiplied by `unit_scale` before
/// this transform is applied, which keeps their magnitude comparable to user
/// space values while transforms are concatenated.
pub fn bbox_transform(bbox: Rect, unit_scale: f64) -> Affine {
    Affine::translate(bbox.origin().to_vec2())
        * Affine::scale_non_uniform(bbox.width() / unit_scale, bbox.height() / unit_scale)
}

/// Computes the rectangle a `viewBox` occupies once fitted into a viewport of
/// `size`, relative to the viewport origin.
///
/// With `slice` the result may overflow the viewport.
pub fn fit_view_box(view_box: Rect, aspect: AspectRatio, size: Size) -> Rect {
    let vb_size = view_box.size();
    if aspect.align == Align::None {
        return Rect::from_origin_size(Point::ZERO, size);
    }
    let sx = size.width / vb_size.width;
    let sy = size.height / vb_size.height;
    let scale = if aspect.slice { sx.max(sy) } else { sx.min(sy) };
    let fitted = Size::new(vb_size.width * scale, vb_size.height * scale);
    let offset = aligned_offset(aspect.align, size - fitted);
    Rect::from_origin_size(offset.to_point(), fitted)
}

/// Computes the transform mapping `view_box` into a viewport of `size`
/// whose origin is at zero.
pub fn view_box_transform(view_box: Rect, aspect: AspectRatio, size: Size) -> Affine {
    let fitted = fit_view_box(view_box, aspect, size);
    Affine::translate(fitted.origin().to_vec2())
        * Affine::scale_non_uniform(
            fitted.width() / view_box.width(),
            fitted.height() / view_box.height(),
        )
        * Affine::translate(-view_box.origin().to_vec2())
}

fn aligned_offset(align: Align, slack: Size) -> Vec2 {
    let (w, h) = (slack.width, slack.height);
    match align {
        Align::None | Align::XMinYMin => Vec2::new(0.0, 0.0),
        Align::XMidYMin => Vec2::new(w / 2.0, 0.0),
        Align::XMaxYMin => Vec2::new(w, 0.0),
        Align::XMinYMid => Vec2::new(0.0, h / 2.0),
        Align::XMidYMid => Vec2::new(w / 2.0, h / 2.0),
        Align::XMaxYMid => Vec2::new(w, h / 2.0),
        Align::XMinYMax => Vec2::new(0.0, h),
        Align::XMidYMax => Vec2::new(w / 2.0, h),
        Align::XMaxYMax => Vec2::new(w, h),
    }
}

/// The placement of a marker instance at a vertex.
pub fn marker_transform(position: Point, angle: f64, scale: f64) -> Affine {
    Affine::translate(position.to_vec2()) * Affine::rotate(angle) * Affine::scale(scale)
}

/// Flips the vertical axis within a box of the given height.
pub fn flip_y(height: f64) -> Affine {
    Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, height])
}
