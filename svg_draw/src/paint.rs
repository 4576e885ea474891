// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint values and the entry point for paint servers.

use std::str::FromStr;
use std::sync::Arc;

use peniko::kurbo::{Affine, Rect};
use peniko::{Color, Gradient};

use crate::context::DrawContext;
use crate::node::{ElementKind, Node};
use crate::surface::Fragment;
use crate::{gradient, pattern, Error, Result};

/// A resolved fill or stroke paint.
#[derive(Clone, Debug)]
pub enum Paint {
    /// A single color.
    Solid(Color),
    /// A linear or radial gradient.
    Gradient(GradientPaint),
    /// A repeating tile.
    Pattern(Arc<PatternTile>),
}

impl PartialEq for Paint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Solid(a), Self::Solid(b)) => a == b,
            (Self::Gradient(a), Self::Gradient(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A gradient together with its placement.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientPaint {
    /// Gradient geometry, extend mode and stops, in gradient space.
    pub gradient: Gradient,
    /// Maps gradient space onto the user space of the painted element.
    pub transform: Affine,
    /// The user space area the gradient has to cover: the painted element's
    /// bounding box, grown by the stroke margin for strokes.
    pub bounds: Rect,
}

/// A tiling pattern cell.
#[derive(Clone, Debug)]
pub struct PatternTile {
    /// The content of one cell. Its bounds are the cell rectangle.
    pub fragment: Arc<Fragment>,
    /// Horizontal distance between cells, in pattern space.
    pub x_step: f64,
    /// Vertical distance between cells, in pattern space.
    pub y_step: f64,
    /// Maps pattern space onto the user space of the painted element.
    pub matrix: Affine,
}

/// A parsed `fill` or `stroke` value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PaintValue {
    None,
    Color(Color),
    /// A reference to a paint server, with the color to use when the server
    /// cannot produce a paint. A `None` fallback paints nothing.
    Server {
        id: String,
        fallback: Option<Color>,
    },
}

/// Parses a paint value, substituting `current_color` for `currentColor`.
pub(crate) fn parse_paint(value: &str, current_color: Color) -> Result<PaintValue> {
    let paint = match svgtypes::Paint::from_str(value)? {
        svgtypes::Paint::None => PaintValue::None,
        svgtypes::Paint::CurrentColor => PaintValue::Color(current_color),
        svgtypes::Paint::Color(c) => PaintValue::Color(convert(c)),
        svgtypes::Paint::FuncIRI(id, fallback) => PaintValue::Server {
            id: id.to_owned(),
            fallback: match fallback {
                Some(svgtypes::PaintFallback::Color(c)) => Some(convert(c)),
                Some(svgtypes::PaintFallback::CurrentColor) => Some(current_color),
                Some(svgtypes::PaintFallback::None) | None => None,
            },
        },
        _ => return Err(Error::invalid("paint", value)),
    };
    Ok(paint)
}

/// Parses a color such as `#f00`, `rgb(255 0 0)` or `red`.
pub fn parse_color(value: &str) -> Result<Color> {
    Ok(convert(svgtypes::Color::from_str(value.trim())?))
}

fn convert(c: svgtypes::Color) -> Color {
    Color::rgba8(c.red, c.green, c.blue, c.alpha)
}

/// Builds the paint a paint server produces for an element.
///
/// `bbox` is the bounding box of the element being painted, `margin` grows
/// it for the area a gradient must cover (half the stroke width for
/// strokes), and `opacity` multiplies gradient stop alphas.
///
/// Returns `None` when there is no bounding box yet, when `server` is not a
/// paint server, and when the server cannot produce a paint: no stops,
/// degenerate tiles or a pattern that is already being built.
pub fn create_paint(
    ctx: &mut DrawContext<'_>,
    server: &Node,
    bbox: Option<Rect>,
    margin: f64,
    opacity: f32,
) -> Option<Paint> {
    let Some(bbox) = bbox else {
        log::debug!(
            "Paint server {:?} used without a bounding box",
            server.attributes.id()
        );
        return None;
    };
    match server.kind {
        ElementKind::LinearGradient | ElementKind::RadialGradient => {
            gradient::create_paint(server, ctx, bbox, margin, opacity)
        }
        ElementKind::Pattern => pattern::create_paint(server, ctx, bbox),
        _ => {
            log::warn!(
                "Element {:?} is referenced as a paint server but is a {:?}",
                server.attributes.id(),
                server.kind
            );
            None
        }
    }
}
