// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf shapes: geometry resolution and the leaf draw path.

use peniko::kurbo::{Affine, BezPath, Circle, Ellipse, Point, Rect, Shape};

use crate::attributes::names;
use crate::context::DrawContext;
use crate::marker;
use crate::node::{ElementKind, Node};
use crate::style::{fill_rule, PaintStyle};
use crate::surface::Surface;
use crate::units::{parse_number_list, Axis, UnitContext};
use crate::Result;

/// Control point distance for quarter ellipses approximated by cubics.
const KAPPA: f64 = 0.552_284_749_830_793_4;

/// Draws a leaf shape.
///
/// Shapes whose geometry is missing or degenerate emit nothing at all.
pub(crate) fn draw(node: &Node, ctx: &mut DrawContext<'_>) {
    if node.is_hidden() && !ctx.in_clip_path() {
        return;
    }
    let path = match geometry(node, ctx) {
        Ok(Some(path)) => path,
        Ok(None) => {
            log::debug!("{:?} {:?} has no geometry", node.kind, node.attributes.id());
            return;
        }
        Err(e) => {
            log::warn!("Skipping {:?} {:?}: {e}", node.kind, node.attributes.id());
            return;
        }
    };
    let bbox = path.bounding_box();
    node.draw_scoped(ctx, Some(bbox), |ctx| {
        if ctx.in_clip_path() {
            let rule = fill_rule(node.attributes.get_trimmed(names::CLIP_RULE));
            let surface = ctx.surface();
            surface.append_path(&path);
            surface.clip(rule);
            return;
        }
        let fillable = node.kind != ElementKind::Line;
        let style = PaintStyle::resolve(node, ctx, Some(bbox), fillable);
        let surface = ctx.surface();
        style.apply(surface);
        surface.append_path(&path);
        style.finish(surface);
        if node.kind.has_markers() {
            marker::draw_markers(node, &path, style.stroke_style.width, ctx);
        }
    });
}

/// Resolves the outline of a leaf shape in its user space.
///
/// Returns `Ok(None)` when required geometry is absent or not positive.
pub(crate) fn geometry(node: &Node, ctx: &DrawContext<'_>) -> Result<Option<BezPath>> {
    let units = ctx.units();
    let tolerance = ctx.options().tolerance;
    let get = |name, axis| length(node, &units, name, axis);
    let path = match node.kind {
        ElementKind::Rect => {
            let (Some(width), Some(height)) = (
                get(names::WIDTH, Axis::Horizontal)?,
                get(names::HEIGHT, Axis::Vertical)?,
            ) else {
                return Ok(None);
            };
            if width <= 0.0 || height <= 0.0 {
                return Ok(None);
            }
            let x = get(names::X, Axis::Horizontal)?.unwrap_or(0.0);
            let y = get(names::Y, Axis::Vertical)?.unwrap_or(0.0);
            let rx = get(names::RX, Axis::Horizontal)?.filter(|r| *r >= 0.0);
            let ry = get(names::RY, Axis::Vertical)?.filter(|r| *r >= 0.0);
            let (rx, ry) = match (rx, ry) {
                (None, None) => (0.0, 0.0),
                (Some(r), None) | (None, Some(r)) => (r, r),
                (Some(rx), Some(ry)) => (rx, ry),
            };
            let rect = Rect::new(x, y, x + width, y + height);
            rounded_rect(rect, rx.min(width / 2.0), ry.min(height / 2.0))
        }
        ElementKind::Circle => {
            let Some(r) = get(names::R, Axis::Diagonal)? else {
                return Ok(None);
            };
            if r <= 0.0 {
                return Ok(None);
            }
            let cx = get(names::CX, Axis::Horizontal)?.unwrap_or(0.0);
            let cy = get(names::CY, Axis::Vertical)?.unwrap_or(0.0);
            Circle::new((cx, cy), r).to_path(tolerance)
        }
        ElementKind::Ellipse => {
            let rx = get(names::RX, Axis::Horizontal)?;
            let ry = get(names::RY, Axis::Vertical)?;
            let (rx, ry) = match (rx, ry) {
                (Some(rx), Some(ry)) => (rx, ry),
                (Some(r), None) | (None, Some(r)) => (r, r),
                (None, None) => return Ok(None),
            };
            if rx <= 0.0 || ry <= 0.0 {
                return Ok(None);
            }
            let cx = get(names::CX, Axis::Horizontal)?.unwrap_or(0.0);
            let cy = get(names::CY, Axis::Vertical)?.unwrap_or(0.0);
            Ellipse::new((cx, cy), (rx, ry), 0.0).to_path(tolerance)
        }
        ElementKind::Line => {
            let x1 = get(names::X1, Axis::Horizontal)?.unwrap_or(0.0);
            let y1 = get(names::Y1, Axis::Vertical)?.unwrap_or(0.0);
            let x2 = get(names::X2, Axis::Horizontal)?.unwrap_or(0.0);
            let y2 = get(names::Y2, Axis::Vertical)?.unwrap_or(0.0);
            let mut path = BezPath::new();
            path.move_to((x1, y1));
            path.line_to((x2, y2));
            path
        }
        ElementKind::Polyline | ElementKind::Polygon => {
            let Some(value) = node.attributes.get(names::POINTS) else {
                return Ok(None);
            };
            let mut coords = parse_number_list(value)?;
            if coords.len() % 2 == 1 {
                log::warn!("Odd number of coordinates in points {value:?}, dropping the last");
                coords.pop();
            }
            if coords.len() < 4 {
                return Ok(None);
            }
            let mut path = BezPath::new();
            for (i, pair) in coords.chunks_exact(2).enumerate() {
                let p = Point::new(pair[0] * units.unit_scale, pair[1] * units.unit_scale);
                if i == 0 {
                    path.move_to(p);
                } else {
                    path.line_to(p);
                }
            }
            if node.kind == ElementKind::Polygon {
                path.close_path();
            }
            path
        }
        ElementKind::Path => {
            let Some(d) = node.attributes.get_trimmed(names::D) else {
                return Ok(None);
            };
            let mut path = BezPath::from_svg(d)?;
            if path.elements().is_empty() {
                return Ok(None);
            }
            path.apply_affine(Affine::scale(units.unit_scale));
            path
        }
        _ => return Ok(None),
    };
    Ok(Some(path))
}

fn length(node: &Node, units: &UnitContext, name: &str, axis: Axis) -> Result<Option<f64>> {
    node.attributes
        .get_trimmed(name)
        .map(|value| units.resolve(value, axis))
        .transpose()
}

/// A rectangle with elliptical corners.
fn rounded_rect(rect: Rect, rx: f64, ry: f64) -> BezPath {
    if rx <= 0.0 || ry <= 0.0 {
        return rect.to_path(0.1);
    }
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let Rect { x0, y0, x1, y1 } = rect;
    let mut path = BezPath::new();
    path.move_to((x0 + rx, y0));
    path.line_to((x1 - rx, y0));
    path.curve_to((x1 - rx + kx, y0), (x1, y0 + ry - ky), (x1, y0 + ry));
    path.line_to((x1, y1 - ry));
    path.curve_to((x1, y1 - ry + ky), (x1 - rx + kx, y1), (x1 - rx, y1));
    path.line_to((x0 + rx, y1));
    path.curve_to((x0 + rx - kx, y1), (x0, y1 - ry + ky), (x0, y1 - ry));
    path.line_to((x0, y0 + ry));
    path.curve_to((x0, y0 + ry - ky), (x0 + rx - kx, y0), (x0 + rx, y0));
    path.close_path();
    path
}
