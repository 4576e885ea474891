// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear and radial gradient paint servers.

use peniko::kurbo::{Affine, Point, Rect};
use peniko::{Color, ColorStop, Extend, Gradient};
use smallvec::SmallVec;

use crate::attributes::{names, reference_id};
use crate::context::DrawContext;
use crate::node::{ElementKind, Node};
use crate::paint::{parse_color, GradientPaint, Paint};
use crate::style;
use crate::transform::{bbox_transform, parse_transform};
use crate::units::{bbox_fraction, parse_opacity, Axis, UnitContext};
use crate::Result;

/// How many `href` links are followed when looking for inherited stops.
const MAX_HREF_DEPTH: usize = 8;

/// Normalizes a list of `(offset, color)` stops.
///
/// Offsets are clamped to `[0, 1]` and forced to be non-decreasing. If the
/// first offset is above 0 or the last below 1, a boundary stop with the
/// color of the nearest stop is added. Stops sharing an offset collapse
/// to the later one.
pub fn normalize_stops(stops: impl IntoIterator<Item = (f64, Color)>) -> Vec<ColorStop> {
    let mut clamped: Vec<(f64, Color)> = Vec::new();
    let mut last = 0.0;
    for (offset, color) in stops {
        let offset = if offset.is_finite() { offset.clamp(0.0, 1.0) } else { 0.0 };
        last = offset.max(last);
        clamped.push((last, color));
    }
    let (Some(&(first_offset, first_color)), Some(&(last_offset, last_color))) =
        (clamped.first(), clamped.last())
    else {
        return Vec::new();
    };
    if first_offset > 0.0 {
        clamped.insert(0, (0.0, first_color));
    }
    if last_offset < 1.0 {
        clamped.push((1.0, last_color));
    }

    let mut result: Vec<ColorStop> = Vec::with_capacity(clamped.len());
    for (offset, color) in clamped {
        let stop = ColorStop {
            offset: offset as f32,
            color,
        };
        match result.last_mut() {
            Some(previous) if previous.offset == stop.offset => *previous = stop,
            _ => result.push(stop),
        }
    }
    result
}

/// Builds the paint of a `linearGradient` or `radialGradient`.
pub(crate) fn create_paint(
    node: &Node,
    ctx: &mut DrawContext<'_>,
    bbox: Rect,
    margin: f64,
    opacity: f32,
) -> Option<Paint> {
    let id = node.attributes.id();
    // Paints that end up solid leave `opacity` to the surface.
    let stops = normalize_stops(collect_stops(node, ctx));
    match stops.as_slice() {
        [] => {
            log::info!("Gradient {id:?} has no stops");
            return None;
        }
        [..] if stops.iter().all(|s| s.color == stops[0].color) => {
            return Some(Paint::Solid(stops[0].color));
        }
        _ => {}
    }

    let units = ctx.units();
    let object_bbox = match node.attributes.get_trimmed(names::GRADIENT_UNITS) {
        None | Some("objectBoundingBox") => true,
        Some("userSpaceOnUse") => false,
        Some(other) => {
            log::warn!("Invalid gradientUnits {other:?} on {id:?}, using objectBoundingBox");
            true
        }
    };
    if object_bbox && (bbox.width() <= 0.0 || bbox.height() <= 0.0) {
        log::info!("Gradient {id:?} in bounding box units applied to an empty box");
        return None;
    }
    let coords = Coordinates {
        node,
        units: &units,
        object_bbox,
    };

    let mut transform = if object_bbox {
        bbox_transform(bbox, units.unit_scale)
    } else {
        Affine::IDENTITY
    };
    if let Some(value) = node.attributes.get_trimmed(names::GRADIENT_TRANSFORM) {
        match parse_transform(value, units.unit_scale) {
            Ok(gradient_transform) => transform = transform * gradient_transform,
            Err(e) => log::warn!("Ignoring gradientTransform of {id:?}: {e}"),
        }
    }

    let gradient = match node.kind {
        ElementKind::LinearGradient => {
            let start = coords.point(names::X1, names::Y1, (0.0, 0.0));
            let end = coords.point(names::X2, names::Y2, (1.0, 0.0));
            Gradient::new_linear(start, end)
        }
        _ => {
            let center = coords.point(names::CX, names::CY, (0.5, 0.5));
            let radius = coords.value(names::R, Axis::Diagonal, 0.5);
            if radius < 0.0 {
                log::warn!("Radial gradient {id:?} has a negative radius");
                return None;
            }
            if radius == 0.0 {
                return stops.last().map(|stop| Paint::Solid(stop.color));
            }
            let focus = Point::new(
                node.attributes
                    .get_trimmed(names::FX)
                    .map_or(center.x, |_| coords.value(names::FX, Axis::Horizontal, 0.5)),
                node.attributes
                    .get_trimmed(names::FY)
                    .map_or(center.y, |_| coords.value(names::FY, Axis::Vertical, 0.5)),
            );
            let focal_radius = coords.value(names::FR, Axis::Diagonal, 0.0).max(0.0);
            Gradient::new_two_point_radial(focus, focal_radius as f32, center, radius as f32)
        }
    };
    let gradient = gradient
        .with_extend(spread_method(node))
        .with_stops(faded(&stops, opacity).as_slice());

    Some(Paint::Gradient(GradientPaint {
        gradient,
        transform,
        bounds: bbox.inflate(margin, margin),
    }))
}

/// Resolves gradient vector attributes in the declared unit system.
struct Coordinates<'a> {
    node: &'a Node,
    units: &'a UnitContext,
    object_bbox: bool,
}

impl Coordinates<'_> {
    /// Resolves one coordinate. `default` is a fraction of the bounding box
    /// or of the viewport.
    fn value(&self, name: &'static str, axis: Axis, default: f64) -> f64 {
        let scale = self.units.unit_scale;
        let parsed: Option<Result<f64>> = self.node.attributes.get_trimmed(name).map(|value| {
            if self.object_bbox {
                bbox_fraction(value).map(|fraction| fraction * scale)
            } else {
                self.units.resolve(value, axis)
            }
        });
        match parsed {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                log::warn!("Invalid {name} on gradient {:?}: {e}", self.node.attributes.id());
                self.default(axis, default)
            }
            None => self.default(axis, default),
        }
    }

    fn point(&self, x: &'static str, y: &'static str, default: (f64, f64)) -> Point {
        Point::new(
            self.value(x, Axis::Horizontal, default.0),
            self.value(y, Axis::Vertical, default.1),
        )
    }

    fn default(&self, axis: Axis, fraction: f64) -> f64 {
        if self.object_bbox {
            fraction * self.units.unit_scale
        } else {
            self.units.to_user(crate::units::Length::percent(fraction * 100.0), axis)
        }
    }
}

fn spread_method(node: &Node) -> Extend {
    match node.attributes.get_trimmed(names::SPREAD_METHOD) {
        None | Some("pad") => Extend::Pad,
        Some("reflect") => Extend::Reflect,
        Some("repeat") => Extend::Repeat,
        Some(other) => {
            log::warn!(
                "Invalid spreadMethod {other:?} on {:?}, using pad",
                node.attributes.id()
            );
            Extend::Pad
        }
    }
}

/// Folds `opacity` into the stop colors.
fn faded(stops: &[ColorStop], opacity: f32) -> Vec<ColorStop> {
    stops
        .iter()
        .map(|stop| ColorStop {
            offset: stop.offset,
            color: stop.color.multiply_alpha(opacity),
        })
        .collect()
}

/// Gathers the stops of a gradient in document order, following `href`
/// links to other gradients when the gradient has none of its own.
fn collect_stops<'n>(node: &'n Node, ctx: &DrawContext<'n>) -> Vec<(f64, Color)> {
    let mut visited: SmallVec<[&str; 4]> = SmallVec::new();
    let mut current = node;
    for _ in 0..MAX_HREF_DEPTH {
        let stops: Vec<_> = current
            .children
            .iter()
            .filter(|child| child.kind == ElementKind::Stop)
            .map(stop)
            .collect();
        if !stops.is_empty() {
            return stops;
        }
        let Some(next_id) = current.attributes.href().and_then(reference_id) else {
            break;
        };
        if let Some(id) = current.attributes.id() {
            visited.push(id);
        }
        if visited.contains(&next_id) {
            log::warn!("Gradient {next_id:?} inherits stops from itself");
            break;
        }
        match ctx.named_object(next_id) {
            Some(next) if next.kind.is_paint_server() && next.kind != ElementKind::Pattern => {
                current = next;
            }
            _ => {
                log::warn!("Gradient href {next_id:?} does not name a gradient");
                break;
            }
        }
    }
    Vec::new()
}

fn stop(node: &Node) -> (f64, Color) {
    let attrs = &node.attributes;
    let offset = match attrs.get_trimmed(names::OFFSET).map(bbox_fraction) {
        None => 0.0,
        Some(Ok(offset)) => offset,
        Some(Err(e)) => {
            log::warn!("Invalid stop offset: {e}");
            0.0
        }
    };
    let color = match attrs.get_trimmed(names::STOP_COLOR) {
        None => Color::BLACK,
        Some("currentColor") => style::current_color(node),
        Some(value) => parse_color(value).unwrap_or_else(|e| {
            log::warn!("Invalid stop-color {value:?}: {e}");
            Color::BLACK
        }),
    };
    let opacity = match attrs.get_trimmed(names::STOP_OPACITY).map(parse_opacity) {
        None => 1.0,
        Some(Ok(opacity)) => opacity,
        Some(Err(e)) => {
            log::warn!("Invalid stop-opacity: {e}");
            1.0
        }
    };
    (offset, color.multiply_alpha(opacity))
}

#[cfg(test)]
mod tests {
    use super::normalize_stops;
    use peniko::Color;

    const A: Color = Color::rgba8(255, 0, 0, 255);
    const B: Color = Color::rgba8(0, 0, 255, 255);
    const C: Color = Color::rgba8(0, 255, 0, 255);

    #[test]
    fn boundaries_are_added() {
        let stops = normalize_stops([(0.25, A), (0.75, B)]);
        let offsets: Vec<f32> = stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, [0.0, 0.25, 0.75, 1.0]);
        assert_eq!(stops[0].color, A);
        assert_eq!(stops[3].color, B);
    }

    #[test]
    fn out_of_range_and_unordered() {
        let stops = normalize_stops([(-1.0, A), (0.8, B), (0.4, C), (7.0, A)]);
        let offsets: Vec<f32> = stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, [0.0, 0.8, 1.0]);
        assert_eq!(stops[1].color, C);
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn empty_list() {
        assert!(normalize_stops([]).is_empty());
    }
}
