// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markers drawn at the vertices of paths, lines and polylines.

use std::str::FromStr;

use peniko::kurbo::{Affine, BezPath, PathEl, Point, Rect, Size, Vec2};

use crate::attributes::{names, reference_id};
use crate::branch::{clip_to, draw_children};
use crate::context::DrawContext;
use crate::node::{ElementKind, Node};
use crate::surface::Surface;
use crate::transform::{marker_transform, view_box_transform};
use crate::units::{parse_aspect_ratio, Axis};

/// Which vertices a marker property applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Position {
    Start,
    Mid,
    End,
}

/// A vertex of a path with the directions of its adjacent segments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Vertex {
    pub point: Point,
    pub incoming: Option<Vec2>,
    pub outgoing: Option<Vec2>,
}

impl Vertex {
    /// The marker angle at this vertex, in radians.
    ///
    /// Inner vertices use the bisector of both directions.
    pub fn angle(&self) -> f64 {
        match (self.incoming, self.outgoing) {
            (Some(a), Some(b)) => {
                let (a, b) = (normalize(a), normalize(b));
                let sum = a + b;
                if sum.hypot2() < 1e-12 {
                    a.atan2()
                } else {
                    sum.atan2()
                }
            }
            (Some(d), None) | (None, Some(d)) => d.atan2(),
            (None, None) => 0.0,
        }
    }
}

fn normalize(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len > 0.0 {
        v / len
    } else {
        v
    }
}

/// Collects the vertices of `path` in order.
pub(crate) fn vertices(path: &BezPath) -> Vec<Vertex> {
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut last = Point::ZERO;
    let mut start = Point::ZERO;
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                vertices.push(Vertex {
                    point: p,
                    incoming: None,
                    outgoing: None,
                });
                last = p;
                start = p;
            }
            PathEl::LineTo(p) => {
                push_segment(&mut vertices, last, p - last, p, p - last);
                last = p;
            }
            PathEl::QuadTo(p1, p2) => {
                push_segment(&mut vertices, last, p1 - last, p2, p2 - p1);
                last = p2;
            }
            PathEl::CurveTo(p1, p2, p3) => {
                push_segment(&mut vertices, last, p1 - last, p3, p3 - p2);
                last = p3;
            }
            PathEl::ClosePath => {
                push_segment(&mut vertices, last, start - last, start, start - last);
                last = start;
            }
        }
    }
    vertices
}

/// Appends the end vertex of a segment starting at `from` and records the
/// segment direction on the previous vertex. Zero tangents fall back to the
/// chord.
fn push_segment(vertices: &mut Vec<Vertex>, from: Point, out: Vec2, end: Point, into: Vec2) {
    let chord = end - from;
    if let Some(previous) = vertices.last_mut() {
        previous.outgoing = Some(if out == Vec2::ZERO { chord } else { out });
    }
    vertices.push(Vertex {
        point: end,
        incoming: Some(if into == Vec2::ZERO { chord } else { into }),
        outgoing: None,
    });
}

/// Draws the `marker-start`, `marker-mid` and `marker-end` of a shape.
pub(crate) fn draw_markers(node: &Node, path: &BezPath, stroke_width: f64, ctx: &mut DrawContext<'_>) {
    let properties = [
        (names::MARKER_START, Position::Start),
        (names::MARKER_MID, Position::Mid),
        (names::MARKER_END, Position::End),
    ];
    if !properties.iter().any(|(name, _)| node.attributes.contains(name)) {
        return;
    }
    let vertices = vertices(path);
    let Some(last_index) = vertices.len().checked_sub(1) else {
        return;
    };
    for (name, position) in properties {
        let Some(value) = node.attributes.get_trimmed(name) else {
            continue;
        };
        if value == "none" {
            continue;
        }
        let Some(id) = reference_id(value) else {
            log::warn!("Unsupported {name} value {value:?}");
            continue;
        };
        if ctx.is_id_used_by_reference_before(id) {
            log::warn!("Marker {id:?} is drawn inside itself");
            continue;
        }
        let marker = match ctx.named_object(id) {
            Some(marker) if marker.kind == ElementKind::Marker => marker,
            _ => {
                log::warn!("{name} references {id:?}, which is not a marker");
                continue;
            }
        };
        let range = match position {
            Position::Start => 0..1,
            Position::Mid => 1..last_index.max(1),
            Position::End => last_index..last_index + 1,
        };
        for vertex in &vertices[range] {
            draw_instance(marker, vertex, position, stroke_width, ctx);
        }
    }
}

fn draw_instance(
    marker: &Node,
    vertex: &Vertex,
    position: Position,
    stroke_width: f64,
    ctx: &mut DrawContext<'_>,
) {
    let id = marker.attributes.id();
    let units = ctx.units();
    let length = |name: &'static str, axis: Axis, default: f64| -> f64 {
        match marker.attributes.get_trimmed(name) {
            None => default,
            Some(value) => units.resolve(value, axis).unwrap_or_else(|e| {
                log::warn!("Invalid {name} on marker {id:?}: {e}");
                default
            }),
        }
    };
    let width = length(names::MARKER_WIDTH, Axis::Horizontal, 3.0 * units.unit_scale);
    let height = length(names::MARKER_HEIGHT, Axis::Vertical, 3.0 * units.unit_scale);
    if width <= 0.0 || height <= 0.0 {
        log::info!("Marker {id:?} has no area");
        return;
    }
    let reference = Point::new(
        length(names::REF_X, Axis::Horizontal, 0.0),
        length(names::REF_Y, Axis::Vertical, 0.0),
    );

    let scale = match marker.attributes.get_trimmed(names::MARKER_UNITS) {
        None | Some("strokeWidth") => stroke_width / units.unit_scale,
        Some("userSpaceOnUse") => 1.0,
        Some(other) => {
            log::warn!("Invalid markerUnits {other:?} on {id:?}");
            stroke_width / units.unit_scale
        }
    };
    let angle = match marker.attributes.get_trimmed(names::ORIENT) {
        None => 0.0,
        Some("auto") => vertex.angle(),
        Some("auto-start-reverse") if position == Position::Start => {
            vertex.angle() + std::f64::consts::PI
        }
        Some("auto-start-reverse") => vertex.angle(),
        Some(value) => match svgtypes::Angle::from_str(value) {
            Ok(angle) => angle.to_degrees().to_radians(),
            Err(e) => {
                log::warn!("Invalid orient {value:?} on marker {id:?}: {e}");
                0.0
            }
        },
    };

    let size = Size::new(width, height);
    let (content, viewport) = match marker.attributes.get_trimmed(names::VIEW_BOX) {
        Some(value) => match units.resolve_view_box(value) {
            Ok(view_box) => {
                let aspect = parse_aspect_ratio(marker.attributes.get_trimmed(names::PRESERVE_ASPECT_RATIO));
                (view_box_transform(view_box, aspect, size), view_box)
            }
            Err(e) => {
                log::info!("Marker {id:?} is not drawn: {e}");
                return;
            }
        },
        None => (Affine::IDENTITY, Rect::from_origin_size(Point::ZERO, size)),
    };
    let clip_overflow = !matches!(
        marker.attributes.get_trimmed(names::OVERFLOW),
        Some("visible" | "auto")
    );

    ctx.with_used_id(id, |ctx| {
        let surface = ctx.surface();
        surface.save_state();
        surface.concat_transform(marker_transform(vertex.point, angle, scale));
        surface.concat_transform(Affine::translate(-(content * reference).to_vec2()));
        if clip_overflow {
            clip_to(surface, Rect::from_origin_size(Point::ZERO, size));
        }
        if content != Affine::IDENTITY {
            surface.concat_transform(content);
        }
        ctx.with_viewport(viewport, |ctx| draw_children(marker, ctx));
        ctx.surface().restore_state();
    });
}

#[cfg(test)]
mod tests {
    use super::vertices;
    use peniko::kurbo::{BezPath, Point};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn polyline_vertices() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.line_to((10.0, 10.0));
        let vertices = vertices(&path);
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[2].point, Point::new(10.0, 10.0));
        assert_eq!(vertices[0].angle(), 0.0);
        assert!((vertices[1].angle() - FRAC_PI_2 / 2.0).abs() < 1e-12);
        assert!((vertices[2].angle() - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn closed_paths_return_to_start() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.line_to((10.0, 10.0));
        path.close_path();
        let vertices = vertices(&path);
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[3].point, Point::ZERO);
    }
}
