// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill and stroke resolution: the pre-draw and post-draw halves of the
//! draw protocol.

use peniko::kurbo::{Cap, Join, Rect, Stroke};
use peniko::{Color, Fill};

use crate::attributes::names;
use crate::context::DrawContext;
use crate::node::Node;
use crate::paint::{self, parse_color, parse_paint, Paint, PaintValue};
use crate::surface::Surface;
use crate::units::{parse_opacity, Axis};

/// The fill and stroke of a single element, resolved against its bounding
/// box.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PaintStyle {
    pub fill: Option<Paint>,
    pub fill_rule: Fill,
    pub fill_opacity: f32,
    pub stroke: Option<Paint>,
    pub stroke_style: Stroke,
    pub stroke_opacity: f32,
}

impl PaintStyle {
    /// Resolves the paint of `node`.
    ///
    /// `fillable` is false for elements that are never filled, such as
    /// lines.
    pub fn resolve(node: &Node, ctx: &mut DrawContext<'_>, bbox: Option<Rect>, fillable: bool) -> Self {
        let attrs = &node.attributes;
        let element_opacity = opacity(node, names::OPACITY);
        let fill_opacity = element_opacity * opacity(node, names::FILL_OPACITY);
        let stroke_opacity = element_opacity * opacity(node, names::STROKE_OPACITY);
        let current_color = current_color(node);

        let stroke_style = stroke_style(node, ctx);
        let fill = if fillable {
            let value = attrs.get_trimmed(names::FILL).unwrap_or("black");
            resolve_paint(node, ctx, value, current_color, bbox, 0.0, fill_opacity)
        } else {
            None
        };
        let stroke = match attrs.get_trimmed(names::STROKE) {
            Some(value) if stroke_style.width > 0.0 => {
                let margin = stroke_style.width / 2.0;
                resolve_paint(node, ctx, value, current_color, bbox, margin, stroke_opacity)
            }
            _ => None,
        };
        let rule_name = if ctx.in_clip_path() {
            names::CLIP_RULE
        } else {
            names::FILL_RULE
        };
        Self {
            fill,
            fill_rule: fill_rule(attrs.get_trimmed(rule_name)),
            fill_opacity,
            stroke,
            stroke_style,
            stroke_opacity,
        }
    }

    /// Whether drawing the path would paint anything.
    pub fn is_visible(&self) -> bool {
        self.fill.is_some() || self.stroke.is_some()
    }

    /// Sets up the surface state for painting.
    pub fn apply(&self, surface: &mut dyn Surface) {
        if let Some(fill) = &self.fill {
            surface.set_fill_paint(fill);
            let opacity = surface_opacity(fill, self.fill_opacity);
            if opacity < 1.0 {
                surface.set_fill_opacity(opacity);
            }
        }
        if let Some(stroke) = &self.stroke {
            surface.set_stroke_paint(stroke);
            surface.set_stroke_style(&self.stroke_style);
            let opacity = surface_opacity(stroke, self.stroke_opacity);
            if opacity < 1.0 {
                surface.set_stroke_opacity(opacity);
            }
        }
    }

    /// Paints the current path and ends it.
    pub fn finish(&self, surface: &mut dyn Surface) {
        match (&self.fill, &self.stroke) {
            (Some(_), Some(_)) => surface.fill_stroke(self.fill_rule),
            (Some(_), None) => surface.fill(self.fill_rule),
            (None, Some(_)) => surface.stroke(),
            (None, None) => surface.end_path(),
        }
    }
}

/// Gradients fold opacity into their stops; everything else uses the
/// surface opacity.
pub(crate) fn surface_opacity(paint: &Paint, opacity: f32) -> f32 {
    match paint {
        Paint::Gradient(_) => 1.0,
        _ => opacity,
    }
}

pub(crate) fn fill_rule(value: Option<&str>) -> Fill {
    match value {
        Some("evenodd") => Fill::EvenOdd,
        Some("nonzero") | None => Fill::NonZero,
        Some(other) => {
            log::warn!("Unknown fill rule {other:?}, using nonzero");
            Fill::NonZero
        }
    }
}

pub(crate) fn opacity(node: &Node, name: &'static str) -> f32 {
    match node.attributes.get_trimmed(name).map(parse_opacity) {
        None => 1.0,
        Some(Ok(opacity)) => opacity,
        Some(Err(e)) => {
            log::warn!("Ignoring {name} of {:?}: {e}", node.attributes.id());
            1.0
        }
    }
}

/// The value `currentColor` stands for.
pub(crate) fn current_color(node: &Node) -> Color {
    node.attributes
        .get_trimmed(names::COLOR)
        .and_then(|value| match parse_color(value) {
            Ok(color) => Some(color),
            Err(e) => {
                log::warn!("Ignoring color {value:?}: {e}");
                None
            }
        })
        .unwrap_or(Color::BLACK)
}

/// Resolves a `fill` or `stroke` value to a paint, building paint servers
/// on demand.
pub(crate) fn resolve_paint(
    node: &Node,
    ctx: &mut DrawContext<'_>,
    value: &str,
    current_color: Color,
    bbox: Option<Rect>,
    margin: f64,
    opacity: f32,
) -> Option<Paint> {
    let parsed = match parse_paint(value, current_color) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Invalid paint {value:?} on {:?}: {e}", node.attributes.id());
            return None;
        }
    };
    match parsed {
        PaintValue::None => None,
        PaintValue::Color(color) => Some(Paint::Solid(color)),
        PaintValue::Server { id, fallback } => {
            let server = ctx.named_object(&id);
            let paint = match server {
                Some(server) => paint::create_paint(ctx, server, bbox, margin, opacity),
                None => {
                    log::warn!("Paint references unknown id {id:?}");
                    None
                }
            };
            paint.or_else(|| fallback.map(Paint::Solid))
        }
    }
}

fn stroke_style(node: &Node, ctx: &DrawContext<'_>) -> Stroke {
    let attrs = &node.attributes;
    let units = ctx.units();
    let width = match attrs.get_trimmed(names::STROKE_WIDTH) {
        None => units.unit_scale,
        Some(value) => units.resolve(value, Axis::Diagonal).unwrap_or_else(|e| {
            log::warn!("Invalid stroke-width {value:?}: {e}");
            units.unit_scale
        }),
    };
    let mut stroke = Stroke::new(width.max(0.0));

    stroke = stroke.with_caps(match attrs.get_trimmed(names::STROKE_LINECAP) {
        None | Some("butt") => Cap::Butt,
        Some("round") => Cap::Round,
        Some("square") => Cap::Square,
        Some(other) => {
            log::warn!("Unknown stroke-linecap {other:?}");
            Cap::Butt
        }
    });
    stroke = stroke.with_join(match attrs.get_trimmed(names::STROKE_LINEJOIN) {
        None | Some("miter") => Join::Miter,
        Some("round") => Join::Round,
        Some("bevel") => Join::Bevel,
        Some(other) => {
            log::warn!("Unknown stroke-linejoin {other:?}");
            Join::Miter
        }
    });
    if let Some(value) = attrs.get_trimmed(names::STROKE_MITERLIMIT) {
        match crate::units::parse_number(value) {
            Ok(limit) if limit >= 1.0 => stroke = stroke.with_miter_limit(limit),
            _ => log::warn!("Invalid stroke-miterlimit {value:?}"),
        }
    }
    if let Some(dashes) = dash_array(node, ctx) {
        let offset = attrs
            .get_trimmed(names::STROKE_DASHOFFSET)
            .and_then(|value| units.resolve(value, Axis::Diagonal).ok())
            .unwrap_or(0.0);
        stroke = stroke.with_dashes(offset, dashes);
    }
    stroke
}

fn dash_array(node: &Node, ctx: &DrawContext<'_>) -> Option<Vec<f64>> {
    let value = node.attributes.get_trimmed(names::STROKE_DASHARRAY)?;
    if value == "none" {
        return None;
    }
    let mut dashes = match ctx.units().resolve_list(value, Axis::Diagonal) {
        Ok(dashes) => dashes,
        Err(e) => {
            log::warn!("Invalid stroke-dasharray {value:?}: {e}");
            return None;
        }
    };
    if dashes.iter().any(|d| *d < 0.0) || dashes.iter().all(|d| *d == 0.0) {
        return None;
    }
    if dashes.len() % 2 == 1 {
        dashes.extend_from_within(..);
    }
    Some(dashes)
}
