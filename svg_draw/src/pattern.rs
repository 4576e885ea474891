// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tiling pattern paint servers.

use std::sync::Arc;

use peniko::kurbo::{Affine, Point, Rect, Size};

use crate::attributes::names;
use crate::branch::draw_into_canvas;
use crate::context::DrawContext;
use crate::node::Node;
use crate::paint::{Paint, PatternTile};
use crate::transform::{bbox_transform, parse_transform, view_box_transform, AffineExt};
use crate::units::{bbox_fraction, parse_aspect_ratio, Axis, UnitContext};

/// The coordinate system of a pattern attribute group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Units {
    ObjectBoundingBox,
    UserSpaceOnUse,
}

/// Builds the paint of a `pattern` element for an element with `bbox`.
///
/// Returns `None` if the pattern is already under construction further up,
/// which breaks reference cycles between patterns. A pattern without an id
/// cannot be referenced, so it cannot be part of a cycle.
pub(crate) fn create_paint(node: &Node, ctx: &mut DrawContext<'_>, bbox: Rect) -> Option<Paint> {
    let tile = match node.attributes.id() {
        Some(id) => match ctx.with_pattern_id(id, |ctx| build_tile(node, ctx, bbox)) {
            Some(tile) => tile,
            None => {
                log::warn!("Pattern {id:?} references itself");
                None
            }
        },
        None => build_tile(node, ctx, bbox),
    };
    tile.map(|tile| Paint::Pattern(Arc::new(tile)))
}

fn build_tile(node: &Node, ctx: &mut DrawContext<'_>, bbox: Rect) -> Option<PatternTile> {
    let id = node.attributes.id();
    let units = ctx.units();
    let scale = units.unit_scale;
    let pattern_units = read_units(node, names::PATTERN_UNITS, Units::ObjectBoundingBox);
    let content_units = read_units(node, names::PATTERN_CONTENT_UNITS, Units::UserSpaceOnUse);
    let uses_bbox = pattern_units == Units::ObjectBoundingBox || content_units == Units::ObjectBoundingBox;
    if uses_bbox && (bbox.width() <= 0.0 || bbox.height() <= 0.0) {
        log::info!("Pattern {id:?} in bounding box units applied to an empty box");
        return None;
    }

    let tile = tile_rect(node, &units, pattern_units)?;
    if tile.width() < 0.0 || tile.height() < 0.0 {
        log::warn!("Pattern {id:?} has a negative size");
        return None;
    }
    if tile.width() == 0.0 || tile.height() == 0.0 {
        log::info!("Pattern {id:?} has a zero size and is not drawn");
        return None;
    }

    // Pattern space: patternTransform, then the bounding box mapping, then
    // the tile origin.
    let mut matrix = match node.attributes.get_trimmed(names::PATTERN_TRANSFORM) {
        Some(value) => parse_transform(value, scale).unwrap_or_else(|e| {
            log::warn!("Ignoring patternTransform of {id:?}: {e}");
            Affine::IDENTITY
        }),
        None => Affine::IDENTITY,
    };
    if pattern_units == Units::ObjectBoundingBox {
        matrix = matrix * bbox_transform(bbox, scale);
    }
    matrix = matrix * Affine::translate(tile.origin().to_vec2());

    let size = tile.size();
    let (content, viewport) = match node.attributes.get_trimmed(names::VIEW_BOX) {
        Some(value) => match units.resolve_view_box(value) {
            Ok(view_box) => {
                let aspect = parse_aspect_ratio(node.attributes.get_trimmed(names::PRESERVE_ASPECT_RATIO));
                (view_box_transform(view_box, aspect, size), view_box)
            }
            Err(e) => {
                log::info!("Pattern {id:?} is not drawn: {e}");
                return None;
            }
        },
        None => {
            let content = match (pattern_units, content_units) {
                (Units::UserSpaceOnUse, Units::ObjectBoundingBox) => {
                    Affine::scale_non_uniform(bbox.width() / scale, bbox.height() / scale)
                }
                (Units::ObjectBoundingBox, Units::UserSpaceOnUse) => {
                    Affine::scale_non_uniform(scale / bbox.width(), scale / bbox.height())
                }
                _ => Affine::IDENTITY,
            };
            (content, units.viewport)
        }
    };
    // Content is drawn in its own space, so the cell and the steps are
    // expressed there as well.
    let inverse = match content.try_invert() {
        Ok(inverse) => inverse,
        Err(e) => {
            log::warn!("Pattern {id:?} content cannot be mapped: {e}");
            return None;
        }
    };
    let cell = inverse.transform_rect_bbox(Rect::from_origin_size(Point::ZERO, size));
    matrix = matrix * content;

    let canvas = ctx.without_clip_path(|ctx| {
        ctx.with_viewport(viewport, |ctx| draw_into_canvas(node, ctx))
    });
    Some(PatternTile {
        fragment: Arc::new(canvas.into_fragment(cell)),
        x_step: cell.width(),
        y_step: cell.height(),
        matrix,
    })
}

/// Resolves the tile rectangle in pattern space.
fn tile_rect(node: &Node, units: &UnitContext, pattern_units: Units) -> Option<Rect> {
    let value = |name: &'static str, axis: Axis| -> Option<f64> {
        let Some(raw) = node.attributes.get_trimmed(name) else {
            return Some(0.0);
        };
        let resolved = match pattern_units {
            Units::ObjectBoundingBox => bbox_fraction(raw).map(|f| f * units.unit_scale),
            Units::UserSpaceOnUse => units.resolve(raw, axis),
        };
        match resolved {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Invalid {name} on pattern {:?}: {e}", node.attributes.id());
                None
            }
        }
    };
    let origin = Point::new(value(names::X, Axis::Horizontal)?, value(names::Y, Axis::Vertical)?);
    let size = Size::new(
        value(names::WIDTH, Axis::Horizontal)?,
        value(names::HEIGHT, Axis::Vertical)?,
    );
    // `Rect::from_origin_size` would normalize negative sizes away.
    Some(Rect::new(origin.x, origin.y, origin.x + size.width, origin.y + size.height))
}

fn read_units(node: &Node, name: &'static str, default: Units) -> Units {
    match node.attributes.get_trimmed(name) {
        None => default,
        Some("objectBoundingBox") => Units::ObjectBoundingBox,
        Some("userSpaceOnUse") => Units::UserSpaceOnUse,
        Some(other) => {
            log::warn!(
                "Invalid {name} {other:?} on pattern {:?}, using the default",
                node.attributes.id()
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::create_paint;
    use crate::context::DrawContext;
    use crate::node::Node;
    use crate::options::{RenderOptions, Resources};
    use crate::paint::Paint;
    use crate::surface::Canvas;
    use peniko::kurbo::{Point, Rect};

    fn tile_of(pattern: &Node, bbox: Rect) -> Option<Paint> {
        let options = RenderOptions::default().with_unit_scale(1.0);
        let mut ctx = DrawContext::new(&options, Resources::default());
        ctx.push_viewport(Rect::new(0.0, 0.0, 100.0, 100.0));
        ctx.push_surface(Canvas::new());
        create_paint(pattern, &mut ctx, bbox)
    }

    #[test]
    fn user_space_tile() {
        let pattern = Node::element("pattern")
            .with_attribute("id", "p")
            .with_attribute("patternUnits", "userSpaceOnUse")
            .with_attribute("x", "5")
            .with_attribute("width", "10")
            .with_attribute("height", "20")
            .with_child(Node::element("rect").with_attribute("width", "5").with_attribute("height", "5"));
        let Some(Paint::Pattern(tile)) = tile_of(&pattern, Rect::new(0.0, 0.0, 50.0, 50.0)) else {
            panic!("expected a pattern");
        };
        assert_eq!((tile.x_step, tile.y_step), (10.0, 20.0));
        assert_eq!(tile.matrix * Point::ZERO, Point::new(5.0, 0.0));
        assert!(!tile.fragment.is_empty());
    }

    #[test]
    fn bounding_box_tile_scales_user_content() {
        let pattern = Node::element("pattern")
            .with_attribute("id", "p")
            .with_attribute("width", "0.5")
            .with_attribute("height", "0.25");
        let bbox = Rect::new(0.0, 0.0, 40.0, 80.0);
        let Some(Paint::Pattern(tile)) = tile_of(&pattern, bbox) else {
            panic!("expected a pattern");
        };
        // The cell covers half the box horizontally and a quarter vertically,
        // measured in the user space of the content.
        assert!((tile.x_step - 20.0).abs() < 1e-9);
        assert!((tile.y_step - 20.0).abs() < 1e-9);
        let corner = tile.matrix * Point::new(tile.x_step, tile.y_step);
        assert!((corner.x - 20.0).abs() < 1e-9 && (corner.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn patterns_without_id_share_no_cycle_key() {
        let anonymous = Node::element("pattern")
            .with_attribute("patternUnits", "userSpaceOnUse")
            .with_attribute("width", "10")
            .with_attribute("height", "10");
        let options = RenderOptions::default().with_unit_scale(1.0);
        let mut ctx = DrawContext::new(&options, Resources::default());
        ctx.push_viewport(Rect::new(0.0, 0.0, 100.0, 100.0));
        ctx.push_surface(Canvas::new());
        let bbox = Rect::new(0.0, 0.0, 10.0, 10.0);
        let nested = ctx.with_pattern_id("", |ctx| create_paint(&anonymous, ctx, bbox));
        assert!(matches!(nested, Some(Some(Paint::Pattern(_)))));
    }

    #[test]
    fn degenerate_tiles() {
        for (w, h) in [("0", "1"), ("1", "0"), ("-1", "1")] {
            let pattern = Node::element("pattern")
                .with_attribute("id", "p")
                .with_attribute("width", w)
                .with_attribute("height", h);
            assert!(tile_of(&pattern, Rect::new(0.0, 0.0, 10.0, 10.0)).is_none());
        }
    }
}
