// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container elements: groups, viewports and `use` references.
//!
//! Every container draws its children into a fresh [`Canvas`] and embeds
//! the finished fragment into its parent at identity placement.

use std::sync::Arc;

use peniko::kurbo::{Affine, Point, Rect, Shape, Size};
use peniko::Fill;

use crate::attributes::{names, reference_id};
use crate::context::DrawContext;
use crate::node::{ElementKind, Node};
use crate::surface::{Canvas, Command, Surface};
use crate::transform::{view_box_transform, AffineExt};
use crate::units::{parse_aspect_ratio, Axis, UnitContext};

/// Draws a `g` element.
pub(crate) fn draw_group(node: &Node, ctx: &mut DrawContext<'_>) {
    let bbox = if node.attributes.contains(names::CLIP_PATH) {
        node.bounding_box(ctx)
    } else {
        None
    };
    node.draw_scoped(ctx, bbox, |ctx| draw_children(node, ctx));
}

/// Draws a nested `svg` element.
pub(crate) fn draw_viewport(node: &Node, ctx: &mut DrawContext<'_>) {
    draw_viewport_at(node, ctx, true);
}

/// Draws the outermost element of a tree, whose position is ignored.
pub(crate) fn draw_root(node: &Node, ctx: &mut DrawContext<'_>) {
    match node.kind {
        ElementKind::Svg if !node.is_display_none() => draw_viewport_at(node, ctx, false),
        _ => node.draw(ctx),
    }
}

/// The area the outermost element occupies.
pub(crate) fn root_bounds(node: &Node, units: &UnitContext) -> Rect {
    let base = units.viewport;
    if node.kind != ElementKind::Svg {
        return base;
    }
    let width = resolve_or(node, units, names::WIDTH, Axis::Horizontal, base.width());
    let height = resolve_or(node, units, names::HEIGHT, Axis::Vertical, base.height());
    Rect::new(0.0, 0.0, width.max(0.0), height.max(0.0))
}

/// Establishes a new viewport, optionally positioned by `x` and `y`, maps
/// the `viewBox` into it and draws the children.
fn draw_viewport_at(node: &Node, ctx: &mut DrawContext<'_>, positioned: bool) {
    let units = ctx.units();
    let parent = units.viewport;
    let (x, y) = if positioned {
        (
            resolve_or(node, &units, names::X, Axis::Horizontal, 0.0),
            resolve_or(node, &units, names::Y, Axis::Vertical, 0.0),
        )
    } else {
        (0.0, 0.0)
    };
    let width = resolve_or(node, &units, names::WIDTH, Axis::Horizontal, parent.width());
    let height = resolve_or(node, &units, names::HEIGHT, Axis::Vertical, parent.height());
    if width <= 0.0 || height <= 0.0 {
        log::debug!("Viewport {:?} has no area", node.attributes.id());
        return;
    }
    let view_box = match node.attributes.get_trimmed(names::VIEW_BOX) {
        None => None,
        Some(value) => match units.resolve_view_box(value) {
            Ok(view_box) => Some(view_box),
            Err(e) => {
                log::info!(
                    "Not rendering {:?} {:?}: {e}",
                    node.kind,
                    node.attributes.id()
                );
                return;
            }
        },
    };
    let aspect = parse_aspect_ratio(node.attributes.get_trimmed(names::PRESERVE_ASPECT_RATIO));
    let clip_overflow = !matches!(
        node.attributes.get_trimmed(names::OVERFLOW),
        Some("visible" | "auto")
    );

    node.draw_scoped(ctx, None, |ctx| {
        let size = Size::new(width, height);
        let surface = ctx.surface();
        if x != 0.0 || y != 0.0 {
            surface.concat_transform(Affine::translate((x, y)));
        }
        if clip_overflow && !ctx.in_clip_path() {
            clip_to(ctx.surface(), Rect::from_origin_size(Point::ZERO, size));
        }
        let inner = match view_box {
            Some(view_box) => {
                ctx.surface()
                    .concat_transform(view_box_transform(view_box, aspect, size));
                view_box
            }
            None => Rect::from_origin_size(Point::ZERO, size),
        };
        ctx.with_viewport(inner, |ctx| draw_children(node, ctx));
    });
}

/// Draws a `use` element by instantiating a deep copy of its target.
pub(crate) fn draw_use(node: &Node, ctx: &mut DrawContext<'_>) {
    let Some(href) = node.attributes.href() else {
        log::warn!("use element {:?} has no href", node.attributes.id());
        return;
    };
    let Some(id) = reference_id(href) else {
        log::warn!("Unsupported use reference {href:?}");
        return;
    };
    if ctx.is_id_used_by_reference_before(id) {
        log::warn!("use element references its own ancestor {id:?}");
        return;
    }
    let Some(template) = ctx.named_object(id) else {
        log::warn!("use element references unknown id {id:?}");
        return;
    };

    let mut instance = template.clone();
    instance.attributes.inherit_from(&node.attributes);
    if matches!(instance.kind, ElementKind::Svg | ElementKind::Symbol) {
        for name in [names::WIDTH, names::HEIGHT] {
            if let Some(value) = node.attributes.get_trimmed(name) {
                instance.attributes.insert(name, value);
            }
        }
    }
    let offset = use_offset(node, &ctx.units());

    node.draw_scoped(ctx, None, |ctx| {
        if offset != Affine::IDENTITY {
            ctx.surface().concat_transform(offset);
        }
        match instance.kind {
            ElementKind::Symbol => {
                if !instance.is_display_none() {
                    draw_viewport_at(&instance, ctx, false);
                }
            }
            _ => instance.draw(ctx),
        }
    });
}

/// The translation a `use` element adds for its `x` and `y`.
fn use_offset(node: &Node, units: &UnitContext) -> Affine {
    let x = resolve_or(node, units, names::X, Axis::Horizontal, 0.0);
    let y = resolve_or(node, units, names::Y, Axis::Vertical, 0.0);
    Affine::translate((x, y))
}

/// Draws the children of `node` into a new fragment and embeds it into the
/// current surface.
pub(crate) fn draw_children(node: &Node, ctx: &mut DrawContext<'_>) {
    if ctx.in_clip_path() {
        // Clip boundaries only take effect on the surface they are set on,
        // and a restore would drop them again.
        for child in &node.children {
            draw_keeping_clip(ctx, |ctx| child.draw(ctx));
        }
        return;
    }
    let bounds = ctx.current_viewport();
    let canvas = draw_into_canvas(node, ctx);
    compose(canvas, bounds, ctx);
}

/// Runs `f` and then undoes the transforms it left on the surface, without
/// restoring the graphics state, so the clip boundaries it set stay in
/// effect.
pub(crate) fn draw_keeping_clip(ctx: &mut DrawContext<'_>, f: impl FnOnce(&mut DrawContext<'_>)) {
    let start = ctx.surface().commands().len();
    f(ctx);
    let leaked = ctx.surface().transform_since(start);
    if leaked == Affine::IDENTITY {
        return;
    }
    match leaked.try_invert() {
        Ok(inverse) => ctx.surface().concat_transform(inverse),
        Err(e) => log::warn!("Cannot undo the transform of a clip child: {e}"),
    }
}

/// Draws the children of `node` into a new canvas, isolating the graphics
/// state of each child.
pub(crate) fn draw_into_canvas(node: &Node, ctx: &mut DrawContext<'_>) -> Canvas {
    ctx.with_new_surface(|ctx| {
        for child in &node.children {
            ctx.surface().save_state();
            child.draw(ctx);
            ctx.surface().restore_state();
        }
    })
}

/// Embeds a finished canvas into the current surface, unless nothing was
/// painted into it.
fn compose(canvas: Canvas, bounds: Rect, ctx: &mut DrawContext<'_>) {
    if !canvas.commands().iter().any(Command::is_painting) {
        return;
    }
    let fragment = Arc::new(canvas.into_fragment(bounds));
    ctx.surface().draw_fragment(fragment, Affine::IDENTITY);
}

/// Intersects the clip region with `rect`.
pub(crate) fn clip_to(surface: &mut dyn Surface, rect: Rect) {
    surface.append_path(&rect.to_path(0.1));
    surface.clip(Fill::NonZero);
}

fn resolve_or(node: &Node, units: &UnitContext, name: &'static str, axis: Axis, default: f64) -> f64 {
    let Some(value) = node.attributes.get_trimmed(name) else {
        return default;
    };
    units.resolve(value, axis).unwrap_or_else(|e| {
        log::warn!("Invalid {name} {value:?} on {:?}: {e}", node.attributes.id());
        default
    })
}
