// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raster images placed by `image` elements.

use peniko::kurbo::{Affine, Point, Rect, Size};
use peniko::Image;

use crate::attributes::names;
use crate::branch::clip_to;
use crate::context::DrawContext;
use crate::node::Node;
use crate::surface::Surface;
use crate::transform::{fit_view_box, view_box_transform};
use crate::units::{parse_aspect_ratio, Axis};

/// Resolves image references into decoded images.
pub trait ImageResolver {
    /// Returns the image `href` refers to, or `None` if it is unavailable.
    fn resolve(&self, href: &str) -> Option<Image>;
}

/// Draws an `image` element.
pub(crate) fn draw(node: &Node, ctx: &mut DrawContext<'_>) {
    if node.is_hidden() || ctx.in_clip_path() {
        return;
    }
    let Some(href) = node.attributes.href() else {
        log::warn!("image {:?} has no href", node.attributes.id());
        return;
    };
    let Some(resolver) = ctx.images() else {
        log::debug!("No image resolver, skipping {href:?}");
        return;
    };
    let Some(image) = resolver.resolve(href) else {
        log::warn!("Image {href:?} could not be resolved");
        return;
    };
    if image.width == 0 || image.height == 0 {
        log::info!("Image {href:?} is empty");
        return;
    }

    let units = ctx.units();
    let natural = Size::new(f64::from(image.width), f64::from(image.height));
    let length = |name: &'static str, axis: Axis, default: f64| -> f64 {
        match node.attributes.get_trimmed(name) {
            None | Some("auto") => default,
            Some(value) => units.resolve(value, axis).unwrap_or_else(|e| {
                log::warn!("Invalid {name} on image {href:?}: {e}");
                default
            }),
        }
    };
    let x = length(names::X, Axis::Horizontal, 0.0);
    let y = length(names::Y, Axis::Vertical, 0.0);
    let width = length(names::WIDTH, Axis::Horizontal, natural.width * units.unit_scale);
    let height = length(names::HEIGHT, Axis::Vertical, natural.height * units.unit_scale);
    if width <= 0.0 || height <= 0.0 {
        log::debug!("Image {href:?} has no area");
        return;
    }

    let viewport = Rect::new(x, y, x + width, y + height);
    let aspect = parse_aspect_ratio(node.attributes.get_trimmed(names::PRESERVE_ASPECT_RATIO));
    let pixels = Rect::from_origin_size(Point::ZERO, natural);
    let size = viewport.size();
    let overflows = {
        let fitted = fit_view_box(pixels, aspect, size);
        fitted.width() > size.width + 1e-9 || fitted.height() > size.height + 1e-9
    };
    let mut placement = Affine::translate(viewport.origin().to_vec2())
        * view_box_transform(pixels, aspect, size);
    if ctx.options().y_up {
        // Rows run upwards on y-up surfaces.
        placement = placement * Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, natural.height]);
    }

    node.draw_scoped(ctx, Some(viewport), |ctx| {
        let surface = ctx.surface();
        if overflows {
            surface.save_state();
            clip_to(surface, viewport);
            surface.draw_image(&image, placement);
            surface.restore_state();
        } else {
            surface.draw_image(&image, placement);
        }
    });
}
