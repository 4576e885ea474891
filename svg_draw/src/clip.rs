// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The clip-path compositor.
//!
//! A clip path clips to the union of its children, but a surface can only
//! intersect its clip region with a path. The content is therefore drawn
//! once per clip child, each time inside its own saved state with that
//! child as the only clip boundary. Transforms the child concatenates are
//! undone before the content is drawn, so content stays in the user space
//! of the clipped element.

use peniko::kurbo::{Affine, Rect};

use crate::attributes::names;
use crate::branch::{clip_to, draw_keeping_clip};
use crate::context::DrawContext;
use crate::node::Node;
use crate::surface::{Command, Surface, TextRenderingMode};
use crate::transform::bbox_transform;

/// Draws `body` clipped by `clip_path`.
///
/// `bbox` is the bounding box of the clipped element, needed when the clip
/// path uses `objectBoundingBox` units.
pub(crate) fn draw_clipped(
    clip_path: &Node,
    ctx: &mut DrawContext<'_>,
    bbox: Option<Rect>,
    body: &mut dyn FnMut(&mut DrawContext<'_>),
) {
    let id = clip_path.attributes.id();
    let unit_scale = ctx.options().unit_scale;
    let units_transform = match clip_path.attributes.get_trimmed(names::CLIP_PATH_UNITS) {
        Some("objectBoundingBox") => match bbox {
            Some(bbox) if bbox.width() > 0.0 && bbox.height() > 0.0 => {
                bbox_transform(bbox, unit_scale)
            }
            _ => {
                log::info!("Clip path {id:?} needs a bounding box, content is hidden");
                return;
            }
        },
        None | Some("userSpaceOnUse") => Affine::IDENTITY,
        Some(other) => {
            log::warn!("Invalid clipPathUnits {other:?} on {id:?}, using userSpaceOnUse");
            Affine::IDENTITY
        }
    };
    let clip_transform = clip_path.transform(unit_scale).unwrap_or(Affine::IDENTITY) * units_transform;

    let mut drawn = 0;
    ctx.with_used_id(id, |ctx| {
        for child in &clip_path.children {
            if !child.kind.can_draw() || child.is_display_none() || child.is_hidden() {
                continue;
            }
            ctx.surface().save_state();
            draw_keeping_clip(ctx, |ctx| {
                if clip_transform != Affine::IDENTITY {
                    ctx.surface().concat_transform(clip_transform);
                }
                let start = ctx.surface().commands().len();
                ctx.with_clip_path(|ctx| child.draw(ctx));
                if !sets_clip(&ctx.surface().commands()[start..]) {
                    // A child without geometry clips everything away.
                    clip_to(ctx.surface(), Rect::ZERO);
                }
            });
            ctx.without_clip_path(|ctx| body(ctx));
            ctx.surface().restore_state();
            drawn += 1;
        }
    });
    if drawn == 0 {
        log::debug!("Clip path {id:?} has no visible children, content is hidden");
    }
}

fn sets_clip(commands: &[Command]) -> bool {
    commands.iter().any(|command| {
        matches!(
            command,
            Command::Clip(_) | Command::SetTextRenderingMode(TextRenderingMode::Clip)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::draw_clipped;
    use crate::context::DrawContext;
    use crate::node::Node;
    use crate::options::{RenderOptions, Resources};
    use crate::surface::{Canvas, Command};
    use peniko::kurbo::Rect;

    fn run(clip_path: &Node, bbox: Option<Rect>) -> (usize, Vec<Command>) {
        let options = RenderOptions::default().with_unit_scale(1.0);
        let mut ctx = DrawContext::new(&options, Resources::default());
        ctx.push_viewport(Rect::new(0.0, 0.0, 100.0, 100.0));
        ctx.push_surface(Canvas::new());
        let mut calls = 0;
        draw_clipped(clip_path, &mut ctx, bbox, &mut |_| calls += 1);
        (calls, ctx.pop_surface().commands().to_vec())
    }

    #[test]
    fn hidden_children_are_skipped() {
        let clip_path = Node::element("clipPath")
            .with_child(Node::element("rect").with_attribute("width", "5").with_attribute("height", "5"))
            .with_child(
                Node::element("rect")
                    .with_attribute("width", "5")
                    .with_attribute("height", "5")
                    .with_attribute("visibility", "hidden"),
            );
        assert_eq!(run(&clip_path, None).0, 1);
    }

    #[test]
    fn empty_child_clips_everything() {
        let clip_path = Node::element("clipPath").with_child(Node::element("circle").with_attribute("r", "0"));
        let (calls, commands) = run(&clip_path, None);
        assert_eq!(calls, 1);
        assert!(commands.iter().any(|c| matches!(c, Command::Clip(_))));
    }

    #[test]
    fn bounding_box_units_need_a_box() {
        let clip_path = Node::element("clipPath")
            .with_attribute("clipPathUnits", "objectBoundingBox")
            .with_child(Node::element("rect").with_attribute("width", "1").with_attribute("height", "1"));
        assert_eq!(run(&clip_path, None).0, 0);
        let (calls, commands) = run(&clip_path, Some(Rect::new(10.0, 10.0, 20.0, 30.0)));
        assert_eq!(calls, 1);
        assert!(commands.iter().any(|c| matches!(c, Command::ConcatTransform(_))));
    }
}
