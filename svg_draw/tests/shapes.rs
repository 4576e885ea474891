// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf shapes, viewports and the root of a render pass.

use svg_draw::kurbo::{Affine, Point, Rect};
use svg_draw::{render_tree, AffineExt, Command, Node, Paint, RenderOptions, Resources};

use crate::util::{assert_near, count, flatten, options, placed_fills, render, svg};

mod util;

fn rect(x: f64, y: f64, width: f64, height: f64) -> Node {
    Node::element("rect")
        .with_attribute("x", x.to_string())
        .with_attribute("y", y.to_string())
        .with_attribute("width", width.to_string())
        .with_attribute("height", height.to_string())
}

#[test]
fn filled_rect() {
    let fragment = render(&svg([rect(10.0, 10.0, 20.0, 20.0).with_attribute("fill", "red")]));
    assert_eq!(fragment.bounds, Rect::new(0.0, 0.0, 100.0, 100.0));
    let commands = flatten(&fragment.commands);
    assert!(commands
        .iter()
        .any(|c| matches!(c, Command::SetFillPaint(Paint::Solid(_)))));
    assert_eq!(count(&fragment.commands, |c| matches!(c, Command::Fill(_))), 1);
}

#[test]
fn zero_radius_circle_paints_nothing() {
    let circle = Node::element("circle")
        .with_attribute("cx", "50")
        .with_attribute("cy", "50")
        .with_attribute("r", "0");
    let fragment = render(&svg([circle]));
    assert_eq!(count(&fragment.commands, Command::is_painting), 0);
    assert_eq!(
        count(&fragment.commands, |c| matches!(c, Command::DrawFragment { .. })),
        0
    );
}

#[test]
fn display_none_skips_subtree() {
    let group = Node::element("g")
        .with_attribute("display", "none")
        .with_child(rect(0.0, 0.0, 10.0, 10.0));
    let fragment = render(&svg([group]));
    assert_eq!(count(&fragment.commands, Command::is_painting), 0);
}

#[test]
fn stroke_only_line() {
    let line = Node::element("line")
        .with_attribute("x2", "10")
        .with_attribute("y2", "10")
        .with_attribute("stroke", "blue")
        .with_attribute("stroke-width", "2");
    let fragment = render(&svg([line]));
    let commands = flatten(&fragment.commands);
    assert!(commands.iter().any(|c| matches!(c, Command::Stroke)));
    assert!(!commands.iter().any(|c| matches!(c, Command::Fill(_))));
    assert!(commands
        .iter()
        .any(|c| matches!(c, Command::SetStrokeStyle(s) if s.width == 2.0)));
}

#[test]
fn view_box_maps_unit_square() {
    let root = svg([rect(0.0, 0.0, 1.0, 1.0)]).with_attribute("viewBox", "0 0 1 1");
    let fragment = render(&root);
    let scaled = flatten(&fragment.commands).into_iter().any(|c| match c {
        Command::ConcatTransform(t) => t * Point::new(1.0, 1.0) == Point::new(100.0, 100.0),
        _ => false,
    });
    assert!(scaled);
}

#[test]
fn identity_view_box_round_trips_at_default_scale() {
    let square = rect(0.0, 0.0, 100.0, 100.0);
    let plain = svg([square.clone()]);
    let boxed = svg([square]).with_attribute("viewBox", "0 0 100 100");
    let options = RenderOptions::default();
    for root in [plain, boxed] {
        let fragment = render_tree(&root, &options, Resources::default());
        assert_eq!(fragment.bounds, Rect::new(0.0, 0.0, 75.0, 75.0));
        let fills = placed_fills(&fragment.commands);
        assert_eq!(fills.len(), 1);
        assert_near(fills[0].area, Rect::new(0.0, 0.0, 75.0, 75.0));
    }
}

#[test]
fn view_box_percentages_use_the_box() {
    let half = Node::element("rect")
        .with_attribute("width", "50%")
        .with_attribute("height", "50%");
    let root = svg([half]).with_attribute("viewBox", "0 0 200 200");
    let fragment = render_tree(&root, &RenderOptions::default(), Resources::default());
    let fills = placed_fills(&fragment.commands);
    assert_eq!(fills.len(), 1);
    assert_near(fills[0].area, Rect::new(0.0, 0.0, 37.5, 37.5));
}

#[test]
fn invalid_view_box_disables_rendering() {
    let root = svg([rect(0.0, 0.0, 1.0, 1.0)]).with_attribute("viewBox", "0 0 0 1");
    let fragment = render(&root);
    assert_eq!(count(&fragment.commands, Command::is_painting), 0);
}

#[test]
fn transform_round_trips() -> anyhow::Result<()> {
    let transform = Affine::translate((3.0, -4.0)) * Affine::rotate(0.5) * Affine::scale(2.0);
    let inverse = transform.try_invert()?;
    let p = Point::new(7.0, 11.0);
    let back = inverse * (transform * p);
    assert!((back - p).hypot() < 1e-9);
    assert!(Affine::scale(0.0).try_invert().is_err());
    Ok(())
}

#[test]
fn y_up_flips_root() {
    let options = options().with_y_up(true);
    let fragment = render_tree(&svg([rect(0.0, 0.0, 10.0, 10.0)]), &options, Resources::default());
    let flip = Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, 100.0]);
    assert!(flatten(&fragment.commands)
        .iter()
        .any(|c| matches!(c, Command::ConcatTransform(t) if *t == flip)));
}

#[test]
fn unit_scale_converts_pixels() {
    let options = RenderOptions::default();
    let fragment = render_tree(&svg(Vec::new()), &options, Resources::default());
    // 100 pixels at the default of 0.75 units per pixel.
    assert_eq!(fragment.bounds, Rect::new(0.0, 0.0, 75.0, 75.0));
}
