// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `use`, `symbol` and markers.

use svg_draw::kurbo::{Affine, Rect, Vec2};
use svg_draw::peniko::Color;
use svg_draw::{render_tree, Command, Node, Paint, RenderOptions, Resources};

use crate::util::{assert_near, count, flatten, placed_fills, render, svg};

mod util;

fn square(size: &str) -> Node {
    Node::element("rect")
        .with_attribute("width", size)
        .with_attribute("height", size)
}

fn fills(commands: &[Command]) -> usize {
    count(commands, |c| matches!(c, Command::Fill(_)))
}

#[test]
fn use_cannot_instantiate_its_ancestor() {
    let group = Node::element("g")
        .with_attribute("id", "g")
        .with_child(square("10"))
        .with_child(Node::element("use").with_attribute("href", "#g"));
    let fragment = render(&svg([group]));
    assert_eq!(fills(&fragment.commands), 1);
}

#[test]
fn use_offsets_its_target() {
    let template = square("10").with_attribute("id", "r");
    let instance = Node::element("use")
        .with_attribute("href", "#r")
        .with_attribute("x", "10");
    let fragment = render(&svg([Node::element("defs").with_child(template), instance]));
    assert_eq!(fills(&fragment.commands), 1);
    assert!(flatten(&fragment.commands).iter().any(|c| matches!(
        c,
        Command::ConcatTransform(t) if t.translation() == Vec2::new(10.0, 0.0)
    )));
}

#[test]
fn use_site_properties_are_inherited() {
    let template = square("10").with_attribute("id", "r");
    let instance = Node::element("use")
        .with_attribute("xlink:href", "#r")
        .with_attribute("fill", "red");
    let fragment = render(&svg([Node::element("defs").with_child(template), instance]));
    let red = Color::rgba8(255, 0, 0, 255);
    assert!(flatten(&fragment.commands)
        .iter()
        .any(|c| matches!(c, Command::SetFillPaint(Paint::Solid(color)) if *color == red)));
}

#[test]
fn symbols_draw_only_through_use() {
    let symbol = Node::element("symbol")
        .with_attribute("id", "s")
        .with_attribute("viewBox", "0 0 1 1")
        .with_child(square("1"));
    let fragment = render(&svg([symbol.clone()]));
    assert_eq!(fills(&fragment.commands), 0);

    let instance = Node::element("use")
        .with_attribute("href", "#s")
        .with_attribute("width", "20")
        .with_attribute("height", "20");
    let fragment = render(&svg([symbol, instance]));
    assert_eq!(fills(&fragment.commands), 1);
    assert!(flatten(&fragment.commands)
        .iter()
        .any(|c| matches!(c, Command::ConcatTransform(t) if *t == Affine::scale(20.0))));
}

#[test]
fn end_marker_is_drawn_once() {
    let marker = Node::element("marker")
        .with_attribute("id", "m")
        .with_child(square("2"));
    let path = Node::element("path")
        .with_attribute("d", "M0 0 L10 0 L10 10")
        .with_attribute("fill", "none")
        .with_attribute("stroke", "black")
        .with_attribute("marker-end", "url(#m)");
    let fragment = render(&svg([Node::element("defs").with_child(marker), path]));
    assert_eq!(fills(&fragment.commands), 1);
}

#[test]
fn marker_view_box_centers_on_the_vertex_at_default_scale() {
    let marker = Node::element("marker")
        .with_attribute("id", "m")
        .with_attribute("viewBox", "0 0 10 10")
        .with_attribute("markerWidth", "10")
        .with_attribute("markerHeight", "10")
        .with_attribute("refX", "5")
        .with_attribute("refY", "5")
        .with_attribute("markerUnits", "userSpaceOnUse")
        .with_child(square("10"));
    let path = Node::element("path")
        .with_attribute("d", "M40 40 L80 40")
        .with_attribute("fill", "none")
        .with_attribute("stroke", "black")
        .with_attribute("marker-start", "url(#m)");
    let root = svg([Node::element("defs").with_child(marker), path]);
    let fragment = render_tree(&root, &RenderOptions::default(), Resources::default());
    let fills = placed_fills(&fragment.commands);
    assert_eq!(fills.len(), 1);
    // The vertex sits at (30, 30) in target units, the marker is 7.5 wide.
    assert_near(fills[0].area, Rect::new(26.25, 26.25, 33.75, 33.75));
}
