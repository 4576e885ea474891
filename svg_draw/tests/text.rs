// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text chunks, anchoring and run state.

use svg_draw::kurbo::{Affine, Vec2};
use svg_draw::{render_tree, Command, Fragment, Node, Resources};

use crate::util::{flatten, options, render, render_with_text, shown_text, svg, LAYOUT};

mod util;

fn text_matrices(fragment: &Fragment) -> Vec<Affine> {
    flatten(&fragment.commands)
        .into_iter()
        .filter_map(|c| match c {
            Command::SetTextMatrix(m) => Some(m),
            _ => None,
        })
        .collect()
}

#[test]
fn absolute_tspan_starts_a_chunk() {
    let text = Node::element("text")
        .with_attribute("font-size", "10")
        .with_child(Node::text("AB"))
        .with_child(
            Node::element("tspan")
                .with_attribute("x", "20")
                .with_child(Node::text("CD")),
        );
    let fragment = render_with_text(&svg([text]));
    assert_eq!(shown_text(&fragment), ["AB", "CD"]);
    let origins: Vec<Vec2> = text_matrices(&fragment).iter().map(|m| m.translation()).collect();
    assert_eq!(origins, [Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0)]);
}

#[test]
fn relative_runs_follow_the_pen() {
    let text = Node::element("text")
        .with_attribute("font-size", "10")
        .with_child(Node::text("AB"))
        .with_child(
            Node::element("tspan")
                .with_attribute("dx", "3")
                .with_child(Node::text("C")),
        );
    let fragment = render_with_text(&svg([text]));
    let origins: Vec<Vec2> = text_matrices(&fragment).iter().map(|m| m.translation()).collect();
    // "AB" advances by 10, then the tspan adds 3.
    assert_eq!(origins, [Vec2::new(0.0, 0.0), Vec2::new(13.0, 0.0)]);
}

#[test]
fn end_anchor_aligns_chunk() {
    let text = Node::element("text")
        .with_attribute("x", "50")
        .with_attribute("y", "20")
        .with_attribute("font-size", "10")
        .with_attribute("text-anchor", "end")
        .with_child(Node::text("abcd"));
    let fragment = render_with_text(&svg([text]));
    let origins: Vec<Vec2> = text_matrices(&fragment).iter().map(|m| m.translation()).collect();
    assert_eq!(origins, [Vec2::new(30.0, 20.0)]);
}

#[test]
fn chunks_are_anchored_independently() {
    let text = Node::element("text")
        .with_attribute("x", "50")
        .with_attribute("y", "20")
        .with_attribute("font-size", "10")
        .with_attribute("text-anchor", "middle")
        .with_child(Node::text("abcd"))
        .with_child(
            Node::element("tspan")
                .with_attribute("x", "50")
                .with_attribute("y", "40")
                .with_child(Node::text("ab")),
        );
    let fragment = render_with_text(&svg([text]));
    assert_eq!(shown_text(&fragment), ["abcd", "ab"]);
    let origins: Vec<Vec2> = text_matrices(&fragment).iter().map(|m| m.translation()).collect();
    // Each chunk is centered on its own anchor: 20 wide, then 10 wide.
    assert_eq!(origins, [Vec2::new(40.0, 20.0), Vec2::new(45.0, 40.0)]);
}

#[test]
fn text_needs_a_layout_service() {
    let text = Node::element("text").with_child(Node::text("hidden"));
    let fragment = render(&svg([text]));
    assert!(shown_text(&fragment).is_empty());
}

#[test]
fn each_run_sets_its_font() {
    let text = Node::element("text")
        .with_child(Node::text("a"))
        .with_child(
            Node::element("tspan")
                .with_attribute("font-weight", "bold")
                .with_child(Node::text("b")),
        );
    let fragment = render_with_text(&svg([text]));
    let weights: Vec<u16> = flatten(&fragment.commands)
        .into_iter()
        .filter_map(|c| match c {
            Command::SetFont(font, _) => Some(font.weight),
            _ => None,
        })
        .collect();
    assert_eq!(weights, [400, 700]);
    let commands = flatten(&fragment.commands);
    assert_eq!(commands.iter().filter(|c| matches!(c, Command::BeginText)).count(), 1);
    assert_eq!(commands.iter().filter(|c| matches!(c, Command::EndText)).count(), 1);
}

#[test]
fn y_up_counter_flips_glyphs() {
    let text = Node::element("text").with_child(Node::text("up"));
    let options = options().with_y_up(true);
    let resources = Resources::default().with_text_layout(&LAYOUT);
    let fragment = render_tree(&svg([text]), &options, resources);
    let matrices = text_matrices(&fragment);
    assert_eq!(matrices.len(), 1);
    assert_eq!(matrices[0].as_coeffs()[3], -1.0);
}
