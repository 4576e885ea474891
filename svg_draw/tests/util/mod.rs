// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions shared across different tests.

#![allow(dead_code)]

use svg_draw::kurbo::{Affine, Point, Rect};
use svg_draw::{
    render_tree, Command, DrawContext, FixedPitchLayout, Fragment, Node, RenderOptions, Resources,
};

pub(crate) const LAYOUT: FixedPitchLayout = FixedPitchLayout {
    advance: 0.5,
    ascent: 0.8,
    descent: 0.2,
};

/// Options with one target unit per pixel.
pub(crate) fn options() -> RenderOptions {
    RenderOptions::default()
        .with_unit_scale(1.0)
        .with_viewport(Rect::new(0.0, 0.0, 100.0, 100.0))
}

pub(crate) fn render(root: &Node) -> Fragment {
    render_tree(root, &options(), Resources::default())
}

pub(crate) fn render_with_text(root: &Node) -> Fragment {
    render_tree(root, &options(), Resources::default().with_text_layout(&LAYOUT))
}

/// Wraps `children` in a 100×100 root.
pub(crate) fn svg(children: impl IntoIterator<Item = Node>) -> Node {
    Node::element("svg")
        .with_attribute("width", "100")
        .with_attribute("height", "100")
        .with_children(children)
}

/// All commands of a fragment, with embedded fragments expanded in place.
pub(crate) fn flatten(commands: &[Command]) -> Vec<Command> {
    let mut result = Vec::new();
    for command in commands {
        match command {
            Command::DrawFragment { fragment, .. } => result.extend(flatten(&fragment.commands)),
            other => result.push(other.clone()),
        }
    }
    result
}

pub(crate) fn count(commands: &[Command], predicate: impl Fn(&Command) -> bool) -> usize {
    flatten(commands).iter().filter(|c| predicate(c)).count()
}

/// Shown text strings, in drawing order.
pub(crate) fn shown_text(fragment: &Fragment) -> Vec<String> {
    flatten(&fragment.commands)
        .into_iter()
        .filter_map(|command| match command {
            Command::ShowText(text) => Some(text),
            _ => None,
        })
        .collect()
}

/// Runs `f` with a context prepared like the root of a render pass.
pub(crate) fn with_context<R>(root: &Node, f: impl FnOnce(&mut DrawContext<'_>) -> R) -> R {
    with_context_in(&options(), root, f)
}

pub(crate) fn with_context_in<R>(
    options: &RenderOptions,
    root: &Node,
    f: impl FnOnce(&mut DrawContext<'_>) -> R,
) -> R {
    let mut ctx = DrawContext::new(options, Resources::default());
    ctx.register_tree(root);
    ctx.push_viewport(options.base_viewport());
    ctx.push_surface(svg_draw::Canvas::new());
    f(&mut ctx)
}

/// A fill in root space, with the clip boundaries in effect for it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PlacedFill {
    pub area: Rect,
    pub clips: Vec<Rect>,
}

#[derive(Clone)]
struct State {
    transform: Affine,
    clips: Vec<Rect>,
}

/// Every fill of `commands`, with transforms and embedded fragments applied.
pub(crate) fn placed_fills(commands: &[Command]) -> Vec<PlacedFill> {
    let mut fills = Vec::new();
    let state = State {
        transform: Affine::IDENTITY,
        clips: Vec::new(),
    };
    place(commands, state, &mut fills);
    fills
}

fn place(commands: &[Command], mut state: State, fills: &mut Vec<PlacedFill>) {
    let mut saved = Vec::new();
    let mut points: Vec<Point> = Vec::new();
    for command in commands {
        match command {
            Command::SaveState => saved.push(state.clone()),
            Command::RestoreState => state = saved.pop().expect("unbalanced restore"),
            Command::ConcatTransform(t) => state.transform = state.transform * *t,
            Command::MoveTo(p) | Command::LineTo(p) => points.push(state.transform * *p),
            Command::CurveTo(p1, p2, p3) => {
                points.extend([p1, p2, p3].map(|p| state.transform * *p));
            }
            Command::Clip(_) => state.clips.push(area(&std::mem::take(&mut points))),
            Command::Fill(_) | Command::FillStroke(_) => fills.push(PlacedFill {
                area: area(&std::mem::take(&mut points)),
                clips: state.clips.clone(),
            }),
            Command::Stroke | Command::EndPath => points.clear(),
            Command::DrawFragment {
                fragment,
                placement,
            } => {
                let mut inner = state.clone();
                inner.transform = inner.transform * *placement;
                place(&fragment.commands, inner, fills);
            }
            _ => {}
        }
    }
}

fn area(points: &[Point]) -> Rect {
    points
        .iter()
        .fold(None, |bounds: Option<Rect>, p| {
            Some(bounds.map_or(Rect::from_points(*p, *p), |r| r.union_pt(*p)))
        })
        .unwrap_or(Rect::ZERO)
}

pub(crate) fn assert_near(actual: Rect, expected: Rect) {
    let close = [
        (actual.x0, expected.x0),
        (actual.y0, expected.y0),
        (actual.x1, expected.x1),
        (actual.y1, expected.y1),
    ]
    .iter()
    .all(|(a, b)| (a - b).abs() < 1e-9);
    assert!(close, "expected {expected:?}, got {actual:?}");
}
