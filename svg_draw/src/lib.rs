// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draws a tree of SVG renderer nodes onto an imperative drawing surface.
//!
//! The input is an already parsed and styled tree of [`Node`]s. Rendering
//! walks it top-down and records primitive operations (path building,
//! painting, clipping, text and embedded fragments) into a [`Canvas`]. The
//! result is a [`Fragment`] that can be replayed onto any [`Surface`]
//! implementation.
//!
//! Supported are shapes, groups and nested viewports, `use` and `symbol`,
//! linear and radial gradients, patterns, clip paths, markers, raster
//! images, and text through a pluggable [`ParagraphLayout`] service.
//!
//! ```
//! use svg_draw::{render_tree, Node, RenderOptions, Resources};
//!
//! let root = Node::element("svg")
//!     .with_attribute("width", "100")
//!     .with_attribute("height", "100")
//!     .with_child(
//!         Node::element("circle")
//!             .with_attribute("cx", "50")
//!             .with_attribute("cy", "50")
//!             .with_attribute("r", "40")
//!             .with_attribute("fill", "teal"),
//!     );
//! let options = RenderOptions::default().with_unit_scale(1.0);
//! let fragment = render_tree(&root, &options, Resources::default());
//! assert!(!fragment.is_empty());
//! ```

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
// Need to allow instead of expect until Rust 1.81.
#![allow(missing_docs, clippy::cast_possible_truncation)]

// Only used by integration tests.
#[cfg(test)]
use anyhow as _;

mod attributes;
mod branch;
mod clip;
mod context;
mod error;
mod gradient;
mod image;
mod marker;
mod node;
mod options;
mod paint;
mod pattern;
mod shapes;
mod style;
mod surface;
mod text;
mod transform;
mod units;

/// Styling and composition primitives (colors, gradients and images).
pub use peniko;
/// 2D geometry, with a focus on curves.
pub use peniko::kurbo;

pub use attributes::{reference_id, Attributes};
pub use context::{DrawContext, TextState};
pub use error::{Error, Result};
pub use gradient::normalize_stops;
pub use image::ImageResolver;
pub use node::{ElementKind, Node};
pub use options::{RenderOptions, Resources};
pub use paint::{create_paint, parse_color, GradientPaint, Paint, PatternTile};
pub use surface::{replay, Canvas, Command, Fragment, Surface, TextRenderingMode};
pub use text::{
    FixedPitchLayout, FontSpec, LineMetrics, ParagraphLayout, TextDecoration, TextGraphicsState,
    TextMatrix, TextRun,
};
pub use transform::{parse_transform, AffineExt};
pub use units::{Axis, Length, Unit, UnitContext};

/// Renders the tree rooted at `root` into a fragment.
///
/// The fragment's bounds are the area of the outermost viewport. Problems
/// in the tree are logged and the affected elements skipped; rendering
/// itself never fails.
pub fn render_tree(root: &Node, options: &RenderOptions, resources: Resources<'_>) -> Fragment {
    let mut ctx = DrawContext::new(options, resources);
    ctx.register_tree(root);
    ctx.push_viewport(options.base_viewport());
    let bounds = branch::root_bounds(root, &ctx.units());
    log::debug!("Rendering {:?} root into {bounds:?}", root.kind);

    let canvas = ctx.with_new_surface(|ctx| {
        let surface = ctx.surface();
        surface.save_state();
        if options.y_up {
            surface.concat_transform(transform::flip_y(bounds.height()));
        }
        branch::draw_root(root, ctx);
        ctx.surface().restore_state();
    });
    ctx.pop_viewport();
    canvas.into_fragment(bounds)
}

/// Renders the tree rooted at `root` directly onto `target`.
///
/// Returns the bounds of the outermost viewport.
pub fn render_to_surface(
    root: &Node,
    options: &RenderOptions,
    resources: Resources<'_>,
    target: &mut dyn Surface,
) -> kurbo::Rect {
    let fragment = render_tree(root, options, resources);
    fragment.replay(target);
    fragment.bounds
}
