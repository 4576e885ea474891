// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The mutable state threaded through a single render pass.

use std::collections::HashMap;

use peniko::kurbo::{Affine, Point, Rect};
use smallvec::SmallVec;

use crate::image::ImageResolver;
use crate::node::Node;
use crate::options::{RenderOptions, Resources};
use crate::surface::Canvas;
use crate::text::{ParagraphLayout, TextGraphicsState};
use crate::units::UnitContext;

/// Text positioning state shared by the runs of one text element.
#[derive(Clone, Debug, Default)]
pub struct TextState {
    /// The transform of the chunk currently being drawn.
    pub transform: Affine,
    /// Horizontal advance accumulated since the start of the chunk.
    pub advance: f64,
    /// The pen position relative to the chunk origin.
    pub cursor: Point,
    /// The graphics state most recently applied to the surface for text.
    pub applied: TextGraphicsState,
}

/// Mutable state for one render pass.
///
/// Every stack follows strict push/pop discipline. Popping or reading an
/// empty stack is a contract violation and panics. The `with_*` helpers
/// keep pushes and pops paired.
pub struct DrawContext<'a> {
    options: &'a RenderOptions,
    resources: Resources<'a>,
    surfaces: Vec<Canvas>,
    viewports: Vec<Rect>,
    font_sizes: Vec<f64>,
    named_objects: HashMap<String, &'a Node>,
    pattern_ids: SmallVec<[String; 4]>,
    used_ids: Vec<String>,
    text: TextState,
    in_clip_path: bool,
}

impl<'a> DrawContext<'a> {
    /// Creates a context with empty stacks.
    pub fn new(options: &'a RenderOptions, resources: Resources<'a>) -> Self {
        Self {
            options,
            resources,
            surfaces: Vec::new(),
            viewports: Vec::new(),
            font_sizes: Vec::new(),
            named_objects: HashMap::new(),
            pattern_ids: SmallVec::new(),
            used_ids: Vec::new(),
            text: TextState::default(),
            in_clip_path: false,
        }
    }

    /// The options of this pass.
    pub fn options(&self) -> &'a RenderOptions {
        self.options
    }

    /// The paragraph layout service, if any.
    pub fn text_layout(&self) -> Option<&'a dyn ParagraphLayout> {
        self.resources.text_layout
    }

    /// The image resolver, if any.
    pub fn images(&self) -> Option<&'a dyn ImageResolver> {
        self.resources.images
    }

    // --- Surfaces ---

    /// Makes `canvas` the current drawing target.
    pub fn push_surface(&mut self, canvas: Canvas) {
        self.surfaces.push(canvas);
    }

    /// Removes and returns the current drawing target.
    pub fn pop_surface(&mut self) -> Canvas {
        self.surfaces
            .pop()
            .expect("pop_surface called on an empty surface stack")
    }

    /// The current drawing target.
    pub fn surface(&mut self) -> &mut Canvas {
        self.surfaces
            .last_mut()
            .expect("no surface to draw on: the surface stack is empty")
    }

    /// The number of surfaces on the stack.
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Draws into a fresh canvas and returns it once `f` is done.
    pub fn with_new_surface(&mut self, f: impl FnOnce(&mut Self)) -> Canvas {
        self.push_surface(Canvas::new());
        f(self);
        self.pop_surface()
    }

    // --- Viewports ---

    pub fn push_viewport(&mut self, viewport: Rect) {
        self.viewports.push(viewport);
    }

    pub fn pop_viewport(&mut self) -> Rect {
        self.viewports
            .pop()
            .expect("pop_viewport called on an empty viewport stack")
    }

    /// The viewport lengths currently resolve against.
    pub fn current_viewport(&self) -> Rect {
        *self
            .viewports
            .last()
            .expect("no current viewport: the viewport stack is empty")
    }

    pub fn with_viewport<R>(&mut self, viewport: Rect, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_viewport(viewport);
        let result = f(self);
        self.pop_viewport();
        result
    }

    // --- Font sizes ---

    /// The font size `em` lengths currently resolve against.
    pub fn current_font_size(&self) -> f64 {
        self.font_sizes
            .last()
            .copied()
            .unwrap_or_else(|| self.options.initial_font_size())
    }

    pub fn with_font_size<R>(&mut self, font_size: f64, f: impl FnOnce(&mut Self) -> R) -> R {
        self.font_sizes.push(font_size);
        let result = f(self);
        self.font_sizes.pop();
        result
    }

    /// Everything needed to resolve lengths at the current point of the
    /// traversal.
    pub fn units(&self) -> UnitContext {
        UnitContext {
            viewport: self.current_viewport(),
            font_size: self.current_font_size(),
            root_font_size: self.options.resolved_root_font_size(),
            unit_scale: self.options.unit_scale,
        }
    }

    // --- Named objects ---

    /// Registers `node` under `id`, with any leading `#` removed.
    ///
    /// The first registration of an id wins.
    pub fn add_named_object(&mut self, id: &str, node: &'a Node) {
        let id = id.trim().trim_start_matches('#');
        if id.is_empty() {
            return;
        }
        if self.named_objects.contains_key(id) {
            log::debug!("Duplicate id {id:?}, keeping the first element");
            return;
        }
        self.named_objects.insert(id.to_owned(), node);
    }

    /// Looks up a registered node. A leading `#` is ignored.
    pub fn named_object(&self, id: &str) -> Option<&'a Node> {
        self.named_objects
            .get(id.trim().trim_start_matches('#'))
            .copied()
    }

    /// Registers every node with an id in the subtree rooted at `root`.
    ///
    /// This runs before drawing so that references may point forwards.
    pub fn register_tree(&mut self, root: &'a Node) {
        if let Some(id) = root.attributes.id() {
            self.add_named_object(id, root);
        }
        for child in &root.children {
            self.register_tree(child);
        }
    }

    // --- Cycle guards ---

    /// Marks a pattern as under construction.
    ///
    /// Returns `false`, leaving the stack unchanged, if the pattern is
    /// already being built further up.
    pub fn push_pattern_id(&mut self, id: &str) -> bool {
        if self.pattern_ids.iter().any(|p| p == id) {
            return false;
        }
        self.pattern_ids.push(id.to_owned());
        true
    }

    pub fn pop_pattern_id(&mut self) {
        self.pattern_ids
            .pop()
            .expect("pop_pattern_id called on an empty pattern stack");
    }

    /// Runs `f` with `id` marked as under construction, or returns `None`
    /// if that would form a cycle.
    pub fn with_pattern_id<R>(&mut self, id: &str, f: impl FnOnce(&mut Self) -> R) -> Option<R> {
        if !self.push_pattern_id(id) {
            return None;
        }
        let result = f(self);
        self.pop_pattern_id();
        Some(result)
    }

    /// Marks an element id as being drawn.
    pub fn push_used_id(&mut self, id: &str) {
        self.used_ids.push(id.to_owned());
    }

    pub fn pop_used_id(&mut self) {
        self.used_ids
            .pop()
            .expect("pop_used_id called on an empty id stack");
    }

    /// Whether `id` belongs to an element that is currently being drawn,
    /// that is an ancestor of whatever is being drawn now.
    pub fn is_id_used_by_reference_before(&self, id: &str) -> bool {
        let id = id.trim().trim_start_matches('#');
        self.used_ids.iter().any(|used| used == id)
    }

    pub fn with_used_id<R>(&mut self, id: Option<&str>, f: impl FnOnce(&mut Self) -> R) -> R {
        let Some(id) = id else {
            return f(self);
        };
        self.push_used_id(id);
        let result = f(self);
        self.pop_used_id();
        result
    }

    // --- Text and clipping ---

    pub fn text_state(&self) -> &TextState {
        &self.text
    }

    pub fn text_state_mut(&mut self) -> &mut TextState {
        &mut self.text
    }

    /// Whether geometry is currently being drawn as a clip boundary.
    pub fn in_clip_path(&self) -> bool {
        self.in_clip_path
    }

    /// Runs `f` with geometry turned into clip boundaries.
    pub fn with_clip_path<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.in_clip_path, true);
        let result = f(self);
        self.in_clip_path = previous;
        result
    }

    /// Runs `f` with geometry painted normally, even inside a clip path.
    pub fn without_clip_path<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.in_clip_path, false);
        let result = f(self);
        self.in_clip_path = previous;
        result
    }
}

impl std::fmt::Debug for DrawContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawContext")
            .field("surfaces", &self.surfaces.len())
            .field("viewports", &self.viewports)
            .field("font_sizes", &self.font_sizes)
            .field("named_objects", &self.named_objects.len())
            .field("pattern_ids", &self.pattern_ids)
            .field("used_ids", &self.used_ids)
            .field("in_clip_path", &self.in_clip_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::DrawContext;
    use crate::node::{ElementKind, Node};
    use crate::options::{RenderOptions, Resources};
    use peniko::kurbo::Rect;

    #[test]
    fn pattern_ids_detect_cycles() {
        let options = RenderOptions::default();
        let mut ctx = DrawContext::new(&options, Resources::default());
        assert!(ctx.push_pattern_id("a"));
        assert!(ctx.push_pattern_id("b"));
        assert!(!ctx.push_pattern_id("a"));
        ctx.pop_pattern_id();
        assert!(ctx.push_pattern_id("b"));
        assert_eq!(ctx.with_pattern_id("a", |_| ()), None);
    }

    #[test]
    fn named_objects_strip_hash() {
        let options = RenderOptions::default();
        let node = Node::new(ElementKind::Rect).with_attribute("id", "r");
        let mut ctx = DrawContext::new(&options, Resources::default());
        ctx.register_tree(&node);
        assert!(ctx.named_object("#r").is_some());
        assert!(ctx.named_object("r").is_some());
        assert!(ctx.named_object("q").is_none());
    }

    #[test]
    fn used_ids_track_ancestors() {
        let options = RenderOptions::default();
        let mut ctx = DrawContext::new(&options, Resources::default());
        ctx.with_used_id(Some("outer"), |ctx| {
            assert!(ctx.is_id_used_by_reference_before("#outer"));
            assert!(!ctx.is_id_used_by_reference_before("inner"));
        });
        assert!(!ctx.is_id_used_by_reference_before("outer"));
    }

    #[test]
    #[should_panic(expected = "viewport stack is empty")]
    fn empty_viewport_stack_panics() {
        let options = RenderOptions::default();
        let ctx = DrawContext::new(&options, Resources::default());
        let _ = ctx.current_viewport();
    }

    #[test]
    fn viewports_nest() {
        let options = RenderOptions::default();
        let mut ctx = DrawContext::new(&options, Resources::default());
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(0.0, 0.0, 10.0, 10.0);
        ctx.with_viewport(outer, |ctx| {
            ctx.with_viewport(inner, |ctx| assert_eq!(ctx.current_viewport(), inner));
            assert_eq!(ctx.current_viewport(), outer);
        });
    }
}
