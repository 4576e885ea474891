// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer nodes and the per-node draw protocol.

use peniko::kurbo::{Rect, Shape};

use crate::attributes::{names, reference_id, Attributes};
use crate::context::DrawContext;
use crate::surface::Surface;
use crate::transform::parse_transform;
use crate::{branch, clip, image, shapes, text};

/// The kind of element a [`Node`] renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// An outermost or nested viewport.
    Svg,
    Group,
    /// Holds referenced content without drawing it.
    Defs,
    /// A template only drawn through `use`.
    Symbol,
    Use,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
    Path,
    Image,
    Text,
    TSpan,
    /// Character data inside a text element.
    TextContent(String),
    LinearGradient,
    RadialGradient,
    Stop,
    Pattern,
    ClipPath,
    Marker,
    /// Anything else: metadata, styles and unsupported elements. Never
    /// drawn, but still resolvable by id.
    NoDraw,
}

impl ElementKind {
    /// Maps an element name to its kind, ignoring ASCII case.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "svg" => Self::Svg,
            "g" => Self::Group,
            "defs" => Self::Defs,
            "symbol" => Self::Symbol,
            "use" => Self::Use,
            "rect" => Self::Rect,
            "circle" => Self::Circle,
            "ellipse" => Self::Ellipse,
            "line" => Self::Line,
            "polyline" => Self::Polyline,
            "polygon" => Self::Polygon,
            "path" => Self::Path,
            "image" => Self::Image,
            "text" => Self::Text,
            "tspan" => Self::TSpan,
            "lineargradient" => Self::LinearGradient,
            "radialgradient" => Self::RadialGradient,
            "stop" => Self::Stop,
            "pattern" => Self::Pattern,
            "clippath" => Self::ClipPath,
            "marker" => Self::Marker,
            _ => Self::NoDraw,
        }
    }

    /// Whether normal top-down traversal draws this kind.
    pub fn can_draw(&self) -> bool {
        self.is_shape()
            || matches!(
                self,
                Self::Svg | Self::Group | Self::Use | Self::Image | Self::Text
            )
    }

    pub fn can_contain_children(&self) -> bool {
        matches!(
            self,
            Self::Svg
                | Self::Group
                | Self::Defs
                | Self::Symbol
                | Self::Text
                | Self::TSpan
                | Self::LinearGradient
                | Self::RadialGradient
                | Self::Pattern
                | Self::ClipPath
                | Self::Marker
                | Self::NoDraw
        )
    }

    pub fn is_paint_server(&self) -> bool {
        matches!(
            self,
            Self::LinearGradient | Self::RadialGradient | Self::Pattern
        )
    }

    pub fn is_clip_source(&self) -> bool {
        matches!(self, Self::ClipPath)
    }

    /// Whether this kind produces text geometry.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text | Self::TSpan | Self::TextContent(_))
    }

    /// Leaf shapes described by a single path.
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            Self::Rect
                | Self::Circle
                | Self::Ellipse
                | Self::Line
                | Self::Polyline
                | Self::Polygon
                | Self::Path
        )
    }

    /// Shapes that accept `marker-*` properties.
    pub fn has_markers(&self) -> bool {
        matches!(
            self,
            Self::Line | Self::Polyline | Self::Polygon | Self::Path
        )
    }
}

/// One element of the renderer tree.
///
/// Nodes own their children. Reused content (`use` targets, clip paths) is
/// deep-copied per use-site with `Clone`, so no node is shared mutably.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: ElementKind,
    /// The cascaded attributes and presentation properties of the element.
    pub attributes: Attributes,
    pub children: Vec<Node>,
}

impl Node {
    /// Creates a node without attributes or children.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Creates a node from an element name.
    pub fn element(tag: &str) -> Self {
        Self::new(ElementKind::from_tag(tag))
    }

    /// Creates a character data node.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(ElementKind::TextContent(content.into()))
    }

    /// Sets an attribute.
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name, value);
        self
    }

    /// Appends a child.
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several children.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Draws the node and its subtree onto the current surface of `ctx`.
    pub fn draw(&self, ctx: &mut DrawContext<'_>) {
        if !self.kind.can_draw() || self.is_display_none() {
            return;
        }
        let font_size = self.font_size(ctx);
        ctx.with_font_size(font_size, |ctx| match self.kind {
            ElementKind::Svg => branch::draw_viewport(self, ctx),
            ElementKind::Group => branch::draw_group(self, ctx),
            ElementKind::Use => branch::draw_use(self, ctx),
            ElementKind::Image => image::draw(self, ctx),
            ElementKind::Text => text::draw(self, ctx),
            _ if self.kind.is_shape() => shapes::draw(self, ctx),
            _ => {}
        });
    }

    /// The bounding box of the node in its own user space, if it has one.
    pub fn bounding_box(&self, ctx: &mut DrawContext<'_>) -> Option<Rect> {
        if self.is_display_none() {
            return None;
        }
        let font_size = self.font_size(ctx);
        ctx.with_font_size(font_size, |ctx| match self.kind {
            ElementKind::Group => self
                .children
                .iter()
                .filter_map(|child| {
                    let bbox = child.bounding_box(ctx)?;
                    let transform = child.transform(ctx.options().unit_scale)?;
                    Some(transform.transform_rect_bbox(bbox))
                })
                .reduce(|a, b| a.union(b)),
            ElementKind::Text => text::bounding_box(self, ctx),
            _ if self.kind.is_shape() => shapes::geometry(self, ctx)
                .ok()
                .flatten()
                .map(|path| path.bounding_box()),
            _ => None,
        })
    }

    /// Whether `display="none"` removes the node and its subtree.
    pub(crate) fn is_display_none(&self) -> bool {
        self.attributes.get_trimmed(names::DISPLAY) == Some("none")
    }

    /// Whether `visibility` suppresses the node's own paint.
    pub(crate) fn is_hidden(&self) -> bool {
        matches!(
            self.attributes.get_trimmed(names::VISIBILITY),
            Some("hidden" | "collapse")
        )
    }

    /// The parsed `transform` attribute, or identity when there is none.
    ///
    /// Returns `None` only for malformed values, after logging them.
    pub(crate) fn transform(&self, unit_scale: f64) -> Option<peniko::kurbo::Affine> {
        let Some(value) = self.attributes.get_trimmed(names::TRANSFORM) else {
            return Some(peniko::kurbo::Affine::IDENTITY);
        };
        match parse_transform(value, unit_scale) {
            Ok(transform) => Some(transform),
            Err(e) => {
                log::warn!(
                    "Ignoring transform of {:?} element {:?}: {e}",
                    self.kind,
                    self.attributes.id()
                );
                None
            }
        }
    }

    fn font_size(&self, ctx: &DrawContext<'_>) -> f64 {
        let current = ctx.current_font_size();
        let Some(value) = self.attributes.get_trimmed(names::FONT_SIZE) else {
            return current;
        };
        match ctx.units().resolve_font_size(value) {
            Ok(size) if size >= 0.0 => size,
            Ok(_) | Err(_) => {
                log::warn!("Invalid font-size {value:?}, keeping {current}");
                current
            }
        }
    }

    /// Runs the shared part of the draw protocol around `body`.
    ///
    /// Registers the node as being drawn, applies its `transform` and, when
    /// it references one, routes `body` through the clip-path compositor.
    /// `bbox` is the node's bounding box for `objectBoundingBox` clips.
    pub(crate) fn draw_scoped(
        &self,
        ctx: &mut DrawContext<'_>,
        bbox: Option<Rect>,
        mut body: impl FnMut(&mut DrawContext<'_>),
    ) {
        ctx.with_used_id(self.attributes.id(), |ctx| {
            if let Some(transform) = self.transform(ctx.options().unit_scale) {
                if transform != peniko::kurbo::Affine::IDENTITY {
                    ctx.surface().concat_transform(transform);
                }
            }
            match self.clip_source(ctx) {
                Some(clip_path) => clip::draw_clipped(clip_path, ctx, bbox, &mut body),
                None => body(ctx),
            }
        });
    }

    fn clip_source<'a>(&self, ctx: &DrawContext<'a>) -> Option<&'a Node> {
        let value = self.attributes.get_trimmed(names::CLIP_PATH)?;
        if value == "none" {
            return None;
        }
        if ctx.in_clip_path() {
            log::debug!("Ignoring clip-path {value:?} inside a clip path");
            return None;
        }
        let Some(id) = reference_id(value) else {
            log::warn!("Unsupported clip-path value {value:?}");
            return None;
        };
        if ctx.is_id_used_by_reference_before(id) {
            log::warn!("Clip path {id:?} references an element that uses it");
            return None;
        }
        match ctx.named_object(id) {
            Some(node) if node.kind.is_clip_source() => Some(node),
            Some(node) => {
                log::warn!("clip-path references {id:?}, which is a {:?}", node.kind);
                None
            }
            None => {
                log::warn!("clip-path references unknown id {id:?}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ElementKind, Node};

    #[test]
    fn tags_are_case_insensitive() {
        assert_eq!(ElementKind::from_tag("linearGradient"), ElementKind::LinearGradient);
        assert_eq!(ElementKind::from_tag("clipPath"), ElementKind::ClipPath);
        assert_eq!(ElementKind::from_tag("title"), ElementKind::NoDraw);
    }

    #[test]
    fn capabilities() {
        assert!(ElementKind::Rect.can_draw());
        assert!(!ElementKind::Defs.can_draw());
        assert!(!ElementKind::Symbol.can_draw());
        assert!(ElementKind::Pattern.is_paint_server());
        assert!(ElementKind::Pattern.can_contain_children());
        assert!(!ElementKind::Use.can_contain_children());
        assert!(ElementKind::ClipPath.is_clip_source());
        assert!(ElementKind::TSpan.is_text());
        assert!(ElementKind::Polyline.has_markers());
        assert!(!ElementKind::Rect.has_markers());
    }

    #[test]
    fn clones_are_deep() {
        let original = Node::element("g").with_child(Node::element("rect").with_attribute("fill", "red"));
        let mut copy = original.clone();
        copy.children[0].attributes.insert("fill", "blue");
        assert_eq!(original.children[0].attributes.get("fill"), Some("red"));
    }
}
