// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text elements.
//!
//! A `text` element and its `tspan` descendants are flattened into pieces:
//! runs of characters sharing one style, each starting at most one explicit
//! position. An absolute `x` or `y` starts a new chunk, and chunks are
//! aligned on their anchor point according to `text-anchor`. Shaping is left
//! to the [`ParagraphLayout`] service.

mod layout;
mod style;

pub use layout::{
    FixedPitchLayout, FontSpec, LineMetrics, ParagraphLayout, TextDecoration, TextMatrix, TextRun,
};
pub use style::TextGraphicsState;

use self::style::rendering_mode;

use peniko::kurbo::{Affine, Point, Rect, Vec2};

use crate::attributes::{names, Attributes};
use crate::context::DrawContext;
use crate::node::{ElementKind, Node};
use crate::style::{surface_opacity, PaintStyle};
use crate::surface::{Surface, TextRenderingMode};
use crate::units::{Axis, UnitContext};

/// Shear applied to synthesized oblique text, roughly 12 degrees.
const OBLIQUE_SKEW: f64 = 0.21;

/// Draws a `text` element.
pub(crate) fn draw(node: &Node, ctx: &mut DrawContext<'_>) {
    let Some(layout) = ctx.text_layout() else {
        log::debug!("No paragraph layout service, skipping text {:?}", node.attributes.id());
        return;
    };
    let text = TextLayout::collect(node, ctx);
    if text.chunks.is_empty() {
        return;
    }
    let measured = text.measure(layout);
    let bbox = measured.bbox;
    node.draw_scoped(ctx, bbox, |ctx| text.draw(&measured, layout, ctx));
}

/// The extent of a `text` element in its user space.
pub(crate) fn bounding_box(node: &Node, ctx: &mut DrawContext<'_>) -> Option<Rect> {
    let layout = ctx.text_layout()?;
    let text = TextLayout::collect(node, ctx);
    text.measure(layout).bbox
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("start") => Self::Start,
            Some("middle") => Self::Middle,
            Some("end") => Self::End,
            Some(other) => {
                log::warn!("Unknown text-anchor {other:?}, using start");
                Self::Start
            }
        }
    }

    /// Offset applied to a chunk of the given advance.
    fn shift(self, width: f64) -> f64 {
        match self {
            Self::Start => 0.0,
            Self::Middle => -width / 2.0,
            Self::End => -width,
        }
    }
}

/// The resolved style of one `text` or `tspan` element.
#[derive(Debug)]
struct Style {
    /// A childless copy carrying the inherited attributes, for paint
    /// resolution.
    node: Node,
    font: FontSpec,
    oblique: bool,
    font_size: f64,
    decoration: TextDecoration,
    anchor: Anchor,
}

impl Style {
    fn new(kind: ElementKind, attributes: Attributes, font_size: f64) -> Self {
        let (font, oblique) = font_spec(&attributes);
        let decoration = attributes
            .get_trimmed(names::TEXT_DECORATION)
            .map(TextDecoration::parse)
            .unwrap_or_default();
        let anchor = Anchor::parse(attributes.get_trimmed(names::TEXT_ANCHOR));
        Self {
            node: Node {
                kind,
                attributes,
                children: Vec::new(),
            },
            font,
            oblique,
            font_size,
            decoration,
            anchor,
        }
    }

    fn run<'s>(&'s self, text: &'s str) -> TextRun<'s> {
        TextRun {
            text,
            font: &self.font,
            font_size: self.font_size,
            decoration: self.decoration,
        }
    }
}

fn font_spec(attributes: &Attributes) -> (FontSpec, bool) {
    let mut font = FontSpec::default();
    if let Some(family) = attributes.get_trimmed(names::FONT_FAMILY) {
        font.family = family.to_owned();
    }
    font.weight = match attributes.get_trimmed(names::FONT_WEIGHT) {
        None | Some("normal") => 400,
        Some("bold" | "bolder") => 700,
        Some("lighter") => 300,
        Some(value) => match value.parse::<u16>() {
            Ok(weight) if (1..=1000).contains(&weight) => weight,
            _ => {
                log::warn!("Invalid font-weight {value:?}, using normal");
                400
            }
        },
    };
    let style = attributes.get_trimmed(names::FONT_STYLE);
    font.italic = matches!(style, Some("italic" | "oblique"));
    (font, style == Some("oblique"))
}

/// A run of characters with one style.
///
/// Only the first character of a piece may carry an explicit position.
#[derive(Clone, Debug, PartialEq)]
struct Piece {
    text: String,
    /// Index into [`TextLayout::styles`].
    style: usize,
    position: CharPosition,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct CharPosition {
    x: Option<f64>,
    y: Option<f64>,
    dx: f64,
    dy: f64,
}

impl CharPosition {
    fn is_absolute(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }
}

/// The position lists of one element, consumed a character at a time.
#[derive(Debug, Default)]
struct Positions {
    x: Vec<f64>,
    y: Vec<f64>,
    dx: Vec<f64>,
    dy: Vec<f64>,
    next: usize,
}

impl Positions {
    fn read(node: &Node, units: &UnitContext) -> Self {
        let list = |name: &'static str, axis: Axis| -> Vec<f64> {
            let Some(value) = node.attributes.get_trimmed(name) else {
                return Vec::new();
            };
            units.resolve_list(value, axis).unwrap_or_else(|e| {
                log::warn!("Ignoring {name} of {:?}: {e}", node.kind);
                Vec::new()
            })
        };
        Self {
            x: list(names::X, Axis::Horizontal),
            y: list(names::Y, Axis::Vertical),
            dx: list(names::DX, Axis::Horizontal),
            dy: list(names::DY, Axis::Vertical),
            next: 0,
        }
    }
}

/// The flattened content of a `text` element.
#[derive(Debug, Default)]
struct TextLayout {
    styles: Vec<Style>,
    chunks: Vec<Vec<Piece>>,
}

/// Flattening state.
#[derive(Debug)]
struct Collector {
    styles: Vec<Style>,
    pieces: Vec<Piece>,
    frames: Vec<Positions>,
    /// Whether the last kept character was a space. Starts out set so
    /// leading spaces are dropped.
    after_space: bool,
}

impl Collector {
    fn element(
        &mut self,
        node: &Node,
        parent: Option<&Attributes>,
        font_size: f64,
        ctx: &DrawContext<'_>,
    ) {
        let mut attributes = node.attributes.clone();
        if let Some(parent) = parent {
            attributes.inherit_from(parent);
        }
        let units = UnitContext {
            font_size,
            ..ctx.units()
        };
        self.frames.push(Positions::read(node, &units));
        let style = self.styles.len();
        self.styles
            .push(Style::new(node.kind.clone(), attributes, font_size));

        for child in &node.children {
            match &child.kind {
                ElementKind::TextContent(content) => self.characters(content, style),
                ElementKind::TSpan if !child.is_display_none() => {
                    let size = tspan_font_size(child, &units);
                    let inherited = self.styles[style].node.attributes.clone();
                    self.element(child, Some(&inherited), size, ctx);
                }
                _ => {}
            }
        }
        self.frames.pop();
    }

    fn characters(&mut self, content: &str, style: usize) {
        for c in content.chars() {
            let c = match c {
                '\n' | '\r' => continue,
                '\t' => ' ',
                c => c,
            };
            if c == ' ' {
                if self.after_space {
                    continue;
                }
                self.after_space = true;
            } else {
                self.after_space = false;
            }
            let position = self.next_position();
            match self.pieces.last_mut() {
                Some(last) if last.style == style && position == CharPosition::default() => {
                    last.text.push(c);
                }
                _ => self.pieces.push(Piece {
                    text: c.to_string(),
                    style,
                    position,
                }),
            }
        }
    }

    /// Takes the position of the next character: for each list, the
    /// innermost element with a value left wins. Every element on the stack
    /// consumes an index.
    fn next_position(&mut self) -> CharPosition {
        let frames = self.frames.iter().rev();
        let position = CharPosition {
            x: frames.clone().find_map(|f| f.x.get(f.next).copied()),
            y: frames.clone().find_map(|f| f.y.get(f.next).copied()),
            dx: frames.clone().find_map(|f| f.dx.get(f.next).copied()).unwrap_or(0.0),
            dy: frames.clone().find_map(|f| f.dy.get(f.next).copied()).unwrap_or(0.0),
        };
        for frame in &mut self.frames {
            frame.next += 1;
        }
        position
    }

    fn finish(mut self) -> TextLayout {
        if let Some(last) = self.pieces.last_mut() {
            if last.text.ends_with(' ') {
                last.text.pop();
            }
            if last.text.is_empty() {
                self.pieces.pop();
            }
        }
        let mut chunks: Vec<Vec<Piece>> = Vec::new();
        for piece in self.pieces {
            match chunks.last_mut() {
                Some(chunk) if !piece.position.is_absolute() => chunk.push(piece),
                _ => chunks.push(vec![piece]),
            }
        }
        TextLayout {
            styles: self.styles,
            chunks,
        }
    }
}

fn tspan_font_size(node: &Node, parent: &UnitContext) -> f64 {
    let Some(value) = node.attributes.get_trimmed(names::FONT_SIZE) else {
        return parent.font_size;
    };
    match parent.resolve_font_size(value) {
        Ok(size) if size >= 0.0 => size,
        _ => {
            log::warn!("Invalid font-size {value:?} on tspan");
            parent.font_size
        }
    }
}

/// The measured geometry of a text element.
#[derive(Debug)]
struct Measured {
    chunks: Vec<MeasuredChunk>,
    bbox: Option<Rect>,
}

#[derive(Debug)]
struct MeasuredChunk {
    /// The anchor point, before alignment.
    origin: Point,
    /// Horizontal alignment offset.
    shift: f64,
    metrics: Vec<LineMetrics>,
}

impl TextLayout {
    fn collect(node: &Node, ctx: &DrawContext<'_>) -> Self {
        let mut collector = Collector {
            styles: Vec::new(),
            pieces: Vec::new(),
            frames: Vec::new(),
            after_space: true,
        };
        collector.element(node, None, ctx.current_font_size(), ctx);
        collector.finish()
    }

    fn measure(&self, layout: &dyn ParagraphLayout) -> Measured {
        let mut pen = Point::ZERO;
        let mut bbox: Option<Rect> = None;
        let mut chunks = Vec::with_capacity(self.chunks.len());
        for chunk in &self.chunks {
            if let Some(x) = chunk[0].position.x {
                pen.x = x;
            }
            if let Some(y) = chunk[0].position.y {
                pen.y = y;
            }
            let origin = pen;
            let mut cursor = Point::ZERO;
            let mut advance = 0.0;
            let mut extent: Option<Rect> = None;
            let mut metrics = Vec::with_capacity(chunk.len());
            for piece in chunk {
                let style = &self.styles[piece.style];
                cursor.x += piece.position.dx;
                cursor.y += piece.position.dy;
                let m = layout.layout(&style.run(&piece.text));
                let x = origin.x + advance + cursor.x;
                let y = origin.y + cursor.y;
                let rect = Rect::new(x, y - m.ascent, x + m.width, y + m.descent);
                extent = Some(extent.map_or(rect, |e| e.union(rect)));
                advance += m.width;
                metrics.push(m);
            }
            let anchor = self.styles[chunk[0].style].anchor;
            let shift = anchor.shift(advance + cursor.x);
            if let Some(extent) = extent {
                let extent = extent + Vec2::new(shift, 0.0);
                bbox = Some(bbox.map_or(extent, |b| b.union(extent)));
            }
            pen = Point::new(origin.x + advance + cursor.x, origin.y + cursor.y);
            chunks.push(MeasuredChunk {
                origin,
                shift,
                metrics,
            });
        }
        Measured { chunks, bbox }
    }

    fn draw(&self, measured: &Measured, layout: &dyn ParagraphLayout, ctx: &mut DrawContext<'_>) {
        let vertical_scale = if ctx.options().y_up { -1.0 } else { 1.0 };
        ctx.text_state_mut().applied = TextGraphicsState::default();
        ctx.surface().begin_text();
        for (chunk, placed) in self.chunks.iter().zip(&measured.chunks) {
            {
                let state = ctx.text_state_mut();
                state.transform =
                    Affine::translate((placed.origin.x + placed.shift, placed.origin.y));
                state.advance = 0.0;
                state.cursor = Point::ZERO;
            }
            for (piece, metrics) in chunk.iter().zip(&placed.metrics) {
                let state = ctx.text_state_mut();
                state.cursor.x += piece.position.dx;
                state.cursor.y += piece.position.dy;
                let origin =
                    state.transform * Point::new(state.advance + state.cursor.x, state.cursor.y);
                state.advance += metrics.width;

                let style = &self.styles[piece.style];
                if style.node.is_hidden() {
                    continue;
                }
                let Some(next) = graphics_state(style, ctx, measured.bbox) else {
                    continue;
                };
                let matrix = TextMatrix {
                    skew: if style.oblique { OBLIQUE_SKEW } else { 0.0 },
                    vertical_scale,
                    ..TextMatrix::default()
                };
                let previous = ctx.text_state().applied.clone();
                next.apply_over(&previous, ctx.surface());
                layout.draw(&style.run(&piece.text), ctx.surface(), origin, matrix);
                previous.apply_over(&next, ctx.surface());
            }
        }
        ctx.surface().end_text();
    }
}

/// The state a run is drawn with, or `None` when it would paint nothing.
fn graphics_state(
    style: &Style,
    ctx: &mut DrawContext<'_>,
    bbox: Option<Rect>,
) -> Option<TextGraphicsState> {
    let font = Some((style.font.clone(), style.font_size));
    if ctx.in_clip_path() {
        return Some(TextGraphicsState {
            font,
            mode: TextRenderingMode::Clip,
            ..TextGraphicsState::default()
        });
    }
    let paint = PaintStyle::resolve(&style.node, ctx, bbox, true);
    if !paint.is_visible() {
        return None;
    }
    let defaults = TextGraphicsState::default();
    Some(TextGraphicsState {
        mode: rendering_mode(paint.fill.is_some(), paint.stroke.is_some()),
        fill_opacity: paint
            .fill
            .as_ref()
            .map_or(defaults.fill_opacity, |p| surface_opacity(p, paint.fill_opacity)),
        stroke_opacity: paint
            .stroke
            .as_ref()
            .map_or(defaults.stroke_opacity, |p| surface_opacity(p, paint.stroke_opacity)),
        line_width: if paint.stroke.is_some() {
            paint.stroke_style.width
        } else {
            defaults.line_width
        },
        fill: paint.fill,
        stroke: paint.stroke,
        font,
    })
}

#[cfg(test)]
mod tests {
    use super::{FixedPitchLayout, TextLayout};
    use crate::context::DrawContext;
    use crate::node::Node;
    use crate::options::{RenderOptions, Resources};
    use peniko::kurbo::Rect;

    fn collect(node: &Node) -> TextLayout {
        let options = RenderOptions::default().with_unit_scale(1.0);
        let mut ctx = DrawContext::new(&options, Resources::default());
        ctx.push_viewport(Rect::new(0.0, 0.0, 100.0, 100.0));
        ctx.with_font_size(10.0, |ctx| TextLayout::collect(node, ctx))
    }

    fn texts(layout: &TextLayout) -> Vec<Vec<&str>> {
        layout
            .chunks
            .iter()
            .map(|chunk| chunk.iter().map(|p| p.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn whitespace_is_collapsed() {
        let text = Node::element("text").with_child(Node::text("\n  a \t\n b  "));
        assert_eq!(texts(&collect(&text)), [["a b"]]);
    }

    #[test]
    fn absolute_positions_start_chunks() {
        let text = Node::element("text")
            .with_attribute("x", "0 10")
            .with_child(Node::text("ABC"));
        // "A" and "B" each take an x, "C" continues the chunk of "B".
        assert_eq!(texts(&collect(&text)), [["A"], ["BC"]]);
    }

    #[test]
    fn innermost_position_wins() {
        let text = Node::element("text")
            .with_attribute("dx", "1 2 3")
            .with_child(Node::text("a"))
            .with_child(
                Node::element("tspan")
                    .with_attribute("dx", "7")
                    .with_child(Node::text("bc")),
            );
        let layout = collect(&text);
        let pieces = &layout.chunks[0];
        let dx: Vec<f64> = pieces.iter().map(|p| p.position.dx).collect();
        // "b" uses the tspan's value, "c" falls back to the text's third.
        assert_eq!(dx, [1.0, 7.0, 3.0]);
    }

    #[test]
    fn anchor_shifts_bbox() {
        let text = Node::element("text")
            .with_attribute("x", "50")
            .with_attribute("text-anchor", "middle")
            .with_child(Node::text("abcd"));
        let measured = collect(&text).measure(&FixedPitchLayout::default());
        // Four characters at 5 units each.
        assert_eq!(measured.bbox, Some(Rect::new(40.0, -8.0, 60.0, 2.0)));
    }

    #[test]
    fn tspan_inherits_style() {
        let text = Node::element("text")
            .with_attribute("font-weight", "bold")
            .with_child(Node::element("tspan").with_child(Node::text("x")));
        let layout = collect(&text);
        assert_eq!(layout.styles[1].font.weight, 700);
    }
}
