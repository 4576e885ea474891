// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The primitive drawing interface and its recording implementation.

use std::sync::Arc;

use peniko::kurbo::{Affine, BezPath, PathEl, Point, QuadBez, Rect, Stroke};
use peniko::{Fill, Image};

use crate::paint::Paint;
use crate::text::FontSpec;

/// How glyph outlines are painted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextRenderingMode {
    Fill,
    Stroke,
    FillStroke,
    Invisible,
    /// Adds the glyph outlines to the clip region.
    Clip,
}

/// An imperative drawing target.
///
/// This is the complete set of operations the renderer emits. Paths are built
/// with the construction methods and consumed by exactly one of [`fill`],
/// [`stroke`], [`fill_stroke`], [`clip`] or [`end_path`].
///
/// [`fill`]: Surface::fill
/// [`stroke`]: Surface::stroke
/// [`fill_stroke`]: Surface::fill_stroke
/// [`clip`]: Surface::clip
/// [`end_path`]: Surface::end_path
pub trait Surface {
    /// Pushes a copy of the graphics state.
    fn save_state(&mut self);
    /// Pops the graphics state, discarding clips and transforms set since the
    /// matching [`save_state`](Surface::save_state).
    fn restore_state(&mut self);
    /// Concatenates `transform` onto the current transformation matrix.
    fn concat_transform(&mut self, transform: Affine);

    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn curve_to(&mut self, p1: Point, p2: Point, p3: Point);
    fn close_path(&mut self);

    /// Fills the current path.
    fn fill(&mut self, rule: Fill);
    /// Strokes the current path.
    fn stroke(&mut self);
    /// Fills, then strokes, the current path.
    fn fill_stroke(&mut self, rule: Fill);
    /// Intersects the clip region with the current path and ends it.
    fn clip(&mut self, rule: Fill);
    /// Ends the current path without painting it.
    fn end_path(&mut self);

    fn set_fill_paint(&mut self, paint: &Paint);
    fn set_stroke_paint(&mut self, paint: &Paint);
    fn set_line_width(&mut self, width: f64);
    /// Sets width, joins, caps and dashes at once.
    fn set_stroke_style(&mut self, style: &Stroke);
    fn set_fill_opacity(&mut self, opacity: f32);
    fn set_stroke_opacity(&mut self, opacity: f32);

    fn begin_text(&mut self);
    fn end_text(&mut self);
    fn set_font(&mut self, font: &FontSpec, size: f64);
    fn set_text_matrix(&mut self, matrix: Affine);
    fn set_text_rendering_mode(&mut self, mode: TextRenderingMode);
    fn show_text(&mut self, text: &str);

    /// Draws a finished fragment, mapped by `placement`.
    fn draw_fragment(&mut self, fragment: Arc<Fragment>, placement: Affine);
    /// Draws an image at its natural size, mapped by `placement`.
    fn draw_image(&mut self, image: &Image, placement: Affine);

    /// Appends every element of `path` to the current path.
    fn append_path(&mut self, path: &BezPath) {
        let mut last = Point::ZERO;
        let mut start = Point::ZERO;
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    self.move_to(p);
                    last = p;
                    start = p;
                }
                PathEl::LineTo(p) => {
                    self.line_to(p);
                    last = p;
                }
                PathEl::QuadTo(p1, p2) => {
                    let cubic = QuadBez::new(last, p1, p2).raise();
                    self.curve_to(cubic.p1, cubic.p2, cubic.p3);
                    last = p2;
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    self.curve_to(p1, p2, p3);
                    last = p3;
                }
                PathEl::ClosePath => {
                    self.close_path();
                    last = start;
                }
            }
        }
    }
}

/// A single recorded drawing operation.
#[derive(Clone, Debug)]
pub enum Command {
    SaveState,
    RestoreState,
    ConcatTransform(Affine),
    MoveTo(Point),
    LineTo(Point),
    CurveTo(Point, Point, Point),
    ClosePath,
    Fill(Fill),
    Stroke,
    FillStroke(Fill),
    Clip(Fill),
    EndPath,
    SetFillPaint(Paint),
    SetStrokePaint(Paint),
    SetLineWidth(f64),
    SetStrokeStyle(Stroke),
    SetFillOpacity(f32),
    SetStrokeOpacity(f32),
    BeginText,
    EndText,
    SetFont(FontSpec, f64),
    SetTextMatrix(Affine),
    SetTextRenderingMode(TextRenderingMode),
    ShowText(String),
    DrawFragment {
        fragment: Arc<Fragment>,
        placement: Affine,
    },
    DrawImage {
        image: Image,
        placement: Affine,
    },
}

impl Command {
    /// Whether the command paints or clips, as opposed to only changing state
    /// or building a path.
    pub fn is_painting(&self) -> bool {
        matches!(
            self,
            Self::Fill(_)
                | Self::Stroke
                | Self::FillStroke(_)
                | Self::ShowText(_)
                | Self::DrawFragment { .. }
                | Self::DrawImage { .. }
        )
    }
}

/// A finished, embeddable block of drawing commands.
///
/// Fragments are produced by container elements and pattern tiles and are
/// drawn into their parent surface with [`Surface::draw_fragment`].
#[derive(Clone, Debug)]
pub struct Fragment {
    /// The region the content is clipped to, in the fragment's own space.
    pub bounds: Rect,
    /// The recorded content.
    pub commands: Vec<Command>,
}

impl Fragment {
    /// Whether nothing was drawn into the fragment.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Replays the recorded commands onto another surface.
    pub fn replay(&self, target: &mut dyn Surface) {
        replay(&self.commands, target);
    }
}

/// A [`Surface`] that records every call.
///
/// This is the surface the renderer draws into; hosts either replay the
/// commands onto their own surface or translate them directly.
#[derive(Clone, Debug, Default)]
pub struct Canvas {
    commands: Vec<Command>,
    depth: usize,
}
static_assertions::assert_impl_all!(Canvas: Send, Sync);

impl Canvas {
    /// Creates an empty canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// The commands recorded so far.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The number of unmatched [`Surface::save_state`] calls.
    pub fn state_depth(&self) -> usize {
        self.depth
    }

    /// The transform left in effect by the commands recorded since `start`,
    /// relative to the transform at that point.
    ///
    /// Transforms undone by a matching restore do not count.
    pub fn transform_since(&self, start: usize) -> Affine {
        let mut saved = Vec::new();
        let mut current = Affine::IDENTITY;
        for command in &self.commands[start..] {
            match command {
                Command::SaveState => saved.push(current),
                Command::RestoreState => current = saved.pop().unwrap_or(Affine::IDENTITY),
                Command::ConcatTransform(transform) => current = current * *transform,
                _ => {}
            }
        }
        current
    }

    /// Finishes recording, producing a fragment clipped to `bounds`.
    pub fn into_fragment(self, bounds: Rect) -> Fragment {
        debug_assert_eq!(self.depth, 0, "unbalanced save/restore in fragment");
        Fragment {
            bounds,
            commands: self.commands,
        }
    }

    /// Takes the recorded commands, leaving the canvas empty.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    fn push(&mut self, command: Command) {
        self.commands.push(command);
    }
}

impl Surface for Canvas {
    fn save_state(&mut self) {
        self.depth += 1;
        self.push(Command::SaveState);
    }

    fn restore_state(&mut self) {
        assert!(self.depth > 0, "restore_state without a matching save_state");
        self.depth -= 1;
        self.push(Command::RestoreState);
    }

    fn concat_transform(&mut self, transform: Affine) {
        self.push(Command::ConcatTransform(transform));
    }

    fn move_to(&mut self, p: Point) {
        self.push(Command::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.push(Command::LineTo(p));
    }

    fn curve_to(&mut self, p1: Point, p2: Point, p3: Point) {
        self.push(Command::CurveTo(p1, p2, p3));
    }

    fn close_path(&mut self) {
        self.push(Command::ClosePath);
    }

    fn fill(&mut self, rule: Fill) {
        self.push(Command::Fill(rule));
    }

    fn stroke(&mut self) {
        self.push(Command::Stroke);
    }

    fn fill_stroke(&mut self, rule: Fill) {
        self.push(Command::FillStroke(rule));
    }

    fn clip(&mut self, rule: Fill) {
        self.push(Command::Clip(rule));
    }

    fn end_path(&mut self) {
        self.push(Command::EndPath);
    }

    fn set_fill_paint(&mut self, paint: &Paint) {
        self.push(Command::SetFillPaint(paint.clone()));
    }

    fn set_stroke_paint(&mut self, paint: &Paint) {
        self.push(Command::SetStrokePaint(paint.clone()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(Command::SetLineWidth(width));
    }

    fn set_stroke_style(&mut self, style: &Stroke) {
        self.push(Command::SetStrokeStyle(style.clone()));
    }

    fn set_fill_opacity(&mut self, opacity: f32) {
        self.push(Command::SetFillOpacity(opacity));
    }

    fn set_stroke_opacity(&mut self, opacity: f32) {
        self.push(Command::SetStrokeOpacity(opacity));
    }

    fn begin_text(&mut self) {
        self.push(Command::BeginText);
    }

    fn end_text(&mut self) {
        self.push(Command::EndText);
    }

    fn set_font(&mut self, font: &FontSpec, size: f64) {
        self.push(Command::SetFont(font.clone(), size));
    }

    fn set_text_matrix(&mut self, matrix: Affine) {
        self.push(Command::SetTextMatrix(matrix));
    }

    fn set_text_rendering_mode(&mut self, mode: TextRenderingMode) {
        self.push(Command::SetTextRenderingMode(mode));
    }

    fn show_text(&mut self, text: &str) {
        self.push(Command::ShowText(text.to_owned()));
    }

    fn draw_fragment(&mut self, fragment: Arc<Fragment>, placement: Affine) {
        self.push(Command::DrawFragment {
            fragment,
            placement,
        });
    }

    fn draw_image(&mut self, image: &Image, placement: Affine) {
        self.push(Command::DrawImage {
            image: image.clone(),
            placement,
        });
    }
}

/// Replays recorded commands onto `target`.
pub fn replay(commands: &[Command], target: &mut dyn Surface) {
    for command in commands {
        match command {
            Command::SaveState => target.save_state(),
            Command::RestoreState => target.restore_state(),
            Command::ConcatTransform(t) => target.concat_transform(*t),
            Command::MoveTo(p) => target.move_to(*p),
            Command::LineTo(p) => target.line_to(*p),
            Command::CurveTo(p1, p2, p3) => target.curve_to(*p1, *p2, *p3),
            Command::ClosePath => target.close_path(),
            Command::Fill(rule) => target.fill(*rule),
            Command::Stroke => target.stroke(),
            Command::FillStroke(rule) => target.fill_stroke(*rule),
            Command::Clip(rule) => target.clip(*rule),
            Command::EndPath => target.end_path(),
            Command::SetFillPaint(paint) => target.set_fill_paint(paint),
            Command::SetStrokePaint(paint) => target.set_stroke_paint(paint),
            Command::SetLineWidth(width) => target.set_line_width(*width),
            Command::SetStrokeStyle(style) => target.set_stroke_style(style),
            Command::SetFillOpacity(opacity) => target.set_fill_opacity(*opacity),
            Command::SetStrokeOpacity(opacity) => target.set_stroke_opacity(*opacity),
            Command::BeginText => target.begin_text(),
            Command::EndText => target.end_text(),
            Command::SetFont(font, size) => target.set_font(font, *size),
            Command::SetTextMatrix(m) => target.set_text_matrix(*m),
            Command::SetTextRenderingMode(mode) => target.set_text_rendering_mode(*mode),
            Command::ShowText(text) => target.show_text(text),
            Command::DrawFragment {
                fragment,
                placement,
            } => target.draw_fragment(fragment.clone(), *placement),
            Command::DrawImage { image, placement } => target.draw_image(image, *placement),
        }
    }
}
