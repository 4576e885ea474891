// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Graphics state for text runs, applied and restored as diffs.

use crate::paint::Paint;
use crate::surface::{Surface, TextRenderingMode};
use crate::text::FontSpec;

/// The parts of the graphics state a text run changes.
#[derive(Clone, Debug, PartialEq)]
pub struct TextGraphicsState {
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub line_width: f64,
    pub font: Option<(FontSpec, f64)>,
    pub mode: TextRenderingMode,
    pub fill_opacity: f32,
    pub stroke_opacity: f32,
}

impl Default for TextGraphicsState {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            line_width: 1.0,
            font: None,
            mode: TextRenderingMode::Fill,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
        }
    }
}

impl TextGraphicsState {
    /// Emits the operations that turn `previous` into `self`.
    ///
    /// Unset paints and fonts in `self` leave the surface untouched.
    pub fn apply_over(&self, previous: &Self, surface: &mut dyn Surface) {
        if self.fill != previous.fill {
            if let Some(fill) = &self.fill {
                surface.set_fill_paint(fill);
            }
        }
        if self.stroke != previous.stroke {
            if let Some(stroke) = &self.stroke {
                surface.set_stroke_paint(stroke);
            }
        }
        if self.line_width != previous.line_width {
            surface.set_line_width(self.line_width);
        }
        if self.font != previous.font {
            if let Some((font, size)) = &self.font {
                surface.set_font(font, *size);
            }
        }
        if self.mode != previous.mode {
            surface.set_text_rendering_mode(self.mode);
        }
        if self.fill_opacity != previous.fill_opacity {
            surface.set_fill_opacity(self.fill_opacity);
        }
        if self.stroke_opacity != previous.stroke_opacity {
            surface.set_stroke_opacity(self.stroke_opacity);
        }
    }
}

/// The rendering mode for a combination of fill and stroke.
pub(crate) fn rendering_mode(fill: bool, stroke: bool) -> TextRenderingMode {
    match (fill, stroke) {
        (true, true) => TextRenderingMode::FillStroke,
        (true, false) => TextRenderingMode::Fill,
        (false, true) => TextRenderingMode::Stroke,
        (false, false) => TextRenderingMode::Invisible,
    }
}
