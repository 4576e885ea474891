// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The interface to the paragraph layout service.

use peniko::kurbo::{Affine, Point};

use crate::surface::Surface;

/// The font a run is set in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontSpec {
    /// The `font-family` list, as written.
    pub family: String,
    /// CSS weight, 100 to 900.
    pub weight: u16,
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "serif".to_owned(),
            weight: 400,
            italic: false,
        }
    }
}

/// Lines drawn along a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextDecoration {
    pub underline: bool,
    pub overline: bool,
    pub line_through: bool,
}

impl TextDecoration {
    /// Parses a `text-decoration` value such as `underline line-through`.
    pub fn parse(value: &str) -> Self {
        let mut decoration = Self::default();
        for word in value.split_ascii_whitespace() {
            match word {
                "underline" => decoration.underline = true,
                "overline" => decoration.overline = true,
                "line-through" => decoration.line_through = true,
                "none" => {}
                other => log::debug!("Ignoring text-decoration {other:?}"),
            }
        }
        decoration
    }

    pub fn is_none(&self) -> bool {
        *self == Self::default()
    }
}

/// A styled run handed to the layout service.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub font: &'a FontSpec,
    /// Font size in target units.
    pub font_size: f64,
    pub decoration: TextDecoration,
}

/// The geometry a laid out run occupies.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineMetrics {
    /// Distance from the baseline to the top of the line.
    pub ascent: f64,
    /// Distance from the baseline to the bottom of the line.
    pub descent: f64,
    /// Horizontal advance of the whole run.
    pub width: f64,
    /// Line height.
    pub height: f64,
}

/// The glyph transform applied when drawing a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMatrix {
    pub horizontal_scale: f64,
    /// Horizontal shear for synthesized oblique text.
    pub skew: f64,
    /// `-1` when glyphs have to be flipped to appear upright.
    pub vertical_scale: f64,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            horizontal_scale: 1.0,
            skew: 0.0,
            vertical_scale: 1.0,
        }
    }
}

impl TextMatrix {
    /// The full text matrix for a run whose baseline starts at `origin`.
    pub fn at(&self, origin: Point) -> Affine {
        Affine::new([
            self.horizontal_scale,
            0.0,
            self.skew,
            self.vertical_scale,
            origin.x,
            origin.y,
        ])
    }
}

/// Measures and draws text runs.
///
/// Shaping, line breaking and font selection live behind this trait.
pub trait ParagraphLayout {
    /// Measures `run` as a single line.
    fn layout(&self, run: &TextRun<'_>) -> LineMetrics;

    /// Draws `run` with its baseline starting at `origin`.
    ///
    /// Called between [`Surface::begin_text`] and [`Surface::end_text`], with
    /// font, paints and rendering mode already set.
    fn draw(&self, run: &TextRun<'_>, surface: &mut dyn Surface, origin: Point, matrix: TextMatrix);
}

/// A layout service where every character has the same advance.
///
/// Useful for tests and as a fallback when no font machinery is available.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedPitchLayout {
    /// Advance of each character, as a fraction of the font size.
    pub advance: f64,
    /// Ascent, as a fraction of the font size.
    pub ascent: f64,
    /// Descent, as a fraction of the font size.
    pub descent: f64,
}

impl Default for FixedPitchLayout {
    fn default() -> Self {
        Self {
            advance: 0.5,
            ascent: 0.8,
            descent: 0.2,
        }
    }
}

impl ParagraphLayout for FixedPitchLayout {
    fn layout(&self, run: &TextRun<'_>) -> LineMetrics {
        let size = run.font_size;
        LineMetrics {
            ascent: self.ascent * size,
            descent: self.descent * size,
            width: run.text.chars().count() as f64 * self.advance * size,
            height: (self.ascent + self.descent) * size,
        }
    }

    fn draw(&self, run: &TextRun<'_>, surface: &mut dyn Surface, origin: Point, matrix: TextMatrix) {
        surface.set_text_matrix(matrix.at(origin));
        surface.show_text(run.text);
    }
}

#[cfg(test)]
mod tests {
    use super::{FixedPitchLayout, FontSpec, ParagraphLayout, TextDecoration, TextMatrix, TextRun};
    use peniko::kurbo::Point;

    #[test]
    fn fixed_pitch_width() {
        let font = FontSpec::default();
        let run = TextRun {
            text: "abcd",
            font: &font,
            font_size: 10.0,
            decoration: TextDecoration::default(),
        };
        let metrics = FixedPitchLayout::default().layout(&run);
        assert_eq!(metrics.width, 20.0);
        assert_eq!(metrics.ascent, 8.0);
    }

    #[test]
    fn decorations() {
        let decoration = TextDecoration::parse("underline  line-through");
        assert!(decoration.underline && decoration.line_through && !decoration.overline);
        assert!(TextDecoration::parse("none").is_none());
    }

    #[test]
    fn flipped_matrix() {
        let matrix = TextMatrix {
            vertical_scale: -1.0,
            ..TextMatrix::default()
        };
        let m = matrix.at(Point::new(3.0, 4.0));
        assert_eq!(m * Point::new(0.0, 1.0), Point::new(3.0, 3.0));
    }
}
