// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion of attribute lengths into absolute target units.

use std::str::FromStr;

use peniko::kurbo::Rect;
use svgtypes::{AspectRatio, LengthUnit, ViewBox};

use crate::{Error, Result};

const PX_PER_INCH: f64 = 96.0;
const PX_PER_PT: f64 = PX_PER_INCH / 72.0;
const PX_PER_PC: f64 = PX_PER_INCH / 6.0;
const PX_PER_CM: f64 = PX_PER_INCH / 2.54;
const PX_PER_MM: f64 = PX_PER_CM / 10.0;

/// The unit a [`Length`] was written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    /// A bare number, interpreted as CSS pixels.
    None,
    Px,
    Pt,
    Pc,
    In,
    Cm,
    Mm,
    /// Relative to the current font size.
    Em,
    /// Half of the current font size.
    Ex,
    /// Relative to the root font size.
    Rem,
    Percent,
}

/// A number together with its unit, as written in an attribute.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Length {
    pub number: f64,
    pub unit: Unit,
}

impl Length {
    /// A length of zero user units.
    pub const ZERO: Self = Self::new(0.0, Unit::None);

    /// Creates a new length.
    pub const fn new(number: f64, unit: Unit) -> Self {
        Self { number, unit }
    }

    /// Creates a percentage.
    pub const fn percent(number: f64) -> Self {
        Self::new(number, Unit::Percent)
    }
}

impl FromStr for Length {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        // `rem` postdates SVG 1.1 and is not known to the micro-syntax parser.
        if let Some(number) = value.strip_suffix("rem") {
            return number
                .trim()
                .parse()
                .map(|n| Self::new(n, Unit::Rem))
                .map_err(|_| Error::invalid("length", value));
        }
        let length = svgtypes::Length::from_str(value)?;
        #[allow(unreachable_patterns)]
        let unit = match length.unit {
            LengthUnit::None => Unit::None,
            LengthUnit::Px => Unit::Px,
            LengthUnit::Pt => Unit::Pt,
            LengthUnit::Pc => Unit::Pc,
            LengthUnit::In => Unit::In,
            LengthUnit::Cm => Unit::Cm,
            LengthUnit::Mm => Unit::Mm,
            LengthUnit::Em => Unit::Em,
            LengthUnit::Ex => Unit::Ex,
            LengthUnit::Percent => Unit::Percent,
            _ => return Err(Error::invalid("length", value)),
        };
        Ok(Self::new(length.number, unit))
    }
}

/// Which side of the viewport a percentage refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
    /// The normalized diagonal, `sqrt((w² + h²) / 2)`, used for radii and
    /// stroke widths.
    Diagonal,
}

/// Everything a length needs to become an absolute value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitContext {
    /// The viewport percentages resolve against.
    pub viewport: Rect,
    /// The current font size in target units.
    pub font_size: f64,
    /// The root font size in target units.
    pub root_font_size: f64,
    /// Target units per CSS pixel.
    pub unit_scale: f64,
}

impl UnitContext {
    /// Converts a length into target units.
    pub fn to_user(&self, length: Length, axis: Axis) -> f64 {
        let Length { number: n, unit } = length;
        let px = |factor: f64| n * factor * self.unit_scale;
        match unit {
            Unit::None | Unit::Px => px(1.0),
            Unit::Pt => px(PX_PER_PT),
            Unit::Pc => px(PX_PER_PC),
            Unit::In => px(PX_PER_INCH),
            Unit::Cm => px(PX_PER_CM),
            Unit::Mm => px(PX_PER_MM),
            Unit::Em => n * self.font_size,
            Unit::Ex => n * self.font_size / 2.0,
            Unit::Rem => n * self.root_font_size,
            Unit::Percent => n / 100.0 * self.reference(axis),
        }
    }

    /// Parses and converts a raw attribute value.
    pub fn resolve(&self, value: &str, axis: Axis) -> Result<f64> {
        let length = value.parse()?;
        Ok(self.to_user(length, axis))
    }

    /// Parses and converts a list of lengths such as `x="10 20% 3em"`.
    pub fn resolve_list(&self, value: &str, axis: Axis) -> Result<Vec<f64>> {
        split_list(value)
            .map(|item| self.resolve(item, axis))
            .collect()
    }

    /// Resolves a font size, where percentages and `em` are relative to the
    /// inherited font size.
    pub fn resolve_font_size(&self, value: &str) -> Result<f64> {
        let value = value.trim();
        let size = match value {
            "xx-small" => 9.0 * self.unit_scale,
            "x-small" => 10.0 * self.unit_scale,
            "small" => 13.0 * self.unit_scale,
            "medium" => 16.0 * self.unit_scale,
            "large" => 18.0 * self.unit_scale,
            "x-large" => 24.0 * self.unit_scale,
            "xx-large" => 32.0 * self.unit_scale,
            "smaller" => self.font_size / 1.2,
            "larger" => self.font_size * 1.2,
            _ => {
                let length: Length = value.parse()?;
                match length.unit {
                    Unit::Percent => length.number / 100.0 * self.font_size,
                    _ => self.to_user(length, Axis::Vertical),
                }
            }
        };
        Ok(size)
    }

    /// Parses a `viewBox` and converts it into target units, the same way
    /// the lengths of the content it maps are converted.
    pub fn resolve_view_box(&self, value: &str) -> Result<Rect> {
        parse_view_box(value).map(|view_box| view_box.scale_from_origin(self.unit_scale))
    }

    fn reference(&self, axis: Axis) -> f64 {
        let w = self.viewport.width();
        let h = self.viewport.height();
        match axis {
            Axis::Horizontal => w,
            Axis::Vertical => h,
            Axis::Diagonal => ((w * w + h * h) / 2.0).sqrt(),
        }
    }
}

/// Reads a coordinate given in object bounding box units.
///
/// Percentages become fractions and plain numbers are taken as fractions
/// already; any other unit is rejected.
pub fn bbox_fraction(value: &str) -> Result<f64> {
    let length: Length = value.parse()?;
    match length.unit {
        Unit::None => Ok(length.number),
        Unit::Percent => Ok(length.number / 100.0),
        _ => Err(Error::invalid("bounding box coordinate", value)),
    }
}

/// Parses a plain number, such as an opacity or miter limit.
pub fn parse_number(value: &str) -> Result<f64> {
    let value = value.trim();
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| Error::invalid("number", value))
}

/// Parses an opacity, which may be a number or a percentage, clamped to
/// `[0, 1]`.
pub fn parse_opacity(value: &str) -> Result<f32> {
    let length: Length = value.parse()?;
    let opacity = match length.unit {
        Unit::None => length.number,
        Unit::Percent => length.number / 100.0,
        _ => return Err(Error::invalid("opacity", value)),
    };
    Ok(opacity.clamp(0.0, 1.0) as f32)
}

/// Parses a whitespace and/or comma separated list of numbers.
pub fn parse_number_list(value: &str) -> Result<Vec<f64>> {
    svgtypes::NumberListParser::from(value)
        .map(|n| n.map_err(Error::from))
        .collect()
}

/// Parses a `viewBox`, rejecting boxes without a positive area.
pub fn parse_view_box(value: &str) -> Result<Rect> {
    let vb = ViewBox::from_str(value).map_err(|_| Error::invalid("viewBox", value))?;
    if vb.w <= 0.0 || vb.h <= 0.0 {
        return Err(Error::invalid("viewBox", value));
    }
    Ok(Rect::new(vb.x, vb.y, vb.x + vb.w, vb.y + vb.h))
}

/// Parses `preserveAspectRatio`, defaulting to `xMidYMid meet`.
pub fn parse_aspect_ratio(value: Option<&str>) -> AspectRatio {
    value
        .and_then(|v| match AspectRatio::from_str(v) {
            Ok(aspect) => Some(aspect),
            Err(e) => {
                log::warn!("Invalid preserveAspectRatio {v:?}: {e}. Using the default.");
                None
            }
        })
        .unwrap_or_default()
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|item| !item.is_empty())
}
