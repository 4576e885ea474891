// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute and style storage for renderer nodes.

use std::collections::HashMap;

/// Names of the attributes and properties the renderer understands.
///
/// Keys are stored lower case, so camel-cased SVG names appear folded here.
pub mod names {
    #![allow(missing_docs)]

    pub const ID: &str = "id";
    pub const TRANSFORM: &str = "transform";
    pub const DISPLAY: &str = "display";
    pub const VISIBILITY: &str = "visibility";
    pub const OVERFLOW: &str = "overflow";
    pub const COLOR: &str = "color";

    pub const FILL: &str = "fill";
    pub const FILL_RULE: &str = "fill-rule";
    pub const FILL_OPACITY: &str = "fill-opacity";
    pub const STROKE: &str = "stroke";
    pub const STROKE_WIDTH: &str = "stroke-width";
    pub const STROKE_OPACITY: &str = "stroke-opacity";
    pub const STROKE_LINECAP: &str = "stroke-linecap";
    pub const STROKE_LINEJOIN: &str = "stroke-linejoin";
    pub const STROKE_MITERLIMIT: &str = "stroke-miterlimit";
    pub const STROKE_DASHARRAY: &str = "stroke-dasharray";
    pub const STROKE_DASHOFFSET: &str = "stroke-dashoffset";
    pub const OPACITY: &str = "opacity";

    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const DX: &str = "dx";
    pub const DY: &str = "dy";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const RX: &str = "rx";
    pub const RY: &str = "ry";
    pub const CX: &str = "cx";
    pub const CY: &str = "cy";
    pub const R: &str = "r";
    pub const FX: &str = "fx";
    pub const FY: &str = "fy";
    pub const FR: &str = "fr";
    pub const X1: &str = "x1";
    pub const Y1: &str = "y1";
    pub const X2: &str = "x2";
    pub const Y2: &str = "y2";
    pub const POINTS: &str = "points";
    pub const D: &str = "d";

    pub const HREF: &str = "href";
    pub const XLINK_HREF: &str = "xlink:href";
    pub const VIEW_BOX: &str = "viewbox";
    pub const PRESERVE_ASPECT_RATIO: &str = "preserveaspectratio";

    pub const OFFSET: &str = "offset";
    pub const STOP_COLOR: &str = "stop-color";
    pub const STOP_OPACITY: &str = "stop-opacity";
    pub const GRADIENT_UNITS: &str = "gradientunits";
    pub const GRADIENT_TRANSFORM: &str = "gradienttransform";
    pub const SPREAD_METHOD: &str = "spreadmethod";
    pub const PATTERN_UNITS: &str = "patternunits";
    pub const PATTERN_CONTENT_UNITS: &str = "patterncontentunits";
    pub const PATTERN_TRANSFORM: &str = "patterntransform";

    pub const CLIP_PATH: &str = "clip-path";
    pub const CLIP_RULE: &str = "clip-rule";
    pub const CLIP_PATH_UNITS: &str = "clippathunits";

    pub const MARKER_START: &str = "marker-start";
    pub const MARKER_MID: &str = "marker-mid";
    pub const MARKER_END: &str = "marker-end";
    pub const MARKER_WIDTH: &str = "markerwidth";
    pub const MARKER_HEIGHT: &str = "markerheight";
    pub const MARKER_UNITS: &str = "markerunits";
    pub const REF_X: &str = "refx";
    pub const REF_Y: &str = "refy";
    pub const ORIENT: &str = "orient";

    pub const FONT_FAMILY: &str = "font-family";
    pub const FONT_SIZE: &str = "font-size";
    pub const FONT_WEIGHT: &str = "font-weight";
    pub const FONT_STYLE: &str = "font-style";
    pub const TEXT_ANCHOR: &str = "text-anchor";
    pub const TEXT_DECORATION: &str = "text-decoration";
}

/// Properties that flow from a use-site into a reused template.
const INHERITABLE: &[&str] = &[
    names::COLOR,
    names::VISIBILITY,
    names::FILL,
    names::FILL_RULE,
    names::FILL_OPACITY,
    names::STROKE,
    names::STROKE_WIDTH,
    names::STROKE_OPACITY,
    names::STROKE_LINECAP,
    names::STROKE_LINEJOIN,
    names::STROKE_MITERLIMIT,
    names::STROKE_DASHARRAY,
    names::STROKE_DASHOFFSET,
    names::CLIP_RULE,
    names::MARKER_START,
    names::MARKER_MID,
    names::MARKER_END,
    names::FONT_FAMILY,
    names::FONT_SIZE,
    names::FONT_WEIGHT,
    names::FONT_STYLE,
    names::TEXT_ANCHOR,
    names::TEXT_DECORATION,
];

/// The resolved attribute and style map of a single node.
///
/// Keys are case-insensitive: they are folded to lower case once, on the way
/// in, and lookups fold the requested name the same way.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    map: HashMap<String, String>,
}

impl Attributes {
    /// Creates an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, replacing any previous value.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.map.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Returns the raw value of an attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            self.map.get(&name.to_ascii_lowercase())
        } else {
            self.map.get(name)
        }
        .map(String::as_str)
    }

    /// Returns the trimmed value of an attribute, ignoring empty values.
    pub fn get_trimmed(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Whether the attribute is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.map.remove(&name.to_ascii_lowercase())
    }

    /// The number of attributes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The element id, if any.
    pub fn id(&self) -> Option<&str> {
        self.get_trimmed(names::ID)
    }

    /// The reference target of `href`, falling back to `xlink:href`.
    pub fn href(&self) -> Option<&str> {
        self.get_trimmed(names::HREF)
            .or_else(|| self.get_trimmed(names::XLINK_HREF))
    }

    /// Copies inheritable properties from `parent` that are not set here.
    ///
    /// Returns `true` if anything was copied.
    pub fn inherit_from(&mut self, parent: &Self) -> bool {
        let mut changed = false;
        for name in INHERITABLE {
            if self.contains(name) {
                continue;
            }
            if let Some(value) = parent.get(name) {
                if value.trim() != "inherit" {
                    self.map.insert((*name).to_owned(), value.to_owned());
                    changed = true;
                }
            }
        }
        changed
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.insert(name.as_ref(), value);
        }
        attributes
    }
}

/// Extracts the id from a local reference such as `#grad` or `url(#grad)`.
///
/// Returns `None` for anything that is not a local reference.
pub fn reference_id(value: &str) -> Option<&str> {
    let mut value = value.trim();
    if let Some(inner) = value
        .strip_prefix("url(")
        .and_then(|v| v.strip_suffix(')'))
    {
        value = inner.trim().trim_matches(|c| c == '"' || c == '\'');
    }
    value
        .strip_prefix('#')
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{names, reference_id, Attributes};

    #[test]
    fn lookup_is_case_insensitive() {
        let attributes: Attributes = [("viewBox", "0 0 10 10"), ("Fill", "red")]
            .into_iter()
            .collect();
        assert_eq!(attributes.get(names::VIEW_BOX), Some("0 0 10 10"));
        assert_eq!(attributes.get("viewBox"), Some("0 0 10 10"));
        assert_eq!(attributes.get("FILL"), Some("red"));
    }

    #[test]
    fn inherit_keeps_own_values() {
        let parent: Attributes = [("fill", "red"), ("stroke", "blue"), ("x", "10")]
            .into_iter()
            .collect();
        let mut child: Attributes = [("fill", "green")].into_iter().collect();
        assert!(child.inherit_from(&parent));
        assert_eq!(child.get("fill"), Some("green"));
        assert_eq!(child.get("stroke"), Some("blue"));
        // Geometry is never inherited.
        assert_eq!(child.get("x"), None);
    }

    #[test]
    fn references() {
        assert_eq!(reference_id("#a"), Some("a"));
        assert_eq!(reference_id(" url(#grad) "), Some("grad"));
        assert_eq!(reference_id("url('#p')"), Some("p"));
        assert_eq!(reference_id("url(#)"), None);
        assert_eq!(reference_id("other.svg#a"), None);
    }
}
