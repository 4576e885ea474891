// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration for a render pass.

use peniko::kurbo::Rect;

use crate::image::ImageResolver;
use crate::text::ParagraphLayout;

/// Size of the SVG default viewport, in CSS pixels.
const DEFAULT_VIEWPORT_PX: (f64, f64) = (300.0, 150.0);
/// Initial font size, in CSS pixels.
const DEFAULT_FONT_SIZE_PX: f64 = 16.0;

/// Options controlling how a renderer tree is turned into drawing commands.
///
/// A fresh set of options is consumed by every call to
/// [`render_tree`](crate::render_tree); nothing here outlives the pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    /// Multiplier converting CSS pixels (and unitless user units) into the
    /// native unit of the target surface.
    ///
    /// The default of `0.75` converts pixels to points. The same constant is
    /// used to keep object bounding box coordinates in the target unit range
    /// while they are concatenated with other transforms.
    pub unit_scale: f64,
    /// The viewport used when the root element does not size itself.
    ///
    /// When `None`, the SVG default of 300×150 pixels is used.
    pub viewport: Option<Rect>,
    /// The font size used before any element sets one, in target units.
    ///
    /// When `None`, 16 pixels are used.
    pub font_size: Option<f64>,
    /// The font size `rem` lengths resolve against, in target units.
    ///
    /// When `None`, this matches the initial font size.
    pub root_font_size: Option<f64>,
    /// Whether the target surface has its y axis pointing up.
    ///
    /// When set, the root flips the vertical axis and text and images are
    /// counter-flipped so they remain upright.
    pub y_up: bool,
    /// Accuracy used when converting circles and ellipses to curves.
    pub tolerance: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            unit_scale: 0.75,
            viewport: None,
            font_size: None,
            root_font_size: None,
            y_up: false,
            tolerance: 0.1,
        }
    }
}

impl RenderOptions {
    /// Sets the pixel-to-target-unit multiplier.
    pub fn with_unit_scale(mut self, unit_scale: f64) -> Self {
        self.unit_scale = unit_scale;
        self
    }

    /// Sets the base viewport.
    pub fn with_viewport(mut self, viewport: Rect) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Sets the initial font size, in target units.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Sets the root font size, in target units.
    pub fn with_root_font_size(mut self, root_font_size: f64) -> Self {
        self.root_font_size = Some(root_font_size);
        self
    }

    /// Sets whether the target surface is y-up.
    pub fn with_y_up(mut self, y_up: bool) -> Self {
        self.y_up = y_up;
        self
    }

    /// The base viewport in target units.
    pub fn base_viewport(&self) -> Rect {
        self.viewport.unwrap_or_else(|| {
            Rect::new(
                0.0,
                0.0,
                DEFAULT_VIEWPORT_PX.0 * self.unit_scale,
                DEFAULT_VIEWPORT_PX.1 * self.unit_scale,
            )
        })
    }

    /// The initial font size in target units.
    pub fn initial_font_size(&self) -> f64 {
        self.font_size
            .unwrap_or(DEFAULT_FONT_SIZE_PX * self.unit_scale)
    }

    /// The root font size in target units.
    pub fn resolved_root_font_size(&self) -> f64 {
        self.root_font_size
            .unwrap_or_else(|| self.initial_font_size())
    }
}

/// External services the renderer calls back into.
///
/// Both are optional: without a layout service text is skipped, and without
/// an image resolver every image is treated as missing.
#[derive(Clone, Copy, Default)]
pub struct Resources<'a> {
    /// Measures and draws text runs.
    pub text_layout: Option<&'a dyn ParagraphLayout>,
    /// Turns `href` values into embeddable images.
    pub images: Option<&'a dyn ImageResolver>,
}

impl<'a> Resources<'a> {
    /// Sets the paragraph layout service.
    pub fn with_text_layout(mut self, layout: &'a dyn ParagraphLayout) -> Self {
        self.text_layout = Some(layout);
        self
    }

    /// Sets the image resolver.
    pub fn with_images(mut self, images: &'a dyn ImageResolver) -> Self {
        self.images = Some(images);
        self
    }
}

impl std::fmt::Debug for Resources<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("text_layout", &self.text_layout.is_some())
            .field("images", &self.images.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::RenderOptions;

    #[test]
    fn defaults_are_scaled_pixels() {
        let options = RenderOptions::default();
        let viewport = options.base_viewport();
        assert_eq!(viewport.width(), 225.0);
        assert_eq!(viewport.height(), 112.5);
        assert_eq!(options.initial_font_size(), 12.0);
        assert_eq!(options.resolved_root_font_size(), 12.0);
    }

    #[test]
    fn root_font_size_is_independent() {
        let options = RenderOptions::default()
            .with_unit_scale(1.0)
            .with_font_size(10.0)
            .with_root_font_size(20.0);
        assert_eq!(options.initial_font_size(), 10.0);
        assert_eq!(options.resolved_root_font_size(), 20.0);
    }
}
