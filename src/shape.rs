//! Glyph shapes: simplified contours plus the metrics raycasting needs.

use std::fmt;

use kurbo::{Affine, Shape};

use crate::config::ExtractionConfig;
use crate::contour::{self, Contour};
use crate::error::Error;
use crate::features::{compute_features, FeatureProfile, RaySampling};
use crate::flatten::FlattenParams;
use crate::font::{GlyphId, GlyphOutline};
use crate::geom::BoundingBox;
use crate::simplify::simplify;

/// The configuration a shape is built under. Shapes built with different
/// parameters have different contours and must not be mixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    pub render_size: f64,
    pub flatten_density: f64,
    pub flatten: FlattenParams,
    pub simplify_tolerance: f64,
}

impl ShapeParams {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            render_size: config.render_size,
            flatten_density: config.flatten_density,
            flatten: config.flatten,
            simplify_tolerance: config.simplify_tolerance,
        }
    }
}

/// A glyph in shape space: design units scaled by `scale` with Y flipped
/// (Y grows downward, the baseline sits at 0).
#[derive(Debug, Clone)]
pub struct GlyphShape {
    pub glyph_id: GlyphId,
    pub name: String,
    pub contours: Vec<Contour>,
    pub bbox: BoundingBox,
    /// Left sidebearing in design units.
    pub left_bearing: f64,
    /// Right sidebearing in design units.
    pub right_bearing: f64,
    /// Shape units per design unit.
    pub scale: f64,
    pub units_per_em: f64,
    profile: Option<(RaySampling, FeatureProfile)>,
}

impl GlyphShape {
    /// Build a shape from a glyph outline: flip and scale into shape space,
    /// flatten curves, simplify each contour, and derive bounds and
    /// sidebearings.
    pub fn from_outline(
        glyph_id: GlyphId,
        outline: &GlyphOutline,
        units_per_em: f64,
        params: &ShapeParams,
    ) -> Result<Self, Error> {
        let scale = params.render_size / units_per_em;

        // Sidebearings come from the exact outline bounds in design units.
        let design_bounds = outline.path.bounding_box();
        let (left_bearing, right_bearing) = if outline.path.segments().next().is_none() {
            (0.0, outline.advance_width)
        } else {
            (design_bounds.x0, outline.advance_width - design_bounds.x1)
        };

        let mut path = outline.path.clone();
        path.apply_affine(Affine::new([scale, 0.0, 0.0, -scale, 0.0, 0.0]));
        let contours: Vec<Contour> =
            contour::build(path.iter(), params.flatten_density, &params.flatten)?
                .iter()
                .map(|c| simplify(c, params.simplify_tolerance))
                .collect();

        let shape = Self::from_contours(
            glyph_id,
            outline.name.clone(),
            contours,
            left_bearing,
            right_bearing,
            scale,
            units_per_em,
        );
        log::debug!("{} at scale {:.4}", shape, scale);
        Ok(shape)
    }

    /// Assemble a shape from contours already in shape space.
    pub fn from_contours(
        glyph_id: GlyphId,
        name: impl Into<String>,
        contours: Vec<Contour>,
        left_bearing: f64,
        right_bearing: f64,
        scale: f64,
        units_per_em: f64,
    ) -> Self {
        let bbox = BoundingBox::from_contours(&contours);
        Self {
            glyph_id,
            name: name.into(),
            contours,
            bbox,
            left_bearing,
            right_bearing,
            scale,
            units_per_em,
            profile: None,
        }
    }

    /// Left sidebearing in shape units.
    pub fn left_padding(&self) -> f64 {
        self.left_bearing * self.scale
    }

    /// Right sidebearing in shape units.
    pub fn right_padding(&self) -> f64 {
        self.right_bearing * self.scale
    }

    /// Advance width in shape units: paddings plus bounding-box width.
    pub fn width(&self) -> f64 {
        self.left_padding() + self.bbox.width + self.right_padding()
    }

    pub fn vertex_count(&self) -> usize {
        self.contours.iter().map(Vec::len).sum()
    }

    /// The whitespace profile for `sampling`, computed on first use.
    /// A different sampling replaces the memoized profile.
    pub fn features(&mut self, sampling: &RaySampling) -> &FeatureProfile {
        let profile = match self.profile.take() {
            Some((s, profile)) if s == *sampling => profile,
            _ => compute_features(self, sampling),
        };
        &self.profile.insert((*sampling, profile)).1
    }

    /// The memoized profile, if one exists for exactly this sampling.
    pub fn cached_features(&self, sampling: &RaySampling) -> Option<&FeatureProfile> {
        match &self.profile {
            Some((s, profile)) if s == sampling => Some(profile),
            _ => None,
        }
    }
}

impl fmt::Display for GlyphShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GlyphShape({} {}\u{00d7}{} {} polys, {} vertices)",
            self.name,
            self.width().round(),
            self.bbox.height,
            self.contours.len(),
            self.vertex_count(),
        )
    }
}
