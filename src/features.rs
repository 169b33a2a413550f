//! Whitespace profiles and pair feature vectors.
//!
//! A profile samples `ray_count` horizontal rows across a vertical band.
//! For each row one ray marches rightward from the left edge of the
//! glyph's bounding box and one marches leftward from the right edge;
//! the distance each travels before entering the glyph is the whitespace
//! on that side. The march is linear (cost ∝ box width / step per ray),
//! which dominates extraction time.

use kurbo::{Line, Point};

use crate::config::{ExtractionConfig, Normalization};
use crate::raycast::{raycast_x, PolygonHitTester};
use crate::shape::GlyphShape;

/// Where and how rays are cast. Profiles are memoized per sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySampling {
    pub min_y: f64,
    pub max_y: f64,
    pub ray_count: usize,
    pub step: f64,
    pub normalization: Normalization,
    pub include_rays: bool,
}

impl RaySampling {
    pub fn from_config(config: &ExtractionConfig, min_y: f64, max_y: f64) -> Self {
        Self {
            min_y,
            max_y,
            ray_count: config.ray_count,
            step: config.ray_step,
            normalization: config.normalization,
            include_rays: config.include_rays,
        }
    }

    /// Vertical distance between rows: `ceil((max_y - min_y) / ray_count)`,
    /// at least one unit.
    pub fn stride(&self) -> f64 {
        ((self.max_y - self.min_y) / self.ray_count.max(1) as f64)
            .ceil()
            .max(1.0)
    }
}

/// Normalized whitespace on each side of one glyph, one entry per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureProfile {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
    /// Ray segments (start → end), only kept when `include_rays` is set.
    pub left_rays: Vec<Line>,
    pub right_rays: Vec<Line>,
}

/// One training example: normalized spacing plus the averaged profiles
/// facing each other across the gap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    pub spacing: f64,
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// Number of dataset columns: the spacing plus one per ray.
    pub fn width(&self) -> usize {
        self.values.len() + 1
    }

    /// Lay the vector out as a dataset row, spacing first.
    pub fn write_row(&self, row: &mut Vec<f64>) {
        row.clear();
        row.push(self.spacing);
        row.extend_from_slice(&self.values);
    }
}

/// Cast the profile rays for `shape`.
///
/// Rows sit at `min_y + k * stride`. Rows past `max_y` (possible when the
/// band is shorter than `ray_count` units) are not cast and record a full
/// miss. A ray that never hits records the full box width.
pub fn compute_features(shape: &GlyphShape, sampling: &RaySampling) -> FeatureProfile {
    let n = sampling.ray_count;
    let min_x = shape.bbox.min_x;
    let max_x = shape.bbox.max_x;
    let max_distance = max_x - min_x;
    let basis = match sampling.normalization {
        Normalization::MaxDistance => max_distance,
        Normalization::Em => shape.units_per_em * shape.scale,
    };
    let miss = normalize(max_distance, basis);
    let testers: Vec<PolygonHitTester> =
        shape.contours.iter().map(|c| PolygonHitTester::new(c)).collect();

    let mut profile = FeatureProfile {
        left: vec![miss; n],
        right: vec![miss; n],
        ..FeatureProfile::default()
    };
    let stride = sampling.stride();
    for row in 0..n {
        let y = sampling.min_y + row as f64 * stride;
        if y > sampling.max_y {
            break;
        }
        let end_left = raycast_x(&testers, min_x, y, sampling.step, max_distance);
        let end_right = raycast_x(&testers, max_x, y, -sampling.step, max_distance);
        profile.left[row] = normalize(end_left - min_x, basis);
        profile.right[row] = normalize(max_x - end_right, basis);
        if sampling.include_rays {
            profile.left_rays.push(Line::new(Point::new(min_x, y), Point::new(end_left, y)));
            profile.right_rays.push(Line::new(Point::new(max_x, y), Point::new(end_right, y)));
        }
    }
    profile
}

/// Map a distance into [0, 1]. A zero basis only occurs for an empty box,
/// where every ray is a miss.
fn normalize(distance: f64, basis: f64) -> f64 {
    if basis > 0.0 {
        (distance / basis).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// `(left.right_bearing + right.left_bearing + kerning) / space_basis`.
pub fn pair_spacing(left: &GlyphShape, right: &GlyphShape, kerning: f64, space_basis: f64) -> f64 {
    (left.right_bearing + right.left_bearing + kerning) / space_basis
}

/// `out[i] = (left.right[i] + right.left[i]) / 2`.
pub fn combine_profiles(left: &FeatureProfile, right: &FeatureProfile, out: &mut [f64]) {
    for ((o, l), r) in out.iter_mut().zip(&left.right).zip(&right.left) {
        *o = (l + r) / 2.0;
    }
}
