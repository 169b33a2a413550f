use crate::error::Error;
use crate::flatten::FlattenParams;

/// All extraction parameters in one struct.
/// A dataset must be produced with one fixed configuration; mixing
/// normalization modes within a dataset is not detected.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    // -- Shape stage --
    /// Size of the shape coordinate space. Design units are scaled by
    /// `render_size / units_per_em`, with Y flipped (Y grows downward).
    pub render_size: f64,
    /// Scale handed to the curve flattener. Lower = coarser polylines.
    pub flatten_density: f64,
    /// Curve flattening tolerances.
    pub flatten: FlattenParams,
    /// Douglas-Peucker tolerance in shape units. 0 = no simplification.
    pub simplify_tolerance: f64,

    // -- Raycasting --
    /// Number of horizontal rays per side.
    pub ray_count: usize,
    /// Marching step in shape units.
    pub ray_step: f64,
    /// How hit distances are mapped into [0, 1].
    pub normalization: Normalization,
    /// Vertical band sampled by the rays.
    pub vertical_bounds: VerticalBounds,
    /// If true, keep ray segments in each profile (for visualizers).
    pub include_rays: bool,

    // -- Pair features --
    /// Divisor for the spacing column.
    pub space_basis: SpaceBasis,

    // -- Dataset driver --
    /// Compute pair rows on the rayon thread pool.
    pub parallel: bool,
    /// Pairs computed per parallel batch before they are written.
    pub chunk_size: usize,
}

/// Distance normalization mode for profile entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Relative to the glyph's bounding-box width (the ray's max distance).
    MaxDistance,
    /// Relative to the font's em: `distance / (units_per_em * scale)`.
    Em,
}

/// Vertical extent sampled by the rays, in shape coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalBounds {
    /// The font-wide band from the ascender down to the descender.
    AscenderDescender,
    /// A caller-chosen band.
    Explicit { min_y: f64, max_y: f64 },
}

/// Divisor used to normalize pair spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpaceBasis {
    /// The font's units-per-em.
    UnitsPerEm,
    /// A fixed value in design units (e.g. the advance of the space glyph).
    Fixed(f64),
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            render_size: 512.0,
            flatten_density: 0.3,
            flatten: FlattenParams::default(),
            simplify_tolerance: 0.1,
            ray_count: 32,
            ray_step: 1.0,
            normalization: Normalization::Em,
            vertical_bounds: VerticalBounds::AscenderDescender,
            include_rays: false,
            space_basis: SpaceBasis::UnitsPerEm,
            parallel: true,
            chunk_size: 4096,
        }
    }
}

impl ExtractionConfig {
    /// Reject parameter combinations that would make raycasting or
    /// normalization meaningless.
    pub fn validate(&self) -> Result<(), Error> {
        if self.ray_count == 0 {
            return Err(Error::InvalidConfig("ray_count must be at least 1".into()));
        }
        if !(self.ray_step > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "ray_step must be positive, got {}",
                self.ray_step
            )));
        }
        if !(self.render_size > 0.0) || !(self.flatten_density > 0.0) {
            return Err(Error::InvalidConfig(
                "render_size and flatten_density must be positive".into(),
            ));
        }
        // Shapes are cached per parameter set; NaN never compares equal.
        if self.simplify_tolerance.is_nan() {
            return Err(Error::InvalidConfig("simplify_tolerance must be a number".into()));
        }
        if let VerticalBounds::Explicit { min_y, max_y } = self.vertical_bounds {
            if !(min_y < max_y) {
                return Err(Error::InvalidConfig(format!(
                    "vertical bounds must satisfy min_y < max_y, got [{}, {}]",
                    min_y, max_y
                )));
            }
        }
        if let SpaceBasis::Fixed(basis) = self.space_basis {
            if basis == 0.0 {
                return Err(Error::InvalidConfig("space basis must be non-zero".into()));
            }
        }
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be at least 1".into()));
        }
        Ok(())
    }
}
