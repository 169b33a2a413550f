//! glyphspace: glyph outlines → whitespace feature vectors.
//!
//! Builds training data for kerning models. Each glyph outline is
//! flattened into polygons, probed with horizontal rays from both sides,
//! and summarized as a profile of normalized whitespace distances. Every
//! glyph pair then yields one row: the pair's normalized spacing followed
//! by the averaged profiles facing each other across the gap. Rows are
//! streamed to a compact fixed-point binary dataset.
//!
//! # Example
//!
//! ```no_run
//! use glyphspace::{ExtractionConfig, FontFeatureExtractor, GlyphCache, StaticFont};
//!
//! let font: StaticFont = load_my_font();
//! let mut cache = GlyphCache::new();
//! let mut extractor = FontFeatureExtractor::new(&font, &mut cache, ExtractionConfig::default())?;
//! let row = extractor.pair_features('A', 'V')?;
//! println!("spacing {:.3}, {} profile values", row.spacing, row.values.len());
//! extractor.write_dataset("pairs.bin")?;
//! # fn load_my_font() -> StaticFont { unimplemented!() }
//! # Ok::<(), glyphspace::Error>(())
//! ```

#![forbid(unsafe_code)]

mod config;

pub mod cache;
pub mod codec;
pub mod contour;
pub mod error;
pub mod extract;
pub mod features;
pub mod flatten;
pub mod font;
pub mod geom;
pub mod pairs;
pub mod raycast;
pub mod shape;
pub mod simplify;

#[cfg(feature = "ufo")]
pub mod ufo;

// Re-export kurbo so downstream users get the same version used for
// outlines (kurbo::BezPath) and contours (Vec<kurbo::Point>).
pub use kurbo;

pub use cache::{GlyphCache, GlyphRef};
pub use codec::{read_dataset, Dataset, DatasetHeader, FeatureWriter};
pub use config::{ExtractionConfig, Normalization, SpaceBasis, VerticalBounds};
pub use error::{Error, Result};
pub use extract::{DatasetSummary, FontFeatureExtractor};
pub use features::{FeatureProfile, FeatureVector, RaySampling};
pub use font::{FontSource, GlyphId, GlyphOutline, StaticFont};
pub use shape::{GlyphShape, ShapeParams};

#[cfg(feature = "ufo")]
pub use ufo::UfoFont;
