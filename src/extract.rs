//! Pair features and the dataset driver.

use std::borrow::Cow;
use std::io::{Seek, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::cache::{GlyphCache, GlyphRef};
use crate::codec::FeatureWriter;
use crate::config::{ExtractionConfig, SpaceBasis, VerticalBounds};
use crate::error::Error;
use crate::features::{
    combine_profiles, compute_features, pair_spacing, FeatureProfile, FeatureVector, RaySampling,
};
use crate::font::{FontSource, GlyphId};
use crate::pairs::{eligible_glyphs, GlyphPairs};
use crate::shape::{GlyphShape, ShapeParams};

/// What [`FontFeatureExtractor::write_dataset`] produced.
#[derive(Debug, Clone, Copy)]
pub struct DatasetSummary {
    /// Pairs enumerated.
    pub pairs: usize,
    /// Columns per row (`ray_count + 1`), 0 if no row was written.
    pub width: usize,
    /// Rows written.
    pub height: usize,
    pub elapsed: Duration,
}

/// Computes pair feature vectors for one font.
///
/// Glyph shapes and their profiles live in the borrowed [`GlyphCache`]. A
/// cache handed to several extractors (or kept across runs) reuses a shape
/// only when the extractors agree on its [`ShapeParams`].
pub struct FontFeatureExtractor<'a, F: FontSource + ?Sized> {
    font: &'a F,
    cache: &'a mut GlyphCache,
    config: ExtractionConfig,
    shape_params: ShapeParams,
    sampling: RaySampling,
    space_basis: f64,
}

impl<'a, F: FontSource + ?Sized> FontFeatureExtractor<'a, F> {
    pub fn new(font: &'a F, cache: &'a mut GlyphCache, config: ExtractionConfig) -> Result<Self, Error> {
        config.validate()?;
        let units_per_em = font.units_per_em();
        if !(units_per_em > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "font reports {} units per em",
                units_per_em
            )));
        }

        // Shape space is Y-down: the ascender sits above the baseline at a
        // negative y, the descender below it.
        let scale = config.render_size / units_per_em;
        let (min_y, max_y) = match config.vertical_bounds {
            VerticalBounds::AscenderDescender => {
                (-font.ascender() * scale, -font.descender() * scale)
            }
            VerticalBounds::Explicit { min_y, max_y } => (min_y, max_y),
        };
        if !(min_y < max_y) {
            return Err(Error::InvalidConfig(format!(
                "empty vertical band [{}, {}]",
                min_y, max_y
            )));
        }
        let space_basis = match config.space_basis {
            SpaceBasis::UnitsPerEm => units_per_em,
            SpaceBasis::Fixed(basis) => basis,
        };

        Ok(Self {
            font,
            cache,
            sampling: RaySampling::from_config(&config, min_y, max_y),
            shape_params: ShapeParams::from_config(&config),
            config,
            space_basis,
        })
    }

    pub fn sampling(&self) -> &RaySampling {
        &self.sampling
    }

    pub fn space_basis(&self) -> f64 {
        self.space_basis
    }

    /// Resolve a glyph and make sure its profile is computed.
    pub fn glyph<'g>(&mut self, glyph: impl Into<GlyphRef<'g>>) -> Result<&GlyphShape, Error> {
        let id = self.prepare(glyph.into())?;
        self.cache
            .get(self.font.identity(), &self.shape_params, id)
            .ok_or(Error::GlyphOutOfRange(id.0))
    }

    /// Feature vector for `left` followed by `right`.
    pub fn pair_features<'l, 'r>(
        &mut self,
        left: impl Into<GlyphRef<'l>>,
        right: impl Into<GlyphRef<'r>>,
    ) -> Result<FeatureVector, Error> {
        let mut row = Vec::with_capacity(self.sampling.ray_count + 1);
        self.pair_features_into(left, right, &mut row)?;
        Ok(FeatureVector {
            spacing: row[0],
            values: row.split_off(1),
        })
    }

    /// Like [`pair_features`](Self::pair_features), laid out as a dataset
    /// row in a caller-owned buffer.
    pub fn pair_features_into<'l, 'r>(
        &mut self,
        left: impl Into<GlyphRef<'l>>,
        right: impl Into<GlyphRef<'r>>,
        row: &mut Vec<f64>,
    ) -> Result<(), Error> {
        let left = self.prepare(left.into())?;
        let right = self.prepare(right.into())?;
        self.fill_row(left, right, row)
    }

    /// Compute and write one row per pair, in iteration order. Returns the
    /// number of rows written.
    pub fn write_pairs<W, I>(&mut self, pairs: I, writer: &mut FeatureWriter<W>) -> Result<usize, Error>
    where
        W: Write + Seek,
        I: IntoIterator<Item = (GlyphId, GlyphId)>,
        F: Sync,
    {
        if !self.config.parallel {
            let mut row = Vec::with_capacity(self.sampling.ray_count + 1);
            let mut written = 0;
            for (left, right) in pairs {
                self.pair_features_into(left, right, &mut row)?;
                writer.write(&row)?;
                written += 1;
            }
            return Ok(written);
        }

        let mut pairs = pairs.into_iter();
        let mut written = 0;
        loop {
            let chunk: Vec<(GlyphId, GlyphId)> =
                pairs.by_ref().take(self.config.chunk_size).collect();
            if chunk.is_empty() {
                break;
            }

            // Shapes are built serially; profiles and rows are then pure
            // reads of the cache.
            for &(left, right) in &chunk {
                self.cache.resolve(self.font, &self.shape_params, left.into())?;
                self.cache.resolve(self.font, &self.shape_params, right.into())?;
            }
            let sampling = self.sampling;
            if let Some(shapes) = self.cache.shapes_mut(self.font.identity(), &self.shape_params) {
                shapes.par_iter_mut().for_each(|(_, shape)| {
                    shape.features(&sampling);
                });
            }

            let this = &*self;
            let width = this.sampling.ray_count + 1;
            let rows = chunk
                .par_iter()
                .map(|&(left, right)| {
                    let mut row = Vec::with_capacity(width);
                    this.fill_row(left, right, &mut row).map(|()| row)
                })
                .collect::<Result<Vec<_>, Error>>()?;
            for row in &rows {
                writer.write(row)?;
            }
            written += rows.len();
        }
        Ok(written)
    }

    /// Extract every eligible pair of the font into a dataset file.
    pub fn write_dataset(&mut self, path: impl AsRef<Path>) -> Result<DatasetSummary, Error>
    where
        F: Sync,
    {
        let t_start = Instant::now();
        let glyphs = eligible_glyphs(self.font);
        let glyph_count = glyphs.len();
        let pairs = GlyphPairs::new(glyphs);
        let pair_count = pairs.len();
        log::info!(
            "{}: {} of {} glyphs eligible, {} pairs, {} rays per side",
            self.font.identity(),
            glyph_count,
            self.font.glyph_count(),
            pair_count,
            self.sampling.ray_count,
        );

        let mut writer = FeatureWriter::create(path.as_ref())?;
        self.write_pairs(pairs, &mut writer)?;
        let header = writer.end()?;

        let summary = DatasetSummary {
            pairs: pair_count,
            width: header.width as usize,
            height: header.height as usize,
            elapsed: t_start.elapsed(),
        };
        log::info!(
            "wrote {} rows \u{00d7} {} columns to {} in {}ms",
            summary.height,
            summary.width,
            path.as_ref().display(),
            summary.elapsed.as_millis(),
        );
        Ok(summary)
    }

    fn prepare(&mut self, glyph: GlyphRef<'_>) -> Result<GlyphId, Error> {
        let id = self.cache.resolve(self.font, &self.shape_params, glyph)?;
        let shape = self
            .cache
            .get_mut(self.font.identity(), &self.shape_params, id)
            .ok_or(Error::GlyphOutOfRange(id.0))?;
        shape.features(&self.sampling);
        Ok(id)
    }

    fn fill_row(&self, left: GlyphId, right: GlyphId, row: &mut Vec<f64>) -> Result<(), Error> {
        let identity = self.font.identity();
        let params = &self.shape_params;
        let l = self.cache.get(identity, params, left).ok_or(Error::GlyphOutOfRange(left.0))?;
        let r = self.cache.get(identity, params, right).ok_or(Error::GlyphOutOfRange(right.0))?;
        let l_profile = profile(l, &self.sampling);
        let r_profile = profile(r, &self.sampling);

        row.clear();
        row.push(pair_spacing(l, r, self.font.kerning(left, right), self.space_basis));
        row.resize(self.sampling.ray_count + 1, 0.0);
        combine_profiles(&l_profile, &r_profile, &mut row[1..]);
        Ok(())
    }
}

fn profile<'s>(shape: &'s GlyphShape, sampling: &RaySampling) -> Cow<'s, FeatureProfile> {
    match shape.cached_features(sampling) {
        Some(profile) => Cow::Borrowed(profile),
        None => Cow::Owned(compute_features(shape, sampling)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::read_from;
    use crate::config::Normalization;
    use crate::font::testing::{block_font, glyph, rect_path};
    use crate::font::StaticFont;
    use crate::pairs::pair_count;
    use std::io::Cursor;

    #[test]
    fn band_spans_ascender_to_descender() {
        let font = block_font();
        let mut cache = GlyphCache::new();
        let extractor =
            FontFeatureExtractor::new(&font, &mut cache, ExtractionConfig::default()).unwrap();
        let sampling = extractor.sampling();
        assert!((sampling.min_y - -409.6).abs() < 1e-9);
        assert!((sampling.max_y - 102.4).abs() < 1e-9);
        assert_eq!(sampling.ray_count, 32);
        assert_eq!(extractor.space_basis(), 1000.0);
    }

    #[test]
    fn spacing_from_bearings_and_kerning() {
        let mut font = StaticFont::new("Pair Test", 1000.0, 800.0, -200.0);
        // Right sidebearing 50.
        let l = font.add_glyph(glyph("L", 'L', rect_path(60.0, 0.0, 450.0, 700.0), 500.0));
        // Left sidebearing 30.
        let r = font.add_glyph(glyph("R", 'R', rect_path(30.0, 0.0, 400.0, 700.0), 450.0));
        font.set_kerning(l, r, -20.0);

        let mut cache = GlyphCache::new();
        let mut extractor =
            FontFeatureExtractor::new(&font, &mut cache, ExtractionConfig::default()).unwrap();
        let vector = extractor.pair_features('L', 'R').unwrap();
        assert!((vector.spacing - 0.06).abs() < 1e-12);
        assert_eq!(vector.values.len(), 32);
        assert_eq!(vector.width(), 33);

        // No kerning the other way round: RSB(R) 50 + LSB(L) 60.
        let reverse = extractor.pair_features("R", "L").unwrap();
        assert!((reverse.spacing - 0.11).abs() < 1e-12);
    }

    #[test]
    fn values_average_facing_profiles() {
        let font = block_font();
        let mut cache = GlyphCache::new();
        let mut extractor =
            FontFeatureExtractor::new(&font, &mut cache, ExtractionConfig::default()).unwrap();
        let vector = extractor.pair_features('T', 'I').unwrap();
        let t = extractor.glyph('T').unwrap().clone();
        let i = extractor.glyph('I').unwrap().clone();
        let sampling = *extractor.sampling();
        let t_profile = t.cached_features(&sampling).unwrap();
        let i_profile = i.cached_features(&sampling).unwrap();
        for k in 0..sampling.ray_count {
            assert_eq!(vector.values[k], (t_profile.right[k] + i_profile.left[k]) / 2.0);
        }
        // The T bar crosses three rows; the rest are full-width misses.
        let hits = t_profile.right.iter().filter(|&&v| v < 0.01).count();
        assert_eq!(hits, 3);
        assert!(t_profile.right.iter().all(|&v| v < 0.01 || v > 0.4));
    }

    #[test]
    fn explicit_band_and_max_distance_normalization() {
        let font = block_font();
        let mut cache = GlyphCache::new();
        let config = ExtractionConfig {
            vertical_bounds: VerticalBounds::Explicit { min_y: -1000.0, max_y: -900.0 },
            normalization: Normalization::MaxDistance,
            ray_count: 4,
            ..ExtractionConfig::default()
        };
        let mut extractor = FontFeatureExtractor::new(&font, &mut cache, config).unwrap();
        // Every row lies above the glyphs: full misses on both sides.
        let vector = extractor.pair_features('H', 'H').unwrap();
        assert_eq!(vector.values, vec![1.0; 4]);
    }

    #[test]
    fn unknown_glyphs_and_bad_fonts_are_errors() {
        let font = block_font();
        let mut cache = GlyphCache::new();
        let mut extractor =
            FontFeatureExtractor::new(&font, &mut cache, ExtractionConfig::default()).unwrap();
        assert!(matches!(extractor.pair_features('I', 'Z'), Err(Error::UnmappedChar('Z'))));

        let flat = StaticFont::new("Flat", 1000.0, 0.0, 0.0);
        let mut cache = GlyphCache::new();
        assert!(matches!(
            FontFeatureExtractor::new(&flat, &mut cache, ExtractionConfig::default()),
            Err(Error::InvalidConfig(_))
        ));
    }

    fn dataset_bytes(parallel: bool, chunk_size: usize) -> Vec<u8> {
        let mut font = block_font();
        font.set_kerning(GlyphId(0), GlyphId(1), -35.0);
        let config = ExtractionConfig {
            parallel,
            chunk_size,
            ray_count: 8,
            ..ExtractionConfig::default()
        };
        let mut cache = GlyphCache::new();
        let mut extractor = FontFeatureExtractor::new(&font, &mut cache, config).unwrap();
        let mut writer = FeatureWriter::new(Cursor::new(Vec::new())).unwrap();
        let pairs = GlyphPairs::new(eligible_glyphs(&font));
        let written = extractor.write_pairs(pairs, &mut writer).unwrap();
        assert_eq!(written, pair_count(3));
        writer.finish().unwrap().1.into_inner()
    }

    #[test]
    fn parallel_rows_match_sequential_rows() {
        let sequential = dataset_bytes(false, 1);
        assert_eq!(dataset_bytes(true, 2), sequential);
        assert_eq!(dataset_bytes(true, 4096), sequential);

        let dataset = read_from(Cursor::new(sequential), None).unwrap();
        assert_eq!((dataset.width(), dataset.len()), (9, 6));
        // Row 1 is (I, H), the kerned pair: (100 + 50 - 35) / 1000.
        assert!((dataset.row(1).unwrap()[0] - 0.115).abs() < 1e-9);
    }

    #[test]
    fn shared_cache_rebuilds_shapes_for_new_render_size() {
        let font = block_font();
        let large = ExtractionConfig {
            render_size: 1024.0,
            ..ExtractionConfig::default()
        };

        let mut shared = GlyphCache::new();
        FontFeatureExtractor::new(&font, &mut shared, ExtractionConfig::default())
            .unwrap()
            .pair_features('I', 'I')
            .unwrap();
        let shared_vector = FontFeatureExtractor::new(&font, &mut shared, large.clone())
            .unwrap()
            .pair_features('I', 'I')
            .unwrap();
        assert_eq!(shared.len(), 2);

        let mut fresh = GlyphCache::new();
        let fresh_vector = FontFeatureExtractor::new(&font, &mut fresh, large)
            .unwrap()
            .pair_features('I', 'I')
            .unwrap();
        assert_eq!(shared_vector, fresh_vector);
    }
}
