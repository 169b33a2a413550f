//! Per-session glyph cache.
//!
//! Shapes are built lazily on first reference and kept for the session
//! (a font's glyph vocabulary is small and bounded, so nothing is
//! evicted). Entries are keyed by font identity and the [`ShapeParams`]
//! they were built under, then glyph id, so extractors with different
//! shape settings can share one cache.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::Error;
use crate::font::{FontSource, GlyphId};
use crate::shape::{GlyphShape, ShapeParams};

/// How a caller names a glyph.
#[derive(Debug, Clone)]
pub enum GlyphRef<'a> {
    Name(&'a str),
    Char(char),
    Index(GlyphId),
    /// A prebuilt shape, adopted into the cache under its glyph id
    /// unless that id is already cached.
    Shape(Box<GlyphShape>),
}

impl<'a> From<&'a str> for GlyphRef<'a> {
    fn from(name: &'a str) -> Self {
        GlyphRef::Name(name)
    }
}

impl From<char> for GlyphRef<'_> {
    fn from(c: char) -> Self {
        GlyphRef::Char(c)
    }
}

impl From<GlyphId> for GlyphRef<'_> {
    fn from(id: GlyphId) -> Self {
        GlyphRef::Index(id)
    }
}

impl From<GlyphShape> for GlyphRef<'_> {
    fn from(shape: GlyphShape) -> Self {
        GlyphRef::Shape(Box::new(shape))
    }
}

/// The shapes of one font built under one set of parameters.
#[derive(Debug)]
struct ShapeSet {
    params: ShapeParams,
    shapes: HashMap<GlyphId, GlyphShape>,
}

/// Mapping (font identity, shape parameters) → glyph id → shape.
#[derive(Debug, Default)]
pub struct GlyphCache {
    fonts: HashMap<String, Vec<ShapeSet>>,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `glyph` against `font`, building and caching its shape under
    /// `params` if needed. Returns the glyph id to look the shape up with.
    pub fn resolve<F: FontSource + ?Sized>(
        &mut self,
        font: &F,
        params: &ShapeParams,
        glyph: GlyphRef<'_>,
    ) -> Result<GlyphId, Error> {
        let id = match glyph {
            GlyphRef::Name(name) => font
                .glyph_id_by_name(name)
                .ok_or_else(|| Error::UnknownGlyph(name.to_string()))?,
            GlyphRef::Char(c) => font.glyph_id_for_char(c).ok_or(Error::UnmappedChar(c))?,
            GlyphRef::Index(id) => id,
            GlyphRef::Shape(shape) => {
                let id = shape.glyph_id;
                self.set_entry(font.identity(), params).entry(id).or_insert(*shape);
                return Ok(id);
            }
        };

        if let Entry::Vacant(slot) = self.set_entry(font.identity(), params).entry(id) {
            let outline = font.outline(id).ok_or(Error::GlyphOutOfRange(id.0))?;
            let shape = GlyphShape::from_outline(id, outline, font.units_per_em(), params)?;
            slot.insert(shape);
        }
        Ok(id)
    }

    pub fn get(&self, font: &str, params: &ShapeParams, id: GlyphId) -> Option<&GlyphShape> {
        self.shapes(font, params).and_then(|shapes| shapes.get(&id))
    }

    pub fn get_mut(
        &mut self,
        font: &str,
        params: &ShapeParams,
        id: GlyphId,
    ) -> Option<&mut GlyphShape> {
        self.shapes_mut(font, params).and_then(|shapes| shapes.get_mut(&id))
    }

    /// Every shape of one font cached under `params`.
    pub fn shapes(&self, font: &str, params: &ShapeParams) -> Option<&HashMap<GlyphId, GlyphShape>> {
        self.fonts
            .get(font)?
            .iter()
            .find(|set| set.params == *params)
            .map(|set| &set.shapes)
    }

    /// Mutable access to every shape of one font cached under `params`,
    /// e.g. to fill in profiles in parallel.
    pub fn shapes_mut(
        &mut self,
        font: &str,
        params: &ShapeParams,
    ) -> Option<&mut HashMap<GlyphId, GlyphShape>> {
        self.fonts
            .get_mut(font)?
            .iter_mut()
            .find(|set| set.params == *params)
            .map(|set| &mut set.shapes)
    }

    /// Total number of cached shapes across fonts and parameter sets.
    pub fn len(&self) -> usize {
        self.fonts
            .values()
            .flatten()
            .map(|set| set.shapes.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every shape of one font (e.g. after its outlines changed).
    pub fn forget_font(&mut self, font: &str) {
        self.fonts.remove(font);
    }

    fn set_entry(&mut self, font: &str, params: &ShapeParams) -> &mut HashMap<GlyphId, GlyphShape> {
        let sets = self.fonts.entry(font.to_string()).or_default();
        let index = match sets.iter().position(|set| set.params == *params) {
            Some(index) => index,
            None => {
                sets.push(ShapeSet {
                    params: *params,
                    shapes: HashMap::new(),
                });
                sets.len() - 1
            }
        };
        &mut sets[index].shapes
    }
}
