//! The font-parsing collaborator.
//!
//! Feature extraction never reads font binaries itself; it asks a
//! [`FontSource`] for outlines, metrics, and kerning. [`StaticFont`] is an
//! in-memory source for synthetic data and tests; the `ufo` feature adds a
//! source backed by `norad`.

use std::collections::HashMap;

use kurbo::BezPath;

/// Index of a glyph within its font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphId(pub u32);

impl GlyphId {
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for GlyphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gid{}", self.0)
    }
}

/// One glyph as supplied by the font collaborator, in design units (Y up).
#[derive(Debug, Clone)]
pub struct GlyphOutline {
    pub name: String,
    /// Outline commands: move / line / quad / cubic / close.
    pub path: BezPath,
    pub advance_width: f64,
    pub codepoints: Vec<char>,
}

/// Read-only oracle for font data.
pub trait FontSource {
    /// Stable name for this font, used to key the glyph cache.
    fn identity(&self) -> &str;
    fn units_per_em(&self) -> f64;
    fn ascender(&self) -> f64;
    /// Typically negative.
    fn descender(&self) -> f64;
    fn glyph_count(&self) -> usize;
    fn glyph_id_by_name(&self, name: &str) -> Option<GlyphId>;
    fn glyph_id_for_char(&self, c: char) -> Option<GlyphId>;
    fn outline(&self, id: GlyphId) -> Option<&GlyphOutline>;
    /// Signed spacing adjustment for `left` followed by `right`.
    fn kerning(&self, left: GlyphId, right: GlyphId) -> f64;
}

/// A font held entirely in memory.
#[derive(Debug, Clone)]
pub struct StaticFont {
    identity: String,
    units_per_em: f64,
    ascender: f64,
    descender: f64,
    glyphs: Vec<GlyphOutline>,
    by_name: HashMap<String, GlyphId>,
    by_char: HashMap<char, GlyphId>,
    kerning: HashMap<(GlyphId, GlyphId), f64>,
}

impl StaticFont {
    pub fn new(identity: impl Into<String>, units_per_em: f64, ascender: f64, descender: f64) -> Self {
        Self {
            identity: identity.into(),
            units_per_em,
            ascender,
            descender,
            glyphs: Vec::new(),
            by_name: HashMap::new(),
            by_char: HashMap::new(),
            kerning: HashMap::new(),
        }
    }

    /// Append a glyph and return its id. The first glyph claiming a name
    /// or codepoint keeps it.
    pub fn add_glyph(&mut self, outline: GlyphOutline) -> GlyphId {
        let id = GlyphId(self.glyphs.len() as u32);
        self.by_name.entry(outline.name.clone()).or_insert(id);
        for &c in &outline.codepoints {
            self.by_char.entry(c).or_insert(id);
        }
        self.glyphs.push(outline);
        id
    }

    pub fn set_kerning(&mut self, left: GlyphId, right: GlyphId, value: f64) {
        self.kerning.insert((left, right), value);
    }
}

impl FontSource for StaticFont {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn units_per_em(&self) -> f64 {
        self.units_per_em
    }

    fn ascender(&self) -> f64 {
        self.ascender
    }

    fn descender(&self) -> f64 {
        self.descender
    }

    fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    fn glyph_id_by_name(&self, name: &str) -> Option<GlyphId> {
        self.by_name.get(name).copied()
    }

    fn glyph_id_for_char(&self, c: char) -> Option<GlyphId> {
        self.by_char.get(&c).copied()
    }

    fn outline(&self, id: GlyphId) -> Option<&GlyphOutline> {
        self.glyphs.get(id.to_usize())
    }

    fn kerning(&self, left: GlyphId, right: GlyphId) -> f64 {
        self.kerning.get(&(left, right)).copied().unwrap_or(0.0)
    }
}
