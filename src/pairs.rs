//! Glyph selection and pair enumeration.
//!
//! Pairs are visited as the upper triangle of the eligible glyph list,
//! self pairs included: `(g[i], g[j])` for `i` in `0..n`, `j` in `i..n`.
//! Dataset rows follow exactly this order.

use kurbo::Shape;

use crate::font::{FontSource, GlyphId, GlyphOutline};

/// Glyphs worth pairing, in font order.
///
/// Skips names starting with `.` (`.notdef`, `.null`), glyphs without
/// codepoints (component-only glyphs), glyphs mapped only to private-use
/// codepoints, and glyphs with no horizontal extent.
pub fn eligible_glyphs<F: FontSource + ?Sized>(font: &F) -> Vec<GlyphId> {
    glyph_ids(font.glyph_count())
        .filter(|&id| font.outline(id).is_some_and(is_eligible))
        .collect()
}

/// Ids `0..count`. Glyph ids are `u32`, so a larger count is clamped.
fn glyph_ids(count: usize) -> impl ExactSizeIterator<Item = GlyphId> {
    let end = u32::try_from(count).unwrap_or_else(|_| {
        log::warn!("{} glyphs exceed the glyph id range, using the first {}", count, u32::MAX);
        u32::MAX
    });
    (0..end).map(GlyphId)
}

fn is_eligible(outline: &GlyphOutline) -> bool {
    if outline.name.starts_with('.') {
        return false;
    }
    if outline.codepoints.is_empty() || outline.codepoints.iter().all(|&c| is_private_use(c)) {
        return false;
    }
    if outline.path.segments().next().is_none() {
        return false;
    }
    let bounds = outline.path.bounding_box();
    !(bounds.x0 == 0.0 && bounds.x1 == 0.0)
}

fn is_private_use(c: char) -> bool {
    ('\u{E000}'..'\u{F900}').contains(&c)
}

/// Number of unordered pairs of `n` glyphs, self pairs included.
pub fn pair_count(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Iterator over the upper-triangle pairs of a glyph list.
#[derive(Debug, Clone)]
pub struct GlyphPairs {
    glyphs: Vec<GlyphId>,
    i: usize,
    j: usize,
}

impl GlyphPairs {
    pub fn new(glyphs: Vec<GlyphId>) -> Self {
        Self { glyphs, i: 0, j: 0 }
    }
}

impl Iterator for GlyphPairs {
    type Item = (GlyphId, GlyphId);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.glyphs.len();
        if self.j >= n {
            self.i += 1;
            self.j = self.i;
        }
        if self.i >= n {
            return None;
        }
        let pair = (self.glyphs[self.i], self.glyphs[self.j]);
        self.j += 1;
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.glyphs.len();
        let remaining = if self.i >= n {
            0
        } else {
            // Rest of row i, plus every later row.
            (n - self.j.max(self.i)) + pair_count(n - self.i - 1)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GlyphPairs {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::testing::{block_font, glyph, rect_path};
    use kurbo::BezPath;

    #[test]
    fn upper_triangle_with_self_pairs() {
        let pairs: Vec<(u32, u32)> = GlyphPairs::new(vec![GlyphId(0), GlyphId(1), GlyphId(2)])
            .map(|(a, b)| (a.0, b.0))
            .collect();
        assert_eq!(pairs, vec![(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn glyph_ids_clamp_to_id_range() {
        let ids: Vec<GlyphId> = glyph_ids(3).collect();
        assert_eq!(ids, vec![GlyphId(0), GlyphId(1), GlyphId(2)]);
        assert_eq!(glyph_ids(0).len(), 0);
        assert_eq!(glyph_ids(usize::MAX).len(), u32::MAX as usize);
    }

    #[test]
    fn exact_size_tracks_progress() {
        let mut pairs = GlyphPairs::new((0..5).map(GlyphId).collect());
        assert_eq!(pairs.len(), pair_count(5));
        for consumed in 1..=pair_count(5) {
            pairs.next();
            assert_eq!(pairs.len(), pair_count(5) - consumed);
        }
        assert!(pairs.next().is_none());
        assert_eq!(GlyphPairs::new(vec![]).len(), 0);
    }

    #[test]
    fn filters_unpairable_glyphs() {
        let mut font = block_font();
        font.add_glyph(glyph(".notdef", 'x', rect_path(0.0, 0.0, 100.0, 100.0), 200.0));
        font.add_glyph(GlyphOutline {
            name: "component".into(),
            path: rect_path(10.0, 0.0, 100.0, 100.0),
            advance_width: 200.0,
            codepoints: vec![],
        });
        font.add_glyph(glyph("logo", '\u{E001}', rect_path(10.0, 0.0, 100.0, 100.0), 200.0));
        font.add_glyph(glyph("space", ' ', BezPath::new(), 250.0));
        let eligible = eligible_glyphs(&font);
        assert_eq!(eligible, vec![GlyphId(0), GlyphId(1), GlyphId(2)]);
    }
}
