//! UFO font sources, read with `norad`.
//!
//! Glyphs come from the default layer in `public.glyphOrder` order (glyphs
//! missing from the order follow in layer order). Components are decomposed
//! into plain outlines. Kerning is resolved the UFO way: glyph-glyph,
//! glyph-group, group-glyph, then group-group.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use kurbo::{Affine, BezPath, Point};
use norad::{Contour, ContourPoint, Font, Glyph, Layer, PointType};

use crate::error::Error;
use crate::font::{FontSource, GlyphId, GlyphOutline, StaticFont};

const KERN1_PREFIX: &str = "public.kern1.";
const KERN2_PREFIX: &str = "public.kern2.";

/// Components nested deeper than this are dropped.
const MAX_COMPONENT_DEPTH: usize = 8;

/// A [`FontSource`] over a UFO font.
#[derive(Debug, Clone)]
pub struct UfoFont {
    glyphs: StaticFont,
    kerning: KerningTable,
}

impl UfoFont {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let font = Font::load(path)?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        Ok(Self::from_font(&font, fallback))
    }

    /// Snapshot an in-memory UFO. `fallback_identity` names the font when
    /// its info carries no family name.
    pub fn from_font(font: &Font, fallback_identity: impl Into<String>) -> Self {
        let info = &font.font_info;
        let identity = match (&info.family_name, &info.style_name) {
            (Some(family), Some(style)) => format!("{} {}", family, style),
            (Some(family), None) => family.clone(),
            _ => fallback_identity.into(),
        };
        let units_per_em = info.units_per_em.as_ref().map(|u| u.as_f64()).unwrap_or(1000.0);
        let ascender = info.ascender.unwrap_or(units_per_em * 0.8);
        let descender = info.descender.unwrap_or(units_per_em * -0.2);

        let layer = font.default_layer();
        let mut glyphs = StaticFont::new(identity, units_per_em, ascender, descender);
        let mut names = Vec::new();
        for glyph in glyph_order(font, layer) {
            glyphs.add_glyph(GlyphOutline {
                name: glyph.name().to_string(),
                path: glyph_path(glyph, layer),
                advance_width: glyph.width,
                codepoints: glyph.codepoints.iter().collect(),
            });
            names.push(glyph.name().to_string());
        }

        let mut pairs = HashMap::new();
        for (first, seconds) in font.kerning.iter() {
            for (second, &value) in seconds {
                pairs.insert((first.to_string(), second.to_string()), value);
            }
        }
        let mut groups = HashMap::new();
        for (group, members) in font.groups.iter() {
            groups.insert(
                group.to_string(),
                members.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
            );
        }

        log::debug!(
            "{}: {} glyphs, {} kerning pairs, {} groups",
            glyphs.identity(),
            glyphs.glyph_count(),
            pairs.len(),
            groups.len(),
        );
        Self {
            glyphs,
            kerning: KerningTable::new(&names, pairs, &groups),
        }
    }
}

impl FontSource for UfoFont {
    fn identity(&self) -> &str {
        self.glyphs.identity()
    }

    fn units_per_em(&self) -> f64 {
        self.glyphs.units_per_em()
    }

    fn ascender(&self) -> f64 {
        self.glyphs.ascender()
    }

    fn descender(&self) -> f64 {
        self.glyphs.descender()
    }

    fn glyph_count(&self) -> usize {
        self.glyphs.glyph_count()
    }

    fn glyph_id_by_name(&self, name: &str) -> Option<GlyphId> {
        self.glyphs.glyph_id_by_name(name)
    }

    fn glyph_id_for_char(&self, c: char) -> Option<GlyphId> {
        self.glyphs.glyph_id_for_char(c)
    }

    fn outline(&self, id: GlyphId) -> Option<&GlyphOutline> {
        self.glyphs.outline(id)
    }

    fn kerning(&self, left: GlyphId, right: GlyphId) -> f64 {
        self.kerning.lookup(left, right)
    }
}

fn glyph_order<'a>(font: &Font, layer: &'a Layer) -> Vec<&'a Glyph> {
    let mut seen = HashSet::new();
    let mut order = Vec::with_capacity(layer.len());
    let listed = font
        .lib
        .get("public.glyphOrder")
        .and_then(|v| v.as_array())
        .map(|names| names.iter().filter_map(|n| n.as_string()).collect::<Vec<_>>())
        .unwrap_or_default();
    for name in listed {
        if let Some(glyph) = layer.get_glyph(name) {
            if seen.insert(name.to_string()) {
                order.push(glyph);
            }
        }
    }
    for glyph in layer.iter() {
        if seen.insert(glyph.name().to_string()) {
            order.push(glyph);
        }
    }
    order
}

/// Outline of a glyph with its components decomposed.
fn glyph_path(glyph: &Glyph, layer: &Layer) -> BezPath {
    let mut path = BezPath::new();
    for contour in &glyph.contours {
        append_contour(&mut path, contour, Affine::IDENTITY);
    }

    let mut stack: Vec<(&norad::Component, Affine, usize)> = glyph
        .components
        .iter()
        .rev()
        .map(|c| (c, to_affine(c), 1))
        .collect();
    while let Some((component, transform, depth)) = stack.pop() {
        let Some(base) = layer.get_glyph(&component.base) else {
            log::warn!("{}: missing component base {}", glyph.name(), component.base);
            continue;
        };
        for contour in &base.contours {
            append_contour(&mut path, contour, transform);
        }
        if depth >= MAX_COMPONENT_DEPTH {
            if !base.components.is_empty() {
                log::warn!("{}: components nested too deeply", glyph.name());
            }
            continue;
        }
        for nested in base.components.iter().rev() {
            stack.push((nested, transform * to_affine(nested), depth + 1));
        }
    }
    path
}

fn to_affine(component: &norad::Component) -> Affine {
    let t = component.transform;
    Affine::new([t.x_scale, t.xy_scale, t.yx_scale, t.y_scale, t.x_offset, t.y_offset])
}

/// Append one UFO contour to `path`.
///
/// Closed contours are walked from their first on-curve point around to
/// it again. Consecutive quadratic off-curve points imply on-curve points
/// at their midpoints; a contour made only of off-curve points starts at
/// the midpoint between its last and first point.
fn append_contour(path: &mut BezPath, contour: &Contour, transform: Affine) {
    let points = &contour.points;
    if points.is_empty() {
        return;
    }
    let at = |p: &ContourPoint| transform * Point::new(p.x, p.y);

    if points[0].typ == PointType::Move {
        path.move_to(at(&points[0]));
        let mut pending = Vec::new();
        for p in &points[1..] {
            segment(path, &mut pending, p.typ.clone(), at(p));
        }
        return;
    }

    let mut pending = Vec::new();
    match points.iter().position(|p| p.typ != PointType::OffCurve) {
        Some(start) => {
            path.move_to(at(&points[start]));
            for k in 1..=points.len() {
                let p = &points[(start + k) % points.len()];
                segment(path, &mut pending, p.typ.clone(), at(p));
            }
        }
        None => {
            let first = at(&points[0]);
            let last = at(&points[points.len() - 1]);
            let start = first.midpoint(last);
            path.move_to(start);
            pending.extend(points.iter().map(at));
            segment(path, &mut pending, PointType::QCurve, start);
        }
    }
    path.close_path();
}

/// Emit the segment ending at `end`, consuming buffered off-curve points.
fn segment(path: &mut BezPath, pending: &mut Vec<Point>, typ: PointType, end: Point) {
    match typ {
        PointType::OffCurve => {
            pending.push(end);
            return;
        }
        PointType::Curve => match pending.as_slice() {
            [] => path.line_to(end),
            [c] => path.quad_to(*c, end),
            // More than two handles is rare; keep the outer two.
            [c1, .., c2] => path.curve_to(*c1, *c2, end),
        },
        PointType::QCurve => {
            for pair in pending.windows(2) {
                path.quad_to(pair[0], pair[0].midpoint(pair[1]));
            }
            match pending.last() {
                Some(&c) => path.quad_to(c, end),
                None => path.line_to(end),
            }
        }
        // A move inside a contour only occurs in malformed data; treat it
        // as a corner.
        PointType::Move | PointType::Line => path.line_to(end),
    }
    pending.clear();
}

/// Pair and group kerning, resolved per glyph id.
#[derive(Debug, Clone, Default)]
struct KerningTable {
    names: Vec<String>,
    first_group: Vec<Option<String>>,
    second_group: Vec<Option<String>>,
    pairs: HashMap<(String, String), f64>,
}

impl KerningTable {
    fn new(
        names: &[String],
        pairs: HashMap<(String, String), f64>,
        groups: &HashMap<String, Vec<String>>,
    ) -> Self {
        let mut first: HashMap<&str, &str> = HashMap::new();
        let mut second: HashMap<&str, &str> = HashMap::new();
        for (group, members) in groups {
            let side = if group.starts_with(KERN1_PREFIX) {
                &mut first
            } else if group.starts_with(KERN2_PREFIX) {
                &mut second
            } else {
                continue;
            };
            for member in members {
                side.entry(member.as_str()).or_insert(group.as_str());
            }
        }
        Self {
            first_group: names
                .iter()
                .map(|n| first.get(n.as_str()).map(|g| g.to_string()))
                .collect(),
            second_group: names
                .iter()
                .map(|n| second.get(n.as_str()).map(|g| g.to_string()))
                .collect(),
            names: names.to_vec(),
            pairs,
        }
    }

    fn lookup(&self, left: GlyphId, right: GlyphId) -> f64 {
        let (Some(l), Some(r)) = (self.names.get(left.to_usize()), self.names.get(right.to_usize()))
        else {
            return 0.0;
        };
        let lg = self.first_group[left.to_usize()].as_ref();
        let rg = self.second_group[right.to_usize()].as_ref();

        let candidates = [
            Some((l, r)),
            rg.map(|rg| (l, rg)),
            lg.map(|lg| (lg, r)),
            lg.zip(rg),
        ];
        candidates
            .into_iter()
            .flatten()
            .find_map(|(a, b)| self.pairs.get(&(a.clone(), b.clone())).copied())
            .unwrap_or(0.0)
    }
}
