use glyphspace::kurbo::BezPath;
use glyphspace::pairs::pair_count;
use glyphspace::{
    read_dataset, ExtractionConfig, FontFeatureExtractor, FontSource, GlyphCache, GlyphOutline,
    ShapeParams, StaticFont,
};
use tempfile::TempDir;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
    let mut path = BezPath::new();
    path.move_to((x0, y0));
    path.line_to((x1, y0));
    path.line_to((x1, y1));
    path.line_to((x0, y1));
    path.close_path();
    path
}

fn outline(name: &str, codepoints: Vec<char>, path: BezPath, advance_width: f64) -> GlyphOutline {
    GlyphOutline {
        name: name.to_string(),
        path,
        advance_width,
        codepoints,
    }
}

/// Five pairable glyphs plus three that must be skipped.
fn sample_font() -> StaticFont {
    let mut font = StaticFont::new("Sample Sans", 1000.0, 750.0, -250.0);
    font.add_glyph(outline(".notdef", vec![], rect(50.0, 0.0, 450.0, 700.0), 500.0));
    font.add_glyph(outline("space", vec![' '], BezPath::new(), 250.0));
    font.add_glyph(outline("I", vec!['I'], rect(80.0, 0.0, 180.0, 700.0), 260.0));
    font.add_glyph(outline("L", vec!['L'], rect(80.0, 0.0, 180.0, 700.0), 500.0));
    font.add_glyph(outline("o", vec!['o'], rect(40.0, -10.0, 460.0, 510.0), 500.0));
    font.add_glyph(outline("uni E000", vec!['\u{E000}'], rect(0.0, 0.0, 10.0, 10.0), 20.0));

    // A bowl drawn with curves, to exercise the flattener.
    let mut bowl = BezPath::new();
    bowl.move_to((250.0, -10.0));
    bowl.curve_to((390.0, -10.0), (460.0, 100.0), (460.0, 250.0));
    bowl.curve_to((460.0, 400.0), (390.0, 510.0), (250.0, 510.0));
    bowl.curve_to((110.0, 510.0), (40.0, 400.0), (40.0, 250.0));
    bowl.curve_to((40.0, 100.0), (110.0, -10.0), (250.0, -10.0));
    bowl.close_path();
    font.add_glyph(outline("O", vec!['O'], bowl, 500.0));
    font.add_glyph(outline("A", vec!['A', '\u{0391}'], rect(10.0, 0.0, 590.0, 700.0), 600.0));

    let l = font.glyph_id_by_name("L").unwrap();
    let o = font.glyph_id_by_name("o").unwrap();
    font.set_kerning(l, o, -40.0);
    font
}

#[test]
fn dataset_has_one_row_per_pair() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sample.bin");
    let font = sample_font();
    let mut cache = GlyphCache::new();
    let mut extractor =
        FontFeatureExtractor::new(&font, &mut cache, ExtractionConfig::default()).unwrap();

    let summary = extractor.write_dataset(&path).unwrap();
    assert_eq!(summary.pairs, pair_count(5));
    assert_eq!(summary.height, 15);
    assert_eq!(summary.width, 33);

    let dataset = read_dataset(&path, None).unwrap();
    assert_eq!(dataset.width(), 33);
    assert_eq!(dataset.len(), 15);
    assert!(!dataset.is_truncated());
    for row in dataset.rows() {
        assert!(row[1..].iter().all(|v| (0.0..=1.0).contains(v)));
    }

    // Pair order: I, L, o, O, A. Row 5 is (L, L), row 6 is (L, o).
    let ll = dataset.row(5).unwrap();
    assert!((ll[0] - (320.0 + 80.0) / 1000.0).abs() < 1e-9);
    let lo = dataset.row(6).unwrap();
    assert!((lo[0] - (320.0 + 40.0 - 40.0) / 1000.0).abs() < 1e-9);
}

#[test]
fn cache_is_shared_between_calls() {
    let font = sample_font();
    let mut cache = GlyphCache::new();
    {
        let mut extractor =
            FontFeatureExtractor::new(&font, &mut cache, ExtractionConfig::default()).unwrap();
        let by_char = extractor.pair_features('O', 'O').unwrap();
        let by_name = extractor.pair_features("O", "O").unwrap();
        assert_eq!(by_char, by_name);
        // Round shapes leave whitespace near the top and bottom of the bowl.
        assert!(by_char.values.iter().any(|&v| v > 0.0));
    }
    assert_eq!(cache.len(), 1);
    let params = ShapeParams::from_config(&ExtractionConfig::default());
    let shape = cache
        .get("Sample Sans", &params, font.glyph_id_for_char('O').unwrap())
        .unwrap();
    assert!(shape.vertex_count() > 8);
}
