//! Shared fixtures for font source tests

mod fixed_engine;

pub use fixed_engine::FixedEngine;

use norad::fontinfo::NonNegativeIntegerOrFloat;
use norad::{Contour, ContourPoint, Font, Glyph, PointType};
use std::path::{Path, PathBuf};

fn point(x: f64, y: f64, typ: PointType) -> ContourPoint {
    ContourPoint::new(x, y, typ, false, None, None)
}

/// Write a small centerline UFO with an "I" and an "L" to `dir/name`.
pub fn write_sample_ufo(dir: &Path, name: &str) -> PathBuf {
    let mut font = Font::new();
    font.font_info.family_name = Some("Token".into());
    font.font_info.style_name = Some("Regular".into());
    font.font_info.units_per_em = NonNegativeIntegerOrFloat::new(1000.0);
    font.font_info.cap_height = Some(700.0);
    font.font_info.ascender = Some(800.0);
    font.font_info.descender = Some(-200.0);

    let mut stem = Glyph::new("I");
    stem.width = 200.0;
    stem.codepoints.insert('I');
    stem.contours.push(Contour::new(
        vec![
            point(100.0, 0.0, PointType::Move),
            point(100.0, 700.0, PointType::Line),
        ],
        None,
    ));

    let mut ell = Glyph::new("L");
    ell.width = 450.0;
    ell.codepoints.insert('L');
    ell.contours.push(Contour::new(
        vec![
            point(100.0, 700.0, PointType::Move),
            point(100.0, 0.0, PointType::Line),
            point(400.0, 0.0, PointType::Line),
        ],
        None,
    ));

    let layer = font.default_layer_mut();
    layer.insert_glyph(stem);
    layer.insert_glyph(ell);

    let path = dir.join(name);
    font.save(&path).expect("write sample UFO");
    path
}
