//! In-memory outline engine with fixed metrics

use crate::font_source::stroker::{FontNames, OutlineEngine, StrokerError};
use kurbo::{BezPath, Rect, Shape};
use std::path::Path;

/// Engine with the proportions of the bundled typeface: cap height 700,
/// stroke width between 10 and 110.
#[derive(Debug, Clone)]
pub struct FixedEngine {
    pub stroke_width: f64,
    pub units_per_em: f64,
    pub names: Option<FontNames>,
    pub fail_serialize: bool,
}

impl Default for FixedEngine {
    fn default() -> Self {
        Self {
            stroke_width: 60.0,
            units_per_em: 1000.0,
            names: None,
            fail_serialize: false,
        }
    }
}

impl OutlineEngine for FixedEngine {
    fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    fn set_stroke_width(&mut self, value: f64) {
        self.stroke_width = value;
    }

    fn cap_height(&self) -> f64 {
        700.0
    }

    fn ascender(&self) -> f64 {
        800.0
    }

    fn descender(&self) -> f64 {
        -200.0
    }

    fn line_gap(&self) -> f64 {
        0.0
    }

    fn min_stroke_width(&self) -> f64 {
        10.0
    }

    fn max_stroke_width(&self) -> f64 {
        110.0
    }

    fn units_per_em(&self) -> f64 {
        self.units_per_em
    }

    fn set_units_per_em(&mut self, value: f64) {
        self.units_per_em = value;
    }

    fn family_name(&self) -> &str {
        "Token"
    }

    fn set_names(&mut self, names: &FontNames) {
        self.names = Some(names.clone());
    }

    fn source_name(&self) -> &str {
        "fixed"
    }

    fn glyph_names(&self) -> Vec<String> {
        vec![".notdef".to_string(), "I".to_string()]
    }

    fn glyph_outline(&self, name: &str) -> Option<BezPath> {
        let bounds = self.glyph_bounds(name)?;
        Some(bounds.to_path(0.1))
    }

    fn glyph_advance(&self, name: &str) -> Option<f64> {
        (name == "I").then_some(200.0)
    }

    fn glyph_bounds(&self, name: &str) -> Option<Rect> {
        let half = self.stroke_width / 2.0;
        (name == "I").then(|| Rect::new(100.0 - half, -half, 100.0 + half, 700.0 + half))
    }

    fn serialize(&self, path: &Path) -> Result<(), StrokerError> {
        let write_error = |message: String| StrokerError::Write {
            path: path.to_path_buf(),
            message,
        };
        if self.fail_serialize {
            return Err(write_error("serialization disabled for this engine".into()));
        }
        std::fs::create_dir_all(path).map_err(|e| write_error(e.to_string()))?;
        let postscript = self
            .names
            .as_ref()
            .map(|n| n.postscript.as_str())
            .unwrap_or_default();
        let contents = format!(
            "strokeWidth={}\nunitsPerEm={}\npostscriptName={}\n",
            self.stroke_width, self.units_per_em, postscript
        );
        std::fs::write(path.join("fontinfo.txt"), contents).map_err(|e| write_error(e.to_string()))
    }
}
