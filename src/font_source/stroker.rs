//! Outline engines
//!
//! An outline engine turns a stroke width into glyph outlines. The model
//! only talks to the [`OutlineEngine`] trait; [`UfoStroker`] is the
//! implementation backed by a UFO source of centerline glyphs.

use crate::font_source::conversions::{contour_to_bezpath, outline_to_contours};
use crate::font_source::metrics::FontMetrics;
use kurbo::{BezPath, Cap, Join, Rect, Shape, Stroke, StrokeOpts};
use norad::fontinfo::NonNegativeIntegerOrFloat;
use norad::Font;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Thinnest stroke the stroker accepts, in font units
pub const MIN_STROKE_WIDTH: f64 = 10.0;
/// Thickest stroke at 1000 units per em; scales with the source UPEM
pub const MAX_STROKE_WIDTH_PER_1000_UPEM: f64 = 110.0;
/// Flattening tolerance for stroke expansion, in font units
const STROKE_TOLERANCE: f64 = 0.1;

#[derive(Debug, Error)]
pub enum StrokerError {
    #[error("failed to load UFO source {path}: {message}")]
    Load { path: PathBuf, message: String },
    #[error("no UFO source found in {0}")]
    MissingSource(PathBuf),
    #[error("failed to write UFO to {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Names stamped into a source before it is compiled
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FontNames {
    pub family: String,
    pub style: String,
    pub full: String,
    pub postscript: String,
}

/// The contract the parametric model and the build pipeline rely on.
///
/// Stroke widths and metrics are in font units of the engine's source.
pub trait OutlineEngine: Clone + Send + 'static {
    fn stroke_width(&self) -> f64;
    fn set_stroke_width(&mut self, value: f64);

    /// Intrinsic cap height of the source
    fn cap_height(&self) -> f64;
    fn ascender(&self) -> f64;
    fn descender(&self) -> f64;
    fn line_gap(&self) -> f64;

    /// Intrinsic lower bound for the stroke width
    fn min_stroke_width(&self) -> f64;
    /// Intrinsic upper bound for the stroke width
    fn max_stroke_width(&self) -> f64;

    fn units_per_em(&self) -> f64;
    fn set_units_per_em(&mut self, value: f64);

    fn family_name(&self) -> &str;
    fn set_names(&mut self, names: &FontNames);

    /// File stem of the source container, used to name build artifacts
    fn source_name(&self) -> &str;
    fn glyph_names(&self) -> Vec<String>;
    fn glyph_outline(&self, name: &str) -> Option<BezPath>;
    fn glyph_advance(&self, name: &str) -> Option<f64>;
    fn glyph_bounds(&self, name: &str) -> Option<Rect>;

    /// Write the stroked source container to `path`.
    fn serialize(&self, path: &Path) -> Result<(), StrokerError>;
}

/// Outline engine over a UFO of centerline glyphs
#[derive(Debug, Clone)]
pub struct UfoStroker {
    path: PathBuf,
    source_name: String,
    font: Font,
    metrics: FontMetrics,
    stroke_width: f64,
    names: Option<FontNames>,
    /// UPEM written on serialization when it differs from the source
    target_units_per_em: Option<f64>,
}

impl UfoStroker {
    /// Load a UFO from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StrokerError> {
        let path = path.as_ref();
        let font = Font::load(path).map_err(|e| StrokerError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("Loaded stroke source from {}", path.display());
        Ok(Self::from_font(font, path))
    }

    /// Wrap an in-memory font; `path` only names the source
    pub fn from_font(font: Font, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let source_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "font".to_string());
        let metrics = FontMetrics::from_ufo(&font);
        let mut stroker = Self {
            path,
            source_name,
            font,
            metrics,
            stroke_width: 0.0,
            names: None,
            target_units_per_em: None,
        };
        stroker.set_stroke_width(stroker.default_stroke_width());
        stroker
    }

    /// Load the preferred stroke source from a typeface directory.
    ///
    /// `physical.ufo` is preferred, then `default.ufo`, then the first
    /// UFO in name order.
    pub fn open_directory(dir: impl AsRef<Path>) -> Result<Self, StrokerError> {
        let dir = dir.as_ref();
        for candidate in ["physical.ufo", "default.ufo"] {
            let path = dir.join(candidate);
            if path.is_dir() {
                return Self::load(path);
            }
        }

        let entries = std::fs::read_dir(dir).map_err(|e| StrokerError::Load {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut sources: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir() && p.extension().is_some_and(|ext| ext == "ufo"))
            .collect();
        sources.sort();
        match sources.into_iter().next() {
            Some(path) => Self::load(path),
            None => Err(StrokerError::MissingSource(dir.to_path_buf())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    fn default_stroke_width(&self) -> f64 {
        (self.min_stroke_width() + self.max_stroke_width()) / 2.0
    }

    fn stroke_style(&self) -> Stroke {
        Stroke::new(self.stroke_width)
            .with_caps(Cap::Round)
            .with_join(Join::Round)
    }

    fn stroke_path(&self, centerline: &BezPath) -> BezPath {
        kurbo::stroke(
            centerline.iter(),
            &self.stroke_style(),
            &StrokeOpts::default(),
            STROKE_TOLERANCE,
        )
    }

    fn centerline(&self, name: &str) -> Option<BezPath> {
        let glyph = self.font.default_layer().get_glyph(name)?;
        let mut path = BezPath::new();
        for contour in &glyph.contours {
            path.extend(contour_to_bezpath(contour));
        }
        Some(path)
    }

    /// Build the font that gets written: stroked contours, stamped names.
    fn stroked_font(&self) -> Font {
        let mut font = self.font.clone();

        if let Some(names) = &self.names {
            let info = &mut font.font_info;
            info.family_name = Some(names.family.clone());
            info.style_name = Some(names.style.clone());
            info.style_map_family_name = Some(names.family.clone());
            info.postscript_font_name = Some(names.postscript.clone());
            info.postscript_full_name = Some(names.full.clone());
            info.open_type_name_compatible_full_name = Some(names.full.clone());
        }
        if let Some(target) = self.target_units_per_em {
            match NonNegativeIntegerOrFloat::new(target) {
                Some(upem) => font.font_info.units_per_em = Some(upem),
                None => warn!("Ignoring invalid units per em {}", target),
            }
        }
        let names: Vec<String> = font
            .default_layer()
            .iter()
            .map(|glyph| glyph.name().to_string())
            .collect();
        for name in names {
            let Some(centerline) = self.centerline(&name) else {
                continue;
            };
            let outline = self.stroke_path(&centerline);
            if let Some(glyph) = font.default_layer_mut().get_glyph_mut(name.as_str()) {
                glyph.contours = outline_to_contours(&outline);
            }
        }
        font
    }
}

impl OutlineEngine for UfoStroker {
    fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    fn set_stroke_width(&mut self, value: f64) {
        self.stroke_width = value
            .max(self.min_stroke_width())
            .min(self.max_stroke_width());
    }

    fn cap_height(&self) -> f64 {
        self.metrics.cap_height
    }

    fn ascender(&self) -> f64 {
        self.metrics.ascender
    }

    fn descender(&self) -> f64 {
        self.metrics.descender
    }

    fn line_gap(&self) -> f64 {
        self.metrics.line_gap
    }

    fn min_stroke_width(&self) -> f64 {
        MIN_STROKE_WIDTH
    }

    fn max_stroke_width(&self) -> f64 {
        (MAX_STROKE_WIDTH_PER_1000_UPEM * self.metrics.units_per_em / 1000.0).floor()
    }

    fn units_per_em(&self) -> f64 {
        self.target_units_per_em.unwrap_or(self.metrics.units_per_em)
    }

    fn set_units_per_em(&mut self, value: f64) {
        self.target_units_per_em = Some(value);
    }

    fn family_name(&self) -> &str {
        &self.metrics.family_name
    }

    fn set_names(&mut self, names: &FontNames) {
        self.names = Some(names.clone());
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn glyph_names(&self) -> Vec<String> {
        self.font
            .default_layer()
            .iter()
            .map(|glyph| glyph.name().to_string())
            .collect()
    }

    fn glyph_outline(&self, name: &str) -> Option<BezPath> {
        self.centerline(name).map(|path| self.stroke_path(&path))
    }

    fn glyph_advance(&self, name: &str) -> Option<f64> {
        self.font.default_layer().get_glyph(name).map(|g| g.width)
    }

    fn glyph_bounds(&self, name: &str) -> Option<Rect> {
        let outline = self.glyph_outline(name)?;
        if outline.elements().is_empty() {
            return Some(Rect::ZERO);
        }
        Some(outline.bounding_box())
    }

    fn serialize(&self, path: &Path) -> Result<(), StrokerError> {
        let font = self.stroked_font();
        font.save(path).map_err(|e| StrokerError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(
            "Wrote stroked source ({} units) to {}",
            self.stroke_width,
            path.display()
        );
        Ok(())
    }
}
