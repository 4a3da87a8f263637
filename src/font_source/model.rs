//! The parametric font model
//!
//! Two parameters shape the font: stroke width and cap height. In
//! typographic mode the stroke width is a plain font-unit value and the
//! cap height is whatever the source says. In physical mode both are real
//! lengths and the engine is driven by their ratio, so that a font set at
//! the requested cap height prints with the requested stroke.
//!
//! Out-of-range writes are clamped and inapplicable writes are ignored.
//! Neither is an error; every setter reports what happened through a
//! [`ParameterChange`].

use crate::font_source::snapshot::BuildRequest;
use crate::font_source::stroker::{FontNames, OutlineEngine, StrokerError, UfoStroker};
use crate::font_source::units::{convert, LengthUnit};
use kurbo::{BezPath, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Physical stroke width of a fresh session, in millimeters
pub const DEFAULT_STROKE_WIDTH_MM: f64 = 0.2;
/// Physical cap height of a fresh session, in millimeters
pub const DEFAULT_CAP_HEIGHT_MM: f64 = 2.0;
/// Longest PostScript name accepted by font tools
const MAX_POSTSCRIPT_NAME_LEN: usize = 63;

/// Which parameter is the independent input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpretationMode {
    /// Stroke width in font units; cap height fixed by the source
    Typographic,
    /// Stroke width and cap height as physical lengths
    #[default]
    Physical,
}

impl fmt::Display for InterpretationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpretationMode::Typographic => f.write_str("typographic"),
            InterpretationMode::Physical => f.write_str("physical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}' (expected typographic or physical)")]
pub struct ParseModeError(String);

impl FromStr for InterpretationMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "typographic" | "default" | "upem" => Ok(InterpretationMode::Typographic),
            "physical" => Ok(InterpretationMode::Physical),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Why a parameter write had no effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// The parameter only exists in physical mode
    NotPhysical,
    /// The value was NaN
    NotFinite,
}

impl fmt::Display for IgnoredReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoredReason::NotPhysical => {
                f.write_str("the parameter has no effect outside physical mode")
            }
            IgnoredReason::NotFinite => f.write_str("the value is not a number"),
        }
    }
}

/// Outcome of a parameter write
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterChange {
    /// The value was stored as given
    Applied(f64),
    /// The value was out of range and the nearest bound was stored
    ClampedTo(f64),
    /// The write matched the current state
    Unchanged,
    /// The write was dropped
    Ignored(IgnoredReason),
}

impl ParameterChange {
    /// The stored value, if the write stored one
    pub fn value(self) -> Option<f64> {
        match self {
            ParameterChange::Applied(v) | ParameterChange::ClampedTo(v) => Some(v),
            ParameterChange::Unchanged | ParameterChange::Ignored(_) => None,
        }
    }

    fn from_clamp(parameter: &str, requested: f64, stored: f64) -> Self {
        if requested == stored {
            ParameterChange::Applied(stored)
        } else {
            debug!("Clamped {} {} to {}", parameter, requested, stored);
            ParameterChange::ClampedTo(stored)
        }
    }

    fn ignored(parameter: &str, reason: IgnoredReason) -> Self {
        warn!("Ignoring change to {}: {}", parameter, reason);
        ParameterChange::Ignored(reason)
    }
}

/// Stroke width and cap height over an exclusively owned outline engine
#[derive(Debug, Clone)]
pub struct ParametricFontModel<E: OutlineEngine = UfoStroker> {
    mode: InterpretationMode,
    /// Stroke width in engine units, used in typographic mode
    typographic_stroke_width: f64,
    /// Stroke width in `stroke_width_unit`, used in physical mode
    physical_stroke_width: f64,
    stroke_width_unit: LengthUnit,
    /// Cap height in `cap_height_unit`, used in physical mode
    cap_height: f64,
    cap_height_unit: LengthUnit,
    engine: E,
}

impl ParametricFontModel<UfoStroker> {
    /// Open the stroke source found in a typeface directory
    pub fn open(directory: impl AsRef<Path>) -> Result<Self, StrokerError> {
        Ok(Self::new(UfoStroker::open_directory(directory)?))
    }
}

impl<E: OutlineEngine> ParametricFontModel<E> {
    /// Start a session in physical mode at 0.2 mm / 2.0 mm
    pub fn new(engine: E) -> Self {
        let typographic_stroke_width = engine.stroke_width();
        let mut model = Self {
            mode: InterpretationMode::Physical,
            typographic_stroke_width,
            physical_stroke_width: DEFAULT_STROKE_WIDTH_MM,
            stroke_width_unit: LengthUnit::Millimeter,
            cap_height: DEFAULT_CAP_HEIGHT_MM,
            cap_height_unit: LengthUnit::Millimeter,
            engine,
        };
        model.set_physical_parameters(
            DEFAULT_STROKE_WIDTH_MM,
            LengthUnit::Millimeter,
            DEFAULT_CAP_HEIGHT_MM,
            LengthUnit::Millimeter,
        );
        model
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn mode(&self) -> InterpretationMode {
        self.mode
    }

    /// Stroke width of the active mode: font units or `stroke_width_unit`
    pub fn stroke_width(&self) -> f64 {
        match self.mode {
            InterpretationMode::Typographic => self.typographic_stroke_width,
            InterpretationMode::Physical => self.physical_stroke_width,
        }
    }

    pub fn stroke_width_unit(&self) -> LengthUnit {
        self.stroke_width_unit
    }

    /// Cap height in `cap_height_unit`; `None` in typographic mode
    pub fn cap_height(&self) -> Option<f64> {
        self.is_physical().then_some(self.cap_height)
    }

    pub fn cap_height_unit(&self) -> LengthUnit {
        self.cap_height_unit
    }

    fn is_physical(&self) -> bool {
        self.mode == InterpretationMode::Physical
    }

    // Bounds

    pub fn min_stroke_width(&self) -> f64 {
        self.stroke_width_bounds().0
    }

    pub fn max_stroke_width(&self) -> f64 {
        self.stroke_width_bounds().1
    }

    pub fn min_cap_height(&self) -> Option<f64> {
        self.is_physical().then(|| self.cap_height_bounds().0)
    }

    pub fn max_cap_height(&self) -> Option<f64> {
        self.is_physical().then(|| self.cap_height_bounds().1)
    }

    fn stroke_width_bounds(&self) -> (f64, f64) {
        match self.mode {
            InterpretationMode::Typographic => (
                self.engine.min_stroke_width(),
                self.engine.max_stroke_width(),
            ),
            InterpretationMode::Physical => {
                rounded_inward(self.physical_stroke_width_range(), self.physical_stroke_width)
            }
        }
    }

    fn cap_height_bounds(&self) -> (f64, f64) {
        rounded_inward(self.cap_height_range(), self.cap_height)
    }

    /// Exact physical stroke width range in `stroke_width_unit` at the
    /// current cap height
    fn physical_stroke_width_range(&self) -> (f64, f64) {
        let cap_height = convert(self.cap_height, self.cap_height_unit, self.stroke_width_unit);
        let coeff = cap_height / self.engine.cap_height();
        (
            coeff * self.engine.min_stroke_width(),
            coeff * self.engine.max_stroke_width(),
        )
    }

    /// Exact cap height range in `cap_height_unit` at the current physical
    /// stroke width
    fn cap_height_range(&self) -> (f64, f64) {
        let stroke_width =
            convert(self.physical_stroke_width, self.stroke_width_unit, self.cap_height_unit);
        let numerator = self.engine.cap_height() * stroke_width;
        (
            numerator / self.engine.max_stroke_width(),
            numerator / self.engine.min_stroke_width(),
        )
    }

    /// Pull the physical stroke width into the range the cap height allows
    fn fit_physical_stroke_width(&mut self) {
        let (min, max) = self.physical_stroke_width_range();
        self.physical_stroke_width = clamp(self.physical_stroke_width, min, max);
    }

    /// Pull the cap height into the range the physical stroke width allows
    fn fit_cap_height(&mut self) {
        let (min, max) = self.cap_height_range();
        self.cap_height = clamp(self.cap_height, min, max);
    }

    // Setters

    /// Set the stroke width of the active mode.
    ///
    /// `value` is in font units in typographic mode and in
    /// `stroke_width_unit` in physical mode.
    pub fn set_stroke_width(&mut self, value: f64) -> ParameterChange {
        if value.is_nan() {
            return ParameterChange::ignored("stroke width", IgnoredReason::NotFinite);
        }
        let (min, max) = self.stroke_width_bounds();
        let stored = clamp(value, min, max);
        match self.mode {
            InterpretationMode::Typographic => self.typographic_stroke_width = stored,
            InterpretationMode::Physical => {
                self.physical_stroke_width = stored;
                self.fit_cap_height();
            }
        }
        self.update_engine();
        ParameterChange::from_clamp("stroke width", value, stored)
    }

    /// Set the cap height in `cap_height_unit`. Physical mode only.
    pub fn set_cap_height(&mut self, value: f64) -> ParameterChange {
        if !self.is_physical() {
            return ParameterChange::ignored("cap height", IgnoredReason::NotPhysical);
        }
        if value.is_nan() {
            return ParameterChange::ignored("cap height", IgnoredReason::NotFinite);
        }
        let (min, max) = self.cap_height_bounds();
        let stored = clamp(value, min, max);
        self.cap_height = stored;
        self.fit_physical_stroke_width();
        self.update_engine();
        ParameterChange::from_clamp("cap height", value, stored)
    }

    /// Switch interpretation mode without changing the rendered stroke.
    ///
    /// Leaving physical mode takes the engine width as the typographic
    /// stroke width. Entering physical mode keeps the physical stroke
    /// width and solves the cap height that yields the same engine width.
    /// Returns the stroke width of the new mode.
    pub fn set_mode(&mut self, mode: InterpretationMode) -> ParameterChange {
        if mode == self.mode {
            return ParameterChange::Unchanged;
        }
        match mode {
            InterpretationMode::Typographic => {
                let width = self.physical_engine_stroke_width();
                self.typographic_stroke_width = clamp(
                    width,
                    self.engine.min_stroke_width(),
                    self.engine.max_stroke_width(),
                );
            }
            InterpretationMode::Physical => {
                let stroke_width = convert(
                    self.physical_stroke_width,
                    self.stroke_width_unit,
                    self.cap_height_unit,
                );
                self.cap_height =
                    stroke_width * self.engine.cap_height() / self.typographic_stroke_width;
                self.fit_cap_height();
            }
        }
        debug!("Switched from {} to {} mode", self.mode, mode);
        self.mode = mode;
        self.update_engine();
        ParameterChange::Applied(self.stroke_width())
    }

    /// Re-express the physical stroke width in another unit.
    ///
    /// The physical quantity is kept; only float error is clamped away.
    pub fn set_stroke_width_unit(&mut self, unit: LengthUnit) -> ParameterChange {
        if !self.is_physical() {
            return ParameterChange::ignored("stroke width unit", IgnoredReason::NotPhysical);
        }
        if unit == self.stroke_width_unit {
            return ParameterChange::Unchanged;
        }
        let converted = convert(self.physical_stroke_width, self.stroke_width_unit, unit);
        self.stroke_width_unit = unit;
        self.physical_stroke_width = converted;
        self.fit_physical_stroke_width();
        self.update_engine();
        ParameterChange::from_clamp("stroke width", converted, self.physical_stroke_width)
    }

    /// Re-express the cap height in another unit
    pub fn set_cap_height_unit(&mut self, unit: LengthUnit) -> ParameterChange {
        if !self.is_physical() {
            return ParameterChange::ignored("cap height unit", IgnoredReason::NotPhysical);
        }
        if unit == self.cap_height_unit {
            return ParameterChange::Unchanged;
        }
        let converted = convert(self.cap_height, self.cap_height_unit, unit);
        self.cap_height_unit = unit;
        self.cap_height = converted;
        self.fit_cap_height();
        self.update_engine();
        ParameterChange::from_clamp("cap height", converted, self.cap_height)
    }

    /// Restore a saved physical parametrization in one step.
    ///
    /// Units are taken as given, not converted. Works in either mode; the
    /// engine only follows when the model is in physical mode. Returns
    /// false if the cap height is not a positive number.
    pub fn set_physical_parameters(
        &mut self,
        stroke_width: f64,
        stroke_width_unit: LengthUnit,
        cap_height: f64,
        cap_height_unit: LengthUnit,
    ) -> bool {
        if !(cap_height.is_finite() && cap_height > 0.0) || stroke_width.is_nan() {
            warn!(
                "Ignoring physical parameters {} {} / {} {}",
                stroke_width, stroke_width_unit, cap_height, cap_height_unit
            );
            return false;
        }
        self.stroke_width_unit = stroke_width_unit;
        self.cap_height_unit = cap_height_unit;
        self.cap_height = cap_height;
        self.physical_stroke_width = stroke_width;
        self.fit_physical_stroke_width();
        self.fit_cap_height();

        if self.is_physical() {
            self.update_engine();
        }
        true
    }

    /// Engine stroke width implied by the physical parameters
    fn physical_engine_stroke_width(&self) -> f64 {
        let stroke_width =
            convert(self.physical_stroke_width, self.stroke_width_unit, self.cap_height_unit);
        stroke_width * self.engine.cap_height() / self.cap_height
    }

    fn update_engine(&mut self) {
        let width = match self.mode {
            InterpretationMode::Typographic => self.typographic_stroke_width,
            InterpretationMode::Physical => self.physical_engine_stroke_width(),
        };
        self.engine.set_stroke_width(width);
    }

    // Derived names

    pub fn family_name(&self) -> &str {
        self.engine.family_name()
    }

    pub fn style_name(&self) -> String {
        match self.mode {
            InterpretationMode::Typographic => {
                format!("UPEM {}", self.typographic_stroke_width.trunc() as i64)
            }
            InterpretationMode::Physical => format!(
                "{:.2}{} / {:.2}{}",
                self.physical_stroke_width,
                self.stroke_width_unit,
                self.cap_height,
                self.cap_height_unit
            ),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.family_name(), self.style_name())
    }

    pub fn postscript_name(&self) -> String {
        let family = postscript_family(self.family_name());
        let name = match self.mode {
            InterpretationMode::Typographic => format!(
                "{}-UPEM-{}",
                family,
                self.typographic_stroke_width.trunc() as i64
            ),
            InterpretationMode::Physical => format!(
                "{}-{:.2}{}-{:.2}{}",
                family,
                self.physical_stroke_width,
                self.stroke_width_unit,
                self.cap_height,
                self.cap_height_unit
            ),
        };
        name.chars().take(MAX_POSTSCRIPT_NAME_LEN).collect()
    }

    pub fn names(&self) -> FontNames {
        FontNames {
            family: self.family_name().to_string(),
            style: self.style_name(),
            full: self.full_name(),
            postscript: self.postscript_name(),
        }
    }

    // Engine pass-through

    pub fn ascender(&self) -> f64 {
        self.engine.ascender()
    }

    pub fn descender(&self) -> f64 {
        self.engine.descender()
    }

    pub fn line_gap(&self) -> f64 {
        self.engine.line_gap()
    }

    pub fn glyph_outline(&self, name: &str) -> Option<BezPath> {
        self.engine.glyph_outline(name)
    }

    pub fn glyph_advance(&self, name: &str) -> Option<f64> {
        self.engine.glyph_advance(name)
    }

    pub fn glyph_bounds(&self, name: &str) -> Option<Rect> {
        self.engine.glyph_bounds(name)
    }

    /// Freeze the current state for a build.
    ///
    /// The engine is cloned so later edits cannot reach an in-flight build.
    /// In physical mode the clone's units-per-em is set to the source cap
    /// height, making one em equal to the requested physical cap height.
    pub fn snapshot(&self) -> BuildRequest<E> {
        let names = self.names();
        let mut engine = self.engine.clone();
        engine.set_names(&names);
        let units_per_em = self.is_physical().then(|| {
            let upem = engine.cap_height();
            engine.set_units_per_em(upem);
            upem
        });
        BuildRequest {
            mode: self.mode,
            stroke_width: self.stroke_width(),
            stroke_width_unit: self.stroke_width_unit,
            cap_height: self.cap_height(),
            cap_height_unit: self.cap_height_unit,
            names,
            units_per_em,
            engine,
        }
    }
}

/// `value` limited to `[min, max]`; never panics on inverted bounds
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// `range` rounded inward to hundredths, or left exact when rounding
/// would invert it. Always widened to admit `current`, the stored value.
fn rounded_inward((min, max): (f64, f64), current: f64) -> (f64, f64) {
    let (low, high) = match (round_up(min), round_down(max)) {
        (low, high) if low <= high => (low, high),
        _ => (min, max),
    };
    (low.min(current), high.max(current))
}

fn round_up(value: f64) -> f64 {
    (value * 100.0).ceil() / 100.0
}

fn round_down(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

/// Family name reduced to characters allowed in a PostScript name
fn postscript_family(family: &str) -> String {
    let cleaned: String = family
        .chars()
        .filter(|c| c.is_ascii_graphic() && !"[](){}<>/%".contains(*c))
        .collect();
    if cleaned.is_empty() {
        "Untitled".to_string()
    } else {
        cleaned
    }
}
