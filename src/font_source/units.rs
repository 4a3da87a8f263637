//! Physical length units used by the physical parametrization
//!
//! Stroke width and cap height can each be expressed in millimeters,
//! points or inches. Conversion is a pure function of the two units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimeters per PostScript point
const MILLIMETERS_PER_POINT: f64 = 25.4 / 72.0;
/// Millimeters per inch
const MILLIMETERS_PER_INCH: f64 = 25.4;
/// Points per inch
const POINTS_PER_INCH: f64 = 72.0;

/// A physical length unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Millimeter,
    Point,
    Inch,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 3] = [LengthUnit::Millimeter, LengthUnit::Point, LengthUnit::Inch];

    /// Short unit suffix used in style and PostScript names
    pub fn abbreviation(self) -> &'static str {
        match self {
            LengthUnit::Millimeter => "mm",
            LengthUnit::Point => "pt",
            LengthUnit::Inch => "in",
        }
    }

    /// Re-express `value` given in `self` as a length in `to`.
    pub fn convert(self, value: f64, to: LengthUnit) -> f64 {
        convert(value, self, to)
    }
}

/// Convert a length between units.
///
/// Identity conversions return `value` untouched so that repeated writes
/// in the same unit never accumulate rounding error.
pub fn convert(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
    use LengthUnit::*;
    match (from, to) {
        (Millimeter, Millimeter) | (Point, Point) | (Inch, Inch) => value,
        (Millimeter, Point) => value / MILLIMETERS_PER_POINT,
        (Millimeter, Inch) => value / MILLIMETERS_PER_INCH,
        (Point, Millimeter) => value * MILLIMETERS_PER_POINT,
        (Point, Inch) => value / POINTS_PER_INCH,
        (Inch, Millimeter) => value * MILLIMETERS_PER_INCH,
        (Inch, Point) => value * POINTS_PER_INCH,
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown length unit '{0}' (expected mm, pt or in)")]
pub struct ParseUnitError(String);

impl FromStr for LengthUnit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" => Ok(LengthUnit::Millimeter),
            "pt" | "point" | "points" => Ok(LengthUnit::Point),
            "in" | "inch" | "inches" => Ok(LengthUnit::Inch),
            _ => Err(ParseUnitError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn identity_conversion_is_exact() {
        for unit in LengthUnit::ALL {
            for value in [0.0, 0.1, 0.2, 1.0 / 3.0, 72.0, 1e-12, 12345.678] {
                assert_eq!(convert(value, unit, unit), value);
            }
        }
    }

    #[test]
    fn known_factors() {
        assert!((convert(25.4, LengthUnit::Millimeter, LengthUnit::Inch) - 1.0).abs() < EPSILON);
        assert!((convert(1.0, LengthUnit::Inch, LengthUnit::Point) - 72.0).abs() < EPSILON);
        assert!((convert(72.0, LengthUnit::Point, LengthUnit::Millimeter) - 25.4).abs() < EPSILON);
        assert!((convert(36.0, LengthUnit::Point, LengthUnit::Inch) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn round_trips_through_every_unit() {
        for a in LengthUnit::ALL {
            for b in LengthUnit::ALL {
                for value in [0.05, 0.2, 2.0, 17.5, 300.0] {
                    let back = convert(convert(value, a, b), b, a);
                    assert!(
                        (back - value).abs() <= value * EPSILON,
                        "{value} {a} -> {b} -> {a} gave {back}"
                    );
                }
            }
        }
    }

    #[test]
    fn conversion_is_transitive() {
        let value = 3.7;
        let direct = convert(value, LengthUnit::Millimeter, LengthUnit::Inch);
        let via_points = convert(
            convert(value, LengthUnit::Millimeter, LengthUnit::Point),
            LengthUnit::Point,
            LengthUnit::Inch,
        );
        assert!((direct - via_points).abs() < EPSILON);
    }

    #[test]
    fn parses_abbreviations_and_names() {
        assert_eq!("mm".parse::<LengthUnit>(), Ok(LengthUnit::Millimeter));
        assert_eq!("Point".parse::<LengthUnit>(), Ok(LengthUnit::Point));
        assert_eq!(" inches ".parse::<LengthUnit>(), Ok(LengthUnit::Inch));
        assert!("px".parse::<LengthUnit>().is_err());
    }

    #[test]
    fn serializes_as_lowercase_name() {
        let json = serde_json::to_string(&LengthUnit::Point).unwrap();
        assert_eq!(json, "\"point\"");
        let unit: LengthUnit = serde_json::from_str("\"inch\"").unwrap();
        assert_eq!(unit, LengthUnit::Inch);
    }
}
