//! Vertical metrics and naming read from a UFO source
//!
//! Missing values fall back to proportions of the units-per-em, the same
//! way a fresh font would be set up.

use norad::Font;

/// Units per em assumed when the source does not declare one
pub const DEFAULT_UNITS_PER_EM: f64 = 1000.0;

/// Font information the stroker needs from its source
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub family_name: String,
    pub units_per_em: f64,
    pub ascender: f64,
    pub descender: f64,
    pub cap_height: f64,
    pub x_height: f64,
    pub line_gap: f64,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::with_units_per_em(DEFAULT_UNITS_PER_EM)
    }
}

impl FontMetrics {
    fn with_units_per_em(units_per_em: f64) -> Self {
        Self {
            family_name: "Untitled".to_string(),
            units_per_em,
            ascender: units_per_em * 0.8,
            descender: -(units_per_em * 0.2),
            cap_height: units_per_em * 0.7,
            x_height: units_per_em * 0.5,
            line_gap: 0.0,
        }
    }

    /// Extract metrics from a norad font
    pub fn from_ufo(font: &Font) -> Self {
        let info = &font.font_info;
        let units_per_em = info
            .units_per_em
            .and_then(|v| v.to_string().parse::<f64>().ok())
            .filter(|v| *v > 0.0)
            .unwrap_or(DEFAULT_UNITS_PER_EM);
        let defaults = Self::with_units_per_em(units_per_em);

        Self {
            family_name: info
                .family_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(defaults.family_name),
            units_per_em,
            ascender: info.ascender.unwrap_or(defaults.ascender),
            descender: info.descender.unwrap_or(defaults.descender),
            cap_height: info
                .cap_height
                .filter(|v| *v > 0.0)
                .unwrap_or(defaults.cap_height),
            x_height: info.x_height.unwrap_or(defaults.x_height),
            line_gap: info
                .open_type_hhea_line_gap
                .map(f64::from)
                .unwrap_or(defaults.line_gap),
        }
    }

    /// Line height from ascender to descender plus gap
    pub fn line_height(&self) -> f64 {
        self.ascender - self.descender + self.line_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use norad::fontinfo::NonNegativeIntegerOrFloat;

    #[test]
    fn empty_font_uses_proportional_defaults() {
        let metrics = FontMetrics::from_ufo(&Font::new());
        assert_eq!(metrics.units_per_em, 1000.0);
        assert_eq!(metrics.cap_height, 700.0);
        assert_eq!(metrics.ascender, 800.0);
        assert_eq!(metrics.descender, -200.0);
        assert_eq!(metrics.family_name, "Untitled");
    }

    #[test]
    fn declared_values_win() {
        let mut font = Font::new();
        font.font_info.family_name = Some("Token".into());
        font.font_info.units_per_em = NonNegativeIntegerOrFloat::new(2048.0);
        font.font_info.cap_height = Some(1400.0);
        font.font_info.open_type_hhea_line_gap = Some(100);

        let metrics = FontMetrics::from_ufo(&font);
        assert_eq!(metrics.family_name, "Token");
        assert_eq!(metrics.units_per_em, 2048.0);
        assert_eq!(metrics.cap_height, 1400.0);
        assert_eq!(metrics.ascender, 2048.0 * 0.8);
        assert_eq!(metrics.line_gap, 100.0);
        assert_eq!(metrics.line_height(), 2048.0 + 100.0);
    }
}
