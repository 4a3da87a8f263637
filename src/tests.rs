#[cfg(test)]
mod model_over_ufo_tests {
    use crate::font_source::tests::write_sample_ufo;
    use crate::font_source::{
        InterpretationMode, OutlineEngine, ParametricFontModel, StrokerError, UfoStroker,
    };
    use tempfile::TempDir;

    fn open_sample() -> (TempDir, ParametricFontModel) {
        let dir = TempDir::new().unwrap();
        write_sample_ufo(dir.path(), "physical.ufo");
        let model = ParametricFontModel::open(dir.path()).unwrap();
        (dir, model)
    }

    #[test]
    fn opens_typeface_directory_in_physical_mode() {
        let (_dir, model) = open_sample();
        assert_eq!(model.mode(), InterpretationMode::Physical);
        assert_eq!(model.family_name(), "Token");
        assert!((model.engine().stroke_width() - 70.0).abs() < 1e-9);
        assert_eq!(model.glyph_advance("L"), Some(450.0));
    }

    #[test]
    fn physical_stroke_width_drives_the_outline() {
        let (_dir, mut model) = open_sample();
        let thin = model.glyph_bounds("I").unwrap();
        model.set_stroke_width(0.3);
        let thick = model.glyph_bounds("I").unwrap();

        // 0.3mm at 2mm cap height over 700 units
        assert!((thick.width() - 105.0).abs() < 1.0);
        assert!(thick.width() > thin.width());
    }

    #[test]
    fn snapshot_serializes_with_cap_height_as_em() {
        let (dir, model) = open_sample();
        let request = model.snapshot();
        let out = dir.path().join("build").join("physical.ufo");
        std::fs::create_dir_all(out.parent().unwrap()).unwrap();
        request.engine.serialize(&out).unwrap();

        let written = UfoStroker::load(&out).unwrap();
        assert_eq!(written.units_per_em(), 700.0);
        assert_eq!(written.family_name(), "Token");
        let font = norad::Font::load(&out).unwrap();
        assert_eq!(
            font.font_info.postscript_font_name.as_deref(),
            Some("Token-0.20mm-2.00mm")
        );
        for glyph in font.default_layer().iter() {
            assert!(
                glyph.contours.iter().all(|c| c.points[0].typ != norad::PointType::Move),
                "{} has an open contour",
                glyph.name()
            );
        }
    }

    #[test]
    fn directory_without_sources_is_reported() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ParametricFontModel::open(dir.path()),
            Err(StrokerError::MissingSource(_))
        ));
    }
}
