//! Side files read by makeotf next to the source

use crate::font_source::{BuildRequest, FontNames, OutlineEngine};
use std::fmt::Write as _;
use std::path::Path;

pub const FEATURES_FILE: &str = "features";
pub const FONT_MENU_NAME_DB: &str = "FontMenuNameDB";
pub const GLYPH_ORDER_DB: &str = "GlyphOrderAndAliasDB";

/// Write the feature file, the menu name database and the glyph order
/// database into `dir`.
pub fn write_side_files<E: OutlineEngine>(
    request: &BuildRequest<E>,
    dir: &Path,
) -> std::io::Result<()> {
    std::fs::write(dir.join(FEATURES_FILE), features(request))?;
    std::fs::write(dir.join(FONT_MENU_NAME_DB), font_menu_name_db(&request.names))?;
    std::fs::write(
        dir.join(GLYPH_ORDER_DB),
        glyph_order(&request.engine.glyph_names()),
    )?;
    Ok(())
}

fn features<E: OutlineEngine>(request: &BuildRequest<E>) -> String {
    let engine = &request.engine;
    let names = &request.names;
    let ascender = engine.ascender().round() as i64;
    let descender = engine.descender().round() as i64;
    let line_gap = engine.line_gap().round() as i64;

    let mut out = String::new();
    out.push_str("languagesystem DFLT dflt;\nlanguagesystem latn dflt;\n\n");

    out.push_str("table hhea {\n");
    let _ = writeln!(out, "  Ascender {ascender};");
    let _ = writeln!(out, "  Descender {descender};");
    let _ = writeln!(out, "  LineGap {line_gap};");
    out.push_str("} hhea;\n\n");

    out.push_str("table OS/2 {\n");
    out.push_str("  FSType 0;\n");
    let _ = writeln!(out, "  TypoAscender {ascender};");
    let _ = writeln!(out, "  TypoDescender {descender};");
    let _ = writeln!(out, "  TypoLineGap {line_gap};");
    let _ = writeln!(out, "  winAscent {};", ascender.max(0));
    let _ = writeln!(out, "  winDescent {};", descender.unsigned_abs());
    let _ = writeln!(out, "  CapHeight {};", engine.cap_height().round() as i64);
    out.push_str("} OS/2;\n\n");

    out.push_str("table name {\n");
    for (id, value) in [
        (1, &names.family),
        (2, &names.style),
        (4, &names.full),
        (6, &names.postscript),
    ] {
        write_name(&mut out, id, value);
    }
    out.push_str("} name;\n");
    out
}

/// Windows and Mac name records for one name ID
fn write_name(out: &mut String, id: u16, value: &str) {
    if value.is_empty() {
        return;
    }
    let value = value.replace('"', "");
    let _ = writeln!(out, "  nameid {id} \"{value}\";");
    let _ = writeln!(out, "  nameid {id} 1 \"{value}\";");
}

fn font_menu_name_db(names: &FontNames) -> String {
    format!(
        "[{}]\nf={}\ns={}\nl={}\nm=1,{}\n",
        names.postscript, names.family, names.style, names.full, names.full
    )
}

fn glyph_order(glyph_names: &[String]) -> String {
    glyph_names
        .iter()
        .map(|name| format!("{name} {name}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::tests::FixedEngine;
    use crate::font_source::ParametricFontModel;
    use tempfile::TempDir;

    #[test]
    fn side_files_carry_the_derived_names() {
        let dir = TempDir::new().unwrap();
        let request = ParametricFontModel::new(FixedEngine::default()).snapshot();
        write_side_files(&request, dir.path()).unwrap();

        let menu = std::fs::read_to_string(dir.path().join(FONT_MENU_NAME_DB)).unwrap();
        assert_eq!(
            menu,
            "[Token-0.20mm-2.00mm]\nf=Token\ns=0.20mm / 2.00mm\nl=Token 0.20mm / 2.00mm\nm=1,Token 0.20mm / 2.00mm\n"
        );

        let order = std::fs::read_to_string(dir.path().join(GLYPH_ORDER_DB)).unwrap();
        assert_eq!(order, ".notdef .notdef\nI I\n");

        let features = std::fs::read_to_string(dir.path().join(FEATURES_FILE)).unwrap();
        assert!(features.contains("  nameid 6 \"Token-0.20mm-2.00mm\";\n"));
        assert!(features.contains("  winDescent 200;\n"));
        assert!(features.contains("  CapHeight 700;\n"));
    }
}
