//! Frozen parameter state handed to a build

use crate::font_source::model::InterpretationMode;
use crate::font_source::stroker::{FontNames, OutlineEngine, UfoStroker};
use crate::font_source::units::LengthUnit;
use std::path::{Path, PathBuf};

/// Everything a build needs, detached from the live model
#[derive(Debug, Clone)]
pub struct BuildRequest<E: OutlineEngine = UfoStroker> {
    pub mode: InterpretationMode,
    pub stroke_width: f64,
    pub stroke_width_unit: LengthUnit,
    /// `None` in typographic mode
    pub cap_height: Option<f64>,
    pub cap_height_unit: LengthUnit,
    pub names: FontNames,
    /// UPEM the compiled binary must carry; `None` keeps the source UPEM
    pub units_per_em: Option<f64>,
    /// Engine clone with the names and UPEM already stamped in
    pub engine: E,
}

impl<E: OutlineEngine> BuildRequest<E> {
    /// `<postscript>.otf`
    pub fn default_file_name(&self) -> String {
        format!("{}.otf", self.names.postscript)
    }

    /// `<font_dir>/<family>/<postscript>.otf`
    pub fn install_path(&self, font_dir: &Path) -> PathBuf {
        font_dir
            .join(&self.names.family)
            .join(self.default_file_name())
    }
}
