//! Command line interface for stroketype
//!
//! Handles parsing command line arguments and provides validation for
//! user inputs. Parameter flags override whatever the config file saved.

use crate::font_source::{InterpretationMode, LengthUnit};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// stroketype CLI arguments
///
/// Examples:
///   stroketype --source ~/Type/Token info           # Show parameters and names
///   stroketype --stroke-width 0.3 export            # Export at 0.3 mm / 2.0 mm
///   stroketype --cap-height 12 --cap-height-unit pt install
///   stroketype --mode typographic --stroke-width 80 export -o Token.otf
///   stroketype toolchain                            # Check the external toolchain
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "stroketype",
    version,
    about = "Build stroke fonts sized in physical units",
    long_about = "stroketype strokes a centerline typeface at a chosen stroke width and compiles it into an OpenType font. In physical mode the stroke width and cap height are real lengths, so the font prints with the requested stroke at the requested size."
)]
pub struct CliArgs {
    /// Directory holding the typeface's UFO sources
    #[clap(
        long = "source",
        short = 's',
        global = true,
        help = "Typeface directory containing UFO sources",
        long_help = "Directory containing the typeface's centerline UFO sources. physical.ufo is preferred, then default.ufo, then the first UFO found. Falls back to source_dir in settings.json."
    )]
    pub source: Option<PathBuf>,

    /// Directory holding the external font toolchain
    #[clap(
        long = "toolchain",
        global = true,
        help = "Directory containing checkOutlinesUFO, autohint, makeotf and ttx",
        long_help = "Directory containing the external font toolchain (checkOutlinesUFO, autohint, makeotf, ttx). Falls back to toolchain_path in settings.json, then to the stroketype data directory."
    )]
    pub toolchain: Option<PathBuf>,

    /// Interpretation of the stroke width
    #[clap(
        long = "mode",
        global = true,
        help = "typographic or physical",
        long_help = "How the stroke width is read. typographic: font units, cap height fixed by the source. physical: stroke width and cap height as physical lengths (default)."
    )]
    pub mode: Option<InterpretationMode>,

    #[clap(long = "stroke-width", global = true, help = "Stroke width in the active mode's unit")]
    pub stroke_width: Option<f64>,

    #[clap(long = "stroke-width-unit", global = true, help = "mm, pt or in")]
    pub stroke_width_unit: Option<LengthUnit>,

    #[clap(long = "cap-height", global = true, help = "Cap height (physical mode)")]
    pub cap_height: Option<f64>,

    #[clap(long = "cap-height-unit", global = true, help = "mm, pt or in")]
    pub cap_height_unit: Option<LengthUnit>,

    /// Enable debug logging
    #[clap(long = "verbose", short = 'v', global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show parameters, bounds and derived names (default)
    Info,
    /// Build the font into a file
    Export {
        /// Output path; defaults to <postscript name>.otf in the current directory
        #[clap(long = "output", short = 'o')]
        output: Option<PathBuf>,
    },
    /// Build the font into the user font directory
    Install,
    /// Save the physical parameters to settings.json
    Save,
    /// Check whether the external toolchain is usable
    Toolchain,
    /// Initialize the user configuration directory
    InitConfig,
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    pub fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.source {
            if !path.is_dir() {
                return Err(format!(
                    "Typeface directory does not exist: {}\nPass the directory that contains the .ufo sources.",
                    path.display()
                ));
            }
        }
        for (flag, value) in [
            ("--stroke-width", self.stroke_width),
            ("--cap-height", self.cap_height),
        ] {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(format!("{flag} must be a number, got {value}"));
                }
            }
        }
        Ok(())
    }

    /// The subcommand to run, `info` when none was given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Info)
    }

    /// Whether any parameter flag was passed
    pub fn has_parameter_overrides(&self) -> bool {
        self.mode.is_some()
            || self.stroke_width.is_some()
            || self.stroke_width_unit.is_some()
            || self.cap_height.is_some()
            || self.cap_height_unit.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_the_subcommand() {
        let args = CliArgs::parse_from([
            "stroketype",
            "export",
            "--stroke-width",
            "0.3",
            "--cap-height-unit",
            "pt",
            "-o",
            "out.otf",
        ]);
        assert_eq!(args.stroke_width, Some(0.3));
        assert_eq!(args.cap_height_unit, Some(LengthUnit::Point));
        assert_eq!(
            args.command(),
            Command::Export {
                output: Some(PathBuf::from("out.otf"))
            }
        );
        assert!(args.has_parameter_overrides());
    }

    #[test]
    fn path_flags_are_not_parameter_overrides() {
        let args = CliArgs::parse_from(["stroketype", "--source", "/type/Token", "info"]);
        assert!(!args.has_parameter_overrides());
    }

    #[test]
    fn defaults_to_info() {
        let args = CliArgs::parse_from(["stroketype", "--mode", "typographic"]);
        assert_eq!(args.command(), Command::Info);
        assert_eq!(args.mode, Some(InterpretationMode::Typographic));
    }

    #[test]
    fn rejects_missing_source_directory() {
        let args = CliArgs::parse_from(["stroketype", "--source", "/definitely/not/here"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn rejects_unknown_units() {
        assert!(CliArgs::try_parse_from(["stroketype", "--stroke-width-unit", "cubit"]).is_err());
    }
}
