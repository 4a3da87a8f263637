//! Application runner logic
//!
//! Resolves settings, opens the typeface, applies saved and command line
//! parameters, then dispatches the subcommand.

use crate::compiler::{BuildEvent, BuildPipeline, BuildState, Toolchain};
use crate::core::cli::{CliArgs, Command};
use crate::core::config_file::{ConfigFile, SavedParameters};
use crate::font_source::{InterpretationMode, OutlineEngine, ParameterChange, ParametricFontModel};
use crate::logging;
use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Paths resolved from CLI flags, the config file and built-in defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub source: Option<PathBuf>,
    pub toolchain: Option<PathBuf>,
    pub work_dir: PathBuf,
}

impl Paths {
    /// Priority order: CLI argument, then config file, then built-in default
    pub fn resolve(cli_args: &CliArgs, config: &ConfigFile) -> Self {
        Self {
            source: cli_args.source.clone().or_else(|| config.source_dir.clone()),
            toolchain: cli_args
                .toolchain
                .clone()
                .or_else(|| config.toolchain_path.clone())
                .or_else(Toolchain::default_location),
            work_dir: config.work_dir.clone().unwrap_or_else(std::env::temp_dir),
        }
    }

    fn toolchain(&self) -> Result<&Path> {
        self.toolchain
            .as_deref()
            .context("No toolchain directory; pass --toolchain or set toolchain_path in settings.json")
    }
}

/// Run the subcommand selected by `cli_args`.
pub async fn run_app(cli_args: CliArgs) -> Result<()> {
    let command = cli_args.command();
    if command == Command::InitConfig {
        return ConfigFile::initialize_config_directory();
    }
    cli_args.validate().map_err(|e| anyhow!(e))?;

    let _log_guard = logging::init(cli_args.verbose);
    let config = ConfigFile::load().unwrap_or_default();
    let paths = Paths::resolve(&cli_args, &config);
    debug!("Resolved paths: {:?}", paths);

    if command == Command::Toolchain {
        return check_toolchain(paths.toolchain()?);
    }

    let source = paths
        .source
        .clone()
        .context("No typeface directory; pass --source or set source_dir in settings.json")?;
    let mut model = ParametricFontModel::open(&source)
        .with_context(|| format!("Failed to open typeface in {}", source.display()))?;
    if let Some(saved) = &config.parameters {
        if saved.apply_to(&mut model) {
            debug!("Restored saved parameters {:?}", saved);
        }
    }
    if cli_args.has_parameter_overrides() {
        apply_overrides(&mut model, &cli_args);
    }

    match command {
        Command::Info => {
            print_info(&model);
            Ok(())
        }
        Command::Save => save_parameters(&model, config, &source),
        Command::Export { output } => {
            let destination =
                output.unwrap_or_else(|| PathBuf::from(model.snapshot().default_file_name()));
            run_build(&model, &destination, &paths).await
        }
        Command::Install => {
            let font_dir = dirs::font_dir().context("No user font directory on this platform")?;
            let destination = model.snapshot().install_path(&font_dir);
            run_build(&model, &destination, &paths).await
        }
        Command::Toolchain | Command::InitConfig => Ok(()),
    }
}

/// Apply parameter flags in dependency order: mode, units, cap height,
/// then stroke width, whose physical bounds depend on the cap height.
fn apply_overrides(model: &mut ParametricFontModel, cli_args: &CliArgs) {
    if let Some(mode) = cli_args.mode {
        model.set_mode(mode);
    }
    if let Some(unit) = cli_args.stroke_width_unit {
        report("stroke width unit", model.set_stroke_width_unit(unit));
    }
    if let Some(unit) = cli_args.cap_height_unit {
        report("cap height unit", model.set_cap_height_unit(unit));
    }
    if let Some(value) = cli_args.cap_height {
        report("cap height", model.set_cap_height(value));
    }
    if let Some(value) = cli_args.stroke_width {
        report("stroke width", model.set_stroke_width(value));
    }
}

fn report(parameter: &str, change: ParameterChange) {
    if let ParameterChange::ClampedTo(value) = change {
        warn!("{} out of range, using {}", parameter, value);
    }
}

fn print_info(model: &ParametricFontModel) {
    let engine = model.engine();
    let unit = model.stroke_width_unit();
    println!("Source:        {}", engine.path().display());
    println!("Family:        {}", model.family_name());
    println!("Style:         {}", model.style_name());
    println!("Full name:     {}", model.full_name());
    println!("PostScript:    {}", model.postscript_name());
    println!("Mode:          {}", model.mode());
    match model.mode() {
        InterpretationMode::Typographic => println!(
            "Stroke width:  {:.1} units ({:.1}..{:.1})",
            model.stroke_width(),
            model.min_stroke_width(),
            model.max_stroke_width()
        ),
        InterpretationMode::Physical => println!(
            "Stroke width:  {:.2}{unit} ({:.2}..{:.2})",
            model.stroke_width(),
            model.min_stroke_width(),
            model.max_stroke_width()
        ),
    }
    if let (Some(cap_height), Some(min), Some(max)) =
        (model.cap_height(), model.min_cap_height(), model.max_cap_height())
    {
        println!(
            "Cap height:    {:.2}{} ({:.2}..{:.2})",
            cap_height,
            model.cap_height_unit(),
            min,
            max
        );
    }
    println!("Engine stroke: {:.2} units", engine.stroke_width());
    let metrics = engine.metrics();
    println!(
        "Metrics:       ascender {}, descender {}, line gap {}",
        model.ascender(),
        model.descender(),
        model.line_gap()
    );
    println!(
        "               x-height {}, line height {}, {} units per em",
        metrics.x_height,
        metrics.line_height(),
        metrics.units_per_em
    );
    println!("Glyphs:        {}", engine.glyph_names().len());
}

fn save_parameters(model: &ParametricFontModel, mut config: ConfigFile, source: &Path) -> Result<()> {
    let parameters = SavedParameters::from_model(model)
        .context("Parameters can only be saved in physical mode")?;
    config.parameters = Some(parameters);
    config.source_dir = Some(source.to_path_buf());
    config.save()?;
    println!("Saved parameters to {}", ConfigFile::config_path().display());
    Ok(())
}

fn check_toolchain(dir: &Path) -> Result<()> {
    let toolchain = Toolchain::locate(dir)?;
    println!("Toolchain ready at {}", toolchain.dir().display());
    Ok(())
}

/// Build into `destination`, forwarding progress to the log.
/// Ctrl-C requests cancellation.
async fn run_build(model: &ParametricFontModel, destination: &Path, paths: &Paths) -> Result<()> {
    let pipeline = BuildPipeline::new(Handle::current()).with_work_root(&paths.work_dir);
    let mut handle = pipeline.build(model, destination, paths.toolchain()?)?;
    let mut cancel_requested = false;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => log_event(&event),
                None => break,
            },
            signal = tokio::signal::ctrl_c(), if !cancel_requested => {
                if let Err(e) = signal {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                warn!("Cancelling build of {}", handle.destination().display());
                handle.cancel();
                cancel_requested = true;
            }
        }
    }

    match handle.wait().await {
        BuildState::Done(path) => {
            println!("{}", path.display());
            Ok(())
        }
        BuildState::Failed { stage, error } => {
            Err(anyhow::Error::new(error).context(format!("Build failed while {stage}")))
        }
        BuildState::Cancelled => bail!("Build cancelled"),
        other => bail!("Build ended in unexpected state {:?}", other),
    }
}

fn log_event(event: &BuildEvent) {
    match event {
        BuildEvent::Stage(stage) => info!("Build: {}", stage),
        BuildEvent::Progress { completed, total } => {
            info!("Converted {}/{}", completed, total)
        }
        BuildEvent::Success { path } => info!("Installed {}", path.display()),
        BuildEvent::Failure { .. } | BuildEvent::Cancelled { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_paths_override_config_paths() {
        let config = ConfigFile {
            toolchain_path: Some(PathBuf::from("/config/fdk")),
            work_dir: Some(PathBuf::from("/config/work")),
            source_dir: Some(PathBuf::from("/config/type")),
            parameters: None,
        };
        let cli_args = CliArgs::parse_from(["stroketype", "--toolchain", "/cli/fdk"]);

        let paths = Paths::resolve(&cli_args, &config);
        assert_eq!(paths.toolchain, Some(PathBuf::from("/cli/fdk")));
        assert_eq!(paths.source, Some(PathBuf::from("/config/type")));
        assert_eq!(paths.work_dir, PathBuf::from("/config/work"));
    }

    #[test]
    fn work_dir_defaults_to_temp() {
        let cli_args = CliArgs::parse_from(["stroketype"]);
        let paths = Paths::resolve(&cli_args, &ConfigFile::default());
        assert_eq!(paths.work_dir, std::env::temp_dir());
        assert_eq!(paths.source, None);
    }
}
