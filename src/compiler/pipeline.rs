//! Build orchestration

use crate::compiler::error::BuildError;
use crate::compiler::features::{write_side_files, FEATURES_FILE, FONT_MENU_NAME_DB, GLYPH_ORDER_DB};
use crate::compiler::install::install;
use crate::compiler::toolchain::{Toolchain, ToolOutcome, AUTOHINT, CHECK_OUTLINES, MAKEOTF};
use crate::compiler::units_per_em::correct_units_per_em;
use crate::compiler::{BuildEvent, BuildHandle, BuildStage, BuildState};
use crate::font_source::{BuildRequest, OutlineEngine, ParametricFontModel};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Starts builds and keeps at most one running per destination
#[derive(Debug, Clone)]
pub struct BuildPipeline {
    runtime: Handle,
    work_root: PathBuf,
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
}

impl BuildPipeline {
    /// Pipeline spawning builds on `runtime`, working under the system
    /// temporary directory
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            work_root: std::env::temp_dir(),
            in_flight: Arc::default(),
        }
    }

    /// Create working directories under `root` instead
    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = root.into();
        self
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    /// Build the model's current state into a font at `destination`.
    ///
    /// The model is snapshotted before this returns; later edits do not
    /// affect the build.
    pub fn build<E: OutlineEngine>(
        &self,
        model: &ParametricFontModel<E>,
        destination: impl Into<PathBuf>,
        toolchain: impl Into<PathBuf>,
    ) -> Result<BuildHandle, BuildError> {
        self.build_request(model.snapshot(), destination, toolchain)
    }

    /// Build an existing snapshot
    pub fn build_request<E: OutlineEngine>(
        &self,
        request: BuildRequest<E>,
        destination: impl Into<PathBuf>,
        toolchain: impl Into<PathBuf>,
    ) -> Result<BuildHandle, BuildError> {
        let destination = destination.into();
        let guard = InFlight::claim(&self.in_flight, &destination)?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(BuildState::Idle);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        info!(
            "Building {} into {}",
            request.names.postscript,
            destination.display()
        );
        let run = BuildRun {
            _in_flight: guard,
            request,
            destination: destination.clone(),
            toolchain_dir: toolchain.into(),
            work_root: self.work_root.clone(),
            work_dir: None,
            events: event_tx,
            state: state_tx,
            cancel: cancel_rx,
        };
        let task = self.runtime.spawn(run.execute());

        Ok(BuildHandle {
            destination,
            events: event_rx,
            state: state_rx,
            cancel: cancel_tx,
            task,
        })
    }
}

/// Registration of a destination with a running build
#[derive(Debug)]
struct InFlight {
    set: Arc<Mutex<HashSet<PathBuf>>>,
    key: PathBuf,
}

impl InFlight {
    fn claim(set: &Arc<Mutex<HashSet<PathBuf>>>, destination: &Path) -> Result<Self, BuildError> {
        let key = std::path::absolute(destination).unwrap_or_else(|_| destination.to_path_buf());
        let mut running = set.lock().unwrap_or_else(PoisonError::into_inner);
        if !running.insert(key.clone()) {
            return Err(BuildError::InProgress(destination.to_path_buf()));
        }
        Ok(Self {
            set: Arc::clone(set),
            key,
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut running = self.set.lock().unwrap_or_else(PoisonError::into_inner);
        running.remove(&self.key);
    }
}

/// How a run ended short of failure
enum Finish {
    Installed,
    Cancelled,
}

struct StageError {
    stage: BuildStage,
    error: BuildError,
}

trait AtStage<T> {
    fn at(self, stage: BuildStage) -> Result<T, StageError>;
}

impl<T> AtStage<T> for Result<T, BuildError> {
    fn at(self, stage: BuildStage) -> Result<T, StageError> {
        self.map_err(|error| StageError { stage, error })
    }
}

struct BuildRun<E: OutlineEngine> {
    _in_flight: InFlight,
    request: BuildRequest<E>,
    destination: PathBuf,
    toolchain_dir: PathBuf,
    work_root: PathBuf,
    work_dir: Option<PathBuf>,
    events: mpsc::UnboundedSender<BuildEvent>,
    state: watch::Sender<BuildState>,
    cancel: watch::Receiver<bool>,
}

impl<E: OutlineEngine> BuildRun<E> {
    async fn execute(mut self) -> BuildState {
        let terminal = match self.run().await {
            Ok(Finish::Installed) => {
                info!("Installed {}", self.destination.display());
                self.emit(BuildEvent::Success {
                    path: self.destination.clone(),
                });
                BuildState::Done(self.destination.clone())
            }
            Ok(Finish::Cancelled) => {
                info!("Build of {} cancelled", self.destination.display());
                self.remove_work_dir().await;
                self.emit(BuildEvent::Cancelled {
                    path: self.destination.clone(),
                });
                BuildState::Cancelled
            }
            Err(StageError { stage, error }) => {
                error!("Build failed while {}: {}", stage, error);
                if stage == BuildStage::Snapshotting {
                    self.remove_work_dir().await;
                } else if let Some(dir) = &self.work_dir {
                    info!("Kept working directory {}", dir.display());
                }
                self.emit(BuildEvent::Failure {
                    path: self.destination.clone(),
                    stage,
                    error: error.clone(),
                });
                BuildState::Failed { stage, error }
            }
        };
        self.state.send_replace(terminal.clone());
        terminal
    }

    async fn run(&mut self) -> Result<Finish, StageError> {
        self.enter(BuildStage::Preparing);
        let toolchain = Toolchain::locate(&self.toolchain_dir).at(BuildStage::Preparing)?;
        if self.is_cancelled() {
            return Ok(Finish::Cancelled);
        }
        let work_dir = self.create_work_dir().at(BuildStage::Preparing)?;
        if self.is_cancelled() {
            return Ok(Finish::Cancelled);
        }

        self.enter(BuildStage::Snapshotting);
        let source = work_dir.join(format!("{}.ufo", self.request.engine.source_name()));
        let request = self.request.clone();
        write_source(request, source.clone(), work_dir.clone())
            .await
            .at(BuildStage::Snapshotting)?;

        self.enter(BuildStage::Converting);
        let binary = source.with_extension("otf");
        let steps = conversion_steps(&source, &binary, &work_dir);
        let total = steps.len();
        self.progress(0, total);
        for (index, (tool, args)) in steps.into_iter().enumerate() {
            if self.is_cancelled() {
                return Ok(Finish::Cancelled);
            }
            debug!("Running {} ({}/{})", tool, index + 1, total);
            let outcome = toolchain
                .run(tool, args, &work_dir, Some(&mut self.cancel))
                .await
                .at(BuildStage::Converting)?;
            if outcome == ToolOutcome::Cancelled {
                return Ok(Finish::Cancelled);
            }
            self.progress(index + 1, total);
        }
        if !binary.is_file() {
            return Err(StageError {
                stage: BuildStage::Converting,
                error: BuildError::compilation(MAKEOTF, "no font was produced"),
            });
        }

        if let Some(units_per_em) = self.request.units_per_em {
            self.enter(BuildStage::PostProcessing);
            correct_units_per_em(&toolchain, &binary, units_per_em, &work_dir)
                .await
                .at(BuildStage::PostProcessing)?;
        }

        self.enter(BuildStage::Installing);
        install(&binary, &self.destination)
            .await
            .at(BuildStage::Installing)?;
        self.remove_work_dir().await;
        Ok(Finish::Installed)
    }

    fn create_work_dir(&mut self) -> Result<PathBuf, BuildError> {
        let root = &self.work_root;
        std::fs::create_dir_all(root).map_err(|e| BuildError::environment(root, e))?;
        let dir = tempfile::Builder::new()
            .prefix("stroketype-")
            .tempdir_in(root)
            .map_err(|e| BuildError::environment(root, e))?
            .keep();
        debug!("Working in {}", dir.display());
        self.work_dir = Some(dir.clone());
        Ok(dir)
    }

    async fn remove_work_dir(&mut self) {
        if let Some(dir) = self.work_dir.take() {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                warn!("Failed to remove working directory {}: {}", dir.display(), e);
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    fn enter(&self, stage: BuildStage) {
        debug!("Build stage: {}", stage);
        self.state.send_replace(BuildState::entering(stage));
        self.emit(BuildEvent::Stage(stage));
    }

    fn progress(&self, completed: usize, total: usize) {
        self.state
            .send_replace(BuildState::Converting { completed, total });
        self.emit(BuildEvent::Progress { completed, total });
    }

    fn emit(&self, event: BuildEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }
}

/// Serialize the engine and write the makeotf side files.
///
/// Inputs are owned: engines are `Send` but not necessarily `Sync`.
async fn write_source<E: OutlineEngine>(
    request: BuildRequest<E>,
    source: PathBuf,
    work_dir: PathBuf,
) -> Result<(), BuildError> {
    tokio::task::spawn_blocking(move || {
        request
            .engine
            .serialize(&source)
            .map_err(|e| BuildError::Serialization(e.to_string()))?;
        write_side_files(&request, &work_dir).map_err(|e| BuildError::Serialization(e.to_string()))
    })
    .await
    .map_err(|e| BuildError::Aborted(e.to_string()))?
}

/// The toolchain invocations turning a UFO into an OpenType binary
fn conversion_steps(source: &Path, binary: &Path, work_dir: &Path) -> Vec<(&'static str, Vec<OsString>)> {
    let os = |s: &str| OsString::from(s);
    let path = |p: &Path| p.as_os_str().to_os_string();
    vec![
        (
            CHECK_OUTLINES,
            vec![os("-e"), os("-all"), os("-decimal"), path(source)],
        ),
        (AUTOHINT, vec![os("-all"), os("-decimal"), path(source)]),
        (
            MAKEOTF,
            vec![
                os("-r"),
                os("-f"),
                path(source),
                os("-o"),
                path(binary),
                os("-ff"),
                path(&work_dir.join(FEATURES_FILE)),
                os("-mf"),
                path(&work_dir.join(FONT_MENU_NAME_DB)),
                os("-gf"),
                path(&work_dir.join(GLYPH_ORDER_DB)),
            ],
        ),
    ]
}
