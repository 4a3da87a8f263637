//! Asynchronous font builds
//!
//! A build snapshots the model, writes the stroked source into a private
//! working directory, drives the external toolchain over it and installs
//! the resulting binary. Each build runs as a tokio task and reports
//! through a [`BuildHandle`]: an event stream, a state watch and a
//! cancellation switch.

pub mod error;
pub mod features;
pub mod install;
pub mod pipeline;
pub mod toolchain;
pub mod units_per_em;


pub use error::BuildError;
pub use pipeline::BuildPipeline;
pub use toolchain::Toolchain;

use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Non-terminal phases of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStage {
    Preparing,
    Snapshotting,
    Converting,
    PostProcessing,
    Installing,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Preparing => "preparing",
            BuildStage::Snapshotting => "snapshotting",
            BuildStage::Converting => "converting",
            BuildStage::PostProcessing => "post-processing",
            BuildStage::Installing => "installing",
        };
        f.write_str(name)
    }
}

/// Latest known state of a build
#[derive(Debug, Clone, PartialEq)]
pub enum BuildState {
    Idle,
    Preparing,
    Snapshotting,
    Converting { completed: usize, total: usize },
    PostProcessing,
    Installing,
    Done(PathBuf),
    Failed { stage: BuildStage, error: BuildError },
    Cancelled,
}

impl BuildState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BuildState::Done(_) | BuildState::Failed { .. } | BuildState::Cancelled
        )
    }

    /// Stage this state belongs to, if it is a working state
    pub fn stage(&self) -> Option<BuildStage> {
        match self {
            BuildState::Preparing => Some(BuildStage::Preparing),
            BuildState::Snapshotting => Some(BuildStage::Snapshotting),
            BuildState::Converting { .. } => Some(BuildStage::Converting),
            BuildState::PostProcessing => Some(BuildStage::PostProcessing),
            BuildState::Installing => Some(BuildStage::Installing),
            _ => None,
        }
    }

    fn entering(stage: BuildStage) -> Self {
        match stage {
            BuildStage::Preparing => BuildState::Preparing,
            BuildStage::Snapshotting => BuildState::Snapshotting,
            BuildStage::Converting => BuildState::Converting {
                completed: 0,
                total: 0,
            },
            BuildStage::PostProcessing => BuildState::PostProcessing,
            BuildStage::Installing => BuildState::Installing,
        }
    }
}

/// Something observers of a build may want to hear about
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    Stage(BuildStage),
    Progress { completed: usize, total: usize },
    Success { path: PathBuf },
    Failure { path: PathBuf, stage: BuildStage, error: BuildError },
    Cancelled { path: PathBuf },
}

impl BuildEvent {
    /// Success, failure and cancellation end a build
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BuildEvent::Success { .. } | BuildEvent::Failure { .. } | BuildEvent::Cancelled { .. }
        )
    }
}

/// Caller's side of one running build
#[derive(Debug)]
pub struct BuildHandle {
    destination: PathBuf,
    events: mpsc::UnboundedReceiver<BuildEvent>,
    state: watch::Receiver<BuildState>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<BuildState>,
}

impl BuildHandle {
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Ask the build to stop. Honored until post-processing begins.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn state(&self) -> BuildState {
        self.state.borrow().clone()
    }

    /// Independent receiver for state changes
    pub fn subscribe(&self) -> watch::Receiver<BuildState> {
        self.state.clone()
    }

    /// Next event, or `None` once the build has finished and every event
    /// has been received.
    pub async fn next_event(&mut self) -> Option<BuildEvent> {
        self.events.recv().await
    }

    /// Wait for the build to finish and return its terminal state
    pub async fn wait(self) -> BuildState {
        let BuildHandle { state, task, .. } = self;
        match task.await {
            Ok(terminal) => terminal,
            Err(e) => BuildState::Failed {
                stage: state.borrow().stage().unwrap_or(BuildStage::Preparing),
                error: BuildError::Aborted(e.to_string()),
            },
        }
    }
}
