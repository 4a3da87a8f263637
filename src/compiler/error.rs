use std::path::PathBuf;
use thiserror::Error;

/// Why a build did not produce a font
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("toolchain unavailable at {path}: {reason}")]
    Environment { path: PathBuf, reason: String },

    #[error("failed to write source for compilation: {0}")]
    Serialization(String),

    #[error("{tool} failed: {message}")]
    Compilation { tool: String, message: String },

    #[error("failed to install font at {path}: {message}")]
    Install { path: PathBuf, message: String },

    #[error("a build for {0} is already in progress")]
    InProgress(PathBuf),

    #[error("build task stopped unexpectedly: {0}")]
    Aborted(String),
}

impl BuildError {
    pub(crate) fn environment(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        BuildError::Environment {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn compilation(tool: &str, message: impl ToString) -> Self {
        BuildError::Compilation {
            tool: tool.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn install(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        BuildError::Install {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
