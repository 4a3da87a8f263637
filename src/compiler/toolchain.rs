//! The external font toolchain
//!
//! Compilation is delegated to a directory of command line tools. Each
//! tool runs with that directory appended to `PATH` and `FDK_EXE` set to
//! it, since the tools look each other up through both.

use crate::compiler::error::BuildError;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, warn};

pub const CHECK_OUTLINES: &str = "checkOutlinesUFO";
pub const AUTOHINT: &str = "autohint";
pub const MAKEOTF: &str = "makeotf";
pub const TTX: &str = "ttx";

/// Tools a build cannot start without
pub const REQUIRED_TOOLS: [&str; 4] = [CHECK_OUTLINES, AUTOHINT, MAKEOTF, TTX];

/// How a tool invocation ended, when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ToolOutcome {
    Finished,
    Cancelled,
}

/// A verified toolchain directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    dir: PathBuf,
}

impl Toolchain {
    /// `<data_dir>/stroketype/FDK/Tools`
    pub fn default_location() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("stroketype").join("FDK").join("Tools"))
    }

    /// Verify that `dir` holds every required tool
    pub fn locate(dir: impl AsRef<Path>) -> Result<Self, BuildError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(BuildError::environment(dir, "not a directory"));
        }
        let toolchain = Self {
            dir: dir.to_path_buf(),
        };
        let missing = toolchain.missing_tools();
        if !missing.is_empty() {
            return Err(BuildError::environment(
                dir,
                format!("missing {}", missing.join(", ")),
            ));
        }
        Ok(toolchain)
    }

    /// Whether a build could start with the toolchain at `dir`
    pub fn is_available(dir: impl AsRef<Path>) -> bool {
        Self::locate(dir).is_ok()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Required tools that are absent or not executable
    pub fn missing_tools(&self) -> Vec<&'static str> {
        REQUIRED_TOOLS
            .into_iter()
            .filter(|tool| !is_executable(&self.tool_path(tool)))
            .collect()
    }

    fn tool_path(&self, tool: &str) -> PathBuf {
        self.dir.join(tool)
    }

    fn search_path(&self) -> OsString {
        let mut paths: Vec<PathBuf> = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        paths.push(self.dir.clone());
        std::env::join_paths(paths).unwrap_or_else(|_| self.dir.clone().into_os_string())
    }

    fn command<I, S>(&self, tool: &str, args: I, cwd: &Path) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(self.tool_path(tool));
        command
            .args(args)
            .current_dir(cwd)
            .env("PATH", self.search_path())
            .env("FDK_EXE", &self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group, so cancellation also reaches helpers the tool starts
        #[cfg(unix)]
        command.process_group(0);
        command
    }

    /// Run one tool to completion.
    ///
    /// With a cancellation receiver, the tool and any helpers it started
    /// are killed as soon as `true` is published. A non-zero exit becomes a compilation error carrying
    /// the tool's stderr.
    pub(crate) async fn run<I, S>(
        &self,
        tool: &str,
        args: I,
        cwd: &Path,
        cancel: Option<&mut watch::Receiver<bool>>,
    ) -> Result<ToolOutcome, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut child = self
            .command(tool, args, cwd)
            .spawn()
            .map_err(|e| BuildError::compilation(tool, format!("failed to start: {e}")))?;
        debug!("Started {} (pid {:?})", tool, child.id());

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(log_lines(tool.to_string(), stdout));
        }
        let stderr = child.stderr.take().map(|stderr| tokio::spawn(read_all(stderr)));

        let status = tokio::select! {
            status = child.wait() => {
                status.map_err(|e| BuildError::compilation(tool, e))?
            }
            _ = cancelled(cancel) => {
                debug!("Stopping {} on cancellation", tool);
                stop(&mut child, tool).await;
                return Ok(ToolOutcome::Cancelled);
            }
        };

        if status.success() {
            return Ok(ToolOutcome::Finished);
        }
        let stderr = match stderr {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        let message = match stderr.trim() {
            "" => format!("exited with {status}"),
            text => text.to_string(),
        };
        Err(BuildError::compilation(tool, message))
    }
}

/// Kill the tool's process group, then the tool itself, and reap it
async fn stop(child: &mut Child, tool: &str) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            let result = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
            if result != 0 {
                debug!(
                    "Failed to signal process group of {}: {}",
                    tool,
                    std::io::Error::last_os_error()
                );
            }
        }
    }
    if let Err(e) = child.kill().await {
        warn!("Failed to stop {}: {}", tool, e);
    }
}

/// Resolves once `true` is published; never resolves without a receiver
/// or after the sender is gone.
async fn cancelled(cancel: Option<&mut watch::Receiver<bool>>) {
    match cancel {
        Some(rx) => {
            if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

async fn log_lines(tool: String, stream: impl AsyncRead + Unpin) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "stroketype::toolchain", "{}: {}", tool, line);
    }
}

async fn read_all(mut stream: impl AsyncRead + Unpin) -> String {
    let mut bytes = Vec::new();
    if let Err(e) = stream.read_to_end(&mut bytes).await {
        debug!("Failed to read tool stderr: {}", e);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
