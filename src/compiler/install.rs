use crate::compiler::error::BuildError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Copy `binary` to `destination`, replacing whatever is there.
///
/// The copy lands in a sibling file first and is renamed into place, so
/// the destination never holds a partial font.
pub async fn install(binary: &Path, destination: &Path) -> Result<(), BuildError> {
    let fail = |e: std::io::Error| BuildError::install(destination, e);

    if let Ok(meta) = fs::symlink_metadata(destination).await {
        debug!("Replacing {}", destination.display());
        if meta.is_dir() {
            fs::remove_dir_all(destination).await.map_err(fail)?;
        } else {
            fs::remove_file(destination).await.map_err(fail)?;
        }
    }
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let staged = staging_path(destination);
    fs::copy(binary, &staged).await.map_err(fail)?;
    if let Err(e) = fs::rename(&staged, destination).await {
        let _ = fs::remove_file(&staged).await;
        return Err(fail(e));
    }
    Ok(())
}

fn staging_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(destination.file_name().unwrap_or_default());
    name.push(".partial");
    destination.with_file_name(name)
}
