use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::AppPathsError;

/// Directory containing the running executable.
///
/// # Errors
/// Returns [`AppPathsError::ExecutableDirUnavailable`] when the executable
/// path cannot be resolved or has no parent.
pub fn installation_dir() -> Result<PathBuf, AppPathsError> {
    let exe = std::env::current_exe().map_err(|_| AppPathsError::ExecutableDirUnavailable)?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or(AppPathsError::ExecutableDirUnavailable)
}

/// Pick the directory a downloaded build is unpacked into.
///
/// A caller-supplied directory wins when it exists or can be created.
/// Otherwise the updater's own installation directory is used.
///
/// # Errors
/// Returns an error only when the fallback directory is needed and cannot be
/// determined.
pub fn resolve_extraction_root(custom: Option<&Path>) -> Result<PathBuf, AppPathsError> {
    select_extraction_root(custom, installation_dir)
}

fn select_extraction_root<F>(custom: Option<&Path>, fallback: F) -> Result<PathBuf, AppPathsError>
where
    F: FnOnce() -> Result<PathBuf, AppPathsError>,
{
    let Some(preferred) = custom.filter(|path| !path.as_os_str().is_empty()) else {
        return fallback();
    };

    if preferred.is_dir() {
        return Ok(preferred.to_path_buf());
    }

    match std::fs::create_dir_all(preferred) {
        Ok(()) if preferred.is_dir() => {
            info!("Created directory: {}", preferred.display());
            return Ok(preferred.to_path_buf());
        }
        Ok(()) => warn!("{} exists but is not a directory", preferred.display()),
        Err(error) => warn!(
            "Could not create/access directory {}: {error}",
            preferred.display()
        ),
    }

    let fallback_dir = fallback()?;
    warn!("Using fallback directory: {}", fallback_dir.display());
    Ok(fallback_dir)
}
