use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::{NODE_MODULES, PACKAGE_FILE};
use crate::error::{Error, Result};
use crate::ext::PathExt;

/// Absolute form of `path`, resolved against the current directory when relative.
pub fn to_absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

/// Absolute, lexically normalized form of `path`. Used as identity of files.
pub fn normalize_path(path: &Path) -> PathBuf {
    to_absolute(path).normalize()
}

pub fn create_dir_all<P: AsRef<Path>>(dest_path: P) -> Result<()> {
    let dest_path = dest_path.as_ref();
    std::fs::create_dir_all(dest_path).map_err(Error::IoError)
}

pub fn write_file<P: AsRef<Path>>(content: &str, dest_path: P) -> Result<()> {
    let abs_path = to_absolute(dest_path.as_ref());
    if let Some(parent) = abs_path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(abs_path, content).map_err(Error::IoError)
}

pub fn copy_file<P: AsRef<Path>, Q: AsRef<Path>>(source_path: P, dest_path: Q) -> Result<()> {
    let abs_dest = to_absolute(dest_path.as_ref());
    if let Some(parent) = abs_dest.parent() {
        create_dir_all(parent)?;
    }
    std::fs::copy(source_path.as_ref(), abs_dest).map(|_| ()).map_err(Error::IoError)
}

/// Nearest directory at or above `cwd` containing a `package.json`.
///
/// # Errors
/// * `Error::CwdNotFound` if `cwd` does not exist.
/// * `Error::ModuleRootNotFound` if no ancestor contains a `package.json`.
pub fn find_module_root<P: AsRef<Path>>(cwd: P) -> Result<PathBuf> {
    let cwd = normalize_path(cwd.as_ref());
    if !cwd.exists() {
        return Err(Error::CwdNotFound { cwd: cwd.display().to_string() });
    }
    cwd.ancestors()
        .find(|dir| dir.join(PACKAGE_FILE).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::ModuleRootNotFound { cwd: cwd.display().to_string() })
}

/// Top-most directory above `path` containing a `package.json`, skipping directories inside
/// `node_modules`. Used to find the project an installed module is being installed into.
pub fn find_top_package_dir<P: AsRef<Path>>(path: P) -> Option<PathBuf> {
    let path = normalize_path(path.as_ref());
    path.ancestors()
        .filter(|dir| !dir.components().any(|c| c.as_os_str() == NODE_MODULES))
        .filter(|dir| dir.join(PACKAGE_FILE).is_file())
        .last()
        .map(Path::to_path_buf)
}

/// Removes empty directories below `dir` (deepest first) and returns them. `dir` itself is kept.
pub fn remove_empty_dirs<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut removed = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).contents_first(true) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if std::fs::read_dir(entry.path())?.next().is_none() {
            std::fs::remove_dir(entry.path())?;
            log::debug!("Removed empty directory {}", entry.path().display());
            removed.push(entry.path().to_path_buf());
        }
    }
    Ok(removed)
}
