//! Copying files and directory trees from the source module to the target module.

use globset::{Glob, GlobSet, GlobSetBuilder};
use log::Level;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::ext::PathExt;
use crate::ioutils::{copy_file, create_dir_all};
use crate::messages::Message;
use crate::module::{FileContent, Module};

/// Entry offered to a [`CopyFilter`] before it is copied.
#[derive(Debug)]
pub struct CopyEntry<'e> {
    pub source: &'e Path,
    pub target: &'e Path,
    pub source_is_dir: bool,
    pub target_is_dir: bool,
    /// Content of the source file; `None` for directories.
    pub source_content: Option<&'e FileContent>,
    /// Content of the existing target file, if any.
    pub target_content: Option<&'e FileContent>,
}

/// Decides whether an entry is copied. Rejecting a directory skips everything below it.
pub type CopyFilter<'a> = dyn Fn(&CopyEntry<'_>) -> bool + 'a;

#[derive(Default)]
pub struct CopyOptions<'a> {
    /// Replace existing target files. Defaults to the overwrite setting of the target module.
    pub overwrite: Option<bool>,
    pub filter: Option<Box<CopyFilter<'a>>>,
    /// Globs, relative to the copied source, of entries skipped without a log message.
    pub ignore: Vec<String>,
    /// Copy the files symbolic links point to instead of the links.
    pub dereference: bool,
    pub preserve_timestamps: bool,
    /// Leave directories out of the returned paths.
    pub exclude_dir_from_return: bool,
}

impl Debug for CopyOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopyOptions")
            .field("overwrite", &self.overwrite)
            .field("filter", &self.filter.as_ref().map(|_| "Fn"))
            .field("ignore", &self.ignore)
            .field("dereference", &self.dereference)
            .field("preserve_timestamps", &self.preserve_timestamps)
            .field("exclude_dir_from_return", &self.exclude_dir_from_return)
            .finish()
    }
}

/// Log entries held back until the copy has finished.
#[derive(Debug, Default)]
struct CopyLog {
    entries: Vec<(Level, String)>,
}

impl CopyLog {
    fn push(&mut self, message: Message<'_>) {
        self.entries.push(message.entry());
    }

    /// Entries to emit. After a failure the last entry announced an operation which did not
    /// complete, so it is dropped.
    fn finish(mut self, failed: bool) -> Vec<(Level, String)> {
        if failed {
            self.entries.pop();
        }
        self.entries
    }

    fn flush(self, failed: bool) {
        for (level, text) in self.finish(failed) {
            log::log!(level, "{text}");
        }
    }
}

/// Target of copying `source` to `target`: a file copied onto an existing directory lands
/// inside it.
pub fn copy_target(source: &Path, target: &Path) -> PathBuf {
    let from_file_to_directory = !source.is_dir() && target.is_dir();
    match source.file_name() {
        Some(name) if from_file_to_directory => target.join(name),
        _ => target.to_path_buf(),
    }
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        log::debug!("Adding ignore pattern: {pattern} to globset");
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn display_relative(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        ".".to_string()
    } else {
        path.display().to_string()
    }
}

/// Copies `source` (absolute, inside `source_module`) to `target` (absolute, inside
/// `target_module`) and returns the copied paths relative to the target module root.
///
/// # Errors
/// * `Error::CopyTargetError` when a directory would replace an existing file.
/// * `Error::IoError` or `Error::WalkDirError` when copying fails. Entries copied before the
///   failure stay in place.
pub fn copy_tree(
    source_module: &Module,
    target_module: &Module,
    source: &Path,
    target: &Path,
    options: &CopyOptions<'_>,
) -> Result<Vec<PathBuf>> {
    let target = copy_target(source, target);
    if source == target {
        return Ok(Vec::new());
    }
    if source.is_dir() && target.is_file() {
        return Err(Error::CopyTargetError {
            source_path: source.display().to_string(),
            target: target.display().to_string(),
        });
    }

    let overwrite = options.overwrite.unwrap_or(target_module.overwrite());
    let ignore = build_ignore_set(&options.ignore)?;
    let mut log = CopyLog::default();
    let mut copied = Vec::new();

    let result = copy_entries(
        source_module,
        target_module,
        source,
        &target,
        options,
        overwrite,
        &ignore,
        &mut log,
        &mut copied,
    );
    log.flush(result.is_err());
    result.map(|_| copied)
}

#[allow(clippy::too_many_arguments)]
fn copy_entries(
    source_module: &Module,
    target_module: &Module,
    source: &Path,
    target: &Path,
    options: &CopyOptions<'_>,
    overwrite: bool,
    ignore: &GlobSet,
    log: &mut CopyLog,
    copied: &mut Vec<PathBuf>,
) -> Result<()> {
    let mut entries = WalkDir::new(source)
        .follow_links(options.dereference)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = entries.next() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let source_path = entry.path();
        let source_is_dir = entry.file_type().is_dir();

        if !relative.as_os_str().is_empty() && ignore.is_match(relative) {
            log::debug!("Ignoring {}", source_path.display());
            if source_is_dir {
                entries.skip_current_dir();
            }
            continue;
        }

        let target_path = if relative.as_os_str().is_empty() {
            target.to_path_buf()
        } else {
            target.join(relative)
        };
        let target_exists = target_path.exists();
        let target_is_dir = target_path.is_dir();

        let relative_source = source_module.relative_path_of(source_path);
        let relative_target = target_module.relative_path_of(&target_path);
        let pair = format!(
            "'{}' → '{}'",
            display_relative(&relative_source),
            display_relative(&relative_target)
        );

        let mut rejection = None;
        if target_exists && !target_is_dir && !overwrite {
            rejection = Some("Exists");
        }
        if let Some(filter) = &options.filter {
            let source_content =
                if source_is_dir { None } else { source_module.read(&relative_source)? };
            let target_content =
                if target_is_dir { None } else { target_module.read(&relative_target)? };
            let candidate = CopyEntry {
                source: source_path,
                target: &target_path,
                source_is_dir,
                target_is_dir,
                source_content: source_content.as_ref(),
                target_content: target_content.as_ref(),
            };
            if !filter(&candidate) {
                rejection = Some("Filtered");
            }
        }

        if let Some(reason) = rejection {
            log.push(Message::FileNotCopied { reason, pair: &pair });
            if source_is_dir {
                entries.skip_current_dir();
            }
            continue;
        }

        if source_is_dir {
            log.push(Message::CopyDirectories { pair: &pair });
            create_dir_all(&target_path)?;
        } else {
            log.push(Message::FileCopied { pair: &pair });
            copy_entry(source_path, &target_path, entry.path_is_symlink() && !options.dereference)?;
        }
        if options.preserve_timestamps && !target_path.is_symlink() {
            preserve_modified_time(source_path, &target_path)?;
        }

        if !source_is_dir || !options.exclude_dir_from_return {
            copied.push(relative_target.normalize());
        }
    }
    Ok(())
}

fn copy_entry(source: &Path, target: &Path, as_link: bool) -> Result<()> {
    if as_link {
        copy_link(source, target)
    } else {
        copy_file(source, target)
    }
}

#[cfg(unix)]
fn copy_link(source: &Path, target: &Path) -> Result<()> {
    let link = std::fs::read_link(source)?;
    if target.symlink_metadata().is_ok() {
        std::fs::remove_file(target)?;
    }
    if let Some(parent) = target.parent() {
        create_dir_all(parent)?;
    }
    std::os::unix::fs::symlink(link, target)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_link(source: &Path, target: &Path) -> Result<()> {
    copy_file(source, target)
}

fn preserve_modified_time(source: &Path, target: &Path) -> Result<()> {
    let modified = std::fs::metadata(source)?.modified()?;
    if target.is_dir() {
        return Ok(());
    }
    let file = std::fs::OpenOptions::new().write(true).open(target)?;
    file.set_modified(modified)?;
    Ok(())
}
