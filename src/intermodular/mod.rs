//! A pair of modules: files and configuration flow from the source module (usually a
//! boilerplate package) into the target module which depends on it.

pub mod copy;
pub mod env;

pub use copy::{CopyEntry, CopyFilter, CopyOptions};
pub use env::{is_env_set, parse_env};

use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::constants::{INIT_CWD, SOURCE_EXTENSIONS};
use crate::data_file::equal::deep_equal;
use crate::error::Result;
use crate::ioutils::find_top_package_dir;
use crate::messages::Message;
use crate::module::{
    command, CommandOutput, CommandResults, ExecuteOptions, FileContent, Job, Module,
    ModuleOptions, StdioMode,
};

#[derive(Debug, Clone, Default)]
pub struct IntermodularOptions {
    /// Directory inside the source module. Defaults to the directory of the running executable.
    pub source: Option<PathBuf>,
    /// Directory inside the target module. Defaults to `INIT_CWD`, then to the top-most package
    /// directory above the current directory, then to the current directory.
    pub target: Option<PathBuf>,
    /// Whether the target module's files are overwritten unless told otherwise.
    pub overwrite: bool,
    pub command_stdio: StdioMode,
}

#[derive(Debug)]
pub struct Intermodular {
    pub source: Module,
    pub target: Module,
    /// Configuration of the source module's tool, as found in the target module.
    pub config: ProjectConfig,
}

impl Intermodular {
    /// Opens the source and target modules.
    ///
    /// # Errors
    /// * `Error::CwdNotFound` or `Error::ModuleRootNotFound` when either module cannot be found.
    pub fn new(options: IntermodularOptions) -> Result<Self> {
        let source_dir = match options.source {
            Some(source) => source,
            None => default_source_dir()?,
        };
        let target_dir = match options.target {
            Some(target) => target,
            None => default_target_dir()?,
        };

        let source = Module::new(ModuleOptions {
            cwd: Some(source_dir),
            command_stdio: options.command_stdio,
            ..ModuleOptions::default()
        })?;
        let target = Module::new(ModuleOptions {
            cwd: Some(target_dir),
            overwrite: options.overwrite,
            command_stdio: options.command_stdio,
            ..ModuleOptions::default()
        })?;
        Self::from_modules(source, target)
    }

    pub fn from_modules(source: Module, target: Module) -> Result<Self> {
        let config = ProjectConfig::search(&source.name_without_user(), target.root())?;
        Message::Construction { source: source.name(), target: target.name() }.log();
        Ok(Self { source, target, config })
    }

    /// Copies `source_path` of the source module to `target_path` (defaults to `source_path`)
    /// of the target module. Returns the copied paths relative to the target module root.
    pub fn copy<P: AsRef<Path>>(
        &self,
        source_path: P,
        target_path: Option<&Path>,
        options: &CopyOptions<'_>,
    ) -> Result<Vec<PathBuf>> {
        let source_path = source_path.as_ref();
        let source = self.source.path_of([source_path]);
        let target = self.target.path_of([target_path.unwrap_or(source_path)]);
        copy::copy_tree(&self.source, &self.target, &source, &target, options)
    }

    /// Runs `bin` in the target module with the `node_modules/.bin` directories of both modules
    /// on `PATH`.
    pub fn execute<S: AsRef<str>>(
        &self,
        bin: &str,
        args: &[S],
        options: &ExecuteOptions,
    ) -> Result<CommandOutput> {
        self.target.execute(bin, args, &self.with_bin_dirs(options)?)
    }

    pub fn command(&self, line: &str, options: &ExecuteOptions) -> Result<CommandOutput> {
        self.target.command(line, &self.with_bin_dirs(options)?)
    }

    pub fn execute_all(&self, jobs: &[Job], options: &ExecuteOptions) -> Result<CommandResults> {
        self.target.execute_all(jobs, &self.with_bin_dirs(options)?)
    }

    fn with_bin_dirs(&self, options: &ExecuteOptions) -> Result<ExecuteOptions> {
        let dirs = [self.target.bin_dir(), self.source.bin_dir()];
        let path = command::prepend_path(&dirs, options.path.clone())?;
        Ok(ExecuteOptions { path: Some(path), ..options.clone() })
    }

    /// Whether `source_path` of the source module and `target_path` of the target module have
    /// the same content.
    ///
    /// Data files are compared by value. JavaScript and TypeScript files are compared ignoring
    /// blank lines and indentation. A missing file is never equivalent.
    pub fn are_equivalent_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source_path: P,
        target_path: Q,
    ) -> Result<bool> {
        let (source_path, target_path) = (source_path.as_ref(), target_path.as_ref());
        let source = self.source.read(source_path)?;
        let target = self.target.read(target_path)?;
        let (Some(source), Some(target)) = (source, target) else {
            return Ok(false);
        };

        Ok(match (source, target) {
            (FileContent::Data(source), FileContent::Data(target)) => {
                deep_equal(source.data(), target.data())
            }
            (FileContent::Text(source), FileContent::Text(target)) => {
                if is_source_code(source_path) && is_source_code(target_path) {
                    strip_layout(&source) == strip_layout(&target)
                } else {
                    source == target
                }
            }
            _ => false,
        })
    }
}

fn default_source_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe.parent().map(Path::to_path_buf).unwrap_or(exe))
}

fn default_target_dir() -> Result<PathBuf> {
    if let Some(init_cwd) = std::env::var_os(INIT_CWD).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(init_cwd));
    }
    let cwd = std::env::current_dir()?;
    Ok(find_top_package_dir(&cwd).unwrap_or(cwd))
}

fn is_source_code(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Non-blank lines without their indentation.
fn strip_layout(code: &str) -> Vec<&str> {
    code.lines().map(str::trim_start).filter(|line| !line.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_blank_lines_and_indentation() {
        let a = "function a() {\n  return 1;\n}\n";
        let b = "function a() {\n\n        return 1;\n}";
        assert_eq!(strip_layout(a), strip_layout(b));
        assert_ne!(strip_layout(a), strip_layout("function a() { return 1; }"));
    }

    #[test]
    fn recognizes_source_code() {
        assert!(is_source_code(Path::new("src/index.ts")));
        assert!(is_source_code(Path::new("a.js")));
        assert!(!is_source_code(Path::new("README.md")));
        assert!(!is_source_code(Path::new("Makefile")));
    }
}
