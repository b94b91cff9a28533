//! A Node.js module directory: the nearest ancestor containing a `package.json`.

pub mod command;
pub mod dependency;
mod files;

pub use command::{CommandOutput, CommandResults, CommandSpec, ExecuteOptions, Job, StdioMode};
pub use dependency::{DependencyType, PackageManager};
pub use files::{Content, FileContent, RemoveOptions, WriteOptions};

use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::constants::{BIN_DIR, COMPILER_MODULES, NODE_MODULES, PACKAGE_FILE, TSCONFIG_FILE};
use crate::data_file::{DataFile, DataFileCache, LoadOptions, SaveOptions, SaveStatus};
use crate::error::{Error, Result};
use crate::ext::PathExt;
use crate::format::{parse_file_content, FileFormat};
use crate::ioutils::{find_module_root, normalize_path};
use crate::messages::Message;

#[derive(Debug, Clone, Default)]
pub struct ModuleOptions {
    /// Directory inside the module. Defaults to the current directory.
    pub cwd: Option<PathBuf>,
    /// Whether file operations overwrite existing files unless told otherwise.
    pub overwrite: bool,
    /// Detected from lock files when absent.
    pub package_manager: Option<PackageManager>,
    /// Name used to look up [`Module::config`].
    pub config_name: Option<String>,
    pub command_stdio: StdioMode,
}

#[derive(Debug)]
pub struct Module {
    root: PathBuf,
    overwrite: bool,
    package_manager: PackageManager,
    config_name: Option<String>,
    command_stdio: StdioMode,
    package: DataFile,
    ts_config: Option<Value>,
    config: ProjectConfig,
    files: DataFileCache,
}

impl Module {
    /// Opens the module containing `options.cwd`.
    ///
    /// # Errors
    /// * `Error::CwdNotFound` if the directory does not exist.
    /// * `Error::ModuleRootNotFound` if no `package.json` is found in it or its ancestors.
    pub fn new(mut options: ModuleOptions) -> Result<Self> {
        let cwd = match options.cwd.take() {
            Some(cwd) => cwd,
            None => std::env::current_dir()?,
        };
        let root = find_module_root(&cwd)?;
        Self::at_root(root, options)
    }

    /// Opens the module rooted at `root`, which must contain a `package.json`.
    pub fn from_root<P: AsRef<Path>>(root: P, options: ModuleOptions) -> Result<Self> {
        let root = normalize_path(root.as_ref());
        if !root.join(PACKAGE_FILE).is_file() {
            return Err(Error::NotAModule { path: root.join(PACKAGE_FILE).display().to_string() });
        }
        Self::at_root(root, options)
    }

    fn at_root(root: PathBuf, options: ModuleOptions) -> Result<Self> {
        let package = DataFile::load(
            root.join(PACKAGE_FILE),
            LoadOptions { short_path: Some(PACKAGE_FILE.to_string()), ..LoadOptions::default() },
        )?;
        let ts_config = read_optional_data(&root.join(TSCONFIG_FILE))?;
        let package_manager =
            options.package_manager.unwrap_or_else(|| PackageManager::detect(&root));
        let config = match &options.config_name {
            Some(name) => ProjectConfig::search(name, &root)?,
            None => ProjectConfig::default(),
        };
        log::debug!("Module at {} uses {}", root.display(), package_manager);

        Ok(Self {
            root,
            overwrite: options.overwrite,
            package_manager,
            config_name: options.config_name,
            command_stdio: options.command_stdio,
            package,
            ts_config,
            config,
            files: DataFileCache::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn package_manager(&self) -> PackageManager {
        self.package_manager
    }

    pub fn command_stdio(&self) -> StdioMode {
        self.command_stdio
    }

    pub fn ts_config(&self) -> Option<&Value> {
        self.ts_config.as_ref()
    }

    /// `name` of `package.json`, empty when missing.
    pub fn name(&self) -> &str {
        self.package.get("name").and_then(Value::as_str).unwrap_or_default()
    }

    /// Name without the user scope: `@microsoft/typescript` → `typescript`.
    pub fn name_without_user(&self) -> String {
        name_without_user(self.name())
    }

    /// Name usable as a file name: `@microsoft/typescript` → `microsoft-typescript`.
    pub fn safe_name(&self) -> String {
        safe_name(self.name())
    }

    pub fn is_typescript(&self) -> bool {
        self.ts_config.is_some() || self.package.has("types")
    }

    /// Whether the module is compiled with TypeScript or Babel.
    pub fn is_compiled(&self) -> bool {
        self.is_typescript() || self.has_any_dependency(COMPILER_MODULES, DependencyType::ALL)
    }

    pub fn package(&self) -> &DataFile {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut DataFile {
        &mut self.package
    }

    /// Re-reads `package.json`, dropping unsaved changes.
    pub fn reload_package(&mut self) -> Result<()> {
        self.package.reload()?;
        Ok(())
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Searches the configuration again, e.g. after the configuration file was written.
    pub fn reload_config(&mut self) -> Result<&ProjectConfig> {
        self.config = match &self.config_name {
            Some(name) => ProjectConfig::search(name, &self.root)?,
            None => ProjectConfig::default(),
        };
        Ok(&self.config)
    }

    /// Version range of `module_name` in the first of `types` listing it.
    pub fn dependency_version(&self, module_name: &str, types: &[DependencyType]) -> Option<&str> {
        types
            .iter()
            .filter_map(|t| self.package.get(t.key()))
            .find_map(|dependencies| dependencies.get(module_name))
            .and_then(Value::as_str)
    }

    pub fn has_any_dependency<S: AsRef<str>>(
        &self,
        module_names: &[S],
        types: &[DependencyType],
    ) -> bool {
        module_names.iter().any(|name| self.dependency_version(name.as_ref(), types).is_some())
    }

    /// `if_true` when the module depends on any of `module_names` in any section, else `if_false`.
    pub fn if_any_dependency<S: AsRef<str>, T>(
        &self,
        module_names: &[S],
        if_true: T,
        if_false: T,
    ) -> T {
        if self.has_any_dependency(module_names, DependencyType::ALL) {
            if_true
        } else {
            if_false
        }
    }

    /// Absolute path of `parts` joined below the module root.
    pub fn path_of<I, P>(&self, parts: I) -> PathBuf
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut path = self.root.clone();
        for part in parts {
            path.push(part);
        }
        path.normalize()
    }

    /// `path` relative to the module root. Relative input is taken as relative to the root.
    pub fn relative_path_of<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.root.join(path.as_ref()).relative_to(&self.root)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join(BIN_DIR)
    }

    /// `./`-prefixed path of the `node_modules/.bin` executable `bin`, relative to the current
    /// directory.
    pub fn bin(&self, bin: &str) -> String {
        let cwd = std::env::current_dir().unwrap_or_default();
        let relative = self.bin_dir().join(bin).relative_to(cwd);
        format!(".{}{}", std::path::MAIN_SEPARATOR, relative.display())
    }

    /// Finds the executable `executable` (defaults to `module_name`) of the `module_name` package.
    ///
    /// When the executable is on `PATH` (which includes `node_modules/.bin`) and is the one the
    /// package declares, its bare name is returned. Otherwise the path declared in the package's
    /// `bin` field is returned, `./`-relative when below the current directory.
    ///
    /// # Errors
    /// * `Error::BinNotFound` if neither lookup succeeds.
    pub fn resolve_bin(&self, module_name: &str, executable: Option<&str>) -> Result<String> {
        let name = executable.unwrap_or(module_name);
        let cwd = std::env::current_dir()?;
        let from_path = command::prepend_path(&[self.bin_dir()], None)
            .ok()
            .and_then(|path| which::which_in(name, Some(path), &cwd).ok())
            .and_then(|found| found.canonicalize().ok());

        let declared = self.declared_bin(module_name, executable);
        match (declared, from_path) {
            (Some(declared), Some(found))
                if declared.canonicalize().ok().as_ref() == Some(&found) =>
            {
                Ok(name.to_string())
            }
            (Some(declared), _) => Ok(match declared.strip_prefix(&cwd) {
                Ok(relative) => format!(".{}{}", std::path::MAIN_SEPARATOR, relative.display()),
                Err(_) => declared.display().to_string(),
            }),
            (None, Some(_)) => Ok(name.to_string()),
            (None, None) => Err(Error::BinNotFound {
                executable: name.to_string(),
                module: module_name.to_string(),
            }),
        }
    }

    /// Path of the executable declared in the `bin` field of the installed package `module_name`.
    fn declared_bin(&self, module_name: &str, executable: Option<&str>) -> Option<PathBuf> {
        let package_dir = self.root.join(NODE_MODULES).join(module_name);
        let package_path = package_dir.join(PACKAGE_FILE);
        let content = std::fs::read_to_string(&package_path).ok()?;
        let (_, package) = parse_file_content(&package_path, &content).ok()?;

        let bin = match (package.get("bin")?, executable) {
            (Value::String(bin), None) => bin.as_str(),
            (Value::String(bin), Some(executable)) if bin == executable => bin.as_str(),
            (Value::Object(bins), Some(executable)) => bins.get(executable)?.as_str()?,
            (Value::Object(bins), None) if bins.len() == 1 => bins.values().next()?.as_str()?,
            (Value::Object(bins), None) => bins.get(module_name)?.as_str()?,
            _ => return None,
        };
        Some(package_dir.join(bin).normalize())
    }

    /// Cached data file at `path` below the module root. `package.json` is always the instance
    /// returned by [`Module::package_mut`].
    pub fn data_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        default_format: Option<FileFormat>,
    ) -> Result<&mut DataFile> {
        self.cached_data_file(path.as_ref(), default_format, false)
    }

    /// Like [`Module::data_file`] but re-reads the file from disk.
    pub fn data_file_fresh<P: AsRef<Path>>(
        &mut self,
        path: P,
        default_format: Option<FileFormat>,
    ) -> Result<&mut DataFile> {
        self.cached_data_file(path.as_ref(), default_format, true)
    }

    fn cached_data_file(
        &mut self,
        path: &Path,
        default_format: Option<FileFormat>,
        force_read: bool,
    ) -> Result<&mut DataFile> {
        let absolute = self.path_of([path]);
        if absolute == self.package.path() {
            if force_read {
                self.package.reload()?;
            }
            return Ok(&mut self.package);
        }
        let options = LoadOptions {
            default_format,
            short_path: Some(self.relative_path_of(path).display().to_string()),
            ..LoadOptions::default()
        };
        self.files.get(absolute, options, force_read)
    }

    /// Saves `package.json` and every data file obtained through [`Module::data_file`].
    pub fn save_all(&mut self) -> Result<Vec<(PathBuf, SaveStatus)>> {
        let mut statuses = vec![(self.package.path().to_path_buf(), self.package.save()?)];
        statuses.extend(self.files.save_all(SaveOptions::default())?);
        Ok(statuses)
    }

    /// Runs `bin` in the module root with `node_modules/.bin` on `PATH`.
    pub fn execute<S: AsRef<str>>(
        &self,
        bin: &str,
        args: &[S],
        options: &ExecuteOptions,
    ) -> Result<CommandOutput> {
        let spec = CommandSpec::new(bin, args.iter().map(|a| a.as_ref().to_string()));
        command::execute(&spec, &self.root, &[self.bin_dir()], options, self.stdio_of(options))
    }

    /// Runs a command line split with [`command::split_command_line`].
    pub fn command(&self, line: &str, options: &ExecuteOptions) -> Result<CommandOutput> {
        let spec = CommandSpec::parse(line)
            .ok_or_else(|| Error::Other(anyhow::anyhow!("Empty command line")))?;
        command::execute(&spec, &self.root, &[self.bin_dir()], options, self.stdio_of(options))
    }

    /// Runs serial and parallel jobs, see [`command::execute_all`].
    pub fn execute_all(&self, jobs: &[Job], options: &ExecuteOptions) -> Result<CommandResults> {
        command::execute_all(jobs, &self.root, &[self.bin_dir()], options, self.stdio_of(options))
    }

    fn stdio_of(&self, options: &ExecuteOptions) -> StdioMode {
        options.stdio.unwrap_or(self.command_stdio)
    }

    /// Installs `package` with the module's package manager.
    pub fn install(&self, package: &str, dependency_type: DependencyType) -> Result<CommandOutput> {
        Message::InstallModule { modules: package }.log();
        let args = self.package_manager.install_args(package, dependency_type);
        self.execute(self.package_manager.program(), &args, &ExecuteOptions::default())
    }

    pub fn uninstall(&self, package: &str) -> Result<CommandOutput> {
        Message::UninstallModule { modules: package }.log();
        let args = self.package_manager.uninstall_args(package);
        self.execute(self.package_manager.program(), &args, &ExecuteOptions::default())
    }
}

/// Strips a leading `@user/` scope.
pub fn name_without_user(name: &str) -> String {
    match Regex::new(r"^@.+?/") {
        Ok(re) => re.replace(name, "").into_owned(),
        Err(err) => {
            log::warn!("Invalid user scope pattern: {err}");
            name.to_string()
        }
    }
}

/// Removes the first `@` and replaces the first `/` with `-`.
pub fn safe_name(name: &str) -> String {
    name.replacen('@', "", 1).replacen('/', "-", 1)
}

/// Parsed content of `path`, or `None` when the file does not exist.
fn read_optional_data(path: &Path) -> Result<Option<Value>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(parse_file_content(path, &content)?.1))
}
