//! Child process execution for modules.
//!
//! Commands run with the module's `node_modules/.bin` in front of `PATH`. Several commands can be
//! run with [`execute_all`]: serial jobs one after another, parallel jobs on scoped threads with
//! their output prefixed by the job name.

use indexmap::IndexMap;
use std::ffi::OsString;
use std::fmt::Display;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::{Error, Result};

/// How the standard streams of a child process are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StdioMode {
    /// Child shares the terminal of this process.
    #[default]
    Inherit,
    /// Output is captured and logged: stdout at info, stderr at error.
    Pipe,
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<S, I, A>(program: S, args: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self { program: program.into(), args: args.into_iter().map(Into::into).collect() }
    }

    /// Parses a command line with [`split_command_line`]. `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = split_command_line(line).into_iter();
        let program = parts.next()?;
        Some(Self { program, args: parts.collect() })
    }
}

impl Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Splits a command line on whitespace. A backslash escapes the following character, so
/// `a\ b` is a single argument.
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
                in_word = true;
            }
            c if c.is_whitespace() => {
                if in_word {
                    parts.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        parts.push(current);
    }
    parts
}

/// Unit of [`execute_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Serial(CommandSpec),
    /// Named commands run at the same time.
    Parallel(IndexMap<String, CommandSpec>),
}

impl From<CommandSpec> for Job {
    fn from(spec: CommandSpec) -> Self {
        Job::Serial(spec)
    }
}

#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Working directory. Defaults to the module root.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables.
    pub env: IndexMap<String, String>,
    /// Complete `PATH` for the child. When set, no `node_modules/.bin` is prepended.
    pub path: Option<OsString>,
    /// Defaults to the stdio mode of the module.
    pub stdio: Option<StdioMode>,
    /// [`execute_all`] stops after the first failing job.
    pub stop_on_error: bool,
    /// A failure is returned as an error instead of being recorded only.
    pub throw_on_error: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            env: IndexMap::new(),
            path: None,
            stdio: None,
            stop_on_error: true,
            throw_on_error: true,
        }
    }
}

/// Result of one command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub command: String,
    /// `None` when the process could not be started.
    pub status: Option<ExitStatus>,
    /// Captured output, only in [`StdioMode::Pipe`].
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    /// Reason the process could not be started.
    pub error: Option<String>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.is_some_and(|s| s.success())
    }

    /// Exit code. Processes which could not be started or were killed by a signal report 1.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            Some(status) if status.success() => 0,
            Some(status) => status.code().unwrap_or(1),
            None => 1,
        }
    }

    fn into_error(self) -> Error {
        match self.status {
            Some(status) => Error::CommandExecutionError { command: self.command, status },
            None => Error::Other(anyhow::anyhow!(
                "Cannot execute '{}': {}",
                self.command,
                self.error.unwrap_or_default()
            )),
        }
    }
}

/// Aggregated outcome of several commands.
#[derive(Debug, Clone, Default)]
pub struct CommandResults {
    pub results: Vec<CommandOutput>,
    status: i32,
    error: Option<String>,
}

impl CommandResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `output`. The first failure determines [`CommandResults::status`] and
    /// [`CommandResults::error`].
    pub fn add(&mut self, output: CommandOutput) {
        if !output.success() && self.status == 0 {
            self.status = output.exit_code();
            let failure = || format!("Command '{}' failed", output.command);
            self.error = Some(output.error.clone().unwrap_or_else(failure));
        }
        self.results.push(output);
    }

    /// First non-zero exit code, or 0 when every command succeeded.
    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// `PATH` with `dirs` in front of `base` (the current `PATH` when `base` is absent).
pub fn prepend_path(dirs: &[PathBuf], base: Option<OsString>) -> Result<OsString> {
    let base = base.or_else(|| std::env::var_os("PATH")).unwrap_or_default();
    let entries = dirs.iter().cloned().chain(std::env::split_paths(&base));
    std::env::join_paths(entries).map_err(|e| Error::Other(e.into()))
}

/// Runs `spec` and waits for it. Starting failures are reported in the returned output.
///
/// `bin_dirs` are prepended to `PATH` unless `options.path` is set. `prefix` is put in front of
/// every logged output line.
pub fn run_command(
    spec: &CommandSpec,
    cwd: &Path,
    bin_dirs: &[PathBuf],
    options: &ExecuteOptions,
    stdio: StdioMode,
    prefix: Option<&str>,
) -> Result<CommandOutput> {
    let path = match &options.path {
        Some(path) => path.clone(),
        None => prepend_path(bin_dirs, None)?,
    };
    let cwd = options.cwd.as_deref().unwrap_or(cwd);
    let command_line = spec.to_string();
    log::debug!("Executing '{}' in {}", command_line, cwd.display());

    // The program itself is looked up in the modified PATH too.
    let program = which::which_in(&spec.program, Some(&path), cwd)
        .unwrap_or_else(|_| PathBuf::from(&spec.program));
    let mut command = Command::new(program);
    command.args(&spec.args).current_dir(cwd).env("PATH", &path).envs(&options.env);

    let (stdout_mode, stderr_mode) = match stdio {
        StdioMode::Inherit => (Stdio::inherit(), Stdio::inherit()),
        StdioMode::Pipe => (Stdio::piped(), Stdio::piped()),
    };
    command.stdin(Stdio::inherit()).stdout(stdout_mode).stderr(stderr_mode);
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            log::error!("Cannot execute '{command_line}': {e}");
            return Ok(CommandOutput {
                command: command_line,
                status: None,
                stdout: None,
                stderr: None,
                error: Some(e.to_string()),
            });
        }
    };

    let (stdout, stderr) = match stdio {
        StdioMode::Inherit => (None, None),
        StdioMode::Pipe => {
            let stdout_pipe = child.stdout.take();
            let stderr_pipe = child.stderr.take();
            std::thread::scope(|scope| {
                let stderr_reader =
                    scope.spawn(move || collect_lines(stderr_pipe, log::Level::Error, prefix));
                let stdout = collect_lines(stdout_pipe, log::Level::Info, prefix);
                let stderr = stderr_reader.join().unwrap_or_else(|_| {
                    log::error!("stderr reader of '{command_line}' panicked");
                    None
                });
                (stdout, stderr)
            })
        }
    };

    let status = child.wait()?;
    Ok(CommandOutput {
        command: command_line,
        status: Some(status),
        stdout,
        stderr,
        error: None,
    })
}

/// Reads `pipe` to its end, logging each line at `level`. Invalid UTF-8 is replaced and a read
/// error ends the output early.
fn collect_lines<R: Read>(
    pipe: Option<R>,
    level: log::Level,
    prefix: Option<&str>,
) -> Option<String> {
    let mut reader = BufReader::new(pipe?);
    let mut collected = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                log::warn!("Output truncated: {e}");
                break;
            }
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        match prefix {
            Some(prefix) => log::log!(level, "[{prefix}] {line}"),
            None => log::log!(level, "{line}"),
        }
        collected.push_str(line);
        collected.push('\n');
    }
    Some(collected)
}

/// Runs `jobs` in order. Parallel jobs always capture their output so it can be prefixed.
///
/// # Errors
/// * The first failure when `options.throw_on_error` is set.
pub fn execute_all(
    jobs: &[Job],
    cwd: &Path,
    bin_dirs: &[PathBuf],
    options: &ExecuteOptions,
    stdio: StdioMode,
) -> Result<CommandResults> {
    let mut results = CommandResults::new();

    for job in jobs {
        let outputs = match job {
            Job::Serial(spec) => vec![run_command(spec, cwd, bin_dirs, options, stdio, None)?],
            Job::Parallel(specs) => std::thread::scope(|scope| {
                let handles: Vec<_> = specs
                    .iter()
                    .map(|(name, spec)| {
                        let prefix = Some(name.as_str());
                        scope.spawn(move || {
                            run_command(spec, cwd, bin_dirs, options, StdioMode::Pipe, prefix)
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            Err(Error::Other(anyhow::anyhow!("Command thread panicked")))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })?,
        };

        for output in outputs {
            if !output.success() && options.throw_on_error {
                return Err(output.into_error());
            }
            results.add(output);
        }

        if options.stop_on_error && !results.is_success() {
            break;
        }
    }

    Ok(results)
}

/// Runs a single command, returning a failure as an error when `options.throw_on_error` is set.
pub fn execute(
    spec: &CommandSpec,
    cwd: &Path,
    bin_dirs: &[PathBuf],
    options: &ExecuteOptions,
    stdio: StdioMode,
) -> Result<CommandOutput> {
    let output = run_command(spec, cwd, bin_dirs, options, stdio, None)?;
    if !output.success() && options.throw_on_error {
        return Err(output.into_error());
    }
    Ok(output)
}
