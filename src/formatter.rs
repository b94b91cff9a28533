//! Code formatting applied to serialized data files before they are written.
//!
//! Formatting is a pluggable step: [`Passthrough`] leaves the serialized text alone and
//! [`ExternalFormatter`] pipes it through a program such as `prettier`. Indentation used by the
//! serializer itself comes from [`FormatOptions`], which honours prettier rc files.

use serde::Deserialize;
use std::borrow::Cow;
use std::fmt::Debug;
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::constants::{formatting::DEFAULT_TAB_WIDTH, FORMATTER_CONFIG_FILENAMES};
use crate::error::{Error, Result};
use crate::format::{parse_file_content, FileFormat};

/// Indentation settings used when serializing data files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub tab_width: usize,
    pub use_tabs: bool,
    pub final_newline: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { tab_width: DEFAULT_TAB_WIDTH, use_tabs: false, final_newline: true }
    }
}

/// Subset of the prettier configuration relevant to data files.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrettierConfig {
    tab_width: Option<usize>,
    use_tabs: Option<bool>,
}

impl FormatOptions {
    /// Indentation unit for one nesting level.
    pub fn indent(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.tab_width)
        }
    }

    /// Resolves options for a file located in `dir` by searching `dir` and its ancestors for a
    /// prettier configuration file. Unreadable configuration falls back to defaults.
    pub fn resolve<P: AsRef<Path>>(dir: P) -> Self {
        for ancestor in dir.as_ref().ancestors() {
            for config_file_name in FORMATTER_CONFIG_FILENAMES {
                let config_path = ancestor.join(config_file_name);
                if !config_path.is_file() {
                    continue;
                }
                log::debug!("Using formatter configuration {}", config_path.display());
                return match Self::from_config_file(&config_path) {
                    Ok(options) => options,
                    Err(e) => {
                        log::warn!("Ignoring formatter configuration: {e}");
                        Self::default()
                    }
                };
            }
        }
        Self::default()
    }

    fn from_config_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let (_, value) = parse_file_content(path, &content)?;
        let config: PrettierConfig = serde_json::from_value(value)?;
        let defaults = Self::default();
        Ok(Self {
            tab_width: config.tab_width.unwrap_or(defaults.tab_width),
            use_tabs: config.use_tabs.unwrap_or(defaults.use_tabs),
            final_newline: defaults.final_newline,
        })
    }
}

/// Formats serialized content before it is written to `path`.
pub trait CodeFormatter: Debug + Send + Sync {
    fn format(&self, content: &str, path: &Path, format: FileFormat) -> Result<String>;
}

/// Returns content unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl CodeFormatter for Passthrough {
    fn format(&self, content: &str, _path: &Path, _format: FileFormat) -> Result<String> {
        Ok(content.to_string())
    }
}

/// Pipes content through an external program and uses its stdout.
///
/// `{file}` in arguments is replaced with the path of the file being written, e.g.
/// `ExternalFormatter::new("prettier", ["--stdin-filepath", "{file}"])`.
#[derive(Debug, Clone)]
pub struct ExternalFormatter {
    program: String,
    args: Vec<String>,
}

impl ExternalFormatter {
    pub fn new<S, I, A>(program: S, args: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self { program: program.into(), args: args.into_iter().map(Into::into).collect() }
    }
}

impl CodeFormatter for ExternalFormatter {
    fn format(&self, content: &str, path: &Path, _format: FileFormat) -> Result<String> {
        let file = path.display().to_string();
        let args: Vec<String> = self.args.iter().map(|a| a.replace("{file}", &file)).collect();
        log::debug!("Formatting {} with {} {:?}", file, self.program, args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child.stdin.take();
        let mut buffer = Vec::new();
        std::thread::scope(|scope| -> Result<()> {
            if let Some(mut stdin) = stdin {
                scope.spawn(move || {
                    if let Err(e) = stdin.write_all(content.as_bytes()) {
                        log::warn!("Failed to write content to formatter stdin: {e}");
                    }
                });
            }
            if let Some(mut stdout) = child.stdout.take() {
                stdout.read_to_end(&mut buffer)?;
            }
            Ok(())
        })?;

        let status = child.wait()?;
        if !status.success() {
            return Err(Error::FormatterError { program: self.program.clone(), status });
        }

        let decoded = String::from_utf8_lossy(&buffer);
        if matches!(decoded, Cow::Owned(_)) {
            log::warn!(
                "Formatter {} emitted non-UTF8 output; performing lossy conversion",
                self.program
            );
        }
        Ok(decoded.into_owned())
    }
}
