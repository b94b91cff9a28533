//! File operations below a module root. Refused operations are logged, not returned as errors.

use serde_json::Value;
use std::path::Path;

use super::Module;
use crate::data_file::equal::deep_equal;
use crate::data_file::{DataFile, LoadOptions};
use crate::error::Result;
use crate::format::{parse_file_content, parse_string, serialize, FileFormat};
use crate::formatter::FormatOptions;
use crate::ioutils::{create_dir_all, remove_empty_dirs, write_file};
use crate::messages::Message;

/// Expected or written file content: text compared verbatim, or a tree compared deeply with
/// the parsed file.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Data(Value),
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Value> for Content {
    fn from(data: Value) -> Self {
        Content::Data(data)
    }
}

/// File read by [`Module::read`]: a data file when the content is a JSON or YAML mapping or
/// sequence, text otherwise.
#[derive(Debug)]
pub enum FileContent {
    Data(DataFile),
    Text(String),
}

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Format of [`Content::Data`]. Inferred from the extension, JSON when unknown.
    pub format: Option<FileFormat>,
    /// Defaults to the overwrite setting of the module.
    pub overwrite: Option<bool>,
    /// Write only if the existing file equals this content.
    pub if_equal: Option<Content>,
    /// Write only if the existing file differs from this content.
    pub if_not_equal: Option<Content>,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    pub if_equal: Option<Content>,
    pub if_not_equal: Option<Content>,
}

/// Why a file operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refusal {
    Exists,
    NotEqual,
    Equal,
}

impl Refusal {
    fn message<'a>(&self, op: &'a str, file: &'a str) -> Message<'a> {
        match self {
            Refusal::Exists => Message::FileNotOpExists { op, file },
            Refusal::NotEqual => Message::FileNotOpIsEqual { op, file },
            Refusal::Equal => Message::FileNotOpIsNotEqual { op, file },
        }
    }
}

impl Module {
    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.path_of([path]).exists()
    }

    pub fn is_directory<P: AsRef<Path>>(&self, path: P) -> bool {
        self.path_of([path]).is_dir()
    }

    pub fn read_raw<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        Ok(std::fs::read_to_string(self.path_of([path]))?)
    }

    /// Reads `path`. `None` when it does not exist or is a directory.
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<Option<FileContent>> {
        let absolute = self.path_of([path.as_ref()]);
        if !absolute.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&absolute)?;
        let is_data = matches!(parse_string(&content), Ok((_, Value::Object(_) | Value::Array(_))));
        if !is_data {
            return Ok(Some(FileContent::Text(content)));
        }
        let options = LoadOptions {
            short_path: Some(self.relative_path_of(path).display().to_string()),
            ..LoadOptions::default()
        };
        Ok(Some(FileContent::Data(DataFile::load(absolute, options)?)))
    }

    /// Whether the file at `path` equals `content`. A missing file equals nothing.
    pub fn is_equal<P: AsRef<Path>, C: Into<Content>>(&self, path: P, content: C) -> Result<bool> {
        let absolute = self.path_of([path]);
        if !absolute.is_file() {
            return Ok(false);
        }
        let existing = std::fs::read_to_string(&absolute)?;
        Ok(match content.into() {
            Content::Text(text) => existing == text,
            Content::Data(data) => match parse_file_content(&absolute, &existing) {
                Ok((_, parsed)) => deep_equal(&parsed, &data),
                Err(e) => {
                    log::debug!("{e}");
                    false
                }
            },
        })
    }

    /// Reason to leave the existing file at `path` alone. Equality conditions take precedence
    /// over `overwrite`.
    fn refusal(
        &self,
        path: &Path,
        overwrite: bool,
        if_equal: Option<&Content>,
        if_not_equal: Option<&Content>,
    ) -> Result<Option<Refusal>> {
        let exists = self.exists(path);
        if let Some(expected) = if_equal {
            let refused = exists && !self.is_equal(path, expected.clone())?;
            return Ok(refused.then_some(Refusal::NotEqual));
        }
        if let Some(unexpected) = if_not_equal {
            let refused = exists && self.is_equal(path, unexpected.clone())?;
            return Ok(refused.then_some(Refusal::Equal));
        }
        Ok((exists && !overwrite).then_some(Refusal::Exists))
    }

    /// Writes `content` to `path`, creating parent directories. Data is serialized with the
    /// indentation of the nearest prettier configuration.
    ///
    /// Returns whether the file was written.
    pub fn write<P: AsRef<Path>, C: Into<Content>>(
        &mut self,
        path: P,
        content: C,
        options: WriteOptions,
    ) -> Result<bool> {
        let path = path.as_ref();
        let file = path.display().to_string();
        let overwrite = options.overwrite.unwrap_or(self.overwrite);
        if let Some(refusal) =
            self.refusal(path, overwrite, options.if_equal.as_ref(), options.if_not_equal.as_ref())?
        {
            refusal.message("written", &file).log();
            return Ok(false);
        }

        let absolute = self.path_of([path]);
        let text = match content.into() {
            Content::Text(text) => text,
            Content::Data(data) => {
                let format = options
                    .format
                    .or_else(|| FileFormat::from_path(&absolute))
                    .unwrap_or_default();
                let directory = absolute.parent().unwrap_or(self.root());
                serialize(&data, format, &FormatOptions::resolve(directory))?
            }
        };
        write_file(&text, &absolute)?;
        self.files.invalidate(&absolute);
        Message::FileOp { op: "written", file: &file }.log();
        Ok(true)
    }

    /// Removes the file or directory at `path`. Returns whether anything was removed.
    pub fn remove<P: AsRef<Path>>(&mut self, path: P, options: RemoveOptions) -> Result<bool> {
        let path = path.as_ref();
        let file = path.display().to_string();
        if let Some(refusal) =
            self.refusal(path, true, options.if_equal.as_ref(), options.if_not_equal.as_ref())?
        {
            refusal.message("deleted", &file).log();
            return Ok(false);
        }

        let absolute = self.path_of([path]);
        if absolute.is_dir() {
            std::fs::remove_dir_all(&absolute)?;
        } else if absolute.exists() {
            std::fs::remove_file(&absolute)?;
        }
        self.files.invalidate(&absolute);
        Message::FileOp { op: "deleted", file: &file }.log();
        Ok(true)
    }

    /// Renames `old_path` to `new_path`. An existing target is kept unless overwriting is
    /// allowed (defaults to the module setting). Returns whether the rename happened.
    pub fn rename<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        old_path: P,
        new_path: Q,
        overwrite: Option<bool>,
    ) -> Result<bool> {
        let (old_path, new_path) = (old_path.as_ref(), new_path.as_ref());
        let source = old_path.display().to_string();
        let target = new_path.display().to_string();

        if self.exists(new_path) && !overwrite.unwrap_or(self.overwrite) {
            Message::FileNotRenamedExists { source: &source, target: &target }.log();
            return Ok(false);
        }

        let (old_absolute, new_absolute) = (self.path_of([old_path]), self.path_of([new_path]));
        if let Some(parent) = new_absolute.parent() {
            create_dir_all(parent)?;
        }
        std::fs::rename(&old_absolute, &new_absolute)?;
        self.files.invalidate(&old_absolute);
        self.files.invalidate(&new_absolute);
        Message::FileRenamed { source: &source, target: &target }.log();
        Ok(true)
    }

    pub fn create_directory<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        create_dir_all(self.path_of([path]))
    }

    /// Removes empty directories below `path` and returns their paths relative to the root.
    pub fn remove_empty_dirs<P: AsRef<Path>>(&self, path: P) -> Result<Vec<std::path::PathBuf>> {
        let removed = remove_empty_dirs(self.path_of([path]))?;
        Ok(removed.iter().map(|dir| self.relative_path_of(dir)).collect())
    }
}
