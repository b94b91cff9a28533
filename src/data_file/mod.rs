//! In-memory JSON/YAML documents with conditional, tracked modification.
//!
//! A [`DataFile`] is loaded from disk (or created empty when the file does not exist), modified
//! through [`DataFile::set`], [`DataFile::delete`] and [`DataFile::assign`] and their conditional
//! `_if` variants, and written back with [`DataFile::save`]. Saving skips the write when the
//! serialized content is equivalent to what is on disk.

pub mod cache;
pub mod condition;
pub mod equal;
pub mod order;
pub mod path;
mod tracker;

pub use cache::DataFileCache;
pub use condition::{ConditionKind, Evaluation, ModifyCondition};
pub use path::DataPath;
pub use tracker::ModifiedKeys;

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::format::{parse_file_content, serialize, FileFormat};
use crate::formatter::{CodeFormatter, FormatOptions, Passthrough};
use crate::ioutils::{to_absolute, write_file};
use crate::messages::Message;
use equal::deep_equal;
use tracker::MutationTracker;

/// Options for [`DataFile::load`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Format used when it cannot be inferred from the extension nor from existing content.
    pub default_format: Option<FileFormat>,
    /// Name used in log messages instead of the file name.
    pub short_path: Option<String>,
    /// Indentation settings. Resolved from prettier configuration next to the file when absent.
    pub format_options: Option<FormatOptions>,
    pub formatter: Option<Arc<dyn CodeFormatter>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Write even when the content on disk is equivalent.
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Written,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct DataFile {
    path: PathBuf,
    short_path: String,
    format: FileFormat,
    data: Value,
    format_options: FormatOptions,
    formatter: Arc<dyn CodeFormatter>,
    structurally_modified: bool,
    tracker: MutationTracker,
}

fn empty_document() -> Value {
    Value::Object(Map::new())
}

/// Reads the document at `path`. Missing and blank files yield an empty mapping in `fallback`
/// format; otherwise the format is the one the content parsed as.
fn read_document(path: &Path, fallback: FileFormat) -> Result<(FileFormat, Value)> {
    if !path.exists() {
        return Ok((fallback, empty_document()));
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok((fallback, empty_document()));
    }
    let (parsed_format, data) = parse_file_content(path, &content)?;
    let data = if data.is_null() { empty_document() } else { data };
    Ok((parsed_format, data))
}

impl DataFile {
    /// Loads the data file at `path`.
    ///
    /// # Errors
    /// * `Error::ParseError` when the file exists but is neither JSON nor YAML.
    /// * `Error::IoError` when the file cannot be read.
    pub fn load<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self> {
        let path = to_absolute(path.as_ref());
        let fallback =
            FileFormat::from_path(&path).or(options.default_format).unwrap_or_default();
        let (format, data) = read_document(&path, fallback)?;
        log::debug!("Loaded {} as {}", path.display(), format);

        let format_options = options.format_options.unwrap_or_else(|| {
            FormatOptions::resolve(path.parent().unwrap_or_else(|| Path::new(".")))
        });
        let short_path = options.short_path.unwrap_or_else(|| short_name(&path));

        Ok(Self {
            path,
            short_path,
            format,
            data,
            format_options,
            formatter: options.formatter.unwrap_or_else(|| Arc::new(Passthrough)),
            structurally_modified: false,
            tracker: MutationTracker::default(),
        })
    }

    /// Creates a data file from an in-memory tree. Nothing is read from `path`.
    pub fn from_data<P: AsRef<Path>>(path: P, data: Value, format: FileFormat) -> Self {
        let path = to_absolute(path.as_ref());
        Self {
            short_path: short_name(&path),
            path,
            format,
            data,
            format_options: FormatOptions::default(),
            formatter: Arc::new(Passthrough),
            structurally_modified: false,
            tracker: MutationTracker::default(),
        }
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn CodeFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_format_options(mut self, format_options: FormatOptions) -> Self {
        self.format_options = format_options;
        self
    }

    pub fn with_short_path<S: Into<String>>(mut self, short_path: S) -> Self {
        self.short_path = short_path.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn short_path(&self) -> &str {
        &self.short_path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Direct access to the tree. Changes made here are neither checked nor tracked.
    pub fn data_mut(&mut self) -> &mut Value {
        &mut self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn has<P: Into<DataPath>>(&self, path: P) -> bool {
        path::has_value(&self.data, &path.into())
    }

    pub fn get<P: Into<DataPath>>(&self, path: P) -> Option<&Value> {
        path::get_value(&self.data, &path.into())
    }

    /// Value at `path`, or `default` when the path does not exist.
    pub fn get_or<P: Into<DataPath>>(&self, path: P, default: Value) -> Value {
        self.get(path).cloned().unwrap_or(default)
    }

    /// Evaluates `conditions` against the current value at `path` without logging.
    pub fn evaluate<P: Into<DataPath>>(&self, path: P, conditions: &ModifyCondition) -> Evaluation {
        conditions.evaluate(self.get(path))
    }

    /// Evaluates and logs the decision of a modification.
    fn should_modify(&self, path: &DataPath, op: &str, conditions: &ModifyCondition) -> bool {
        let key = path.to_string();
        let current = path::get_value(&self.data, path);
        let evaluation = conditions.evaluate(current);

        if evaluation.is_satisfied() {
            Message::DataFileUpdated { op, key: &key, file: &self.short_path }.log();
            return true;
        }

        Message::DataFileNotUpdated {
            op,
            key: &key,
            file: &self.short_path,
            reasons: evaluation.reasons(),
        }
        .log();
        for check in &evaluation.checks {
            let value = match check.kind {
                ConditionKind::IfExists | ConditionKind::IfNotExists => current,
                kind => conditions.operand(kind),
            };
            Message::ConditionCheck {
                condition: check.kind,
                satisfied: check.satisfied,
                key: &key,
                value,
            }
            .log();
        }
        false
    }

    pub fn set<P: Into<DataPath>, V: Into<Value>>(&mut self, path: P, value: V) -> &mut Self {
        self.set_if(path, value, &ModifyCondition::default())
    }

    /// Writes `value` at `path` when `conditions` hold. Writing a value deeply equal to the
    /// current one is logged as an update but changes and records nothing.
    pub fn set_if<P: Into<DataPath>, V: Into<Value>>(
        &mut self,
        path: P,
        value: V,
        conditions: &ModifyCondition,
    ) -> &mut Self {
        let path = path.into();
        let value = value.into();
        let key = path.to_string();

        let current = path::get_value(&self.data, &path);
        if current.is_some_and(|current| deep_equal(current, &value)) {
            Message::DataFileUpdated { op: "set", key: &key, file: &self.short_path }.log();
            Message::DataFileUpdatedWithValue { old: current, new: &value }.log();
            return self;
        }

        if !self.should_modify(&path, "set", conditions) {
            return self;
        }

        Message::DataFileUpdatedWithValue { old: path::get_value(&self.data, &path), new: &value }
            .log();
        match path::set_value(&mut self.data, &path, value) {
            Ok(()) => self.tracker.record_set(key),
            Err(e) => log::warn!("Key not set: '{}' '{}'. {}", self.short_path, key, e),
        }
        self
    }

    pub fn delete<P: Into<DataPath>>(&mut self, path: P) -> &mut Self {
        self.delete_if(path, &ModifyCondition::default())
    }

    /// Removes the value at `path` when `conditions` hold. Deleting a missing path changes
    /// nothing but is still recorded.
    pub fn delete_if<P: Into<DataPath>>(
        &mut self,
        path: P,
        conditions: &ModifyCondition,
    ) -> &mut Self {
        let path = path.into();
        if self.should_modify(&path, "deleted", conditions) {
            path::delete_value(&mut self.data, &path);
            self.tracker.record_deleted(path.to_string());
        }
        self
    }

    pub fn assign<P: Into<DataPath>, V: Into<Value>>(&mut self, path: P, data: V) -> &mut Self {
        self.assign_if(path, data, &ModifyCondition::default())
    }

    /// Merges the top level keys of `data` into the mapping at `path`, one [`DataFile::set_if`]
    /// per key. A missing target is created as an empty mapping.
    pub fn assign_if<P: Into<DataPath>, V: Into<Value>>(
        &mut self,
        path: P,
        data: V,
        conditions: &ModifyCondition,
    ) -> &mut Self {
        let path = path.into();
        let Value::Object(entries) = data.into() else {
            log::warn!(
                "Key not assigned: '{}' '{}'. Assigned data is not an object.",
                self.short_path,
                path
            );
            return self;
        };

        if !self.has(&path) {
            if let Err(e) = path::set_value(&mut self.data, &path, empty_document()) {
                log::warn!("{e}");
            }
        }
        if !self.get(&path).is_some_and(Value::is_object) {
            let err =
                Error::AssignTargetError { key: path.to_string(), file: self.short_path.clone() };
            log::warn!("{err}");
            return self;
        }

        for (key, value) in entries {
            self.set_if(path.child(key), value, conditions);
        }
        self
    }

    /// Keys changed through this instance since it was loaded.
    pub fn modified_keys(&self) -> ModifiedKeys {
        self.tracker.snapshot()
    }

    /// [`DataFile::modified_keys`] restricted to keys starting with an `include` prefix (any key
    /// when empty) and with no `exclude` prefix.
    pub fn modified_keys_filtered(&self, include: &[&str], exclude: &[&str]) -> ModifiedKeys {
        self.tracker.filtered(include, exclude)
    }

    /// Moves `keys` to the front of the root mapping, keeping the order of the other keys.
    pub fn order_keys<K: AsRef<str>>(&mut self, keys: &[K]) -> &mut Self {
        self.order_keys_of(DataPath::root(), keys)
    }

    /// Sorts the keys of the root mapping alphabetically.
    pub fn sort_keys(&mut self) -> &mut Self {
        self.reorder(&DataPath::root(), None);
        self
    }

    pub fn order_keys_of<P: Into<DataPath>, K: AsRef<str>>(
        &mut self,
        path: P,
        keys: &[K],
    ) -> &mut Self {
        let keys: Vec<String> = keys.iter().map(|k| k.as_ref().to_string()).collect();
        self.reorder(&path.into(), Some(&keys));
        self
    }

    pub fn sort_keys_of<P: Into<DataPath>>(&mut self, path: P) -> &mut Self {
        self.reorder(&path.into(), None);
        self
    }

    fn reorder(&mut self, path: &DataPath, keys: Option<&[String]>) {
        match path::get_value_mut(&mut self.data, path) {
            Some(Value::Object(map)) => {
                if order::reorder(map, keys) {
                    log::debug!("Keys of '{}' '{}' reordered.", self.short_path, path);
                    self.structurally_modified = true;
                }
            }
            _ => log::debug!(
                "Keys of '{}' '{}' not reordered: not an object.",
                self.short_path,
                path
            ),
        }
    }

    /// Serialized and formatted content, as it would be written by [`DataFile::save`].
    pub fn serialize(&self) -> Result<String> {
        let serialized = serialize(&self.data, self.format, &self.format_options)?;
        self.formatter.format(&serialized, &self.path, self.format)
    }

    pub fn save(&mut self) -> Result<SaveStatus> {
        self.save_with(SaveOptions::default())
    }

    /// Writes the file unless the tree is deeply equal to the content on disk, its key order
    /// was not changed and `force` is not set.
    ///
    /// # Errors
    /// * `Error::IoError` when the file cannot be written.
    /// * `Error::FormatterError` when the formatter fails.
    pub fn save_with(&mut self, options: SaveOptions) -> Result<SaveStatus> {
        if !options.force && !self.structurally_modified && self.is_same_on_disk() {
            Message::DataFileNotChanged { file: &self.short_path }.log();
            return Ok(SaveStatus::Unchanged);
        }

        let content = self.serialize()?;
        write_file(&content, &self.path)?;
        self.structurally_modified = false;
        Message::DataFileSaved { file: &self.short_path }.log();
        Ok(SaveStatus::Written)
    }

    fn is_same_on_disk(&self) -> bool {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return false;
        };
        match parse_file_content(&self.path, &content) {
            Ok((format, on_disk)) => format == self.format && deep_equal(&on_disk, &self.data),
            Err(e) => {
                log::debug!("{e}");
                false
            }
        }
    }

    /// Re-reads the file from disk, dropping unsaved changes and recorded keys.
    pub fn reload(&mut self) -> Result<&mut Self> {
        let (format, data) = read_document(&self.path, self.format)?;
        self.format = format;
        self.data = data;
        self.structurally_modified = false;
        self.tracker.clear();
        Ok(self)
    }
}

fn short_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
