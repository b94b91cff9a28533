//! Catalogue of log messages, each with a fixed level.

use log::Level;
use serde_json::Value;
use std::fmt::Display;

use crate::data_file::condition::ConditionKind;

#[derive(Debug)]
pub enum Message<'a> {
    Construction { source: &'a str, target: &'a str },

    FileOp { op: &'a str, file: &'a str },
    FileNotOpExists { op: &'a str, file: &'a str },
    FileNotOpIsEqual { op: &'a str, file: &'a str },
    FileNotOpIsNotEqual { op: &'a str, file: &'a str },
    FileRenamed { source: &'a str, target: &'a str },
    FileNotRenamedExists { source: &'a str, target: &'a str },

    DataFileNotChanged { file: &'a str },
    DataFileSaved { file: &'a str },
    DataFileUpdated { op: &'a str, key: &'a str, file: &'a str },
    DataFileNotUpdated { op: &'a str, key: &'a str, file: &'a str, reasons: String },
    DataFileUpdatedWithValue { old: Option<&'a Value>, new: &'a Value },
    ConditionCheck {
        condition: ConditionKind,
        satisfied: bool,
        key: &'a str,
        value: Option<&'a Value>,
    },

    CopyDirectories { pair: &'a str },
    FileCopied { pair: &'a str },
    FileNotCopied { reason: &'a str, pair: &'a str },

    InstallModule { modules: &'a str },
    UninstallModule { modules: &'a str },
}

fn render(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "(none)".to_string(),
    }
}

impl Message<'_> {
    pub fn level(&self) -> Level {
        match self {
            Message::FileNotOpExists { .. }
            | Message::FileNotOpIsEqual { .. }
            | Message::FileNotOpIsNotEqual { .. }
            | Message::FileNotRenamedExists { .. }
            | Message::DataFileNotUpdated { .. }
            | Message::FileNotCopied { .. } => Level::Warn,
            Message::DataFileUpdatedWithValue { .. } | Message::ConditionCheck { .. } => {
                Level::Debug
            }
            _ => Level::Info,
        }
    }

    /// Emits the message through the `log` facade.
    pub fn log(&self) {
        log::log!(self.level(), "{}", self);
    }

    /// Level and rendered text, for messages which are buffered before being logged.
    pub fn entry(&self) -> (Level, String) {
        (self.level(), self.to_string())
    }
}

impl Display for Message<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Construction { source, target } => {
                write!(f, "Intermodular: {source} → {target}")
            }
            Message::FileOp { op, file } => write!(f, "File {op}: {file}"),
            Message::FileNotOpExists { op, file } => {
                write!(f, "File not {op}: '{file}' already exists.")
            }
            Message::FileNotOpIsEqual { op, file } => {
                write!(f, "File not {op}: {file} is not met requested equality condition.")
            }
            Message::FileNotOpIsNotEqual { op, file } => write!(
                f,
                "File not {op}: {file} is not met requested non-equality condition."
            ),
            Message::FileRenamed { source, target } => {
                write!(f, "File renamed: '{source}' → '{target}'")
            }
            Message::FileNotRenamedExists { source, target } => write!(
                f,
                "File not renamed: '{source}' → '{target}'. Target already exists."
            ),
            Message::DataFileNotChanged { file } => write!(
                f,
                "'{file}' does not need to be saved, it is same on disk. \
                 Use force to save unchanged files."
            ),
            Message::DataFileSaved { file } => write!(f, "File saved: '{file}'"),
            Message::DataFileUpdated { op, key, file } => {
                write!(f, "Key {op}: '{file}' '{key}' {op}.")
            }
            Message::DataFileNotUpdated { op, key, file, reasons } => write!(
                f,
                "Key not {op}: '{file}' '{key}' not {op} because of {reasons} condition(s)."
            ),
            Message::DataFileUpdatedWithValue { old, new } => {
                write!(f, "  ↳  Old: {} New: {}", render(*old), new)
            }
            Message::ConditionCheck { condition, satisfied, key, value } => {
                let mark = if *satisfied { "✓" } else { "✗" };
                let relation = match (condition, satisfied) {
                    (ConditionKind::IfEqual, true) | (ConditionKind::IfNotEqual, false) => {
                        format!("= {}", render(*value))
                    }
                    (ConditionKind::IfEqual, false) | (ConditionKind::IfNotEqual, true) => {
                        format!("≠ {}", render(*value))
                    }
                    (ConditionKind::IfExists, true) | (ConditionKind::IfNotExists, false) => {
                        "exists.".to_string()
                    }
                    (ConditionKind::IfExists, false) | (ConditionKind::IfNotExists, true) => {
                        "does not exist.".to_string()
                    }
                };
                write!(f, "  ↳  {:<12} {mark} {key} {relation}", format!("{condition}:"))
            }
            Message::CopyDirectories { pair } => {
                write!(f, "Starting to copy files between directories: {pair}")
            }
            Message::FileCopied { pair } => write!(f, "File copied: {pair}"),
            Message::FileNotCopied { reason, pair } => {
                write!(f, "File not copied: ({reason}) {pair}")
            }
            Message::InstallModule { modules } => write!(f, "Installing modules: {modules}"),
            Message::UninstallModule { modules } => {
                write!(f, "Uninstalling modules: {modules}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejections_are_warnings() {
        let msg = Message::DataFileNotUpdated {
            op: "set",
            key: "name",
            file: "package.json",
            reasons: "ifExists".to_string(),
        };
        assert_eq!(msg.level(), Level::Warn);
        assert_eq!(
            msg.to_string(),
            "Key not set: 'package.json' 'name' not set because of ifExists condition(s)."
        );
    }

    #[test]
    fn updates_are_info() {
        let msg = Message::DataFileUpdated { op: "set", key: "a.b", file: "x.json" };
        assert_eq!(msg.entry(), (Level::Info, "Key set: 'x.json' 'a.b' set.".to_string()));
    }

    #[test]
    fn condition_checks_render_relation() {
        let value = json!("Doe");
        let msg = Message::ConditionCheck {
            condition: ConditionKind::IfEqual,
            satisfied: false,
            key: "surname",
            value: Some(&value),
        };
        assert_eq!(msg.level(), Level::Debug);
        assert_eq!(msg.to_string(), "  ↳  ifEqual:     ✗ surname ≠ \"Doe\"");

        let msg = Message::ConditionCheck {
            condition: ConditionKind::IfNotExists,
            satisfied: false,
            key: "surname",
            value: None,
        };
        assert_eq!(msg.to_string(), "  ↳  ifNotExists: ✗ surname exists.");
    }

    #[test]
    fn copy_messages() {
        let msg = Message::FileNotCopied { reason: "Exists", pair: "'a' → 'b'" };
        assert_eq!(msg.level(), Level::Warn);
        assert_eq!(msg.to_string(), "File not copied: (Exists) 'a' → 'b'");
    }
}
