//! Data formats understood by data files: detection, parsing and serialization.

use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::formatter::FormatOptions;

/// Textual format of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Json,
    Yaml,
}

/// Formats tried by [`parse_string`], in order.
pub const KNOWN_FORMATS: &[FileFormat] = &[FileFormat::Json, FileFormat::Yaml];

impl FileFormat {
    /// Maps a file extension (without the dot) to a format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "yaml" | "yml" => Some(FileFormat::Yaml),
            _ => None,
        }
    }

    /// Infers the format of `path` from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref().extension().and_then(|e| e.to_str()).and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Yaml => "yaml",
        }
    }
}

impl Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s).ok_or_else(|| Error::ParseError {
            path: String::new(),
            formats: known_formats(),
            reasons: format!("Unknown format '{s}'."),
        })
    }
}

fn known_formats() -> String {
    KNOWN_FORMATS.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", ")
}

/// Parses `content` trying JSON first, then YAML, and returns the format that succeeded
/// together with the parsed tree.
///
/// # Errors
/// * `Error::ParseError` listing the failure of every format when none of them accepts the input.
pub fn parse_string(content: &str) -> Result<(FileFormat, Value)> {
    let mut reasons = Vec::new();

    match serde_json::from_str::<Value>(content) {
        Ok(data) => return Ok((FileFormat::Json, data)),
        Err(e) => reasons.push(format!("JSON: {e}.")),
    }

    match serde_yaml::from_str::<Value>(content) {
        Ok(data) => return Ok((FileFormat::Yaml, data)),
        Err(e) => reasons.push(format!("YAML: {e}.")),
    }

    Err(Error::ParseError {
        path: String::new(),
        formats: known_formats(),
        reasons: reasons.join(" "),
    })
}

/// Same as [`parse_string`], naming `path` in the error.
pub fn parse_file_content<P: AsRef<Path>>(path: P, content: &str) -> Result<(FileFormat, Value)> {
    parse_string(content).map_err(|e| match e {
        Error::ParseError { formats, reasons, .. } => Error::ParseError {
            path: format!(" in '{}'", path.as_ref().display()),
            formats,
            reasons,
        },
        other => other,
    })
}

/// Serializes `data` in `format`. JSON is pretty printed using the indentation of `options`.
pub fn serialize(data: &Value, format: FileFormat, options: &FormatOptions) -> Result<String> {
    let mut serialized = match format {
        FileFormat::Json => {
            let indent = options.indent();
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            data.serialize(&mut serializer)?;
            String::from_utf8(buf).map_err(|e| Error::Other(e.into()))?
        }
        FileFormat::Yaml => serde_yaml::to_string(data)?,
    };

    let trimmed_len = serialized.trim_end_matches('\n').len();
    serialized.truncate(trimmed_len);
    if options.final_newline {
        serialized.push('\n');
    }
    Ok(serialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(FileFormat::from_path("a/b.json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path("a/b.YML"), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_path("a/b.yaml"), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_path(".eslintrc"), None);
        assert_eq!(FileFormat::from_path("none"), None);
    }

    #[test]
    fn parses_json_before_yaml() {
        let (format, data) = parse_string(r#"{"a": 1}"#).unwrap();
        assert_eq!(format, FileFormat::Json);
        assert_eq!(data, json!({"a": 1}));

        let (format, data) = parse_string("a: 1\nb:\n  - x\n").unwrap();
        assert_eq!(format, FileFormat::Yaml);
        assert_eq!(data, json!({"a": 1, "b": ["x"]}));
    }

    #[test]
    fn reports_every_format_on_failure() {
        let err = parse_file_content("broken.yaml", "key: [unclosed").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Cannot parse data in 'broken.yaml'"));
        assert!(message.contains("json, yaml"));
        assert!(message.contains("JSON:"));
        assert!(message.contains("YAML:"));
    }

    #[test]
    fn serializes_json_with_configured_indent() {
        let data = json!({"name": "a", "list": [1]});
        let two = serialize(&data, FileFormat::Json, &FormatOptions::default()).unwrap();
        assert_eq!(two, "{\n  \"name\": \"a\",\n  \"list\": [\n    1\n  ]\n}\n");

        let tabs = FormatOptions { use_tabs: true, ..FormatOptions::default() };
        let tabbed = serialize(&json!({"a": 1}), FileFormat::Json, &tabs).unwrap();
        assert_eq!(tabbed, "{\n\t\"a\": 1\n}\n");
    }

    #[test]
    fn serializes_yaml_in_block_style() {
        let data = json!({"name": "a", "list": [1, 2]});
        let yaml = serialize(&data, FileFormat::Yaml, &FormatOptions::default()).unwrap();
        assert_eq!(yaml, "name: a\nlist:\n- 1\n- 2\n");
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("yml".parse::<FileFormat>().unwrap(), FileFormat::Yaml);
        assert_eq!("json".parse::<FileFormat>().unwrap(), FileFormat::Json);
        assert!("toml".parse::<FileFormat>().is_err());
        assert_eq!(FileFormat::Yaml.to_string(), "yaml");
    }
}
