//! Discovery of a module's configuration for a named tool.
//!
//! For a name such as `my-boilerplate` the configuration is the first of:
//! the `my-boilerplate` key of `package.json`, `.my-boilerplaterc` (JSON or YAML),
//! `.my-boilerplaterc.json`, `.my-boilerplaterc.yaml`, `.my-boilerplaterc.yml`,
//! `my-boilerplate.config.json` and `my-boilerplate.config.yaml`.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::constants::PACKAGE_FILE;
use crate::data_file::{path::get_value, DataPath};
use crate::error::Result;
use crate::format::parse_file_content;

/// Where a configuration was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A key of `package.json`.
    PackageKey { file: PathBuf, key: String },
    File(PathBuf),
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub source: ConfigSource,
    pub data: Value,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self { source: ConfigSource::NotFound, data: Value::Object(Map::new()) }
    }
}

/// Configuration file names for `name`, in order of precedence.
pub fn config_file_names(name: &str) -> Vec<String> {
    vec![
        format!(".{name}rc"),
        format!(".{name}rc.json"),
        format!(".{name}rc.yaml"),
        format!(".{name}rc.yml"),
        format!("{name}.config.json"),
        format!("{name}.config.yaml"),
    ]
}

impl ProjectConfig {
    /// Searches `dir` for the configuration of `name`. Finding nothing is not an error.
    ///
    /// # Errors
    /// * `Error::ParseError` if the first configuration found cannot be parsed.
    pub fn search<P: AsRef<Path>>(name: &str, dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let package_path = dir.join(PACKAGE_FILE);
        if package_path.is_file() {
            let content = std::fs::read_to_string(&package_path)?;
            let (_, package) = parse_file_content(&package_path, &content)?;
            if let Some(data) = package.get(name) {
                log::debug!("Configuration of '{}' found in {}", name, package_path.display());
                return Ok(Self {
                    source: ConfigSource::PackageKey { file: package_path, key: name.to_string() },
                    data: data.clone(),
                });
            }
        }

        for config_file_name in config_file_names(name) {
            let config_path = dir.join(&config_file_name);
            if !config_path.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&config_path)?;
            let data = if content.trim().is_empty() {
                Value::Object(Map::new())
            } else {
                parse_file_content(&config_path, &content)?.1
            };
            log::debug!("Configuration of '{}' found in {}", name, config_path.display());
            return Ok(Self { source: ConfigSource::File(config_path), data });
        }

        log::debug!("No configuration of '{}' in {}", name, dir.display());
        Ok(Self::default())
    }

    pub fn is_found(&self) -> bool {
        self.source != ConfigSource::NotFound
    }

    pub fn get<P: Into<DataPath>>(&self, path: P) -> Option<&Value> {
        get_value(&self.data, &path.into())
    }
}
