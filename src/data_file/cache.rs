use indexmap::map::Entry;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use super::{DataFile, LoadOptions, SaveOptions, SaveStatus};
use crate::error::Result;
use crate::ioutils::normalize_path;

/// Data files keyed by normalized absolute path, so every caller touching the same file shares
/// one instance and its recorded modifications.
#[derive(Debug, Default)]
pub struct DataFileCache {
    files: IndexMap<PathBuf, DataFile>,
}

impl DataFileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached instance for `path`, loading it on first access. With `force_read` the file is read
    /// from disk again and replaces the cached instance.
    pub fn get<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: LoadOptions,
        force_read: bool,
    ) -> Result<&mut DataFile> {
        let key = normalize_path(path.as_ref());
        match self.files.entry(key) {
            Entry::Occupied(mut entry) => {
                if force_read {
                    let file = DataFile::load(entry.key(), options)?;
                    entry.insert(file);
                }
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let file = DataFile::load(entry.key(), options)?;
                Ok(entry.insert(file))
            }
        }
    }

    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.files.contains_key(&normalize_path(path.as_ref()))
    }

    /// Drops the cached instance for `path`, discarding unsaved changes.
    pub fn invalidate<P: AsRef<Path>>(&mut self, path: P) -> Option<DataFile> {
        self.files.shift_remove(&normalize_path(path.as_ref()))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Saves every cached file in load order.
    pub fn save_all(&mut self, options: SaveOptions) -> Result<Vec<(PathBuf, SaveStatus)>> {
        self.files
            .iter_mut()
            .map(|(path, file)| Ok((path.clone(), file.save_with(options)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn shares_instance_between_equivalent_paths() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("package.json");
        std::fs::write(&path, r#"{"name": "a"}"#).unwrap();

        let mut cache = DataFileCache::new();
        cache.get(&path, LoadOptions::default(), false).unwrap().set("name", "b");
        let other = temp_dir.path().join("sub/../package.json");
        let file = cache.get(&other, LoadOptions::default(), false).unwrap();
        assert_eq!(file.get("name"), Some(&json!("b")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn force_read_replaces_cached_instance() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("package.json");
        std::fs::write(&path, r#"{"name": "a"}"#).unwrap();

        let mut cache = DataFileCache::new();
        cache.get(&path, LoadOptions::default(), false).unwrap().set("name", "b");
        let file = cache.get(&path, LoadOptions::default(), true).unwrap();
        assert_eq!(file.get("name"), Some(&json!("a")));
    }

    #[test]
    fn save_all_writes_modified_files() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("a.json");
        let second = temp_dir.path().join("b.yaml");
        std::fs::write(&first, "{\n  \"x\": 1\n}\n").unwrap();

        let mut cache = DataFileCache::new();
        cache.get(&first, LoadOptions::default(), false).unwrap();
        cache.get(&second, LoadOptions::default(), false).unwrap().set("y", 2);
        let statuses = cache.save_all(SaveOptions::default()).unwrap();

        assert_eq!(statuses[0].1, SaveStatus::Unchanged);
        assert_eq!(statuses[1].1, SaveStatus::Written);
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "y: 2\n");
    }

    #[test]
    fn invalidate_drops_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("x.json");
        let mut cache = DataFileCache::new();
        cache.get(&path, LoadOptions::default(), false).unwrap();
        assert!(cache.contains(&path));
        assert!(cache.invalidate(&path).is_some());
        assert!(cache.is_empty());
    }
}
