use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Extension trait for Path to provide string conversion and lexical path arithmetic
pub trait PathExt {
    /// Converts a path to a string slice, returning an error if the path contains invalid
    /// Unicode characters.
    ///
    /// # Examples
    /// ```
    /// use intermodular::ext::PathExt;
    /// use std::path::Path;
    ///
    /// let path = Path::new("test");
    /// assert_eq!(path.to_str_checked().unwrap(), "test");
    /// ```
    fn to_str_checked(&self) -> Result<&str>;

    /// Resolves `.` and `..` components without touching the filesystem.
    ///
    /// # Examples
    /// ```
    /// use intermodular::ext::PathExt;
    /// use std::path::{Path, PathBuf};
    ///
    /// assert_eq!(Path::new("/a/b/../c/./d").normalize(), PathBuf::from("/a/c/d"));
    /// ```
    fn normalize(&self) -> PathBuf;

    /// Path leading from `base` to this path, with `..` components where needed.
    /// Both paths are normalized first.
    ///
    /// # Examples
    /// ```
    /// use intermodular::ext::PathExt;
    /// use std::path::{Path, PathBuf};
    ///
    /// assert_eq!(Path::new("/m/src/a.js").relative_to("/m"), PathBuf::from("src/a.js"));
    /// assert_eq!(Path::new("/m/a").relative_to("/m/b/c"), PathBuf::from("../../a"));
    /// ```
    fn relative_to<P: AsRef<Path>>(&self, base: P) -> PathBuf;
}

impl PathExt for Path {
    fn to_str_checked(&self) -> Result<&str> {
        self.to_str().ok_or_else(|| {
            Error::Other(anyhow::anyhow!(
                "Path '{}' contains invalid Unicode characters",
                self.display()
            ))
        })
    }

    fn normalize(&self) -> PathBuf {
        let mut normalized = PathBuf::new();
        for component in self.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        normalized.push(component);
                    }
                }
                other => normalized.push(other),
            }
        }
        normalized
    }

    fn relative_to<P: AsRef<Path>>(&self, base: P) -> PathBuf {
        let target = self.normalize();
        let base = base.as_ref().normalize();
        let target_components: Vec<_> = target.components().collect();
        let base_components: Vec<_> = base.components().collect();
        let common = target_components
            .iter()
            .zip(&base_components)
            .take_while(|(a, b)| a == b)
            .count();

        let mut relative = PathBuf::new();
        for _ in common..base_components.len() {
            relative.push("..");
        }
        for component in &target_components[common..] {
            relative.push(component);
        }
        relative
    }
}
