#![allow(dead_code)]

use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Creates a module directory `dir` holding `package`.
pub fn create_module(dir: &Path, package: Value) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("package.json"), serde_json::to_string_pretty(&package).unwrap()).unwrap();
    dir.to_path_buf()
}

/// Writes `content` to `path`, creating its parents.
pub fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn relative_files(dir: &Path) -> BTreeSet<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect()
}

/// Prints the files only present in one of the trees and the files whose contents differ.
pub fn print_dir_diff(actual: &Path, expected: &Path) {
    let actual_files = relative_files(actual);
    let expected_files = relative_files(expected);

    println!("\n=== Directory Comparison ===");
    for file in actual_files.difference(&expected_files) {
        println!("  + {file:?}");
    }
    for file in expected_files.difference(&actual_files) {
        println!("  - {file:?}");
    }
    for file in actual_files.intersection(&expected_files) {
        if fs::read(actual.join(file)).unwrap() != fs::read(expected.join(file)).unwrap() {
            println!("  ~ {file:?}");
        }
    }
    println!("=== End of Comparison ===\n");
}

/// Asserts that both trees hold the same files with the same contents.
pub fn assert_same_tree(actual: &Path, expected: &Path) {
    if dir_diff::is_different(actual, expected).unwrap() {
        print_dir_diff(actual, expected);
        panic!("Directories differ. See above for details.");
    }
}
