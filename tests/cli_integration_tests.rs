use clap::Parser;
use intermodular::cli::{run, Cli};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use test_log::test;
mod utils;
use utils::{create_module, read_json, write};

fn run_cli(args: &[&str]) -> Option<String> {
    let cli = Cli::parse_from(std::iter::once("intermodular").chain(args.iter().copied()));
    run(&cli).unwrap()
}

fn run_json(args: &[&str]) -> Value {
    serde_json::from_str(&run_cli(args).unwrap()).unwrap()
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn set_saves_and_prints_modified_keys() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("package.json");
    write(&file, r#"{"name":"app"}"#);

    let keys = run_json(&["set", arg(&file), "scripts.test", "jest"]);
    assert_eq!(keys, json!({"set": ["scripts.test"], "deleted": []}));
    assert_eq!(read_json(&file), json!({"name": "app", "scripts": {"test": "jest"}}));

    let keys = run_json(&["set", arg(&file), "version", "\"1.0.0\"", "--if-exists"]);
    assert_eq!(keys, json!({"set": [], "deleted": []}));
    assert!(!read_json(&file).as_object().unwrap().contains_key("version"));

    run_json(&["set", arg(&file), "private", "true"]);
    assert_eq!(read_json(&file)["private"], json!(true));
}

#[test]
fn get_prints_json_or_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("data.yaml");
    write(&file, "a:\n  b: [1, 2]\n");

    assert_eq!(run_json(&["get", arg(&file), "a.b"]), json!([1, 2]));
    assert_eq!(run_cli(&["get", arg(&file), "a.c"]), None);
}

#[test]
fn delete_and_assign_respect_conditions() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("data.json");
    write(&file, r#"{"name":"Doe","opts":{"a":1}}"#);

    let keys = run_json(&["delete", arg(&file), "name", "--if-equal", "Smith"]);
    assert_eq!(keys["deleted"], json!([]));
    let keys = run_json(&["delete", arg(&file), "name", "--if-equal", "Doe"]);
    assert_eq!(keys["deleted"], json!(["name"]));

    let data = r#"{"a":2,"b":3}"#;
    let keys = run_json(&["assign", arg(&file), data, "--path", "opts", "--if-not-exists"]);
    assert_eq!(keys["set"], json!(["opts.b"]));
    assert_eq!(read_json(&file), json!({"opts": {"a": 1, "b": 3}}));
}

#[test]
fn assign_requires_an_object() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("data.json");
    let cli = Cli::parse_from(["intermodular", "assign", arg(&file), "[1]"]);
    assert!(run(&cli).is_err());
}

#[test]
fn order_keys_moves_or_sorts_keys() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("data.json");
    write(&file, r#"{"c":1,"b":2,"a":3,"nested":{"z":1,"y":2}}"#);

    run_cli(&["order-keys", arg(&file), "nested", "a"]);
    let data = read_json(&file);
    let keys: Vec<_> = data.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["nested", "a", "c", "b"]);

    run_cli(&["order-keys", arg(&file), "--path", "nested"]);
    let data = read_json(&file);
    let keys: Vec<_> = data["nested"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["y", "z"]);
}

#[test]
fn copy_prints_copied_files() {
    let temp_dir = TempDir::new().unwrap();
    let source = create_module(&temp_dir.path().join("source"), json!({"name": "source"}));
    let target = create_module(&temp_dir.path().join("target"), json!({"name": "target"}));
    write(&source.join("files/a.txt"), "a");
    write(&source.join("files/skip/b.txt"), "b");

    let copied = run_json(&[
        "copy",
        arg(&source),
        arg(&target),
        "files",
        "out",
        "--ignore",
        "skip",
        "--files-only",
    ]);
    assert_eq!(copied, json!(["out/a.txt"]));
    assert!(target.join("out/a.txt").is_file());
    assert!(!target.join("out/skip").exists());
}
