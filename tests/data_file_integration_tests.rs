use intermodular::data_file::{
    DataFile, LoadOptions, ModifiedKeys, ModifyCondition, SaveOptions, SaveStatus,
};
use intermodular::format::FileFormat;
use serde_json::{json, Value};
use tempfile::TempDir;
use test_log::test;
mod utils;
use utils::{read_json, write};

fn load(path: &std::path::Path) -> DataFile {
    DataFile::load(path, LoadOptions::default()).unwrap()
}

fn keys(data: &Value) -> Vec<&str> {
    data.as_object().unwrap().keys().map(String::as_str).collect()
}

#[test]
fn second_save_is_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("package.json");
    write(&path, r#"{"name":"a","version":"1.0.0"}"#);

    let mut file = load(&path);
    file.set("scripts.test", "jest");
    assert_eq!(file.save().unwrap(), SaveStatus::Written);
    assert_eq!(file.save().unwrap(), SaveStatus::Unchanged);

    let mut other = load(&path);
    assert_eq!(other.save().unwrap(), SaveStatus::Unchanged);
    assert_eq!(other.save_with(SaveOptions { force: true }).unwrap(), SaveStatus::Written);
}

#[test]
fn saved_data_loads_back_equal() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["data.json", "data.yaml"] {
        let path = temp_dir.path().join(name);
        let mut file = load(&path);
        file.set("a.b[1]", json!({"c": true})).set("list", json!([1, "two", null])).set("x", 1.5);
        file.save().unwrap();

        let reloaded = load(&path);
        assert_eq!(reloaded.data(), file.data(), "{name}");
        assert_eq!(reloaded.get("a.b[0]"), Some(&Value::Null));
    }
    let yaml = std::fs::read_to_string(temp_dir.path().join("data.yaml")).unwrap();
    assert!(!yaml.trim_start().starts_with('{'));
}

#[test]
fn conditions_gate_modifications() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.json");
    write(&path, r#"{"name":"Doe","age":3}"#);
    let mut file = load(&path);

    file.set_if("name", "Smith", &ModifyCondition::new().if_not_exists());
    assert_eq!(file.get("name"), Some(&json!("Doe")));

    file.set_if("name", "Smith", &ModifyCondition::new().if_exists().if_equal("Doe"));
    assert_eq!(file.get("name"), Some(&json!("Smith")));

    file.set_if("age", 4, &ModifyCondition::new().if_not_equal(3));
    assert_eq!(file.get("age"), Some(&json!(3)));

    file.delete_if("age", &ModifyCondition::new().if_equal(3.0));
    assert!(!file.has("age"));

    assert_eq!(
        file.modified_keys(),
        ModifiedKeys { set: vec!["name".to_string()], deleted: vec!["age".to_string()] }
    );
}

#[test]
fn setting_an_equal_value_records_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.json");
    write(&path, r#"{"deps":{"a":"1.0"},"n":1}"#);
    let mut file = load(&path);

    file.set("deps", json!({"a": "1.0"})).set("n", 1.0);
    assert!(file.modified_keys().is_empty());
    assert_eq!(file.save().unwrap(), SaveStatus::Unchanged);
}

#[test]
fn ordered_keys_survive_save() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.json");
    write(&path, r#"{"b":1,"a":2,"c":3}"#);

    let mut file = load(&path);
    file.order_keys(&["a"]);
    assert_eq!(file.save().unwrap(), SaveStatus::Written);

    let reloaded = load(&path);
    assert_eq!(keys(reloaded.data()), ["a", "b", "c"]);
}

#[test]
fn sorted_nested_keys_survive_save() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.yml");
    write(&path, "scripts:\n  test: jest\n  build: tsc\n  lint: eslint\nname: x\n");

    let mut file = load(&path);
    assert_eq!(file.format(), FileFormat::Yaml);
    file.sort_keys_of("scripts");
    file.save().unwrap();

    let reloaded = load(&path);
    assert_eq!(keys(reloaded.get("scripts").unwrap()), ["build", "lint", "test"]);
    assert_eq!(keys(reloaded.data()), ["scripts", "name"]);
}

#[test]
fn ordering_missing_or_scalar_targets_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.json");
    write(&path, r#"{"name":"x","b":1,"a":2}"#);

    let mut file = load(&path);
    file.order_keys_of("missing", &["a"])
        .order_keys_of("name", &["a"])
        .sort_keys_of("missing.deep");
    assert_eq!(file.data(), &json!({"name": "x", "b": 1, "a": 2}));
    assert_eq!(keys(file.data()), ["name", "b", "a"]);
    assert_eq!(file.save().unwrap(), SaveStatus::Unchanged);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"name":"x","b":1,"a":2}"#);
}

#[test]
fn assign_to_an_array_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.json");
    write(&path, r#"{"arr":[1,2,3]}"#);

    let mut file = load(&path);
    file.assign("arr", json!({"x": 1}));
    assert_eq!(file.get("arr"), Some(&json!([1, 2, 3])));
    assert!(file.modified_keys().is_empty());
}

#[test]
fn missing_file_is_created_on_save() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("x.json");

    let mut file = load(&path);
    assert_eq!(file.format(), FileFormat::Json);
    assert_eq!(file.data(), &json!({}));

    file.set("name", "a");
    assert_eq!(file.save().unwrap(), SaveStatus::Written);
    assert_eq!(read_json(&path), json!({"name": "a"}));

    file.reload().unwrap();
    assert_eq!(file.data(), &json!({"name": "a"}));
    assert!(file.modified_keys().is_empty());
}

#[test]
fn delete_records_only_the_deleted_key() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.json");
    write(&path, r#"{"name":"Doe","ids":[1,2,3]}"#);

    let mut file = load(&path);
    file.delete("name");
    assert_eq!(
        file.modified_keys(),
        ModifiedKeys { set: vec![], deleted: vec!["name".to_string()] }
    );
    assert_eq!(file.data(), &json!({"ids": [1, 2, 3]}));
}

#[test]
fn modified_keys_can_be_filtered_by_prefix() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("package.json");
    let mut file = load(&path);
    file.set("scripts.test", "jest").set("scripts.build", "tsc").set("name", "x").delete("main");

    let filtered = file.modified_keys_filtered(&["scripts"], &["scripts.build"]);
    assert_eq!(filtered.set, ["scripts.test"]);
    assert!(filtered.deleted.is_empty());
}

#[test]
fn default_format_applies_to_new_files_without_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(".toolrc");
    let options = LoadOptions { default_format: Some(FileFormat::Yaml), ..LoadOptions::default() };

    let mut file = DataFile::load(&path, options).unwrap();
    assert_eq!(file.format(), FileFormat::Yaml);
    file.set("enabled", true);
    file.save().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "enabled: true");
}
