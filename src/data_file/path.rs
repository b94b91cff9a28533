//! Addressing values inside a data tree with dotted paths (`scripts.build`, `files[0]`) or
//! segment lists (`["scripts", "build"]`).

use serde_json::{Map, Value};
use std::fmt::Display;

use crate::constants::MAX_SEQUENCE_GROWTH;
use crate::error::{Error, Result};

/// Location of a value in a data tree. The empty path addresses the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DataPath {
    segments: Vec<String>,
}

impl DataPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dotted path. Bracket notation (`a[0]`, `a["b.c"]`) is accepted as well.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        if path.is_empty() {
            return Self { segments };
        }

        let mut current = String::new();
        let mut chars = path.chars().peekable();
        let mut closed_bracket = false;
        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !closed_bracket {
                        segments.push(std::mem::take(&mut current));
                    }
                    closed_bracket = false;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    let quote = chars.next_if(|c| *c == '"' || *c == '\'');
                    let mut inner = String::new();
                    while let Some(c) = chars.next() {
                        match quote {
                            Some(q) if c == q && chars.peek() == Some(&']') => {
                                chars.next();
                                break;
                            }
                            None if c == ']' => break,
                            _ => inner.push(c),
                        }
                    }
                    segments.push(inner);
                    closed_bracket = true;
                }
                _ => {
                    closed_bracket = false;
                    current.push(c);
                }
            }
        }
        if !closed_bracket {
            segments.push(current);
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path of `key` below this path.
    pub fn child<S: Into<String>>(&self, key: S) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Self { segments }
    }

    /// Whether this path starts with every segment of `prefix`.
    pub fn starts_with(&self, prefix: &DataPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl Display for DataPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for DataPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for DataPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<&String> for DataPath {
    fn from(path: &String) -> Self {
        Self::parse(path)
    }
}

impl From<Option<&str>> for DataPath {
    fn from(path: Option<&str>) -> Self {
        path.map(Self::parse).unwrap_or_default()
    }
}

impl From<&[&str]> for DataPath {
    fn from(segments: &[&str]) -> Self {
        Self { segments: segments.iter().map(|s| s.to_string()).collect() }
    }
}

impl<const N: usize> From<[&str; N]> for DataPath {
    fn from(segments: [&str; N]) -> Self {
        Self { segments: segments.iter().map(|s| s.to_string()).collect() }
    }
}

impl From<Vec<&str>> for DataPath {
    fn from(segments: Vec<&str>) -> Self {
        Self::from(segments.as_slice())
    }
}

impl From<Vec<String>> for DataPath {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl From<&DataPath> for DataPath {
    fn from(path: &DataPath) -> Self {
        path.clone()
    }
}

/// Non-negative integer literal without leading zeros, usable as a sequence index.
pub fn parse_index(segment: &str) -> Option<usize> {
    let valid = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if valid {
        segment.parse().ok()
    } else {
        None
    }
}

fn child<'v>(node: &'v Value, segment: &str) -> Option<&'v Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'v>(node: &'v mut Value, segment: &str) -> Option<&'v mut Value> {
    match node {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => parse_index(segment).and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// Returns the slot for `segment` in `node`, creating it (as `null`) if missing.
fn slot_mut<'v>(node: &'v mut Value, segment: &str) -> Result<&'v mut Value> {
    match node {
        Value::Object(map) => Ok(map.entry(segment.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index = parse_index(segment).ok_or_else(|| {
                Error::InvalidPath(format!("'{segment}' is not an index of a sequence"))
            })?;
            if index >= items.len() {
                let len = index.checked_add(1).ok_or_else(|| {
                    Error::InvalidPath(format!("index '{segment}' is out of range"))
                })?;
                items.resize(len, Value::Null);
            }
            items.get_mut(index).ok_or_else(|| {
                Error::InvalidPath(format!("index '{segment}' is out of range"))
            })
        }
        other => Err(Error::InvalidPath(format!(
            "cannot set '{segment}' on a non-container value {other}"
        ))),
    }
}

pub fn get_value<'v>(root: &'v Value, path: &DataPath) -> Option<&'v Value> {
    get_in(root, path.segments())
}

pub fn get_value_mut<'v>(root: &'v mut Value, path: &DataPath) -> Option<&'v mut Value> {
    get_in_mut(root, path.segments())
}

fn get_in<'v>(root: &'v Value, segments: &[String]) -> Option<&'v Value> {
    segments.iter().try_fold(root, |node, segment| child(node, segment))
}

fn get_in_mut<'v>(root: &'v mut Value, segments: &[String]) -> Option<&'v mut Value> {
    segments.iter().try_fold(root, |node, segment| child_mut(node, segment))
}

pub fn has_value(root: &Value, path: &DataPath) -> bool {
    get_value(root, path).is_some()
}

/// Writes `value` at `path`, creating intermediate containers. A missing container becomes a
/// sequence when the following segment is an index, a mapping otherwise. Scalars on the way
/// are replaced.
pub fn set_value(root: &mut Value, path: &DataPath, value: Value) -> Result<()> {
    let segments = path.segments();
    check_settable(root, segments)?;
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for (position, segment) in parents.iter().enumerate() {
        let next_is_index = segments.get(position + 1).is_some_and(|s| parse_index(s).is_some());
        let slot = slot_mut(current, segment)?;
        if !slot.is_object() && !slot.is_array() {
            *slot =
                if next_is_index { Value::Array(Vec::new()) } else { Value::Object(Map::new()) };
        }
        current = slot;
    }

    *slot_mut(current, last)? = value;
    Ok(())
}

/// Fails without touching the tree when `set_value` would stop halfway: a non-index segment
/// on a sequence, a non-container root, or an index too far past the end of its sequence.
fn check_settable(root: &Value, segments: &[String]) -> Result<()> {
    let mut node = Some(root);
    for (position, segment) in segments.iter().enumerate() {
        node = match node {
            Some(Value::Object(map)) => map.get(segment),
            Some(Value::Array(items)) => {
                let index = parse_index(segment).ok_or_else(|| {
                    Error::InvalidPath(format!("'{segment}' is not an index of a sequence"))
                })?;
                check_growth(segment, index, items.len())?;
                items.get(index)
            }
            Some(other) if position == 0 => {
                return Err(Error::InvalidPath(format!(
                    "cannot set '{segment}' on a non-container value {other}"
                )));
            }
            // Replaced by a new container, a sequence when indexed.
            _ => {
                if let Some(index) = parse_index(segment) {
                    check_growth(segment, index, 0)?;
                }
                None
            }
        };
    }
    Ok(())
}

fn check_growth(segment: &str, index: usize, len: usize) -> Result<()> {
    if index.saturating_sub(len) > MAX_SEQUENCE_GROWTH {
        return Err(Error::InvalidPath(format!("index '{segment}' is out of range")));
    }
    Ok(())
}

/// Removes the value at `path` and returns it. Deleting the root resets it to an empty mapping.
pub fn delete_value(root: &mut Value, path: &DataPath) -> Option<Value> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Some(std::mem::replace(root, Value::Object(Map::new())));
    };

    match get_in_mut(root, parents)? {
        Value::Object(map) => map.shift_remove(last),
        Value::Array(items) => {
            let index = parse_index(last)?;
            (index < items.len()).then(|| items.remove(index))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_dotted_and_bracket_paths() {
        assert_eq!(DataPath::parse("a.b.c").segments(), ["a", "b", "c"]);
        assert_eq!(DataPath::parse("a[0].b").segments(), ["a", "0", "b"]);
        assert_eq!(DataPath::parse("a[\"x.y\"].z").segments(), ["a", "x.y", "z"]);
        assert_eq!(DataPath::parse("list[1][2]").segments(), ["list", "1", "2"]);
        assert!(DataPath::parse("").is_root());
        assert!(DataPath::from(None).is_root());
    }

    #[test]
    fn string_and_segment_forms_are_identical() {
        assert_eq!(DataPath::from("scripts.build"), DataPath::from(["scripts", "build"]));
        assert_eq!(DataPath::from(vec!["a".to_string()]), DataPath::from("a"));
        assert_eq!(DataPath::from(["a", "b"]).to_string(), "a.b");
    }

    #[test]
    fn recognizes_indexes() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("012"), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("a"), None);
        assert_eq!(parse_index(""), None);
    }

    #[test]
    fn gets_nested_values() {
        let data = json!({"a": {"b": [10, {"c": null}]}});
        assert_eq!(get_value(&data, &"a.b.0".into()), Some(&json!(10)));
        assert_eq!(get_value(&data, &"a.b[1].c".into()), Some(&Value::Null));
        assert!(has_value(&data, &"a.b.1.c".into()));
        assert!(!has_value(&data, &"a.b.2".into()));
        assert!(!has_value(&data, &"a.x".into()));
        assert_eq!(get_value(&data, &DataPath::root()), Some(&data));
    }

    #[test]
    fn set_creates_intermediate_containers() {
        let mut data = json!({});
        set_value(&mut data, &"a.b".into(), json!(1)).unwrap();
        set_value(&mut data, &"list.1.name".into(), json!("x")).unwrap();
        assert_eq!(data, json!({"a": {"b": 1}, "list": [null, {"name": "x"}]}));
    }

    #[test]
    fn set_replaces_scalars_on_the_way() {
        let mut data = json!({"a": 5});
        set_value(&mut data, &"a.b".into(), json!(true)).unwrap();
        assert_eq!(data, json!({"a": {"b": true}}));
    }

    #[test]
    fn set_keeps_position_of_existing_key() {
        let mut data = json!({"x": 1, "y": 2});
        set_value(&mut data, &"x".into(), json!(3)).unwrap();
        let keys: Vec<_> = data.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["x", "y"]);
    }

    #[test]
    fn set_rejects_named_key_in_sequence() {
        let mut data = json!({"ids": [1, 2]});
        assert!(set_value(&mut data, &"ids.name".into(), json!(1)).is_err());
        assert_eq!(data, json!({"ids": [1, 2]}));
    }

    #[test]
    fn set_rejects_indexes_far_past_the_end() {
        let mut data = json!({"ids": [1, 2, 3]});
        let huge = format!("ids.{}", usize::MAX);
        let result = set_value(&mut data, &huge.as_str().into(), json!(1));
        assert!(matches!(result, Err(Error::InvalidPath(_))));
        assert!(set_value(&mut data, &"ids.4000000000".into(), json!(1)).is_err());
        assert!(set_value(&mut data, &"fresh.a.4000000000".into(), json!(1)).is_err());
        assert_eq!(data, json!({"ids": [1, 2, 3]}));

        set_value(&mut data, &"ids.5".into(), json!(6)).unwrap();
        assert_eq!(data, json!({"ids": [1, 2, 3, null, null, 6]}));
    }

    #[test]
    fn failed_set_creates_no_intermediate_containers() {
        let mut data = json!({"ids": [[1]]});
        assert!(set_value(&mut data, &"ids.0.name".into(), json!(1)).is_err());
        assert!(set_value(&mut data, &"extra.ids.99999999".into(), json!(1)).is_err());
        assert_eq!(data, json!({"ids": [[1]]}));
    }

    #[test]
    fn set_on_root_replaces_document() {
        let mut data = json!({"a": 1});
        set_value(&mut data, &DataPath::root(), json!({"b": 2})).unwrap();
        assert_eq!(data, json!({"b": 2}));
    }

    #[test]
    fn delete_preserves_order_of_remaining_keys() {
        let mut data = json!({"a": 1, "b": 2, "c": 3});
        assert_eq!(delete_value(&mut data, &"a".into()), Some(json!(1)));
        let keys: Vec<_> = data.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["b", "c"]);
    }

    #[test]
    fn delete_missing_path_is_noop() {
        let mut data = json!({"a": {"b": 1}});
        assert_eq!(delete_value(&mut data, &"a.c".into()), None);
        assert_eq!(delete_value(&mut data, &"x.y".into()), None);
        assert_eq!(data, json!({"a": {"b": 1}}));
    }

    #[test]
    fn delete_removes_sequence_elements() {
        let mut data = json!({"ids": [1, 2, 3]});
        assert_eq!(delete_value(&mut data, &"ids.1".into()), Some(json!(2)));
        assert_eq!(data, json!({"ids": [1, 3]}));
    }

    #[test]
    fn delete_root_empties_document() {
        let mut data = json!({"a": 1});
        delete_value(&mut data, &DataPath::root());
        assert_eq!(data, json!({}));
    }
}
