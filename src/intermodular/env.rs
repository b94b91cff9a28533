use serde_json::Value;

/// Whether `var` is set to something other than an empty string or `undefined`.
pub fn is_env_set(var: &str) -> bool {
    match std::env::var(var) {
        Ok(value) => !value.is_empty() && value != "undefined",
        Err(_) => false,
    }
}

/// Value of `var` parsed as JSON, or as a plain string when it is not JSON. `default` when the
/// variable is not set.
///
/// ```
/// use intermodular::intermodular::parse_env;
/// use serde_json::json;
///
/// assert_eq!(parse_env("INTERMODULAR_DOC_UNSET", Some(json!(3))), Some(json!(3)));
/// ```
pub fn parse_env(var: &str, default: Option<Value>) -> Option<Value> {
    if !is_env_set(var) {
        return default;
    }
    let value = std::env::var(var).ok()?;
    Some(serde_json::from_str(&value).unwrap_or(Value::String(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Each test uses its own variable, tests run in parallel.
    #[test]
    fn unset_and_undefined_are_not_set() {
        assert!(!is_env_set("INTERMODULAR_TEST_NEVER_SET"));
        unsafe { std::env::set_var("INTERMODULAR_TEST_UNDEFINED", "undefined") };
        assert!(!is_env_set("INTERMODULAR_TEST_UNDEFINED"));
        unsafe { std::env::set_var("INTERMODULAR_TEST_EMPTY", "") };
        assert!(!is_env_set("INTERMODULAR_TEST_EMPTY"));
    }

    #[test]
    fn parses_json_or_falls_back_to_string() {
        unsafe { std::env::set_var("INTERMODULAR_TEST_JSON", r#"{"a":[1,2]}"#) };
        assert_eq!(parse_env("INTERMODULAR_TEST_JSON", None), Some(json!({"a": [1, 2]})));

        unsafe { std::env::set_var("INTERMODULAR_TEST_TEXT", "hello") };
        assert_eq!(parse_env("INTERMODULAR_TEST_TEXT", None), Some(json!("hello")));

        unsafe { std::env::set_var("INTERMODULAR_TEST_BOOL", "true") };
        assert_eq!(parse_env("INTERMODULAR_TEST_BOOL", Some(json!(false))), Some(json!(true)));
    }

    #[test]
    fn default_when_unset() {
        assert_eq!(parse_env("INTERMODULAR_TEST_UNSET", Some(json!(1))), Some(json!(1)));
        assert_eq!(parse_env("INTERMODULAR_TEST_UNSET", None), None);
    }
}
