use indexmap::IndexSet;
use serde_json::{Map, Value};

/// Reorders `map` in place. Keys listed in `keys` come first, in the given order; the remaining
/// keys follow in their current order. With `keys` absent the map is sorted alphabetically.
/// Listed keys missing from the map are ignored.
///
/// Returns whether the order of the map changed.
pub fn reorder(map: &mut Map<String, Value>, keys: Option<&[String]>) -> bool {
    let order: Vec<String> = match keys {
        Some(keys) => {
            let mut order: IndexSet<&str> =
                keys.iter().map(String::as_str).filter(|k| map.contains_key(*k)).collect();
            order.extend(map.keys().map(String::as_str));
            order.into_iter().map(str::to_string).collect()
        }
        None => {
            let mut order: Vec<String> = map.keys().cloned().collect();
            order.sort();
            order
        }
    };

    if order.iter().eq(map.keys()) {
        return false;
    }

    let mut previous = std::mem::take(map);
    for key in order {
        if let Some(value) = previous.remove(&key) {
            map.insert(key, value);
        }
    }
    true
}
