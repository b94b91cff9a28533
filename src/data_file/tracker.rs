use indexmap::IndexSet;
use serde::Serialize;

/// Keys written and removed through a data file since it was loaded, in first-touch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModifiedKeys {
    pub set: Vec<String>,
    pub deleted: Vec<String>,
}

impl ModifiedKeys {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.deleted.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MutationTracker {
    set: IndexSet<String>,
    deleted: IndexSet<String>,
}

impl MutationTracker {
    pub fn record_set(&mut self, key: String) {
        self.set.insert(key);
    }

    pub fn record_deleted(&mut self, key: String) {
        self.deleted.insert(key);
    }

    pub fn clear(&mut self) {
        self.set.clear();
        self.deleted.clear();
    }

    pub fn snapshot(&self) -> ModifiedKeys {
        ModifiedKeys {
            set: self.set.iter().cloned().collect(),
            deleted: self.deleted.iter().cloned().collect(),
        }
    }

    /// Recorded keys starting with at least one `include` prefix (all keys when `include` is
    /// empty) and with no `exclude` prefix.
    pub fn filtered(&self, include: &[&str], exclude: &[&str]) -> ModifiedKeys {
        let keep = |key: &&String| {
            (include.is_empty() || include.iter().any(|prefix| key.starts_with(prefix)))
                && !exclude.iter().any(|prefix| key.starts_with(prefix))
        };
        ModifiedKeys {
            set: self.set.iter().filter(keep).cloned().collect(),
            deleted: self.deleted.iter().filter(keep).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> MutationTracker {
        let mut tracker = MutationTracker::default();
        tracker.record_set("name".to_string());
        tracker.record_set("scripts.build".to_string());
        tracker.record_set("scripts.test".to_string());
        tracker.record_deleted("private".to_string());
        tracker
    }

    #[test]
    fn keeps_first_touch_order_without_duplicates() {
        let mut tracker = tracker();
        tracker.record_set("name".to_string());
        let keys = tracker.snapshot();
        assert_eq!(keys.set, ["name", "scripts.build", "scripts.test"]);
        assert_eq!(keys.deleted, ["private"]);
    }

    #[test]
    fn key_may_be_both_set_and_deleted() {
        let mut tracker = tracker();
        tracker.record_set("private".to_string());
        let keys = tracker.snapshot();
        assert_eq!(keys.deleted, ["private"]);
        assert_eq!(keys.set.last().map(String::as_str), Some("private"));
    }

    #[test]
    fn filters_by_key_prefix() {
        let keys = tracker().filtered(&["scripts"], &["scripts.test"]);
        assert_eq!(keys.set, ["scripts.build"]);
        assert!(keys.deleted.is_empty());

        let keys = tracker().filtered(&[], &["name"]);
        assert_eq!(keys.set, ["scripts.build", "scripts.test"]);
        assert_eq!(keys.deleted, ["private"]);

        let keys = tracker().filtered(&["scripts.b", "pri"], &[]);
        assert_eq!(keys.set, ["scripts.build"]);
        assert_eq!(keys.deleted, ["private"]);
    }
}
