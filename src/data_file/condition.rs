//! Preconditions guarding modifications of a data file.

use serde_json::Value;
use std::fmt::Display;

use super::equal::deep_equal_opt;

/// Kind of a single precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    IfNotExists,
    IfExists,
    IfEqual,
    IfNotEqual,
}

impl Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConditionKind::IfNotExists => "ifNotExists",
            ConditionKind::IfExists => "ifExists",
            ConditionKind::IfEqual => "ifEqual",
            ConditionKind::IfNotEqual => "ifNotEqual",
        };
        write!(f, "{name}")
    }
}

/// Preconditions for `set`, `delete` and `assign`. An empty condition always allows the
/// modification.
///
/// ```
/// use intermodular::data_file::ModifyCondition;
///
/// let condition = ModifyCondition::new().if_exists().if_not_equal("b");
/// assert!(!condition.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifyCondition {
    pub if_not_exists: bool,
    pub if_exists: bool,
    pub if_equal: Option<Value>,
    pub if_not_equal: Option<Value>,
}

impl ModifyCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn if_equal<V: Into<Value>>(mut self, value: V) -> Self {
        self.if_equal = Some(value.into());
        self
    }

    pub fn if_not_equal<V: Into<Value>>(mut self, value: V) -> Self {
        self.if_not_equal = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.if_not_exists
            && !self.if_exists
            && self.if_equal.is_none()
            && self.if_not_equal.is_none()
    }

    /// Checks every given condition against `current`, the value presently stored at the key.
    pub fn evaluate(&self, current: Option<&Value>) -> Evaluation {
        let mut checks = Vec::new();
        if self.if_not_exists {
            checks.push(Check { kind: ConditionKind::IfNotExists, satisfied: current.is_none() });
        }
        if self.if_exists {
            checks.push(Check { kind: ConditionKind::IfExists, satisfied: current.is_some() });
        }
        if let Some(expected) = &self.if_equal {
            checks.push(Check {
                kind: ConditionKind::IfEqual,
                satisfied: deep_equal_opt(current, Some(expected)),
            });
        }
        if let Some(unexpected) = &self.if_not_equal {
            checks.push(Check {
                kind: ConditionKind::IfNotEqual,
                satisfied: !deep_equal_opt(current, Some(unexpected)),
            });
        }
        Evaluation { checks }
    }

    /// Value a condition compares against, used when reporting a check.
    pub fn operand(&self, kind: ConditionKind) -> Option<&Value> {
        match kind {
            ConditionKind::IfEqual => self.if_equal.as_ref(),
            ConditionKind::IfNotEqual => self.if_not_equal.as_ref(),
            ConditionKind::IfExists | ConditionKind::IfNotExists => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Check {
    pub kind: ConditionKind,
    pub satisfied: bool,
}

/// Result of [`ModifyCondition::evaluate`]: one check per given condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub checks: Vec<Check>,
}

impl Evaluation {
    pub fn is_satisfied(&self) -> bool {
        self.checks.iter().all(|c| c.satisfied)
    }

    pub fn rejections(&self) -> Vec<ConditionKind> {
        self.checks.iter().filter(|c| !c.satisfied).map(|c| c.kind).collect()
    }

    /// Comma separated names of the unsatisfied conditions.
    pub fn reasons(&self) -> String {
        self.rejections().iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_condition_is_satisfied() {
        let evaluation = ModifyCondition::new().evaluate(None);
        assert!(evaluation.is_satisfied());
        assert!(evaluation.checks.is_empty());
    }

    #[test]
    fn existence_conditions() {
        let value = json!("x");
        assert!(ModifyCondition::new().if_exists().evaluate(Some(&value)).is_satisfied());
        assert!(!ModifyCondition::new().if_exists().evaluate(None).is_satisfied());
        assert!(ModifyCondition::new().if_not_exists().evaluate(None).is_satisfied());
        assert!(!ModifyCondition::new().if_not_exists().evaluate(Some(&value)).is_satisfied());
    }

    #[test]
    fn equality_uses_deep_comparison() {
        let value = json!({"a": [1, 2], "b": 1});
        let condition = ModifyCondition::new().if_equal(json!({"b": 1.0, "a": [1, 2]}));
        assert!(condition.evaluate(Some(&value)).is_satisfied());

        let condition = ModifyCondition::new().if_not_equal(json!({"b": 1, "a": [1, 2]}));
        assert!(!condition.evaluate(Some(&value)).is_satisfied());
    }

    #[test]
    fn not_equal_is_satisfied_when_absent() {
        let condition = ModifyCondition::new().if_not_equal("x");
        assert!(condition.evaluate(None).is_satisfied());
    }

    #[test]
    fn reports_every_rejection() {
        let value = json!("Doe");
        let condition =
            ModifyCondition::new().if_not_exists().if_equal("Smith").if_not_equal("Doe");
        let evaluation = condition.evaluate(Some(&value));
        assert_eq!(
            evaluation.rejections(),
            [ConditionKind::IfNotExists, ConditionKind::IfEqual, ConditionKind::IfNotEqual]
        );
        assert_eq!(evaluation.reasons(), "ifNotExists, ifEqual, ifNotEqual");
    }
}
