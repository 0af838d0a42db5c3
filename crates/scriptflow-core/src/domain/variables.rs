//! Variable scope of an execution.
//!
//! Names are unique and the last write wins. Writes are validated: a name
//! must be non-empty and must not shadow one of the bindings the engine
//! injects into scripts (see [`RESERVED_VARIABLES`]).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Names that scripts see as engine-provided bindings and that can never be
/// stored as process variables.
pub const RESERVED_VARIABLES: &[&str] = &["execution"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariableError {
    #[error("variable name must not be empty")]
    EmptyName,

    #[error("variable name `{0}` is reserved")]
    Reserved(String),

    #[error("variables must be given as a JSON object, got {0}")]
    NotAnObject(String),
}

/// Mapping of variable name to JSON value.
///
/// Backed by a `BTreeMap` so iteration (and CLI output) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariableScope {
    values: BTreeMap<String, Value>,
}

impl VariableScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `name` may be written.
    pub fn validate_name(name: &str) -> Result<(), VariableError> {
        if name.trim().is_empty() {
            return Err(VariableError::EmptyName);
        }
        if RESERVED_VARIABLES.contains(&name) {
            return Err(VariableError::Reserved(name.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Write one variable, returning the value it replaced.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, VariableError> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(self.values.insert(name, value))
    }

    /// Write a batch of variables.
    ///
    /// All-or-nothing: every name is validated before the first write, so a
    /// rejected entry leaves the scope untouched.
    pub fn set_all<I>(&mut self, entries: I) -> Result<(), VariableError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let entries: Vec<(String, Value)> = entries.into_iter().collect();
        for (name, _) in &entries {
            Self::validate_name(name)?;
        }
        self.values.extend(entries);
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl TryFrom<Value> for VariableScope {
    type Error = VariableError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err(VariableError::NotAnObject(value.to_string()));
        };
        let mut scope = VariableScope::new();
        scope.set_all(map)?;
        Ok(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_overwrites_and_returns_previous() {
        let mut scope = VariableScope::new();
        assert_eq!(scope.set("x", json!(1)).unwrap(), None);
        assert_eq!(scope.set("x", json!(2)).unwrap(), Some(json!(1)));
        assert_eq!(scope.get("x"), Some(&json!(2)));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn rejects_empty_and_reserved_names() {
        let mut scope = VariableScope::new();
        assert_eq!(scope.set("", json!(1)), Err(VariableError::EmptyName));
        assert_eq!(scope.set("  ", json!(1)), Err(VariableError::EmptyName));
        assert_eq!(
            scope.set("execution", json!(1)),
            Err(VariableError::Reserved("execution".to_string()))
        );
        assert!(scope.is_empty());
    }

    #[test]
    fn set_all_is_all_or_nothing() {
        let mut scope = VariableScope::new();
        scope.set("keep", json!("old")).unwrap();

        let result = scope.set_all(vec![
            ("keep".to_string(), json!("new")),
            ("a".to_string(), json!(1)),
            ("execution".to_string(), json!({})),
        ]);

        assert!(matches!(result, Err(VariableError::Reserved(_))));
        assert_eq!(scope.get("keep"), Some(&json!("old")));
        assert!(!scope.contains("a"));
    }

    #[test]
    fn builds_from_json_object_only() {
        let scope = VariableScope::try_from(json!({"a": 1, "b": [true]})).unwrap();
        assert_eq!(scope.len(), 2);
        assert_eq!(scope.to_json(), json!({"a": 1, "b": [true]}));

        let err = VariableScope::try_from(json!([1, 2])).unwrap_err();
        assert!(matches!(err, VariableError::NotAnObject(_)));
    }
}
