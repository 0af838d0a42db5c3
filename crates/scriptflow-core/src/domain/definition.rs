//! Process definitions: the immutable graph an execution walks.
//!
//! Only what a single token needs is modelled: each activity has at most one
//! outgoing target, plus boundary error events that catch business errors
//! raised while the activity runs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Configuration of a script task, fixed when the definition is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTaskDefinition {
    pub script: String,

    /// Name of the scripting engine, e.g. `rhai`. Empty selects the
    /// engine's default language.
    #[serde(default)]
    pub language: String,

    /// Variable that receives the script's return value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_variable: Option<String>,

    /// Copy top-level bindings created by the script back into the scope.
    #[serde(default)]
    pub store_script_variables: bool,
}

impl ScriptTaskDefinition {
    pub fn new(script: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            language: language.into(),
            result_variable: None,
            store_script_variables: false,
        }
    }

    pub fn with_result_variable(mut self, name: impl Into<String>) -> Self {
        self.result_variable = Some(name.into());
        self
    }

    pub fn with_store_script_variables(mut self, store: bool) -> Self {
        self.store_script_variables = store;
        self
    }

    /// The result variable, with an empty name treated as unset.
    pub fn result_variable(&self) -> Option<&str> {
        self.result_variable.as_deref().filter(|name| !name.is_empty())
    }
}

/// What kind of node an activity is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    StartEvent,
    ScriptTask(ScriptTaskDefinition),
    EndEvent,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::StartEvent => "start_event",
            ActivityKind::ScriptTask(_) => "script_task",
            ActivityKind::EndEvent => "end_event",
        }
    }
}

/// Error boundary event attached to an activity.
///
/// `error_code: None` catches every business error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryErrorEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    pub target: String,

    /// Variable that receives the caught error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code_variable: Option<String>,
}

impl BoundaryErrorEvent {
    pub fn catching(error_code: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            error_code: Some(error_code.into()),
            target: target.into(),
            error_code_variable: None,
        }
    }

    pub fn catch_all(target: impl Into<String>) -> Self {
        Self {
            error_code: None,
            target: target.into(),
            error_code_variable: None,
        }
    }

    pub fn storing_code_in(mut self, variable: impl Into<String>) -> Self {
        self.error_code_variable = Some(variable.into());
        self
    }

    pub fn is_catch_all(&self) -> bool {
        self.error_code.is_none()
    }

    pub fn catches(&self, error_code: &str) -> bool {
        match &self.error_code {
            Some(code) => code == error_code,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    pub id: String,

    pub kind: ActivityKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boundary_errors: Vec<BoundaryErrorEvent>,
}

impl ActivityDefinition {
    pub fn new(id: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            outgoing: None,
            boundary_errors: Vec::new(),
        }
    }

    pub fn start_event(id: impl Into<String>) -> Self {
        Self::new(id, ActivityKind::StartEvent)
    }

    pub fn script_task(id: impl Into<String>, definition: ScriptTaskDefinition) -> Self {
        Self::new(id, ActivityKind::ScriptTask(definition))
    }

    pub fn end_event(id: impl Into<String>) -> Self {
        Self::new(id, ActivityKind::EndEvent)
    }

    pub fn then(mut self, target: impl Into<String>) -> Self {
        self.outgoing = Some(target.into());
        self
    }

    pub fn on_error(mut self, boundary: BoundaryErrorEvent) -> Self {
        self.boundary_errors.push(boundary);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("invalid process definition JSON: {0}")]
    Parse(String),

    #[error("duplicate activity id `{0}`")]
    DuplicateActivity(String),

    #[error("start activity `{0}` is not defined")]
    UnknownStart(String),

    #[error("activity `{activity}` points to unknown activity `{target}`")]
    UnknownTarget { activity: String, target: String },

    #[error("activity `{0}` declares more than one catch-all error boundary")]
    MultipleCatchAll(String),

    #[error("activity `{activity}` declares error code `{error_code}` twice")]
    DuplicateErrorCode { activity: String, error_code: String },
}

/// A process graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub id: String,
    pub start: String,
    pub activities: Vec<ActivityDefinition>,
}

impl ProcessDefinition {
    pub fn new(id: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start: start.into(),
            activities: Vec::new(),
        }
    }

    pub fn with_activity(mut self, activity: ActivityDefinition) -> Self {
        self.activities.push(activity);
        self
    }

    /// Parse and validate a definition.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        let definition: ProcessDefinition =
            serde_json::from_str(json).map_err(|e| DefinitionError::Parse(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn activity(&self, id: &str) -> Option<&ActivityDefinition> {
        self.activities.iter().find(|activity| activity.id == id)
    }

    /// Check graph consistency.
    ///
    /// - activity ids are unique
    /// - the start activity and every outgoing/boundary target exist
    /// - an activity has at most one catch-all boundary and no duplicate codes
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut ids = HashSet::new();
        for activity in &self.activities {
            if !ids.insert(activity.id.as_str()) {
                return Err(DefinitionError::DuplicateActivity(activity.id.clone()));
            }
        }

        if !ids.contains(self.start.as_str()) {
            return Err(DefinitionError::UnknownStart(self.start.clone()));
        }

        for activity in &self.activities {
            let targets = activity
                .outgoing
                .iter()
                .chain(activity.boundary_errors.iter().map(|b| &b.target));
            for target in targets {
                if !ids.contains(target.as_str()) {
                    return Err(DefinitionError::UnknownTarget {
                        activity: activity.id.clone(),
                        target: target.clone(),
                    });
                }
            }

            let mut catch_all = false;
            let mut codes = HashSet::new();
            for boundary in &activity.boundary_errors {
                match &boundary.error_code {
                    None if catch_all => {
                        return Err(DefinitionError::MultipleCatchAll(activity.id.clone()));
                    }
                    None => catch_all = true,
                    Some(code) => {
                        if !codes.insert(code.as_str()) {
                            return Err(DefinitionError::DuplicateErrorCode {
                                activity: activity.id.clone(),
                                error_code: code.clone(),
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment_process() -> ProcessDefinition {
        ProcessDefinition::new("payment", "start")
            .with_activity(ActivityDefinition::start_event("start").then("charge"))
            .with_activity(
                ActivityDefinition::script_task(
                    "charge",
                    ScriptTaskDefinition::new("amount * 2", "rhai").with_result_variable("total"),
                )
                .then("end")
                .on_error(BoundaryErrorEvent::catching("INSUFFICIENT_FUNDS", "declined")),
            )
            .with_activity(ActivityDefinition::end_event("declined"))
            .with_activity(ActivityDefinition::end_event("end"))
    }

    #[test]
    fn valid_definition_passes() {
        payment_process().validate().unwrap();
    }

    #[test]
    fn empty_result_variable_counts_as_unset() {
        let def = ScriptTaskDefinition::new("1", "rhai").with_result_variable("");
        assert_eq!(def.result_variable(), None);
        assert!(!def.store_script_variables);
    }

    #[test]
    fn parses_json_with_tagged_kinds() {
        let json = r#"
        {
          "id": "p",
          "start": "s",
          "activities": [
            { "id": "s", "kind": { "type": "start_event" }, "outgoing": "t" },
            {
              "id": "t",
              "kind": {
                "type": "script_task",
                "script": "let y = 10;",
                "language": "rhai",
                "store_script_variables": true
              },
              "outgoing": "e",
              "boundary_errors": [ { "target": "e", "error_code_variable": "code" } ]
            },
            { "id": "e", "kind": { "type": "end_event" } }
          ]
        }"#;

        let def = ProcessDefinition::from_json(json).unwrap();
        let task = def.activity("t").unwrap();
        let ActivityKind::ScriptTask(script) = &task.kind else {
            panic!("expected a script task");
        };
        assert!(script.store_script_variables);
        assert_eq!(script.result_variable(), None);
        assert!(task.boundary_errors[0].is_catch_all());
    }

    #[test]
    fn rejects_unknown_targets_and_start() {
        let missing_target = ProcessDefinition::new("p", "s")
            .with_activity(ActivityDefinition::start_event("s").then("nowhere"));
        assert!(matches!(
            missing_target.validate(),
            Err(DefinitionError::UnknownTarget { target, .. }) if target == "nowhere"
        ));

        let missing_start = ProcessDefinition::new("p", "x")
            .with_activity(ActivityDefinition::end_event("s"));
        assert_eq!(
            missing_start.validate(),
            Err(DefinitionError::UnknownStart("x".to_string()))
        );
    }

    #[test]
    fn rejects_ambiguous_boundaries() {
        let two_catch_alls = ProcessDefinition::new("p", "s")
            .with_activity(
                ActivityDefinition::start_event("s")
                    .on_error(BoundaryErrorEvent::catch_all("s"))
                    .on_error(BoundaryErrorEvent::catch_all("s")),
            );
        assert_eq!(
            two_catch_alls.validate(),
            Err(DefinitionError::MultipleCatchAll("s".to_string()))
        );

        let duplicate_code = ProcessDefinition::new("p", "s")
            .with_activity(
                ActivityDefinition::start_event("s")
                    .on_error(BoundaryErrorEvent::catching("E", "s"))
                    .on_error(BoundaryErrorEvent::catching("E", "s")),
            );
        assert!(matches!(
            duplicate_code.validate(),
            Err(DefinitionError::DuplicateErrorCode { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_ids_and_bad_json() {
        let dup = ProcessDefinition::new("p", "s")
            .with_activity(ActivityDefinition::start_event("s"))
            .with_activity(ActivityDefinition::end_event("s"));
        assert_eq!(
            dup.validate(),
            Err(DefinitionError::DuplicateActivity("s".to_string()))
        );

        assert!(matches!(
            ProcessDefinition::from_json("{"),
            Err(DefinitionError::Parse(_))
        ));
    }
}
