//! Execution: one token walking a process definition, with its variables.

use std::sync::Arc;

use serde_json::Value;

use super::definition::{ActivityDefinition, ProcessDefinition};
use super::errors::EngineError;
use super::ids::{ExecutionId, ProcessInstanceId};
use super::variables::{VariableError, VariableScope};

/// Runtime state of one process path.
///
/// Behaviours borrow it mutably for the duration of one activity; nothing
/// keeps a reference to the scope beyond that call.
#[derive(Debug, Clone)]
pub struct Execution {
    id: ExecutionId,
    process_instance_id: ProcessInstanceId,
    definition: Arc<ProcessDefinition>,
    current_activity: Option<String>,
    variables: VariableScope,
}

impl Execution {
    /// Create an execution positioned at the definition's start activity.
    pub fn new(
        id: ExecutionId,
        process_instance_id: ProcessInstanceId,
        definition: Arc<ProcessDefinition>,
        variables: VariableScope,
    ) -> Self {
        let current_activity = Some(definition.start.clone());
        Self {
            id,
            process_instance_id,
            definition,
            current_activity,
            variables,
        }
    }

    pub fn id(&self) -> ExecutionId {
        self.id
    }

    pub fn process_instance_id(&self) -> ProcessInstanceId {
        self.process_instance_id
    }

    pub fn definition(&self) -> &Arc<ProcessDefinition> {
        &self.definition
    }

    /// `None` once the execution has ended.
    pub fn current_activity_id(&self) -> Option<&str> {
        self.current_activity.as_deref()
    }

    pub fn current_activity(&self) -> Result<&ActivityDefinition, EngineError> {
        let id = self
            .current_activity
            .as_deref()
            .ok_or(EngineError::ExecutionEnded(self.id))?;
        self.definition
            .activity(id)
            .ok_or_else(|| EngineError::UnknownActivity(id.to_string()))
    }

    pub fn is_ended(&self) -> bool {
        self.current_activity.is_none()
    }

    pub fn variables(&self) -> &VariableScope {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set_variable(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, VariableError> {
        self.variables.set(name, value)
    }

    /// Atomic batch write, see [`VariableScope::set_all`].
    pub fn set_variables<I>(&mut self, entries: I) -> Result<(), VariableError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.variables.set_all(entries)
    }

    pub(crate) fn restore_variables(&mut self, snapshot: VariableScope) {
        self.variables = snapshot;
    }

    /// Complete the current activity and advance the token.
    ///
    /// Moves to the activity's outgoing target, or ends the execution when
    /// there is none.
    pub fn leave(&mut self) -> Result<(), EngineError> {
        let next = self.current_activity()?.outgoing.clone();
        self.current_activity = next;
        Ok(())
    }

    /// Move the token to `activity_id` without completing the current one.
    pub fn redirect_to(&mut self, activity_id: &str) -> Result<(), EngineError> {
        if self.is_ended() {
            return Err(EngineError::ExecutionEnded(self.id));
        }
        if self.definition.activity(activity_id).is_none() {
            return Err(EngineError::UnknownActivity(activity_id.to_string()));
        }
        self.current_activity = Some(activity_id.to_string());
        Ok(())
    }

    pub fn into_variables(self) -> VariableScope {
        self.variables
    }
}
