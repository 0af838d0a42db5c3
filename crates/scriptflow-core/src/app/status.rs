//! Status - 完了した実行のレポート

use serde::Serialize;

use crate::domain::{ActivityRecord, ExecutionId, ProcessInstanceId, VariableScope};

/// Final view of one process run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRun {
    pub process_id: String,
    pub process_instance_id: String,
    pub execution_id: String,
    pub variables: VariableScope,
    pub history: Vec<ActivityRecord>,
}

impl ProcessRun {
    pub fn new(
        process_id: impl Into<String>,
        process_instance_id: ProcessInstanceId,
        execution_id: ExecutionId,
        variables: VariableScope,
        history: Vec<ActivityRecord>,
    ) -> Self {
        Self {
            process_id: process_id.into(),
            process_instance_id: process_instance_id.to_string(),
            execution_id: execution_id.to_string(),
            variables,
            history,
        }
    }

    /// Activity ids in execution order.
    pub fn path(&self) -> Vec<&str> {
        self.history
            .iter()
            .map(|record| record.activity_id.as_str())
            .collect()
    }
}
