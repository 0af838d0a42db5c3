//! ScriptTaskActivityBehavior - 実行に対して Script Task を走らせる
//!
//! # 処理の流れ
//! 1. 変数スコープのスナップショットを取る
//! 2. タスクの言語と merge フラグで `ScriptEvaluator::evaluate`
//! 3. `result_variable` があれば結果を束縛
//! 4. 成功: アクティビティを離脱
//! 5. 失敗: スナップショットを戻してから
//!    - `ScriptError::Business` → `ErrorPropagation::propagate`、離脱しない
//!    - `ScriptError::Infrastructure` → そのまま返す
//!
//! スナップショットの復元で、評価・merge・結果束縛は一つの単位になります。
//! 書き込みは全部見えるか、何も見えないかのどちらかです。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{
    ActivityOutcome, EngineError, Execution, ScriptError, ScriptTaskDefinition,
};
use crate::ports::{ErrorPropagation, ScriptEvaluator};

use super::ActivityBehavior;

pub struct ScriptTaskActivityBehavior {
    definition: ScriptTaskDefinition,
    evaluator: Arc<dyn ScriptEvaluator>,
    error_propagation: Arc<dyn ErrorPropagation>,
}

impl ScriptTaskActivityBehavior {
    pub fn new(
        definition: ScriptTaskDefinition,
        evaluator: Arc<dyn ScriptEvaluator>,
        error_propagation: Arc<dyn ErrorPropagation>,
    ) -> Self {
        Self {
            definition,
            evaluator,
            error_propagation,
        }
    }

    async fn evaluate_and_bind(&self, execution: &mut Execution) -> Result<Value, ScriptError> {
        let value = self
            .evaluator
            .evaluate(
                &self.definition.script,
                &self.definition.language,
                execution,
                self.definition.store_script_variables,
            )
            .await?;

        if let Some(name) = self.definition.result_variable() {
            execution.set_variable(name, value.clone())?;
        }
        Ok(value)
    }
}

#[async_trait]
impl ActivityBehavior for ScriptTaskActivityBehavior {
    async fn execute(&self, execution: &mut Execution) -> Result<ActivityOutcome, EngineError> {
        let snapshot = execution.variables().clone();

        match self.evaluate_and_bind(execution).await {
            Ok(value) => {
                debug!(
                    activity = execution.current_activity_id().unwrap_or_default(),
                    language = %self.definition.language,
                    result = %value,
                    "script task completed"
                );
                execution.leave()?;
                Ok(ActivityOutcome::Completed)
            }
            Err(err) => {
                execution.restore_variables(snapshot);
                warn!(
                    activity = execution.current_activity_id().unwrap_or_default(),
                    execution = %execution.id(),
                    kind = ?err.kind(),
                    "script task failed: {err}"
                );
                match err {
                    ScriptError::Business(business) => {
                        self.error_propagation.propagate(&business, execution).await?;
                        Ok(ActivityOutcome::ErrorPropagated)
                    }
                    ScriptError::Infrastructure(infra) => Err(EngineError::Infrastructure(infra)),
                }
            }
        }
    }
}
