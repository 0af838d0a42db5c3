//! ProcessEngine / ProcessRunner - プロセス上でトークンを進める
//!
//! エンジンは共有の協調者を持ち、生成する振る舞いに渡します。
//! ランナーは 1 つの実行を持ち、`step()` ごとに 1 アクティビティ進めます。
//! 呼び出し側のタスク上で動き、バックグラウンドでは何も走りません。
//!
//! 各ステップは `ActivityState` を
//! PENDING → EVALUATING → COMPLETED | ERROR_PROPAGATED | FAILED と遷移します。

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::app::status::ProcessRun;
use crate::behavior::{ActivityBehavior, PassThroughBehavior, ScriptTaskActivityBehavior};
use crate::domain::{
    ActivityDefinition, ActivityKind, ActivityOutcome, ActivityRecord, ActivityState, EngineError,
    Execution, ProcessDefinition, ScriptError, ScriptTaskDefinition, VariableScope,
};
use crate::impls::ScriptingEngines;
use crate::ports::{ErrorPropagation, IdGenerator, ScriptEvaluator};

pub struct ProcessEngine {
    engines: Arc<ScriptingEngines>,
    error_propagation: Arc<dyn ErrorPropagation>,
    id_generator: Arc<dyn IdGenerator>,
    default_language: String,
    max_steps: usize,
}

impl ProcessEngine {
    pub fn new(
        engines: Arc<ScriptingEngines>,
        error_propagation: Arc<dyn ErrorPropagation>,
        id_generator: Arc<dyn IdGenerator>,
        default_language: String,
        max_steps: usize,
    ) -> Self {
        Self {
            engines,
            error_propagation,
            id_generator,
            default_language,
            max_steps,
        }
    }

    /// Registered language names, sorted.
    pub fn languages(&self) -> Vec<String> {
        self.engines.registered_languages()
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn behavior_for(&self, activity: &ActivityDefinition) -> Box<dyn ActivityBehavior> {
        match &activity.kind {
            ActivityKind::ScriptTask(definition) => {
                let mut definition = definition.clone();
                if definition.language.trim().is_empty() {
                    definition.language = self.default_language.clone();
                }
                Box::new(ScriptTaskActivityBehavior::new(
                    definition,
                    self.engines.clone(),
                    self.error_propagation.clone(),
                ))
            }
            ActivityKind::StartEvent | ActivityKind::EndEvent => Box::new(PassThroughBehavior),
        }
    }

    /// Validate the definition and position a new execution at its start.
    pub fn start(
        &self,
        definition: Arc<ProcessDefinition>,
        variables: VariableScope,
    ) -> Result<ProcessRunner<'_>, EngineError> {
        definition.validate()?;
        let execution = Execution::new(
            self.id_generator.generate_execution_id(),
            self.id_generator.generate_process_instance_id(),
            definition,
            variables,
        );
        info!(
            process = %execution.definition().id,
            process_instance = %execution.process_instance_id(),
            "process started"
        );
        Ok(ProcessRunner {
            engine: self,
            execution,
            history: Vec::new(),
        })
    }

    /// Run a process from start to end.
    pub async fn run(
        &self,
        definition: Arc<ProcessDefinition>,
        variables: VariableScope,
    ) -> Result<ProcessRun, EngineError> {
        let mut runner = self.start(definition, variables)?;
        runner.run_to_end().await?;
        Ok(runner.into_run())
    }

    /// Evaluate one script outside any process, keeping script bindings.
    ///
    /// Returns the script's value and the resulting variables.
    pub async fn evaluate(
        &self,
        language: &str,
        script: &str,
        variables: VariableScope,
    ) -> Result<(Value, VariableScope), ScriptError> {
        let definition = ProcessDefinition::new("eval", "script").with_activity(
            ActivityDefinition::script_task("script", ScriptTaskDefinition::new(script, language)),
        );
        let mut execution = Execution::new(
            self.id_generator.generate_execution_id(),
            self.id_generator.generate_process_instance_id(),
            Arc::new(definition),
            variables,
        );
        let value = self
            .engines
            .evaluate(script, language, &mut execution, true)
            .await?;
        Ok((value, execution.into_variables()))
    }
}

/// One execution being driven by a [`ProcessEngine`].
pub struct ProcessRunner<'a> {
    engine: &'a ProcessEngine,
    execution: Execution,
    history: Vec<ActivityRecord>,
}

impl ProcessRunner<'_> {
    pub fn execution(&self) -> &Execution {
        &self.execution
    }

    pub fn history(&self) -> &[ActivityRecord] {
        &self.history
    }

    pub fn is_ended(&self) -> bool {
        self.execution.is_ended()
    }

    /// Execute the current activity.
    ///
    /// `Ok(None)` once the execution has ended. Errors from the behaviour are
    /// recorded as a failed step and returned unchanged.
    pub async fn step(&mut self) -> Result<Option<ActivityOutcome>, EngineError> {
        let definition = Arc::clone(self.execution.definition());
        let activity = match self.execution.current_activity_id() {
            None => return Ok(None),
            Some(id) => definition
                .activity(id)
                .ok_or_else(|| EngineError::UnknownActivity(id.to_string()))?,
        };

        let state = ActivityState::Pending.transition_to(ActivityState::Evaluating)?;
        debug!(
            activity = %activity.id,
            kind = activity.kind.as_str(),
            execution = %self.execution.id(),
            ?state,
            "executing activity"
        );
        let behavior = self.engine.behavior_for(activity);
        match behavior.execute(&mut self.execution).await {
            Ok(outcome) => {
                let record = ActivityRecord::finished(activity.id.clone(), outcome);
                state.transition_to(record.state)?;
                self.history.push(record);
                Ok(Some(outcome))
            }
            Err(err) => {
                state.transition_to(ActivityState::Failed)?;
                warn!(activity = %activity.id, error = %err, "activity failed");
                self.history
                    .push(ActivityRecord::failed(activity.id.clone(), err.to_string()));
                Err(err)
            }
        }
    }

    /// Step until the execution ends, bounded by the engine's `max_steps`.
    pub async fn run_to_end(&mut self) -> Result<(), EngineError> {
        let max_steps = self.engine.max_steps();
        let mut steps = 0;
        while !self.execution.is_ended() {
            if steps == max_steps {
                return Err(EngineError::MaxStepsExceeded(max_steps));
            }
            self.step().await?;
            steps += 1;
        }
        info!(
            process = %self.execution.definition().id,
            process_instance = %self.execution.process_instance_id(),
            steps,
            "process ended"
        );
        Ok(())
    }

    pub fn into_run(self) -> ProcessRun {
        let process_id = self.execution.definition().id.clone();
        let process_instance_id = self.execution.process_instance_id();
        let execution_id = self.execution.id();
        ProcessRun::new(
            process_id,
            process_instance_id,
            execution_id,
            self.execution.into_variables(),
            self.history,
        )
    }
}
