//! RhaiScriptEngine - Rhai インタプリタによる `ScriptEngine`
//!
//! 実行の変数を Rhai の `Scope` に積み、`execution` 定数で
//! `{ id, process_instance_id, activity_id }` を公開します。
//!
//! スクリプトは `throw_business_error(code)` または
//! `throw_business_error(code, message)` で業務エラーを投げます。
//! 投げた値は型付き `Dynamic` として Rhai を通り抜けるので、
//! 入れ子の関数呼び出しは根本原因まで剥がしてから型で分類します。
//!
//! # 学習ポイント
//! - `rhai::serde` による JSON <-> `Dynamic` 変換
//! - `EvalAltResult` の入れ子（`ErrorInFunctionCall`）の扱い
//! - `sync` feature による `Send + Sync` なエンジン共有

use std::collections::{HashMap, HashSet};

use rhai::serde::to_dynamic;
use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString, Position, Scope};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::domain::{
    BusinessError, EmptyErrorCode, Execution, InfrastructureError, RESERVED_VARIABLES,
    ScriptError,
};
use crate::ports::ScriptEngine;

const ENGINE_NAME: &str = "rhai";

/// Sandbox limits. `None` keeps Rhai's default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLimits {
    #[serde(default)]
    pub max_operations: Option<u64>,

    #[serde(default)]
    pub max_call_levels: Option<usize>,

    #[serde(default)]
    pub max_expr_depth: Option<usize>,

    #[serde(default)]
    pub max_string_size: Option<usize>,
}

pub struct RhaiScriptEngine {
    engine: Engine,
}

impl RhaiScriptEngine {
    pub fn new(limits: &ScriptLimits) -> Self {
        let mut engine = Engine::new();

        if let Some(max) = limits.max_operations {
            engine.set_max_operations(max);
        }
        if let Some(max) = limits.max_call_levels {
            engine.set_max_call_levels(max);
        }
        if let Some(max) = limits.max_expr_depth {
            engine.set_max_expr_depths(max, max);
        }
        if let Some(max) = limits.max_string_size {
            engine.set_max_string_size(max);
        }

        engine.on_print(|text| info!(target: "scriptflow::script", "{text}"));
        engine.on_debug(|text, source, pos| {
            debug!(target: "scriptflow::script", source = source.unwrap_or(""), %pos, "{text}");
        });

        engine.register_fn(
            "throw_business_error",
            |code: ImmutableString| -> Result<(), Box<EvalAltResult>> {
                Err(raise(code.as_str(), None))
            },
        );
        engine.register_fn(
            "throw_business_error",
            |code: ImmutableString, message: ImmutableString| -> Result<(), Box<EvalAltResult>> {
                Err(raise(code.as_str(), Some(message.as_str())))
            },
        );

        Self { engine }
    }

    /// Scope for one evaluation, plus each pushed variable as it reads back
    /// out of Rhai.
    fn build_scope(
        &self,
        execution: &Execution,
    ) -> Result<(Scope<'static>, HashMap<String, Value>), InfrastructureError> {
        let mut scope = Scope::new();
        let mut pushed = HashMap::new();
        for (name, value) in execution.variables().iter() {
            let value = to_rhai(value)?;
            pushed.insert(name.to_string(), to_json(&value)?);
            scope.push_dynamic(name.to_string(), value);
        }

        let binding = json!({
            "id": execution.id().to_string(),
            "process_instance_id": execution.process_instance_id().to_string(),
            "activity_id": execution.current_activity_id(),
        });
        scope.push_constant_dynamic("execution", to_rhai(&binding)?);
        Ok((scope, pushed))
    }

    /// Top-level bindings the script added or reassigned.
    ///
    /// Only the innermost entry of a shadowed name counts. Values are
    /// compared with what was pushed, not with the execution's JSON, since
    /// some JSON numbers do not survive the trip into Rhai unchanged.
    fn changed_bindings(
        scope: &Scope<'_>,
        pushed: &HashMap<String, Value>,
    ) -> Result<Vec<(String, Value)>, InfrastructureError> {
        let entries: Vec<(&str, bool, Dynamic)> = scope.iter().collect();
        let mut seen = HashSet::new();
        let mut changed = Vec::new();
        for (name, is_constant, value) in entries.into_iter().rev() {
            if !seen.insert(name) {
                continue;
            }
            if is_constant || RESERVED_VARIABLES.contains(&name) {
                continue;
            }
            let value = to_json(&value)?;
            if pushed.get(name) != Some(&value) {
                changed.push((name.to_string(), value));
            }
        }
        Ok(changed)
    }
}

impl Default for RhaiScriptEngine {
    fn default() -> Self {
        Self::new(&ScriptLimits::default())
    }
}

impl ScriptEngine for RhaiScriptEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn evaluate(
        &self,
        script: &str,
        execution: &mut Execution,
        store_script_variables: bool,
    ) -> Result<Value, ScriptError> {
        let (mut scope, pushed) = self.build_scope(execution)?;

        let ast = self
            .engine
            .compile_with_scope(&scope, script)
            .map_err(|e| InfrastructureError::Compile {
                language: ENGINE_NAME.to_string(),
                message: e.to_string(),
            })?;

        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|e| classify(*e))?;
        let result = to_json(&result)?;

        if store_script_variables {
            let changed = Self::changed_bindings(&scope, &pushed)?;
            execution.set_variables(changed)?;
        }

        Ok(result)
    }
}

fn raise(code: &str, message: Option<&str>) -> Box<EvalAltResult> {
    let payload = match BusinessError::new(code) {
        Ok(error) => match message {
            Some(message) => Dynamic::from(error.with_message(message)),
            None => Dynamic::from(error),
        },
        Err(invalid) => Dynamic::from(invalid),
    };
    Box::new(EvalAltResult::ErrorRuntime(payload, Position::NONE))
}

/// Follow Rhai's call wrappers down to the error that started it.
fn root_cause(mut error: &EvalAltResult) -> &EvalAltResult {
    loop {
        match error {
            EvalAltResult::ErrorInFunctionCall(_, _, inner, _)
            | EvalAltResult::ErrorInModule(_, inner, _) => error = inner.as_ref(),
            _ => return error,
        }
    }
}

fn classify(error: EvalAltResult) -> ScriptError {
    if let EvalAltResult::ErrorRuntime(payload, _) = root_cause(&error) {
        if let Some(business) = payload.clone().try_cast::<BusinessError>() {
            return ScriptError::Business(business);
        }
        if let Some(invalid) = payload.clone().try_cast::<EmptyErrorCode>() {
            return InfrastructureError::InvalidBusinessError(invalid).into();
        }
    }
    InfrastructureError::Runtime {
        language: ENGINE_NAME.to_string(),
        message: error.to_string(),
    }
    .into()
}

fn to_rhai(value: &Value) -> Result<Dynamic, InfrastructureError> {
    to_dynamic(value).map_err(|e| InfrastructureError::Conversion(e.to_string()))
}

fn to_json(value: &Dynamic) -> Result<Value, InfrastructureError> {
    serde_json::to_value(value).map_err(|e| InfrastructureError::Conversion(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ActivityDefinition, ExecutionId, ProcessDefinition, ProcessInstanceId, VariableScope,
    };
    use std::sync::Arc;
    use ulid::Ulid;

    fn execution(variables: Value) -> Execution {
        let definition =
            ProcessDefinition::new("p", "task").with_activity(ActivityDefinition::end_event("task"));
        Execution::new(
            ExecutionId::from_ulid(Ulid::new()),
            ProcessInstanceId::from_ulid(Ulid::new()),
            Arc::new(definition),
            VariableScope::try_from(variables).unwrap(),
        )
    }

    #[test]
    fn returns_script_value() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({}));

        let value = engine.evaluate("return 2+2", &mut exec, false).unwrap();
        assert_eq!(value, json!(4));
        assert!(exec.variables().is_empty());
    }

    #[test]
    fn reads_process_variables() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({"amount": 20, "customer": {"name": "Ada"}}));

        let value = engine
            .evaluate(r#"customer.name + ":" + (amount * 2)"#, &mut exec, false)
            .unwrap();
        assert_eq!(value, json!("Ada:40"));
    }

    #[test]
    fn exposes_execution_binding() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({}));

        let value = engine.evaluate("execution.activity_id", &mut exec, false).unwrap();
        assert_eq!(value, json!("task"));
    }

    #[test]
    fn unit_result_is_null() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({}));

        let value = engine.evaluate("let y = 10;", &mut exec, false).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn stores_new_and_changed_bindings_when_asked() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({"count": 1, "untouched": "same"}));

        engine
            .evaluate("let y = 10; count += 1;", &mut exec, true)
            .unwrap();

        assert_eq!(exec.variable("y"), Some(&json!(10)));
        assert_eq!(exec.variable("count"), Some(&json!(2)));
        assert_eq!(exec.variable("untouched"), Some(&json!("same")));
        assert!(exec.variable("execution").is_none());
    }

    #[test]
    fn untouched_values_are_not_rewritten() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({"big": u64::MAX, "n": 1}));

        let value = engine.evaluate("n + 1", &mut exec, true).unwrap();

        assert_eq!(value, json!(2));
        assert_eq!(exec.variable("big"), Some(&json!(u64::MAX)));
        assert_eq!(exec.variables().len(), 2);
    }

    #[test]
    fn innermost_shadowed_binding_wins() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({"count": 1}));

        let value = engine
            .evaluate("count = 7; let count = 1; count", &mut exec, true)
            .unwrap();
        assert_eq!(value, json!(1));
        assert_eq!(exec.variable("count"), Some(&json!(1)));

        engine
            .evaluate("let count = 5; let count = count * 2;", &mut exec, true)
            .unwrap();
        assert_eq!(exec.variable("count"), Some(&json!(10)));
    }

    #[test]
    fn script_locals_stay_local_by_default() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({"count": 1}));

        engine
            .evaluate("let y = 10; count += 1;", &mut exec, false)
            .unwrap();

        assert!(exec.variable("y").is_none());
        assert_eq!(exec.variable("count"), Some(&json!(1)));
    }

    #[test]
    fn business_error_is_tagged() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({}));

        let err = engine
            .evaluate(
                r#"throw_business_error("INSUFFICIENT_FUNDS", "balance too low")"#,
                &mut exec,
                false,
            )
            .unwrap_err();

        let ScriptError::Business(business) = err else {
            panic!("expected a business error, got {err:?}");
        };
        assert_eq!(business.error_code(), "INSUFFICIENT_FUNDS");
        assert_eq!(business.message(), Some("balance too low"));
    }

    #[test]
    fn business_error_from_nested_function_is_unwrapped() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({}));

        let script = r#"
            fn check(balance) {
                if balance < 10 { throw_business_error("LOW_BALANCE"); }
                balance
            }
            fn outer(b) { check(b) }
            outer(3)
        "#;
        let err = engine.evaluate(script, &mut exec, true).unwrap_err();

        assert!(matches!(err, ScriptError::Business(ref e) if e.error_code() == "LOW_BALANCE"));
        assert!(exec.variables().is_empty());
    }

    #[test]
    fn business_error_does_not_merge_bindings() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({}));

        let err = engine
            .evaluate(r#"let y = 1; throw_business_error("E")"#, &mut exec, true)
            .unwrap_err();

        assert!(matches!(err, ScriptError::Business(_)));
        assert!(exec.variable("y").is_none());
    }

    #[test]
    fn plain_throw_is_infrastructure() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({}));

        let err = engine
            .evaluate(r#"throw "INSUFFICIENT_FUNDS""#, &mut exec, false)
            .unwrap_err();

        assert!(matches!(
            err,
            ScriptError::Infrastructure(InfrastructureError::Runtime { .. })
        ));
    }

    #[test]
    fn empty_business_code_is_infrastructure() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({}));

        let err = engine
            .evaluate(r#"throw_business_error("")"#, &mut exec, false)
            .unwrap_err();

        assert_eq!(
            err,
            ScriptError::Infrastructure(InfrastructureError::InvalidBusinessError(EmptyErrorCode))
        );
    }

    #[test]
    fn syntax_error_is_compile_failure() {
        let engine = RhaiScriptEngine::default();
        let mut exec = execution(json!({}));

        let err = engine.evaluate("let = ;", &mut exec, false).unwrap_err();

        assert!(matches!(
            err,
            ScriptError::Infrastructure(InfrastructureError::Compile { ref language, .. })
                if language == "rhai"
        ));
    }

    #[test]
    fn operation_limit_aborts_runaway_scripts() {
        let engine = RhaiScriptEngine::new(&ScriptLimits {
            max_operations: Some(1_000),
            ..ScriptLimits::default()
        });
        let mut exec = execution(json!({}));

        let err = engine.evaluate("loop {}", &mut exec, false).unwrap_err();

        assert_eq!(err.kind(), crate::domain::FaultKind::Infrastructure);
    }
}
