//! Scripting port - スクリプト評価の抽象化
//!
//! - `ScriptEvaluator`: Script Task が使う入口。言語を解決して評価する
//! - `ScriptEngine`: 1 言語分の実装。`ScriptingEngines` に名前で登録する
//!
//! # 学習ポイント
//! - async trait (ScriptEvaluator) と同期 trait (ScriptEngine) の使い分け
//! - `Send + Sync` 境界による trait object の共有

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Execution, ScriptError};

/// Evaluate a script in a named language.
///
/// # Contract
/// - The execution's variable scope is the evaluation environment.
/// - With `store_script_variables`, bindings created or changed by the
///   script are merged back into the scope after a successful evaluation,
///   all at once or not at all.
/// - Failures are tagged: `ScriptError::Business` when the script raised a
///   business error (at any call depth), `ScriptError::Infrastructure`
///   otherwise, including an unregistered language.
///
/// Evaluation may block for as long as the script runs; no timeout is
/// applied here.
#[async_trait]
pub trait ScriptEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        script: &str,
        language: &str,
        execution: &mut Execution,
        store_script_variables: bool,
    ) -> Result<Value, ScriptError>;
}

/// A single scripting language.
///
/// Same contract as [`ScriptEvaluator`] minus language resolution.
pub trait ScriptEngine: Send + Sync {
    /// Name used in error messages.
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        script: &str,
        execution: &mut Execution,
        store_script_variables: bool,
    ) -> Result<Value, ScriptError>;
}
