//! Behavior - トークンがアクティビティに到達したときの振る舞い
//!
//! アクティビティの種類ごとに `ActivityBehavior` を実装し、
//! `ProcessEngine::behavior_for` が trait object として選びます。
//!
//! # 含まれる振る舞い
//! - **ScriptTaskActivityBehavior**: スクリプトを評価し結果を束縛、業務エラーは伝播へ
//! - **PassThroughBehavior**: 開始・終了イベント、すぐに離脱する
//!
//! # 学習ポイント
//! - async trait による動的ディスパッチ
//! - 依存（evaluator, propagation）のコンストラクタ注入

pub mod script_task;

use async_trait::async_trait;

use crate::domain::{ActivityOutcome, EngineError, Execution};

pub use self::script_task::ScriptTaskActivityBehavior;

/// Executes the activity the execution currently points at.
///
/// `Ok(Completed)` means the token advanced, `Ok(ErrorPropagated)` means it
/// was redirected by error propagation. Any `Err` leaves the token where it
/// was.
#[async_trait]
pub trait ActivityBehavior: Send + Sync {
    async fn execute(&self, execution: &mut Execution) -> Result<ActivityOutcome, EngineError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughBehavior;

#[async_trait]
impl ActivityBehavior for PassThroughBehavior {
    async fn execute(&self, execution: &mut Execution) -> Result<ActivityOutcome, EngineError> {
        execution.leave()?;
        Ok(ActivityOutcome::Completed)
    }
}
