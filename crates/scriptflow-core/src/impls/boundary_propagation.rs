//! BoundaryErrorPropagation - 境界エラーイベントで業務エラーを捕捉
//!
//! 失敗したアクティビティに付いた境界だけを見ます。
//! 捕捉されなかったエラーは外側のスコープへエスカレーションしません。

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{BoundaryErrorEvent, BusinessError, EngineError, Execution, InfrastructureError};
use crate::ports::ErrorPropagation;

#[derive(Debug, Default, Clone, Copy)]
pub struct BoundaryErrorPropagation;

impl BoundaryErrorPropagation {
    pub fn new() -> Self {
        Self
    }

    /// Exact code match first, then the catch-all.
    fn select<'a>(
        boundaries: &'a [BoundaryErrorEvent],
        error_code: &str,
    ) -> Option<&'a BoundaryErrorEvent> {
        boundaries
            .iter()
            .find(|b| b.error_code.as_deref() == Some(error_code))
            .or_else(|| boundaries.iter().find(|b| b.is_catch_all()))
    }
}

#[async_trait]
impl ErrorPropagation for BoundaryErrorPropagation {
    async fn propagate(
        &self,
        error: &BusinessError,
        execution: &mut Execution,
    ) -> Result<(), EngineError> {
        let activity = execution.current_activity()?;
        let boundary = Self::select(&activity.boundary_errors, error.error_code())
            .cloned()
            .ok_or_else(|| EngineError::UnhandledBusinessError {
                activity: activity.id.clone(),
                error_code: error.error_code().to_string(),
            })?;

        if let Some(variable) = &boundary.error_code_variable {
            execution
                .set_variable(variable.clone(), error.error_code().into())
                .map_err(InfrastructureError::from)?;
        }

        debug!(
            error_code = error.error_code(),
            target = %boundary.target,
            execution = %execution.id(),
            "business error caught by boundary event"
        );
        execution.redirect_to(&boundary.target)
    }
}
