//! ErrorPropagation port - 業務エラーをプロセスグラフ上で伝播

use async_trait::async_trait;

use crate::domain::{BusinessError, EngineError, Execution};

/// Finds the construct that catches a business error and moves the token
/// there.
///
/// Called at most once per failed activity. Returning `Ok(())` means the
/// execution has been redirected; an error means nothing caught it.
#[async_trait]
pub trait ErrorPropagation: Send + Sync {
    async fn propagate(
        &self,
        error: &BusinessError,
        execution: &mut Execution,
    ) -> Result<(), EngineError>;
}
