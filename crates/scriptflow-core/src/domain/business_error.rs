//! Business errors: faults a process model declares and catches itself.

use serde::Serialize;

/// A declared, process-level fault.
///
/// Raised on purpose by script logic and routed to a boundary error event
/// instead of failing the surrounding operation. The code is what boundary
/// events match on; the message is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
#[error("business error `{error_code}`{}", detail(.message))]
pub struct BusinessError {
    error_code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("business error code must not be empty")]
pub struct EmptyErrorCode;

impl BusinessError {
    pub fn new(error_code: impl Into<String>) -> Result<Self, EmptyErrorCode> {
        let error_code = error_code.into();
        if error_code.trim().is_empty() {
            return Err(EmptyErrorCode);
        }
        Ok(Self {
            error_code,
            message: None,
        })
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn error_code(&self) -> &str {
        &self.error_code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}
