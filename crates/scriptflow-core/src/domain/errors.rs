//! Error types and their classification.
//!
//! The scripting subsystem reports failures as a tagged [`ScriptError`]: the
//! variant alone decides whether a failure is a business fault (routed through
//! the process model) or an infrastructure fault (returned to the caller).
//! Nothing here inspects messages or codes to classify.

use serde::{Deserialize, Serialize};

use super::business_error::{BusinessError, EmptyErrorCode};
use super::definition::DefinitionError;
use super::ids::ExecutionId;
use super::state::InvalidTransition;
use super::variables::VariableError;

/// How a failure is handled.
///
/// - `Business`: recovered inside the process model (boundary error event)
/// - `Infrastructure`: aborts the step and surfaces to the caller unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    Business,
    Infrastructure,
}

/// Failures that are not part of the process model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InfrastructureError {
    #[error("no script engine registered for language `{0}`")]
    UnknownLanguage(String),

    #[error("failed to compile {language} script: {message}")]
    Compile { language: String, message: String },

    #[error("{language} script failed: {message}")]
    Runtime { language: String, message: String },

    #[error("cannot convert script value: {0}")]
    Conversion(String),

    #[error("script raised an invalid business error: {0}")]
    InvalidBusinessError(#[from] EmptyErrorCode),

    #[error(transparent)]
    Variable(#[from] VariableError),
}

/// Result tag returned by the scripting subsystem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("{0}")]
    Business(BusinessError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

impl ScriptError {
    pub fn kind(&self) -> FaultKind {
        match self {
            ScriptError::Business(_) => FaultKind::Business,
            ScriptError::Infrastructure(_) => FaultKind::Infrastructure,
        }
    }
}

impl From<BusinessError> for ScriptError {
    fn from(error: BusinessError) -> Self {
        ScriptError::Business(error)
    }
}

impl From<VariableError> for ScriptError {
    fn from(error: VariableError) -> Self {
        ScriptError::Infrastructure(InfrastructureError::Variable(error))
    }
}

/// Errors surfaced by the engine to whoever drives the process.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An infrastructure fault, passed through without wrapping.
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("no boundary error event on activity `{activity}` catches error code `{error_code}`")]
    UnhandledBusinessError { activity: String, error_code: String },

    #[error("unknown activity `{0}`")]
    UnknownActivity(String),

    #[error("execution {0} has already ended")]
    ExecutionEnded(ExecutionId),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("maximum of {0} activity steps exceeded")]
    MaxStepsExceeded(usize),

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

impl EngineError {
    pub fn kind(&self) -> FaultKind {
        match self {
            EngineError::UnhandledBusinessError { .. } => FaultKind::Business,
            _ => FaultKind::Infrastructure,
        }
    }
}
