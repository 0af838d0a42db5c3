//! Domain model (ids, variables, definitions, executions, outcomes, errors).

pub mod business_error;
pub mod definition;
pub mod errors;
pub mod execution;
pub mod ids;
pub mod outcome;
pub mod state;
pub mod variables;

pub use business_error::{BusinessError, EmptyErrorCode};
pub use definition::{
    ActivityDefinition, ActivityKind, BoundaryErrorEvent, DefinitionError, ProcessDefinition,
    ScriptTaskDefinition,
};
pub use errors::{EngineError, FaultKind, InfrastructureError, ScriptError};
pub use execution::Execution;
pub use ids::{ExecutionId, ProcessInstanceId};
pub use outcome::{ActivityOutcome, ActivityRecord};
pub use state::{ActivityState, InvalidTransition};
pub use variables::{RESERVED_VARIABLES, VariableError, VariableScope};
