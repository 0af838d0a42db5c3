//! Outcome model: what an activity reports back to the engine.

use serde::{Deserialize, Serialize};

use super::state::ActivityState;

/// How an activity finished when it did not fail.
///
/// Serialized as COMPLETED / ERROR_PROPAGATED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityOutcome {
    /// The activity left normally and the token advanced.
    Completed,

    /// A business error was handed to error propagation; the activity did
    /// not leave.
    ErrorPropagated,
}

/// History entry for one executed activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_id: String,
    pub state: ActivityState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActivityRecord {
    pub fn finished(activity_id: impl Into<String>, outcome: ActivityOutcome) -> Self {
        Self {
            activity_id: activity_id.into(),
            state: outcome.into(),
            error: None,
        }
    }

    pub fn failed(activity_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            state: ActivityState::Failed,
            error: Some(error.into()),
        }
    }
}
