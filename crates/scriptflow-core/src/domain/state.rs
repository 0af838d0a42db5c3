//! Activity state machine.

use serde::{Deserialize, Serialize};

use super::outcome::ActivityOutcome;

/// State of one activity instance.
///
/// Transitions:
/// - Pending -> Evaluating -> Completed (token advanced)
/// - Pending -> Evaluating -> ErrorPropagated (token redirected to a boundary)
/// - Pending -> Evaluating -> Failed (error returned to the caller)
///
/// Only `Evaluating` may take a noticeable amount of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityState {
    Pending,
    Evaluating,
    Completed,
    ErrorPropagated,
    Failed,
}

impl ActivityState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ActivityState::Completed | ActivityState::ErrorPropagated | ActivityState::Failed
        )
    }

    pub fn can_transition_to(self, next: ActivityState) -> bool {
        match self {
            ActivityState::Pending => next == ActivityState::Evaluating,
            ActivityState::Evaluating => next.is_terminal(),
            _ => false,
        }
    }

    /// Guarded transition.
    pub fn transition_to(self, next: ActivityState) -> Result<ActivityState, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid activity state transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: ActivityState,
    pub to: ActivityState,
}

impl From<ActivityOutcome> for ActivityState {
    fn from(outcome: ActivityOutcome) -> Self {
        match outcome {
            ActivityOutcome::Completed => ActivityState::Completed,
            ActivityOutcome::ErrorPropagated => ActivityState::ErrorPropagated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ActivityState::Pending, ActivityState::Evaluating, true)]
    #[case(ActivityState::Pending, ActivityState::Completed, false)]
    #[case(ActivityState::Evaluating, ActivityState::Completed, true)]
    #[case(ActivityState::Evaluating, ActivityState::ErrorPropagated, true)]
    #[case(ActivityState::Evaluating, ActivityState::Failed, true)]
    #[case(ActivityState::Completed, ActivityState::Evaluating, false)]
    #[case(ActivityState::Failed, ActivityState::Pending, false)]
    fn transitions(#[case] from: ActivityState, #[case] to: ActivityState, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn guarded_transition_walks_the_happy_path() {
        let state = ActivityState::Pending
            .transition_to(ActivityState::Evaluating)
            .and_then(|s| s.transition_to(ActivityState::ErrorPropagated))
            .unwrap();
        assert_eq!(state, ActivityState::ErrorPropagated);
        assert!(state.is_terminal());
    }

    #[test]
    fn guarded_transition_rejects_skips_and_restarts() {
        assert_eq!(
            ActivityState::Pending.transition_to(ActivityState::Failed),
            Err(InvalidTransition {
                from: ActivityState::Pending,
                to: ActivityState::Failed,
            })
        );
        assert!(ActivityState::Completed
            .transition_to(ActivityState::Evaluating)
            .is_err());
    }
}
