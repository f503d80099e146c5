//! Interview phases.
//!
//! The stored phase only ever moves forward:
//! `Intake` → `RoleSpecific` → `Complete`. Classification happens between
//! the first two but is never persisted as a phase of its own.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// The persisted phase of an interview session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPhase {
    /// Fixed role-discovery questions.
    #[default]
    Intake,
    /// Schema-driven questions for the classified role.
    RoleSpecific,
    /// No further questions are produced.
    Complete,
}

impl InterviewPhase {
    /// Short label for UI display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Intake => "Intake",
            Self::RoleSpecific => "Role-specific questions",
            Self::Complete => "Complete",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::RoleSpecific => "role_specific",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for InterviewPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for InterviewPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use InterviewPhase::*;
        matches!((self, target), (Intake, RoleSpecific) | (RoleSpecific, Complete))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use InterviewPhase::*;
        match self {
            Intake => vec![RoleSpecific],
            RoleSpecific => vec![Complete],
            Complete => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [InterviewPhase; 3] = [
        InterviewPhase::Intake,
        InterviewPhase::RoleSpecific,
        InterviewPhase::Complete,
    ];

    #[test]
    fn default_is_intake() {
        assert_eq!(InterviewPhase::default(), InterviewPhase::Intake);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&InterviewPhase::RoleSpecific).unwrap();
        assert_eq!(json, "\"role_specific\"");
    }

    #[test]
    fn display_matches_serde_name() {
        for phase in ALL {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{}\"", phase));
        }
    }

    mod transitions {
        use super::*;

        #[test]
        fn moves_forward_one_step_at_a_time() {
            assert!(InterviewPhase::Intake.can_transition_to(&InterviewPhase::RoleSpecific));
            assert!(InterviewPhase::RoleSpecific.can_transition_to(&InterviewPhase::Complete));
            assert!(!InterviewPhase::Intake.can_transition_to(&InterviewPhase::Complete));
        }

        #[test]
        fn never_regresses() {
            for from in ALL {
                assert!(!from.can_transition_to(&InterviewPhase::Intake));
            }
            assert!(InterviewPhase::Complete
                .transition_to(InterviewPhase::RoleSpecific)
                .is_err());
        }

        #[test]
        fn only_complete_is_terminal() {
            assert!(InterviewPhase::Complete.is_terminal());
            assert!(!InterviewPhase::Intake.is_terminal());
            assert!(!InterviewPhase::RoleSpecific.is_terminal());
        }
    }
}
