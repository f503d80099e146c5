//! State machine trait for lifecycle enums.
//!
//! Gives every lifecycle enum (the interview phase being the main one) the same
//! validated transition API.

use super::ValidationError;

/// Trait for enums that represent state machines.
///
/// Implementors declare the allowed edges; validated transitions and terminal
/// detection come for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for InterviewPhase {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Intake, RoleSpecific) | (RoleSpecific, Complete))
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Intake => vec![RoleSpecific],
///             RoleSpecific => vec![Complete],
///             Complete => vec![],
///         }
///     }
/// }
///
/// let next = phase.transition_to(InterviewPhase::RoleSpecific)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_transition(
                format!("{:?}", self),
                format!("{:?}", target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
