//! State machine trait for lifecycle enums.
//!
//! Gives every lifecycle enum the same validated transition API so callers
//! never assign a new state without checking the edge first.

use super::ValidationError;

/// Trait for enums that represent a state machine.
///
/// Implementors declare their edges; `transition_to` and `is_terminal`
/// come for free.
///
/// # Example
///
/// ```ignore
/// let next = StreamPhase::Informative.transition_to(StreamPhase::Streaming)?;
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
