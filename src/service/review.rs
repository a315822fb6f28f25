use crate::error::{AppError, AppResult};

/// What a review decision does to a request.
#[derive(Debug, PartialEq, Eq)]
pub enum Transition {
    /// pending request moves to the decided state
    Apply,
    /// already in the requested state
    Unchanged,
}

/// Decisions are final: a pending request can be decided once, repeating
/// the same decision succeeds without effect, and reversing it is refused.
pub fn decide<S: PartialEq + std::fmt::Display>(
    current: S,
    pending: S,
    target: S,
) -> AppResult<Transition> {
    if current == target {
        Ok(Transition::Unchanged)
    } else if current == pending {
        Ok(Transition::Apply)
    } else {
        Err(AppError::Conflict(format!("Request was already {current}")))
    }
}
