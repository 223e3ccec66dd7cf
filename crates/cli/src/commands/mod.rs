//! CLI Commands
//!
//! Each command is one page of the host stand: it loads what it needs,
//! runs the client-side checks, and issues the request. The flows are
//! plain async functions so they can be driven without a terminal.

use tokio_util::sync::{CancellationToken, DropGuard};

use seatwise_common::ValidationError;

pub mod course;
pub mod dashboard;
pub mod search;
pub mod student;

/// Lifetime of a single view.
///
/// Requests issued by the view share its token; dropping the scope fires
/// the token and any response still in flight is discarded.
pub struct ViewScope {
    token: CancellationToken,
    _guard: DropGuard,
}

impl ViewScope {
    pub fn new() -> Self {
        let token = CancellationToken::new();
        let guard = token.clone().drop_guard();
        Self {
            token,
            _guard: guard,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of submitting a form
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome<T> {
    /// The request was sent and the backend accepted it
    Saved(T),
    /// Client-side checks failed and nothing was sent
    Invalid(Vec<ValidationError>),
    /// The view closed before the backend answered; there is nothing to show
    Cancelled,
}

impl<T> FormOutcome<T> {
    pub fn is_saved(&self) -> bool {
        matches!(self, FormOutcome::Saved(_))
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            FormOutcome::Saved(_) | FormOutcome::Cancelled => &[],
            FormOutcome::Invalid(errors) => errors,
        }
    }
}

/// Result of a confirmed row action (cancel a reservation, finish a table)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// The host answered no at the confirmation prompt
    Declined,
    /// The row does not offer this action in its current state
    Unavailable(String),
    /// The view closed before the backend answered
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_cancels_on_drop() {
        let scope = ViewScope::new();
        let token = scope.token().clone();
        assert!(!token.is_cancelled());

        drop(scope);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_form_outcome_errors() {
        let saved: FormOutcome<u32> = FormOutcome::Saved(1);
        assert!(saved.is_saved());
        assert!(saved.errors().is_empty());

        let invalid: FormOutcome<u32> = FormOutcome::Invalid(vec![ValidationError::new("bad")]);
        assert_eq!(invalid.errors().len(), 1);

        let cancelled: FormOutcome<u32> = FormOutcome::Cancelled;
        assert!(!cancelled.is_saved());
        assert!(cancelled.errors().is_empty());
    }
}
