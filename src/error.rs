//! Error types for the continuation engine.
//!
//! Every variant is fatal for the `reset` it is raised in: the run-loop stops,
//! tears down its parked fibers and the outermost `reset` returns the fault.
//! Ordinary failures of user code are *not* represented here; they travel as
//! part of the scope's result type (or unwind as panics).

use std::fmt;

use crate::token::Token;

/// A fatal condition raised by the shift/reset engine.
///
/// # Examples
///
/// ```rust
/// use undertow::{reset, ContinuationError, Scope};
///
/// // A single-shot continuation may only be resumed once.
/// let result = reset(|scope: Scope<i32>| async move {
///     scope
///         .shift(|k| async move { k.invoke(1).await + k.invoke(2).await })
///         .await
/// });
///
/// assert!(matches!(result, Err(ContinuationError::AlreadyResumed { .. })));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationError {
    /// A single-shot continuation was invoked after its live resumption point
    /// had been consumed.
    AlreadyResumed {
        /// Scope owning the continuation.
        scope: Token,
        /// Index of the `shift` that captured it.
        shift_index: usize,
    },
    /// The run-loop found itself suspended with nothing left to resume and no
    /// ancestor with pending work.
    NoFurtherWork {
        /// Scope whose run-loop got stuck.
        scope: Token,
    },
    /// An escape signal reached the outermost scope without meeting the scope
    /// its token names.
    UnhandledSignal {
        /// Token the signal was addressed to.
        target: Token,
    },
    /// A second `shift` was registered while another one was still waiting
    /// for the run-loop.
    ConcurrentShift {
        /// Scope both shifts were registered with.
        scope: Token,
    },
    /// A live continuation was resumed while another resumption was still
    /// scheduled.
    ConcurrentResume {
        /// Scope owning both continuations.
        scope: Token,
    },
    /// A multi-shot continuation captured by a shift body, rather than by
    /// the scope body, was invoked a second time. Replay can only rebuild
    /// the scope body.
    NotReplayable {
        /// Scope owning the continuation.
        scope: Token,
        /// Index of the `shift` that captured it.
        shift_index: usize,
    },
    /// `shift` or `invoke` was used while the owning scope was not running.
    NotRunning {
        /// Scope that was addressed.
        scope: Token,
    },
    /// A replayed `shift` asked for a value of a different type than the one
    /// recorded at the same index.
    ReplayDivergence {
        /// Replay scope that diverged.
        scope: Token,
        /// Index of the diverging `shift`.
        index: usize,
    },
    /// The run-loop exceeded its configured step budget.
    StepLimitExceeded {
        /// Scope whose budget ran out.
        scope: Token,
        /// The configured limit.
        limit: usize,
    },
    /// An engine invariant was violated.
    Internal {
        /// Description of the violation.
        message: String,
    },
}

impl ContinuationError {
    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ContinuationError::Internal {
            message: message.into(),
        }
    }

    /// The scope this fault is attributed to, if any.
    ///
    /// For [`ContinuationError::UnhandledSignal`] this is the signal's target.
    pub fn scope(&self) -> Option<Token> {
        match self {
            ContinuationError::AlreadyResumed { scope, .. }
            | ContinuationError::NotReplayable { scope, .. }
            | ContinuationError::NoFurtherWork { scope }
            | ContinuationError::ConcurrentShift { scope }
            | ContinuationError::ConcurrentResume { scope }
            | ContinuationError::NotRunning { scope }
            | ContinuationError::ReplayDivergence { scope, .. }
            | ContinuationError::StepLimitExceeded { scope, .. } => Some(*scope),
            ContinuationError::UnhandledSignal { target } => Some(*target),
            ContinuationError::Internal { .. } => None,
        }
    }
}

impl fmt::Display for ContinuationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContinuationError::AlreadyResumed { scope, shift_index } => write!(
                f,
                "continuation of shift {} in scope {} was already resumed",
                shift_index, scope
            ),
            ContinuationError::NoFurtherWork { scope } => write!(
                f,
                "scope {} is suspended with no further work and no result",
                scope
            ),
            ContinuationError::UnhandledSignal { target } => {
                write!(f, "escape signal for scope {} was never caught", target)
            }
            ContinuationError::ConcurrentShift { scope } => {
                write!(f, "scope {} already has a pending shift", scope)
            }
            ContinuationError::ConcurrentResume { scope } => {
                write!(f, "scope {} already has a scheduled resumption", scope)
            }
            ContinuationError::NotReplayable { scope, shift_index } => write!(
                f,
                "continuation of shift {} in scope {} was captured by a shift body and cannot be replayed",
                shift_index, scope
            ),
            ContinuationError::NotRunning { scope } => write!(f, "scope {} is not running", scope),
            ContinuationError::ReplayDivergence { scope, index } => write!(
                f,
                "replay of scope {} diverged at shift {}",
                scope, index
            ),
            ContinuationError::StepLimitExceeded { scope, limit } => write!(
                f,
                "scope {} exceeded its step limit of {}",
                scope, limit
            ),
            ContinuationError::Internal { message } => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for ContinuationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let scope = Token::fresh();
        let err = ContinuationError::AlreadyResumed {
            scope,
            shift_index: 3,
        };
        assert!(err.to_string().contains("already resumed"));
        assert!(err.to_string().contains("shift 3"));

        let err = ContinuationError::NoFurtherWork { scope };
        assert!(err.to_string().contains("no further work"));

        let err = ContinuationError::NotReplayable {
            scope,
            shift_index: 1,
        };
        assert!(err.to_string().contains("cannot be replayed"));
        assert_eq!(err.scope(), Some(scope));

        let err = ContinuationError::internal("broken");
        assert_eq!(err.to_string(), "internal error: broken");
    }

    #[test]
    fn test_scope_attribution() {
        let scope = Token::fresh();
        assert_eq!(
            ContinuationError::StepLimitExceeded { scope, limit: 10 }.scope(),
            Some(scope)
        );
        assert_eq!(
            ContinuationError::UnhandledSignal { target: scope }.scope(),
            Some(scope)
        );
        assert_eq!(ContinuationError::internal("x").scope(), None);
    }
}
