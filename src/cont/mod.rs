//! Delimited continuations: `reset` and `shift`.
//!
//! A [`reset`] opens a scope and runs its body. Inside the body,
//! [`Scope::shift`] captures "the rest of the body up to the enclosing
//! `reset`" as a first-class [`Continuation`] and hands it to a handler. The
//! handler may invoke the continuation once, several times (multi-shot
//! scopes) or not at all. Whatever the handler returns becomes the value of
//! the whole `reset`.
//!
//! # Execution model
//!
//! Bodies and shift bodies are ordinary Rust futures, here called *fibers*.
//! A scope drives its fibers with a trampoline run-loop using a no-op waker,
//! so nothing here needs an async runtime. Suspension is expressed by a
//! fiber returning `Pending`; the run-loop, not the native stack, remembers
//! who resumes whom. Deep chains of shifts therefore never grow the stack.
//!
//! ```text
//! reset ─┬─ body fiber ──shift──▶ (suspended)
//!        │                           ▲
//!        └─ shift body ──invoke(v)───┘  resume with v
//!                      ◀─ final value ─ body completes
//! ```
//!
//! # Examples
//!
//! Short-circuit a computation by not invoking the continuation:
//!
//! ```rust
//! use undertow::{reset, Scope};
//!
//! let answer = reset(|scope: Scope<String>| async move {
//!     let name: String = scope.shift(|_k| async { "No thank you".to_string() }).await;
//!     format!("Hello, {name}")
//! });
//! assert_eq!(answer.unwrap(), "No thank you");
//! ```
//!
//! Invoke a multi-shot continuation twice:
//!
//! ```rust
//! use undertow::{reset_multi, Scope};
//!
//! let both = reset_multi(|scope: Scope<Vec<i32>>| async move {
//!     let x: i32 = scope
//!         .shift(|k| async move {
//!             let mut out = k.invoke(1).await;
//!             out.extend(k.invoke(2).await);
//!             out
//!         })
//!         .await;
//!     vec![x * 10]
//! });
//! assert_eq!(both.unwrap(), vec![10, 20]);
//! ```

mod arena;
mod channel;
mod continuation;
mod replay;
mod run_loop;
mod scope;
mod shift;
mod state;


use std::future::Future;

use crate::config::ResetConfig;
use crate::error::ContinuationError;

pub use continuation::{Continuation, CpsContinuation, Invocation};
pub use run_loop::ScopeRun;
pub use scope::Scope;
pub use shift::{Escape, Shift, ShiftCps};

use scope::{Body, ScopeInner};

/// Run `body` in a fresh single-shot scope and return its value.
///
/// Fails when a continuation is resumed twice, when the body suspends with
/// nothing left to resume it, or when an escape targets a scope that is not
/// running.
///
/// # Example
///
/// ```rust
/// use undertow::{reset, Scope};
///
/// let n = reset(|scope: Scope<i32>| async move {
///     let x: i32 = scope.shift(|k| async move { k.invoke(2).await * 10 }).await;
///     x + 1
/// });
/// assert_eq!(n, Ok(30));
/// ```
pub fn reset<R, F, Fut>(body: F) -> Result<R, ContinuationError>
where
    R: 'static,
    F: FnOnce(Scope<R>) -> Fut + 'static,
    Fut: Future<Output = R> + 'static,
{
    ScopeRun::new(ScopeInner::root(ResetConfig::single_shot(), Body::once(body))).run_to_completion()
}

/// Run `body` in a fresh multi-shot scope and return its value.
///
/// Continuations captured here may be invoked any number of times. Every
/// invocation after the first re-runs `body` from the start, so the body
/// must be deterministic up to each capture point.
pub fn reset_multi<R, F, Fut>(body: F) -> Result<R, ContinuationError>
where
    R: 'static,
    F: Fn(Scope<R>) -> Fut + 'static,
    Fut: Future<Output = R> + 'static,
{
    reset_with(ResetConfig::multi_shot(), body)
}

/// Run `body` in a fresh scope configured by `config`.
///
/// # Example
///
/// ```rust
/// use undertow::{reset_with, ContinuationError, ResetConfig, Scope};
///
/// let config = ResetConfig::single_shot().with_step_limit(10);
/// let result = reset_with(config, |scope: Scope<u32>| async move {
///     let mut total = 0;
///     for i in 0..100 {
///         let step: u32 = scope.shift(move |k| async move { k.invoke(i).await }).await;
///         total += step;
///     }
///     total
/// });
/// assert!(matches!(result, Err(ContinuationError::StepLimitExceeded { limit: 10, .. })));
/// ```
pub fn reset_with<R, F, Fut>(config: ResetConfig, body: F) -> Result<R, ContinuationError>
where
    R: 'static,
    F: Fn(Scope<R>) -> Fut + 'static,
    Fut: Future<Output = R> + 'static,
{
    ScopeRun::new(ScopeInner::root(config, Body::replayable(body))).run_to_completion()
}
