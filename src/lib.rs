//! # Undertow
//!
//! > *"What pulls you back below the surface"*
//!
//! Delimited continuations (`shift`/`reset`) for Rust, driven by a
//! stack-safe trampoline instead of an async runtime.
//!
//! ## Philosophy
//!
//! A `reset` marks a boundary; a `shift` inside it captures *the rest of the
//! computation up to that boundary* as a value you can call. From that one
//! primitive you get early exits, generators, backtracking search and
//! short-circuiting blocks, all as library code.
//!
//! - Bodies are ordinary `async` blocks, polled by a per-scope run-loop.
//! - Continuations are single-shot by default; multi-shot scopes replay the
//!   body from a recorded effect log.
//! - Engine faults are values ([`ContinuationError`]), never panics.
//!
//! ## Quick Example
//!
//! ```rust
//! use undertow::{reset, Scope};
//!
//! // The continuation `k` is "x + 1, then return". Calling it twice in a
//! // single-shot scope would be a fault, so we call it once.
//! let result = reset(|scope: Scope<i32>| async move {
//!     let x: i32 = scope.shift(|k| async move { k.invoke(10).await * 2 }).await;
//!     x + 1
//! });
//! assert_eq!(result, Ok(22));
//! ```
//!
//! ## Higher-level blocks
//!
//! ```rust
//! use undertow::computation::option;
//! use undertow::sequence::sequence;
//!
//! let evens = sequence(|y| async move {
//!     for i in 0..10 {
//!         if i % 2 == 0 {
//!             y.emit(i).await;
//!         }
//!     }
//! });
//! assert_eq!(evens.unwrap(), vec![0, 2, 4, 6, 8]);
//!
//! let none = option(|block| async move {
//!     let x: i32 = block.bind(None).await;
//!     x
//! });
//! assert_eq!(none.unwrap(), None);
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod computation;
pub mod config;
pub mod cont;
pub mod either;
pub mod error;
pub mod nondet;
pub mod semigroup;
pub mod sequence;
pub mod testing;
pub mod token;

mod trace;

// Re-exports
pub use config::{ResetConfig, ShotMode};
pub use cont::{
    reset, reset_multi, reset_with, Continuation, CpsContinuation, Escape, Invocation, Scope,
    ScopeRun, Shift, ShiftCps,
};
pub use either::Either;
pub use error::ContinuationError;
pub use semigroup::Semigroup;
pub use token::Token;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::computation::{either, option, result};
    pub use crate::config::{ResetConfig, ShotMode};
    pub use crate::cont::{reset, reset_multi, reset_with, Continuation, CpsContinuation, Scope};
    pub use crate::either::Either;
    pub use crate::error::ContinuationError;
    pub use crate::nondet::all_choices;
    pub use crate::semigroup::Semigroup;
    pub use crate::sequence::sequence;
}
