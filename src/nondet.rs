//! Nondeterministic search with multi-shot continuations.
//!
//! [`all_choices`] runs its body in a multi-shot scope. Each
//! [`Choice::choose`] resumes the rest of the body once per option and
//! combines the results; [`Choice::guard`] prunes a branch. The body is
//! replayed from the start for every branch after the first, so it must be
//! deterministic apart from the values it chooses.
//!
//! ```rust
//! use undertow::nondet::all_choices;
//!
//! let triples = all_choices(|c| async move {
//!     let a = c.choose((1..=12).collect()).await;
//!     let b = c.choose((a..=12).collect()).await;
//!     let h = c.choose((b..=12).collect()).await;
//!     c.guard(a * a + b * b == h * h).await;
//!     (a, b, h)
//! });
//! assert_eq!(triples.unwrap(), vec![(3, 4, 5), (6, 8, 10)]);
//! ```

use std::fmt;
use std::future::Future;

use crate::cont::{reset_multi, Continuation, Scope};
use crate::error::ContinuationError;
use crate::semigroup::Semigroup;

/// Handle passed to an [`all_choices`] body.
pub struct Choice<T: 'static> {
    scope: Scope<Vec<T>>,
}

impl<T: 'static> Clone for Choice<T> {
    fn clone(&self) -> Self {
        Choice {
            scope: self.scope.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Choice").field(&self.scope.token()).finish()
    }
}

impl<T: 'static> Choice<T> {
    /// Continue the body once with each option, in order.
    ///
    /// An empty `options` ends the current branch with no results.
    pub async fn choose<A: Clone + 'static>(&self, options: Vec<A>) -> A {
        self.scope
            .shift(move |k: Continuation<A, Vec<T>>| async move {
                let mut all = Vec::new();
                for option in options {
                    all = all.combine(k.invoke(option).await);
                }
                all
            })
            .await
    }

    /// Continue with `true` and then with `false`.
    pub async fn flip(&self) -> bool {
        self.choose(vec![true, false]).await
    }

    /// Abandon the current branch unless `condition` holds.
    pub async fn guard(&self, condition: bool) {
        if !condition {
            self.scope
                .shift(|_k: Continuation<(), Vec<T>>| async { Vec::new() })
                .await
        }
    }
}

/// Collect the result of every branch of `body`, depth first.
pub fn all_choices<T, F, Fut>(body: F) -> Result<Vec<T>, ContinuationError>
where
    T: 'static,
    F: Fn(Choice<T>) -> Fut + 'static,
    Fut: Future<Output = T> + 'static,
{
    reset_multi(move |scope: Scope<Vec<T>>| {
        let fut = body(Choice { scope });
        async move { vec![fut.await] }
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_single_choice_enumerates_options() {
        let out = all_choices(|c| async move { c.choose(vec!['a', 'b', 'c']).await });
        assert_eq!(out, Ok(vec!['a', 'b', 'c']));
    }

    #[test]
    fn test_two_choices_form_cartesian_product() {
        let out = all_choices(|c| async move {
            let x = c.choose(vec![1, 2]).await;
            let y = c.choose(vec!["x", "y"]).await;
            format!("{x}{y}")
        });
        assert_eq!(out, Ok(vec!["1x".into(), "1y".into(), "2x".into(), "2y".into()]));
    }

    #[test]
    fn test_empty_choice_prunes_branch() {
        let out = all_choices(|c| async move {
            let x = c.choose(vec![1, 2, 3]).await;
            let y: i32 = c.choose(if x == 2 { vec![] } else { vec![x * 10] }).await;
            y
        });
        assert_eq!(out, Ok(vec![10, 30]));
    }

    #[test]
    fn test_guard_filters_branches() {
        let out = all_choices(|c| async move {
            let n = c.choose((1..=10).collect()).await;
            c.guard(n % 3 == 0).await;
            n
        });
        assert_eq!(out, Ok(vec![3, 6, 9]));
    }

    #[test]
    fn test_flip_counts_coin_sequences() {
        let heads = all_choices(|c| async move {
            let mut count = 0;
            for _ in 0..3 {
                if c.flip().await {
                    count += 1;
                }
            }
            count
        })
        .unwrap();
        assert_eq!(heads.len(), 8);
        assert_eq!(heads.iter().filter(|&&h| h == 3).count(), 1);
        assert_eq!(heads.iter().filter(|&&h| h == 1).count(), 3);
    }

    #[test]
    fn test_body_replays_once_per_extra_branch() {
        let starts = Rc::new(Cell::new(0));
        let counter = starts.clone();
        let out = all_choices(move |c| {
            let counter = counter.clone();
            async move {
                counter.set(counter.get() + 1);
                c.choose(vec![1, 2, 3, 4]).await
            }
        });
        assert_eq!(out, Ok(vec![1, 2, 3, 4]));
        assert_eq!(starts.get(), 4);
    }
}
