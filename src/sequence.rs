//! Generators built from `shift`.
//!
//! [`sequence`] runs a body that pushes items with [`Yielder::emit`]. Each
//! `emit` captures the rest of the body, runs it to collect the items that
//! follow, and prepends its own item. The run-loop keeps the native stack
//! flat, so a body can emit any number of items.
//!
//! ```rust
//! use undertow::sequence::sequence;
//!
//! let squares = sequence(|y| async move {
//!     for i in 1..=4 {
//!         y.emit(i * i).await;
//!     }
//! });
//! assert_eq!(squares.unwrap(), vec![1, 4, 9, 16]);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;

use crate::cont::{reset, Continuation, Scope};
use crate::error::ContinuationError;

/// Handle passed to a [`sequence`] body.
pub struct Yielder<A: 'static> {
    scope: Scope<VecDeque<A>>,
}

impl<A: 'static> Clone for Yielder<A> {
    fn clone(&self) -> Self {
        Yielder {
            scope: self.scope.clone(),
        }
    }
}

impl<A: 'static> fmt::Debug for Yielder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Yielder").field(&self.scope.token()).finish()
    }
}

impl<A: 'static> Yielder<A> {
    /// Append `item` to the sequence.
    pub async fn emit(&self, item: A) {
        self.scope
            .shift(move |k: Continuation<(), VecDeque<A>>| async move {
                let mut rest = k.invoke(()).await;
                rest.push_front(item);
                rest
            })
            .await
    }

    /// Append every item of `items`, in order.
    pub async fn emit_all<I>(&self, items: I)
    where
        I: IntoIterator<Item = A>,
    {
        for item in items {
            self.emit(item).await;
        }
    }
}

/// Collect everything `body` emits, in emission order.
pub fn sequence<A, F, Fut>(body: F) -> Result<Vec<A>, ContinuationError>
where
    A: 'static,
    F: FnOnce(Yielder<A>) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    reset(move |scope: Scope<VecDeque<A>>| {
        let fut = body(Yielder { scope });
        async move {
            fut.await;
            VecDeque::new()
        }
    })
    .map(Vec::from)
}
