//! Short-circuiting computation blocks.
//!
//! Each block runs its body inside a single-shot `reset`. Binding a failed
//! value escapes to the block's scope, so the rest of the body is skipped and
//! the failure becomes the block's result. No intermediate `?` plumbing or
//! nested matches are needed, and bindings work from inside nested scopes and
//! shift bodies.
//!
//! ```rust
//! use undertow::computation::either;
//! use undertow::Either;
//!
//! fn parse(s: &str) -> Either<String, i32> {
//!     Either::from_result(s.parse::<i32>().map_err(|_| format!("not a number: {s}")))
//! }
//!
//! let sum = either(|block| async move {
//!     let a = block.bind(parse("1")).await;
//!     let b = block.bind(parse("x")).await;
//!     a + b
//! });
//! assert_eq!(sum.unwrap(), Either::Left("not a number: x".to_string()));
//! ```

use std::future::Future;

use crate::cont::{reset, Scope};
use crate::either::Either;
use crate::error::ContinuationError;

/// Handle passed to the body of an [`either`] block.
pub struct EitherScope<E: 'static, T: 'static> {
    scope: Scope<Either<E, T>>,
}

impl<E: 'static, T: 'static> Clone for EitherScope<E, T> {
    fn clone(&self) -> Self {
        EitherScope {
            scope: self.scope.clone(),
        }
    }
}

impl<E: 'static, T: 'static> std::fmt::Debug for EitherScope<E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EitherScope").field(&self.scope.token()).finish()
    }
}

impl<E: 'static, T: 'static> EitherScope<E, T> {
    /// Unwrap a `Right`, or end the block with the `Left`.
    pub async fn bind<B>(&self, value: Either<E, B>) -> B {
        match value {
            Either::Right(b) => b,
            Either::Left(e) => self.scope.escape(Either::Left(e)).await,
        }
    }

    /// Unwrap an `Ok`, or end the block with the error as `Left`.
    pub async fn bind_result<B>(&self, value: Result<B, E>) -> B {
        self.bind(Either::from_result(value)).await
    }

    /// End the block with `error()` unless `condition` holds.
    pub async fn ensure<F>(&self, condition: bool, error: F)
    where
        F: FnOnce() -> E,
    {
        if !condition {
            self.scope.escape(Either::Left(error())).await
        }
    }

    /// The underlying scope, for nesting further blocks or shifts.
    pub fn scope(&self) -> &Scope<Either<E, T>> {
        &self.scope
    }
}

/// Run a short-circuiting block producing `Right` on completion.
pub fn either<E, T, F, Fut>(body: F) -> Result<Either<E, T>, ContinuationError>
where
    E: 'static,
    T: 'static,
    F: FnOnce(EitherScope<E, T>) -> Fut + 'static,
    Fut: Future<Output = T> + 'static,
{
    reset(move |scope: Scope<Either<E, T>>| {
        let fut = body(EitherScope { scope });
        async move { Either::Right(fut.await) }
    })
}

/// Handle passed to the body of an [`option`] block.
pub struct OptionScope<T: 'static> {
    scope: Scope<Option<T>>,
}

impl<T: 'static> Clone for OptionScope<T> {
    fn clone(&self) -> Self {
        OptionScope {
            scope: self.scope.clone(),
        }
    }
}

impl<T: 'static> std::fmt::Debug for OptionScope<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OptionScope").field(&self.scope.token()).finish()
    }
}

impl<T: 'static> OptionScope<T> {
    /// Unwrap a `Some`, or end the block with `None`.
    pub async fn bind<B>(&self, value: Option<B>) -> B {
        match value {
            Some(b) => b,
            None => self.scope.escape(None).await,
        }
    }

    /// End the block with `None` unless `condition` holds.
    pub async fn ensure(&self, condition: bool) {
        if !condition {
            self.scope.escape(None).await
        }
    }

    /// The underlying scope.
    pub fn scope(&self) -> &Scope<Option<T>> {
        &self.scope
    }
}

/// Run a block that yields `None` as soon as any binding is `None`.
///
/// ```rust
/// use undertow::computation::option;
///
/// let found = option(|block| async move {
///     let first = block.bind("a,b".split(',').next()).await;
///     let third = block.bind("a,b".split(',').nth(2)).await;
///     format!("{first}{third}")
/// });
/// assert_eq!(found.unwrap(), None);
/// ```
pub fn option<T, F, Fut>(body: F) -> Result<Option<T>, ContinuationError>
where
    T: 'static,
    F: FnOnce(OptionScope<T>) -> Fut + 'static,
    Fut: Future<Output = T> + 'static,
{
    reset(move |scope: Scope<Option<T>>| {
        let fut = body(OptionScope { scope });
        async move { Some(fut.await) }
    })
}

/// Handle passed to the body of a [`result`] block.
pub struct ResultScope<T: 'static, E: 'static> {
    scope: Scope<Result<T, E>>,
}

impl<T: 'static, E: 'static> Clone for ResultScope<T, E> {
    fn clone(&self) -> Self {
        ResultScope {
            scope: self.scope.clone(),
        }
    }
}

impl<T: 'static, E: 'static> std::fmt::Debug for ResultScope<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ResultScope").field(&self.scope.token()).finish()
    }
}

impl<T: 'static, E: 'static> ResultScope<T, E> {
    /// Unwrap an `Ok`, or end the block with the error.
    pub async fn bind<B>(&self, value: Result<B, E>) -> B {
        match value {
            Ok(b) => b,
            Err(e) => self.scope.escape(Err(e)).await,
        }
    }

    /// End the block with `error()` unless `condition` holds.
    pub async fn ensure<F>(&self, condition: bool, error: F)
    where
        F: FnOnce() -> E,
    {
        if !condition {
            self.scope.escape(Err(error())).await
        }
    }

    /// The underlying scope.
    pub fn scope(&self) -> &Scope<Result<T, E>> {
        &self.scope
    }
}

/// Run a block that ends with the first bound error.
pub fn result<T, E, F, Fut>(body: F) -> Result<Result<T, E>, ContinuationError>
where
    T: 'static,
    E: 'static,
    F: FnOnce(ResultScope<T, E>) -> Fut + 'static,
    Fut: Future<Output = T> + 'static,
{
    reset(move |scope: Scope<Result<T, E>>| {
        let fut = body(ResultScope { scope });
        async move { Ok(fut.await) }
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_either_completes_with_right() {
        let out = either(|block: EitherScope<String, i32>| async move {
            let a = block.bind(Either::Right(2)).await;
            let b = block.bind_result(Ok::<_, String>(3)).await;
            a * b
        });
        assert_eq!(out, Ok(Either::Right(6)));
    }

    #[test]
    fn test_either_stops_at_first_left() {
        let touched = Rc::new(Cell::new(0));
        let counter = touched.clone();
        let out = either(move |block: EitherScope<&'static str, i32>| async move {
            counter.set(counter.get() + 1);
            let _: i32 = block.bind(Either::Left("first")).await;
            counter.set(counter.get() + 1);
            let _: i32 = block.bind(Either::Left("second")).await;
            0
        });
        assert_eq!(out, Ok(Either::Left("first")));
        assert_eq!(touched.get(), 1);
    }

    #[test]
    fn test_either_ensure() {
        let out = either(|block: EitherScope<String, u8>| async move {
            let total = 1 + 1;
            block.ensure(total == 3, || "math is broken".to_string()).await;
            1
        });
        assert_eq!(out, Ok(Either::Left("math is broken".to_string())));
    }

    #[test]
    fn test_either_bind_inside_shift_body() {
        let out = either(|block: EitherScope<String, i32>| async move {
            let inner = block.clone();
            let x: i32 = block
                .scope()
                .shift(move |k| async move {
                    let _: () = inner.bind(Either::Left("from handler".to_string())).await;
                    k.invoke(1).await
                })
                .await;
            x
        });
        assert_eq!(out, Ok(Either::Left("from handler".to_string())));
    }

    #[test]
    fn test_option_block() {
        let some = option(|block: OptionScope<i32>| async move {
            block.ensure(true).await;
            block.bind(Some(4)).await
        });
        assert_eq!(some, Ok(Some(4)));

        let none = option(|block: OptionScope<i32>| async move {
            let x: i32 = block.bind(None).await;
            x + 1
        });
        assert_eq!(none, Ok(None));
    }

    #[test]
    fn test_result_block() {
        let parsed = result(|block: ResultScope<i32, String>| async move {
            let a: i32 = block.bind("12".parse().map_err(|_| "bad".to_string())).await;
            block.ensure(a > 10, || "too small".to_string()).await;
            a
        });
        assert_eq!(parsed, Ok(Ok(12)));

        let failed = result(|block: ResultScope<i32, String>| async move {
            let a: i32 = block.bind("x".parse().map_err(|_| "bad".to_string())).await;
            a
        });
        assert_eq!(failed, Ok(Err("bad".to_string())));
    }

    #[test]
    fn test_nested_blocks_escape_to_their_own_scope() {
        let out = either(|outer: EitherScope<String, usize>| async move {
            let handle = outer.clone();
            let inner: Option<i32> = outer
                .scope()
                .reset(move |_scope: Scope<Option<i32>>| async move {
                    let _: () = handle.bind(Either::Left("outer stop".to_string())).await;
                    Some(1)
                })
                .await;
            inner.map_or(0, |v| v as usize)
        });
        assert_eq!(out, Ok(Either::Left("outer stop".to_string())));
    }
}
