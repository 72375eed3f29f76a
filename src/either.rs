//! A neutral sum type, the result of an [`either`](crate::computation::either)
//! block.
//!
//! `Either` is right-biased: [`map`](Either::map) and
//! [`and_then`](Either::and_then) operate on `Right`, the value a block
//! produces when it runs to completion. `Left` carries whatever a block
//! short-circuited with.
//!
//! # Examples
//!
//! ```rust
//! use undertow::Either;
//!
//! let parsed: Either<String, i32> = Either::right(21);
//! let doubled = parsed.map(|n| n * 2);
//! assert_eq!(doubled, Either::Right(42));
//!
//! let description = Either::<&str, i32>::left("cached").fold(
//!     |cached| format!("from cache: {cached}"),
//!     |fresh| format!("fresh: {fresh}"),
//! );
//! assert_eq!(description, "from cache: cached");
//! ```

/// Outcome of an [`either`](crate::computation::either) block: `Right` when
/// the body finished, `Left` when a `bind` or `ensure` cut it short.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Either<L, R> {
    /// Value the block short-circuited with.
    Left(L),
    /// Value the block ran to.
    Right(R),
}

impl<L, R> Either<L, R> {
    /// A short-circuit outcome.
    #[inline]
    pub fn left(value: L) -> Self {
        Either::Left(value)
    }

    /// A completed outcome.
    #[inline]
    pub fn right(value: R) -> Self {
        Either::Right(value)
    }

    /// Whether the block short-circuited.
    #[inline]
    pub fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    /// Whether the block ran to completion.
    #[inline]
    pub fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }

    /// The short-circuit value, if there was one.
    pub fn into_left(self) -> Option<L> {
        self.fold(Some, |_| None)
    }

    /// The completed value, if the block ran to the end.
    pub fn into_right(self) -> Option<R> {
        self.fold(|_| None, Some)
    }

    /// Apply `f` to a completed value; a short-circuit passes through.
    pub fn map<R2, F>(self, f: F) -> Either<L, R2>
    where
        F: FnOnce(R) -> R2,
    {
        self.and_then(|r| Either::Right(f(r)))
    }

    /// Rewrite the short-circuit value, e.g. to unify error types between
    /// nested blocks.
    pub fn map_left<L2, F>(self, f: F) -> Either<L2, R>
    where
        F: FnOnce(L) -> L2,
    {
        match self {
            Either::Left(l) => Either::Left(f(l)),
            Either::Right(r) => Either::Right(r),
        }
    }

    /// Collapse both outcomes into one value.
    pub fn fold<T, F, G>(self, on_left: F, on_right: G) -> T
    where
        F: FnOnce(L) -> T,
        G: FnOnce(R) -> T,
    {
        match self {
            Either::Left(l) => on_left(l),
            Either::Right(r) => on_right(r),
        }
    }

    /// Continue with another fallible step, the plain-function analogue of
    /// `bind` inside a block.
    pub fn and_then<R2, F>(self, f: F) -> Either<L, R2>
    where
        F: FnOnce(R) -> Either<L, R2>,
    {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => f(r),
        }
    }

    /// `Right` becomes `Ok`, `Left` becomes `Err`.
    pub fn into_result(self) -> Result<R, L> {
        self.fold(Err, Ok)
    }

    /// `Ok` becomes `Right`, `Err` becomes `Left`.
    pub fn from_result(result: Result<R, L>) -> Self {
        match result {
            Ok(r) => Either::Right(r),
            Err(l) => Either::Left(l),
        }
    }
}

impl<L, R> From<Result<R, L>> for Either<L, R> {
    fn from(result: Result<R, L>) -> Self {
        Either::from_result(result)
    }
}

impl<L, R> From<Either<L, R>> for Result<R, L> {
    fn from(either: Either<L, R>) -> Self {
        either.into_result()
    }
}

/// Split an iterator of `Either` into its left and right values.
///
/// ```rust
/// use undertow::either::partition;
/// use undertow::Either;
///
/// let (lefts, rights) = partition(vec![Either::Left("a"), Either::Right(1), Either::Left("b")]);
/// assert_eq!(lefts, vec!["a", "b"]);
/// assert_eq!(rights, vec![1]);
/// ```
pub fn partition<L, R, I>(iter: I) -> (Vec<L>, Vec<R>)
where
    I: IntoIterator<Item = Either<L, R>>,
{
    let mut lefts = Vec::new();
    let mut rights = Vec::new();
    for either in iter {
        match either {
            Either::Left(l) => lefts.push(l),
            Either::Right(r) => rights.push(r),
        }
    }
    (lefts, rights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let left: Either<i32, &str> = Either::left(1);
        assert!(left.is_left());
        assert!(!left.is_right());
        assert_eq!(left.into_left(), Some(1));
        assert_eq!(left.into_right(), None);
    }

    #[test]
    fn test_map_only_touches_right() {
        let left: Either<&str, i32> = Either::Left("stop");
        assert_eq!(left.map(|n| n + 1), Either::Left("stop"));
        assert_eq!(Either::<&str, i32>::Right(1).map(|n| n + 1), Either::Right(2));
        assert_eq!(left.map_left(str::len), Either::Left(4));
    }

    #[test]
    fn test_and_then_short_circuits() {
        let halve = |n: i32| {
            if n % 2 == 0 {
                Either::Right(n / 2)
            } else {
                Either::Left(format!("{n} is odd"))
            }
        };
        assert_eq!(Either::Right(8).and_then(halve).and_then(halve), Either::Right(2));
        assert_eq!(
            Either::Right(6).and_then(halve).and_then(halve),
            Either::Left("3 is odd".to_string())
        );
    }

    #[test]
    fn test_result_conversions() {
        let either: Either<String, i32> = Ok(3).into();
        assert_eq!(either, Either::Right(3));
        let result: Result<i32, String> = Either::Left("e".to_string()).into();
        assert_eq!(result, Err("e".to_string()));
    }

    #[test]
    fn test_fold_reports_either_outcome() {
        let report = |e: Either<&str, usize>| {
            e.fold(|why| format!("stopped: {why}"), |n| format!("{n} rows"))
        };
        assert_eq!(report(Either::Right(3)), "3 rows");
        assert_eq!(report(Either::Left("timeout")), "stopped: timeout");
    }
}
