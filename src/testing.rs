//! Testing utilities for code built on `reset`/`shift`.
//!
//! # Assertion Macros
//!
//! ```rust
//! use undertow::{assert_decided, assert_fault, reset, Scope};
//!
//! let ok = reset(|_scope: Scope<i32>| async { 7 });
//! assert_decided!(ok, 7);
//!
//! let stuck = reset(|_scope: Scope<i32>| async {
//!     futures::future::pending::<()>().await;
//!     0
//! });
//! assert_fault!(stuck, undertow::ContinuationError::NoFurtherWork { .. });
//! ```

/// Assert that a `reset` decided a value, optionally comparing it.
///
/// Panics with the fault if the `reset` failed.
///
/// # Example
///
/// ```rust
/// use undertow::{assert_decided, reset, Scope};
///
/// let result = reset(|_scope: Scope<&str>| async { "done" });
/// assert_decided!(result, "done");
/// ```
#[macro_export]
macro_rules! assert_decided {
    ($result:expr) => {
        match $result {
            ::std::result::Result::Ok(_) => {}
            ::std::result::Result::Err(e) => {
                panic!("Expected a decided value, got fault: {:?}", e);
            }
        }
    };
    ($result:expr, $expected:expr) => {
        match $result {
            ::std::result::Result::Ok(value) => assert_eq!(value, $expected),
            ::std::result::Result::Err(e) => {
                panic!("Expected decided value {:?}, got fault: {:?}", $expected, e);
            }
        }
    };
}

/// Assert that a `reset` failed with a fault matching `pattern`.
///
/// # Example
///
/// ```rust
/// use undertow::{assert_fault, reset, ContinuationError, Scope};
///
/// let result = reset(|scope: Scope<i32>| async move {
///     scope.shift(|k| async move { k.invoke(1).await + k.invoke(2).await }).await
/// });
/// assert_fault!(result, ContinuationError::AlreadyResumed { .. });
/// ```
#[macro_export]
macro_rules! assert_fault {
    ($result:expr, $pattern:pat) => {
        match $result {
            ::std::result::Result::Err(e) => {
                assert!(
                    matches!(e, $pattern),
                    "Expected fault matching {}, got: {:?}",
                    stringify!($pattern),
                    e
                );
            }
            ::std::result::Result::Ok(v) => {
                panic!("Expected a fault, got decided value: {:?}", v);
            }
        }
    };
}

/// Assert that an `Either` is `Right` with the expected value.
#[macro_export]
macro_rules! assert_right {
    ($either:expr, $expected:expr) => {
        match $either {
            $crate::Either::Right(value) => assert_eq!(value, $expected),
            $crate::Either::Left(l) => {
                panic!("Expected Right({:?}), got Left: {:?}", $expected, l);
            }
        }
    };
}

/// Assert that an `Either` is `Left` with the expected value.
#[macro_export]
macro_rules! assert_left {
    ($either:expr, $expected:expr) => {
        match $either {
            $crate::Either::Left(value) => assert_eq!(value, $expected),
            $crate::Either::Right(r) => {
                panic!("Expected Left({:?}), got Right: {:?}", $expected, r);
            }
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl<L, R> Arbitrary for crate::Either<L, R>
where
    L: Arbitrary + 'static,
    R: Arbitrary + 'static,
    L::Strategy: 'static,
    R::Strategy: 'static,
{
    type Parameters = (L::Parameters, R::Parameters);
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        let (l_params, r_params) = args;
        prop_oneof![
            any_with::<L>(l_params).prop_map(crate::Either::left),
            any_with::<R>(r_params).prop_map(crate::Either::right),
        ]
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use crate::{reset, ContinuationError, Either, Scope};

    #[test]
    fn assert_decided_macro() {
        assert_decided!(reset(|_scope: Scope<i32>| async { 1 }));
        assert_decided!(reset(|_scope: Scope<i32>| async { 1 }), 1);
    }

    #[test]
    fn assert_fault_macro() {
        let result = reset(|_scope: Scope<i32>| async {
            futures::future::pending::<()>().await;
            0
        });
        assert_fault!(result, ContinuationError::NoFurtherWork { .. });
    }

    #[test]
    #[should_panic(expected = "Expected a fault, got decided value")]
    fn assert_fault_panics_on_value() {
        assert_fault!(
            reset(|_scope: Scope<i32>| async { 1 }),
            ContinuationError::NoFurtherWork { .. }
        );
    }

    #[test]
    #[should_panic(expected = "got fault")]
    fn assert_decided_panics_on_fault() {
        let result: Result<i32, ContinuationError> =
            Err(ContinuationError::internal("broken"));
        assert_decided!(result, 1);
    }

    #[test]
    fn either_macros() {
        assert_right!(Either::<&str, i32>::Right(2), 2);
        assert_left!(Either::<&str, i32>::Left("no"), "no");
    }

    #[test]
    #[should_panic(expected = "Expected Right")]
    fn assert_right_panics_on_left() {
        assert_right!(Either::<&str, i32>::Left("no"), 2);
    }

    #[cfg(feature = "proptest")]
    mod proptest_tests {
        use crate::Either;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn either_arbitrary_generates_both_variants(
                value in any::<Either<i32, String>>()
            ) {
                match &value {
                    Either::Left(_) => prop_assert!(value.is_left()),
                    Either::Right(_) => prop_assert!(value.is_right()),
                }
            }
        }
    }
}
