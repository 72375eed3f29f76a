//! Associative merging of branch results.
//!
//! A multi-shot continuation produces one scope result per invocation. The
//! [`Semigroup`] trait is how those results are folded back into one value,
//! for example by [`Choice::choose`](crate::nondet::Choice::choose).
//!
//! # Examples
//!
//! ```
//! use undertow::Semigroup;
//!
//! assert_eq!(vec![1, 2].combine(vec![3]), vec![1, 2, 3]);
//! assert_eq!("ab".to_string().combine("c".to_string()), "abc");
//! assert_eq!(Some(vec![1]).combine(None), Some(vec![1]));
//! ```

use std::collections::VecDeque;

/// A type with an associative binary operation.
///
/// # Laws
///
/// ```text
/// a.combine(b).combine(c) == a.combine(b.combine(c))
/// ```
pub trait Semigroup: Sized {
    /// Combine this value with another, `self` first.
    fn combine(self, other: Self) -> Self;
}

impl<T> Semigroup for Vec<T> {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

impl<T> Semigroup for VecDeque<T> {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

impl Semigroup for String {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        self.push_str(&other);
        self
    }
}

// `None` is the identity.
impl<T: Semigroup> Semigroup for Option<T> {
    fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Some(a), Some(b)) => Some(a.combine(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

macro_rules! impl_semigroup_tuple {
    ($($idx:tt $T:ident),+) => {
        impl<$($T: Semigroup),+> Semigroup for ($($T,)+) {
            #[inline]
            fn combine(self, other: Self) -> Self {
                (
                    $(self.$idx.combine(other.$idx)),+
                )
            }
        }
    };
}

impl_semigroup_tuple!(0 T1, 1 T2);
impl_semigroup_tuple!(0 T1, 1 T2, 2 T3);
impl_semigroup_tuple!(0 T1, 1 T2, 2 T3, 3 T4);

/// Fold `items` left to right, starting from `S::default()`.
///
/// ```
/// use undertow::semigroup::concat;
///
/// let joined: String = concat(["a", "b", "c"].map(String::from));
/// assert_eq!(joined, "abc");
/// ```
pub fn concat<S, I>(items: I) -> S
where
    S: Semigroup + Default,
    I: IntoIterator<Item = S>,
{
    items.into_iter().fold(S::default(), Semigroup::combine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_semigroup() {
        assert_eq!(vec![1, 2, 3].combine(vec![4, 5]), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_vec_deque_keeps_order() {
        let front: VecDeque<_> = [1, 2].into_iter().collect();
        let back: VecDeque<_> = [3].into_iter().collect();
        assert_eq!(front.combine(back), VecDeque::from(vec![1, 2, 3]));
    }

    #[test]
    fn test_string_semigroup_empty() {
        assert_eq!(String::new().combine("Hello".to_string()), "Hello");
    }

    #[test]
    fn test_option_none_is_identity() {
        assert_eq!(None.combine(Some("x".to_string())), Some("x".to_string()));
        assert_eq!(Some(vec![1]).combine(Some(vec![2])), Some(vec![1, 2]));
        assert_eq!(None::<String>.combine(None), None);
    }

    #[test]
    fn test_tuple_3_semigroup() {
        let t1 = (vec![1], "a".to_string(), Some(vec!['x']));
        let t2 = (vec![2], "b".to_string(), None);
        assert_eq!(
            t1.combine(t2),
            (vec![1, 2], "ab".to_string(), Some(vec!['x']))
        );
    }

    #[test]
    fn test_tuple_associativity() {
        let a = (vec![1], "a".to_string());
        let b = (vec![2], "b".to_string());
        let c = (vec![3], "c".to_string());

        let left = a.clone().combine(b.clone()).combine(c.clone());
        let right = a.combine(b.combine(c));

        assert_eq!(left, right);
    }

    #[test]
    fn test_concat_empty_is_default() {
        let empty: Vec<i32> = concat(Vec::<Vec<i32>>::new());
        assert!(empty.is_empty());
        assert_eq!(concat(vec![vec![1], vec![], vec![2, 3]]), vec![1, 2, 3]);
    }
}
