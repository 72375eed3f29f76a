//! Scope identity tokens.
//!
//! A [`Token`] pairs a non-local exit signal with the one scope allowed to
//! catch it. Tokens are lightweight `Copy` values handed out from a global
//! counter, so two scopes never share one, even across threads.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a delimited scope.
///
/// Every `reset` (root, nested, replay or CPS) mints a fresh token.
///
/// # Example
///
/// ```rust
/// use undertow::Token;
///
/// let a = Token::fresh();
/// let b = Token::fresh();
/// assert_ne!(a, b);
/// assert!(b.raw() > a.raw());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Token(u64);

impl Token {
    /// Create a fresh unique token.
    pub fn fresh() -> Self {
        Token(TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fresh_tokens_are_unique() {
        let tokens: HashSet<Token> = (0..1000).map(|_| Token::fresh()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_display() {
        let token = Token::fresh();
        assert_eq!(token.to_string(), format!("#{}", token.raw()));
    }
}
