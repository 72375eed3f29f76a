//! Run-loop configuration.
//!
//! A [`ResetConfig`] is plain data describing *how* a `reset` should run. It is
//! built fluently and handed to [`reset_with`](crate::reset_with) or
//! [`Scope::reset_with`](crate::Scope::reset_with).
//!
//! ```rust
//! use undertow::{ResetConfig, ShotMode};
//!
//! let config = ResetConfig::multi_shot()
//!     .with_step_limit(10_000)
//!     .with_label("search");
//!
//! assert_eq!(config.mode(), ShotMode::MultiShot);
//! assert_eq!(config.step_limit(), Some(10_000));
//! assert_eq!(config.label(), Some("search"));
//! ```

/// How captured continuations behave when invoked more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShotMode {
    /// A second invocation is a fatal
    /// [`AlreadyResumed`](crate::ContinuationError::AlreadyResumed) fault.
    #[default]
    SingleShot,
    /// A second invocation replays the scope body from its recorded effect
    /// log. Requires a re-runnable (`Fn`) body.
    MultiShot,
}

/// Configuration for one `reset`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResetConfig {
    mode: ShotMode,
    step_limit: Option<usize>,
    label: Option<String>,
}

impl ResetConfig {
    /// Default configuration: single-shot, no step limit, no label.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-shot configuration.
    pub fn single_shot() -> Self {
        Self::new().with_mode(ShotMode::SingleShot)
    }

    /// Multi-shot configuration.
    pub fn multi_shot() -> Self {
        Self::new().with_mode(ShotMode::MultiShot)
    }

    /// Set the shot mode.
    pub fn with_mode(mut self, mode: ShotMode) -> Self {
        self.mode = mode;
        self
    }

    /// Bound the number of trampoline steps the run-loop may take.
    ///
    /// Exceeding the bound raises
    /// [`StepLimitExceeded`](crate::ContinuationError::StepLimitExceeded).
    /// Replay and nested scopes inherit the limit but count their own steps.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Attach a label that shows up in tracing output.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The configured shot mode.
    pub fn mode(&self) -> ShotMode {
        self.mode
    }

    /// The configured step limit, if any.
    pub fn step_limit(&self) -> Option<usize> {
        self.step_limit
    }

    /// The configured label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn is_multi_shot(&self) -> bool {
        self.mode == ShotMode::MultiShot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_single_shot() {
        let config = ResetConfig::default();
        assert_eq!(config.mode(), ShotMode::SingleShot);
        assert_eq!(config.step_limit(), None);
        assert_eq!(config.label(), None);
        assert!(!config.is_multi_shot());
    }

    #[test]
    fn test_builder_chain() {
        let config = ResetConfig::single_shot()
            .with_mode(ShotMode::MultiShot)
            .with_step_limit(5)
            .with_label("demo");
        assert!(config.is_multi_shot());
        assert_eq!(config.step_limit(), Some(5));
        assert_eq!(config.label(), Some("demo"));
    }
}
