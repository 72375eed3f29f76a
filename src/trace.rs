//! Feature-gated engine logging.

/// Emit a `tracing` event when the `tracing` feature is enabled.
///
/// Without the feature this expands to nothing, so the engine carries no
/// logging cost by default.
macro_rules! engine_event {
    ($level:ident, $($arg:tt)+) => {{
        #[cfg(feature = "tracing")]
        {
            tracing::$level!($($arg)+);
        }
    }};
}

pub(crate) use engine_event;
