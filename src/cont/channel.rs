//! The control channel shared by a root scope and everything nested in it.
//!
//! Two kinds of out-of-band conditions travel here instead of through the
//! fibers' return values:
//!
//! - **Signals**: token-tagged non-local exits raised by
//!   [`Scope::escape`](crate::Scope::escape). Each run-loop compares the
//!   signal's token with its own; the matching scope catches it, every other
//!   scope yields `Pending` so the signal keeps travelling outwards.
//! - **Faults**: fatal [`ContinuationError`]s. Once set, every run-loop in the
//!   chain stops and the root returns the fault.

use std::any::Any;
use std::cell::RefCell;

use crate::error::ContinuationError;
use crate::token::Token;
use crate::trace::engine_event;

pub(crate) struct Signal {
    pub(crate) target: Token,
    pub(crate) payload: Box<dyn Any>,
}

#[derive(Default)]
pub(crate) struct ControlChannel {
    signal: RefCell<Option<Signal>>,
    fault: RefCell<Option<ContinuationError>>,
}

impl ControlChannel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Raise a signal. The first signal wins until it is caught.
    pub(crate) fn raise(&self, signal: Signal) {
        let mut slot = self.signal.borrow_mut();
        if slot.is_none() {
            engine_event!(trace, target = %signal.target, "escape signal raised");
            *slot = Some(signal);
        }
    }

    pub(crate) fn signal_target(&self) -> Option<Token> {
        self.signal.borrow().as_ref().map(|signal| signal.target)
    }

    /// Take the pending signal if it is addressed to `token`.
    pub(crate) fn catch(&self, token: Token) -> Option<Box<dyn Any>> {
        let mut slot = self.signal.borrow_mut();
        match slot.as_ref() {
            Some(signal) if signal.target == token => slot.take().map(|signal| signal.payload),
            _ => None,
        }
    }

    /// Record a fault. The first fault wins.
    pub(crate) fn fault(&self, error: ContinuationError) {
        let mut slot = self.fault.borrow_mut();
        if slot.is_none() {
            engine_event!(warn, %error, "continuation engine fault");
            *slot = Some(error);
        }
    }

    pub(crate) fn has_fault(&self) -> bool {
        self.fault.borrow().is_some()
    }

    pub(crate) fn take_fault(&self) -> Option<ContinuationError> {
        self.fault.borrow_mut().take()
    }
}
