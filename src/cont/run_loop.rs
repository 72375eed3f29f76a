//! The trampoline that drives one scope.
//!
//! Every scope owns exactly one run-loop. Fibers are polled one at a time and
//! never while the scope state is borrowed, so user code inside a fiber can
//! freely register shifts, resume continuations and open nested scopes. All
//! suspension bookkeeping lives in [`ScopeState`](super::state::ScopeState),
//! which keeps the native stack flat no matter how many shifts a body makes.
//!
//! One iteration of the loop, in priority order:
//!
//! 1. stop if the control channel holds a fault or a signal this scope cannot
//!    catch, and finish if it holds one it can;
//! 2. resume the fiber a live `invoke` made runnable;
//! 3. start the most recently registered shift body;
//! 4. hand the latest fiber result to the innermost parked shift body, or
//!    decide the scope with it when none is parked;
//! 5. otherwise yield to an enclosing scope that still has work, or fail with
//!    [`ContinuationError::NoFurtherWork`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::task::noop_waker_ref;

use super::arena::FiberId;
use super::scope::{Ancestor, ScopeInner};
use super::state::{PendingShift, RunPhase};
use crate::error::ContinuationError;
use crate::token::Token;
use crate::trace::engine_event;

enum Move<R> {
    Resume(FiberId),
    Start(PendingShift<R>),
    Flush(FiberId),
    Finish(R),
    Stuck,
}

impl<R: 'static> ScopeInner<R> {
    pub(crate) fn drive(self: &Rc<Self>, cx: &mut Context<'_>) -> Poll<R> {
        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!(
            "reset",
            scope = %self.token,
            label = self.config.label().unwrap_or_default()
        )
        .entered();

        if self.channel.has_fault() {
            return Poll::Pending;
        }

        let phase = self.state.borrow().phase;
        match phase {
            RunPhase::Decided => {
                self.channel.fault(ContinuationError::internal(format!(
                    "scope {} polled after it was decided",
                    self.token
                )));
                return Poll::Pending;
            }
            RunPhase::Undecided => {
                engine_event!(debug, scope = %self.token, mode = ?self.config.mode(), "reset started");
                let Some(fiber) = self.spawn_body() else {
                    self.channel.fault(ContinuationError::internal(format!(
                        "scope {} has no body to run",
                        self.token
                    )));
                    return Poll::Pending;
                };
                let id = {
                    let mut state = self.state.borrow_mut();
                    let id = state.fibers.alloc(fiber);
                    state.body_fiber = Some(id);
                    state.advance(RunPhase::Suspended);
                    id
                };
                self.step(id, cx);
            }
            RunPhase::Suspended => {
                let blocked = self.state.borrow_mut().blocked.take();
                if let Some(id) = blocked {
                    engine_event!(trace, scope = %self.token, fiber = %id, "retrying blocked fiber");
                    self.step(id, cx);
                }
            }
        }

        self.trampoline(cx)
    }

    fn trampoline(self: &Rc<Self>, cx: &mut Context<'_>) -> Poll<R> {
        loop {
            if let Some(outcome) = self.check_channel() {
                return outcome;
            }
            if let Some(limit) = self.config.step_limit() {
                if self.state.borrow().steps > limit {
                    self.channel.fault(ContinuationError::StepLimitExceeded {
                        scope: self.token,
                        limit,
                    });
                    return Poll::Pending;
                }
            }

            match self.next_move() {
                Move::Resume(id) | Move::Flush(id) => {
                    self.step(id, cx);
                }
                Move::Start(pending) => {
                    engine_event!(trace, scope = %self.token, index = pending.index, "starting shift body");
                    let fiber = (pending.start)();
                    let id = self.state.borrow_mut().fibers.alloc(fiber);
                    self.step(id, cx);
                }
                Move::Finish(value) => {
                    engine_event!(debug, scope = %self.token, "scope decided");
                    self.teardown();
                    return Poll::Ready(value);
                }
                Move::Stuck => {
                    if self
                        .parent
                        .as_ref()
                        .is_some_and(|parent| parent.has_pending_work())
                    {
                        engine_event!(trace, scope = %self.token, "yielding to enclosing scope");
                        return Poll::Pending;
                    }
                    self.channel
                        .fault(ContinuationError::NoFurtherWork { scope: self.token });
                    return Poll::Pending;
                }
            }
        }
    }

    fn next_move(&self) -> Move<R> {
        let mut state = self.state.borrow_mut();
        if let Some(id) = state.runnable.take() {
            return Move::Resume(id);
        }
        if let Some(pending) = state.next_shift.take() {
            return Move::Start(pending);
        }
        if let Some(value) = state.intermediate.take() {
            return match state.parked.pop() {
                Some(parked) => {
                    parked.slot.fill(value);
                    Move::Flush(parked.fiber)
                }
                None => Move::Finish(value),
            };
        }
        Move::Stuck
    }

    /// Poll one fiber with no borrow of the state held.
    fn step(self: &Rc<Self>, id: FiberId, cx: &mut Context<'_>) {
        let fiber = {
            let mut state = self.state.borrow_mut();
            state.steps += 1;
            let fiber = state.fibers.check_out(id);
            if fiber.is_some() {
                state.current = Some(id);
            }
            fiber
        };
        let Some(mut fiber) = fiber else {
            self.channel.fault(ContinuationError::internal(format!(
                "fiber {id} of scope {} is not resumable",
                self.token
            )));
            return;
        };

        let polled = fiber.as_mut().poll(cx);

        let mut state = self.state.borrow_mut();
        state.current = None;
        let discard = std::mem::take(&mut state.discard_current);
        match polled {
            Poll::Ready(value) => {
                state.release_fiber(id);
                if state.intermediate.replace(value).is_some() {
                    engine_event!(debug, scope = %self.token, fiber = %id, "unconsumed fiber result replaced");
                }
            }
            Poll::Pending if discard => {
                state.release_fiber(id);
            }
            Poll::Pending => {
                state.fibers.check_in(id, fiber);
                if !state.has_local_work() {
                    state.blocked = Some(id);
                }
                return;
            }
        }
        // The fiber may own the last handles to nested scopes.
        drop(state);
        drop(fiber);
    }

    /// Inspect the control channel. `Some` means the run-loop must stop.
    fn check_channel(&self) -> Option<Poll<R>> {
        if self.channel.has_fault() {
            return Some(Poll::Pending);
        }
        let target = self.channel.signal_target()?;
        if let Some(payload) = self.channel.catch(self.token) {
            return Some(match payload.downcast::<R>() {
                Ok(value) => {
                    engine_event!(debug, scope = %self.token, "escape caught");
                    self.teardown();
                    Poll::Ready(*value)
                }
                Err(_) => {
                    self.channel.fault(ContinuationError::internal(format!(
                        "escape to scope {} carried a value of the wrong type",
                        self.token
                    )));
                    Poll::Pending
                }
            });
        }
        if self.parent.is_none() {
            self.channel
                .fault(ContinuationError::UnhandledSignal { target });
        }
        Some(Poll::Pending)
    }
}

impl<R> ScopeInner<R> {
    /// Discard every fiber and all pending work, marking the scope decided.
    pub(crate) fn teardown(&self) {
        let released = match self.state.try_borrow_mut() {
            Ok(mut state) => {
                let (fibers, leftover) = state.clear();
                Some((fibers, leftover))
            }
            Err(_) => None,
        };
        // Fibers may own handles to this scope; drop them with no borrow held.
        drop(released);
    }
}

/// A scope being driven as a future.
///
/// Returned by the nested [`Scope::reset`](crate::Scope::reset) family and by
/// [`CpsContinuation::invoke`](crate::CpsContinuation::invoke). Await it from
/// inside the enclosing scope's body or shift bodies. Dropping it tears the
/// scope down.
#[must_use = "a nested scope does nothing unless awaited"]
pub struct ScopeRun<R> {
    inner: Rc<ScopeInner<R>>,
}

impl<R: 'static> ScopeRun<R> {
    pub(crate) fn new(inner: Rc<ScopeInner<R>>) -> Self {
        ScopeRun { inner }
    }

    /// Token of the scope this future drives.
    pub fn token(&self) -> Token {
        self.inner.token
    }

    /// Drive a root scope to completion on the calling thread.
    pub(crate) fn run_to_completion(self) -> Result<R, ContinuationError> {
        let mut cx = Context::from_waker(noop_waker_ref());
        match self.inner.drive(&mut cx) {
            Poll::Ready(value) => Ok(value),
            Poll::Pending => Err(self
                .inner
                .channel
                .take_fault()
                .unwrap_or(ContinuationError::NoFurtherWork {
                    scope: self.inner.token,
                })),
        }
    }
}

impl<R: 'static> Future for ScopeRun<R> {
    type Output = R;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<R> {
        self.inner.drive(cx)
    }
}

impl<R> Drop for ScopeRun<R> {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl<R: 'static> fmt::Debug for ScopeRun<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("ScopeRun");
        debug.field("scope", &self.inner.token);
        if let Ok(state) = self.inner.state.try_borrow() {
            debug
                .field("phase", &state.phase)
                .field("fibers", &state.fibers.len())
                .field("parked", &state.parked.len());
        }
        debug.finish()
    }
}
