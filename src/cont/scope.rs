//! Scopes: the unit of delimitation.
//!
//! A [`Scope`] is the handle a `reset` body receives. Everything the engine
//! knows about one `reset` lives in the shared [`ScopeInner`]; the handle is a
//! cheap `Rc` clone that can be moved into shift bodies and nested blocks.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;

use super::arena::{Fiber, FiberId};
use super::channel::ControlChannel;
use super::continuation::{Continuation, CpsContinuation};
use super::replay::{EffectLog, LogEntry, Replayed};
use super::run_loop::ScopeRun;
use super::shift::{Escape, Shift, ShiftCps};
use super::state::{Parked, PendingShift, ScopeState, Slot};
use crate::config::{ResetConfig, ShotMode};
use crate::error::ContinuationError;
use crate::token::Token;
use crate::trace::engine_event;

pub(crate) type OnceBody<R> = Box<dyn FnOnce(Scope<R>) -> Fiber<R>>;
pub(crate) type SharedBody<R> = Rc<dyn Fn(Scope<R>) -> Fiber<R>>;

/// The computation a scope runs.
pub(crate) enum Body<R> {
    /// Runs exactly once.
    Once(RefCell<Option<OnceBody<R>>>),
    /// Can be restarted from scratch; required for multi-shot replay.
    Replayable(SharedBody<R>),
}

impl<R: 'static> Body<R> {
    pub(crate) fn once<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Scope<R>) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
    {
        let run: OnceBody<R> = Box::new(move |scope: Scope<R>| body(scope).boxed_local());
        Body::Once(RefCell::new(Some(run)))
    }

    pub(crate) fn replayable<F, Fut>(body: F) -> Self
    where
        F: Fn(Scope<R>) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
    {
        let run: SharedBody<R> = Rc::new(move |scope: Scope<R>| body(scope).boxed_local());
        Body::Replayable(run)
    }
}

/// What a child scope needs to know about the scopes enclosing it.
pub(crate) trait Ancestor {
    fn token(&self) -> Token;

    /// Whether this scope, or any scope above it, still has a shift body to
    /// start or a fiber to resume.
    fn has_pending_work(&self) -> bool;
}

pub(crate) struct ScopeInner<R> {
    pub(crate) token: Token,
    pub(crate) config: Rc<ResetConfig>,
    pub(crate) parent: Option<Rc<dyn Ancestor>>,
    pub(crate) channel: Rc<ControlChannel>,
    pub(crate) body: Body<R>,
    pub(crate) state: RefCell<ScopeState<R>>,
}

impl<R: 'static> Ancestor for ScopeInner<R> {
    fn token(&self) -> Token {
        self.token
    }

    fn has_pending_work(&self) -> bool {
        let local = self
            .state
            .try_borrow()
            .map(|state| state.has_local_work())
            .unwrap_or(false);
        local || self.parent.as_ref().is_some_and(|parent| parent.has_pending_work())
    }
}

impl<R> ScopeInner<R> {
    /// Forget a registration whose `Shift` future was dropped before the
    /// run-loop started its shift body.
    pub(crate) fn cancel_shift(&self, registration: u64) {
        let cancelled = match self.state.try_borrow_mut() {
            Ok(mut state)
                if state
                    .next_shift
                    .as_ref()
                    .is_some_and(|pending| pending.registration == registration) =>
            {
                state.next_shift.take()
            }
            _ => None,
        };
        if let Some(pending) = cancelled {
            engine_event!(trace, scope = %self.token, index = pending.index, "shift cancelled");
            drop(pending);
        }
    }
}

impl<R: 'static> ScopeInner<R> {
    pub(crate) fn root(config: ResetConfig, body: Body<R>) -> Rc<Self> {
        Rc::new(ScopeInner {
            token: Token::fresh(),
            config: Rc::new(config),
            parent: None,
            channel: Rc::new(ControlChannel::new()),
            body,
            state: RefCell::new(ScopeState::new(EffectLog::new())),
        })
    }

    /// A scope nested inside `parent`, sharing its control channel.
    pub(crate) fn child<P: 'static>(
        parent: &Rc<ScopeInner<P>>,
        config: Rc<ResetConfig>,
        body: Body<R>,
        log: EffectLog,
    ) -> Rc<Self> {
        let ancestor: Rc<dyn Ancestor> = parent.clone();
        Rc::new(ScopeInner {
            token: Token::fresh(),
            config,
            parent: Some(ancestor),
            channel: parent.channel.clone(),
            body,
            state: RefCell::new(ScopeState::new(log)),
        })
    }

    pub(crate) fn spawn_body(self: &Rc<Self>) -> Option<Fiber<R>> {
        let scope = Scope {
            inner: self.clone(),
        };
        match &self.body {
            Body::Once(cell) => {
                let body = cell.borrow_mut().take();
                body.map(|body| body(scope))
            }
            Body::Replayable(body) => Some(body(scope)),
        }
    }

    /// Answer a body `shift` from the replay log, if this scope is replaying
    /// it.
    pub(crate) fn replayed<A: Clone + 'static>(&self) -> Result<Option<A>, ContinuationError> {
        let mut state = self.state.borrow_mut();
        if state.current.is_none() || state.current != state.body_fiber {
            return Ok(None);
        }
        let position = state.body_shifts;
        match state.log.replayed::<A>(position) {
            Replayed::Value(value) => {
                state.body_shifts += 1;
                state.shift_count += 1;
                Ok(Some(value))
            }
            Replayed::Exhausted => Ok(None),
            Replayed::Diverged(index) => Err(ContinuationError::ReplayDivergence {
                scope: self.token,
                index,
            }),
        }
    }

    /// Record a shift body for the run-loop and capture the continuation of
    /// the fiber being polled.
    pub(crate) fn register_shift<A: Clone + 'static>(
        self: &Rc<Self>,
        handler: Box<dyn FnOnce(Continuation<A, R>) -> Fiber<R>>,
        resume: Rc<Slot<A>>,
    ) -> Result<u64, ContinuationError> {
        let mut state = self.state.borrow_mut();
        let target = state
            .current
            .ok_or(ContinuationError::NotRunning { scope: self.token })?;
        if state.next_shift.is_some() {
            return Err(ContinuationError::ConcurrentShift { scope: self.token });
        }
        let index = state.shift_count;
        state.shift_count += 1;
        let position = state.claim_body_position(target);
        let registration = state.next_registration();
        engine_event!(trace, scope = %self.token, index, position = ?position, fiber = %target, "shift registered");

        let continuation = Continuation::capture(self.clone(), target, resume, index, position);
        state.next_shift = Some(PendingShift {
            registration,
            index,
            start: Box::new(move || handler(continuation)),
        });
        Ok(registration)
    }

    /// Record a CPS shift body. The fiber being polled is abandoned.
    pub(crate) fn register_cps(
        self: &Rc<Self>,
        start: Box<dyn FnOnce() -> Fiber<R>>,
    ) -> Result<(), ContinuationError> {
        let mut state = self.state.borrow_mut();
        if state.current.is_none() {
            return Err(ContinuationError::NotRunning { scope: self.token });
        }
        if state.next_shift.is_some() {
            return Err(ContinuationError::ConcurrentShift { scope: self.token });
        }
        let index = state.shift_count;
        state.shift_count += 1;
        let registration = state.next_registration();
        engine_event!(trace, scope = %self.token, index, "cps shift registered");
        state.next_shift = Some(PendingShift {
            registration,
            index,
            start,
        });
        state.discard_current = true;
        Ok(())
    }

    /// Park the fiber being polled until the final value is known and
    /// schedule `target` for resumption.
    pub(crate) fn schedule_resume(
        &self,
        target: FiberId,
        slot: Rc<Slot<R>>,
    ) -> Result<(), ContinuationError> {
        let mut state = self.state.borrow_mut();
        let caller = state
            .current
            .ok_or(ContinuationError::NotRunning { scope: self.token })?;
        if state.runnable.is_some() {
            return Err(ContinuationError::ConcurrentResume { scope: self.token });
        }
        engine_event!(trace, scope = %self.token, fiber = %target, parked = %caller, "live resume");
        state.parked.push(Parked {
            fiber: caller,
            slot,
        });
        state.runnable = Some(target);
        Ok(())
    }

    pub(crate) fn record_resumption<A: Clone + 'static>(&self, position: usize, value: &A) {
        if self.config.is_multi_shot() {
            self.state.borrow_mut().log.record(position, value);
        }
    }

    /// Build a replay scope seeded with body positions `[0, position)` of
    /// this scope's log and `seed` at `position`.
    pub(crate) fn replay<A: 'static>(
        self: &Rc<Self>,
        position: usize,
        seed: A,
    ) -> Result<ScopeRun<R>, ContinuationError> {
        let body = match &self.body {
            Body::Replayable(body) => Body::Replayable(body.clone()),
            Body::Once(_) => {
                return Err(ContinuationError::internal(format!(
                    "scope {} cannot replay a run-once body",
                    self.token
                )))
            }
        };
        let entries: Vec<Option<LogEntry>> = self.state.borrow().log.slice_with(position, seed);
        engine_event!(debug, scope = %self.token, position, log_len = entries.len(), "replaying continuation");
        let replay = ScopeInner::child(self, self.config.clone(), body, EffectLog::prefilled(entries));
        Ok(ScopeRun::new(replay))
    }
}

/// Handle to a running delimited scope.
///
/// A `Scope<R>` is handed to every `reset` body. It captures continuations
/// with [`shift`](Scope::shift), exits non-locally with
/// [`escape`](Scope::escape) and opens nested scopes with
/// [`reset`](Scope::reset). Cloning is cheap and every clone refers to the
/// same scope.
pub struct Scope<R> {
    pub(crate) inner: Rc<ScopeInner<R>>,
}

impl<R: 'static> Clone for Scope<R> {
    fn clone(&self) -> Self {
        Scope {
            inner: self.inner.clone(),
        }
    }
}

impl<R: 'static> fmt::Debug for Scope<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("token", &self.inner.token)
            .field("mode", &self.inner.config.mode())
            .field(
                "parent",
                &self.inner.parent.as_ref().map(|parent| parent.token()),
            )
            .finish_non_exhaustive()
    }
}

impl<R: 'static> Scope<R> {
    /// The token identifying this scope.
    pub fn token(&self) -> Token {
        self.inner.token
    }

    /// The shot mode this scope runs in.
    pub fn mode(&self) -> ShotMode {
        self.inner.config.mode()
    }

    /// Capture the rest of the body up to this scope's `reset` and hand it
    /// to `handler`.
    ///
    /// The returned future resolves to whatever value the continuation is
    /// invoked with. If the handler never invokes it, the body never resumes
    /// and the handler's own result becomes the scope's value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::{reset, Scope};
    ///
    /// let result = reset(|scope: Scope<i32>| async move {
    ///     let x: i32 = scope.shift(|k| async move { k.invoke(20).await + 1 }).await;
    ///     x * 2
    /// });
    /// assert_eq!(result, Ok(41));
    /// ```
    pub fn shift<A, F, Fut>(&self, handler: F) -> Shift<A, R>
    where
        A: Clone + 'static,
        F: FnOnce(Continuation<A, R>) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
    {
        Shift::new(
            self.clone(),
            Box::new(move |continuation: Continuation<A, R>| handler(continuation).boxed_local()),
        )
    }

    /// Capture with an explicit continuation body `resume` instead of the
    /// rest of the current body.
    ///
    /// The body never resumes. Each invocation of the continuation handed to
    /// `handler` runs `resume` in a fresh nested scope, so it can be invoked
    /// any number of times even in a single-shot scope.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::{reset, Scope};
    ///
    /// let result = reset(|scope: Scope<i32>| async move {
    ///     scope
    ///         .shift_cps(
    ///             |k| async move { k.invoke(1).await + k.invoke(2).await },
    ///             |_inner, i: i32| async move { i + 1 },
    ///         )
    ///         .await
    /// });
    /// assert_eq!(result, Ok(5));
    /// ```
    pub fn shift_cps<A, B, F, Fut, C, CFut>(&self, handler: F, resume: C) -> ShiftCps<R, B>
    where
        A: Clone + 'static,
        F: FnOnce(CpsContinuation<A, R>) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
        C: Fn(Scope<R>, A) -> CFut + 'static,
        CFut: Future<Output = R> + 'static,
    {
        let continuation = CpsContinuation::new(self.inner.clone(), resume);
        ShiftCps::new(
            self.inner.clone(),
            Box::new(move || handler(continuation).boxed_local()),
        )
    }

    /// Exit this scope immediately with `value`.
    ///
    /// The exit travels as a signal tagged with this scope's token. Scopes
    /// nested inside this one pass it outwards untouched; this scope catches
    /// it, discards all pending work and returns `value` from its `reset`.
    /// The returned future never resolves, so it can stand in for any type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::{reset, Scope};
    ///
    /// let result = reset(|outer: Scope<i32>| async move {
    ///     let handle = outer.clone();
    ///     let len = outer
    ///         .reset(move |_inner: Scope<String>| async move { handle.escape(-1).await })
    ///         .await
    ///         .len();
    ///     len as i32
    /// });
    /// assert_eq!(result, Ok(-1));
    /// ```
    pub fn escape<B>(&self, value: R) -> Escape<R, B> {
        Escape::new(self.inner.channel.clone(), self.inner.token, value)
    }

    /// Open a single-shot scope nested inside this one.
    ///
    /// The nested scope shares this scope's signal and fault channel. When
    /// it runs out of local work while this scope (or one above it) still
    /// has some, it yields to it instead of failing.
    pub fn reset<T, F, Fut>(&self, body: F) -> ScopeRun<T>
    where
        T: 'static,
        F: FnOnce(Scope<T>) -> Fut + 'static,
        Fut: Future<Output = T> + 'static,
    {
        let config = ResetConfig::single_shot();
        let config = match self.inner.config.step_limit() {
            Some(limit) => config.with_step_limit(limit),
            None => config,
        };
        ScopeRun::new(ScopeInner::child(
            &self.inner,
            Rc::new(config),
            Body::once(body),
            EffectLog::new(),
        ))
    }

    /// Open a multi-shot scope nested inside this one.
    pub fn reset_multi<T, F, Fut>(&self, body: F) -> ScopeRun<T>
    where
        T: 'static,
        F: Fn(Scope<T>) -> Fut + 'static,
        Fut: Future<Output = T> + 'static,
    {
        let config = ResetConfig::multi_shot();
        let config = match self.inner.config.step_limit() {
            Some(limit) => config.with_step_limit(limit),
            None => config,
        };
        self.reset_with(config, body)
    }

    /// Open a nested scope with an explicit configuration.
    pub fn reset_with<T, F, Fut>(&self, config: ResetConfig, body: F) -> ScopeRun<T>
    where
        T: 'static,
        F: Fn(Scope<T>) -> Fut + 'static,
        Fut: Future<Output = T> + 'static,
    {
        ScopeRun::new(ScopeInner::child(
            &self.inner,
            Rc::new(config),
            Body::replayable(body),
            EffectLog::new(),
        ))
    }
}
