//! Captured continuations.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use super::arena::{Fiber, FiberId};
use super::channel::ControlChannel;
use super::run_loop::ScopeRun;
use super::scope::{Body, Scope, ScopeInner};
use super::replay::EffectLog;
use super::state::Slot;
use crate::error::ContinuationError;
use crate::token::Token;

struct Captured<A, R> {
    scope: Rc<ScopeInner<R>>,
    target: FiberId,
    resume: Rc<Slot<A>>,
    live: Cell<bool>,
    index: usize,
    position: Option<usize>,
}

/// The rest of a scope's body from a `shift` point up to its `reset`.
///
/// Invoking it feeds a value to the suspended `shift` and yields the value
/// the scope eventually produces. The first invocation resumes the suspended
/// body directly. In a multi-shot scope later invocations re-run the body
/// from the start and answer every `shift` up to the capture point from the
/// effect log, so each sees exactly what the first run saw. Only shifts the
/// body performs can be replayed this way. In a single-shot scope a second
/// invocation faults with [`ContinuationError::AlreadyResumed`].
pub struct Continuation<A, R> {
    captured: Rc<Captured<A, R>>,
}

impl<A, R: 'static> Clone for Continuation<A, R> {
    fn clone(&self) -> Self {
        Continuation {
            captured: self.captured.clone(),
        }
    }
}

impl<A, R: 'static> fmt::Debug for Continuation<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("scope", &self.captured.scope.token)
            .field("shift_index", &self.captured.index)
            .field("position", &self.captured.position)
            .field("live", &self.captured.live.get())
            .finish()
    }
}

impl<A: Clone + 'static, R: 'static> Continuation<A, R> {
    pub(crate) fn capture(
        scope: Rc<ScopeInner<R>>,
        target: FiberId,
        resume: Rc<Slot<A>>,
        index: usize,
        position: Option<usize>,
    ) -> Self {
        Continuation {
            captured: Rc::new(Captured {
                scope,
                target,
                resume,
                live: Cell::new(true),
                index,
                position,
            }),
        }
    }

    /// Resume the captured computation with `value` and wait for the scope's
    /// result.
    pub async fn invoke(&self, value: A) -> R {
        let captured = &self.captured;
        let scope = &captured.scope;
        if captured.live.replace(false) {
            if let Some(position) = captured.position {
                scope.record_resumption(position, &value);
            }
            captured.resume.fill(value);
            Resume::new(scope.clone(), captured.target).await
        } else if scope.config.is_multi_shot() {
            let replay = match captured.position {
                Some(position) => scope.replay(position, value),
                None => Err(ContinuationError::NotReplayable {
                    scope: scope.token,
                    shift_index: captured.index,
                }),
            };
            match replay {
                Ok(run) => run.await,
                Err(error) => Stall::new(scope.channel.clone(), error).await,
            }
        } else {
            let error = ContinuationError::AlreadyResumed {
                scope: scope.token,
                shift_index: captured.index,
            };
            Stall::new(scope.channel.clone(), error).await
        }
    }

    /// Whether the next invocation resumes the suspended body directly
    /// rather than replaying it.
    pub fn is_live(&self) -> bool {
        self.captured.live.get()
    }

    /// Position of the capturing `shift` among the scope's shifts.
    pub fn shift_index(&self) -> usize {
        self.captured.index
    }

    /// Position of the capturing `shift` among the shifts the scope body
    /// itself performed. A replay answers every earlier body shift from the
    /// effect log.
    ///
    /// `None` when the shift was performed by a shift body. Such a
    /// continuation cannot be rebuilt by re-running the scope body, so
    /// invoking it a second time faults with
    /// [`ContinuationError::NotReplayable`].
    pub fn offset(&self) -> Option<usize> {
        self.captured.position
    }

    /// Token of the scope this continuation belongs to.
    pub fn scope_token(&self) -> Token {
        self.captured.scope.token
    }
}

/// Parks the invoking shift body and hands control to the captured fiber.
struct Resume<R> {
    scope: Rc<ScopeInner<R>>,
    target: FiberId,
    result: Option<Rc<Slot<R>>>,
}

impl<R: 'static> Resume<R> {
    fn new(scope: Rc<ScopeInner<R>>, target: FiberId) -> Self {
        Resume {
            scope,
            target,
            result: None,
        }
    }
}

impl<R: 'static> Future for Resume<R> {
    type Output = R;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<R> {
        let this = self.get_mut();
        match &this.result {
            Some(slot) => slot.take().map_or(Poll::Pending, Poll::Ready),
            None => {
                let slot = Slot::empty();
                if let Err(error) = this.scope.schedule_resume(this.target, slot.clone()) {
                    this.scope.channel.fault(error);
                }
                this.result = Some(slot);
                Poll::Pending
            }
        }
    }
}

/// Records a fault on first poll and never resolves.
struct Stall<T> {
    channel: Rc<ControlChannel>,
    error: Option<ContinuationError>,
    _output: PhantomData<fn() -> T>,
}

impl<T> Stall<T> {
    fn new(channel: Rc<ControlChannel>, error: ContinuationError) -> Self {
        Stall {
            channel,
            error: Some(error),
            _output: PhantomData,
        }
    }
}

impl<T> Future for Stall<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        if let Some(error) = this.error.take() {
            this.channel.fault(error);
        }
        Poll::Pending
    }
}

type CpsBody<A, R> = Rc<dyn Fn(Scope<R>, A) -> Fiber<R>>;

/// Continuation handed to the handler of [`Scope::shift_cps`].
///
/// Each invocation runs the explicit continuation body in a fresh scope
/// nested in the capturing one, so it may be invoked any number of times.
pub struct CpsContinuation<A, R> {
    owner: Rc<ScopeInner<R>>,
    body: CpsBody<A, R>,
}

impl<A, R: 'static> Clone for CpsContinuation<A, R> {
    fn clone(&self) -> Self {
        CpsContinuation {
            owner: self.owner.clone(),
            body: self.body.clone(),
        }
    }
}

impl<A, R: 'static> fmt::Debug for CpsContinuation<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpsContinuation")
            .field("scope", &self.owner.token)
            .finish_non_exhaustive()
    }
}

impl<A: Clone + 'static, R: 'static> CpsContinuation<A, R> {
    pub(crate) fn new<C, CFut>(owner: Rc<ScopeInner<R>>, body: C) -> Self
    where
        C: Fn(Scope<R>, A) -> CFut + 'static,
        CFut: Future<Output = R> + 'static,
    {
        let body: CpsBody<A, R> =
            Rc::new(move |scope: Scope<R>, value: A| body(scope, value).boxed_local());
        CpsContinuation { owner, body }
    }

    /// Run the continuation body with `value` and wait for its result.
    pub fn invoke(&self, value: A) -> ScopeRun<R> {
        let body = self.body.clone();
        let nested = ScopeInner::child(
            &self.owner,
            self.owner.config.clone(),
            Body::replayable(move |scope| body(scope, value.clone())),
            EffectLog::new(),
        );
        ScopeRun::new(nested)
    }

    /// Token of the scope this continuation was captured in.
    pub fn scope_token(&self) -> Token {
        self.owner.token
    }
}

/// Type-erased [`Continuation::invoke`], for callers that store invocations.
pub type Invocation<R> = LocalBoxFuture<'static, R>;

impl<A: Clone + 'static, R: 'static> Continuation<A, R> {
    /// Like [`invoke`](Continuation::invoke) but owning the continuation, so
    /// the returned future is `'static`.
    pub fn into_invocation(self, value: A) -> Invocation<R> {
        async move { self.invoke(value).await }.boxed_local()
    }
}
