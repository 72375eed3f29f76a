//! Futures returned by [`Scope::shift`], [`Scope::shift_cps`] and
//! [`Scope::escape`].

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use super::arena::Fiber;
use super::channel::{ControlChannel, Signal};
use super::continuation::Continuation;
use super::scope::{Scope, ScopeInner};
use super::state::Slot;
use crate::token::Token;

type Handler<A, R> = Box<dyn FnOnce(Continuation<A, R>) -> Fiber<R>>;

enum Stage<A> {
    Fresh,
    Registered { registration: u64, slot: Rc<Slot<A>> },
    Done,
}

/// Future returned by [`Scope::shift`].
///
/// Resolves to the value the captured continuation is invoked with.
#[must_use = "a shift does nothing unless awaited"]
pub struct Shift<A, R> {
    scope: Scope<R>,
    handler: Option<Handler<A, R>>,
    stage: Stage<A>,
}

impl<A, R: 'static> Shift<A, R> {
    pub(crate) fn new(scope: Scope<R>, handler: Handler<A, R>) -> Self {
        Shift {
            scope,
            handler: Some(handler),
            stage: Stage::Fresh,
        }
    }
}

impl<A: Clone + 'static, R: 'static> Future for Shift<A, R> {
    type Output = A;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<A> {
        let this = self.get_mut();
        let resumed = match &this.stage {
            Stage::Registered { slot, .. } => Some(slot.take()),
            Stage::Fresh => None,
            Stage::Done => return Poll::Pending,
        };
        if let Some(resumed) = resumed {
            return match resumed {
                Some(value) => {
                    this.stage = Stage::Done;
                    Poll::Ready(value)
                }
                None => Poll::Pending,
            };
        }

        let inner = &this.scope.inner;
        match inner.replayed::<A>() {
            Ok(Some(value)) => {
                this.stage = Stage::Done;
                return Poll::Ready(value);
            }
            Ok(None) => {}
            Err(error) => {
                inner.channel.fault(error);
                this.stage = Stage::Done;
                return Poll::Pending;
            }
        }

        let Some(handler) = this.handler.take() else {
            this.stage = Stage::Done;
            return Poll::Pending;
        };
        let slot = Slot::empty();
        match inner.register_shift(handler, slot.clone()) {
            Ok(registration) => {
                this.stage = Stage::Registered { registration, slot };
            }
            Err(error) => {
                inner.channel.fault(error);
                this.stage = Stage::Done;
            }
        }
        Poll::Pending
    }
}

impl<A, R> Drop for Shift<A, R> {
    fn drop(&mut self) {
        if let Stage::Registered { registration, .. } = self.stage {
            self.scope.inner.cancel_shift(registration);
        }
    }
}

impl<A, R: 'static> fmt::Debug for Shift<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.stage {
            Stage::Fresh => "fresh",
            Stage::Registered { .. } => "registered",
            Stage::Done => "done",
        };
        f.debug_struct("Shift")
            .field("scope", &self.scope.token())
            .field("stage", &stage)
            .finish()
    }
}

/// Future returned by [`Scope::shift_cps`]. It never resolves: the body that
/// awaits it is abandoned once the shift body starts.
#[must_use = "a shift does nothing unless awaited"]
pub struct ShiftCps<R, B> {
    scope: Rc<ScopeInner<R>>,
    start: Option<Box<dyn FnOnce() -> Fiber<R>>>,
    _output: PhantomData<fn() -> B>,
}

impl<R: 'static, B> ShiftCps<R, B> {
    pub(crate) fn new(scope: Rc<ScopeInner<R>>, start: Box<dyn FnOnce() -> Fiber<R>>) -> Self {
        ShiftCps {
            scope,
            start: Some(start),
            _output: PhantomData,
        }
    }
}

impl<R: 'static, B> Future for ShiftCps<R, B> {
    type Output = B;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<B> {
        let this = self.get_mut();
        if let Some(start) = this.start.take() {
            if let Err(error) = this.scope.register_cps(start) {
                this.scope.channel.fault(error);
            }
        }
        Poll::Pending
    }
}

impl<R: 'static, B> fmt::Debug for ShiftCps<R, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShiftCps")
            .field("scope", &self.scope.token)
            .field("started", &self.start.is_none())
            .finish()
    }
}

/// Future returned by [`Scope::escape`]. It never resolves.
#[must_use = "an escape does nothing unless awaited"]
pub struct Escape<R, B> {
    channel: Rc<ControlChannel>,
    target: Token,
    value: Option<R>,
    _output: PhantomData<fn() -> B>,
}

impl<R, B> Escape<R, B> {
    pub(crate) fn new(channel: Rc<ControlChannel>, target: Token, value: R) -> Self {
        Escape {
            channel,
            target,
            value: Some(value),
            _output: PhantomData,
        }
    }
}

// The escaped value is moved out by value and never pinned.
impl<R, B> Unpin for Escape<R, B> {}

impl<R: 'static, B> Future for Escape<R, B> {
    type Output = B;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<B> {
        let this = self.get_mut();
        if let Some(value) = this.value.take() {
            this.channel.raise(Signal {
                target: this.target,
                payload: Box::new(value),
            });
        }
        Poll::Pending
    }
}

impl<R, B> fmt::Debug for Escape<R, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Escape")
            .field("target", &self.target)
            .field("raised", &self.value.is_none())
            .finish()
    }
}
