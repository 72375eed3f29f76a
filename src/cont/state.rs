//! Mutable run state owned by one scope instance.

use std::cell::RefCell;
use std::rc::Rc;

use super::arena::{Fiber, FiberArena, FiberId};
use super::replay::EffectLog;

/// Where a scope is in its lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum RunPhase {
    /// The body has not been started.
    Undecided,
    /// The body has started and the run-loop is trampolining.
    Suspended,
    /// A final value was delivered (or the scope was torn down).
    Decided,
}

/// A one-value mailbox between a suspended future and whoever resumes it.
pub(crate) struct Slot<T>(RefCell<Option<T>>);

impl<T> Slot<T> {
    pub(crate) fn empty() -> Rc<Self> {
        Rc::new(Slot(RefCell::new(None)))
    }

    pub(crate) fn fill(&self, value: T) {
        *self.0.borrow_mut() = Some(value);
    }

    pub(crate) fn take(&self) -> Option<T> {
        self.0.borrow_mut().take()
    }
}

/// A shift body recorded by `shift` and not yet started by the run-loop.
pub(crate) struct PendingShift<R> {
    pub(crate) registration: u64,
    pub(crate) index: usize,
    pub(crate) start: Box<dyn FnOnce() -> Fiber<R>>,
}

/// A shift body suspended inside a live `invoke`, waiting for the value the
/// resumed computation eventually produces.
pub(crate) struct Parked<R> {
    pub(crate) fiber: FiberId,
    pub(crate) slot: Rc<Slot<R>>,
}

pub(crate) struct ScopeState<R> {
    pub(crate) phase: RunPhase,
    pub(crate) fibers: FiberArena<R>,
    /// Fiber being polled by this scope's run-loop right now.
    pub(crate) current: Option<FiberId>,
    /// Fiber running the scope body, until it completes or is abandoned.
    pub(crate) body_fiber: Option<FiberId>,
    pub(crate) next_shift: Option<PendingShift<R>>,
    /// Fiber scheduled for resumption by a live `invoke`.
    pub(crate) runnable: Option<FiberId>,
    /// Fiber that suspended on something outside this scope.
    pub(crate) blocked: Option<FiberId>,
    /// Shift bodies to resume with the decided value, innermost last.
    pub(crate) parked: Vec<Parked<R>>,
    /// Most recent value produced by a fiber of this scope.
    pub(crate) intermediate: Option<R>,
    /// Set by `shift_cps`: the fiber being polled never resumes.
    pub(crate) discard_current: bool,
    pub(crate) log: EffectLog,
    pub(crate) shift_count: usize,
    /// Shifts performed by the body fiber so far, replayed ones included.
    pub(crate) body_shifts: usize,
    pub(crate) steps: usize,
    registrations: u64,
}

impl<R> ScopeState<R> {
    pub(crate) fn new(log: EffectLog) -> Self {
        ScopeState {
            phase: RunPhase::Undecided,
            fibers: FiberArena::new(),
            current: None,
            body_fiber: None,
            next_shift: None,
            runnable: None,
            blocked: None,
            parked: Vec::new(),
            intermediate: None,
            discard_current: false,
            log,
            shift_count: 0,
            body_shifts: 0,
            steps: 0,
            registrations: 0,
        }
    }

    pub(crate) fn advance(&mut self, phase: RunPhase) {
        debug_assert!(phase >= self.phase, "run phase moved backwards");
        if phase > self.phase {
            self.phase = phase;
        }
    }

    pub(crate) fn next_registration(&mut self) -> u64 {
        self.registrations += 1;
        self.registrations
    }

    /// Body position for a shift registered by `fiber`, if it is the body.
    pub(crate) fn claim_body_position(&mut self, fiber: FiberId) -> Option<usize> {
        if self.body_fiber != Some(fiber) {
            return None;
        }
        let position = self.body_shifts;
        self.body_shifts += 1;
        Some(position)
    }

    pub(crate) fn release_fiber(&mut self, id: FiberId) {
        self.fibers.release(id);
        if self.body_fiber == Some(id) {
            self.body_fiber = None;
        }
    }

    pub(crate) fn has_local_work(&self) -> bool {
        self.next_shift.is_some() || self.runnable.is_some()
    }

    /// Forget all pending work and hand back the fibers for dropping.
    pub(crate) fn clear(&mut self) -> (Vec<Fiber<R>>, Option<R>) {
        self.next_shift = None;
        self.runnable = None;
        self.blocked = None;
        self.current = None;
        self.body_fiber = None;
        self.parked.clear();
        self.advance(RunPhase::Decided);
        (self.fibers.drain(), self.intermediate.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_only_moves_forward() {
        let mut state: ScopeState<i32> = ScopeState::new(EffectLog::new());
        assert_eq!(state.phase, RunPhase::Undecided);
        state.advance(RunPhase::Suspended);
        state.advance(RunPhase::Decided);
        assert_eq!(state.phase, RunPhase::Decided);
    }

    #[test]
    fn test_slot_hands_over_once() {
        let slot = Slot::empty();
        slot.fill(3);
        assert_eq!(slot.take(), Some(3));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_clear_drops_work() {
        let mut state: ScopeState<i32> = ScopeState::new(EffectLog::new());
        state.intermediate = Some(4);
        state.parked.push(Parked {
            fiber: state.fibers.alloc(Box::pin(async { 1 })),
            slot: Slot::empty(),
        });
        let (fibers, leftover) = state.clear();
        assert_eq!(fibers.len(), 1);
        assert_eq!(leftover, Some(4));
        assert!(state.parked.is_empty());
        assert_eq!(state.phase, RunPhase::Decided);
        assert!(!state.has_local_work());
    }

    #[test]
    fn test_only_body_fiber_claims_positions() {
        let mut state: ScopeState<i32> = ScopeState::new(EffectLog::new());
        let body = state.fibers.alloc(Box::pin(async { 1 }));
        let handler = state.fibers.alloc(Box::pin(async { 2 }));
        state.body_fiber = Some(body);

        assert_eq!(state.claim_body_position(body), Some(0));
        assert_eq!(state.claim_body_position(handler), None);
        assert_eq!(state.claim_body_position(body), Some(1));

        // A reused id must not inherit the body's positions.
        state.release_fiber(body);
        let reused = state.fibers.alloc(Box::pin(async { 3 }));
        assert_eq!(state.claim_body_position(reused), None);
    }
}
