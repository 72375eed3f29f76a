//! Fiber arena with free list.
//!
//! A fiber is a suspended piece of a scope: the body itself or one of its
//! shift bodies. Fibers are checked out while they are polled so that no
//! borrow of the scope state is held across user code.

use std::fmt;

use futures::future::LocalBoxFuture;

/// A suspendable computation producing the scope's result type.
pub(crate) type Fiber<R> = LocalBoxFuture<'static, R>;

/// Index of a fiber inside its scope's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct FiberId(u32);

impl FiberId {
    fn from_index(index: usize) -> Self {
        FiberId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

enum Slot<R> {
    Vacant,
    Parked(Fiber<R>),
    CheckedOut,
}

pub(crate) struct FiberArena<R> {
    slots: Vec<Slot<R>>,
    free_list: Vec<FiberId>,
}

impl<R> FiberArena<R> {
    pub(crate) fn new() -> Self {
        FiberArena {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, fiber: Fiber<R>) -> FiberId {
        if let Some(id) = self.free_list.pop() {
            self.slots[id.index()] = Slot::Parked(fiber);
            id
        } else {
            let id = FiberId::from_index(self.slots.len());
            self.slots.push(Slot::Parked(fiber));
            id
        }
    }

    /// Take a fiber out for polling. Returns `None` unless it is parked.
    pub(crate) fn check_out(&mut self, id: FiberId) -> Option<Fiber<R>> {
        let slot = self.slots.get_mut(id.index())?;
        match std::mem::replace(slot, Slot::CheckedOut) {
            Slot::Parked(fiber) => Some(fiber),
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Put a checked-out fiber back after it suspended again.
    pub(crate) fn check_in(&mut self, id: FiberId, fiber: Fiber<R>) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = Slot::Parked(fiber);
        }
    }

    /// Release the slot of a fiber that finished or was abandoned.
    pub(crate) fn release(&mut self, id: FiberId) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            if !matches!(slot, Slot::Vacant) {
                *slot = Slot::Vacant;
                self.free_list.push(id);
            }
        }
    }

    /// Remove every parked fiber, leaving the arena empty.
    ///
    /// The fibers are returned rather than dropped so the caller can drop them
    /// after releasing any borrow of the owning state.
    pub(crate) fn drain(&mut self) -> Vec<Fiber<R>> {
        self.free_list.clear();
        std::mem::take(&mut self.slots)
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Parked(fiber) => Some(fiber),
                Slot::Vacant | Slot::CheckedOut => None,
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| !matches!(slot, Slot::Vacant))
            .count()
    }
}

impl<R> Default for FiberArena<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn ready(value: i32) -> Fiber<i32> {
        async move { value }.boxed_local()
    }

    #[test]
    fn test_alloc_and_check_out() {
        let mut arena = FiberArena::new();
        let a = arena.alloc(ready(1));
        let b = arena.alloc(ready(2));
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);

        let fiber = arena.check_out(a);
        assert!(fiber.is_some());
        assert!(arena.check_out(a).is_none());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_release_and_reuse() {
        let mut arena = FiberArena::new();
        let a = arena.alloc(ready(1));
        assert!(arena.check_out(a).is_some());
        arena.release(a);
        assert_eq!(arena.len(), 0);
        arena.release(a);

        let b = arena.alloc(ready(2));
        assert_eq!(a, b);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_check_in_restores() {
        let mut arena = FiberArena::new();
        let a = arena.alloc(ready(1));
        let fiber = arena.check_out(a).unwrap();
        arena.check_in(a, fiber);
        assert!(arena.check_out(a).is_some());
    }

    #[test]
    fn test_drain_returns_parked_only() {
        let mut arena = FiberArena::new();
        let a = arena.alloc(ready(1));
        arena.alloc(ready(2));
        arena.alloc(ready(3));
        let _out = arena.check_out(a);

        let drained = arena.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(arena.len(), 0);
    }
}
