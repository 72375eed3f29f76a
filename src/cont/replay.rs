//! The multi-shot effect log.
//!
//! The log holds one slot per `shift` the scope body itself performs, in
//! the order the body performs them. A live resumption of such a shift
//! stores its value at the shift's body position. Re-invoking a spent
//! continuation copies the log below that continuation's position, puts the
//! new value at the position and hands the copy to a fresh replay scope. That
//! scope answers its body's first shifts from the copy instead of
//! suspending, which reproduces exactly the outcomes the original run
//! observed below the capture point.
//!
//! Shifts performed by shift bodies have no body position and never touch
//! the log.

use std::any::Any;
use std::rc::Rc;

/// One recorded resumption value.
pub(crate) type LogEntry = Rc<dyn Any>;

/// Outcome of asking the log for a replayed value.
pub(crate) enum Replayed<A> {
    /// The shift at this position is answered from the log.
    Value(A),
    /// The position lies past the replayed prefix; the shift must genuinely
    /// suspend.
    Exhausted,
    /// The recorded value is missing or has a different type than requested.
    Diverged(usize),
}

#[derive(Default)]
pub(crate) struct EffectLog {
    entries: Vec<Option<LogEntry>>,
    prefilled: usize,
}

impl EffectLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A log seeded for replay. Only the seeded positions are ever replayed.
    pub(crate) fn prefilled(entries: Vec<Option<LogEntry>>) -> Self {
        EffectLog {
            prefilled: entries.len(),
            entries,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn replays(&self, position: usize) -> bool {
        position < self.prefilled
    }

    pub(crate) fn record<A: Clone + 'static>(&mut self, position: usize, value: &A) {
        if self.entries.len() <= position {
            self.entries.resize_with(position + 1, || None);
        }
        self.entries[position] = Some(Rc::new(value.clone()));
    }

    pub(crate) fn replayed<A: Clone + 'static>(&self, position: usize) -> Replayed<A> {
        if !self.replays(position) {
            return Replayed::Exhausted;
        }
        match self.entries[position]
            .as_ref()
            .and_then(|entry| entry.downcast_ref::<A>())
        {
            Some(value) => Replayed::Value(value.clone()),
            None => Replayed::Diverged(position),
        }
    }

    /// Copy of positions `[0, position)` with `seed` at `position`.
    pub(crate) fn slice_with<A: 'static>(&self, position: usize, seed: A) -> Vec<Option<LogEntry>> {
        let end = position.min(self.entries.len());
        let mut entries = self.entries[..end].to_vec();
        entries.resize_with(position, || None);
        entries.push(Some(Rc::new(seed)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_log_never_replays() {
        let mut log = EffectLog::new();
        log.record(0, &1);
        assert_eq!(log.len(), 1);
        assert!(matches!(log.replayed::<i32>(0), Replayed::Exhausted));
    }

    #[test]
    fn test_prefilled_replays_by_position() {
        let mut log = EffectLog::new();
        log.record(0, &10);
        log.record(1, &20);
        let replay = EffectLog::prefilled(log.slice_with(1, 99));

        assert!(matches!(replay.replayed::<i32>(1), Replayed::Value(99)));
        assert!(matches!(replay.replayed::<i32>(0), Replayed::Value(10)));
        assert!(matches!(replay.replayed::<i32>(2), Replayed::Exhausted));
    }

    #[test]
    fn test_out_of_order_records_keep_their_positions() {
        let mut log = EffectLog::new();
        log.record(1, &"second");
        log.record(0, &"first");
        let replay = EffectLog::prefilled(log.slice_with(2, "seed"));

        assert!(matches!(replay.replayed::<&str>(0), Replayed::Value("first")));
        assert!(matches!(replay.replayed::<&str>(1), Replayed::Value("second")));
        assert!(matches!(replay.replayed::<&str>(2), Replayed::Value("seed")));
    }

    #[test]
    fn test_appended_suffix_is_not_replayed() {
        let mut replay = EffectLog::prefilled(EffectLog::new().slice_with(0, 1));
        assert!(matches!(replay.replayed::<i32>(0), Replayed::Value(1)));
        replay.record(1, &2);
        assert_eq!(replay.len(), 2);
        assert!(matches!(replay.replayed::<i32>(1), Replayed::Exhausted));
    }

    #[test]
    fn test_type_mismatch_diverges() {
        let replay = EffectLog::prefilled(EffectLog::new().slice_with(0, "text"));
        assert!(matches!(replay.replayed::<i32>(0), Replayed::Diverged(0)));
    }

    #[test]
    fn test_missing_position_diverges() {
        let replay = EffectLog::prefilled(EffectLog::new().slice_with(2, 7));
        assert!(matches!(replay.replayed::<i32>(1), Replayed::Diverged(1)));
        assert!(matches!(replay.replayed::<i32>(2), Replayed::Value(7)));
    }

    #[test]
    fn test_slice_does_not_alias_parent() {
        let mut log = EffectLog::new();
        log.record(0, &1);
        let slice = log.slice_with(1, 2);
        log.record(1, &3);
        assert_eq!(slice.len(), 2);
        assert_eq!(log.len(), 2);
    }
}
