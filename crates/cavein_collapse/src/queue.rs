//! # Propagation Queue
//!
//! Pending cascades waiting for their next continuation pass.
//!
//! ## Lifecycle
//!
//! A record is created by a scan, queued with a due tick, drained exactly
//! once when that tick arrives, and replaced by whatever the continuation
//! pass produces. Records whose epicenter leaves the loaded area are dropped
//! without running.
//!
//! Records are never mutated while queued.

use cavein_shared::BlockPos;

/// A cascade waiting to continue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingPropagation {
    /// Origin of the collapse, fixed for its lifetime.
    pub epicenter: BlockPos,
    /// Positions to test on the next pass, in the order they were recorded.
    pub frontier: Vec<BlockPos>,
    /// Squared radius every pass is bounded by.
    pub radius_squared: i64,
}

impl PendingPropagation {
    /// Creates a record.
    #[must_use]
    pub fn new(epicenter: BlockPos, frontier: Vec<BlockPos>, radius_squared: i64) -> Self {
        Self {
            epicenter,
            frontier,
            radius_squared,
        }
    }

    /// Returns true if `pos` lies strictly inside the collapse radius.
    #[inline]
    #[must_use]
    pub fn within_radius(&self, pos: BlockPos) -> bool {
        pos.distance_sq(self.epicenter) < self.radius_squared
    }

    /// Returns true if there is nothing left to continue.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.frontier.is_empty()
    }
}

/// A record plus the tick it becomes due.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledPropagation {
    /// Tick at or after which the record runs.
    pub due_tick: u64,
    /// The pending cascade.
    pub record: PendingPropagation,
}

/// Tick-drained store of pending cascades, kept in enqueue order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropagationQueue {
    entries: Vec<ScheduledPropagation>,
}

impl PropagationQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `record` to run at `due_tick`.
    pub fn enqueue(&mut self, record: PendingPropagation, due_tick: u64) {
        self.entries.push(ScheduledPropagation { due_tick, record });
    }

    /// Removes every record due at `now`, returning those with work left.
    ///
    /// Order is enqueue order. Settled records are removed and yield nothing.
    pub fn drain_due(&mut self, now: u64) -> Vec<PendingPropagation> {
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.due_tick <= now);
        self.entries = pending;

        due.into_iter()
            .map(|entry| entry.record)
            .filter(|record| !record.is_settled())
            .collect()
    }

    /// Drops every record whose epicenter `is_loaded` rejects.
    ///
    /// Returns the number of records dropped.
    pub fn drop_unloaded(&mut self, mut is_loaded: impl FnMut(BlockPos) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| is_loaded(entry.record.epicenter));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            tracing::debug!("dropped {} pending propagations in unloaded regions", dropped);
        }
        dropped
    }

    /// Number of queued records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued records in enqueue order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledPropagation> {
        self.entries.iter()
    }

    /// Earliest due tick, if anything is queued.
    #[must_use]
    pub fn next_due_tick(&self) -> Option<u64> {
        self.entries.iter().map(|entry| entry.due_tick).min()
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl FromIterator<ScheduledPropagation> for PropagationQueue {
    fn from_iter<I: IntoIterator<Item = ScheduledPropagation>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
