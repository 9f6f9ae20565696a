//! Deferred work.
//!
//! Fire-and-forget callbacks (`setTimeout` in the page) become [`Task`]s with a
//! due time. The router drains due tasks on every
//! [`InputEvent::Tick`](crate::input::InputEvent::Tick) and reports
//! [`DeferredQueue::next_due`] so the host knows when to tick next. Tasks are
//! never cancelled; each one checks the router's state when it fires.

use crate::input::Millis;

/// A deferred action.
#[derive(Debug, Clone, PartialEq)]
pub enum Task<E> {
    /// Refresh candidates after DOM mutations settled.
    SettleRefresh,
    /// Remove a transient class from an element.
    RemoveClass {
        /// Element the class was added to.
        element: E,
        /// Class to remove.
        class: String,
    },
    /// Drop the pointer-moving root class.
    EndPointerActivity,
}

#[derive(Debug, Clone)]
struct Entry<E> {
    due: Millis,
    seq: u64,
    task: Task<E>,
}

/// Queue of tasks ordered by due time, then insertion order.
#[derive(Debug, Clone)]
pub struct DeferredQueue<E> {
    entries: Vec<Entry<E>>,
    next_seq: u64,
}

impl<E> Default for DeferredQueue<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<E: PartialEq> DeferredQueue<E> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` at `due`.
    pub fn schedule(&mut self, due: Millis, task: Task<E>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { due, seq, task });
    }

    /// Like [`schedule`](Self::schedule), but drops any pending equal task first.
    pub fn reschedule(&mut self, due: Millis, task: Task<E>) {
        self.entries.retain(|entry| entry.task != task);
        self.schedule(due, task);
    }

    /// Remove and return every task due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: Millis) -> Vec<Task<E>> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|entry| entry.due <= now);
        self.entries = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|entry| entry.task).collect()
    }

    /// Earliest pending due time.
    pub fn next_due(&self) -> Option<Millis> {
        self.entries
            .iter()
            .map(|entry| entry.due)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
