//! Delayed-task scheduler on a virtual millisecond clock
//!
//! Tasks fire in order of `fire_at_ms`; tasks due at the same instant fire in
//! the order they were scheduled.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

struct Entry<T> {
    fire_at_ms: u64,
    seq: u64,
    task: T,
}

impl<T> Entry<T> {
    fn key(&self) -> (u64, u64) {
        (self.fire_at_ms, self.seq)
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T> Eq for Entry<T> {}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending tasks plus the current virtual time
pub struct Scheduler<T> {
    pending: BinaryHeap<Reverse<Entry<T>>>,
    now_ms: u64,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            pending: BinaryHeap::new(),
            now_ms: 0,
            next_seq: 0,
        }
    }

    /// Current virtual time
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Fire time of the earliest pending task
    pub fn next_fire_ms(&self) -> Option<u64> {
        self.pending.peek().map(|Reverse(e)| e.fire_at_ms)
    }

    /// Schedule a task `delay_ms` after the current time
    pub fn schedule_after(&mut self, delay_ms: u64, task: T) {
        let entry = Entry {
            fire_at_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
            task,
        };
        self.next_seq += 1;
        self.pending.push(Reverse(entry));
    }

    /// Pop the earliest task due at or before `until_ms`, advancing the clock
    /// to its fire time
    pub fn pop_due(&mut self, until_ms: u64) -> Option<T> {
        if self.next_fire_ms()? > until_ms {
            return None;
        }
        let Reverse(entry) = self.pending.pop()?;
        self.now_ms = self.now_ms.max(entry.fire_at_ms);
        Some(entry.task)
    }

    /// Pop the earliest task regardless of its fire time
    pub fn pop_next(&mut self) -> Option<T> {
        self.pop_due(u64::MAX)
    }

    /// Move the clock forward without running anything. Never goes backward.
    pub fn advance_to(&mut self, ms: u64) {
        self.now_ms = self.now_ms.max(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_time_order() {
        let mut sched = Scheduler::new();
        sched.schedule_after(500, "settle");
        sched.schedule_after(170, "bounce");
        assert_eq!(sched.next_fire_ms(), Some(170));

        assert_eq!(sched.pop_next(), Some("bounce"));
        assert_eq!(sched.now_ms(), 170);
        assert_eq!(sched.pop_next(), Some("settle"));
        assert_eq!(sched.now_ms(), 500);
        assert_eq!(sched.pop_next(), None);
    }

    #[test]
    fn test_same_instant_is_fifo() {
        let mut sched = Scheduler::new();
        for i in 0..5 {
            sched.schedule_after(10, i);
        }
        let order: Vec<_> = std::iter::from_fn(|| sched.pop_next()).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_pop_due_respects_horizon() {
        let mut sched = Scheduler::new();
        sched.schedule_after(100, 'a');
        assert_eq!(sched.pop_due(99), None);
        assert_eq!(sched.now_ms(), 0);
        assert_eq!(sched.pop_due(100), Some('a'));
    }

    #[test]
    fn test_delays_are_relative_to_now() {
        let mut sched = Scheduler::new();
        sched.advance_to(1_000);
        sched.schedule_after(0, 'x');
        assert_eq!(sched.next_fire_ms(), Some(1_000));
        sched.advance_to(10);
        assert_eq!(sched.now_ms(), 1_000);
    }
}
