use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::debug;

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Moves the clock forward to `to`. Never moves it backwards.
    pub fn advance_to(&self, to: Instant) {
        if to > self.now.get() {
            self.now.set(to);
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Clone, Debug)]
struct Scheduled<T> {
    release_at: Instant,
    item: T,
}

/// Items waiting for their release time, ordered by that time.
///
/// Items with equal release times come out in insertion order. Only the
/// earliest deadline matters to the event loop, so a single timer is enough.
#[derive(Clone, Debug)]
pub struct DelayQueue<T> {
    entries: VecDeque<Scheduled<T>>,
}

impl<T> Default for DelayQueue<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }
}

impl<T> DelayQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, release_at: Instant, item: T) {
        let idx = self
            .entries
            .partition_point(|entry| entry.release_at <= release_at);
        self.entries.insert(idx, Scheduled { release_at, item });
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.front().map(|entry| entry.release_at)
    }

    /// Removes the earliest item if its release time has come.
    pub fn pop_due(&mut self, now: Instant) -> Option<T> {
        if self.entries.front()?.release_at <= now {
            self.entries.pop_front().map(|entry| entry.item)
        } else {
            None
        }
    }

    /// Keeps only the items for which `keep` returns true.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut keep: F) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| keep(&entry.item));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| &entry.item)
    }
}

/// Spreads out bursts of updates so that each stays visible for at least
/// `interval`.
///
/// An update that arrives while nothing is pending and the last release is
/// long enough ago is due immediately. Anything else is lined up behind the
/// last scheduled release, one `interval` apart, in arrival order.
#[derive(Clone, Debug)]
pub struct PacingQueue<T> {
    interval: Duration,
    next_allowed: Option<Instant>,
    queue: DelayQueue<T>,
}

impl<T> PacingQueue<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_allowed: None,
            queue: DelayQueue::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedules a batch. Returns the release time of every item.
    pub fn enqueue<I: IntoIterator<Item = T>>(&mut self, now: Instant, items: I) -> Vec<Instant> {
        let mut release_at = match self.next_allowed {
            Some(next_allowed) if next_allowed > now => next_allowed,
            _ => now,
        };
        let mut times = Vec::new();
        for item in items {
            self.queue.schedule(release_at, item);
            times.push(release_at);
            self.next_allowed = Some(release_at + self.interval);
            release_at += self.interval;
        }
        if let (Some(first), Some(last)) = (times.first(), times.last()) {
            debug!(
                num_items = times.len(),
                delay_ms = first.saturating_duration_since(now).as_millis() as u64,
                span_ms = last.saturating_duration_since(*first).as_millis() as u64,
                "Scheduled updates"
            );
        }
        times
    }

    pub fn pop_due(&mut self, now: Instant) -> Option<T> {
        self.queue.pop_due(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }

    /// Drops pending items for which `cancel` returns true. Returns how many
    /// were dropped.
    pub fn cancel_where<F: FnMut(&T) -> bool>(&mut self, mut cancel: F) -> usize {
        self.queue.retain(|item| !cancel(item))
    }

    pub fn pending(&self) -> impl Iterator<Item = &T> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
