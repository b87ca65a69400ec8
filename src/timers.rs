use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

struct Timer<E> {
    due_ms: u64,
    seq: u64,
    event: E,
}

// Ordered by due time, then by scheduling order
impl<E> Ord for Timer<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

impl<E> PartialOrd for Timer<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> PartialEq for Timer<E> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E> Eq for Timer<E> {}

/// One-shot timers consumed by the frame loop, so deferred work runs between
/// ticks instead of interleaving with them.
pub struct TimerQueue<E> {
    heap: BinaryHeap<Reverse<Timer<E>>>,
    next_seq: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, now_ms: u64, delay_ms: u64, event: E) {
        let timer = Timer {
            due_ms: now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
            event,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(timer));
    }

    /// Removes and returns the earliest timer that is due at `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<E> {
        if self.heap.peek()?.0.due_ms > now_ms {
            return None;
        }
        self.heap.pop().map(|Reverse(timer)| timer.event)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
