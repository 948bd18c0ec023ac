//! A discrete-event scheduler: a clock plus a time-ordered queue of pending activities.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Simulation time in hours
pub type Timestamp = f64;

/// An activity waiting in the queue
struct Scheduled<A> {
    at: Timestamp,
    seq: u64,
    activity: A,
}

impl<A> PartialEq for Scheduled<A> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<A> Eq for Scheduled<A> {}

impl<A> PartialOrd for Scheduled<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Scheduled<A> {
    // Reversed so that the earliest (then first-scheduled) activity is at the top of the heap
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .total_cmp(&other.at)
            .then(self.seq.cmp(&other.seq))
            .reverse()
    }
}

/// The simulation clock and event queue.
///
/// Activities scheduled for the same time are popped in the order in which they were scheduled.
pub struct Scheduler<A> {
    now: Timestamp,
    next_seq: u64,
    queue: BinaryHeap<Scheduled<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            now: 0.0,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }
}

impl<A> Scheduler<A> {
    /// Current simulation time
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Number of activities waiting
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Schedule an activity to happen now, after anything else already scheduled for now
    pub fn schedule_now(&mut self, activity: A) {
        self.schedule_in(0.0, activity);
    }

    /// Schedule an activity to happen after `delay` hours
    pub fn schedule_in(&mut self, delay: Timestamp, activity: A) {
        debug_assert!(delay >= 0.0, "Cannot schedule in the past");
        self.queue.push(Scheduled {
            at: self.now + delay,
            seq: self.next_seq,
            activity,
        });
        self.next_seq += 1;
    }

    /// Advance the clock to the next activity strictly before `until` and return it.
    ///
    /// If there is none, the clock is moved to `until` (if it is not already past it) and `None`
    /// is returned. Activities at or after `until` stay in the queue.
    pub fn pop_before(&mut self, until: Timestamp) -> Option<A> {
        match self.queue.peek() {
            Some(next) if next.at < until => {
                let next = self.queue.pop()?;
                self.now = next.at;
                Some(next.activity)
            }
            _ => {
                self.now = self.now.max(until);
                None
            }
        }
    }
}
