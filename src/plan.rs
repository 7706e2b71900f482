//! A priority queue that stores arbitrary data sorted by time
//!
//! Defines a `Queue<T>` that stores items of type `T`, called plans, ordered by
//! `f64` time and then by `ExecutionPhase`. Adding a plan is *O*(log(*n*)) while
//! cancellation and retrieval are *O*(1).
//!
//! `Context` uses this queue to hold future events: the driver schedules one
//! tick per unit of time, and reports run in the `Last` phase so that they
//! observe the population after the tick that shares their time.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::trace;

use crate::hashing::HashMap;

/// Breaks ties between plans scheduled for the same time. Plans in an earlier
/// phase run first; within a phase, plans run in the order they were added.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExecutionPhase {
    First,
    Normal,
    Last,
}

/// A priority queue that stores arbitrary data sorted by time and phase
///
/// When plans are created they are sequentially assigned a `PlanId` that
/// wraps a `u64`. The time, plan id, and phase are stored in a binary heap of
/// `Entry` objects. The payload is stored in a hash map by plan id, and
/// cancellation removes the payload, leaving a stale heap entry that is skipped
/// when popped.
pub struct Queue<T> {
    queue: BinaryHeap<Entry>,
    data_map: HashMap<u64, T>,
    plan_counter: u64,
}

impl<T> Queue<T> {
    #[must_use]
    pub fn new() -> Queue<T> {
        Queue {
            queue: BinaryHeap::new(),
            data_map: HashMap::default(),
            plan_counter: 0,
        }
    }

    /// Add a plan to the queue at the specified time
    ///
    /// Returns a `PlanId` for the newly-added plan that can be used to cancel it.
    pub fn add_plan(&mut self, time: f64, data: T, phase: ExecutionPhase) -> PlanId {
        trace!("adding plan at {time}");
        let id = self.plan_counter;
        self.queue.push(Entry { time, phase, id });
        self.data_map.insert(id, data);
        self.plan_counter += 1;
        PlanId(id)
    }

    /// Cancel a plan that has been added to the queue
    ///
    /// # Panics
    ///
    /// This function panics if you cancel a plan which has already
    /// been cancelled or executed.
    pub fn cancel_plan(&mut self, id: &PlanId) {
        trace!("cancelling plan {id:?}");
        self.data_map.remove(&id.0).expect("Plan does not exist");
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data_map.is_empty()
    }

    /// Remove every pending plan.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.data_map.clear();
    }

    /// Retrieve the earliest plan in the queue
    ///
    /// Returns the next plan if it exists or else `None` if the queue is empty
    pub fn get_next_plan(&mut self) -> Option<Plan<T>> {
        while let Some(entry) = self.queue.pop() {
            // Cancelled plans have no data
            if let Some(data) = self.data_map.remove(&entry.id) {
                return Some(Plan {
                    time: entry.time,
                    data,
                });
            }
        }
        None
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(PartialEq, Debug)]
struct Entry {
    time: f64,
    phase: ExecutionPhase,
    id: u64,
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reversed so that the max-heap pops the earliest time, then the earliest
/// phase, then the lowest id.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.phase.cmp(&other.phase))
            .then(self.id.cmp(&other.id))
            .reverse()
    }
}

/// A unique identifier for a plan added to a `Queue<T>`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlanId(u64);

/// A plan that holds data of type `T` intended to be used at the specified time
pub struct Plan<T> {
    pub time: f64,
    pub data: T,
}
