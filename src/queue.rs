//! Event priority queue.
//!
//! An array-backed binary min-heap keyed by `(time, kind rank)`. Events
//! with the same key pop in insertion order, which makes every run of the
//! same workload produce the same event sequence.
//!
//! Unlike `std::collections::BinaryHeap`, the queue supports shifting the
//! time of a subset of pending events (see [`EventQueue::shift_pending_keys`]),
//! which the engine needs when a context switch delay is inserted after the
//! follow-up events were already scheduled.

use std::cmp::Ordering;
use std::fmt;

use crate::types::{ThreadRef, Ticks};
use crate::workload::BurstPhase;

/// What happens to a thread when an event fires.
///
/// Declaration order is the tie-break rank: when two events share a
/// timestamp, the one declared first is processed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// The thread's CPU phase is over and it starts waiting on I/O.
    Blocked,
    /// The thread's I/O finished; it becomes runnable again.
    Unblocked,
    /// The thread enters the system.
    Arrival,
    /// A Round-Robin quantum expired with CPU time left in the burst.
    Continue,
    /// The thread finished its last burst.
    End,
    /// The thread gets the CPU.
    Start,
}

impl EventKind {
    /// Kinds that move a thread to the ready queue. Their time is the
    /// moment the thread becomes runnable, which a context switch on the
    /// CPU does not change.
    pub const READY_KINDS: [EventKind; 3] =
        [EventKind::Arrival, EventKind::Unblocked, EventKind::Continue];

    pub fn rank(self) -> u8 {
        self as u8
    }

    /// The burst phase an event of this kind works on. BLOCKED consumes
    /// the I/O phase; START consumes, and the ready kinds look ahead at,
    /// the CPU phase.
    pub fn phase(self) -> BurstPhase {
        match self {
            EventKind::Blocked => BurstPhase::Io,
            _ => BurstPhase::Cpu,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Blocked => "blocked",
            EventKind::Unblocked => "unblocked",
            EventKind::Arrival => "arrival",
            EventKind::Continue => "continue",
            EventKind::End => "end",
            EventKind::Start => "start",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pending simulation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub time: Ticks,
    pub kind: EventKind,
    pub thread: ThreadRef,
    /// Burst the event acts on.
    pub burst: usize,
}

impl Event {
    pub fn new(time: Ticks, kind: EventKind, thread: ThreadRef, burst: usize) -> Self {
        Event {
            time,
            kind,
            thread,
            burst,
        }
    }

    /// Heap ordering key.
    pub fn key(&self) -> (Ticks, u8) {
        (self.time, self.kind.rank())
    }
}

/// Returned by [`EventQueue::extract_min`] on an empty queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyQueueError;

impl fmt::Display for EmptyQueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "extract_min on an empty event queue")
    }
}

impl std::error::Error for EmptyQueueError {}

#[derive(Debug, Clone)]
struct Node {
    event: Event,
    /// Insertion order, the last tie-break.
    seq: u64,
}

impl Node {
    fn cmp(&self, other: &Node) -> Ordering {
        self.event
            .key()
            .cmp(&other.event.key())
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Binary min-heap of simulation events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    heap: Vec<Node>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn insert(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Node { event, seq });
        self.sift_up(self.heap.len() - 1);
    }

    /// Remove and return the event with the smallest key.
    pub fn extract_min(&mut self) -> Result<Event, EmptyQueueError> {
        if self.heap.is_empty() {
            return Err(EmptyQueueError);
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let node = self.heap.pop().ok_or(EmptyQueueError)?;
        self.sift_down(0);
        Ok(node.event)
    }

    /// Time of the next event, without removing it.
    pub fn peek_min_time(&self) -> Option<Ticks> {
        self.heap.first().map(|n| n.event.time)
    }

    /// Add `delta` to every pending event whose kind is not in `exclude`.
    ///
    /// A partial shift can violate heap order, so the heap is rebuilt
    /// afterwards.
    pub fn shift_pending_keys(&mut self, delta: Ticks, exclude: &[EventKind]) {
        if delta == 0 {
            return;
        }
        let mut shifted = false;
        for node in &mut self.heap {
            if !exclude.contains(&node.event.kind) {
                node.event.time += delta;
                shifted = true;
            }
        }
        if shifted {
            self.heapify();
        }
    }

    fn heapify(&mut self) {
        for i in (0..self.heap.len() / 2).rev() {
            self.sift_down(i);
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.heap[i].cmp(&self.heap[parent]) != Ordering::Less {
                break;
            }
            self.heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            let mut min = i;
            if left < len && self.heap[left].cmp(&self.heap[min]) == Ordering::Less {
                min = left;
            }
            if right < len && self.heap[right].cmp(&self.heap[min]) == Ordering::Less {
                min = right;
            }
            if min == i {
                break;
            }
            self.heap.swap(i, min);
            i = min;
        }
    }

    /// Check the heap property over the whole array.
    #[cfg(test)]
    fn is_heap(&self) -> bool {
        (1..self.heap.len()).all(|i| self.heap[(i - 1) / 2].cmp(&self.heap[i]) != Ordering::Greater)
    }
}
