//! Newtype wrappers and type aliases for domain concepts.
//!
//! Process and thread numbers come straight from the workload description
//! and are wrapped so they cannot be confused with each other or with
//! simulated time. Time is a plain alias: it is summed, compared and
//! subtracted everywhere and a newtype would only add noise.

use std::fmt;

use serde::Serialize;

/// Simulated time in abstract time units.
pub type Ticks = u64;

/// Process number as given in the workload description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

/// Thread number, unique within its process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ThreadId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-owning handle to a thread inside a [`Workload`](crate::Workload).
///
/// Indexes are positions in the workload's process list and that process's
/// thread list, so they stay valid for as long as the workload does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadRef {
    pub process: usize,
    pub thread: usize,
}

impl ThreadRef {
    pub fn new(process: usize, thread: usize) -> Self {
        ThreadRef { process, thread }
    }
}
