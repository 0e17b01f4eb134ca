//! Simulation configuration.
//!
//! The engine receives one immutable [`SimConfig`] for the whole run. The
//! CLI builds it from flags; tests build it directly.

use std::fmt;

use serde::Serialize;

use crate::types::Ticks;

/// CPU scheduling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    /// First-Come-First-Served: a CPU burst always runs to completion.
    Fcfs,
    /// Round-Robin: a thread runs at most `quantum` units before it is
    /// sent back to the ready queue.
    RoundRobin { quantum: Ticks },
}

impl Policy {
    /// Map a quantum to a policy. Zero selects FCFS.
    pub fn from_quantum(quantum: Ticks) -> Self {
        if quantum == 0 {
            Policy::Fcfs
        } else {
            Policy::RoundRobin { quantum }
        }
    }

    /// The quantum, or 0 for FCFS.
    pub fn quantum(self) -> Ticks {
        match self {
            Policy::Fcfs => 0,
            Policy::RoundRobin { quantum } => quantum,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Fcfs => write!(f, "FCFS Scheduling"),
            Policy::RoundRobin { quantum } => {
                write!(f, "Round Robin Scheduling (quantum = {quantum} time units)")
            }
        }
    }
}

/// Immutable settings for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    pub policy: Policy,
    /// Record every thread state transition in the trace.
    pub verbose: bool,
    /// Include the per-thread block in the text report.
    pub detailed: bool,
}

impl SimConfig {
    pub fn new(quantum: Ticks) -> Self {
        SimConfig {
            policy: Policy::from_quantum(quantum),
            verbose: false,
            detailed: false,
        }
    }

    pub fn fcfs() -> Self {
        Self::new(0)
    }

    /// Round-Robin with the given quantum.
    ///
    /// # Panics
    ///
    /// Panics if `quantum` is 0. Use [`SimConfig::new`] to map 0 to FCFS.
    pub fn round_robin(quantum: Ticks) -> Self {
        assert!(quantum > 0, "round-robin requires a positive quantum");
        Self::new(quantum)
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::fcfs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_quantum() {
        assert_eq!(Policy::from_quantum(0), Policy::Fcfs);
        assert_eq!(
            Policy::from_quantum(3),
            Policy::RoundRobin { quantum: 3 }
        );
        assert_eq!(Policy::from_quantum(7).quantum(), 7);
        assert_eq!(Policy::Fcfs.quantum(), 0);
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(Policy::Fcfs.to_string(), "FCFS Scheduling");
        assert_eq!(
            Policy::RoundRobin { quantum: 10 }.to_string(),
            "Round Robin Scheduling (quantum = 10 time units)"
        );
    }

    #[test]
    #[should_panic(expected = "positive quantum")]
    fn test_round_robin_rejects_zero() {
        let _ = SimConfig::round_robin(0);
    }
}
