//! Trace recording for the simulator.
//!
//! When verbose mode is on, every thread state transition, context switch
//! and idle gap is recorded with its simulated time. The trace is program
//! output (the `-v` listing), separate from diagnostic logging.

use std::io::{self, Write};

use crate::types::{ProcessId, ThreadId, Ticks};
use crate::workload::ThreadState;

/// Identifies a thread in trace output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    pub process: ProcessId,
    pub thread: ThreadId,
}

/// A single trace event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub time: Ticks,
    pub kind: TraceKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceKind {
    /// A thread changed state.
    Transition {
        thread: ThreadKey,
        from: ThreadState,
        to: ThreadState,
    },
    /// The CPU switched to `to`, charging `cost` time units.
    ContextSwitch {
        from: ThreadKey,
        to: ThreadKey,
        cost: Ticks,
    },
    /// Nothing was runnable from `time` until `until`.
    CpuIdle { until: Ticks },
}

/// A complete simulation trace in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    events: Vec<TraceEvent>,
}

impl Trace {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, time: Ticks, kind: TraceKind) {
        self.events.push(TraceEvent { time, kind });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// State transitions of one thread, as `(time, from, to)`.
    pub fn transitions_for(&self, key: ThreadKey) -> Vec<(Ticks, ThreadState, ThreadState)> {
        self.events
            .iter()
            .filter_map(|e| match e.kind {
                TraceKind::Transition { thread, from, to } if thread == key => {
                    Some((e.time, from, to))
                }
                _ => None,
            })
            .collect()
    }

    /// Number of times a thread was sent back to the ready queue after its
    /// quantum expired.
    pub fn continue_count(&self, key: ThreadKey) -> usize {
        self.transitions_for(key)
            .iter()
            .filter(|(_, from, to)| *from == ThreadState::Running && *to == ThreadState::Ready)
            .count()
    }

    pub fn context_switch_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, TraceKind::ContextSwitch { .. }))
            .count()
    }

    pub fn idle_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, TraceKind::CpuIdle { .. }))
            .count()
    }

    /// Write one line per state transition, in the order they happened.
    pub fn write_transitions<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for event in &self.events {
            if let TraceKind::Transition { thread, from, to } = event.kind {
                writeln!(
                    out,
                    "At time {}: Thread {} of Process {} moves from {} to {}.",
                    event.time, thread.thread, thread.process, from, to
                )?;
            }
        }
        Ok(())
    }

    /// Pretty-print the full trace to stderr for debugging.
    pub fn dump(&self) {
        for event in &self.events {
            let desc = match &event.kind {
                TraceKind::Transition { thread, from, to } => format!(
                    "STATE    p={} t={} {from} -> {to}",
                    thread.process, thread.thread
                ),
                TraceKind::ContextSwitch { from, to, cost } => format!(
                    "SWITCH   p={} t={} -> p={} t={} cost={cost}",
                    from.process, from.thread, to.process, to.thread
                ),
                TraceKind::CpuIdle { until } => format!("IDLE     until={until}"),
            };
            eprintln!("[{:>8}] {}", event.time, desc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(p: u32, t: u32) -> ThreadKey {
        ThreadKey {
            process: ProcessId(p),
            thread: ThreadId(t),
        }
    }

    #[test]
    fn test_write_transitions() {
        let mut trace = Trace::new();
        trace.record(
            0,
            TraceKind::Transition {
                thread: key(1, 2),
                from: ThreadState::New,
                to: ThreadState::Ready,
            },
        );
        trace.record(0, TraceKind::CpuIdle { until: 3 });
        trace.record(
            3,
            TraceKind::Transition {
                thread: key(1, 2),
                from: ThreadState::Ready,
                to: ThreadState::Running,
            },
        );

        let mut out = Vec::new();
        trace.write_transitions(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "At time 0: Thread 2 of Process 1 moves from new to ready.\n\
             At time 3: Thread 2 of Process 1 moves from ready to running.\n"
        );
        assert_eq!(trace.idle_count(), 1);
        assert_eq!(trace.transitions_for(key(1, 2)).len(), 2);
        assert!(trace.transitions_for(key(2, 2)).is_empty());
    }
}
