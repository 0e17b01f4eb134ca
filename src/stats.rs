//! Statistics over a finished run.
//!
//! A read-only pass over the final workload state and the engine's
//! counters. Nothing here feeds back into the simulation.

use serde::Serialize;

use crate::config::Policy;
use crate::engine::Outcome;
use crate::types::{ProcessId, ThreadId, Ticks};
use crate::workload::{Thread, Workload};

/// Per-thread figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadStats {
    pub process: ProcessId,
    pub thread: ThreadId,
    pub arrival: Ticks,
    /// Sum of the CPU time of all bursts.
    pub service: Ticks,
    /// Sum of the I/O time of all bursts but the last.
    pub io: Ticks,
    pub turnaround: Ticks,
    pub finish: Ticks,
}

impl ThreadStats {
    fn from_thread(t: &Thread) -> Self {
        ThreadStats {
            process: t.process_id,
            thread: t.thread_id,
            arrival: t.arrival,
            service: t.service_time(),
            io: t.io_time(),
            turnaround: t.turnaround().unwrap_or(0),
            finish: t.finish.unwrap_or(0),
        }
    }
}

/// Per-process figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessStats {
    pub process: ProcessId,
    /// Latest thread finish minus earliest thread arrival.
    pub turnaround: Ticks,
}

/// Summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub policy: Policy,
    pub total_time: Ticks,
    pub cpu_busy: Ticks,
    /// Mean of the process turnaround times.
    pub average_turnaround: f64,
    /// Percentage of `total_time` spent running CPU bursts.
    pub cpu_utilization: f64,
    pub context_switches: u64,
    pub switch_overhead: Ticks,
    pub processes: Vec<ProcessStats>,
    pub threads: Vec<ThreadStats>,
}

impl Report {
    pub fn from_outcome(outcome: &Outcome) -> Self {
        let workload = &outcome.workload;
        Report {
            policy: outcome.policy,
            total_time: outcome.total_time,
            cpu_busy: outcome.cpu_busy,
            average_turnaround: average_turnaround(workload),
            cpu_utilization: cpu_utilization(outcome.cpu_busy, outcome.total_time),
            context_switches: outcome.context_switches,
            switch_overhead: outcome.switch_overhead,
            processes: workload
                .processes()
                .iter()
                .map(|p| ProcessStats {
                    process: p.id,
                    turnaround: p.turnaround(),
                })
                .collect(),
            threads: workload
                .threads()
                .map(|(_, t)| ThreadStats::from_thread(t))
                .collect(),
        }
    }

    pub fn thread(&self, process: ProcessId, thread: ThreadId) -> Option<&ThreadStats> {
        self.threads
            .iter()
            .find(|t| t.process == process && t.thread == thread)
    }

    /// Total service time over all threads.
    pub fn total_service(&self) -> Ticks {
        self.threads.iter().map(|t| t.service).sum()
    }
}

/// Mean process turnaround, 0 for a workload without processes.
pub fn average_turnaround(workload: &Workload) -> f64 {
    let processes = workload.processes();
    if processes.is_empty() {
        return 0.0;
    }
    let sum: f64 = processes.iter().map(|p| p.turnaround() as f64).sum();
    sum / processes.len() as f64
}

/// `busy / total` as a percentage, 0 when no time elapsed.
pub fn cpu_utilization(busy: Ticks, total: Ticks) -> f64 {
    if total == 0 {
        0.0
    } else {
        busy as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::engine::Simulator;
    use crate::workload::Burst;

    #[test]
    fn test_cpu_utilization() {
        assert_eq!(cpu_utilization(0, 0), 0.0);
        assert_eq!(cpu_utilization(5, 5), 100.0);
        assert_eq!(cpu_utilization(1, 4), 25.0);
    }

    #[test]
    fn test_report_two_processes() {
        let w = Workload::builder()
            .thread(ProcessId(1), ThreadId(1), 0, vec![Burst::new(2, 3), Burst::last(1)])
            .thread(ProcessId(2), ThreadId(1), 1, vec![Burst::last(4)])
            .build()
            .unwrap();
        let report = Report::from_outcome(&Simulator::new(SimConfig::fcfs()).run(w));

        // P1T1 runs 0..2, blocks until 5. P2T1 runs 2..6. P1T1 runs 6..7.
        assert_eq!(report.total_time, 7);
        assert_eq!(report.cpu_busy, 7);
        assert_eq!(report.cpu_utilization, 100.0);

        let t = report.thread(ProcessId(1), ThreadId(1)).unwrap();
        assert_eq!((t.service, t.io, t.finish, t.turnaround), (3, 3, 7, 7));
        let t = report.thread(ProcessId(2), ThreadId(1)).unwrap();
        assert_eq!((t.service, t.io, t.finish, t.turnaround), (4, 0, 6, 5));

        assert_eq!(report.processes[0].turnaround, 7);
        assert_eq!(report.processes[1].turnaround, 5);
        assert_eq!(report.average_turnaround, 6.0);
        assert_eq!(report.total_service(), 7);
    }

    #[test]
    fn test_average_of_empty_workload() {
        let w = Workload::builder().build().unwrap();
        assert_eq!(average_turnaround(&w), 0.0);
    }
}
