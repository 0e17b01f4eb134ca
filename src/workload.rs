//! Workload model: processes, threads and their CPU/I-O bursts.
//!
//! A [`Workload`] is built once (by the parser or by [`WorkloadBuilder`])
//! and then owned by the engine for the whole run. Threads move through
//! [`ThreadState`] only via the engine; bursts only ever lose remaining time.

use std::fmt;

use crate::config::Policy;
use crate::types::{ProcessId, ThreadId, ThreadRef, Ticks};

/// Lifecycle state of a simulated thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadState {
    New,
    Ready,
    Running,
    Blocked,
    Terminated,
}

impl ThreadState {
    /// Whether the engine may move a thread from `self` to `next`.
    pub fn can_transition_to(self, next: ThreadState) -> bool {
        use ThreadState::*;
        matches!(
            (self, next),
            (New, Ready)
                | (Blocked, Ready)
                | (Running, Ready)
                | (Ready, Running)
                | (Running, Blocked)
                | (Running, Terminated)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ThreadState::New => "new",
            ThreadState::Ready => "ready",
            ThreadState::Running => "running",
            ThreadState::Blocked => "blocked",
            ThreadState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which half of a burst an action works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstPhase {
    Cpu,
    Io,
}

/// Result of consuming part of a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumed {
    /// Simulated time the action occupies.
    pub amount: Ticks,
    /// The consumed phase has no time left.
    pub drained: bool,
}

/// One CPU phase followed by one I/O phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Burst {
    cpu_time: Ticks,
    io_time: Ticks,
    remaining_cpu: Ticks,
    remaining_io: Ticks,
}

impl Burst {
    pub fn new(cpu_time: Ticks, io_time: Ticks) -> Self {
        Burst {
            cpu_time,
            io_time,
            remaining_cpu: cpu_time,
            remaining_io: io_time,
        }
    }

    /// A final burst: CPU only.
    pub fn last(cpu_time: Ticks) -> Self {
        Self::new(cpu_time, 0)
    }

    pub fn cpu_time(&self) -> Ticks {
        self.cpu_time
    }

    pub fn io_time(&self) -> Ticks {
        self.io_time
    }

    pub fn remaining_cpu(&self) -> Ticks {
        self.remaining_cpu
    }

    pub fn remaining_io(&self) -> Ticks {
        self.remaining_io
    }

    /// Time the next action on `phase` would take, without consuming it.
    pub fn peek(&self, phase: BurstPhase, policy: Policy) -> Ticks {
        match (phase, policy) {
            (BurstPhase::Cpu, Policy::Fcfs) => self.remaining_cpu,
            (BurstPhase::Cpu, Policy::RoundRobin { quantum }) => self.remaining_cpu.min(quantum),
            (BurstPhase::Io, _) => self.remaining_io,
        }
    }

    /// Consume the next action on `phase`.
    ///
    /// FCFS drains the whole CPU phase, Round-Robin at most one quantum.
    /// The I/O phase is always drained in one go.
    pub fn consume(&mut self, phase: BurstPhase, policy: Policy) -> Consumed {
        let amount = self.peek(phase, policy);
        match phase {
            BurstPhase::Cpu => {
                self.remaining_cpu -= amount;
                Consumed {
                    amount,
                    drained: self.remaining_cpu == 0,
                }
            }
            BurstPhase::Io => {
                self.remaining_io = 0;
                Consumed {
                    amount,
                    drained: true,
                }
            }
        }
    }

    fn without_io(mut self) -> Self {
        self.io_time = 0;
        self.remaining_io = 0;
        self
    }
}

/// A simulated thread.
#[derive(Debug, Clone)]
pub struct Thread {
    pub process_id: ProcessId,
    pub thread_id: ThreadId,
    pub arrival: Ticks,
    pub finish: Option<Ticks>,
    pub state: ThreadState,
    /// Index of the burst the thread is working on; equals `bursts().len()`
    /// once the last I/O phase has completed.
    pub current_burst: usize,
    bursts: Vec<Burst>,
}

impl Thread {
    fn new(
        process_id: ProcessId,
        thread_id: ThreadId,
        arrival: Ticks,
        bursts: Vec<Burst>,
    ) -> Self {
        Thread {
            process_id,
            thread_id,
            arrival,
            finish: None,
            state: ThreadState::New,
            current_burst: 0,
            bursts,
        }
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    pub(crate) fn burst_mut(&mut self, idx: usize) -> &mut Burst {
        &mut self.bursts[idx]
    }

    pub fn is_last_burst(&self, idx: usize) -> bool {
        idx + 1 == self.bursts.len()
    }

    /// Total CPU demand over all bursts.
    pub fn service_time(&self) -> Ticks {
        self.bursts.iter().map(Burst::cpu_time).sum()
    }

    /// Total I/O demand. The final burst never has I/O.
    pub fn io_time(&self) -> Ticks {
        let n = self.bursts.len().saturating_sub(1);
        self.bursts[..n].iter().map(Burst::io_time).sum()
    }

    /// `finish - arrival`, once the thread has terminated.
    pub fn turnaround(&self) -> Option<Ticks> {
        self.finish.map(|f| f.saturating_sub(self.arrival))
    }

    /// Move to `next`, returning the previous state.
    pub(crate) fn transition(&mut self, next: ThreadState) -> ThreadState {
        let prev = self.state;
        debug_assert!(
            prev.can_transition_to(next),
            "thread {} of process {}: illegal transition {prev} -> {next}",
            self.thread_id,
            self.process_id
        );
        self.state = next;
        prev
    }
}

/// A process and the threads it owns.
#[derive(Debug, Clone)]
pub struct Process {
    pub id: ProcessId,
    threads: Vec<Thread>,
}

impl Process {
    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    /// Latest finish minus earliest arrival over all threads.
    /// A process without threads has zero turnaround.
    pub fn turnaround(&self) -> Ticks {
        let start = self.threads.iter().map(|t| t.arrival).min();
        let end = self.threads.iter().filter_map(|t| t.finish).max();
        match (start, end) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => 0,
        }
    }
}

/// Context switch overheads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchCosts {
    /// Switching between two threads of the same process.
    pub same_process: Ticks,
    /// Switching to a thread of another process.
    pub cross_process: Ticks,
}

impl SwitchCosts {
    pub fn new(same_process: Ticks, cross_process: Ticks) -> Self {
        SwitchCosts {
            same_process,
            cross_process,
        }
    }

    pub fn cost(&self, same_process: bool) -> Ticks {
        if same_process {
            self.same_process
        } else {
            self.cross_process
        }
    }
}

/// The complete simulated system.
#[derive(Debug, Clone)]
pub struct Workload {
    pub switch_costs: SwitchCosts,
    processes: Vec<Process>,
}

impl Workload {
    pub fn builder() -> WorkloadBuilder {
        WorkloadBuilder {
            switch_costs: SwitchCosts::default(),
            processes: Vec::new(),
        }
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn thread(&self, r: ThreadRef) -> &Thread {
        &self.processes[r.process].threads[r.thread]
    }

    pub fn thread_mut(&mut self, r: ThreadRef) -> &mut Thread {
        &mut self.processes[r.process].threads[r.thread]
    }

    /// All threads in input order.
    pub fn threads(&self) -> impl Iterator<Item = (ThreadRef, &Thread)> {
        self.processes.iter().enumerate().flat_map(|(p, process)| {
            process
                .threads
                .iter()
                .enumerate()
                .map(move |(t, thread)| (ThreadRef::new(p, t), thread))
        })
    }

    pub fn thread_count(&self) -> usize {
        self.processes.iter().map(|p| p.threads.len()).sum()
    }

    /// Look a thread up by its process and thread numbers.
    pub fn find(&self, process: ProcessId, thread: ThreadId) -> Option<&Thread> {
        self.processes
            .iter()
            .find(|p| p.id == process)?
            .threads
            .iter()
            .find(|t| t.thread_id == thread)
    }
}

/// Errors from building or parsing a workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadError {
    /// A record does not have the expected shape.
    Malformed { line: usize, msg: String },
    /// Input ended before all declared records were read.
    UnexpectedEof { expected: &'static str },
    /// Non-blank input after the last declared process.
    TrailingInput { line: usize },
    /// A thread declares no bursts.
    NoBursts {
        process: ProcessId,
        thread: ThreadId,
    },
    DuplicateProcess(ProcessId),
    DuplicateThread {
        process: ProcessId,
        thread: ThreadId,
    },
    /// Arrivals, bursts and switch costs add up past the range of [`Ticks`].
    TimeOverflow,
}

impl fmt::Display for WorkloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadError::Malformed { line, msg } => write!(f, "line {line}: {msg}"),
            WorkloadError::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            WorkloadError::TrailingInput { line } => {
                write!(f, "line {line}: unexpected input after the last process")
            }
            WorkloadError::NoBursts { process, thread } => {
                write!(f, "thread {thread} of process {process} has no bursts")
            }
            WorkloadError::DuplicateProcess(pid) => write!(f, "duplicate process number {pid}"),
            WorkloadError::DuplicateThread { process, thread } => {
                write!(f, "duplicate thread number {thread} in process {process}")
            }
            WorkloadError::TimeOverflow => {
                write!(f, "total simulated time would overflow {} units", Ticks::MAX)
            }
        }
    }
}

impl std::error::Error for WorkloadError {}

struct ProcessDef {
    id: ProcessId,
    threads: Vec<Thread>,
}

/// Builder for constructing workloads.
pub struct WorkloadBuilder {
    switch_costs: SwitchCosts,
    processes: Vec<ProcessDef>,
}

impl WorkloadBuilder {
    /// Set the same-process and cross-process context switch costs.
    pub fn switch_costs(mut self, same_process: Ticks, cross_process: Ticks) -> Self {
        self.switch_costs = SwitchCosts::new(same_process, cross_process);
        self
    }

    /// Declare a process. Threads added later with the same id attach to it.
    pub fn process(mut self, id: ProcessId) -> Self {
        self.processes.push(ProcessDef {
            id,
            threads: Vec::new(),
        });
        self
    }

    /// Add a thread, declaring its process first if needed.
    ///
    /// The last burst's I/O time is dropped: no I/O follows the final
    /// compute phase.
    pub fn thread(
        mut self,
        process: ProcessId,
        thread: ThreadId,
        arrival: Ticks,
        mut bursts: Vec<Burst>,
    ) -> Self {
        if let Some(last) = bursts.pop() {
            bursts.push(last.without_io());
        }
        let t = Thread::new(process, thread, arrival, bursts);
        match self.processes.iter_mut().rev().find(|p| p.id == process) {
            Some(def) => def.threads.push(t),
            None => self.processes.push(ProcessDef {
                id: process,
                threads: vec![t],
            }),
        }
        self
    }

    pub fn build(self) -> Result<Workload, WorkloadError> {
        let mut processes: Vec<Process> = Vec::with_capacity(self.processes.len());
        for def in self.processes {
            if processes.iter().any(|p| p.id == def.id) {
                return Err(WorkloadError::DuplicateProcess(def.id));
            }
            for (i, t) in def.threads.iter().enumerate() {
                if t.bursts.is_empty() {
                    return Err(WorkloadError::NoBursts {
                        process: def.id,
                        thread: t.thread_id,
                    });
                }
                if def.threads[..i].iter().any(|o| o.thread_id == t.thread_id) {
                    return Err(WorkloadError::DuplicateThread {
                        process: def.id,
                        thread: t.thread_id,
                    });
                }
            }
            processes.push(Process {
                id: def.id,
                threads: def.threads,
            });
        }
        if time_horizon(&processes, self.switch_costs).is_none() {
            return Err(WorkloadError::TimeOverflow);
        }
        Ok(Workload {
            switch_costs: self.switch_costs,
            processes,
        })
    }
}

/// Upper bound on any simulated time a run of `processes` can reach, or
/// `None` if it does not fit in [`Ticks`].
///
/// The clock never passes the latest arrival plus all CPU and I/O time plus
/// one switch per START. Every START consumes at least one CPU unit, or
/// drains an empty CPU phase.
fn time_horizon(processes: &[Process], costs: SwitchCosts) -> Option<Ticks> {
    let threads = || processes.iter().flat_map(|p| p.threads.iter());

    let mut horizon = threads().map(|t| t.arrival).max().unwrap_or(0);
    let mut starts: Ticks = 0;
    for b in threads().flat_map(|t| t.bursts.iter()) {
        horizon = horizon.checked_add(b.cpu_time)?.checked_add(b.io_time)?;
        starts = starts.checked_add(b.cpu_time.max(1))?;
    }

    // A lone thread never switches.
    if threads().nth(1).is_some() {
        let cost = costs.same_process.max(costs.cross_process);
        horizon = horizon.checked_add(starts.checked_mul(cost)?)?;
    }
    Some(horizon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fcfs_consumes_whole_cpu_phase() {
        let mut b = Burst::new(7, 3);
        let c = b.consume(BurstPhase::Cpu, Policy::Fcfs);
        assert_eq!(c, Consumed { amount: 7, drained: true });
        assert_eq!(b.remaining_cpu(), 0);
        assert_eq!(b.remaining_io(), 3);
    }

    #[test]
    fn test_round_robin_consumes_one_quantum() {
        let rr = Policy::RoundRobin { quantum: 4 };
        let mut b = Burst::new(10, 0);
        assert_eq!(b.consume(BurstPhase::Cpu, rr), Consumed { amount: 4, drained: false });
        assert_eq!(b.consume(BurstPhase::Cpu, rr), Consumed { amount: 4, drained: false });
        assert_eq!(b.consume(BurstPhase::Cpu, rr), Consumed { amount: 2, drained: true });
        assert_eq!(b.remaining_cpu(), 0);
    }

    #[test]
    fn test_io_phase_always_drains() {
        let mut b = Burst::new(2, 9);
        b.consume(BurstPhase::Cpu, Policy::Fcfs);
        let rr = Policy::RoundRobin { quantum: 1 };
        assert_eq!(b.consume(BurstPhase::Io, rr), Consumed { amount: 9, drained: true });
        assert_eq!(b.remaining_io(), 0);
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let b = Burst::new(6, 1);
        assert_eq!(b.peek(BurstPhase::Cpu, Policy::RoundRobin { quantum: 4 }), 4);
        assert_eq!(b.peek(BurstPhase::Cpu, Policy::Fcfs), 6);
        assert_eq!(b.peek(BurstPhase::Io, Policy::Fcfs), 1);
        assert_eq!(b.remaining_cpu(), 6);
    }

    #[test]
    fn test_builder_drops_final_io() {
        let w = Workload::builder()
            .thread(ProcessId(1), ThreadId(1), 0, vec![Burst::new(3, 4), Burst::new(5, 6)])
            .build()
            .unwrap();
        let t = w.find(ProcessId(1), ThreadId(1)).unwrap();
        assert_eq!(t.bursts()[1].io_time(), 0);
        assert_eq!(t.service_time(), 8);
        assert_eq!(t.io_time(), 4);
    }

    #[test]
    fn test_builder_groups_threads_by_process() {
        let w = Workload::builder()
            .switch_costs(1, 5)
            .thread(ProcessId(2), ThreadId(1), 0, vec![Burst::last(1)])
            .thread(ProcessId(1), ThreadId(1), 0, vec![Burst::last(1)])
            .thread(ProcessId(2), ThreadId(2), 3, vec![Burst::last(1)])
            .build()
            .unwrap();
        assert_eq!(w.processes().len(), 2);
        assert_eq!(w.processes()[0].id, ProcessId(2));
        assert_eq!(w.processes()[0].threads().len(), 2);
        assert_eq!(w.thread_count(), 3);
        assert_eq!(w.switch_costs, SwitchCosts::new(1, 5));
    }

    #[test]
    fn test_builder_rejects_duplicates_and_empty_threads() {
        let err = Workload::builder()
            .process(ProcessId(1))
            .process(ProcessId(1))
            .build()
            .unwrap_err();
        assert_eq!(err, WorkloadError::DuplicateProcess(ProcessId(1)));

        let err = Workload::builder()
            .thread(ProcessId(1), ThreadId(4), 0, vec![Burst::last(1)])
            .thread(ProcessId(1), ThreadId(4), 0, vec![Burst::last(1)])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            WorkloadError::DuplicateThread {
                process: ProcessId(1),
                thread: ThreadId(4)
            }
        );

        let err = Workload::builder()
            .thread(ProcessId(1), ThreadId(1), 0, vec![])
            .build()
            .unwrap_err();
        assert!(matches!(err, WorkloadError::NoBursts { .. }));
    }

    #[test]
    fn test_builder_rejects_time_overflow() {
        let err = Workload::builder()
            .thread(ProcessId(1), ThreadId(1), Ticks::MAX, vec![Burst::last(5)])
            .build()
            .unwrap_err();
        assert_eq!(err, WorkloadError::TimeOverflow);

        let err = Workload::builder()
            .thread(
                ProcessId(1),
                ThreadId(1),
                0,
                vec![Burst::new(Ticks::MAX, 1), Burst::last(1)],
            )
            .build()
            .unwrap_err();
        assert_eq!(err, WorkloadError::TimeOverflow);

        let err = Workload::builder()
            .switch_costs(0, Ticks::MAX / 2)
            .thread(ProcessId(1), ThreadId(1), 0, vec![Burst::last(2)])
            .thread(ProcessId(2), ThreadId(1), 0, vec![Burst::last(2)])
            .build()
            .unwrap_err();
        assert_eq!(err, WorkloadError::TimeOverflow);
    }

    #[test]
    fn test_builder_accepts_large_times_that_fit() {
        // One thread: switch costs never apply.
        let w = Workload::builder()
            .switch_costs(Ticks::MAX, Ticks::MAX)
            .thread(
                ProcessId(1),
                ThreadId(1),
                Ticks::MAX - 10,
                vec![Burst::new(4, 3), Burst::last(3)],
            )
            .build()
            .unwrap();
        assert_eq!(w.thread_count(), 1);

        assert_eq!(
            time_horizon(w.processes(), SwitchCosts::new(0, 0)),
            Some(Ticks::MAX)
        );
    }

    #[test]
    fn test_remaining_time_never_grows() {
        for policy in [Policy::Fcfs, Policy::RoundRobin { quantum: 3 }] {
            let mut b = Burst::new(11, 5);
            let (mut cpu, mut io) = (b.remaining_cpu(), b.remaining_io());
            loop {
                let c = b.consume(BurstPhase::Cpu, policy);
                assert!(b.remaining_cpu() <= cpu, "{policy}");
                assert_eq!(b.remaining_io(), io, "{policy}");
                assert_eq!(cpu - b.remaining_cpu(), c.amount);
                cpu = b.remaining_cpu();
                if c.drained {
                    break;
                }
            }
            assert_eq!(cpu, 0);

            b.consume(BurstPhase::Io, policy);
            assert!(b.remaining_io() <= io);
            io = b.remaining_io();
            assert_eq!(io, 0);

            // A drained burst stays drained.
            assert_eq!(b.consume(BurstPhase::Cpu, policy).amount, 0);
            assert_eq!(b.consume(BurstPhase::Io, policy).amount, 0);
            assert_eq!((b.remaining_cpu(), b.remaining_io()), (0, 0));
        }
    }

    #[test]
    fn test_state_transitions() {
        use ThreadState::*;
        assert!(New.can_transition_to(Ready));
        assert!(Running.can_transition_to(Ready));
        assert!(Running.can_transition_to(Terminated));
        assert!(!New.can_transition_to(Running));
        assert!(!Terminated.can_transition_to(Ready));
        assert!(!Blocked.can_transition_to(Running));
    }

    #[test]
    fn test_process_turnaround() {
        let mut w = Workload::builder()
            .thread(ProcessId(1), ThreadId(1), 2, vec![Burst::last(1)])
            .thread(ProcessId(1), ThreadId(2), 5, vec![Burst::last(1)])
            .process(ProcessId(2))
            .build()
            .unwrap();
        w.thread_mut(ThreadRef::new(0, 0)).finish = Some(10);
        w.thread_mut(ThreadRef::new(0, 1)).finish = Some(14);
        assert_eq!(w.processes()[0].turnaround(), 12);
        assert_eq!(w.processes()[1].turnaround(), 0);
    }
}
