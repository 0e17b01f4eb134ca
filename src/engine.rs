//! Event-driven simulation engine.
//!
//! This is the core of the simulator. It owns the event queue, the
//! simulated clock and the workload, and drives every thread through its
//! lifecycle one event at a time:
//!
//! - ARRIVAL / UNBLOCKED / CONTINUE make a thread ready and reserve the
//!   next CPU slot for it with a START event.
//! - START runs the thread for one FCFS burst or one Round-Robin quantum,
//!   charging a context switch first if the CPU was running someone else.
//! - BLOCKED runs the burst's I/O phase off-CPU.
//! - END retires the thread.
//!
//! The clock is the end of the last reserved CPU slot. When the next event
//! lies beyond it, the CPU was idle and the next START pays no switch cost.

use tracing::{debug, info};

use crate::config::{Policy, SimConfig};
use crate::fmt::set_sim_clock;
use crate::queue::{Event, EventKind, EventQueue};
use crate::trace::{ThreadKey, Trace, TraceKind};
use crate::types::{ThreadRef, Ticks};
use crate::workload::{Consumed, ThreadState, Workload};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The workload in its final state: every thread terminated, every
    /// burst drained.
    pub workload: Workload,
    pub policy: Policy,
    /// Total elapsed simulated time.
    pub total_time: Ticks,
    /// Time the CPU spent executing CPU bursts.
    pub cpu_busy: Ticks,
    pub context_switches: u64,
    /// Time spent on context switches.
    pub switch_overhead: Ticks,
    /// Empty unless the run was verbose.
    pub trace: Trace,
}

/// The main simulator.
pub struct Simulator {
    config: SimConfig,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        Simulator { config }
    }

    /// Run a workload to completion.
    pub fn run(&self, workload: Workload) -> Outcome {
        let mut run = Run::new(workload, &self.config);
        run.seed_arrivals();

        info!(
            threads = run.workload.thread_count(),
            policy = %self.config.policy,
            "simulation start"
        );

        while let Ok(event) = run.queue.extract_min() {
            run.step(event);
        }

        info!(
            total_time = run.clock,
            cpu_busy = run.cpu_busy,
            context_switches = run.context_switches,
            "simulation complete"
        );

        Outcome {
            workload: run.workload,
            policy: self.config.policy,
            total_time: run.clock,
            cpu_busy: run.cpu_busy,
            context_switches: run.context_switches,
            switch_overhead: run.switch_overhead,
            trace: run.trace,
        }
    }
}

/// Mutable state of one run.
struct Run {
    workload: Workload,
    queue: EventQueue,
    policy: Policy,
    verbose: bool,
    /// Next time the CPU is free.
    clock: Ticks,
    /// Thread that last held the CPU; `None` after an idle gap.
    prev: Option<ThreadRef>,
    cpu_busy: Ticks,
    context_switches: u64,
    switch_overhead: Ticks,
    trace: Trace,
}

impl Run {
    fn new(workload: Workload, config: &SimConfig) -> Self {
        Run {
            workload,
            queue: EventQueue::new(),
            policy: config.policy,
            verbose: config.verbose,
            clock: 0,
            prev: None,
            cpu_busy: 0,
            context_switches: 0,
            switch_overhead: 0,
            trace: Trace::new(),
        }
    }

    fn seed_arrivals(&mut self) {
        let arrivals: Vec<Event> = self
            .workload
            .threads()
            .map(|(r, t)| Event::new(t.arrival, EventKind::Arrival, r, 0))
            .collect();
        for event in arrivals {
            self.queue.insert(event);
        }
    }

    fn step(&mut self, event: Event) {
        set_sim_clock(event.time);

        if self.clock < event.time {
            debug!(from = self.clock, until = event.time, "cpu idle");
            if self.verbose {
                self.trace
                    .record(self.clock, TraceKind::CpuIdle { until: event.time });
            }
            self.clock = event.time;
            self.prev = None;
        }

        match event.kind {
            EventKind::Arrival | EventKind::Unblocked | EventKind::Continue => {
                self.make_ready(event)
            }
            EventKind::Start => self.start(event),
            EventKind::Blocked => self.block(event),
            EventKind::End => self.end(event),
        }
    }

    /// Put the thread in the ready queue and reserve its CPU slot.
    fn make_ready(&mut self, event: Event) {
        self.set_state(event.thread, ThreadState::Ready, event.time);

        let start = Event::new(self.clock, EventKind::Start, event.thread, event.burst);
        self.queue.insert(start);
        self.clock += self.peek_time(&start);
    }

    fn start(&mut self, mut event: Event) {
        let r = event.thread;

        if let Some(prev) = self.prev.filter(|&p| p != r) {
            let same_process =
                self.workload.thread(prev).process_id == self.workload.thread(r).process_id;
            let cost = self.workload.switch_costs.cost(same_process);

            // Everything already scheduled on the CPU slides back; threads
            // becoming runnable do not.
            self.queue
                .shift_pending_keys(cost, &EventKind::READY_KINDS);
            self.clock += cost;
            self.context_switches += 1;
            self.switch_overhead += cost;

            debug!(
                from_process = %self.workload.thread(prev).process_id,
                from_thread = %self.workload.thread(prev).thread_id,
                to_process = %self.workload.thread(r).process_id,
                to_thread = %self.workload.thread(r).thread_id,
                cost,
                "context switch"
            );
            if self.verbose {
                let from = self.key(prev);
                let to = self.key(r);
                self.trace
                    .record(event.time, TraceKind::ContextSwitch { from, to, cost });
            }

            event.time += cost;
            set_sim_clock(event.time);
        }
        self.prev = Some(r);

        if self.workload.thread(r).state != ThreadState::Running {
            self.set_state(r, ThreadState::Running, event.time);
        }

        let consumed = self.consume_time(&event);
        self.cpu_busy += consumed.amount;

        let is_last = self.workload.thread(r).is_last_burst(event.burst);
        let next = match self.policy {
            Policy::Fcfs => {
                debug_assert!(consumed.drained, "FCFS must drain the CPU phase");
                if is_last {
                    EventKind::End
                } else {
                    EventKind::Blocked
                }
            }
            Policy::RoundRobin { .. } => {
                if !consumed.drained {
                    EventKind::Continue
                } else if is_last {
                    EventKind::End
                } else {
                    EventKind::Blocked
                }
            }
        };

        self.queue
            .insert(Event::new(event.time + consumed.amount, next, r, event.burst));
    }

    /// Run the burst's I/O phase and schedule the thread's return.
    fn block(&mut self, event: Event) {
        let r = event.thread;
        self.set_state(r, ThreadState::Blocked, event.time);

        let consumed = self.consume_time(&event);
        let mut burst = event.burst;
        if consumed.drained {
            burst += 1;
            self.workload.thread_mut(r).current_burst = burst;
        }

        self.queue.insert(Event::new(
            event.time + consumed.amount,
            EventKind::Unblocked,
            r,
            burst,
        ));
    }

    fn end(&mut self, event: Event) {
        let r = event.thread;
        self.set_state(r, ThreadState::Terminated, event.time);

        let thread = self.workload.thread_mut(r);
        thread.finish = Some(event.time);
        thread.current_burst = thread.bursts().len();
    }

    /// Consume the part of the event's burst its kind works on.
    fn consume_time(&mut self, event: &Event) -> Consumed {
        let policy = self.policy;
        self.workload
            .thread_mut(event.thread)
            .burst_mut(event.burst)
            .consume(event.kind.phase(), policy)
    }

    /// Like [`Self::consume_time`], without touching the burst.
    fn peek_time(&self, event: &Event) -> Ticks {
        self.workload.thread(event.thread).bursts()[event.burst]
            .peek(event.kind.phase(), self.policy)
    }

    fn set_state(&mut self, r: ThreadRef, to: ThreadState, time: Ticks) {
        let from = self.workload.thread_mut(r).transition(to);
        let key = self.key(r);
        debug!(
            process = %key.process,
            thread = %key.thread,
            from = %from,
            to = %to,
            "state change"
        );
        if self.verbose {
            self.trace.record(
                time,
                TraceKind::Transition {
                    thread: key,
                    from,
                    to,
                },
            );
        }
    }

    fn key(&self, r: ThreadRef) -> ThreadKey {
        let t = self.workload.thread(r);
        ThreadKey {
            process: t.process_id,
            thread: t.thread_id,
        }
    }
}
