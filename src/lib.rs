//! simcpu - Deterministic discrete-event CPU scheduling simulator.
//!
//! Multi-threaded processes made of alternating CPU and I/O bursts are run
//! on a single simulated CPU under First-Come-First-Served or Round-Robin,
//! with a configurable cost for switching between threads of the same
//! process and between processes.
//!
//! # Architecture
//!
//! - **Engine**: Event-driven loop that drives every thread through its lifecycle
//! - **Queue**: Binary min-heap of events ordered by time, kind and insertion
//! - **Workload**: Processes, threads and bursts, plus the thread state machine
//! - **Stats**: Turnaround, service, I/O and utilization figures from a finished run
//! - **Parse / Report**: Text input format and text output
//!
//! # Usage
//!
//! ```rust,no_run
//! use simcpu::*;
//!
//! let workload = Workload::builder()
//!     .switch_costs(1, 5)
//!     .thread(ProcessId(1), ThreadId(1), 0, vec![Burst::new(10, 20), Burst::last(5)])
//!     .thread(ProcessId(2), ThreadId(1), 3, vec![Burst::last(8)])
//!     .build()
//!     .unwrap();
//!
//! let outcome = Simulator::new(SimConfig::round_robin(4).verbose(true)).run(workload);
//! outcome.trace.dump();
//! print!("{}", report::render(&Report::from_outcome(&outcome), true));
//! ```

pub mod config;
pub mod engine;
pub mod fmt;
pub mod parse;
pub mod queue;
pub mod report;
pub mod stats;
pub mod trace;
pub mod types;
pub mod workload;

// Re-export the main public types for convenience.
pub use config::{Policy, SimConfig};
pub use engine::{Outcome, Simulator};
pub use fmt::{init_tracing, sim_clock, SimFormat};
pub use parse::parse_workload;
pub use queue::{EmptyQueueError, Event, EventKind, EventQueue};
pub use stats::Report;
pub use trace::{ThreadKey, Trace, TraceEvent, TraceKind};
pub use types::{ProcessId, ThreadId, ThreadRef, Ticks};
pub use workload::{Burst, ThreadState, Workload, WorkloadError};
