#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::Rng;

use simcpu::{Burst, ProcessId, ThreadId, ThreadKey, Ticks, Workload};

/// Initialize tracing from `RUST_LOG`.
///
/// `init_tracing()` is idempotent: first call in the process succeeds,
/// subsequent calls are silently ignored.
pub fn setup_test() {
    simcpu::init_tracing();
}

pub fn key(process: u32, thread: u32) -> ThreadKey {
    ThreadKey {
        process: ProcessId(process),
        thread: ThreadId(thread),
    }
}

/// One process with one thread arriving at 0 and a single CPU burst.
pub fn single_burst(cpu: Ticks) -> Workload {
    Workload::builder()
        .thread(ProcessId(1), ThreadId(1), 0, vec![Burst::last(cpu)])
        .build()
        .unwrap()
}

/// `n` single-thread processes, all arriving at 0 with one CPU burst of
/// length `cpu`.
pub fn cpu_bound(n: u32, cpu: Ticks, same: Ticks, cross: Ticks) -> Workload {
    let mut builder = Workload::builder().switch_costs(same, cross);
    for p in 1..=n {
        builder = builder.thread(ProcessId(p), ThreadId(1), 0, vec![Burst::last(cpu)]);
    }
    builder.build().unwrap()
}

/// A random but valid workload: up to `max_procs` processes with up to four
/// threads each, arrivals in `0..50` and bursts of `1..20` CPU and `0..30`
/// I/O units.
pub fn random_workload(rng: &mut StdRng, max_procs: u32) -> Workload {
    let mut builder =
        Workload::builder().switch_costs(rng.gen_range(0..4), rng.gen_range(0..8));
    for p in 1..=rng.gen_range(1..=max_procs) {
        builder = builder.process(ProcessId(p));
        for t in 1..=rng.gen_range(1..=4) {
            let n = rng.gen_range(1..=5);
            let bursts = (0..n)
                .map(|i| {
                    let cpu = rng.gen_range(1..20);
                    if i + 1 == n {
                        Burst::last(cpu)
                    } else {
                        Burst::new(cpu, rng.gen_range(0..30))
                    }
                })
                .collect();
            builder = builder.thread(ProcessId(p), ThreadId(t), rng.gen_range(0..50), bursts);
        }
    }
    builder.build().unwrap()
}
