//! Parser for the text workload format.
//!
//! ```text
//! processCount sameProcessSwitchCost crossProcessSwitchCost
//! processNumber threadCount                 (per process)
//! threadNumber arrivalTime burstCount       (per thread)
//! burstNumber cpuTime ioTime                (per burst but the last)
//! burstNumber cpuTime                       (last burst: no I/O)
//! ```
//!
//! Every record sits on its own line and must have exactly the listed
//! fields, all non-negative integers. Blank lines are ignored. Burst
//! numbers are checked for shape but otherwise unused.

use tracing::debug;

use crate::types::{ProcessId, ThreadId};
use crate::workload::{Burst, Workload, WorkloadError};

/// Parse a workload description.
///
/// # Example
///
/// ```rust
/// use simcpu::parse_workload;
///
/// let input = "1 0 5\n\
///              1 1\n\
///              1 0 2\n\
///              1 4 10\n\
///              2 6\n";
/// let workload = parse_workload(input).unwrap();
/// assert_eq!(workload.thread_count(), 1);
/// ```
pub fn parse_workload(input: &str) -> Result<Workload, WorkloadError> {
    let mut records = Records::new(input);

    let (_, [process_count, same_process, cross_process]) = records.next::<3>("header line")?;
    let mut builder = Workload::builder().switch_costs(same_process, cross_process);

    for _ in 0..process_count {
        let (line, [number, thread_count]) = records.next::<2>("process record")?;
        let pid = ProcessId(to_u32(number, line, "process number")?);
        builder = builder.process(pid);

        for _ in 0..thread_count {
            let (line, [number, arrival, burst_count]) = records.next::<3>("thread record")?;
            let tid = ThreadId(to_u32(number, line, "thread number")?);
            if burst_count == 0 {
                return Err(WorkloadError::Malformed {
                    line,
                    msg: format!("thread {tid} of process {pid} declares no bursts"),
                });
            }

            let mut bursts = Vec::new();
            for i in 1..=burst_count {
                if i < burst_count {
                    let (_, [_, cpu, io]) = records.next::<3>("burst record")?;
                    bursts.push(Burst::new(cpu, io));
                } else {
                    let (_, [_, cpu]) = records.next::<2>("final burst record")?;
                    bursts.push(Burst::last(cpu));
                }
            }
            builder = builder.thread(pid, tid, arrival, bursts);
        }
    }

    if let Some((line, _)) = records.next_line() {
        return Err(WorkloadError::TrailingInput { line });
    }

    let workload = builder.build()?;
    debug!(
        processes = workload.processes().len(),
        threads = workload.thread_count(),
        "parsed workload"
    );
    Ok(workload)
}

/// Non-blank lines of the input with their 1-based line numbers.
struct Records<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Records<'a> {
    fn new(input: &'a str) -> Self {
        Records {
            lines: input.lines().enumerate(),
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        self.lines
            .by_ref()
            .map(|(i, l)| (i + 1, l.trim()))
            .find(|(_, l)| !l.is_empty())
    }

    /// Read the next record, which must have exactly `N` integer fields.
    fn next<const N: usize>(
        &mut self,
        what: &'static str,
    ) -> Result<(usize, [u64; N]), WorkloadError> {
        let (line, text) = self
            .next_line()
            .ok_or(WorkloadError::UnexpectedEof { expected: what })?;

        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != N {
            return Err(WorkloadError::Malformed {
                line,
                msg: format!("{what}: expected {N} fields, found {}", fields.len()),
            });
        }

        let mut values = [0u64; N];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field.parse().map_err(|_| WorkloadError::Malformed {
                line,
                msg: format!("{what}: {field:?} is not a non-negative integer"),
            })?;
        }
        Ok((line, values))
    }
}

fn to_u32(value: u64, line: usize, what: &str) -> Result<u32, WorkloadError> {
    u32::try_from(value).map_err(|_| WorkloadError::Malformed {
        line,
        msg: format!("{what} {value} is out of range"),
    })
}
