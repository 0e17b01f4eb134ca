//! Text rendering of a [`Report`].

use std::io::{self, Write};

use crate::stats::{Report, ThreadStats};

/// Write the summary lines, followed by one block per thread when
/// `detailed` is set.
pub fn write_report<W: Write>(out: &mut W, report: &Report, detailed: bool) -> io::Result<()> {
    writeln!(out, "{}", report.policy)?;
    writeln!(out, "Total Time required is {} units", report.total_time)?;
    writeln!(
        out,
        "Average Turnaround Time is {:.1} time units",
        report.average_turnaround
    )?;
    if report.total_time == 0 {
        writeln!(out, "CPU Utilization is 0%")?;
    } else {
        writeln!(out, "CPU Utilization is {:.1}%", report.cpu_utilization)?;
    }

    if detailed {
        for t in &report.threads {
            write_thread(out, t)?;
        }
    }
    Ok(())
}

fn write_thread<W: Write>(out: &mut W, t: &ThreadStats) -> io::Result<()> {
    writeln!(out, "Thread {} of Process {}:", t.thread, t.process)?;
    writeln!(out, "\tarrival time: {}", t.arrival)?;
    writeln!(
        out,
        "\tservice time: {} units, I/O time: {} units, turnaround time: {} units, finish time: {} units",
        t.service, t.io, t.turnaround, t.finish
    )
}

/// [`write_report`] into a `String`.
pub fn render(report: &Report, detailed: bool) -> String {
    let mut buf = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = write_report(&mut buf, report, detailed);
    String::from_utf8_lossy(&buf).into_owned()
}
