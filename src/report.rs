use crate::monitor::MonitorStatus;
use crate::registry::ProcessEnergy;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Periodic,
    Final,
}

/// Snapshot of the session's consumption, delivered through the reporting
/// sink on every sampling cycle and once more at termination.
#[derive(Debug, Clone)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub kind: ReportKind,
    pub per_process: Vec<ProcessEnergy>,
    pub total_mwh: f64,
}

impl Report {
    pub fn new(kind: ReportKind, per_process: Vec<ProcessEnergy>, total_mwh: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            per_process,
            total_mwh,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = match self.kind {
            ReportKind::Periodic => "monitoring status",
            ReportKind::Final => "final summary",
        };
        writeln!(
            f,
            "--- {} at {} ---",
            header,
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        )?;

        let active: Vec<&ProcessEnergy> = self
            .per_process
            .iter()
            .filter(|p| p.status == MonitorStatus::Active)
            .sorted_by(|a, b| b.energy_mwh.total_cmp(&a.energy_mwh))
            .collect();
        if !active.is_empty() {
            writeln!(f, "active processes:")?;
            for entry in active {
                writeln!(
                    f,
                    "  {} (pid {}): {:.10} MWh",
                    entry.name, entry.pid, entry.energy_mwh
                )?;
            }
        }

        let finished: Vec<&ProcessEnergy> = self
            .per_process
            .iter()
            .filter(|p| p.status == MonitorStatus::Stopped)
            .sorted_by(|a, b| b.energy_mwh.total_cmp(&a.energy_mwh))
            .collect();
        if !finished.is_empty() {
            writeln!(f, "finished processes:")?;
            for entry in finished {
                writeln!(
                    f,
                    "  {} (pid {}): {:.10} MWh",
                    entry.name, entry.pid, entry.energy_mwh
                )?;
            }
        }

        write!(f, "total consumption: {:.10} MWh", self.total_mwh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pid: u32, name: &str, energy_mwh: f64, status: MonitorStatus) -> ProcessEnergy {
        ProcessEnergy {
            pid,
            name: name.to_string(),
            generation: 0,
            first_seen: Utc::now(),
            energy_mwh,
            status,
        }
    }

    #[test]
    // Rendering splits active from finished and ends with the total
    fn test_display_sections() {
        let report = Report::new(
            ReportKind::Final,
            vec![
                entry(1, "alpha", 2e-8, MonitorStatus::Active),
                entry(2, "beta", 5e-8, MonitorStatus::Stopped),
            ],
            7e-8,
        );
        let rendered = report.to_string();
        assert!(rendered.contains("final summary"));
        assert!(rendered.contains("active processes:"));
        assert!(rendered.contains("alpha (pid 1)"));
        assert!(rendered.contains("finished processes:"));
        assert!(rendered.contains("beta (pid 2)"));
        assert!(rendered.trim_end().ends_with("MWh"));
        assert!(rendered.contains("total consumption: 0.0000000700 MWh"));
    }

    #[test]
    // Entries within a section come out sorted by energy, largest first
    fn test_display_sorted_by_energy() {
        let report = Report::new(
            ReportKind::Periodic,
            vec![
                entry(1, "small", 1e-9, MonitorStatus::Active),
                entry(2, "large", 9e-8, MonitorStatus::Active),
            ],
            9.1e-8,
        );
        let rendered = report.to_string();
        let large_at = rendered.find("large").unwrap();
        let small_at = rendered.find("small").unwrap();
        assert!(large_at < small_at);
    }
}
