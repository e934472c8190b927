use crate::sources::{ProcessInfo, SnapshotSource};
use crate::utils::errors::MeterError;
use async_trait::async_trait;
use std::time::Duration;
use sysinfo::{ProcessesToUpdate, System};

/// Snapshot source backed by the OS process table.
pub struct SystemSource {
    system: System,
}

impl SystemSource {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotSource for SystemSource {
    async fn list_processes(&mut self) -> Result<Vec<ProcessInfo>, MeterError> {
        self.system.refresh_processes(ProcessesToUpdate::All, true);

        let processes = self.system.processes();
        // An empty process table cannot happen on a healthy system; treat it
        // as a transient enumeration failure.
        if processes.is_empty() {
            return Err(MeterError::SourceUnavailable(
                "no processes visible on system".to_string(),
            ));
        }

        Ok(processes
            .iter()
            .map(|(pid, process)| ProcessInfo {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().to_string(),
                cpu_time: Some(Duration::from_millis(process.accumulated_cpu_time())),
            })
            .collect())
    }
}
