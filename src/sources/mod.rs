mod scripted;
mod system;

pub use scripted::ScriptedSource;
pub use system::SystemSource;

use crate::utils::errors::MeterError;
use async_trait::async_trait;
use std::time::Duration;

/// One process as observed in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    /// Accumulated CPU time (kernel plus user) reported by the OS, when
    /// the source can provide it.
    pub cpu_time: Option<Duration>,
}

impl ProcessInfo {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            cpu_time: None,
        }
    }
}

/// Yields point-in-time listings of the processes running on the host.
#[async_trait]
pub trait SnapshotSource: Send {
    /// Fails with `MeterError::SourceUnavailable` on transient OS errors;
    /// the caller skips the cycle and retries on the next one.
    async fn list_processes(&mut self) -> Result<Vec<ProcessInfo>, MeterError>;
}
