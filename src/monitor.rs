use crate::energy::EnergyRate;
use chrono::{DateTime, Utc};
use log::warn;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    Active,
    Stopped,
}

/// Per-process energy accumulator. One monitor exists per observed process
/// lifetime; its accumulated energy is frozen once stopped and never reset,
/// so a process exiting does not erase its contribution to the total.
#[derive(Debug, Clone)]
pub struct ProcessMonitor {
    pid: u32,
    name: String,
    generation: u64,
    first_seen: DateTime<Utc>,
    last_sample: Instant,
    accumulated_mwh: f64,
    status: MonitorStatus,
    rate: EnergyRate,
}

impl ProcessMonitor {
    pub fn start(pid: u32, name: String, generation: u64, rate: EnergyRate, now: Instant) -> Self {
        Self {
            pid,
            name,
            generation,
            first_seen: Utc::now(),
            last_sample: now,
            accumulated_mwh: 0.0,
            status: MonitorStatus::Active,
            rate,
        }
    }

    /// Accrue energy for the time elapsed since the previous sample and
    /// return the new accumulated total. A clock regression is clamped to
    /// zero elapsed time; the pre-regression sample point is kept so the
    /// interval is not counted twice once the clock recovers. No-op while
    /// stopped.
    pub fn sample(&mut self, now: Instant) -> f64 {
        if self.status == MonitorStatus::Stopped {
            return self.accumulated_mwh;
        }
        match now.checked_duration_since(self.last_sample) {
            Some(elapsed) => {
                self.accumulated_mwh += self.rate.energy_mwh(elapsed);
                self.last_sample = now;
            }
            None => {
                warn!(
                    "clock regression while sampling {} (pid {}), clamping to zero elapsed",
                    self.name, self.pid
                );
            }
        }
        self.accumulated_mwh
    }

    /// Take a final sample and freeze the accumulator. Idempotent.
    pub fn stop(&mut self, now: Instant) {
        if self.status == MonitorStatus::Active {
            self.sample(now);
            self.status = MonitorStatus::Stopped;
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    pub fn status(&self) -> MonitorStatus {
        self.status
    }

    pub fn accumulated_mwh(&self) -> f64 {
        self.accumulated_mwh
    }
}
