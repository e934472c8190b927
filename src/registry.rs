use crate::energy::EnergyRate;
use crate::monitor::{MonitorStatus, ProcessMonitor};
use crate::sources::ProcessInfo;
use crate::utils::errors::MeterError;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// One monitor's contribution as of its last sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessEnergy {
    pub pid: u32,
    pub name: String,
    pub generation: u64,
    pub first_seen: DateTime<Utc>,
    pub energy_mwh: f64,
    pub status: MonitorStatus,
}

/// Owns every monitor created during a session: an active map keyed by pid
/// plus the retired monitors of processes that have exited. Retired monitors
/// are kept, never deleted, so removing a process from the active set never
/// subtracts its contribution from the grand total.
pub struct MonitorRegistry {
    rate: EnergyRate,
    active: HashMap<u32, ProcessMonitor>,
    retired: Vec<ProcessMonitor>,
    next_generation: u64,
}

impl MonitorRegistry {
    pub fn new(rate: EnergyRate) -> Self {
        Self {
            rate,
            active: HashMap::new(),
            retired: Vec::new(),
            next_generation: 0,
        }
    }

    /// Begin metering a newly observed process. Fails with
    /// `DuplicateMonitor` when an active monitor for the pid already exists;
    /// `reconcile` never does this, so hitting it indicates a bug.
    pub fn start(&mut self, info: &ProcessInfo, now: Instant) -> Result<(), MeterError> {
        if self.active.contains_key(&info.pid) {
            return Err(MeterError::DuplicateMonitor(info.pid));
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        self.active.insert(
            info.pid,
            ProcessMonitor::start(info.pid, info.name.clone(), generation, self.rate, now),
        );
        debug!("monitoring {} (pid {})", info.name, info.pid);
        Ok(())
    }

    /// Reconcile the monitor set against a fresh snapshot: retire monitors
    /// for vanished pids first, then sample survivors, then start monitors
    /// for new pids. A pid reused by the OS after a retirement gets a fresh
    /// monitor with its own generation number; energies are never merged.
    pub fn reconcile(&mut self, snapshot: &[ProcessInfo], now: Instant) {
        let seen: HashSet<u32> = snapshot.iter().map(|p| p.pid).collect();
        let vanished: Vec<u32> = self
            .active
            .keys()
            .filter(|pid| !seen.contains(pid))
            .copied()
            .collect();
        for pid in vanished {
            if let Some(mut monitor) = self.active.remove(&pid) {
                monitor.stop(now);
                info!(
                    "process exited: {} (pid {}), {:.10} MWh recorded",
                    monitor.name(),
                    pid,
                    monitor.accumulated_mwh()
                );
                self.retired.push(monitor);
            }
        }

        for info in snapshot {
            if let Some(monitor) = self.active.get_mut(&info.pid) {
                monitor.sample(now);
            } else if let Err(err) = self.start(info, now) {
                error!("reconciliation defect: {err}");
            }
        }
    }

    /// Stop every still-active monitor at the given instant. Used on session
    /// shutdown so no energy accrued since the last sample is lost.
    pub fn stop_all(&mut self, now: Instant) {
        for (_, mut monitor) in self.active.drain() {
            monitor.stop(now);
            self.retired.push(monitor);
        }
    }

    /// Grand total over every monitor ever created, active and retired.
    pub fn total_energy_mwh(&self) -> f64 {
        let active: f64 = self.active.values().map(ProcessMonitor::accumulated_mwh).sum();
        let retired: f64 = self.retired.iter().map(ProcessMonitor::accumulated_mwh).sum();
        active + retired
    }

    /// Per-monitor listing as of the last sample, active and retired.
    pub fn per_process(&self) -> Vec<ProcessEnergy> {
        self.active
            .values()
            .chain(self.retired.iter())
            .map(|monitor| ProcessEnergy {
                pid: monitor.pid(),
                name: monitor.name().to_string(),
                generation: monitor.generation(),
                first_seen: monitor.first_seen(),
                energy_mwh: monitor.accumulated_mwh(),
                status: monitor.status(),
            })
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const EPS: f64 = 1e-18;

    fn rate() -> EnergyRate {
        EnergyRate::new(50.0)
    }

    fn mwh(seconds: f64) -> f64 {
        rate().energy_mwh(Duration::from_secs_f64(seconds))
    }

    #[test]
    // End-to-end scenario: one process alive for exactly 3 one-second ticks
    fn test_single_process_three_ticks() {
        let t0 = Instant::now();
        let tick = |n: u64| t0 + Duration::from_secs(n);
        let mut registry = MonitorRegistry::new(rate());
        let proc_a = ProcessInfo::new(100, "a");

        registry.reconcile(std::slice::from_ref(&proc_a), tick(1));
        registry.reconcile(std::slice::from_ref(&proc_a), tick(2));
        registry.reconcile(std::slice::from_ref(&proc_a), tick(3));
        registry.reconcile(&[], tick(4));

        assert_eq!(registry.active_count(), 0);
        assert!((registry.total_energy_mwh() - mwh(3.0)).abs() < EPS);
        let per = registry.per_process();
        assert_eq!(per.len(), 1);
        assert_eq!(per[0].status, MonitorStatus::Stopped);
        assert!((per[0].energy_mwh - mwh(3.0)).abs() < EPS);
    }

    #[test]
    // A present ticks 1-3 then gone, B present ticks 2-4; totals add up
    fn test_overlapping_lifetimes_hand_computed() {
        let t0 = Instant::now();
        let tick = |n: u64| t0 + Duration::from_secs(n);
        let mut registry = MonitorRegistry::new(rate());
        let proc_a = ProcessInfo::new(100, "a");
        let proc_b = ProcessInfo::new(200, "b");

        registry.reconcile(&[proc_a.clone()], tick(1));
        registry.reconcile(&[proc_a.clone(), proc_b.clone()], tick(2));
        registry.reconcile(&[proc_a.clone(), proc_b.clone()], tick(3));
        registry.reconcile(&[proc_b.clone()], tick(4));
        registry.reconcile(&[], tick(5));

        // A metered over ticks 1..4, B over ticks 2..5: 3 s each
        assert!((registry.total_energy_mwh() - mwh(6.0)).abs() < EPS);
        let per = registry.per_process();
        assert_eq!(per.len(), 2);
        assert!(per.iter().all(|p| p.status == MonitorStatus::Stopped));
        let a_entry = per.iter().find(|p| p.pid == 100).unwrap();
        let b_entry = per.iter().find(|p| p.pid == 200).unwrap();
        assert!((a_entry.energy_mwh - mwh(3.0)).abs() < EPS);
        assert!((b_entry.energy_mwh - mwh(3.0)).abs() < EPS);
    }

    #[test]
    // A reused pid yields a second, distinct monitor; no cross-contamination
    fn test_pid_reuse_creates_distinct_monitors() {
        let t0 = Instant::now();
        let tick = |n: u64| t0 + Duration::from_secs(n);
        let mut registry = MonitorRegistry::new(rate());

        registry.reconcile(&[ProcessInfo::new(42, "first")], tick(0));
        registry.reconcile(&[ProcessInfo::new(42, "first")], tick(2));
        registry.reconcile(&[], tick(3));
        registry.reconcile(&[ProcessInfo::new(42, "second")], tick(4));
        registry.reconcile(&[ProcessInfo::new(42, "second")], tick(5));

        let per = registry.per_process();
        assert_eq!(per.len(), 2);
        let first = per.iter().find(|p| p.name == "first").unwrap();
        let second = per.iter().find(|p| p.name == "second").unwrap();
        assert_ne!(first.generation, second.generation);
        assert!(first.first_seen <= second.first_seen);
        assert_eq!(first.status, MonitorStatus::Stopped);
        assert_eq!(second.status, MonitorStatus::Active);
        assert!((first.energy_mwh - mwh(3.0)).abs() < EPS);
        assert!((second.energy_mwh - mwh(1.0)).abs() < EPS);
        assert!((registry.total_energy_mwh() - mwh(4.0)).abs() < EPS);
    }

    #[test]
    // Starting a monitor for an already-active pid is a defect
    fn test_duplicate_start_rejected() {
        let mut registry = MonitorRegistry::new(rate());
        let now = Instant::now();
        let info = ProcessInfo::new(9, "dup");
        registry.start(&info, now).unwrap();
        assert!(matches!(
            registry.start(&info, now),
            Err(MeterError::DuplicateMonitor(9))
        ));
    }

    #[test]
    // stop_all freezes every active monitor and keeps the total intact
    fn test_stop_all_retains_totals() {
        let t0 = Instant::now();
        let mut registry = MonitorRegistry::new(rate());
        registry.reconcile(
            &[ProcessInfo::new(1, "a"), ProcessInfo::new(2, "b")],
            t0,
        );
        registry.reconcile(
            &[ProcessInfo::new(1, "a"), ProcessInfo::new(2, "b")],
            t0 + Duration::from_secs(2),
        );
        let before = registry.total_energy_mwh();
        registry.stop_all(t0 + Duration::from_secs(3));
        assert_eq!(registry.active_count(), 0);
        // one more second accrued for both monitors during the final stop
        assert!((registry.total_energy_mwh() - (before + mwh(2.0))).abs() < EPS);
    }

    #[test]
    // Totals read from another thread mid-reconciliation are monotonic
    fn test_totals_monotonic_under_concurrent_reads() {
        let registry = Arc::new(Mutex::new(MonitorRegistry::new(rate())));
        let done = Arc::new(AtomicBool::new(false));

        let reader_registry = Arc::clone(&registry);
        let reader_done = Arc::clone(&done);
        let reader = std::thread::spawn(move || {
            let mut last = 0.0;
            while !reader_done.load(Ordering::Relaxed) {
                let total = reader_registry.lock().unwrap().total_energy_mwh();
                assert!(total >= last);
                last = total;
            }
            last
        });

        let t0 = Instant::now();
        for i in 0..500u64 {
            let now = t0 + Duration::from_millis(i * 10);
            let snapshot = if i % 5 == 4 {
                Vec::new()
            } else {
                vec![ProcessInfo::new(1, "a"), ProcessInfo::new(2, "b")]
            };
            registry.lock().unwrap().reconcile(&snapshot, now);
        }
        done.store(true, Ordering::Relaxed);

        let last_seen = reader.join().unwrap();
        assert!(last_seen <= registry.lock().unwrap().total_energy_mwh());
    }
}
