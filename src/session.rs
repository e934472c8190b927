use crate::config::MeterConfig;
use crate::registry::MonitorRegistry;
use crate::report::{Report, ReportKind};
use crate::sources::SnapshotSource;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Stopping,
    Terminated,
}

/// Drives the sampling loop: fetches a snapshot on a fixed cadence,
/// reconciles the monitor registry against it and emits a report per cycle.
/// A single-fire stop signal moves the session through Stopping (every
/// still-active monitor is stopped at the stop instant) to Terminated,
/// where the final summary is emitted.
pub struct SessionController<S: SnapshotSource> {
    source: S,
    registry: Arc<Mutex<MonitorRegistry>>,
    sample_interval: Duration,
    stop_rx: watch::Receiver<bool>,
    report_tx: mpsc::Sender<Report>,
    state: SessionState,
}

impl<S: SnapshotSource> SessionController<S> {
    pub fn new(
        source: S,
        config: &MeterConfig,
        stop_rx: watch::Receiver<bool>,
        report_tx: mpsc::Sender<Report>,
    ) -> Self {
        Self {
            source,
            registry: Arc::new(Mutex::new(MonitorRegistry::new(config.energy_rate()))),
            sample_interval: config.sample_interval,
            stop_rx,
            report_tx,
            state: SessionState::Running,
        }
    }

    /// Handle for querying totals from another task while the session runs.
    /// The registry lock is only ever held for one reconciliation pass or
    /// one summation, never across an await point.
    pub fn registry(&self) -> Arc<Mutex<MonitorRegistry>> {
        Arc::clone(&self.registry)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run until the stop signal fires, then emit and return the final
    /// report. The stop signal is checked at the top of every cycle and can
    /// also interrupt an in-flight snapshot fetch, so a stale snapshot never
    /// starts new monitors once stopping has begun.
    pub async fn run(&mut self) -> Report {
        let mut ticker = tokio::time::interval(self.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "monitoring session started, sampling every {:.1}s",
            self.sample_interval.as_secs_f64()
        );

        while self.state == SessionState::Running {
            tokio::select! {
                _ = self.stop_rx.changed() => {
                    self.state = SessionState::Stopping;
                    break;
                }
                _ = ticker.tick() => {}
            }
            if *self.stop_rx.borrow() {
                self.state = SessionState::Stopping;
                break;
            }

            let snapshot = tokio::select! {
                _ = self.stop_rx.changed() => {
                    self.state = SessionState::Stopping;
                    break;
                }
                result = self.source.list_processes() => result,
            };

            match snapshot {
                Ok(processes) => {
                    let report = {
                        let now = Instant::now();
                        let mut registry = self.lock_registry();
                        registry.reconcile(&processes, now);
                        Report::new(
                            ReportKind::Periodic,
                            registry.per_process(),
                            registry.total_energy_mwh(),
                        )
                    };
                    if self.report_tx.send(report).await.is_err() {
                        warn!("report receiver dropped, continuing without periodic output");
                    }
                }
                // Transient failure: skip the cycle, keep all accumulated
                // state and retry on the next tick.
                Err(err) => warn!("skipping cycle: {err}"),
            }
        }

        let final_report = {
            let now = Instant::now();
            let mut registry = self.lock_registry();
            registry.stop_all(now);
            Report::new(
                ReportKind::Final,
                registry.per_process(),
                registry.total_energy_mwh(),
            )
        };
        if self.report_tx.send(final_report.clone()).await.is_err() {
            debug!("report receiver dropped before the final summary");
        }
        self.state = SessionState::Terminated;
        info!(
            "session terminated, {:.10} MWh total across {} processes",
            final_report.total_mwh,
            final_report.per_process.len()
        );
        final_report
    }

    fn lock_registry(&self) -> std::sync::MutexGuard<'_, MonitorRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
