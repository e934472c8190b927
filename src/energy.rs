use std::time::Duration;

/// Assumed average power draw of the host CPU while a process runs, in watts.
pub const DEFAULT_POWER_WATTS: f64 = 50.0;

/// 1 MWh = 3.6e9 J. At the default 50 W this works out to ~1.3889e-8 MWh
/// accrued per second of wall-clock time.
pub const MWH_PER_JOULE: f64 = 1.0 / 3_600_000_000.0;

/// Conversion from elapsed time to an energy estimate.
#[derive(Debug, Clone, Copy)]
pub struct EnergyRate {
    /// Power factor in watts
    pub power_watts: f64,
    /// Output unit for the continuous accumulator
    pub mwh_per_joule: f64,
}

impl Default for EnergyRate {
    fn default() -> Self {
        Self {
            power_watts: DEFAULT_POWER_WATTS,
            mwh_per_joule: MWH_PER_JOULE,
        }
    }
}

impl EnergyRate {
    pub fn new(power_watts: f64) -> Self {
        Self {
            power_watts,
            mwh_per_joule: MWH_PER_JOULE,
        }
    }

    /// Simulated energy for a wall-clock interval, in MWh. Zero elapsed time
    /// yields zero energy.
    pub fn energy_mwh(&self, elapsed: Duration) -> f64 {
        elapsed.as_secs_f64() * self.power_watts * self.mwh_per_joule
    }

    /// Energy for OS-reported CPU time (kernel plus user), in joules. The
    /// single-process runner computes this once, at process exit.
    pub fn cpu_energy_joules(&self, cpu_time: Duration) -> f64 {
        cpu_time.as_secs_f64() * self.power_watts
    }
}

/// Converts OS-reported process times in 100 ns ticks (the FILETIME
/// convention, 1 s = 1e7 ticks) to a `Duration` for `cpu_energy_joules`.
pub fn cpu_time_from_ticks(ticks: u64) -> Duration {
    Duration::from_nanos(ticks.saturating_mul(100))
}
