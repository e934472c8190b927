use crate::energy::{DEFAULT_POWER_WATTS, EnergyRate, MWH_PER_JOULE};
use std::time::Duration;

/// Seconds between process snapshots in continuous monitoring mode.
pub const DEFAULT_SAMPLE_INTERVAL_SECS: f64 = 1.0;

/// Recognized measurement options.
#[derive(Debug, Clone)]
pub struct MeterConfig {
    /// Assumed average power draw in watts
    pub power_watts: f64,
    /// Cadence of the sampling loop
    pub sample_interval: Duration,
    /// Output unit for the continuous accumulator (MWh per joule)
    pub mwh_per_joule: f64,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            power_watts: DEFAULT_POWER_WATTS,
            sample_interval: Duration::from_secs_f64(DEFAULT_SAMPLE_INTERVAL_SECS),
            mwh_per_joule: MWH_PER_JOULE,
        }
    }
}

impl MeterConfig {
    pub fn with_power_watts(mut self, power_watts: f64) -> Self {
        self.power_watts = power_watts;
        self
    }

    pub fn with_sample_interval(mut self, sample_interval: Duration) -> Self {
        self.sample_interval = sample_interval;
        self
    }

    pub fn with_energy_unit(mut self, mwh_per_joule: f64) -> Self {
        self.mwh_per_joule = mwh_per_joule;
        self
    }

    pub fn energy_rate(&self) -> EnergyRate {
        EnergyRate {
            power_watts: self.power_watts,
            mwh_per_joule: self.mwh_per_joule,
        }
    }
}
