//! Estimates the energy consumed by running programs.
//!
//! Two modes are offered: continuous monitoring, which samples every active
//! process on a fixed cadence and accumulates a simulated energy figure from
//! elapsed wall-clock time, and a single-process runner, which launches one
//! command and computes its energy from measured CPU time after it exits.
//! The figure is always a derived estimate (time times a configurable power
//! factor), never a hardware measurement.

pub mod utils {
    pub mod errors;
    pub mod logger;
}

pub mod config;
pub mod energy;
pub mod monitor;
pub mod registry;
pub mod report;
pub mod runner;
pub mod session;
pub mod sources;
