use crate::energy::EnergyRate;
use crate::utils::errors::MeterError;
use log::{debug, info};
use std::time::Duration;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::process::Command;

/// How often the child's accumulated CPU time is re-read while it runs.
const CPU_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of the single-process launch variant.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub exit_code: Option<i32>,
    /// Kernel plus user CPU time as last observed before exit
    pub cpu_time: Duration,
    pub energy_joules: f64,
}

/// Launch a command, wait for it to finish and estimate its energy from the
/// CPU time it consumed. Unlike continuous monitoring this uses measured CPU
/// time, not wall-clock time, and computes the energy once, at exit.
pub async fn run_command(
    program: &str,
    args: &[String],
    rate: EnergyRate,
) -> Result<RunOutcome, MeterError> {
    info!("launching: {} {}", program, args.join(" "));
    let mut child = Command::new(program).args(args).spawn()?;

    let pid = child.id().map(Pid::from_u32);
    let mut system = System::new();
    let mut cpu_time = Duration::ZERO;

    // The OS forgets the process times once it exits, so keep the latest
    // reading while polling for completion.
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if let Some(pid) = pid {
            system.refresh_processes(ProcessesToUpdate::Some(&[pid]), false);
            if let Some(process) = system.process(pid) {
                cpu_time = Duration::from_millis(process.accumulated_cpu_time());
            }
        }
        tokio::time::sleep(CPU_POLL_INTERVAL).await;
    };
    debug!("process exited with {status}");

    Ok(RunOutcome {
        exit_code: status.code(),
        cpu_time,
        energy_joules: rate.cpu_energy_joules(cpu_time),
    })
}
