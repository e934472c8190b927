use clap::{Parser, Subcommand};
use consumo::config::{DEFAULT_SAMPLE_INTERVAL_SECS, MeterConfig};
use consumo::energy::DEFAULT_POWER_WATTS;
use consumo::runner;
use consumo::session::SessionController;
use consumo::sources::SystemSource;
use consumo::utils::errors::MeterError;
use consumo::utils::logger;
use log::info;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

#[derive(Parser)]
#[command(
    name = "consumo",
    about = "Estimates the energy consumed by running programs",
    version
)]
struct Cli {
    /// Assumed average power draw of the host CPU, in watts
    #[arg(long, default_value_t = DEFAULT_POWER_WATTS)]
    power_watts: f64,

    /// Seconds between process snapshots in monitor mode
    #[arg(long, default_value_t = DEFAULT_SAMPLE_INTERVAL_SECS)]
    interval_secs: f64,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Continuously monitor every running process (the default)
    Monitor,
    /// Launch a single command and estimate its energy from measured CPU time
    Run {
        /// Program and arguments to launch
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    logger::setup_logger();
    let cli = Cli::parse();
    let config = MeterConfig::default()
        .with_power_watts(cli.power_watts)
        .with_sample_interval(Duration::from_secs_f64(cli.interval_secs));

    let result = match cli.command {
        Some(Mode::Run { command }) => run_once(&command, &config).await,
        Some(Mode::Monitor) | None => monitor(&config).await,
    };
    if let Err(err) = result {
        log::error!("{err}");
        std::process::exit(1);
    }
}

/// Continuous monitoring mode: sample every process until a key is pressed
/// or Ctrl-C arrives, then print the final summary.
async fn monitor(config: &MeterConfig) -> Result<(), MeterError> {
    let (stop_tx, stop_rx) = watch::channel(false);
    let (report_tx, mut report_rx) = mpsc::channel(16);
    spawn_stop_listener(stop_tx);

    println!("Monitoring started. Press Enter (or Ctrl-C) to stop and print the summary.\n");
    let mut controller = SessionController::new(SystemSource::new(), config, stop_rx, report_tx);

    let printer = tokio::spawn(async move {
        while let Some(report) = report_rx.recv().await {
            println!("{report}\n");
        }
    });

    controller.run().await;
    // dropping the controller closes the report channel and lets the
    // printer drain the final summary
    drop(controller);
    let _ = printer.await;
    Ok(())
}

/// Single-process mode: launch the command, then report its CPU time and
/// the derived energy estimate.
async fn run_once(command: &[String], config: &MeterConfig) -> Result<(), MeterError> {
    let (program, args) = match command.split_first() {
        Some(split) => split,
        None => {
            return Err(MeterError::Launch(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "no command given",
            )));
        }
    };

    let outcome = runner::run_command(program, args, config.energy_rate()).await?;
    println!(
        "Total CPU time used: {:.3} seconds",
        outcome.cpu_time.as_secs_f64()
    );
    println!(
        "Estimated energy consumption: {:.3} joules",
        outcome.energy_joules
    );
    if let Some(code) = outcome.exit_code {
        info!("process exited with code {code}");
    }
    Ok(())
}

/// Fires the stop signal on the first keypress (a line on stdin) or Ctrl-C.
fn spawn_stop_listener(stop_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("ctrl-c received, stopping"),
            _ = stdin.read_line(&mut line) => info!("keypress received, stopping"),
        }
        let _ = stop_tx.send(true);
    });
}
