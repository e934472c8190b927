use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeterError {
    #[error("process snapshot unavailable: {0}")]
    SourceUnavailable(String),
    #[error("monitor already active for pid {0}")]
    DuplicateMonitor(u32),
    #[error("process launch failed: {0}")]
    Launch(#[from] std::io::Error),
}
