use crate::sources::{ProcessInfo, SnapshotSource};
use crate::utils::errors::MeterError;
use async_trait::async_trait;
use std::collections::VecDeque;

/// Plays back a fixed sequence of snapshot frames. Once the script is
/// exhausted every further call yields an empty snapshot, as if all
/// processes had exited.
pub struct ScriptedSource {
    frames: VecDeque<Result<Vec<ProcessInfo>, String>>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Vec<ProcessInfo>>) -> Self {
        Self {
            frames: frames.into_iter().map(Ok).collect(),
        }
    }

    /// Frames may also be scripted failures, for exercising skipped cycles.
    pub fn with_outcomes(frames: Vec<Result<Vec<ProcessInfo>, String>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn list_processes(&mut self) -> Result<Vec<ProcessInfo>, MeterError> {
        match self.frames.pop_front() {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(reason)) => Err(MeterError::SourceUnavailable(reason)),
            None => Ok(Vec::new()),
        }
    }
}
