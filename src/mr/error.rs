use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Map,
    Reduce,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Map => f.write_str("map"),
            Phase::Reduce => f.write_str("reduce"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FaultCause {
    #[error("failed: {0:#}")]
    Failed(anyhow::Error),
    #[error("panicked: {0}")]
    Panicked(String),
}

/// A worker that did not run its function to a clean finish.
#[derive(Debug, Error)]
#[error("{phase} worker #{worker} (key {key:?}) {cause}")]
pub struct WorkerFault {
    pub phase: Phase,
    pub worker: usize,
    pub key: String,
    pub cause: FaultCause,
}

#[derive(Debug, Error)]
pub enum MrError {
    #[error("{phase} phase: {} worker(s) failed{}", .faults.len(), first_fault(.faults))]
    WorkerFailed { phase: Phase, faults: Vec<WorkerFault> },

    #[error("{phase} phase stalled: {remaining} of {cohort} workers did not signal completion within {waited:?}")]
    StuckCohort {
        phase: Phase,
        remaining: usize,
        cohort: usize,
        waited: Duration,
    },

    #[error("{phase} phase: {remaining} worker(s) exited without signaling completion")]
    CohortLost { phase: Phase, remaining: usize },

    #[error("{phase} phase cancelled")]
    Cancelled { phase: Phase },

    #[error("master task exited without delivering a result")]
    MasterLost,

    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

fn first_fault(faults: &[WorkerFault]) -> String {
    match faults.first() {
        Some(fault) => format!(", first: {fault}"),
        None => String::new(),
    }
}

impl MrError {
    pub fn phase(&self) -> Option<Phase> {
        match self {
            MrError::WorkerFailed { phase, .. }
            | MrError::StuckCohort { phase, .. }
            | MrError::CohortLost { phase, .. }
            | MrError::Cancelled { phase } => Some(*phase),
            MrError::MasterLost | MrError::Runtime(_) => None,
        }
    }
}
