use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::{MrError, Phase, WorkerFault};
use super::worker::Completion;
use super::{Mapping, Record};

/// What one cohort produced.
#[derive(Debug, Default)]
pub(crate) struct Collected {
    pub mapping: Mapping,
    pub faults: Vec<WorkerFault>,
}

/// Single consumer of a cohort's record and completion channels.
pub(crate) struct Collector {
    phase: Phase,
    cohort: usize,
    records: mpsc::UnboundedReceiver<Record>,
    done: mpsc::UnboundedReceiver<Completion>,
}

impl Collector {
    pub fn new(
        phase: Phase,
        cohort: usize,
        records: mpsc::UnboundedReceiver<Record>,
        done: mpsc::UnboundedReceiver<Completion>,
    ) -> Self {
        Collector { phase, cohort, records, done }
    }

    /// Aggregates records until every cohort member has signaled completion.
    pub async fn collect(
        mut self,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<Collected, MrError> {
        let phase = self.phase;
        let mut out = Collected::default();
        let mut remaining = self.cohort;

        let deadline = timeout.map(|t| Instant::now() + t);
        let stall = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(stall);

        while remaining > 0 {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::warn!("{phase} phase cancelled with {remaining} worker(s) outstanding");
                    return Err(MrError::Cancelled { phase });
                }
                Some(record) = self.records.recv() => accumulate(&mut out.mapping, record),
                done = self.done.recv() => match done {
                    Some(Completion { worker, outcome }) => {
                        remaining -= 1;
                        log::trace!("{phase} worker #{worker} done, {remaining} remaining");
                        if let Err(fault) = outcome {
                            out.faults.push(fault);
                        }
                    }
                    None => return Err(MrError::CohortLost { phase, remaining }),
                },
                _ = &mut stall => {
                    return Err(MrError::StuckCohort {
                        phase,
                        remaining,
                        cohort: self.cohort,
                        waited: timeout.unwrap_or_default(),
                    });
                }
            }
        }

        // completions and records travel on separate channels, so a worker's
        // tail can still be queued here after its completion was counted
        while let Ok(record) = self.records.try_recv() {
            accumulate(&mut out.mapping, record);
        }

        Ok(out)
    }
}

fn accumulate(mapping: &mut Mapping, record: Record) {
    mapping.entry(record.key).or_default().extend(record.values);
}
