use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::collector::{Collected, Collector};
use super::error::{MrError, Phase};
use super::{Emitter, Record, WorkerFn, worker};

/// Runs one phase: a cohort of one worker per input, drained by a collector.
///
/// Workers go to `spawner` when given, else to the current runtime.
pub(crate) async fn run_phase<F>(
    phase: Phase,
    inputs: Vec<Record>,
    f: Arc<F>,
    spawner: Option<&Handle>,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<Collected, MrError>
where
    F: WorkerFn + ?Sized,
{
    let cohort = inputs.len();
    let (records_tx, records_rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = mpsc::unbounded_channel();
    let cohort_token = cancel.child_token();

    let mut workers = JoinSet::new();
    for (id, input) in inputs.into_iter().enumerate() {
        let emit = Emitter::new(records_tx.clone(), cohort_token.clone());
        let done = done_tx.clone();
        worker::spawn(&mut workers, spawner, phase, id, f.clone(), input, emit, done);
    }
    // only the workers hold senders from here on
    drop(records_tx);
    drop(done_tx);
    log::debug!("{phase} phase: spawned {cohort} workers");

    let collector = Collector::new(phase, cohort, records_rx, done_rx);
    match collector.collect(cancel, timeout).await {
        Ok(collected) => {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    log::warn!("{phase} worker task ended abnormally: {e}");
                }
            }
            log::debug!(
                "{phase} phase: cohort of {cohort} drained into {} keys",
                collected.mapping.len()
            );
            Ok(collected)
        }
        Err(e) => {
            cohort_token.cancel();
            workers.abort_all();
            Err(e)
        }
    }
}
