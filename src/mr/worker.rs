use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::error::{FaultCause, Phase, WorkerFault};
use super::{Emitter, Record, WorkerFn};

/// Sent exactly once by every worker when its function is finished.
#[derive(Debug)]
pub(crate) struct Completion {
    pub worker: usize,
    pub outcome: Result<(), WorkerFault>,
}

/// Spawns one invocation of `f` over `input` into `workers`.
///
/// The completion signal goes out after the function's last emission, whether
/// it returned `Ok`, returned `Err` or panicked.
#[allow(clippy::too_many_arguments)]
pub(crate) fn spawn<F>(
    workers: &mut JoinSet<()>,
    spawner: Option<&Handle>,
    phase: Phase,
    worker: usize,
    f: Arc<F>,
    input: Record,
    emit: Emitter,
    done: mpsc::UnboundedSender<Completion>,
) where
    F: WorkerFn + ?Sized,
{
    let task = async move {
        let key = input.key.clone();
        log::trace!("{phase} worker #{worker} started on key {key:?}");

        // the call itself sits inside the guarded future so that a panic raised
        // before the first await is caught too
        let run = AssertUnwindSafe(async move { f.call(input, emit).await }).catch_unwind();
        let cause = match run.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(FaultCause::Failed(e)),
            Err(panic) => Some(FaultCause::Panicked(panic_message(panic))),
        };

        let outcome = match cause {
            None => Ok(()),
            Some(cause) => {
                log::debug!("{phase} worker #{worker} on key {key:?} {cause}");
                Err(WorkerFault { phase, worker, key, cause })
            }
        };
        if done.send(Completion { worker, outcome }).is_err() {
            log::trace!("{phase} worker #{worker}: collector gone before completion");
        }
    };
    match spawner {
        Some(handle) => workers.spawn_on(task, handle),
        None => workers.spawn(task),
    };
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
