use std::collections::HashMap;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

mod collector;
pub mod config;
pub mod error;
pub mod master;
mod phase;
mod worker;

pub use config::{EngineConfig, FailurePolicy};
pub use error::{FaultCause, MrError, Phase, WorkerFault};
pub use master::{MapReduce, Master};

/// Key to accumulated values, as drained from one cohort.
pub type Mapping = HashMap<String, Vec<String>>;

pub type WorkFuture = Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + 'static>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub values: Vec<String>,
}

impl Record {
    pub fn new(key: impl Into<String>, values: Vec<String>) -> Self {
        Record { key: key.into(), values }
    }

    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Self {
        Record { key: key.into(), values: vec![value.into()] }
    }
}

/// Handle a worker function uses to push records into its cohort.
///
/// Cloning is cheap; every clone feeds the same cohort. Records emitted after
/// the owning invocation has returned are not guaranteed to be collected.
#[derive(Clone)]
pub struct Emitter {
    tx: mpsc::UnboundedSender<Record>,
    cancel: CancellationToken,
}

impl Emitter {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Record>, cancel: CancellationToken) -> Self {
        Emitter { tx, cancel }
    }

    pub fn emit(&self, record: Record) {
        if let Err(mpsc::error::SendError(record)) = self.tx.send(record) {
            log::trace!("collector gone, dropping record for key {:?}", record.key);
        }
    }

    pub fn emit_kv(&self, key: impl Into<String>, value: impl Into<String>) {
        self.emit(Record::single(key, value));
    }

    /// True once the run is cancelled or the phase has given up on its cohort.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

/// One processing step, run once per input record of a phase.
pub trait WorkerFn: Send + Sync + 'static {
    fn call(&self, input: Record, emit: Emitter) -> WorkFuture;
}

impl<F, Fut> WorkerFn for F
where
    F: Fn(Record, Emitter) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
{
    fn call(&self, input: Record, emit: Emitter) -> WorkFuture {
        Box::pin(self(input, emit))
    }
}

/// A named map/reduce application.
pub trait MRApp: Send + Sync {
    fn map(&self, input: Record, emit: Emitter) -> WorkFuture;
    fn reduce(&self, input: Record, emit: Emitter) -> WorkFuture;
}

/// Runs `map` then `reduce` over `inputs` with the default configuration,
/// blocking until the final mapping is ready.
pub fn run<M, R>(inputs: Vec<Record>, map: M, reduce: R) -> Result<Mapping, MrError>
where
    M: WorkerFn,
    R: WorkerFn,
{
    MapReduce::new(EngineConfig::default()).run(inputs, map, reduce)
}
