use std::sync::Arc;

use tokio::runtime::{self, Handle};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::collector::Collected;
use super::config::{EngineConfig, FailurePolicy};
use super::error::{MrError, Phase};
use super::phase::run_phase;
use super::{Emitter, MRApp, Mapping, Record, WorkerFn};

/// Sequences the map and reduce phases of one run.
pub struct Master {
    config: EngineConfig,
    cancel: CancellationToken,
    workers: Option<Handle>,
}

impl Master {
    pub fn new(config: EngineConfig) -> Self {
        Master { config, cancel: CancellationToken::new(), workers: None }
    }

    /// Spawns workers on `handle` instead of the runtime driving the master.
    pub fn with_worker_runtime(mut self, handle: Handle) -> Self {
        self.workers = Some(handle);
        self
    }

    /// Token that aborts the run when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run<M, R>(&self, inputs: Vec<Record>, map: M, reduce: R) -> Result<Mapping, MrError>
    where
        M: WorkerFn,
        R: WorkerFn,
    {
        self.run_shared(inputs, Arc::new(map), Arc::new(reduce)).await
    }

    /// Runs a named application's `map` and `reduce`.
    pub async fn run_app(&self, app: Arc<dyn MRApp>, inputs: Vec<Record>) -> Result<Mapping, MrError> {
        let (map, reduce) = app_fns(app);
        self.run(inputs, map, reduce).await
    }

    async fn run_shared<M, R>(&self, inputs: Vec<Record>, map: Arc<M>, reduce: Arc<R>) -> Result<Mapping, MrError>
    where
        M: WorkerFn + ?Sized,
        R: WorkerFn + ?Sized,
    {
        log::info!("running map phase over {} inputs", inputs.len());
        let intermediate = self.phase(Phase::Map, inputs, map).await?;

        let reduce_inputs = to_records(intermediate);
        log::info!("running reduce phase over {} keys", reduce_inputs.len());
        let output = self.phase(Phase::Reduce, reduce_inputs, reduce).await?;

        log::info!("map/reduce finished with {} keys", output.len());
        Ok(output)
    }

    async fn phase<F>(&self, phase: Phase, inputs: Vec<Record>, f: Arc<F>) -> Result<Mapping, MrError>
    where
        F: WorkerFn + ?Sized,
    {
        let timeout = self.config.phase_timeout();
        let workers = self.workers.as_ref();
        let Collected { mapping, faults } =
            run_phase(phase, inputs, f, workers, &self.cancel, timeout).await?;
        if faults.is_empty() {
            return Ok(mapping);
        }
        match self.config.failure_policy {
            FailurePolicy::Abort => Err(MrError::WorkerFailed { phase, faults }),
            FailurePolicy::BestEffort => {
                for fault in &faults {
                    log::warn!("{fault}");
                }
                log::warn!("{phase} phase: continuing past {} failed worker(s)", faults.len());
                Ok(mapping)
            }
        }
    }

    /// Starts the run on `handle` as a background task. The result arrives
    /// through the returned single-slot channel.
    pub fn start<M, R>(
        self,
        handle: &Handle,
        inputs: Vec<Record>,
        map: M,
        reduce: R,
    ) -> oneshot::Receiver<Result<Mapping, MrError>>
    where
        M: WorkerFn,
        R: WorkerFn,
    {
        let (result_tx, result_rx) = oneshot::channel();
        handle.spawn(async move {
            let result = self.run(inputs, map, reduce).await;
            if result_tx.send(result).is_err() {
                log::debug!("caller stopped waiting for the result");
            }
        });
        result_rx
    }
}

fn app_fns(app: Arc<dyn MRApp>) -> (impl WorkerFn, impl WorkerFn) {
    let (m, r) = (app.clone(), app);
    let map = move |input: Record, emit: Emitter| m.map(input, emit);
    let reduce = move |input: Record, emit: Emitter| r.reduce(input, emit);
    (map, reduce)
}

/// One record per distinct key, carrying all of that key's values.
pub fn to_records(mapping: Mapping) -> Vec<Record> {
    mapping
        .into_iter()
        .map(|(key, values)| Record { key, values })
        .collect()
}

/// Blocking entry point: the whole run looks like one synchronous call.
///
/// Each call owns two private runtimes: a multi-thread one for the workers and
/// a current-thread one, driven by the calling thread, for the master and its
/// collectors. A worker that blocks its thread cannot starve the phase
/// deadline. Must not be used from inside an async context; async callers use
/// [`Master`] directly.
pub struct MapReduce {
    config: EngineConfig,
    cancel: CancellationToken,
}

impl MapReduce {
    pub fn new(config: EngineConfig) -> Self {
        MapReduce { config, cancel: CancellationToken::new() }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn run<M, R>(&self, inputs: Vec<Record>, map: M, reduce: R) -> Result<Mapping, MrError>
    where
        M: WorkerFn,
        R: WorkerFn,
    {
        let workers = self.worker_runtime()?;
        let control = runtime::Builder::new_current_thread().enable_all().build()?;

        let master = Master {
            config: self.config.clone(),
            cancel: self.cancel.child_token(),
            workers: Some(workers.handle().clone()),
        };
        let result = master.start(control.handle(), inputs, map, reduce);
        let result = control.block_on(result);

        // a timed-out cohort may still hold blocked threads; don't wait for them
        workers.shutdown_background();
        result.map_err(|_| MrError::MasterLost)?
    }

    pub fn run_app(&self, app: Arc<dyn MRApp>, inputs: Vec<Record>) -> Result<Mapping, MrError> {
        let (map, reduce) = app_fns(app);
        self.run(inputs, map, reduce)
    }

    fn worker_runtime(&self) -> Result<runtime::Runtime, MrError> {
        let mut builder = runtime::Builder::new_multi_thread();
        if let Some(threads) = self.config.worker_threads {
            builder.worker_threads(threads.max(1));
        }
        Ok(builder.enable_all().thread_name("mapred-worker").build()?)
    }
}
