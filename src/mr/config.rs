use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// What the master does with a phase in which some workers faulted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Drain the cohort, then fail the run with every fault seen.
    #[default]
    Abort,
    /// Log the faults and carry on with whatever the cohort emitted.
    BestEffort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest a phase waits for its cohort to finish (0 = no limit).
    ///
    /// Only enforced when the collector cannot be starved by its workers: the
    /// blocking facade always runs them on separate runtimes, async callers of
    /// `Master` get the same with `Master::with_worker_runtime`.
    pub phase_timeout_ms: u64,
    pub failure_policy: FailurePolicy,
    /// Runtime threads used by the blocking facade.
    pub worker_threads: Option<usize>,
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn phase_timeout(&self) -> Option<Duration> {
        match self.phase_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Rounds up to whole milliseconds; a zero `timeout` removes the limit.
    pub fn with_phase_timeout(mut self, timeout: Duration) -> Self {
        let ms = timeout.as_micros().div_ceil(1000);
        self.phase_timeout_ms = u64::try_from(ms).unwrap_or(u64::MAX);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"failure_policy": "best_effort"}"#).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::BestEffort);
        assert_eq!(config.phase_timeout(), None);
        assert_eq!(config.worker_threads, None);
    }

    #[test]
    fn phase_timeout_rounds_up_to_milliseconds() {
        let config = EngineConfig::default().with_phase_timeout(Duration::from_micros(300));
        assert_eq!(config.phase_timeout(), Some(Duration::from_millis(1)));

        let config = EngineConfig::default().with_phase_timeout(Duration::from_micros(2_001));
        assert_eq!(config.phase_timeout_ms, 3);

        let config = EngineConfig::default().with_phase_timeout(Duration::ZERO);
        assert_eq!(config.phase_timeout(), None);
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"phase_timeout_ms": 250, "worker_threads": 2}}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.phase_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.worker_threads, Some(2));
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn load_reports_bad_policy() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"failure_policy": "retry"}}"#).unwrap();

        let err = EngineConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }
}
