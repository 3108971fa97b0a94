use crate::actors::worker::WorkerHandle as JobHandle;
use crate::error::Result;
use crate::invocation::Invocation;
use crate::sink::OutputSink;
use crate::types::Envs;
use std::time::Duration;
use tracing::{info, warn};

/// How long to keep reading output after the process has exited, in case a
/// grandchild still holds the pipes open.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub drain_grace: Duration,
    /// Environment added to every job, before the invocation's own variables.
    pub envs: Envs,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            drain_grace: DEFAULT_DRAIN_GRACE,
            envs: Envs::new(),
        }
    }
}

/// Launches external commands, one at a time.
///
/// Must be used from within a tokio runtime: each job is driven by tasks
/// spawned on it, so the calling thread never blocks on process I/O.
#[derive(Default)]
pub struct JobRunner {
    config: RunnerConfig,
    current: Option<JobHandle>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            config,
            current: None,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Start `invocation`, handing each output line to `sink`.
    ///
    /// A program that cannot be started is reported here, synchronously, and
    /// `sink` is never called. Running two jobs at once on one runner is not
    /// prevented, only logged.
    pub fn launch<S: OutputSink>(&mut self, invocation: Invocation, sink: S) -> Result<JobHandle> {
        if let Some(previous) = self.current.as_ref().filter(|job| !job.status().is_terminal()) {
            warn!(job_id = %previous.id(), "launching while the previous job is still active");
        }

        let mut envs = self.config.envs.clone();
        envs.extend(invocation.envs.iter().cloned());
        let invocation = Invocation { envs, ..invocation };

        let job = match JobHandle::spawn(&invocation, sink, self.config.drain_grace) {
            Ok(job) => job,
            Err(e) => {
                warn!(program = %invocation.program, error = %e, "job failed to start");
                return Err(e);
            }
        };
        info!(
            job_id = %job.id(),
            pid = ?job.pid(),
            program = %invocation.program,
            args = ?invocation.args,
            dir = %invocation.dir.display(),
            "job started"
        );
        self.current = Some(job.clone());
        Ok(job)
    }

    /// The most recently launched job, finished or not.
    pub fn current(&self) -> Option<&JobHandle> {
        self.current.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.current.as_ref().map_or(false, JobHandle::is_running)
    }

    /// Cancel the current job, if any. See [`JobHandle::cancel`].
    pub fn cancel(&self) -> bool {
        self.current.as_ref().map_or(false, JobHandle::cancel)
    }
}
