use crate::error::{JobError, Result};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    /// Termination was requested but the process has not been reaped yet.
    Stopping,
    /// The process exited on its own. `code` is `None` when the OS reported
    /// no exit code or the output stream failed.
    Completed { code: Option<i32> },
    /// The process was stopped by `cancel`.
    Terminated,
}

impl JobStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Terminated)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed { code: Some(0) })
    }

    /// Map a status onto the job error taxonomy. A job that has not reached
    /// its terminal status yet is `Err(JobError::Unfinished)`.
    pub fn into_result(self) -> Result<()> {
        match self {
            JobStatus::Completed { code: Some(0) } => Ok(()),
            JobStatus::Completed { code: Some(code) } => Err(JobError::RuntimeExit(code)),
            JobStatus::Completed { code: None } => Err(JobError::Stream),
            JobStatus::Terminated => Err(JobError::Terminated),
            JobStatus::Running | JobStatus::Stopping => Err(JobError::Unfinished),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => write!(f, "running"),
            JobStatus::Stopping => write!(f, "stopping"),
            JobStatus::Completed { code: Some(code) } => write!(f, "completed with code {}", code),
            JobStatus::Completed { code: None } => write!(f, "completed without an exit code"),
            JobStatus::Terminated => write!(f, "terminated"),
        }
    }
}

/// One line of the child's combined stdout and stderr, numbered in the order
/// it was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    pub seq: u64,
    pub text: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_a_clean_exit_is_ok() {
        assert!(JobStatus::Completed { code: Some(0) }.into_result().is_ok());
        assert!(matches!(
            JobStatus::Completed { code: Some(2) }.into_result(),
            Err(JobError::RuntimeExit(2))
        ));
        assert!(matches!(
            JobStatus::Completed { code: None }.into_result(),
            Err(JobError::Stream)
        ));
        assert!(matches!(
            JobStatus::Terminated.into_result(),
            Err(JobError::Terminated)
        ));
    }

    #[test]
    fn unfinished_jobs_are_not_ok() {
        for status in [JobStatus::Running, JobStatus::Stopping] {
            assert!(!status.is_terminal());
            assert!(matches!(status.into_result(), Err(JobError::Unfinished)));
        }
    }
}
