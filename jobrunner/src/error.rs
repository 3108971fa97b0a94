use std::{io, path::PathBuf, result};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    /// The executable could not be found or started. No job exists.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("job exited with code {0}")]
    RuntimeExit(i32),
    /// The job ended without a usable exit code: its output stream failed,
    /// or it was killed by a signal the runner did not send.
    #[error("job ended without an exit code")]
    Stream,
    #[error("job was terminated")]
    Terminated,
    /// The status was read before the job reached its end.
    #[error("job has not finished")]
    Unfinished,
    #[error("failed to encode job config: {0}")]
    ConfigEncode(#[from] serde_json::Error),
    #[error("failed to write job config to {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl JobError {
    /// True when a spawn failed because the executable does not exist.
    pub fn is_program_missing(&self) -> bool {
        matches!(self, JobError::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

pub type Result<T> = result::Result<T, JobError>;
