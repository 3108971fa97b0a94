//! Launch, monitor and cancel one long-running external command without
//! blocking the caller.
//!
//! ```no_run
//! # async fn demo() -> jobrunner::Result<()> {
//! use jobrunner::{ChannelSink, Invocation, JobConfig, JobRunner};
//!
//! let config = JobConfig::new().with("duration", "6s").with("resolution", "720p");
//! let invocation = Invocation::new("node")
//!     .arg("batch-process.js")
//!     .config_flags(&config);
//!
//! let mut runner = JobRunner::new();
//! let (sink, mut lines) = ChannelSink::new();
//! let job = runner.launch(invocation, sink)?;
//! while let Some(line) = lines.recv().await {
//!     println!("{}", line);
//! }
//! job.wait().await.into_result()
//! # }
//! ```

mod actors;
pub mod config;
pub mod error;
mod events;
pub mod invocation;
mod lines;
mod runner;
pub mod sink;
pub mod types;

// re-export the worker handle as the job handle, it is all a caller ever holds of a job.
pub use actors::worker::WorkerHandle as JobHandle;
pub use config::{ConfigFile, ConfigValue, JobConfig};
pub use error::{JobError, Result};
pub use events::{JobStatus, LogLine};
pub use invocation::Invocation;
pub use runner::{JobRunner, RunnerConfig, DEFAULT_DRAIN_GRACE};
pub use sink::{ChannelSink, OutputSink};
