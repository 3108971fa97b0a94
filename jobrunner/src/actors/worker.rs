mod actor;
mod messages;

use crate::error::{JobError, Result};
use crate::events::JobStatus;
use crate::invocation::Invocation;
use crate::sink::OutputSink;
use crate::types::{JobId, Pid};
use actor::Actor;
use messages::WorkerMessage;
use std::{fs::File, io, os::fd::OwnedFd, process::Stdio, sync::Arc, time::Duration};
use tokio::{
    net::unix::pipe,
    process,
    sync::{mpsc, watch},
};

/// A handle to one running job.
///
/// The process and its output pipe are owned by a worker task; this handle
/// only queries and cancels. Clones refer to the same job. When the last clone
/// is dropped while the process is still alive, the process is killed.
#[derive(Clone)]
pub struct WorkerHandle {
    id: JobId,
    pid: Option<Pid>,
    sender: mpsc::UnboundedSender<WorkerMessage>,
    status_tx: Arc<watch::Sender<JobStatus>>,
    status_rx: watch::Receiver<JobStatus>,
}

impl WorkerHandle {
    pub(crate) fn spawn<S: OutputSink>(
        invocation: &Invocation,
        sink: S,
        drain_grace: Duration,
    ) -> Result<Self> {
        let spawn_err = |source: io::Error| JobError::Spawn {
            program: invocation.program.clone(),
            source,
        };

        // stdout and stderr share one pipe so lines arrive in the order written
        let (reader, writer) = io::pipe().map_err(spawn_err)?;
        let output = pipe::Receiver::from_file(File::from(OwnedFd::from(reader)))
            .map_err(spawn_err)?;
        let child = {
            let mut command = process::Command::new(&invocation.program);
            command
                .args(&invocation.args)
                .current_dir(&invocation.dir)
                .envs(invocation.envs.iter().cloned())
                .stdin(Stdio::null())
                .stdout(Stdio::from(writer.try_clone().map_err(spawn_err)?))
                .stderr(Stdio::from(writer));
            // dropping `command` closes our copies of the write end, so the
            // pipe reaches EOF once the child (and its children) let go of it
            command.spawn().map_err(spawn_err)?
        };

        let id = uuid::Uuid::new_v4();
        let pid = child.id();
        let (status_tx, status_rx) = watch::channel(JobStatus::Running);
        let status_tx = Arc::new(status_tx);
        let (sender, inbox) = mpsc::unbounded_channel();
        Actor::spawn(id, inbox, status_tx.clone(), sink, child, output, drain_grace);
        Ok(Self {
            id,
            pid,
            sender,
            status_tx,
            status_rx,
        })
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// OS process id, if the platform reported one at spawn time.
    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    pub fn status(&self) -> JobStatus {
        *self.status_rx.borrow()
    }

    /// True from launch until the process exits on its own or `cancel` is called.
    pub fn is_running(&self) -> bool {
        self.status().is_running()
    }

    /// Request termination of the process.
    ///
    /// Returns `false`, and does nothing, if the job was already stopping or
    /// finished. Output the process writes before it dies is still delivered.
    pub fn cancel(&self) -> bool {
        let requested = self.status_tx.send_if_modified(|status| {
            if status.is_running() {
                *status = JobStatus::Stopping;
                true
            } else {
                false
            }
        });
        if requested {
            let _ = self.sender.send(WorkerMessage::Cancel);
        }
        requested
    }

    /// Wait for the terminal status. Every output line has been handed to the
    /// sink by the time this returns.
    pub async fn wait(&self) -> JobStatus {
        let mut status_rx = self.status_rx.clone();
        loop {
            let status = *status_rx.borrow_and_update();
            if status.is_terminal() {
                return status;
            }
            if status_rx.changed().await.is_err() {
                return *status_rx.borrow();
            }
        }
    }

    /// A receiver that observes every status change, for callers that poll
    /// from their own event loop.
    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.status_rx.clone()
    }
}
