use super::messages::WorkerMessage;
use crate::events::{JobStatus, LogLine};
use crate::lines::LineReader;
use crate::sink::OutputSink;
use crate::types::JobId;

use futures::future::FutureExt;
use std::{io, process::ExitStatus, sync::Arc, time::Duration};
use tokio::{
    io::AsyncRead,
    process::Child,
    select,
    sync::{mpsc, oneshot, watch},
    time::{self, Instant},
};
use tracing::{debug, info, warn};

pub struct Actor<S> {
    job_id: JobId,
    inbox: mpsc::UnboundedReceiver<WorkerMessage>,
    kill_tx: Option<oneshot::Sender<()>>,
    status_tx: Arc<watch::Sender<JobStatus>>,
    sink: S,
    next_seq: u64,
    drain_grace: Duration,
}

impl<S: OutputSink> Actor<S> {
    /// Drive `child` to its end, feeding every line of `output` to `sink`.
    pub fn spawn<R>(
        job_id: JobId,
        inbox: mpsc::UnboundedReceiver<WorkerMessage>,
        status_tx: Arc<watch::Sender<JobStatus>>,
        sink: S,
        child: Child,
        output: R,
        drain_grace: Duration,
    ) where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(async move {
            let actor = Self {
                job_id,
                inbox,
                kill_tx: Some(kill_tx),
                status_tx,
                sink,
                next_seq: 0,
                drain_grace,
            };
            actor.run(kill_rx, child, output).await;
        });
    }

    async fn run<R>(mut self, kill_rx: oneshot::Receiver<()>, mut child: Child, output: R)
    where
        R: AsyncRead + Unpin,
    {
        let (child_exit_tx, child_exit_rx) = oneshot::channel();
        let mut kill_rx = kill_rx.fuse();
        let job_id = self.job_id;

        // reap the child, killing it first if asked to
        tokio::spawn(async move {
            loop {
                select! {
                    Ok(()) = &mut kill_rx => {
                        if let Err(e) = child.start_kill() {
                            warn!(%job_id, error = %e, "failed to kill job process");
                        }
                    }
                    exit_status = child.wait() => {
                        let _ = child_exit_tx.send(exit_status);
                        break;
                    }
                }
            }
        });

        self.handle_messages(LineReader::new(output), child_exit_rx)
            .await;
    }

    async fn handle_messages<R>(
        &mut self,
        mut output: LineReader<R>,
        child_exit_rx: oneshot::Receiver<io::Result<ExitStatus>>,
    ) where
        R: AsyncRead + Unpin,
    {
        let mut child_exit_rx = child_exit_rx.fuse();
        let drain = time::sleep(self.drain_grace);
        tokio::pin!(drain);

        let mut inbox_open = true;
        let mut output_open = true;
        let mut stream_failed = false;
        // Some(code) once the child has been reaped
        let mut exit: Option<Option<i32>> = None;
        let mut cancelled_before_exit = false;

        loop {
            if exit.is_some() && !output_open {
                break;
            }
            // Branches are polled in order: the drain timer only wins when
            // reading the pipe would block.
            select! {
                biased;
                maybe_msg = self.inbox.recv(), if inbox_open => {
                    match maybe_msg {
                        Some(WorkerMessage::Cancel) => self.kill("cancel requested"),
                        None => {
                            // every handle dropped, nobody can observe the job anymore
                            inbox_open = false;
                            if exit.is_none() {
                                self.kill("job handle dropped");
                            }
                        }
                    }
                }
                next = output.next_line(), if output_open => {
                    match next {
                        Ok(Some(text)) => self.deliver(text),
                        Ok(None) => output_open = false,
                        Err(error) => {
                            warn!(job_id = %self.job_id, %error, "reading job output failed");
                            // an undrained pipe can block the child forever
                            stream_failed = true;
                            output_open = false;
                            self.kill("output stream failed");
                        }
                    }
                }
                exit_status = &mut child_exit_rx, if exit.is_none() => {
                    let code = match exit_status {
                        Ok(Ok(status)) => status.code(),
                        Ok(Err(e)) => {
                            warn!(job_id = %self.job_id, error = %e, "waiting on job process failed");
                            None
                        }
                        Err(_) => None,
                    };
                    debug!(job_id = %self.job_id, ?code, "job process exited");
                    cancelled_before_exit = *self.status_tx.borrow() == JobStatus::Stopping;
                    exit = Some(code);
                    drain.as_mut().reset(Instant::now() + self.drain_grace);
                }
                _ = &mut drain, if exit.is_some() && output_open => {
                    debug!(job_id = %self.job_id, "job output still open after exit, no longer draining");
                    break;
                }
            }
        }

        let code = if stream_failed { None } else { exit.flatten() };
        let status = if cancelled_before_exit {
            JobStatus::Terminated
        } else {
            JobStatus::Completed { code }
        };
        self.status_tx.send_replace(status);
        info!(job_id = %self.job_id, %status, lines = self.next_seq, "job finished");
    }

    fn deliver(&mut self, text: String) {
        let line = LogLine {
            seq: self.next_seq,
            text,
        };
        self.next_seq += 1;
        self.sink.deliver(line);
    }

    fn kill(&mut self, reason: &str) {
        if let Some(kill_tx) = self.kill_tx.take() {
            debug!(job_id = %self.job_id, reason, "killing job process");
            let _ = kill_tx.send(());
        }
    }
}
