use crate::events::LogLine;
use tokio::sync::mpsc;

/// Receives the output lines of one job, in order.
///
/// A sink is called from the job's worker task, never from the caller's
/// thread. Single-threaded callers (UI loops) should use a [`ChannelSink`] and
/// drain the receiving end from their own loop.
pub trait OutputSink: Send + 'static {
    fn deliver(&mut self, line: LogLine);
}

impl<F> OutputSink for F
where
    F: FnMut(LogLine) + Send + 'static,
{
    fn deliver(&mut self, line: LogLine) {
        self(line)
    }
}

/// Forwards lines into an unbounded channel.
///
/// The receiver yields `None` once the job has reached its terminal status and
/// the worker has released the sink.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<LogLine>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LogLine>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl From<mpsc::UnboundedSender<LogLine>> for ChannelSink {
    fn from(sender: mpsc::UnboundedSender<LogLine>) -> Self {
        Self { sender }
    }
}

impl OutputSink for ChannelSink {
    fn deliver(&mut self, line: LogLine) {
        // the receiver may have been dropped; the job keeps running regardless
        let _ = self.sender.send(line);
    }
}
