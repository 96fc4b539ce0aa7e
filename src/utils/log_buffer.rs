//! Bounded, ordered buffer for transcoder log output

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;

/// Default number of lines kept per run
pub const DEFAULT_LOG_CAPACITY: usize = 10_000;

const SUBSCRIBER_BACKLOG: usize = 256;

/// Collects log lines in arrival order.
///
/// Once `capacity` lines are held the oldest line is dropped for every new
/// one and the drop is counted. Live observers get each line through
/// [`LogBuffer::subscribe`].
#[derive(Debug)]
pub struct LogBuffer {
    lines: Mutex<Inner>,
    capacity: usize,
    sender: broadcast::Sender<String>,
}

#[derive(Debug, Default)]
struct Inner {
    lines: VecDeque<String>,
    dropped: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIBER_BACKLOG);
        Self {
            lines: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
            sender,
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append one line
    pub fn push(&self, line: impl Into<String>) {
        let line = line.into();
        {
            let mut inner = self.inner();
            if inner.lines.len() == self.capacity {
                inner.lines.pop_front();
                inner.dropped += 1;
            }
            inner.lines.push_back(line.clone());
        }
        // No receivers is fine
        let _ = self.sender.send(line);
    }

    /// Copy of the buffered lines
    pub fn snapshot(&self) -> Vec<String> {
        self.inner().lines.iter().cloned().collect()
    }

    /// Take all buffered lines, leaving the buffer empty
    pub fn drain(&self) -> Vec<String> {
        self.inner().lines.drain(..).collect()
    }

    /// Forget all lines and the drop count, ready for a new run
    pub fn clear(&self) {
        let mut inner = self.inner();
        inner.lines.clear();
        inner.dropped = 0;
    }

    /// Receive lines pushed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    /// Lines discarded because the buffer was full
    pub fn dropped(&self) -> usize {
        self.inner().dropped
    }

    pub fn len(&self) -> usize {
        self.inner().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
