//! Bounded FIFO conduit between producers and the block assembler.
//!
//! Any number of [`IntakeHandle`] clones may submit concurrently; exactly one
//! [`EntryStream`] drains them. Order of dequeue equals order of enqueue
//! across all producers, and a full conduit suspends the submitting producer
//! until the assembler catches up.

use std::sync::atomic::{AtomicBool, Ordering};

use seal_types::Entry;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::IntakeError;

enum Slot {
    Entry(Entry),
    /// Unblocks a waiting consumer so it can look at its cancel flag.
    Wake,
}

/// Create a conduit holding at most `capacity` pending entries.
///
/// # Panics
///
/// Panics if `capacity` is zero; [`crate::NodeConfig::validate`] rejects that.
pub fn channel(capacity: usize) -> (IntakeHandle, EntryStream) {
    let (tx, rx) = mpsc::channel(capacity);
    (IntakeHandle { tx }, EntryStream { rx })
}

/// Producer side of the intake conduit.
#[derive(Clone, Debug)]
pub struct IntakeHandle {
    tx: mpsc::Sender<Slot>,
}

impl IntakeHandle {
    /// Enqueue an entry, waiting while the conduit is full.
    pub async fn submit(&self, entry: Entry) -> Result<(), IntakeError> {
        if entry.has_line_break() {
            return Err(IntakeError::LineBreak);
        }
        let len = entry.len();
        self.tx
            .send(Slot::Entry(entry))
            .await
            .map_err(|_| IntakeError::Closed)?;
        debug!(len, "entry accepted");
        Ok(())
    }

    /// Blocking form of [`IntakeHandle::submit`] for producers outside an
    /// async runtime. Must not be called from within one.
    pub fn blocking_submit(&self, entry: Entry) -> Result<(), IntakeError> {
        if entry.has_line_break() {
            return Err(IntakeError::LineBreak);
        }
        self.tx
            .blocking_send(Slot::Entry(entry))
            .map_err(|_| IntakeError::Closed)
    }

    /// Returns `true` once the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots in the conduit right now.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }

    /// A waker for the consumer that does not keep the conduit open.
    pub(crate) fn waker(&self) -> StreamWaker {
        StreamWaker(self.tx.downgrade())
    }
}

/// Interrupts an [`EntryStream`] blocked waiting for entries.
#[derive(Clone, Debug)]
pub(crate) struct StreamWaker(mpsc::WeakSender<Slot>);

impl StreamWaker {
    /// A full conduit is not waiting, so a failed `try_send` is harmless.
    pub(crate) fn wake(&self) {
        if let Some(tx) = self.0.upgrade() {
            let _ = tx.try_send(Slot::Wake);
        }
    }
}

/// Consumer side of the intake conduit, owned by the block assembler.
#[derive(Debug)]
pub struct EntryStream {
    rx: mpsc::Receiver<Slot>,
}

/// Result of draining a batch from the stream.
#[derive(Debug, PartialEq, Eq)]
pub enum Batch {
    /// Exactly the requested number of entries, in arrival order.
    Full(Vec<Entry>),
    /// Every producer was dropped first; holds whatever had arrived.
    Closed(Vec<Entry>),
    /// The cancel flag was raised first; holds whatever had arrived.
    Cancelled(Vec<Entry>),
}

impl EntryStream {
    /// Dequeue the next entry, blocking the current thread until one arrives.
    ///
    /// Returns `None` once every producer handle has been dropped and the
    /// conduit is empty. Must not be called from within an async runtime.
    pub fn take(&mut self) -> Option<Entry> {
        loop {
            match self.rx.blocking_recv()? {
                Slot::Entry(entry) => return Some(entry),
                Slot::Wake => continue,
            }
        }
    }

    /// Dequeue exactly `n` entries in arrival order, giving up early once
    /// `cancel` is set.
    pub fn take_batch(&mut self, n: usize, cancel: &AtomicBool) -> Batch {
        let mut entries = Vec::with_capacity(n);
        while entries.len() < n {
            if cancel.load(Ordering::Relaxed) {
                return Batch::Cancelled(entries);
            }
            match self.rx.blocking_recv() {
                Some(Slot::Entry(entry)) => entries.push(entry),
                Some(Slot::Wake) => {}
                None => return Batch::Closed(entries),
            }
        }
        Batch::Full(entries)
    }
}
