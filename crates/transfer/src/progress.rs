use std::sync::atomic::{AtomicU64, Ordering};

use pushdeck_protocol::ProgressEvent;

/// Callback invoked with each cumulative progress event.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Folds heterogeneous per-unit progress into one cumulative event stream.
///
/// `total` is a snapshot taken once before work begins. Committed bytes
/// only grow, and the reported value is the running maximum of everything
/// observed, so the stream is non-decreasing even when a unit's partial
/// progress (compression output, for instance) restarts from zero.
/// Percentages are clamped to 100.
pub struct ProgressAggregator {
    total: u64,
    committed: AtomicU64,
    reported: AtomicU64,
    callback: ProgressCallback,
}

impl ProgressAggregator {
    /// Creates an aggregator for a fixed `total` byte budget.
    pub fn new(total: u64, callback: ProgressCallback) -> Self {
        Self {
            total,
            committed: AtomicU64::new(0),
            reported: AtomicU64::new(0),
            callback,
        }
    }

    /// An aggregator that discards its events.
    pub fn silent(total: u64) -> Self {
        Self::new(total, Box::new(|_| {}))
    }

    /// The byte budget this aggregator reports against.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Bytes committed by completed work (chunks written, files finished).
    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::Acquire)
    }

    /// Highest byte count reported so far.
    pub fn reported(&self) -> u64 {
        self.reported.load(Ordering::Acquire)
    }

    /// Commits `bytes` of finished work and reports the new cumulative value.
    ///
    /// Safe to call from concurrent transfers.
    pub fn advance(&self, bytes: u64) -> ProgressEvent {
        let committed = self.committed.fetch_add(bytes, Ordering::AcqRel) + bytes;
        self.report(committed)
    }

    /// Reports uncommitted in-flight progress on top of the committed bytes.
    ///
    /// Used for work whose byte count is not final, such as archive output
    /// while packaging is still running.
    pub fn observe_partial(&self, in_flight: u64) -> ProgressEvent {
        self.report(self.committed().saturating_add(in_flight))
    }

    /// Marks the work complete and returns the terminal event
    /// (`total/total`, 100%).
    ///
    /// The event is not passed to the callback; the caller delivers it so
    /// the final event can be sent reliably.
    pub fn finish(&self) -> ProgressEvent {
        self.reported.fetch_max(self.total, Ordering::AcqRel);
        ProgressEvent::complete(self.total)
    }

    /// Current state without emitting.
    pub fn snapshot(&self) -> ProgressEvent {
        ProgressEvent::new(self.reported(), self.total)
    }

    fn report(&self, candidate: u64) -> ProgressEvent {
        let previous = self.reported.fetch_max(candidate, Ordering::AcqRel);
        let event = ProgressEvent::new(previous.max(candidate), self.total);
        (self.callback)(event);
        event
    }
}
