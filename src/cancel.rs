//! Cooperative cancellation and progress reporting shared by every stage.

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

/// A single progress update pushed to the registered sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Units of work completed so far.
    pub current: u64,
    /// Total units of work, or 0 when unknown.
    pub total: u64,
    /// Human-readable description of the current step.
    pub message: String,
}

/// Receives progress events.
///
/// Called synchronously from the engine, so implementations must return
/// quickly and must not panic.
pub trait ProgressSink: Send + Sync {
    /// Called with each progress update.
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event);
    }
}

/// A null sink that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[derive(Default)]
struct Inner {
    token: Mutex<CancellationToken>,
    sink: Mutex<Option<Arc<dyn ProgressSink>>>,
}

/// Shared stop flag plus an optional progress sink.
///
/// Clones share state. `signal_stop` may be called from any thread or task,
/// including a signal handler task; the engine polls `is_stopped` at loop heads
/// and chunk boundaries.
#[derive(Clone, Default)]
pub struct StopToken {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for StopToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopToken")
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

impl StopToken {
    /// Creates a token in the running state with no sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that forwards progress to `sink`.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn ProgressSink>) -> Self {
        let token = Self::new();
        token.set_sink(Some(sink));
        token
    }

    fn current(&self) -> CancellationToken {
        self.inner
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests that the current operation stop. Idempotent, never blocks
    /// beyond a short internal lock.
    pub fn signal_stop(&self) {
        let token = self.current();
        if !token.is_cancelled() {
            log::info!("Stop requested");
        }
        token.cancel();
    }

    /// Returns true once a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.current().is_cancelled()
    }

    /// Clears the stop flag for a new logical operation.
    ///
    /// Must only be called while no operation is in flight.
    pub fn reset(&self) {
        *self
            .inner
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = CancellationToken::new();
    }

    /// Resolves once a stop is requested for the current operation.
    pub async fn stopped(&self) {
        self.current().cancelled_owned().await;
    }

    /// Registers (or clears) the progress sink.
    pub fn set_sink(&self, sink: Option<Arc<dyn ProgressSink>>) {
        *self
            .inner
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = sink;
    }

    /// Forwards a progress event to the registered sink, if any.
    pub fn report_progress(&self, current: u64, total: u64, message: impl Into<String>) {
        let sink = self
            .inner
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(sink) = sink {
            sink.on_progress(&ProgressEvent {
                current,
                total,
                message: message.into(),
            });
        }
    }
}
