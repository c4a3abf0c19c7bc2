//! Batch accounting.

use std::time::{Duration, Instant};

use crate::transfer::{FailReason, TransferOutcome};

/// Totals for one batch of transfers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files now present locally, including skipped ones.
    pub succeeded: usize,
    /// Files that could not be transferred, excluding cancellations.
    pub failed: usize,
    /// Files already present with the expected size.
    pub skipped: usize,
    /// Files interrupted by a stop request.
    pub cancelled: usize,
    /// Bytes written during this batch.
    pub bytes: u64,
    /// Wall time of the batch.
    pub elapsed: Duration,
}

impl BatchSummary {
    /// The `(succeeded, failed)` pair.
    #[must_use]
    pub const fn counts(&self) -> (usize, usize) {
        (self.succeeded, self.failed)
    }

    /// Files that reached a final outcome.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
    }

    /// Files actually transferred in this batch.
    #[must_use]
    pub const fn transferred(&self) -> usize {
        self.succeeded - self.skipped
    }

    /// Percentage of processed files that succeeded, if any were processed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> Option<f64> {
        let processed = self.processed();
        (processed > 0).then(|| self.succeeded as f64 / processed as f64 * 100.0)
    }

    /// Returns the average transfer speed in bytes per second.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn average_speed(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.bytes as f64 / secs) as u64
        } else {
            0
        }
    }
}

/// Accumulates a [`BatchSummary`] while a batch runs.
#[derive(Debug)]
pub struct BatchSummaryBuilder {
    summary: BatchSummary,
    start_time: Instant,
}

impl Default for BatchSummaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchSummaryBuilder {
    /// Starts the clock on a new batch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            summary: BatchSummary::default(),
            start_time: Instant::now(),
        }
    }

    /// Folds one transfer outcome into the totals.
    pub fn record(&mut self, outcome: &TransferOutcome) {
        match outcome {
            TransferOutcome::Success { bytes, .. } => {
                self.summary.succeeded += 1;
                self.summary.bytes = self.summary.bytes.saturating_add(*bytes);
            }
            TransferOutcome::Skipped => {
                self.summary.succeeded += 1;
                self.summary.skipped += 1;
            }
            TransferOutcome::Failed(FailReason::Cancelled) => self.summary.cancelled += 1,
            TransferOutcome::Failed(_) => self.summary.failed += 1,
        }
    }

    /// Totals recorded so far, with the elapsed time filled in.
    #[must_use]
    pub fn snapshot(&self) -> BatchSummary {
        BatchSummary {
            elapsed: self.start_time.elapsed(),
            ..self.summary.clone()
        }
    }

    /// Builds the final batch summary.
    #[must_use]
    pub fn build(self) -> BatchSummary {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::Strategy;

    #[test]
    fn batch_summary_default() {
        let summary = BatchSummary::default();
        assert_eq!(summary.counts(), (0, 0));
        assert_eq!(summary.processed(), 0);
        assert_eq!(summary.success_rate(), None);
    }

    #[test]
    fn batch_summary_average_speed_zero_elapsed() {
        let summary = BatchSummary {
            succeeded: 1,
            bytes: 1000,
            ..BatchSummary::default()
        };
        assert_eq!(summary.average_speed(), 0);
    }

    #[test]
    fn batch_summary_average_speed() {
        let summary = BatchSummary {
            succeeded: 1,
            bytes: 1000,
            elapsed: Duration::from_secs(2),
            ..BatchSummary::default()
        };
        assert_eq!(summary.average_speed(), 500);
    }

    #[test]
    fn builder_folds_outcomes() {
        let mut builder = BatchSummaryBuilder::new();
        builder.record(&TransferOutcome::Success {
            bytes: 500,
            strategy: Strategy::Stream,
        });
        builder.record(&TransferOutcome::Skipped);
        builder.record(&TransferOutcome::Failed(FailReason::Exhausted(Vec::new())));
        builder.record(&TransferOutcome::Failed(FailReason::Cancelled));

        let summary = builder.build();
        assert_eq!(summary.counts(), (2, 1));
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.transferred(), 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.bytes, 500);
        assert_eq!(summary.processed(), 4);
        assert_eq!(summary.success_rate(), Some(50.0));
    }

    #[test]
    fn byte_total_saturates() {
        let mut builder = BatchSummaryBuilder::new();
        for _ in 0..2 {
            builder.record(&TransferOutcome::Success {
                bytes: u64::MAX,
                strategy: Strategy::BulkRead,
            });
        }
        let summary = builder.build();
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.bytes, u64::MAX);
    }
}
