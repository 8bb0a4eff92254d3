//! Aggregate metrics for one refresh run.

use serde::{Deserialize, Serialize};

/// Terminal outcome of one product within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductOutcome {
    Success,
    Failure,
    Skipped,
}

/// Counters reported back to the trigger caller.
///
/// `processed` always equals `success + failure + skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub processed: u32,
    pub success: u32,
    pub failure: u32,
    pub skipped: u32,
    pub duration_ms: u64,
    /// Products selected but not started before the run deadline.
    #[serde(skip)]
    pub deferred: u32,
}

impl RunMetrics {
    pub fn record(&mut self, outcome: ProductOutcome) {
        self.processed += 1;
        match outcome {
            ProductOutcome::Success => self.success += 1,
            ProductOutcome::Failure => self.failure += 1,
            ProductOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn defer(&mut self, count: u32) {
        self.deferred += count;
    }
}
