//! Refresh module - Jobs, retry policy and run metrics.

mod circuit_state;
mod job;
mod job_status;
mod retry_policy;
mod run_metrics;

pub use circuit_state::CircuitState;
pub use job::RefreshJob;
pub use job_status::JobStatus;
pub use retry_policy::RetryPolicy;
pub use run_metrics::{ProductOutcome, RunMetrics};
