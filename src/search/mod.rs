//! Search lifecycle: from validated parameters to exactly one engine release.
//!
//! ## Modules
//!
//! - [`types`] - Parameters, statistics and found entries
//! - [`validate`] - Parameter rules checked before submission
//! - [`stats_box`] - Latest statistics snapshot shared across threads
//! - [`throttle`] - Coalesces progress into one in-flight delivery
//! - [`job`] - One engine invocation and its teardown
//! - [`orchestrator`] - Entry point used by presentation code

pub mod job;
pub mod orchestrator;
pub mod stats_box;
pub mod throttle;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use job::{CleanupTask, JobState, SearchJob};
pub use orchestrator::{EventSink, ProgressUpdate, SearchEvent, SearchOrchestrator};
pub use stats_box::StatsBox;
pub use throttle::ProgressThrottle;
pub use types::*;
pub use validate::{ValidationError, validate};

use crate::engine::EngineError;
use thiserror::Error;

/// Why a search could not be started
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("invalid search parameters: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Submission(#[from] EngineError),
}
