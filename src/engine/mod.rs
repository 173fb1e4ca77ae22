//! Boundary with the search engine.
//!
//! An engine runs searches on threads it owns and reports back through
//! [`EngineCallbacks`], from whichever thread happens to be doing the work.
//! Callers get an [`OperationHandle`] per submitted search and must hand it
//! back to [`SearchEngine::release`] exactly once.
//!
//! ## Modules
//!
//! - [`flags`] - Bit representation of search modes
//! - [`walk`] - Portable engine built on `ignore` + memory-mapped content scans

pub mod flags;
pub mod walk;

pub use flags::SearchFlags;
pub use walk::WalkEngine;

use crate::search::types::{FoundEntry, SearchStatistics};
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Opaque identifier of a running engine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationHandle(NonZeroU64);

impl OperationHandle {
    pub fn new(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    /// Rebuild a handle from its raw form; zero means "no operation"
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn raw(self) -> u64 {
        self.0.get()
    }
}

/// One search as the engine sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    pub path: PathBuf,
    pub pattern: String,
    pub search_string: String,
    pub flags: SearchFlags,
    pub max_file_size: u64,
}

/// Errors reported synchronously by an engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine refused to start the search
    #[error("search rejected: {0}")]
    Rejected(String),
    /// The handle does not belong to a live operation
    #[error("unknown search operation {0}")]
    UnknownOperation(u64),
    /// Tearing down the operation failed
    #[error("failed to release search operation: {0}")]
    Release(String),
}

/// Receiver of engine notifications.
///
/// Called from engine-owned threads. `done` and `error` are terminal and
/// mutually exclusive; no `progress` follows either of them.
pub trait EngineCallbacks: Send + Sync {
    fn found_path(&self, entry: FoundEntry);

    /// `fraction` is NaN while the amount of remaining work is unknown
    fn progress(&self, stats: &SearchStatistics, fraction: f64);

    fn done(&self, stats: &SearchStatistics);

    fn error(&self, message: &str);
}

/// A search backend
pub trait SearchEngine: Send + Sync {
    /// Start a search. Rejection is reported here, never through callbacks.
    fn submit(
        &self,
        request: EngineRequest,
        callbacks: Arc<dyn EngineCallbacks>,
    ) -> Result<OperationHandle, EngineError>;

    /// Stop the operation and free its resources.
    ///
    /// May block until the engine's worker threads have exited. Must be
    /// called exactly once for every handle returned by `submit`.
    fn release(&self, handle: OperationHandle) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_from_raw_zero_is_none() {
        assert_eq!(OperationHandle::from_raw(0), None);
        assert_eq!(OperationHandle::from_raw(42).map(|h| h.raw()), Some(42));
    }

    #[test]
    fn test_engine_error_messages() {
        assert_eq!(
            EngineError::Rejected("no such directory".into()).to_string(),
            "search rejected: no such directory"
        );
        assert_eq!(
            EngineError::UnknownOperation(7).to_string(),
            "unknown search operation 7"
        );
    }
}
