//! One engine invocation and its teardown.
//!
//! The handle returned by the engine lives in an atomic word (0 = none).
//! Every path that wants the operation gone - completion, failure, user
//! cancellation, drop of the owner - goes through [`SearchJob::cleanup`],
//! which swaps the word to 0. Only the caller that took a non-zero value
//! releases, so the engine sees exactly one release per handle no matter how
//! those paths interleave. Nothing on the callback side takes a lock.

use crate::engine::{
    EngineCallbacks, EngineRequest, OperationHandle, SearchEngine, SearchFlags,
};
use crate::search::SearchError;
use crate::search::stats_box::StatsBox;
use crate::search::throttle::ProgressThrottle;
use crate::search::types::{FoundEntry, SearchParameters, SearchStatistics};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JobState {
    /// Submitted, handle not stored yet
    Created = 0,
    /// Engine is running
    Active = 1,
    /// Engine reported done or error; cleanup pending
    Completing = 2,
    /// Cancelled by the owner; cleanup pending
    Cancelling = 3,
    /// Engine resources released (terminal)
    Disposed = 4,
}

impl JobState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => JobState::Created,
            1 => JobState::Active,
            2 => JobState::Completing,
            3 => JobState::Cancelling,
            _ => JobState::Disposed,
        }
    }

    fn can_become(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Created, Active)
                | (Created | Active, Completing)
                | (Created | Active, Cancelling)
                | (Completing | Cancelling, Disposed)
                | (Created, Disposed)
        )
    }

    /// Whether no more events can originate from this job
    pub fn is_finished(self) -> bool {
        !matches!(self, JobState::Created | JobState::Active)
    }
}

/// How a search ended, from the engine's point of view
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(SearchStatistics),
    Failed(String),
}

/// Receives the non-progress notifications of a job.
///
/// Progress goes through the job's [`ProgressThrottle`] instead.
pub trait JobListener: Send + Sync {
    fn found(&self, entry: FoundEntry);

    /// Called at most once per job
    fn finished(&self, outcome: JobOutcome);
}

/// What a job reports into, built by its owner
pub struct JobWiring {
    pub stats: Arc<StatsBox>,
    pub throttle: ProgressThrottle,
    pub listener: Arc<dyn JobListener>,
}

pub struct SearchJob {
    engine: Arc<dyn SearchEngine>,
    parameters: Arc<SearchParameters>,
    /// Raw operation handle; 0 once taken for release (or before submit returns)
    handle: AtomicU64,
    cleanup_requested: AtomicBool,
    state: AtomicU8,
    stats: Arc<StatsBox>,
    throttle: ProgressThrottle,
    listener: Arc<dyn JobListener>,
    disposed: Mutex<bool>,
    disposed_cv: Condvar,
}

impl SearchJob {
    /// Submit `parameters` to `engine`.
    ///
    /// Parameters are expected to be validated already. Engine rejection is
    /// returned here and leaves nothing behind.
    pub fn start(
        engine: Arc<dyn SearchEngine>,
        parameters: Arc<SearchParameters>,
        wiring: JobWiring,
    ) -> Result<Arc<Self>, SearchError> {
        let request = EngineRequest {
            path: parameters.path.clone(),
            pattern: parameters.pattern.clone(),
            search_string: parameters.search_string.clone(),
            flags: SearchFlags::from_parameters(&parameters),
            max_file_size: parameters.max_file_size,
        };

        let job = Arc::new(Self {
            engine,
            parameters,
            handle: AtomicU64::new(0),
            cleanup_requested: AtomicBool::new(false),
            state: AtomicU8::new(JobState::Created as u8),
            stats: wiring.stats,
            throttle: wiring.throttle,
            listener: wiring.listener,
            disposed: Mutex::new(false),
            disposed_cv: Condvar::new(),
        });

        log::debug!(
            "submitting search for {:?} in {} ({:?})",
            request.search_string,
            request.path.display(),
            request.flags
        );

        let callbacks: Arc<dyn EngineCallbacks> = Arc::new(JobCallbacks {
            job: Arc::clone(&job),
        });
        let handle = match job.engine.submit(request, callbacks) {
            Ok(handle) => handle,
            Err(e) => {
                log::debug!("search submission rejected: {}", e);
                job.transition(JobState::Disposed);
                job.mark_disposed();
                return Err(SearchError::Submission(e));
            }
        };

        job.handle.store(handle.raw(), Ordering::SeqCst);
        job.transition(JobState::Active);

        // A terminal callback or a cancel may have run before the handle was
        // stored; whoever sees both the handle and the request releases.
        if job.cleanup_requested.load(Ordering::SeqCst) {
            if let Some(task) = job.cleanup() {
                task.detach();
            }
        }

        Ok(job)
    }

    pub fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn parameters(&self) -> &SearchParameters {
        &self.parameters
    }

    /// Latest statistics published by the engine
    pub fn statistics(&self) -> SearchStatistics {
        self.stats.read()
    }

    pub fn is_cleanup_requested(&self) -> bool {
        self.cleanup_requested.load(Ordering::SeqCst)
    }

    /// Stop the search on behalf of the owner. Idempotent.
    pub fn cancel(self: &Arc<Self>) -> Option<CleanupTask> {
        if self.transition(JobState::Cancelling) {
            log::debug!("search cancelled");
        }
        self.cleanup()
    }

    /// Release the engine operation if nobody has yet.
    ///
    /// Returns the task running the (possibly blocking) release call, or
    /// `None` when there was nothing left to release.
    pub fn cleanup(self: &Arc<Self>) -> Option<CleanupTask> {
        self.cleanup_requested.store(true, Ordering::SeqCst);
        // An owner-initiated cleanup of a running job is a cancellation
        self.transition(JobState::Cancelling);

        let handle = OperationHandle::from_raw(self.handle.swap(0, Ordering::SeqCst))?;

        let job = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("fss-release".to_string())
            .spawn(move || job.release(handle));

        match spawned {
            Ok(thread) => Some(CleanupTask { thread }),
            Err(e) => {
                log::warn!("could not spawn release thread ({}), releasing inline", e);
                self.release(handle);
                None
            }
        }
    }

    /// Block until the engine operation has been released, up to `timeout`
    pub fn wait_disposed(&self, timeout: Duration) -> bool {
        let guard = match self.disposed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let result = self
            .disposed_cv
            .wait_timeout_while(guard, timeout, |disposed| !*disposed);
        match result {
            Ok((disposed, _)) => *disposed,
            Err(poisoned) => *poisoned.into_inner().0,
        }
    }

    fn release(&self, handle: OperationHandle) {
        log::debug!("releasing search operation {}", handle.raw());
        if let Err(e) = self.engine.release(handle) {
            log::warn!("{}", e);
        }
        self.transition(JobState::Disposed);
        self.mark_disposed();
    }

    fn mark_disposed(&self) {
        let mut disposed = match self.disposed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *disposed = true;
        self.disposed_cv.notify_all();
    }

    fn transition(&self, next: JobState) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if !JobState::from_u8(current).can_become(next) {
                return false;
            }
            match self.state.compare_exchange(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    fn finish(self: &Arc<Self>, outcome: JobOutcome) {
        if self.transition(JobState::Completing) {
            self.listener.finished(outcome);
        }
        if let Some(task) = self.cleanup() {
            task.detach();
        }
    }
}

impl SearchJob {
    pub fn on_found(&self, entry: FoundEntry) {
        if !self.state().is_finished() {
            self.listener.found(entry);
        }
    }

    /// Publish `stats` and offer `fraction` to the throttle
    pub fn on_progress(&self, stats: &SearchStatistics, fraction: f64) {
        if self.state().is_finished() {
            return;
        }
        self.stats.publish(*stats);
        self.throttle.report(fraction);
    }

    pub fn on_done(self: &Arc<Self>, stats: &SearchStatistics) {
        self.stats.publish(*stats);
        self.finish(JobOutcome::Completed(*stats));
    }

    pub fn on_error(self: &Arc<Self>, message: &str) {
        log::debug!("search failed: {}", message);
        self.finish(JobOutcome::Failed(message.to_string()));
    }
}

/// What the engine holds on to. Keeps the job alive until the operation is
/// released, which is when the engine drops its callbacks.
struct JobCallbacks {
    job: Arc<SearchJob>,
}

impl EngineCallbacks for JobCallbacks {
    fn found_path(&self, entry: FoundEntry) {
        self.job.on_found(entry);
    }

    fn progress(&self, stats: &SearchStatistics, fraction: f64) {
        self.job.on_progress(stats, fraction);
    }

    fn done(&self, stats: &SearchStatistics) {
        self.job.on_done(stats);
    }

    fn error(&self, message: &str) {
        self.job.on_error(message);
    }
}

impl fmt::Debug for SearchJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchJob")
            .field("state", &self.state())
            .field("handle", &self.handle.load(Ordering::Relaxed))
            .field("cleanup_requested", &self.is_cleanup_requested())
            .finish()
    }
}

/// Handle to an in-progress release of an engine operation
pub struct CleanupTask {
    thread: JoinHandle<()>,
}

impl CleanupTask {
    /// Block until the release call has returned
    pub fn wait(self) {
        if self.thread.join().is_err() {
            log::warn!("release thread panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Let the release finish in the background
    pub fn detach(self) {
        drop(self.thread);
    }
}

impl fmt::Debug for CleanupTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupTask")
            .field("finished", &self.is_finished())
            .finish()
    }
}
