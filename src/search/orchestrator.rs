//! Entry point used by presentation code.
//!
//! Validates parameters, starts a [`SearchJob`] and turns its callbacks into
//! [`SearchEvent`]s. Cancelling closes the event gate before asking the job to
//! clean up, so the only event that can still reach the sink afterwards is one
//! whose delivery had already started.

use crate::engine::SearchEngine;
use crate::search::job::{CleanupTask, JobListener, JobOutcome, JobState, JobWiring, SearchJob};
use crate::search::stats_box::StatsBox;
use crate::search::throttle::{InFlight, ProgressThrottle};
use crate::search::types::{FoundEntry, SearchParameters, SearchStatistics};
use crate::search::validate::validate;
use crate::search::SearchError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

/// Notifications raised for a running search
#[derive(Debug)]
pub enum SearchEvent {
    FoundItem(FoundEntry),
    ProgressChanged(ProgressUpdate),
    Completed(SearchStatistics),
    Failed(String),
}

/// Coalesced progress notification.
///
/// While an update is alive no newer one is produced; drop it once it has
/// been applied.
#[derive(Debug)]
pub struct ProgressUpdate {
    /// Latest statistics at the time of delivery
    pub stats: SearchStatistics,
    /// Fraction of work done, `None` while it cannot be estimated
    pub fraction: Option<f64>,
    _in_flight: InFlight,
}

/// Consumer of search events. Called from engine threads.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: SearchEvent);
}

impl EventSink for Sender<SearchEvent> {
    fn deliver(&self, event: SearchEvent) {
        // A closed receiver means the consumer is gone; nothing to do
        let _ = self.send(event);
    }
}

struct EventRelay {
    sink: Arc<dyn EventSink>,
    closing: Arc<AtomicBool>,
}

impl EventRelay {
    fn is_open(&self) -> bool {
        !self.closing.load(Ordering::Acquire)
    }

    fn progress(&self, stats: SearchStatistics, fraction: f64, in_flight: InFlight) {
        if !self.is_open() {
            return;
        }
        self.sink.deliver(SearchEvent::ProgressChanged(ProgressUpdate {
            stats,
            fraction: (!fraction.is_nan()).then_some(fraction),
            _in_flight: in_flight,
        }));
    }
}

impl JobListener for EventRelay {
    fn found(&self, entry: FoundEntry) {
        if self.is_open() {
            self.sink.deliver(SearchEvent::FoundItem(entry));
        }
    }

    fn finished(&self, outcome: JobOutcome) {
        if !self.is_open() {
            return;
        }
        let event = match outcome {
            JobOutcome::Completed(stats) => SearchEvent::Completed(stats),
            JobOutcome::Failed(message) => SearchEvent::Failed(message),
        };
        self.sink.deliver(event);
    }
}

struct ActiveSearch {
    job: Arc<SearchJob>,
    closing: Arc<AtomicBool>,
}

pub struct SearchOrchestrator {
    engine: Arc<dyn SearchEngine>,
    current: Mutex<Option<ActiveSearch>>,
}

impl SearchOrchestrator {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self {
            engine,
            current: Mutex::new(None),
        }
    }

    /// Validate and start a search whose events go to `sink`.
    ///
    /// A search already owned by this orchestrator is cancelled first.
    pub fn submit(
        &self,
        parameters: SearchParameters,
        sink: Arc<dyn EventSink>,
    ) -> Result<Arc<SearchJob>, SearchError> {
        validate(&parameters)?;

        if let Some(task) = self.cancel() {
            task.detach();
        }

        let stats = Arc::new(StatsBox::new());
        let closing = Arc::new(AtomicBool::new(false));
        let relay = Arc::new(EventRelay {
            sink,
            closing: Arc::clone(&closing),
        });

        let throttle = {
            let relay = Arc::clone(&relay);
            let stats = Arc::clone(&stats);
            ProgressThrottle::new(move |fraction, in_flight| {
                relay.progress(stats.read(), fraction, in_flight)
            })
        };

        let wiring = JobWiring {
            stats,
            throttle,
            listener: relay,
        };
        let job = SearchJob::start(Arc::clone(&self.engine), Arc::new(parameters), wiring)?;

        *self.lock_current() = Some(ActiveSearch {
            job: Arc::clone(&job),
            closing,
        });
        Ok(job)
    }

    /// Stop the current search. Safe to call any number of times, before a
    /// search was submitted, and concurrently with its completion.
    pub fn cancel(&self) -> Option<CleanupTask> {
        let job = {
            let current = self.lock_current();
            let active = current.as_ref()?;
            active.closing.store(true, Ordering::Release);
            Arc::clone(&active.job)
        };
        // Release may run inline; keep the slot unlocked meanwhile
        job.cancel()
    }

    /// Same as [`cancel`](Self::cancel); named for window-close call sites
    pub fn dispose(&self) -> Option<CleanupTask> {
        self.cancel()
    }

    pub fn job(&self) -> Option<Arc<SearchJob>> {
        self.lock_current().as_ref().map(|active| Arc::clone(&active.job))
    }

    pub fn state(&self) -> Option<JobState> {
        self.lock_current().as_ref().map(|active| active.job.state())
    }

    /// Latest statistics of the current search (zero when there is none)
    pub fn statistics(&self) -> SearchStatistics {
        self.lock_current()
            .as_ref()
            .map(|active| active.job.statistics())
            .unwrap_or_default()
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<ActiveSearch>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SearchOrchestrator {
    fn drop(&mut self) {
        if let Some(task) = self.dispose() {
            task.detach();
        }
    }
}
