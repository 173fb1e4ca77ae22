//! Scripted engine used by the lifecycle tests.
//!
//! Nothing runs on its own: tests drive the stored callbacks from whatever
//! threads they like, which is exactly what a real engine would do.

use crate::engine::{EngineCallbacks, EngineError, EngineRequest, OperationHandle, SearchEngine};
use crate::search::types::SearchStatistics;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct ScriptedEngine {
    next_id: AtomicU64,
    callbacks: Mutex<HashMap<u64, Arc<dyn EngineCallbacks>>>,
    releases: Mutex<HashMap<u64, usize>>,
    requests: Mutex<Vec<EngineRequest>>,
    reject_with: Mutex<Option<String>>,
    release_delay: Mutex<Option<Duration>>,
    finish_during_submit: Mutex<Option<SearchStatistics>>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reject_next(&self, reason: &str) {
        *self.reject_with.lock().unwrap() = Some(reason.to_string());
    }

    pub fn slow_release(&self, delay: Duration) {
        *self.release_delay.lock().unwrap() = Some(delay);
    }

    /// Report `done` from inside `submit`, before the handle reaches the job
    pub fn finish_during_submit(&self, stats: SearchStatistics) {
        *self.finish_during_submit.lock().unwrap() = Some(stats);
    }

    pub fn callbacks(&self, handle: u64) -> Arc<dyn EngineCallbacks> {
        Arc::clone(&self.callbacks.lock().unwrap()[&handle])
    }

    /// Callbacks of the most recent submission
    pub fn last_callbacks(&self) -> Arc<dyn EngineCallbacks> {
        self.callbacks(self.next_id.load(Ordering::SeqCst))
    }

    pub fn release_count(&self, handle: u64) -> usize {
        self.releases.lock().unwrap().get(&handle).copied().unwrap_or(0)
    }

    pub fn total_releases(&self) -> usize {
        self.releases.lock().unwrap().values().sum()
    }

    pub fn submissions(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<EngineRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Wait until `handle` has been released at least once
    pub fn wait_released(&self, handle: u64, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while std::time::Instant::now() < deadline {
            if self.release_count(handle) > 0 {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }
}

impl SearchEngine for ScriptedEngine {
    fn submit(
        &self,
        request: EngineRequest,
        callbacks: Arc<dyn EngineCallbacks>,
    ) -> Result<OperationHandle, EngineError> {
        let rejection = self.reject_with.lock().unwrap().take();
        if let Some(reason) = rejection {
            return Err(EngineError::Rejected(reason));
        }

        self.requests.lock().unwrap().push(request);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.callbacks
            .lock()
            .unwrap()
            .insert(id, Arc::clone(&callbacks));

        let finish = self.finish_during_submit.lock().unwrap().take();
        if let Some(stats) = finish {
            callbacks.done(&stats);
        }

        Ok(OperationHandle::new(NonZeroU64::new(id).unwrap()))
    }

    fn release(&self, handle: OperationHandle) -> Result<(), EngineError> {
        if let Some(delay) = *self.release_delay.lock().unwrap() {
            std::thread::sleep(delay);
        }
        *self
            .releases
            .lock()
            .unwrap()
            .entry(handle.raw())
            .or_insert(0) += 1;
        // Dropping the callbacks breaks the engine -> job reference
        self.callbacks.lock().unwrap().remove(&handle.raw());
        Ok(())
    }
}
