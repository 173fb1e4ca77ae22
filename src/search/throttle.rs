//! Progress coalescing.
//!
//! Engines report progress far more often than a UI can redraw. The throttle
//! lets at most one delivery be in flight: a `report` that arrives while the
//! previous delivery has not been released is dropped, not queued. Terminal
//! values travel through the done/error path, so only intermediate
//! granularity is lost.
//!
//! A delivery stays in flight until its [`InFlight`] token is dropped. A
//! synchronous consumer drops it when the delivery function returns; a queued
//! consumer keeps it with the queued update until the update is applied.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type DeliverFn = dyn Fn(f64, InFlight) + Send + Sync;

pub struct ProgressThrottle {
    in_flight: Arc<AtomicBool>,
    deliver: Box<DeliverFn>,
}

impl ProgressThrottle {
    /// Create a throttle around a delivery function
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(f64, InFlight) + Send + Sync + 'static,
    {
        Self {
            in_flight: Arc::new(AtomicBool::new(false)),
            deliver: Box::new(deliver),
        }
    }

    /// Forward `fraction` unless a delivery is already in flight.
    ///
    /// Returns whether the delivery function was invoked. Safe to call from
    /// any thread; never blocks.
    pub fn report(&self, fraction: f64) -> bool {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return false;
        }

        let token = InFlight {
            flag: Arc::clone(&self.in_flight),
        };
        (self.deliver)(fraction, token);
        true
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ProgressThrottle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressThrottle")
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

/// Marks one progress delivery as outstanding; releases the throttle on drop
pub struct InFlight {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl fmt::Debug for InFlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InFlight")
    }
}
