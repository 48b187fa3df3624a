//! Single-flight coordination per logical operation
//!
//! At most one flight is current per `SingleFlight`. Starting a new one
//! cancels the previous flight's token; the previous caller's `run` future
//! resolves to `NetworkError::Cancelled` and its `commit` refuses to apply.
//!
//! `commit` and `supersede` serialize on an async lock, so the "am I still
//! current?" check and the state mutation that follows it are atomic with
//! respect to newer flights starting.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{NetworkError, Result};

struct Flight {
    id: u64,
    tag: Option<String>,
    cancel: CancellationToken,
}

/// In-flight bookkeeping for one logical operation.
pub struct SingleFlight {
    key: String,
    slot: Mutex<Option<Flight>>,
    commit_lock: tokio::sync::Mutex<()>,
    next_id: AtomicU64,
}

impl SingleFlight {
    pub fn new(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            slot: Mutex::new(None),
            commit_lock: tokio::sync::Mutex::new(()),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Cancel whatever is in flight and start a new flight.
    pub async fn supersede(self: &Arc<Self>) -> FlightGuard {
        let _commit = self.commit_lock.lock().await;
        let mut slot = self.lock_slot();
        self.install(&mut slot, None)
    }

    /// Like `supersede`, but refuses to start when the current flight
    /// carries the same tag (e.g. the same authorization code submitted
    /// twice).
    pub async fn begin_unique(self: &Arc<Self>, tag: &str) -> Result<FlightGuard> {
        let _commit = self.commit_lock.lock().await;
        let mut slot = self.lock_slot();
        if slot
            .as_ref()
            .is_some_and(|current| current.tag.as_deref() == Some(tag))
        {
            debug!(operation = %self.key, "rejecting duplicate submission");
            return Err(NetworkError::DuplicateRequest);
        }
        Ok(self.install(&mut slot, Some(tag.to_owned())))
    }

    /// Cancel the current flight without starting another.
    pub async fn cancel(&self) {
        let _commit = self.commit_lock.lock().await;
        if let Some(previous) = self.lock_slot().take() {
            debug!(operation = %self.key, flight = previous.id, "cancelling in-flight request");
            previous.cancel.cancel();
        }
    }

    /// Whether any flight is currently registered.
    pub fn in_flight(&self) -> bool {
        self.lock_slot().is_some()
    }

    fn install(self: &Arc<Self>, slot: &mut Option<Flight>, tag: Option<String>) -> FlightGuard {
        if let Some(previous) = slot.take() {
            debug!(operation = %self.key, flight = previous.id, "superseding in-flight request");
            previous.cancel.cancel();
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        *slot = Some(Flight {
            id,
            tag,
            cancel: cancel.clone(),
        });
        FlightGuard {
            flight: Arc::clone(self),
            id,
            cancel,
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<Flight>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle held by the caller for the duration of one flight.
///
/// Dropping the guard clears the in-flight bookkeeping if this flight is
/// still the current one.
pub struct FlightGuard {
    flight: Arc<SingleFlight>,
    id: u64,
    cancel: CancellationToken,
}

impl FlightGuard {
    pub fn key(&self) -> &str {
        self.flight.key()
    }

    pub fn is_current(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Drive `fut` unless this flight is cancelled first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(NetworkError::Cancelled),
            output = fut => Ok(output),
        }
    }

    /// Apply a state change only if no newer flight has started.
    pub async fn commit<F: Future>(&self, fut: F) -> Result<F::Output> {
        let _commit = self.flight.commit_lock.lock().await;
        if !self.is_current() {
            debug!(operation = %self.flight.key, flight = self.id, "dropping stale completion");
            return Err(NetworkError::Cancelled);
        }
        Ok(fut.await)
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let mut slot = self.flight.lock_slot();
        if slot.as_ref().is_some_and(|current| current.id == self.id) {
            *slot = None;
        }
    }
}
