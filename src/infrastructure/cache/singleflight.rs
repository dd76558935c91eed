//! Request deduplication keyed by cache key

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};

use crate::domain::DomainError;

/// Outcome of one flight, handed to every caller that joined it
pub type FlightResult = Result<Bytes, DomainError>;

type FlightFuture = BoxFuture<'static, FlightResult>;

struct Flight {
    id: u64,
    future: WeakShared<FlightFuture>,
}

/// Registry of in-flight fetches
///
/// The first caller for a key registers a shared future; callers arriving
/// while it is pending attach to it instead of starting their own work.
/// The registry only holds a weak handle, so the work is driven by the
/// callers themselves: dropping one caller detaches it alone, and once every
/// caller is gone the pending work is dropped too.
#[derive(Default)]
pub struct FlightGroup {
    flights: Mutex<HashMap<String, Flight>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for FlightGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightGroup")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl FlightGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` for `key` unless a flight for it is already pending
    ///
    /// Returns the flight's result and whether this caller started it.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> (FlightResult, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FlightResult> + Send + 'static,
    {
        let (id, future, leader) = self.join(key, work);
        let result = future.await;

        let mut flights = self.lock();
        if flights.get(key).is_some_and(|flight| flight.id == id) {
            flights.remove(key);
        }

        (result, leader)
    }

    /// Number of flights that still have at least one caller attached
    pub fn in_flight(&self) -> usize {
        self.lock()
            .values()
            .filter(|flight| flight.future.upgrade().is_some())
            .count()
    }

    fn join<F, Fut>(&self, key: &str, work: F) -> (u64, Shared<FlightFuture>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FlightResult> + Send + 'static,
    {
        if let Some((id, future)) = self.attach(&self.lock(), key) {
            return (id, future, false);
        }

        // Built outside the lock; nothing runs until the future is polled
        let future = work().boxed().shared();

        let mut flights = self.lock();

        // Another caller registered first; ours is dropped unpolled
        if let Some((id, existing)) = self.attach(&flights, key) {
            return (id, existing, false);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // A fresh, unpolled future always downgrades
        if let Some(weak) = future.downgrade() {
            flights.insert(key.to_string(), Flight { id, future: weak });
        }

        (id, future, true)
    }

    fn attach(
        &self,
        flights: &HashMap<String, Flight>,
        key: &str,
    ) -> Option<(u64, Shared<FlightFuture>)> {
        let flight = flights.get(key)?;
        flight.future.upgrade().map(|future| (flight.id, future))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Flight>> {
        // Nothing in the critical sections can leave the map half-updated
        self.flights.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
