use parking_lot::Mutex;
use tracing::debug;

/// Monotonically increasing request generation.
///
/// This is intentionally a small, copyable handle; only the newest generation
/// is ever allowed to commit its response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

/// Proof that a request was issued, handed back on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: Generation,
    query: String,
}

impl Ticket {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    latest: u64,
    in_flight: Option<String>,
}

/// Last-query-wins bookkeeping for asynchronous fetches.
///
/// Ordering contract:
/// - Every `begin` supersedes all earlier tickets.
/// - `commit` only yields the value of the most recent ticket; responses of
///   superseded requests are dropped, never merged.
/// - `begin` for the query that is already in flight returns `None` so the
///   caller does not issue a duplicate request.
#[derive(Debug, Default)]
pub struct RequestTracker {
    state: Mutex<TrackerState>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, query: &str) -> Option<Ticket> {
        let mut state = self.state.lock();
        if state.in_flight.as_deref() == Some(query) {
            debug!("query already in flight, not re-issuing: {query:?}");
            return None;
        }
        state.latest += 1;
        state.in_flight = Some(query.to_string());
        Some(Ticket {
            generation: Generation(state.latest),
            query: query.to_string(),
        })
    }

    /// Completes `ticket`, returning `value` only if it is still the latest.
    pub fn commit<T>(&self, ticket: &Ticket, value: T) -> Option<T> {
        let mut state = self.state.lock();
        if ticket.generation.0 != state.latest {
            debug!(
                "discarding stale response for generation {} (latest {})",
                ticket.generation.0, state.latest
            );
            return None;
        }
        state.in_flight = None;
        Some(value)
    }

    pub fn is_latest(&self, ticket: &Ticket) -> bool {
        self.state.lock().latest == ticket.generation.0
    }

    /// Gives up on `ticket` without a response, so its query may be issued
    /// again. Returns whether the in-flight slot was freed; superseded or
    /// already committed tickets leave the tracker untouched.
    pub fn release(&self, ticket: &Ticket) -> bool {
        let mut state = self.state.lock();
        if state.latest != ticket.generation.0 || state.in_flight.is_none() {
            return false;
        }
        state.in_flight = None;
        true
    }

    /// Supersedes every outstanding ticket.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.latest += 1;
        state.in_flight = None;
    }

    pub fn latest(&self) -> Generation {
        Generation(self.state.lock().latest)
    }

    pub fn in_flight(&self) -> Option<String> {
        self.state.lock().in_flight.clone()
    }
}
