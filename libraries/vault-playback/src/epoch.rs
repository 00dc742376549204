//! Request epochs
//!
//! Every async request captures the epoch it was issued under. When it
//! completes, its result is applied only if no newer request has been
//! issued in the meantime. Superseded requests are not cancelled; their
//! results are ignored on arrival.

use std::sync::atomic::{AtomicU64, Ordering};

/// Epoch captured by a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic request counter
#[derive(Debug, Default)]
pub struct RequestEpoch {
    counter: AtomicU64,
}

impl RequestEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding all earlier ones
    pub fn advance(&self) -> Ticket {
        Ticket(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` belongs to the latest request
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.counter.load(Ordering::SeqCst) == ticket.0
    }

    /// Supersede in-flight requests without starting a new one
    pub fn invalidate(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_ticket_is_current() {
        let epoch = RequestEpoch::new();
        let first = epoch.advance();
        assert!(epoch.is_current(first));

        let second = epoch.advance();
        assert!(!epoch.is_current(first));
        assert!(epoch.is_current(second));
        assert!(second.value() > first.value());
    }

    #[test]
    fn invalidate_supersedes_everything() {
        let epoch = RequestEpoch::new();
        let ticket = epoch.advance();
        epoch.invalidate();
        assert!(!epoch.is_current(ticket));
    }
}
