/// Explicit debounce state for the search-box watcher
///
/// The watcher schedules one pending submission per keystroke; each schedule
/// invalidates every earlier ticket, so a timer firing for a stale ticket is
/// a no-op even if its timeout was never cleared.

/// Quiet period after the last keystroke before a fetch is requested.
pub const DEBOUNCE_QUIET_MS: i32 = 300;

/// Handle identifying one scheduled submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<String>,
    generation: u64,
}

impl Debouncer {
    pub fn new() -> Debouncer {
        Debouncer::default()
    }

    /// Cancel any pending submission and schedule the trimmed input value.
    /// Empty or whitespace-only input clears the pending state and yields no
    /// ticket, so it can never produce a fetch.
    pub fn schedule(&mut self, raw: &str) -> Option<Ticket> {
        self.generation += 1;

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.pending = None;
            return None;
        }

        self.pending = Some(trimmed.to_string());
        Some(Ticket(self.generation))
    }

    /// Take the pending value, but only for the most recent ticket.
    pub fn fire(&mut self, ticket: Ticket) -> Option<String> {
        if ticket.0 == self.generation {
            self.pending.take()
        } else {
            None
        }
    }

    /// Invalidate all outstanding tickets.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_fire() {
        let mut debouncer = Debouncer::new();

        let ticket = debouncer.schedule("rust").unwrap();

        assert_eq!(debouncer.fire(ticket), Some("rust".to_string()));
        // A ticket fires at most once.
        assert_eq!(debouncer.fire(ticket), None);
    }

    #[test]
    fn test_whitespace_only_input_never_schedules() {
        let mut debouncer = Debouncer::new();

        assert!(debouncer.schedule("").is_none());
        assert!(debouncer.schedule("   ").is_none());
        assert!(debouncer.schedule("\t\n").is_none());
    }

    #[test]
    fn test_input_value_is_trimmed() {
        let mut debouncer = Debouncer::new();

        let ticket = debouncer.schedule("  rust wasm  ").unwrap();

        assert_eq!(debouncer.fire(ticket), Some("rust wasm".to_string()));
    }

    #[test]
    fn test_rapid_submissions_only_newest_fires() {
        let mut debouncer = Debouncer::new();

        let first = debouncer.schedule("k1").unwrap();
        let second = debouncer.schedule("k2").unwrap();

        // The first timer fires anyway (its timeout was not cleared), but the
        // stale ticket yields nothing.
        assert_eq!(debouncer.fire(first), None);
        assert_eq!(debouncer.fire(second), Some("k2".to_string()));
    }

    #[test]
    fn test_clearing_input_invalidates_pending_submission() {
        let mut debouncer = Debouncer::new();

        let ticket = debouncer.schedule("k1").unwrap();
        assert!(debouncer.schedule("   ").is_none());

        assert_eq!(debouncer.fire(ticket), None);
    }

    #[test]
    fn test_cancel_invalidates_tickets() {
        let mut debouncer = Debouncer::new();

        let ticket = debouncer.schedule("k1").unwrap();
        debouncer.cancel();

        assert_eq!(debouncer.fire(ticket), None);
    }
}
