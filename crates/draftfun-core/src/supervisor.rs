//! Active-stream supervision: at most one generation in flight.
//!
//! The supervisor owns the cancellation token for the session's active
//! stream. Starting a new turn cancels the previous one under the same
//! lock, so there is no window in which two streams could both commit
//! (last-submit-wins). Cancellation is cooperative: the consuming task
//! observes the token and discards frames that arrive afterwards.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

/// Monotonic id for one turn's stream. Used to release the active slot
/// only if it still belongs to this turn.
pub type TurnId = u64;

#[derive(Debug, Default)]
struct ActiveSlot {
    next_id: TurnId,
    current: Option<(TurnId, CancellationToken)>,
}

/// Tracks the single active stream of a session.
///
/// Clonable handle; clones share the same slot so an HTTP cancel
/// endpoint can reach a stream started elsewhere.
#[derive(Debug, Clone, Default)]
pub struct StreamSupervisor {
    slot: Arc<Mutex<ActiveSlot>>,
}

impl StreamSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new turn. Any previously active stream is cancelled
    /// before the new token is installed, atomically under one lock.
    pub fn begin(&self) -> (TurnId, CancellationToken) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, prior)) = slot.current.take() {
            prior.cancel();
        }
        let id = slot.next_id;
        slot.next_id += 1;
        let token = CancellationToken::new();
        slot.current = Some((id, token.clone()));
        (id, token)
    }

    /// Cancel the active stream, if any. Returns whether one was
    /// active. A no-op when nothing is in flight.
    pub fn cancel(&self) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match slot.current.take() {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a stream is currently in flight.
    pub fn is_active(&self) -> bool {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.current.is_some()
    }

    /// Release the active slot at the end of a turn. Only clears the
    /// slot if it still belongs to `id`; a newer turn's token is left
    /// in place.
    pub fn finish(&self, id: TurnId) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(slot.current, Some((current_id, _)) if current_id == id) {
            slot.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_cancels_prior_stream() {
        let supervisor = StreamSupervisor::new();
        let (_, first) = supervisor.begin();
        assert!(!first.is_cancelled());

        let (_, second) = supervisor.begin();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_cancel_is_noop_when_idle() {
        let supervisor = StreamSupervisor::new();
        assert!(!supervisor.cancel());
    }

    #[test]
    fn test_cancel_active_stream() {
        let supervisor = StreamSupervisor::new();
        let (_, token) = supervisor.begin();
        assert!(supervisor.cancel());
        assert!(token.is_cancelled());
        assert!(!supervisor.is_active());
    }

    #[test]
    fn test_finish_only_clears_own_turn() {
        let supervisor = StreamSupervisor::new();
        let (old_id, _) = supervisor.begin();
        let (new_id, new_token) = supervisor.begin();

        // Stale turn finishing must not release the newer stream.
        supervisor.finish(old_id);
        assert!(supervisor.is_active());
        assert!(!new_token.is_cancelled());

        supervisor.finish(new_id);
        assert!(!supervisor.is_active());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let supervisor = StreamSupervisor::new();
        let handle = supervisor.clone();
        let (_, token) = supervisor.begin();
        assert!(handle.cancel());
        assert!(token.is_cancelled());
    }
}
