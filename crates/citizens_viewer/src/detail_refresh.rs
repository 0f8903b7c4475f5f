//! Debounced refresh of an open detail view.
//!
//! Planning, reflection, and action-start events for the actor whose
//! detail view is open each re-arm a single deadline; the refetch
//! fires once after a quiet window instead of once per event.

/// Tracks the single pending deadline. Time is caller-supplied
/// monotonic seconds, same clock the motion controllers use.
#[derive(Debug, Default)]
pub struct DetailRefreshCoordinator {
    pending_due: Option<f64>,
}

impl DetailRefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes an event that names `event_npc`. Re-arms the deadline if
    /// the open view belongs to the same actor (name match; events do
    /// not carry ids).
    pub fn note_event(
        &mut self,
        event_npc: &str,
        open_npc_name: Option<&str>,
        now: f64,
        debounce_secs: f64,
    ) {
        if open_npc_name == Some(event_npc) {
            self.pending_due = Some(now + debounce_secs);
        }
    }

    /// Returns true exactly once when an armed deadline has passed.
    pub fn poll(&mut self, now: f64) -> bool {
        match self.pending_due {
            Some(due) if now >= due => {
                self.pending_due = None;
                true
            }
            _ => false,
        }
    }

    /// Drops any armed deadline; called when the view closes or
    /// switches actors.
    pub fn clear(&mut self) {
        self.pending_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.pending_due.is_some()
    }
}
