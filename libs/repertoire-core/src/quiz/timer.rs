//! Cancellable delayed transitions.
//!
//! The engine holds at most one pending timer. Arming replaces it, and a fire
//! carrying any handle but the pending one is stale and ignored.

use serde::{Deserialize, Serialize};

/// Identifies one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What happens when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Play the opponent's next move.
    OpponentReply,
    /// The judged move has been shown long enough; roll it back.
    RevealElapsed,
}

#[derive(Debug, Default)]
pub struct TimerSlot {
    next_id: u64,
    pending: Option<(TimerHandle, TimerAction)>,
}

impl TimerSlot {
    /// Arm a timer, returning its handle and the handle it replaced, if any.
    pub fn arm(&mut self, action: TimerAction) -> (TimerHandle, Option<TimerHandle>) {
        let replaced = self.cancel();
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending = Some((handle, action));
        (handle, replaced)
    }

    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.pending.take().map(|(handle, _)| handle)
    }

    /// Consume a fire. Returns the action only for the pending handle.
    pub fn fire(&mut self, handle: TimerHandle) -> Option<TimerAction> {
        match self.pending {
            Some((pending, action)) if pending == handle => {
                self.pending = None;
                Some(action)
            }
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<TimerHandle> {
        self.pending.map(|(handle, _)| handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fires_once() {
        let mut slot = TimerSlot::default();
        let (handle, replaced) = slot.arm(TimerAction::OpponentReply);
        assert_eq!(replaced, None);
        assert_eq!(slot.fire(handle), Some(TimerAction::OpponentReply));
        assert_eq!(slot.fire(handle), None);
    }

    #[test]
    fn rearming_invalidates_previous_handle() {
        let mut slot = TimerSlot::default();
        let (first, _) = slot.arm(TimerAction::RevealElapsed);
        let (second, replaced) = slot.arm(TimerAction::OpponentReply);
        assert_eq!(replaced, Some(first));
        assert_eq!(slot.fire(first), None);
        assert_eq!(slot.pending(), Some(second));
    }

    #[test]
    fn cancelled_timer_is_stale() {
        let mut slot = TimerSlot::default();
        let (handle, _) = slot.arm(TimerAction::OpponentReply);
        assert_eq!(slot.cancel(), Some(handle));
        assert_eq!(slot.fire(handle), None);
        assert_eq!(slot.cancel(), None);
    }
}
