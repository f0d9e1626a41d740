/// Countdown shown while a reminder is on screen.
///
/// A session for `N` seconds displays `N, N-1, …, 0` and ends on its own once
/// `0` has been shown. It can also be ended early with [`ReminderSession::dismiss`].
/// After it ends, [`ReminderSession::tick`] returns `None` forever, so a timer that
/// outlives the dialog can never push another value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSession {
    remaining: u64,
    ended: bool,
}

impl ReminderSession {
    /// Starts a session whose first displayed value is `break_secs`.
    pub fn new(break_secs: u64) -> Self {
        Self {
            remaining: break_secs,
            ended: false,
        }
    }

    /// Value currently displayed.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Advances the countdown by one second and returns the new value to display.
    ///
    /// Returns `Some(0)` exactly once; the session is ended from then on.
    pub fn tick(&mut self) -> Option<u64> {
        if self.ended {
            return None;
        }
        if self.remaining == 0 {
            // A zero-length session: 0 was already on screen.
            self.ended = true;
            return None;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.ended = true;
        }
        Some(self.remaining)
    }

    /// Ends the session early. Returns `false` if it had already ended.
    pub fn dismiss(&mut self) -> bool {
        !std::mem::replace(&mut self.ended, true)
    }
}
