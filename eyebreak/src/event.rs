/// Posted by the scheduler into the UI event loop each time a reminder is due.
/// The UI answers through [`crate::scheduler::ReminderScheduler`], never by reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderRequest {
    /// Identifies the presentation so late completions can be told apart.
    pub session_id: u64,
    /// Length of the countdown to show.
    pub break_secs: u64,
    /// Shown on the "remind me later" button.
    pub remind_early_minutes: u64,
}

/// How a presented reminder ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The countdown reached zero, or the dialog was closed without deferring.
    Completed,
    /// The user asked to be reminded again after the early-remind interval.
    Deferred,
    /// The UI never reported back within the grace period.
    Abandoned,
}
