use log::warn;
use notify_rust::Notification;

pub const REMINDER_TITLE: &str = "20-20-20 Rule";

/// Body text shared by the desktop notification and the reminder dialog.
pub fn reminder_message(break_secs: u64) -> String {
    format!("Time to take a break! Look at something 20 feet away for {break_secs} seconds.")
}

/// Raises a desktop notification for a reminder so it is seen even when the
/// terminal is in the background. Failures are logged only.
pub fn notify_reminder(break_secs: u64) {
    let result = Notification::new()
        .summary(REMINDER_TITLE)
        .body(&reminder_message(break_secs))
        .appname("eyebreak")
        .show();
    if let Err(e) = result {
        warn!("[notify] Failed to show desktop notification: {e}");
    }
}
