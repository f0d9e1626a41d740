//! UI state: the main window's controls and the reminder dialog.
//!
//! Everything here runs on the UI loop. The scheduler is only ever touched
//! through its handle, never the other way round.

use log::{debug, error, info};

use crate::event::ReminderRequest;
use crate::scheduler::{Phase, ReminderScheduler};
use crate::session::ReminderSession;
use crate::sound::SoundRef;
use crate::startup::{AddOutcome, RemoveOutcome, StartupEntry, StartupError};

use super::event::KeyAction;

/// The reminder dialog currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveReminder {
    pub session_id: u64,
    pub break_secs: u64,
    pub remind_early_minutes: u64,
    pub session: ReminderSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    scheduler: ReminderScheduler,
    /// `Err` holds why the autostart location could not be resolved.
    startup: Result<StartupEntry, String>,
    /// Last known registration state, refreshed after each startup action.
    startup_registered: Option<bool>,
    sound: SoundRef,
    reminder: Option<ActiveReminder>,
    status: Option<StatusMessage>,
    should_quit: bool,
}

impl App {
    pub fn new(
        scheduler: ReminderScheduler,
        startup: Result<StartupEntry, StartupError>,
        sound: SoundRef,
    ) -> Self {
        let startup = startup.map_err(|e| {
            error!("[startup] {e}");
            e.to_string()
        });
        let startup_registered = registration_state(&startup);
        Self {
            scheduler,
            startup,
            startup_registered,
            sound,
            reminder: None,
            status: None,
            should_quit: false,
        }
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    pub fn sound(&self) -> &SoundRef {
        &self.sound
    }

    pub fn reminder(&self) -> Option<&ActiveReminder> {
        self.reminder.as_ref()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn start_enabled(&self) -> bool {
        !self.scheduler.is_running()
    }

    pub fn pause_enabled(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    /// Whether the autostart entry exists; `None` if that cannot be determined.
    pub fn startup_registered(&self) -> Option<bool> {
        self.startup_registered
    }

    pub fn handle_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::None => {}
            KeyAction::Start => {
                if self.start_enabled() {
                    self.scheduler.start();
                    self.set_status("Reminders started");
                }
            }
            KeyAction::Pause => {
                if self.pause_enabled() {
                    self.scheduler.stop();
                    self.set_status("Reminders paused");
                }
            }
            KeyAction::AddToStartup => self.add_to_startup(),
            KeyAction::RemoveFromStartup => self.remove_from_startup(),
            KeyAction::RemindLater => self.remind_later(),
            KeyAction::CloseReminder => self.close_reminder(),
            KeyAction::Quit => self.should_quit = true,
        }
    }

    /// Opens the dialog for `request`, replacing any dialog still on screen.
    pub fn open_reminder(&mut self, request: ReminderRequest) {
        if let Some(mut stale) = self.reminder.take() {
            stale.session.dismiss();
            debug!("[ui] Replacing reminder {}", stale.session_id);
        }
        info!("[ui] Showing reminder {}", request.session_id);
        self.reminder = Some(ActiveReminder {
            session_id: request.session_id,
            break_secs: request.break_secs,
            remind_early_minutes: request.remind_early_minutes,
            session: ReminderSession::new(request.break_secs),
        });
    }

    /// Advances the open countdown by one second.
    ///
    /// When `0` is reached the scheduler is told the session is over; the
    /// dialog keeps showing `0` until the following tick closes it.
    pub fn countdown_tick(&mut self) {
        let Some(reminder) = self.reminder.as_mut() else {
            return;
        };
        match reminder.session.tick() {
            Some(0) => {
                self.scheduler.finish_session(reminder.session_id);
            }
            Some(_) => {}
            None => self.reminder = None,
        }
    }

    fn remind_later(&mut self) {
        let Some(mut reminder) = self.reminder.take() else {
            return;
        };
        if !reminder.session.dismiss() {
            // Countdown already finished; the scheduler has moved on.
            return;
        }
        match self.scheduler.request_early_remind() {
            Ok(()) => self.set_status(format!(
                "Reminding again in {} minutes",
                reminder.remind_early_minutes
            )),
            Err(e) => debug!("[ui] Deferral ignored: {e}"),
        }
    }

    fn close_reminder(&mut self) {
        let Some(mut reminder) = self.reminder.take() else {
            return;
        };
        if reminder.session.dismiss() {
            self.scheduler.finish_session(reminder.session_id);
        }
    }

    fn add_to_startup(&mut self) {
        let result = match &self.startup {
            Ok(entry) => entry.add().map_err(|e| e.to_string()),
            Err(e) => Err(e.clone()),
        };
        self.startup_registered = registration_state(&self.startup);
        match result {
            Ok(AddOutcome::Added) => self.set_status("Added to startup"),
            Ok(AddOutcome::AlreadyPresent) => self.set_status("Already in startup"),
            Err(e) => self.set_error(e),
        }
    }

    fn remove_from_startup(&mut self) {
        let result = match &self.startup {
            Ok(entry) => entry.remove().map_err(|e| e.to_string()),
            Err(e) => Err(e.clone()),
        };
        self.startup_registered = registration_state(&self.startup);
        match result {
            Ok(RemoveOutcome::Removed) => self.set_status("Removed from startup"),
            Ok(RemoveOutcome::NotPresent) => self.set_status("Not in startup"),
            Err(e) => self.set_error(e),
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    fn set_error(&mut self, text: String) {
        error!("[startup] {text}");
        self.status = Some(StatusMessage {
            text,
            is_error: true,
        });
    }
}

fn registration_state(startup: &Result<StartupEntry, String>) -> Option<bool> {
    startup.as_ref().ok()?.is_registered().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Intervals;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Instant};

    fn app_with(
        dir: &tempfile::TempDir,
    ) -> (App, mpsc::Receiver<ReminderRequest>) {
        let (tx, rx) = mpsc::channel(8);
        let scheduler = ReminderScheduler::new(Intervals::default(), tx);
        let entry = StartupEntry::new(dir.path().join("open.bat"), "start \"\" \"eyebreak\"", &[]);
        let app = App::new(scheduler, Ok(entry), SoundRef::File(PathBuf::from("x.wav")));
        (app, rx)
    }

    async fn running_app_with_reminder(
        dir: &tempfile::TempDir,
    ) -> (App, mpsc::Receiver<ReminderRequest>) {
        let (mut app, mut rx) = app_with(dir);
        app.handle_action(KeyAction::Start);
        let request = rx.recv().await.unwrap();
        app.open_reminder(request);
        (app, rx)
    }

    // ── controls ──────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn buttons_reflect_running_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = app_with(&dir);
        assert!(app.start_enabled());
        assert!(!app.pause_enabled());

        app.handle_action(KeyAction::Start);
        assert!(!app.start_enabled());
        assert!(app.pause_enabled());
        assert_eq!(app.phase(), Phase::Waiting);

        app.handle_action(KeyAction::Pause);
        assert!(app.start_enabled());
        assert!(!app.pause_enabled());
        assert_eq!(app.phase(), Phase::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_buttons_do_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = app_with(&dir);

        app.handle_action(KeyAction::Pause);
        assert!(app.status().is_none());

        app.handle_action(KeyAction::Start);
        let status = app.status().cloned();
        app.handle_action(KeyAction::Start);
        assert_eq!(app.status().cloned(), status);
    }

    #[tokio::test(start_paused = true)]
    async fn quit_sets_flag() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = app_with(&dir);
        assert!(!app.should_quit());
        app.handle_action(KeyAction::Quit);
        assert!(app.should_quit());
    }

    // ── reminder dialog ───────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn countdown_runs_to_zero_then_closes() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, mut rx) = running_app_with_reminder(&dir).await;

        let mut shown = vec![app.reminder().unwrap().session.remaining()];
        while app.reminder().is_some_and(|r| !r.session.is_ended()) {
            app.countdown_tick();
            shown.push(app.reminder().unwrap().session.remaining());
        }
        assert_eq!(shown, (0..=20).rev().collect::<Vec<_>>());
        sleep(Duration::from_secs(1)).await;
        assert_eq!(app.phase(), Phase::Waiting);

        // Zero stays up for one more tick, then the dialog goes away.
        assert!(app.reminder().is_some());
        app.countdown_tick();
        assert!(app.reminder().is_none());

        let started = Instant::now();
        rx.recv().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(1199));
    }

    #[tokio::test(start_paused = true)]
    async fn remind_later_closes_dialog_and_shortens_next_wait() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, mut rx) = running_app_with_reminder(&dir).await;

        for _ in 0..5 {
            app.countdown_tick();
        }
        app.handle_action(KeyAction::RemindLater);
        assert!(app.reminder().is_none());
        assert_eq!(
            app.status().unwrap().text,
            "Reminding again in 5 minutes"
        );

        let started = Instant::now();
        rx.recv().await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(300) && elapsed < Duration::from_secs(301));
    }

    #[tokio::test(start_paused = true)]
    async fn close_reminder_resumes_full_wait() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, mut rx) = running_app_with_reminder(&dir).await;

        app.handle_action(KeyAction::CloseReminder);
        assert!(app.reminder().is_none());
        sleep(Duration::from_secs(1)).await;
        assert_eq!(app.phase(), Phase::Waiting);

        let started = Instant::now();
        rx.recv().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(1199));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_without_a_reminder_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = app_with(&dir);
        app.countdown_tick();
        assert!(app.reminder().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dialog_survives_pause_and_can_still_be_dismissed() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, mut rx) = running_app_with_reminder(&dir).await;

        app.handle_action(KeyAction::Pause);
        assert!(app.reminder().is_some());

        app.handle_action(KeyAction::RemindLater);
        assert!(app.reminder().is_none());
        assert_eq!(app.phase(), Phase::Stopped);

        sleep(Duration::from_secs(3600)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn new_reminder_replaces_open_one() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = app_with(&dir);
        app.open_reminder(ReminderRequest {
            session_id: 1,
            break_secs: 20,
            remind_early_minutes: 5,
        });
        app.open_reminder(ReminderRequest {
            session_id: 2,
            break_secs: 30,
            remind_early_minutes: 5,
        });
        let r = app.reminder().unwrap();
        assert_eq!(r.session_id, 2);
        assert_eq!(r.session.remaining(), 30);
    }

    // ── startup ───────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn startup_buttons_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = app_with(&dir);
        assert_eq!(app.startup_registered(), Some(false));

        app.handle_action(KeyAction::AddToStartup);
        assert_eq!(app.status().unwrap().text, "Added to startup");
        assert_eq!(app.startup_registered(), Some(true));

        app.handle_action(KeyAction::AddToStartup);
        assert_eq!(app.status().unwrap().text, "Already in startup");

        app.handle_action(KeyAction::RemoveFromStartup);
        assert_eq!(app.status().unwrap().text, "Removed from startup");
        assert_eq!(app.startup_registered(), Some(false));
        assert!(!dir.path().join("open.bat").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn registration_state_is_cached_between_actions() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = app_with(&dir);
        app.handle_action(KeyAction::AddToStartup);
        assert_eq!(app.startup_registered(), Some(true));

        // Changed behind the app's back; picked up on the next startup action.
        std::fs::remove_file(dir.path().join("open.bat")).unwrap();
        assert_eq!(app.startup_registered(), Some(true));

        app.handle_action(KeyAction::RemoveFromStartup);
        assert_eq!(app.status().unwrap().text, "Not in startup");
        assert_eq!(app.startup_registered(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn startup_failure_is_reported_without_touching_scheduler() {
        let (tx, _rx) = mpsc::channel(8);
        let scheduler = ReminderScheduler::new(Intervals::default(), tx);
        let mut app = App::new(
            scheduler,
            Err(StartupError::NoAutostartDir),
            SoundRef::File(PathBuf::from("x.wav")),
        );
        app.handle_action(KeyAction::Start);

        app.handle_action(KeyAction::AddToStartup);
        let status = app.status().unwrap();
        assert!(status.is_error);
        assert!(status.text.contains("autostart"));
        assert!(app.scheduler().is_running());
        assert_eq!(app.startup_registered(), None);
    }
}
