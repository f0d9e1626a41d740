/// Reminder scheduling loop.
///
/// The scheduler alternates between waiting for the work interval and
/// presenting a reminder. Presenting means posting a [`ReminderRequest`] to the
/// UI event loop and waiting until the UI reports that the dialog is gone,
/// either via [`ReminderScheduler::finish_session`] or
/// [`ReminderScheduler::request_early_remind`].
///
/// ```text
///            start()                 wait elapsed
///  Stopped ──────────▶ Waiting ─────────────────────▶ Presenting
///     ▲                  ▲                                │
///     │ stop()           └────── session ended ───────────┘
///     └──────────────────────────────────────────────────(any)
/// ```
///
/// The loop runs as a tokio task. Waits race a `watch` stop signal, so
/// `stop()` takes effect immediately instead of after the pending sleep.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep, timeout};

use crate::config::Intervals;
use crate::event::{ReminderRequest, SessionOutcome};

/// Extra time the UI gets past the break interval to report a session's end.
pub const SESSION_GRACE_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    Waiting,
    Presenting,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("no reminder is currently being presented")]
    NotPresenting,
}

/// Handle to the reminder cycle. Clones share the same state.
#[derive(Clone)]
pub struct ReminderScheduler {
    shared: Arc<Shared>,
}

struct Shared {
    intervals: Intervals,
    dispatch: mpsc::Sender<ReminderRequest>,
    running: AtomicBool,
    /// Set by a deferral, consumed by the loop before its next wait.
    remind_early: AtomicBool,
    inner: Mutex<Inner>,
}

struct Inner {
    phase: Phase,
    /// Bumped on every start and stop; a loop whose generation is stale exits.
    generation: u64,
    stop_tx: Option<watch::Sender<bool>>,
    session: Option<OpenSession>,
    next_session_id: u64,
    next_reminder_at: Option<DateTime<Local>>,
}

struct OpenSession {
    id: u64,
    done_tx: oneshot::Sender<SessionOutcome>,
}

impl ReminderScheduler {
    /// Creates a stopped scheduler that posts reminders to `dispatch`.
    pub fn new(intervals: Intervals, dispatch: mpsc::Sender<ReminderRequest>) -> Self {
        Self {
            shared: Arc::new(Shared {
                intervals,
                dispatch,
                running: AtomicBool::new(false),
                remind_early: AtomicBool::new(false),
                inner: Mutex::new(Inner {
                    phase: Phase::Stopped,
                    generation: 0,
                    stop_tx: None,
                    session: None,
                    next_session_id: 1,
                    next_reminder_at: None,
                }),
            }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    /// Wall-clock time of the next reminder while waiting, `None` otherwise.
    pub fn next_reminder_at(&self) -> Option<DateTime<Local>> {
        self.shared.lock().next_reminder_at
    }

    /// Starts the cycle with a full work-interval wait.
    ///
    /// No-op if already running. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut inner = self.shared.lock();
        if self.shared.running.load(Ordering::SeqCst) {
            debug!("[scheduler] Start ignored: already running");
            return;
        }
        self.shared.running.store(true, Ordering::SeqCst);
        // A deferral from before the last stop does not carry over.
        self.shared.remind_early.store(false, Ordering::SeqCst);

        inner.generation += 1;
        let generation = inner.generation;
        let (stop_tx, stop_rx) = watch::channel(false);
        inner.stop_tx = Some(stop_tx);
        inner.phase = Phase::Waiting;
        drop(inner);

        tokio::spawn(run_loop(Arc::clone(&self.shared), generation, stop_rx));
        info!(
            "[scheduler] Started (work {}s, break {}s, early {}s)",
            self.shared.intervals.work_secs,
            self.shared.intervals.break_secs,
            self.shared.intervals.remind_early_secs
        );
    }

    /// Stops the cycle. The pending wait is abandoned; the next `start()`
    /// begins a fresh full-length wait.
    ///
    /// A dialog already on screen stays there. Closing it later is harmless.
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        inner.generation += 1;
        if let Some(stop_tx) = inner.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        inner.session = None;
        inner.phase = Phase::Stopped;
        inner.next_reminder_at = None;
        self.shared.remind_early.store(false, Ordering::SeqCst);
        info!("[scheduler] Stopped");
    }

    /// Ends the current presentation and makes the next wait use the
    /// early-remind interval instead of the work interval.
    pub fn request_early_remind(&self) -> Result<(), SchedulerError> {
        let open = {
            let mut inner = self.shared.lock();
            let open = inner.session.take().ok_or(SchedulerError::NotPresenting)?;
            self.shared.remind_early.store(true, Ordering::SeqCst);
            open
        };
        let _ = open.done_tx.send(SessionOutcome::Deferred);
        info!("[scheduler] Reminder {} deferred", open.id);
        Ok(())
    }

    /// Reports that the dialog for `session_id` closed without a deferral.
    ///
    /// Returns `false` if that session is no longer the open one.
    pub fn finish_session(&self, session_id: u64) -> bool {
        let open = {
            let mut inner = self.shared.lock();
            match inner.session.take() {
                Some(open) if open.id == session_id => open,
                other => {
                    inner.session = other;
                    return false;
                }
            }
        };
        let _ = open.done_tx.send(SessionOutcome::Completed);
        true
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, inner: &Inner, generation: u64) -> bool {
        inner.generation == generation && self.running.load(Ordering::SeqCst)
    }

    /// Moves to `Waiting`. Returns `false` if this loop has been superseded.
    fn enter_waiting(&self, generation: u64, wait: Duration) -> bool {
        let mut inner = self.lock();
        if !self.is_current(&inner, generation) {
            return false;
        }
        inner.phase = Phase::Waiting;
        inner.next_reminder_at = chrono::Duration::from_std(wait)
            .ok()
            .and_then(|d| Local::now().checked_add_signed(d));
        true
    }

    /// Moves to `Presenting` and allocates a session slot.
    fn open_session(
        &self,
        generation: u64,
    ) -> Option<(ReminderRequest, oneshot::Receiver<SessionOutcome>)> {
        let mut inner = self.lock();
        if !self.is_current(&inner, generation) {
            return None;
        }
        let id = inner.next_session_id;
        inner.next_session_id += 1;
        let (done_tx, done_rx) = oneshot::channel();
        inner.session = Some(OpenSession { id, done_tx });
        inner.phase = Phase::Presenting;
        inner.next_reminder_at = None;

        let request = ReminderRequest {
            session_id: id,
            break_secs: self.intervals.break_secs,
            remind_early_minutes: self.intervals.remind_early_minutes(),
        };
        Some((request, done_rx))
    }

    fn close_session(&self, session_id: u64) {
        let mut inner = self.lock();
        if inner.session.as_ref().is_some_and(|s| s.id == session_id) {
            inner.session = None;
        }
    }

    /// Marks the scheduler stopped on behalf of a loop that ended on its own.
    fn retire(&self, generation: u64) {
        let mut inner = self.lock();
        if !self.is_current(&inner, generation) {
            return;
        }
        self.running.store(false, Ordering::SeqCst);
        inner.generation += 1;
        inner.stop_tx = None;
        inner.session = None;
        inner.phase = Phase::Stopped;
        inner.next_reminder_at = None;
    }
}

async fn run_loop(shared: Arc<Shared>, generation: u64, mut stop_rx: watch::Receiver<bool>) {
    let intervals = shared.intervals;
    let mut wait = intervals.work();

    loop {
        if !shared.enter_waiting(generation, wait) {
            break;
        }
        debug!("[scheduler] Waiting {}s", wait.as_secs());

        tokio::select! {
            _ = sleep(wait) => {}
            _ = stop_rx.changed() => break,
        }

        let Some((request, done_rx)) = shared.open_session(generation) else {
            break;
        };
        let session_id = request.session_id;

        match shared.dispatch.try_send(request) {
            Ok(()) => debug!("[scheduler] Reminder {session_id} dispatched"),
            Err(TrySendError::Full(_)) => {
                warn!("[scheduler] UI queue full; skipping reminder {session_id}");
                shared.close_session(session_id);
                wait = intervals.work();
                continue;
            }
            Err(TrySendError::Closed(_)) => {
                info!("[scheduler] UI event loop closed; stopping");
                shared.retire(generation);
                break;
            }
        }

        let limit = intervals.break_duration() + Duration::from_secs(SESSION_GRACE_SECS);
        let outcome = tokio::select! {
            res = timeout(limit, done_rx) => match res {
                Ok(Ok(outcome)) => outcome,
                // Slot dropped by stop().
                Ok(Err(_)) => break,
                Err(_) => {
                    shared.close_session(session_id);
                    SessionOutcome::Abandoned
                }
            },
            _ = stop_rx.changed() => break,
        };

        if outcome == SessionOutcome::Abandoned {
            warn!("[scheduler] Reminder {session_id} never reported back; continuing");
        } else {
            debug!("[scheduler] Reminder {session_id} ended: {outcome:?}");
        }

        wait = if shared.remind_early.swap(false, Ordering::SeqCst) {
            intervals.remind_early()
        } else {
            intervals.work()
        };
    }

    debug!("[scheduler] Loop {generation} exited");
}
