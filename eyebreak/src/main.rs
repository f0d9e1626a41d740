mod config;
mod event;
mod notification;
mod paths;
mod scheduler;
mod session;
mod sound;
mod startup;
mod ui;

use std::fs::OpenOptions;

use log::{error, info};
use tokio::sync::mpsc;

use crate::event::ReminderRequest;
use crate::scheduler::ReminderScheduler;

/// Reminder requests waiting for the UI. One is normally enough; the slack
/// covers a UI that is briefly busy.
const REMINDER_QUEUE_CAPACITY: usize = 4;

#[tokio::main]
async fn main() {
    // ── Logging ───────────────────────────────────────────────────────────────
    init_logging();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = paths::config_file_path();
    let schedule = config::load_schedule(&config_path);
    info!(
        "[config] Loaded {} (work {}s, break {}s, early {}s, sound {:?})",
        config_path.display(),
        schedule.intervals.work_secs,
        schedule.intervals.break_secs,
        schedule.intervals.remind_early_secs,
        schedule.sound
    );

    // ── Scheduler ─────────────────────────────────────────────────────────────
    let (reminder_tx, reminder_rx) = mpsc::channel::<ReminderRequest>(REMINDER_QUEUE_CAPACITY);
    let scheduler = ReminderScheduler::new(schedule.intervals, reminder_tx);

    let app = ui::App::new(
        scheduler.clone(),
        startup::StartupEntry::for_current_exe(),
        schedule.sound,
    );

    info!("eyebreak v{} started", env!("CARGO_PKG_VERSION"));
    scheduler.start();

    // ── UI loop ───────────────────────────────────────────────────────────────
    let result = ui::run(app, reminder_rx).await;
    scheduler.stop();

    if let Err(e) = result {
        error!("[ui] {e:#}");
        eprintln!("eyebreak: {e:#}");
        std::process::exit(1);
    }
    info!("Shutting down");
}

/// Sends log records to the log file, since the UI owns the terminal.
/// Falls back to stderr at `warn` when the file cannot be opened.
fn init_logging() {
    let log_path = paths::log_file_path();
    let file = log_path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&log_path));

    match file {
        Ok(file) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        Err(e) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
                .init();
            log::warn!("Failed to open log file {}: {e}", log_path.display());
        }
    }
}
