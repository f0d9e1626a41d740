//! Terminal UI: the execution context that owns all rendering.
//!
//! The loop multiplexes three sources: keyboard input from the input thread,
//! reminder requests posted by the scheduler, and a one-second countdown
//! interval that is reset whenever a dialog opens.

pub mod app;
pub mod event;
pub mod render;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{info, warn};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::event::ReminderRequest;
use crate::{notification, sound};

pub use app::App;
use event::{map_key_event, Event, EventHandler};

/// How often the screen is refreshed when nothing else happens.
const REDRAW_RATE: Duration = Duration::from_millis(250);
const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Takes over the terminal and runs the UI until the user quits.
/// The terminal is restored even when the loop fails.
pub async fn run(mut app: App, mut reminders: mpsc::Receiver<ReminderRequest>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, &mut reminders).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Tui,
    app: &mut App,
    reminders: &mut mpsc::Receiver<ReminderRequest>,
) -> Result<()> {
    let mut events = EventHandler::new(REDRAW_RATE);
    let mut countdown = interval(COUNTDOWN_PERIOD);
    countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        tokio::select! {
            evt = events.next() => match evt {
                Some(Event::Key(key)) => {
                    app.handle_action(map_key_event(key, app.reminder().is_some()));
                }
                Some(Event::Resize) | Some(Event::Redraw) => {}
                None => break,
            },
            Some(request) = reminders.recv() => {
                app.open_reminder(request);
                countdown.reset();
                if sound::rings_terminal_bell(app.sound()) {
                    if let Err(e) = execute!(terminal.backend_mut(), Print('\x07')) {
                        warn!("[sound] Failed to ring terminal bell: {e}");
                    }
                } else {
                    sound::play(app.sound());
                }
                tokio::task::spawn_blocking(move || {
                    notification::notify_reminder(request.break_secs)
                });
            }
            _ = countdown.tick() => app.countdown_tick(),
        }

        if app.should_quit() {
            info!("[ui] Quit requested");
            break;
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

    // Leave the alternate screen before a panic message is printed.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        default_hook(info);
    }));

    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}
