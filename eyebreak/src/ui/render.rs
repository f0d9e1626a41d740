//! Ratatui rendering for the main window and the reminder dialog.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::notification::{reminder_message, REMINDER_TITLE};
use crate::scheduler::Phase;

use super::app::{ActiveReminder, App};

const MAIN_TITLE: &str = " 20-20-20 Rule Reminder ";

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Start / Pause
            Constraint::Length(3), // Startup buttons
            Constraint::Min(3),    // Status
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    let top = halves(chunks[0]);
    render_button(frame, top[0], "[s] Start", app.start_enabled());
    render_button(frame, top[1], "[p] Pause", app.pause_enabled());

    let bottom = halves(chunks[1]);
    render_button(frame, bottom[0], "[a] Add to Startup", true);
    render_button(frame, bottom[1], "[r] Remove from Startup", true);

    render_status(frame, app, chunks[2]);

    let hints = Paragraph::new(" q:Quit ").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hints, chunks[3]);

    if let Some(reminder) = app.reminder() {
        render_reminder(frame, reminder);
    }
}

fn halves(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

fn render_button(frame: &mut Frame, area: Rect, label: &str, enabled: bool) {
    let style = if enabled {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let button = Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(style)
        .block(Block::default().borders(Borders::ALL).border_style(style));
    frame.render_widget(button, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let state = match app.phase() {
        Phase::Stopped => Span::styled("Paused", Style::default().fg(Color::Yellow)),
        Phase::Waiting => {
            let next = app
                .scheduler()
                .next_reminder_at()
                .map(|t| format!(" (next reminder at {})", t.format("%H:%M:%S")))
                .unwrap_or_default();
            Span::styled(format!("Running{next}"), Style::default().fg(Color::Green))
        }
        Phase::Presenting => Span::styled("Break time", Style::default().fg(Color::Cyan)),
    };

    let startup = match app.startup_registered() {
        Some(true) => "registered",
        Some(false) => "not registered",
        None => "unavailable",
    };

    let mut lines = vec![
        Line::from(vec![Span::raw("Status: "), state]),
        Line::from(format!("Startup: {startup}")),
    ];
    if let Some(status) = app.status() {
        let color = if status.is_error { Color::Red } else { Color::Gray };
        lines.push(Line::from(Span::styled(
            status.text.clone(),
            Style::default().fg(color),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(MAIN_TITLE));
    frame.render_widget(paragraph, area);
}

fn render_reminder(frame: &mut Frame, reminder: &ActiveReminder) {
    let area = centered_rect(frame.area(), 72, 9);
    frame.render_widget(Clear, area);

    let minutes = reminder.remind_early_minutes;
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    let lines = vec![
        Line::from(reminder_message(reminder.break_secs)),
        Line::from(""),
        Line::from(format!(
            "Time remaining: {} seconds",
            reminder.session.remaining()
        ))
        .style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from(format!("[l] Remind me in {minutes} {unit}"))
            .style(Style::default().fg(Color::Yellow)),
        Line::from("[Esc] Close").style(Style::default().fg(Color::DarkGray)),
    ];

    let dialog = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {REMINDER_TITLE} "))
                .border_style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(dialog, area);
}

/// A `width` x `height` rectangle centred in `area`, shrunk to fit.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Intervals;
    use crate::event::ReminderRequest;
    use crate::scheduler::ReminderScheduler;
    use crate::sound::SoundRef;
    use crate::startup::StartupError;
    use ratatui::backend::TestBackend;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app() -> App {
        let (tx, _rx) = mpsc::channel(8);
        App::new(
            ReminderScheduler::new(Intervals::default(), tx),
            Err(StartupError::NoAutostartDir),
            SoundRef::File(PathBuf::from("x.wav")),
        )
    }

    #[test]
    fn main_window_shows_all_controls() {
        let text = screen(&app());
        assert!(text.contains("[s] Start"));
        assert!(text.contains("[p] Pause"));
        assert!(text.contains("[a] Add to Startup"));
        assert!(text.contains("[r] Remove from Startup"));
        assert!(text.contains("Paused"));
        assert!(text.contains("Startup: unavailable"));
    }

    #[test]
    fn reminder_dialog_shows_countdown_and_defer_button() {
        let mut app = app();
        app.open_reminder(ReminderRequest {
            session_id: 1,
            break_secs: 20,
            remind_early_minutes: 5,
        });
        app.countdown_tick();

        let text = screen(&app);
        assert!(text.contains("Time remaining: 19 seconds"));
        assert!(text.contains("[l] Remind me in 5 minutes"));
        assert!(text.contains(REMINDER_TITLE));
    }

    #[test]
    fn one_minute_label_is_singular() {
        let mut app = app();
        app.open_reminder(ReminderRequest {
            session_id: 1,
            break_secs: 20,
            remind_early_minutes: 1,
        });
        assert!(screen(&app).contains("Remind me in 1 minute "));
    }

    #[test]
    fn centered_rect_fits_small_areas() {
        let r = centered_rect(Rect::new(0, 0, 40, 5), 72, 9);
        assert_eq!(r, Rect::new(0, 0, 40, 5));
        let r = centered_rect(Rect::new(0, 0, 80, 24), 72, 9);
        assert_eq!(r, Rect::new(4, 7, 72, 9));
    }
}
