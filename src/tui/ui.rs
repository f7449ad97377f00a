//! Rendering for the live-tracking view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};

use crate::{
    session::{NoticeLevel, SetStatus},
    timer::SessionPhase,
    utils::format::{format_clock, format_set},
};

use super::app::App;

const LIST_LIMIT: usize = 5;

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(5), // Rest countdown or current set
            Constraint::Min(7),    // Upcoming | recent
            Constraint::Length(3), // Progress
            Constraint::Length(5), // Notices
            Constraint::Length(1), // Key help
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_focus(f, app, chunks[1]);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    render_upcoming(f, app, lists[0]);
    render_recent(f, app, lists[1]);

    render_progress(f, app, chunks[3]);
    render_notices(f, app, chunks[4]);
    render_help(f, app, chunks[5]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let name = app
        .session
        .workout
        .as_ref()
        .map(|workout| workout.workout_name.clone())
        .unwrap_or_else(|| "Loading workout...".to_string());

    let phase = app
        .timer
        .as_ref()
        .map(|timer| timer.state.phase)
        .unwrap_or_default();
    let (label, color) = match phase {
        SessionPhase::NotStarted => ("not started", Color::DarkGray),
        SessionPhase::Running => ("running", Color::Green),
        SessionPhase::Resting => ("resting", Color::Yellow),
        SessionPhase::Completed => ("completed", Color::Cyan),
    };

    let line = Line::from(vec![
        Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(format_clock(app.elapsed_secs()), Style::default().fg(color)),
        Span::raw("  "),
        Span::styled(label, Style::default().fg(color)),
    ]);

    let header =
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Workout"));
    f.render_widget(header, area);
}

fn render_focus(f: &mut Frame, app: &App, area: Rect) {
    if let Some(remaining) = app.rest_remaining() {
        let rest = Paragraph::new(vec![
            Line::from(Span::styled(
                format_clock(remaining),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from("r: end rest early"),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Rest"));
        f.render_widget(rest, area);
        return;
    }

    let lines = match app.session.current_set() {
        Some(set) => {
            let clock = match app.set_clock {
                Some(secs) => Span::styled(format_clock(secs), Style::default().fg(Color::Green)),
                None => Span::styled("press m to start", Style::default().fg(Color::DarkGray)),
            };
            let mut lines = vec![
                Line::from(Span::styled(
                    format_set(set),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(clock),
            ];
            if !set.notes.is_empty() {
                lines.push(Line::from(Span::styled(
                    set.notes.clone(),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines
        }
        None if app.session.sets.is_empty() => vec![Line::from("No sets in this workout.")],
        None => vec![Line::from("All sets complete. Press f to finish.")],
    };

    let current = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Current set"));
    f.render_widget(current, area);
}

fn render_upcoming(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .session
        .upcoming_sets(LIST_LIMIT)
        .into_iter()
        .map(|set| {
            let style = match app.session.set_status(set) {
                SetStatus::Skipped => Style::default().fg(Color::DarkGray),
                _ => Style::default(),
            };
            ListItem::new(format_set(set)).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Up next"));
    f.render_widget(list, area);
}

fn render_recent(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .session
        .recent_complete(LIST_LIMIT)
        .into_iter()
        .map(|set| ListItem::new(format_set(set)).style(Style::default().fg(Color::Green)))
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Completed"));
    f.render_widget(list, area);
}

fn render_progress(f: &mut Frame, app: &App, area: Rect) {
    let done = app.session.complete_sets.len();
    let total = app.session.sets.len();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(app.session.progress().clamp(0.0, 1.0))
        .label(format!("{done}/{total} sets"));
    f.render_widget(gauge, area);
}

fn render_notices(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .notices
        .iter()
        .map(|notice| {
            let color = match notice.level {
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Info => Color::Blue,
                NoticeLevel::Error => Color::Red,
            };
            ListItem::new(notice.message.clone()).style(Style::default().fg(color))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL));
    f.render_widget(list, area);
}

fn render_help(f: &mut Frame, app: &App, area: Rect) {
    let auto = if app.auto_start { "on" } else { "off" };
    let help = format!(
        " s start  c complete  k skip  m mark started  d duplicate  x delete  \
         r end rest  f finish  a auto-start ({auto})  q quit"
    );
    let bar = Paragraph::new(help).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}
