//! Terminal live-tracking view.

pub mod app;
pub mod handler;
pub mod ui;

use std::{io, time::Duration};

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::warn;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::broadcast::error::TryRecvError;

use crate::{api::ApiError, tracking::LiveTracking};

pub use app::App;
use handler::Action;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs the live view until the user quits. The terminal is restored and the
/// tracking guard unmounted whether or not the loop failed.
pub async fn run(tracking: LiveTracking) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &tracking).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracking.unmount();
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    tracking: &LiveTracking,
) -> Result<()> {
    let mut session_rx = tracking.store().subscribe();
    let mut timer_rx = tracking.timer().subscribe();
    let mut notices = tracking.store().notifier().subscribe();

    let mut app = App::new(tracking.auto_start_next_set());
    app.session = tracking.store().snapshot();

    while !app.should_quit {
        if session_rx.has_changed().unwrap_or(false) {
            app.session = session_rx.borrow_and_update().clone();
        }
        app.timer = Some(timer_rx.borrow_and_update().clone());

        loop {
            match notices.try_recv() {
                Ok(notice) => app.push_notice(notice),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Dropped {skipped} notices");
                }
                Err(_) => break,
            }
        }
        app.prune_notices(Utc::now());
        app.auto_start = tracking.auto_start_next_set();
        app.set_clock = tracking.set_clock_secs();

        terminal.draw(|f| ui::render(f, &app))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match handler::action_for(&key) {
            Some(Action::Quit) => app.should_quit = true,
            Some(action) => {
                if let Err(err) = handler::perform(action, tracking).await {
                    // API failures already raised their own notice.
                    if err.downcast_ref::<ApiError>().is_none() {
                        warn!("{action:?} failed: {err:#}");
                        tracking.store().notifier().error(format!("{err:#}"));
                    }
                }
            }
            None => {}
        }
    }

    Ok(())
}
