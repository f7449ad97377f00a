use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tracking::LiveTracking;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StartWorkout,
    CompleteSet,
    SkipSet,
    MarkSetStarted,
    DuplicateSet,
    DeleteSet,
    CancelRest,
    FinishWorkout,
    ToggleAutoStart,
    Quit,
}

pub fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.code == KeyCode::Char('c')).then_some(Action::Quit);
    }

    let action = match key.code {
        KeyCode::Char('s') => Action::StartWorkout,
        KeyCode::Char('c') => Action::CompleteSet,
        KeyCode::Char('k') => Action::SkipSet,
        KeyCode::Char('m') => Action::MarkSetStarted,
        KeyCode::Char('d') => Action::DuplicateSet,
        KeyCode::Char('x') => Action::DeleteSet,
        KeyCode::Char('r') => Action::CancelRest,
        KeyCode::Char('f') => Action::FinishWorkout,
        KeyCode::Char('a') => Action::ToggleAutoStart,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => return None,
    };
    Some(action)
}

pub async fn perform(action: Action, tracking: &LiveTracking) -> Result<()> {
    match action {
        Action::StartWorkout => tracking.start_workout().await,
        Action::CompleteSet => tracking.complete_current_set().await.map(|_| ()),
        Action::SkipSet => tracking.skip_current_set().await,
        Action::MarkSetStarted => tracking.mark_current_set_started().await,
        Action::DuplicateSet => tracking.duplicate_current_set().await,
        Action::DeleteSet => tracking.delete_current_set().await,
        Action::CancelRest => tracking.cancel_rest().await,
        Action::FinishWorkout => tracking.finish_workout().await,
        Action::ToggleAutoStart => tracking.toggle_auto_start().map(|_| ()),
        Action::Quit => Ok(()),
    }
}
