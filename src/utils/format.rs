//! Display helpers shared by the CLI and the live view.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::models::WorkoutSet;

/// Running clock: `H:MM:SS` once past an hour, `M:SS` before.
pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Recorded workout duration, always `HH:MM:SS`.
pub fn format_duration(duration_secs: Option<u64>) -> String {
    let total = duration_secs.unwrap_or(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

pub fn format_loading(loading: Option<f64>) -> String {
    match loading {
        Some(kg) if kg != 0.0 => format!("{kg}kg"),
        _ => "Bodyweight".to_string(),
    }
}

/// One-line summary: `Squat 100kg x 5`, with the set type appended when set.
pub fn format_set(set: &WorkoutSet) -> String {
    let mut line = format!("{} {}", set.exercise_name, format_loading(set.loading));
    if let Some(reps) = set.reps {
        line.push_str(&format!(" x {reps}"));
    }
    if !set.set_type.is_empty() {
        line.push_str(&format!(" ({})", set.set_type));
    }
    line
}

pub fn format_datetime(value: Option<DateTime<Utc>>) -> String {
    format_datetime_in(value, &Local)
}

/// `DD/MM/YYYY - HH:MM` in the given zone, `N/A` when absent.
pub fn format_datetime_in<Tz: TimeZone>(value: Option<DateTime<Utc>>, zone: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match value {
        Some(instant) => instant
            .with_timezone(zone)
            .format("%d/%m/%Y - %H:%M")
            .to_string(),
        None => "N/A".to_string(),
    }
}
