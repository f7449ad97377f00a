use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Patch;

pub type WorkoutId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
    pub workout_name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub complete: bool,
    #[serde(default, deserialize_with = "super::decimal::deserialize_optional")]
    pub user_weight: Option<f64>,
    #[serde(default)]
    pub sleep_score: Option<i32>,
    #[serde(default)]
    pub sleep_quality: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Seconds, recorded by the server when the workout is completed.
    #[serde(default)]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkoutStatus {
    NotStarted,
    InProgress,
    Complete,
}

impl Workout {
    pub fn status(&self) -> WorkoutStatus {
        if self.complete {
            WorkoutStatus::Complete
        } else if self.start_time.is_some() {
            WorkoutStatus::InProgress
        } else {
            WorkoutStatus::NotStarted
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWorkout {
    pub workout_name: String,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_quality: Option<String>,
}

impl NewWorkout {
    pub fn named(workout_name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            workout_name: workout_name.into(),
            date,
            notes: None,
            user_weight: None,
            sleep_score: None,
            sleep_quality: None,
        }
    }
}

/// Partial update for `PATCH /workouts/{id}/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkoutPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_quality: Option<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub user_weight: Patch<f64>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub sleep_score: Patch<i32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub start_time: Patch<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub duration: Patch<u64>,
}

impl WorkoutPatch {
    /// Body that moves a completed workout back to in-progress.
    pub fn reopen() -> Self {
        Self {
            complete: Some(false),
            duration: Patch::Clear,
            ..Self::default()
        }
    }
}
