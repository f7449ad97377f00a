use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Patch, WorkoutId};

pub type SetId = i64;

/// One prescribed or performed set. `set_order` is the dense position inside
/// the workout; `set_number` counts sets of the same exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: SetId,
    pub workout: WorkoutId,
    pub exercise_name: String,
    #[serde(default)]
    pub set_order: Option<u32>,
    #[serde(default)]
    pub set_number: Option<u32>,
    #[serde(default)]
    pub set_type: String,
    #[serde(default, deserialize_with = "super::decimal::deserialize_optional")]
    pub loading: Option<f64>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub focus: String,
    /// Rest after this set, in seconds.
    #[serde(default)]
    pub rest: Option<u64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub is_active_set: bool,
    #[serde(default)]
    pub set_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub set_duration: Option<u64>,
}

/// The user-editable part of a set; batch creation repeats it N times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetTemplate {
    pub exercise_name: String,
    #[serde(default)]
    pub set_type: String,
    #[serde(default)]
    pub focus: String,
    pub loading: Option<f64>,
    pub reps: Option<u32>,
    pub rest: Option<u64>,
    #[serde(default)]
    pub notes: String,
}

impl SetTemplate {
    pub fn new(exercise_name: impl Into<String>) -> Self {
        Self {
            exercise_name: exercise_name.into(),
            set_type: String::new(),
            focus: String::new(),
            loading: None,
            reps: None,
            rest: None,
            notes: String::new(),
        }
    }

    pub fn matches(&self, set: &WorkoutSet) -> bool {
        self.exercise_name == set.exercise_name
            && self.set_type == set.set_type
            && self.focus == set.focus
            && self.loading == set.loading
            && self.reps == set.reps
            && self.rest == set.rest
            && self.notes == set.notes
    }
}

/// Body for `POST /sets/`: the template plus fresh bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSet {
    pub workout: WorkoutId,
    #[serde(flatten)]
    pub template: SetTemplate,
    pub complete: bool,
    pub set_duration: Option<u64>,
    pub set_start_time: Option<DateTime<Utc>>,
    pub is_active_set: bool,
}

impl NewSet {
    pub fn from_template(workout: WorkoutId, template: SetTemplate) -> Self {
        Self {
            workout,
            template,
            complete: false,
            set_duration: None,
            set_start_time: None,
            is_active_set: false,
        }
    }
}

/// Partial update for `PATCH /sets/{id}/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub loading: Patch<f64>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub reps: Patch<u32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub rest: Patch<u64>,
}
