use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{SetId, WorkoutId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    #[default]
    NotStarted,
    Running,
    Resting,
    Completed,
}

impl SessionPhase {
    pub fn is_live(self) -> bool {
        matches!(self, SessionPhase::Running | SessionPhase::Resting)
    }
}

/// Persisted form of the rest timer. Only the start and the duration are
/// stored; the remaining time is always recomputed from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestSnapshot {
    pub is_resting: bool,
    pub rest_start_time: DateTime<Utc>,
    pub rest_duration: u64,
    #[serde(default)]
    pub workout_id: Option<WorkoutId>,
    #[serde(default)]
    pub set_id: Option<SetId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestTimer {
    pub started_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub remaining_secs: u64,
    pub set_id: Option<SetId>,
    /// Workout the rest belongs to, if one was attached when it started.
    pub workout_id: Option<WorkoutId>,
}

impl RestTimer {
    pub fn snapshot(&self) -> RestSnapshot {
        RestSnapshot {
            is_resting: true,
            rest_start_time: self.started_at,
            rest_duration: self.duration_secs,
            workout_id: self.workout_id,
            set_id: self.set_id,
        }
    }
}

/// Seconds left on a countdown that began at `start`. Clock skew that puts
/// `now` before `start` counts as no time elapsed.
pub fn compute_remaining(now: DateTime<Utc>, start: DateTime<Utc>, duration_secs: u64) -> u64 {
    duration_secs.saturating_sub(elapsed_secs(now, start))
}

pub fn elapsed_secs(now: DateTime<Utc>, start: DateTime<Utc>) -> u64 {
    (now - start).num_seconds().max(0) as u64
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: SessionPhase,
    pub workout_id: Option<WorkoutId>,
    pub workout_started_at: Option<DateTime<Utc>>,
    pub elapsed_secs: u64,
    pub rest: Option<RestTimer>,
    /// When the current set began: workout start, end of the last rest, or a
    /// manual start.
    pub set_started_at: Option<DateTime<Utc>>,
    pub set_elapsed_secs: u64,
    pub manually_started: HashMap<SetId, bool>,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_resting(&self) -> bool {
        self.rest.is_some()
    }

    pub fn rest_remaining_secs(&self) -> u64 {
        self.rest.map(|rest| rest.remaining_secs).unwrap_or(0)
    }

    pub fn begin_workout(
        &mut self,
        workout_id: WorkoutId,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        self.workout_id = Some(workout_id);
        self.workout_started_at = Some(started_at);
        if self.set_started_at.is_none() {
            self.set_started_at = Some(now);
        }
        self.phase = if self.rest.is_some() {
            SessionPhase::Resting
        } else {
            SessionPhase::Running
        };
        self.sync(now);
    }

    pub fn begin_rest(
        &mut self,
        started_at: DateTime<Utc>,
        duration_secs: u64,
        set_id: Option<SetId>,
        now: DateTime<Utc>,
    ) {
        self.rest = Some(RestTimer {
            started_at,
            duration_secs,
            remaining_secs: compute_remaining(now, started_at, duration_secs),
            set_id,
            workout_id: self.workout_id,
        });
        if self.phase != SessionPhase::Completed {
            self.phase = SessionPhase::Resting;
        }
    }

    /// Drops the rest timer and returns to the phase the workout clock implies.
    pub fn end_rest(&mut self, now: DateTime<Utc>) {
        if self.rest.take().is_none() {
            return;
        }
        self.set_started_at = Some(now);
        self.phase = match self.phase {
            SessionPhase::Completed => SessionPhase::Completed,
            _ if self.workout_started_at.is_some() => SessionPhase::Running,
            _ => SessionPhase::NotStarted,
        };
    }

    /// Recomputes every derived number from its anchor. Returns true when
    /// this call saw the rest countdown reach zero.
    pub fn sync(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != SessionPhase::Completed {
            if let Some(started_at) = self.workout_started_at {
                self.elapsed_secs = elapsed_secs(now, started_at);
            }
        }
        if let Some(set_started_at) = self.set_started_at {
            self.set_elapsed_secs = elapsed_secs(now, set_started_at);
        }

        let Some(rest) = self.rest.as_mut() else {
            return false;
        };
        rest.remaining_secs = compute_remaining(now, rest.started_at, rest.duration_secs);
        if rest.remaining_secs == 0 {
            let finished_at =
                rest.started_at + chrono::Duration::seconds(rest.duration_secs as i64);
            self.end_rest(finished_at);
            self.set_elapsed_secs = elapsed_secs(now, finished_at);
            return true;
        }
        false
    }

    pub fn complete(&mut self, duration_secs: Option<u64>) {
        if let Some(duration) = duration_secs {
            self.elapsed_secs = duration;
        }
        self.rest = None;
        self.set_started_at = None;
        self.set_elapsed_secs = 0;
        self.phase = SessionPhase::Completed;
    }

    /// Forgets the current workout. The manual-start map is kept.
    pub fn detach(&mut self) {
        let manually_started = std::mem::take(&mut self.manually_started);
        *self = Self {
            manually_started,
            ..Self::default()
        };
    }
}
