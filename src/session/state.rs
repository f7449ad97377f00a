use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{Pagination, SetId, Workout, WorkoutSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SetStatus {
    Pending,
    Skipped,
    Complete,
}

/// Everything the views render. Replaced wholesale after each server fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub workouts: Vec<Workout>,
    pub pagination: Pagination,
    pub page: u32,
    pub workout: Option<Workout>,
    pub sets: Vec<WorkoutSet>,
    pub complete_sets: Vec<WorkoutSet>,
    pub incomplete_sets: Vec<WorkoutSet>,
    /// Sets the user skipped. The server only reorders them, so this is the
    /// one piece of status the client keeps itself.
    pub skipped: BTreeSet<SetId>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    pub fn workout_id(&self) -> Option<i64> {
        self.workout.as_ref().map(|workout| workout.id)
    }

    /// Installs a freshly fetched workout and its sets. Partitions follow the
    /// server's `complete` flags in server order.
    pub fn apply_details(&mut self, workout: Workout, sets: Vec<WorkoutSet>) {
        if self.workout_id() != Some(workout.id) {
            self.skipped.clear();
        }

        let (complete, incomplete): (Vec<_>, Vec<_>) =
            sets.iter().cloned().partition(|set| set.complete);
        self.skipped
            .retain(|id| incomplete.iter().any(|set| set.id == *id));

        self.workout = Some(workout);
        self.sets = sets;
        self.complete_sets = complete;
        self.incomplete_sets = incomplete;
        self.loading = false;
        self.error = None;
    }

    /// Swaps in one set as the server just returned it, keeping order and
    /// rebuilding the partitions. Unknown ids are ignored.
    pub fn reconcile_set(&mut self, updated: &WorkoutSet) {
        let Some(slot) = self.sets.iter_mut().find(|set| set.id == updated.id) else {
            return;
        };
        *slot = updated.clone();
        if updated.complete {
            self.skipped.remove(&updated.id);
        }

        let (complete, incomplete): (Vec<_>, Vec<_>) =
            self.sets.iter().cloned().partition(|set| set.complete);
        self.complete_sets = complete;
        self.incomplete_sets = incomplete;
    }

    pub fn clear_details(&mut self) {
        self.workout = None;
        self.sets.clear();
        self.complete_sets.clear();
        self.incomplete_sets.clear();
        self.skipped.clear();
    }

    pub fn find_set(&self, id: SetId) -> Option<&WorkoutSet> {
        self.sets.iter().find(|set| set.id == id)
    }

    pub fn set_status(&self, set: &WorkoutSet) -> SetStatus {
        if set.complete {
            SetStatus::Complete
        } else if self.skipped.contains(&set.id) {
            SetStatus::Skipped
        } else {
            SetStatus::Pending
        }
    }

    /// The set being worked on: first pending set, or the first skipped one
    /// once nothing else is left.
    pub fn current_set(&self) -> Option<&WorkoutSet> {
        self.incomplete_sets
            .iter()
            .find(|set| !self.skipped.contains(&set.id))
            .or_else(|| self.incomplete_sets.first())
    }

    /// Incomplete sets after the current one, in order.
    pub fn upcoming_sets(&self, limit: usize) -> Vec<&WorkoutSet> {
        let current = self.current_set().map(|set| set.id);
        self.incomplete_sets
            .iter()
            .filter(|set| Some(set.id) != current)
            .take(limit)
            .collect()
    }

    /// Most recently completed first.
    pub fn recent_complete(&self, limit: usize) -> Vec<&WorkoutSet> {
        self.complete_sets.iter().rev().take(limit).collect()
    }

    /// Completed over total, 0.0 for an empty workout.
    pub fn progress(&self) -> f64 {
        if self.sets.is_empty() {
            0.0
        } else {
            self.complete_sets.len() as f64 / self.sets.len() as f64
        }
    }
}
