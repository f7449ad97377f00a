//! Live tracking: ties the session store to the timer controller for one
//! workout while the live view is open.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::{
    api::ApiError,
    models::{SetId, WorkoutId, WorkoutSet},
    session::SessionStore,
    settings::SettingsStore,
    timer::TimerController,
};

/// Guard for an open live view. Mounting loads the workout and resumes its
/// clocks; dropping (or `unmount`) aborts the tickers and cancels in-flight
/// requests. Mounting itself never cleans anything up.
pub struct LiveTracking {
    store: SessionStore,
    timer: TimerController,
    settings: Arc<SettingsStore>,
    workout_id: WorkoutId,
    mounted: bool,
}

impl LiveTracking {
    pub async fn mount(
        store: SessionStore,
        timer: TimerController,
        settings: Arc<SettingsStore>,
        workout_id: WorkoutId,
    ) -> Result<Self> {
        store.begin_scope();
        let tracking = Self {
            store,
            timer,
            settings,
            workout_id,
            mounted: true,
        };

        tracking
            .timer
            .hydrate()
            .await
            .context("failed to restore timers")?;
        tracking.reload().await?;

        info!("Live tracking mounted for workout {workout_id}");
        Ok(tracking)
    }

    pub fn workout_id(&self) -> WorkoutId {
        self.workout_id
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn timer(&self) -> &TimerController {
        &self.timer
    }

    pub fn auto_start_next_set(&self) -> bool {
        self.settings.auto_start_next_set()
    }

    /// Re-fetches the workout and points the clocks at it.
    pub async fn reload(&self) -> Result<()> {
        self.store.fetch_workout_details(self.workout_id).await?;
        self.attach().await
    }

    pub async fn start_workout(&self) -> Result<()> {
        let workout = self.store.start_workout(self.workout_id).await?;
        self.timer
            .start_workout_clock(self.workout_id, workout.start_time)
            .await?;
        Ok(())
    }

    /// Completes the current set. When the set actually became complete its
    /// rest countdown starts; a set without rest restarts the set clock.
    pub async fn complete_current_set(&self) -> Result<Option<WorkoutSet>> {
        let Some(set) = self.current_set() else {
            self.store.notifier().info("No sets left to complete.");
            return Ok(None);
        };

        let updated = self.store.toggle_set_complete(set.id).await?;
        if updated.complete {
            self.timer.clear_set_started(updated.id).await?;
            match updated.rest.unwrap_or(0) {
                0 => self.timer.restart_set_clock(),
                rest => self.timer.start_rest(Some(updated.id), rest).await?,
            }
        }
        Ok(Some(updated))
    }

    pub async fn skip_current_set(&self) -> Result<()> {
        let Some(set) = self.current_set() else {
            self.store.notifier().info("No sets left to skip.");
            return Ok(());
        };
        self.store.skip_set(set.id).await?;
        self.timer.clear_set_started(set.id).await?;
        self.timer.restart_set_clock();
        Ok(())
    }

    /// Explicit start for the current set, used when auto-start is off.
    pub async fn mark_current_set_started(&self) -> Result<()> {
        let Some(set) = self.current_set() else {
            return Ok(());
        };
        self.timer.mark_set_started(set.id).await?;
        self.store
            .notifier()
            .info(format!("Started {}.", set.exercise_name));
        Ok(())
    }

    pub async fn duplicate_current_set(&self) -> Result<()> {
        if let Some(set) = self.current_set() {
            self.store.duplicate_set(set.id).await?;
        }
        Ok(())
    }

    pub async fn delete_current_set(&self) -> Result<()> {
        if let Some(set) = self.current_set() {
            self.store.delete_set(set.id).await?;
            self.timer.clear_set_started(set.id).await?;
        }
        Ok(())
    }

    pub async fn cancel_rest(&self) -> Result<()> {
        self.timer.stop_rest().await
    }

    /// Toggles completion on the server. Completing stops both clocks at the
    /// server-recorded duration; reopening re-attaches them.
    pub async fn finish_workout(&self) -> Result<()> {
        let workout = self.store.toggle_complete(self.workout_id).await?;
        if workout.complete {
            self.timer.complete_workout(workout.duration).await?;
        } else {
            self.timer.attach_workout(&workout).await?;
        }
        Ok(())
    }

    pub fn toggle_auto_start(&self) -> Result<bool> {
        let enabled = !self.settings.auto_start_next_set();
        self.settings.set_auto_start_next_set(enabled)?;
        self.store.notifier().info(if enabled {
            "Next set starts automatically."
        } else {
            "Sets start manually."
        });
        Ok(enabled)
    }

    /// Seconds on the current set's clock, or `None` while it waits for a
    /// manual start.
    pub fn set_clock_secs(&self) -> Option<u64> {
        let set_id = self.current_set().map(|set| set.id)?;
        self.set_clock_for(set_id)
    }

    fn set_clock_for(&self, set_id: SetId) -> Option<u64> {
        let snapshot = self.timer.snapshot();
        let running = self.settings.auto_start_next_set() || self.timer.is_set_started(set_id);
        (running && snapshot.state.set_started_at.is_some())
            .then_some(snapshot.state.set_elapsed_secs)
    }

    pub fn current_set(&self) -> Option<WorkoutSet> {
        self.store.snapshot().current_set().cloned()
    }

    /// Explicit unmount; identical to dropping the guard.
    pub fn unmount(mut self) {
        self.teardown();
    }

    async fn attach(&self) -> Result<()> {
        let workout = self
            .store
            .snapshot()
            .workout
            .filter(|workout| workout.id == self.workout_id)
            .ok_or_else(|| ApiError::NotFound(format!("workouts/{}", self.workout_id)))?;
        self.timer.attach_workout(&workout).await
    }

    fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.timer.cleanup();
        self.store.end_scope();
        info!("Live tracking unmounted for workout {}", self.workout_id);
    }
}

impl Drop for LiveTracking {
    fn drop(&mut self) {
        self.teardown();
    }
}
