use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle, time};

use crate::{
    db::Database,
    models::{SetId, Workout, WorkoutId},
};

use super::{Clock, SessionPhase, TimerState};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub rest_remaining_secs: u64,
}

impl TimerSnapshot {
    fn of(state: &TimerState) -> Self {
        Self {
            rest_remaining_secs: state.rest_remaining_secs(),
            state: state.clone(),
        }
    }
}

type TickerSlot = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Owns the workout clock and the rest countdown for the live view.
///
/// Both clocks are anchor based: only a start instant (and a duration for the
/// rest timer) is stored, and every tick recomputes from the wall clock, so a
/// late or skipped tick never drifts. Each clock has one ticker slot; a new
/// ticker aborts the previous one before it is spawned.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    db: Database,
    clock: Arc<dyn Clock>,
    updates: Arc<watch::Sender<TimerSnapshot>>,
    workout_ticker: TickerSlot,
    rest_ticker: TickerSlot,
    tick_interval: Duration,
}

impl TimerController {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        let state = TimerState::new();
        let (updates, _) = watch::channel(TimerSnapshot::of(&state));

        Self {
            state: Arc::new(Mutex::new(state)),
            db,
            clock,
            updates: Arc::new(updates),
            workout_ticker: Arc::new(Mutex::new(None)),
            rest_ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let mut guard = self.lock_state();
        guard.sync(self.clock.now());
        TimerSnapshot::of(&guard)
    }

    /// Rebuilds timer state from client storage. An expired rest snapshot is
    /// dropped before anything is published.
    pub async fn hydrate(&self) -> Result<()> {
        let manual = self.db.load_manual_sets().await?;
        let stored = self.db.load_rest_snapshot().await?;
        let now = self.clock.now();

        let resume = match stored {
            Some(snapshot) if snapshot.is_resting => {
                let remaining = super::compute_remaining(
                    now,
                    snapshot.rest_start_time,
                    snapshot.rest_duration,
                );
                if remaining == 0 {
                    log_info!("Discarding expired rest timer from {}", snapshot.rest_start_time);
                    self.db.clear_rest_snapshot().await?;
                    None
                } else {
                    Some(snapshot)
                }
            }
            Some(_) => {
                self.db.clear_rest_snapshot().await?;
                None
            }
            None => None,
        };

        {
            let mut guard = self.lock_state();
            guard.manually_started = manual;
            if let Some(snapshot) = &resume {
                guard.begin_rest(
                    snapshot.rest_start_time,
                    snapshot.rest_duration,
                    snapshot.set_id,
                    now,
                );
                if let Some(rest) = guard.rest.as_mut() {
                    rest.workout_id = snapshot.workout_id;
                }
            }
        }

        if let Some(snapshot) = resume {
            log_info!(
                "Resuming rest timer: {}s left of {}s",
                super::compute_remaining(now, snapshot.rest_start_time, snapshot.rest_duration),
                snapshot.rest_duration
            );
            self.spawn_rest_ticker();
        }

        self.publish();
        Ok(())
    }

    /// Points the clocks at `workout`. The server's `start_time` is the
    /// anchor whenever it exists; a workout without one stays NotStarted.
    pub async fn attach_workout(&self, workout: &Workout) -> Result<()> {
        let now = self.clock.now();

        // A rest left over from another workout does not carry into this one.
        let stale_rest = {
            let guard = self.lock_state();
            matches!(
                guard.rest.and_then(|rest| rest.workout_id),
                Some(owner) if owner != workout.id
            )
        };
        if stale_rest {
            self.stop_rest().await?;
        }

        if workout.complete {
            self.cancel_ticker(&self.workout_ticker);
            self.cancel_ticker(&self.rest_ticker);
            {
                let mut guard = self.lock_state();
                guard.workout_id = Some(workout.id);
                guard.workout_started_at = workout.start_time;
                guard.complete(workout.duration);
            }
            self.db.clear_workout_anchor(workout.id).await?;
            self.publish();
            return Ok(());
        }

        match workout.start_time {
            Some(started_at) => {
                let local = self.db.load_workout_anchor(workout.id).await?;
                if local != Some(started_at) {
                    if local.is_some() {
                        log_warn!(
                            "Workout {} local anchor differs from server; using start_time",
                            workout.id
                        );
                    }
                    self.db.save_workout_anchor(workout.id, started_at).await?;
                }
                self.lock_state().begin_workout(workout.id, started_at, now);
                self.spawn_workout_ticker();
            }
            None => {
                self.cancel_ticker(&self.workout_ticker);
                let resting = {
                    let mut guard = self.lock_state();
                    guard.workout_id = Some(workout.id);
                    guard.workout_started_at = None;
                    guard.elapsed_secs = 0;
                    guard.phase = if guard.rest.is_some() {
                        SessionPhase::Resting
                    } else {
                        SessionPhase::NotStarted
                    };
                    guard.is_resting()
                };
                if resting {
                    self.spawn_rest_ticker();
                }
            }
        }

        self.publish();
        Ok(())
    }

    /// Starts the workout clock after an explicit start action.
    pub async fn start_workout_clock(
        &self,
        workout_id: WorkoutId,
        started_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let now = self.clock.now();
        let started_at = started_at.unwrap_or(now);

        self.db.save_workout_anchor(workout_id, started_at).await?;
        self.lock_state().begin_workout(workout_id, started_at, now);
        self.spawn_workout_ticker();
        self.publish();

        log_info!("Workout {workout_id} clock started at {started_at}");
        Ok(())
    }

    /// Replaces any running rest timer with a fresh one. A zero duration
    /// simply ends the current rest.
    pub async fn start_rest(&self, set_id: Option<SetId>, duration_secs: u64) -> Result<()> {
        self.cancel_ticker(&self.rest_ticker);

        if duration_secs == 0 {
            return self.stop_rest().await;
        }

        let now = self.clock.now();
        let snapshot = {
            let mut guard = self.lock_state();
            guard.begin_rest(now, duration_secs, set_id, now);
            guard.rest.map(|rest| rest.snapshot())
        };

        if let Some(snapshot) = snapshot {
            self.db.save_rest_snapshot(&snapshot).await?;
        }

        self.spawn_rest_ticker();
        self.publish();
        log_info!("Rest timer started: {duration_secs}s after set {set_id:?}");
        Ok(())
    }

    pub async fn stop_rest(&self) -> Result<()> {
        self.cancel_ticker(&self.rest_ticker);
        {
            let mut guard = self.lock_state();
            let now = self.clock.now();
            guard.end_rest(now);
        }
        self.db.clear_rest_snapshot().await?;
        self.publish();
        Ok(())
    }

    /// One recompute step. Returns the state after it; clears the persisted
    /// rest snapshot when the countdown just finished.
    pub async fn tick(&self) -> Result<TimerSnapshot> {
        let (rest_finished, snapshot) = {
            let mut guard = self.lock_state();
            let finished = guard.sync(self.clock.now());
            (finished, TimerSnapshot::of(&guard))
        };

        if rest_finished {
            log_info!("Rest timer finished");
            self.db.clear_rest_snapshot().await?;
        }

        self.updates.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    pub async fn complete_workout(&self, duration_secs: Option<u64>) -> Result<()> {
        self.cancel_ticker(&self.workout_ticker);
        self.cancel_ticker(&self.rest_ticker);

        let workout_id = {
            let mut guard = self.lock_state();
            guard.sync(self.clock.now());
            guard.complete(duration_secs);
            guard.workout_id
        };

        if let Some(workout_id) = workout_id {
            self.db.clear_workout_anchor(workout_id).await?;
        }
        self.db.clear_rest_snapshot().await?;
        self.publish();
        Ok(())
    }

    /// Records that the user explicitly started `set_id` (auto-advance off).
    pub async fn mark_set_started(&self, set_id: SetId) -> Result<()> {
        let manual = {
            let mut guard = self.lock_state();
            guard.manually_started.insert(set_id, true);
            guard.set_started_at = Some(self.clock.now());
            guard.set_elapsed_secs = 0;
            guard.manually_started.clone()
        };
        self.db.save_manual_sets(&manual).await?;
        self.publish();
        Ok(())
    }

    /// Restarts the per-set clock, used when the next set follows without rest.
    pub fn restart_set_clock(&self) {
        {
            let mut guard = self.lock_state();
            guard.set_started_at = Some(self.clock.now());
            guard.set_elapsed_secs = 0;
        }
        self.publish();
    }

    pub fn is_set_started(&self, set_id: SetId) -> bool {
        self.lock_state()
            .manually_started
            .get(&set_id)
            .copied()
            .unwrap_or(false)
    }

    pub async fn clear_set_started(&self, set_id: SetId) -> Result<()> {
        let manual = {
            let mut guard = self.lock_state();
            if guard.manually_started.remove(&set_id).is_none() {
                return Ok(());
            }
            guard.manually_started.clone()
        };
        self.db.save_manual_sets(&manual).await?;
        self.publish();
        Ok(())
    }

    /// Unmount: abort every ticker and forget the current workout. The
    /// persisted rest snapshot is left alone so a later mount resumes it.
    pub fn cleanup(&self) {
        self.cancel_ticker(&self.workout_ticker);
        self.cancel_ticker(&self.rest_ticker);
        self.lock_state().detach();
        self.publish();
        log_info!("Timers cleaned up");
    }

    /// The workout ticker also recomputes the rest countdown, so it takes
    /// over from a running rest ticker.
    fn spawn_workout_ticker(&self) {
        self.cancel_ticker(&self.rest_ticker);
        let controller = self.clone();
        self.spawn_into(&self.workout_ticker, move || {
            let phase = controller.lock_state().phase;
            phase.is_live()
        });
    }

    /// Only needed while no workout clock runs; otherwise the workout ticker
    /// already drives the countdown.
    fn spawn_rest_ticker(&self) {
        if self.workout_ticker_running() {
            self.cancel_ticker(&self.rest_ticker);
            return;
        }
        let controller = self.clone();
        self.spawn_into(&self.rest_ticker, move || controller.lock_state().is_resting());
    }

    fn workout_ticker_running(&self) -> bool {
        lock_slot(&self.workout_ticker)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Aborts whatever occupies `slot`, then spawns a ticker that keeps
    /// calling `tick` while `keep_going` holds.
    fn spawn_into<F>(&self, slot: &TickerSlot, keep_going: F)
    where
        F: Fn() -> bool + Send + 'static,
    {
        let mut ticker_guard = lock_slot(slot);
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let controller = self.clone();
        let tick_interval = self.tick_interval;
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            // The first tick completes immediately; state was just published.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(err) = controller.tick().await {
                    log_error!("Timer tick failed: {err:#}");
                }
                if !keep_going() {
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    fn cancel_ticker(&self, slot: &TickerSlot) {
        if let Some(handle) = lock_slot(slot).take() {
            handle.abort();
        }
    }

    fn publish(&self) {
        let snapshot = {
            let guard = self.lock_state();
            TimerSnapshot::of(&guard)
        };
        self.updates.send_replace(snapshot);
    }

    fn lock_state(&self) -> MutexGuard<'_, TimerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn lock_slot(slot: &TickerSlot) -> MutexGuard<'_, Option<JoinHandle<()>>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
