use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};

use futures::future::join_all;
use log::{debug, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    api::{ApiError, ApiResult, GainsApi},
    models::{
        NewSet, NewWorkout, SetId, SetPatch, SetTemplate, Workout, WorkoutId, WorkoutPatch,
        WorkoutSet,
    },
};

use super::{Notifier, SessionState};

pub const LOAD_WORKOUTS_FAILED: &str = "Failed to load workouts. Please try again.";
pub const WORKOUT_NOT_FOUND: &str = "Workout not found.";
pub const LOAD_DETAILS_FAILED: &str = "Error fetching workout details.";

/// Result of a batch set creation. Creations are independent; nothing is
/// rolled back when some of them fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub requested: usize,
    pub created: usize,
    pub failed: usize,
}

/// Server-reconciled state for the workout list and the focused workout.
///
/// Every mutation is one API call followed by an unconditional re-fetch; the
/// store never patches its own copy optimistically. Failures leave the last
/// good state in place and raise an error notice.
#[derive(Clone)]
pub struct SessionStore {
    api: Arc<dyn GainsApi>,
    state: Arc<Mutex<SessionState>>,
    updates: Arc<watch::Sender<SessionState>>,
    notifier: Notifier,
    scope: Arc<Mutex<CancellationToken>>,
}

impl SessionStore {
    pub fn new(api: Arc<dyn GainsApi>, notifier: Notifier) -> Self {
        let (updates, _) = watch::channel(SessionState::default());
        Self {
            api,
            state: Arc::new(Mutex::new(SessionState::default())),
            updates: Arc::new(updates),
            notifier,
            scope: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock_state().clone()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Opens a fresh request scope; earlier in-flight requests keep theirs.
    pub fn begin_scope(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *lock(&self.scope) = token.clone();
        token
    }

    /// Cancels everything started under the current scope. Cancelled
    /// operations return `ApiError::Cancelled` and never touch state.
    pub fn end_scope(&self) {
        let mut guard = lock(&self.scope);
        guard.cancel();
        *guard = CancellationToken::new();
    }

    pub async fn fetch_all_workouts(&self, page: u32) -> ApiResult<()> {
        let token = self.current_scope();
        self.load_workouts(&token, page).await
    }

    pub async fn fetch_workout_details(&self, workout_id: WorkoutId) -> ApiResult<()> {
        let token = self.current_scope();
        self.load_details(&token, workout_id).await
    }

    pub async fn create_workout(&self, workout: &NewWorkout) -> ApiResult<WorkoutId> {
        let token = self.current_scope();
        let created = self
            .guarded(&token, self.api.create_workout(workout))
            .await
            .map_err(|err| self.report("Failed to create workout.", err))?;

        self.notifier.success("Workout created!");
        self.settle(self.refresh_list(&token).await);
        Ok(created.id)
    }

    pub async fn update_workout(
        &self,
        workout_id: WorkoutId,
        patch: &WorkoutPatch,
    ) -> ApiResult<()> {
        let token = self.current_scope();
        self.guarded(&token, self.api.update_workout(workout_id, patch))
            .await
            .map_err(|err| self.report("Failed to update workout.", err))?;

        self.notifier.success("Workout updated successfully!");
        self.settle(self.refresh_workout(&token, workout_id).await);
        Ok(())
    }

    /// Returns the server's copy, which now carries `start_time`.
    pub async fn start_workout(&self, workout_id: WorkoutId) -> ApiResult<Workout> {
        let token = self.current_scope();
        let started = self
            .guarded(&token, self.api.start_workout(workout_id))
            .await
            .map_err(|err| self.report("Failed to start workout.", err))?;

        self.notifier.success("Workout started!");
        self.settle(self.refresh_workout(&token, workout_id).await);
        Ok(self.focused_or(started))
    }

    /// Incomplete → dedicated completion endpoint (server records duration).
    /// Complete → reopened with `complete = false, duration = null`.
    pub async fn toggle_complete(&self, workout_id: WorkoutId) -> ApiResult<Workout> {
        let token = self.current_scope();

        let known = {
            let state = self.lock_state();
            state
                .workout
                .iter()
                .chain(state.workouts.iter())
                .find(|workout| workout.id == workout_id)
                .map(|workout| workout.complete)
        };
        let is_complete = match known {
            Some(flag) => flag,
            None => {
                self.guarded(&token, self.api.get_workout(workout_id))
                    .await
                    .map_err(|err| self.report("Failed to update workout.", err))?
                    .complete
            }
        };

        let request = async {
            if is_complete {
                self.api
                    .update_workout(workout_id, &WorkoutPatch::reopen())
                    .await
            } else {
                self.api.complete_workout(workout_id).await
            }
        };
        let updated = self
            .guarded(&token, request)
            .await
            .map_err(|err| self.report("Failed to update workout completion.", err))?;

        self.notifier.success("Workout completion status updated!");
        self.settle(self.refresh_workout(&token, workout_id).await);
        Ok(self.focused_or(updated))
    }

    pub async fn delete_workout(&self, workout_id: WorkoutId) -> ApiResult<()> {
        let token = self.current_scope();
        self.guarded(&token, self.api.delete_workout(workout_id))
            .await
            .map_err(|err| self.report("Failed to delete workout.", err))?;

        self.notifier.success("Workout deleted.");
        let cleared = self.write(&token, |state| {
            if state.workout_id() == Some(workout_id) {
                state.clear_details();
            }
        });
        if cleared.is_ok() {
            self.settle(self.refresh_list(&token).await);
        }
        Ok(())
    }

    /// Returns the id of the copy.
    pub async fn duplicate_workout(&self, workout_id: WorkoutId) -> ApiResult<WorkoutId> {
        let token = self.current_scope();
        let copy = self
            .guarded(&token, self.api.duplicate_workout(workout_id))
            .await
            .map_err(|err| self.report("Failed to duplicate workout.", err))?;

        self.notifier.success("Workout duplicated!");
        self.settle(self.refresh_list(&token).await);
        Ok(copy.id)
    }

    /// Issues `count` identical creations concurrently, then re-fetches the
    /// workout whatever happened so the view matches the server.
    pub async fn create_sets(
        &self,
        workout_id: WorkoutId,
        template: &SetTemplate,
        count: usize,
    ) -> ApiResult<BatchOutcome> {
        if count == 0 {
            return Err(self.report(
                "Number of sets must be at least 1.",
                ApiError::Validation("set count must be at least 1".into()),
            ));
        }

        let token = self.current_scope();
        let payload = NewSet::from_template(workout_id, template.clone());
        let batch = join_all((0..count).map(|_| self.api.create_set(&payload)));
        let results = self
            .guarded(&token, async { Ok::<_, ApiError>(batch.await) })
            .await?;

        let mut first_error = None;
        let mut created = 0;
        for result in results {
            match result {
                Ok(_) => created += 1,
                Err(err) => {
                    warn!("Set creation failed: {err}");
                    first_error.get_or_insert(err);
                }
            }
        }
        let outcome = BatchOutcome {
            requested: count,
            created,
            failed: count - created,
        };

        match (created, &first_error) {
            (_, None) => {
                self.notifier
                    .success(format!("Added {created} set(s) successfully!"));
            }
            (0, Some(_)) => {
                self.notifier.error("Failed to add sets.");
            }
            (_, Some(_)) => {
                self.notifier.error(format!(
                    "Added {created} of {count} sets; {} failed.",
                    outcome.failed
                ));
            }
        }

        self.settle(self.load_details(&token, workout_id).await);

        match first_error {
            Some(err) if created == 0 => Err(err),
            _ => Ok(outcome),
        }
    }

    pub async fn update_set(&self, set_id: SetId, patch: &SetPatch) -> ApiResult<()> {
        let token = self.current_scope();
        let updated = self
            .guarded(&token, self.api.update_set(set_id, patch))
            .await
            .map_err(|err| self.report("Failed to update set.", err))?;

        self.notifier.success("Set updated successfully!");
        self.settle(self.load_details(&token, updated.workout).await);
        Ok(())
    }

    pub async fn delete_set(&self, set_id: SetId) -> ApiResult<()> {
        let token = self.current_scope();
        let workout_id = self.workout_for_set(set_id)?;
        self.guarded(&token, self.api.delete_set(set_id))
            .await
            .map_err(|err| self.report("Failed to delete set.", err))?;

        self.notifier.success("Set deleted.");
        self.settle(self.load_details(&token, workout_id).await);
        Ok(())
    }

    /// The copy is appended with fresh completion, order and number.
    pub async fn duplicate_set(&self, set_id: SetId) -> ApiResult<WorkoutSet> {
        let token = self.current_scope();
        let copy = self
            .guarded(&token, self.api.duplicate_set(set_id))
            .await
            .map_err(|err| self.report("Failed to duplicate set.", err))?;

        self.notifier.success("Set duplicated!");
        self.settle(self.load_details(&token, copy.workout).await);
        Ok(copy)
    }

    /// Returns the server's updated set so callers can react to its new
    /// `complete` flag (a rest timer starts only when it became true).
    ///
    /// When the refresh fails the returned set is still installed, so a
    /// second toggle never acts on the pre-toggle copy.
    pub async fn toggle_set_complete(&self, set_id: SetId) -> ApiResult<WorkoutSet> {
        let token = self.current_scope();
        let updated = self
            .guarded(&token, self.api.complete_set(set_id))
            .await
            .map_err(|err| self.report("Failed to update set completion.", err))?;

        self.notifier.success("Set completion updated!");
        if !self.settle(self.load_details(&token, updated.workout).await) {
            let _ = self.write(&token, |state| state.reconcile_set(&updated));
        }
        Ok(updated)
    }

    /// The server moves the set to the end and leaves it incomplete; the
    /// store remembers it as skipped.
    pub async fn skip_set(&self, set_id: SetId) -> ApiResult<()> {
        let token = self.current_scope();
        let skipped = self
            .guarded(&token, self.api.skip_set(set_id))
            .await
            .map_err(|err| self.report("Failed to skip set.", err))?;

        let marked = self.write(&token, |state| {
            state.skipped.insert(set_id);
        });
        self.notifier.success("Set skipped!");
        if marked.is_ok() {
            self.settle(self.load_details(&token, skipped.workout).await);
        }
        Ok(())
    }

    /// Moves a set to a 1-based position. Positions outside `[1, sets]` are
    /// rejected here without a request.
    pub async fn move_set(&self, set_id: SetId, new_position: u32) -> ApiResult<()> {
        let (len, workout_id) = {
            let state = self.lock_state();
            (
                state.sets.len(),
                state.find_set(set_id).map(|set| set.workout),
            )
        };

        let Some(workout_id) = workout_id else {
            return Err(self.report(
                "Set not found in this workout.",
                ApiError::Validation(format!("set {set_id} is not loaded")),
            ));
        };
        if new_position < 1 || new_position as usize > len {
            return Err(self.report(
                format!("Position must be between 1 and {len}."),
                ApiError::Validation(format!("position {new_position} outside 1..={len}")),
            ));
        }

        let token = self.current_scope();
        self.guarded(&token, self.api.move_set(set_id, new_position))
            .await
            .map_err(|err| self.report("Failed to move set.", err))?;

        self.notifier.success("Set order updated!");
        self.settle(self.load_details(&token, workout_id).await);
        Ok(())
    }

    async fn load_workouts(&self, token: &CancellationToken, page: u32) -> ApiResult<()> {
        let page = page.max(1);
        self.write(token, |state| {
            state.loading = true;
            state.error = None;
        })?;

        match self.guarded(token, self.api.list_workouts(page)).await {
            Ok(listing) => self.write(token, |state| {
                state.pagination = listing.pagination();
                state.workouts = listing.results;
                state.page = page;
                state.loading = false;
            }),
            Err(ApiError::Cancelled) => Err(ApiError::Cancelled),
            Err(err) => {
                warn!("Workout listing failed: {err}");
                self.write(token, |state| {
                    state.workouts.clear();
                    state.pagination = Default::default();
                    state.loading = false;
                    state.error = Some(LOAD_WORKOUTS_FAILED.to_string());
                })?;
                self.notifier.error(LOAD_WORKOUTS_FAILED);
                Err(err)
            }
        }
    }

    async fn load_details(
        &self,
        token: &CancellationToken,
        workout_id: WorkoutId,
    ) -> ApiResult<()> {
        self.write(token, |state| {
            state.loading = true;
        })?;

        let fetch = async {
            futures::try_join!(
                self.api.get_workout(workout_id),
                self.api.list_all_sets(workout_id)
            )
        };

        match self.guarded(token, fetch).await {
            Ok((workout, sets)) => {
                debug!("Workout {workout_id}: {} sets", sets.results.len());
                self.write(token, |state| state.apply_details(workout, sets.results))
            }
            Err(ApiError::Cancelled) => Err(ApiError::Cancelled),
            Err(err @ ApiError::NotFound(_)) => {
                self.write(token, |state| {
                    state.clear_details();
                    state.loading = false;
                    state.error = Some(WORKOUT_NOT_FOUND.to_string());
                })?;
                self.notifier.error(WORKOUT_NOT_FOUND);
                Err(err)
            }
            Err(err) => {
                warn!("Loading workout {workout_id} failed: {err}");
                self.write(token, |state| {
                    state.loading = false;
                    state.error = Some(LOAD_DETAILS_FAILED.to_string());
                })?;
                self.notifier.error(LOAD_DETAILS_FAILED);
                Err(err)
            }
        }
    }

    async fn refresh_list(&self, token: &CancellationToken) -> ApiResult<()> {
        let page = self.lock_state().page.max(1);
        self.load_workouts(token, page).await
    }

    /// Re-fetches whatever views currently show `workout_id`.
    async fn refresh_workout(
        &self,
        token: &CancellationToken,
        workout_id: WorkoutId,
    ) -> ApiResult<()> {
        let (focused, listed) = {
            let state = self.lock_state();
            (
                state.workout_id() == Some(workout_id),
                state.workouts.iter().any(|workout| workout.id == workout_id),
            )
        };

        if listed {
            self.refresh_list(token).await?;
        }
        if focused || !listed {
            self.load_details(token, workout_id).await?;
        }
        Ok(())
    }

    async fn guarded<T, F>(&self, token: &CancellationToken, request: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(ApiError::Cancelled),
            result = request => result,
        }
    }

    /// Applies `change` and publishes, unless the scope was cancelled.
    fn write<F>(&self, token: &CancellationToken, change: F) -> ApiResult<()>
    where
        F: FnOnce(&mut SessionState),
    {
        if token.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        let snapshot = {
            let mut guard = self.lock_state();
            change(&mut guard);
            guard.clone()
        };
        self.updates.send_replace(snapshot);
        Ok(())
    }

    /// Absorbs the re-fetch that follows a mutation the server already
    /// applied. The loaders have raised their own notice on failure; state
    /// stays one refresh behind until the next fetch. Returns whether the
    /// refresh went through.
    fn settle(&self, refreshed: ApiResult<()>) -> bool {
        match refreshed {
            Ok(()) => true,
            Err(err) => {
                debug!("Refresh after mutation failed: {err}");
                false
            }
        }
    }

    /// Raises an error notice for a failed operation and hands the error back.
    fn report(&self, message: impl Into<String>, err: ApiError) -> ApiError {
        match &err {
            ApiError::Cancelled => {}
            ApiError::Validation(_) => {
                self.notifier.error(message);
            }
            other => {
                let message = message.into();
                warn!("{message} ({other})");
                self.notifier.error(message);
            }
        }
        err
    }

    fn workout_for_set(&self, set_id: SetId) -> ApiResult<WorkoutId> {
        self.lock_state()
            .find_set(set_id)
            .map(|set| set.workout)
            .ok_or_else(|| {
                self.report(
                    "Set not found in this workout.",
                    ApiError::Validation(format!("set {set_id} is not loaded")),
                )
            })
    }

    fn focused_or(&self, fallback: Workout) -> Workout {
        let state = self.lock_state();
        state
            .workout
            .as_ref()
            .filter(|workout| workout.id == fallback.id)
            .cloned()
            .unwrap_or(fallback)
    }

    fn current_scope(&self) -> CancellationToken {
        lock(&self.scope).clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
