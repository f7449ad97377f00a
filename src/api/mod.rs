//! Typed access to the workout backend.

mod auth;
pub mod client;
pub mod error;
pub mod sets;
mod users;
pub mod workouts;

use async_trait::async_trait;

use crate::models::{
    NewSet, NewWorkout, Page, SetId, SetPatch, Workout, WorkoutId, WorkoutPatch, WorkoutSet,
};

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use sets::collect_pages;

/// Workout and set operations the session store depends on.
#[async_trait]
pub trait GainsApi: Send + Sync {
    async fn list_workouts(&self, page: u32) -> ApiResult<Page<Workout>>;
    async fn get_workout(&self, id: WorkoutId) -> ApiResult<Workout>;
    async fn create_workout(&self, workout: &NewWorkout) -> ApiResult<Workout>;
    async fn update_workout(&self, id: WorkoutId, patch: &WorkoutPatch) -> ApiResult<Workout>;
    async fn delete_workout(&self, id: WorkoutId) -> ApiResult<()>;
    async fn duplicate_workout(&self, id: WorkoutId) -> ApiResult<Workout>;
    async fn start_workout(&self, id: WorkoutId) -> ApiResult<Workout>;
    async fn complete_workout(&self, id: WorkoutId) -> ApiResult<Workout>;

    async fn list_sets_page(&self, workout: WorkoutId, page: u32) -> ApiResult<Page<WorkoutSet>>;
    async fn create_set(&self, set: &NewSet) -> ApiResult<WorkoutSet>;
    async fn update_set(&self, id: SetId, patch: &SetPatch) -> ApiResult<WorkoutSet>;
    async fn delete_set(&self, id: SetId) -> ApiResult<()>;
    async fn duplicate_set(&self, id: SetId) -> ApiResult<WorkoutSet>;
    async fn complete_set(&self, id: SetId) -> ApiResult<WorkoutSet>;
    async fn skip_set(&self, id: SetId) -> ApiResult<WorkoutSet>;
    async fn move_set(&self, id: SetId, new_position: u32) -> ApiResult<()>;

    /// Every set of a workout, gathered across all pages in server order.
    async fn list_all_sets(&self, workout: WorkoutId) -> ApiResult<Page<WorkoutSet>> {
        collect_pages(|page| self.list_sets_page(workout, page)).await
    }
}

#[async_trait]
impl GainsApi for ApiClient {
    async fn list_workouts(&self, page: u32) -> ApiResult<Page<Workout>> {
        ApiClient::list_workouts(self, page).await
    }

    async fn get_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        ApiClient::get_workout(self, id).await
    }

    async fn create_workout(&self, workout: &NewWorkout) -> ApiResult<Workout> {
        ApiClient::create_workout(self, workout).await
    }

    async fn update_workout(&self, id: WorkoutId, patch: &WorkoutPatch) -> ApiResult<Workout> {
        ApiClient::update_workout(self, id, patch).await
    }

    async fn delete_workout(&self, id: WorkoutId) -> ApiResult<()> {
        ApiClient::delete_workout(self, id).await
    }

    async fn duplicate_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        ApiClient::duplicate_workout(self, id).await
    }

    async fn start_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        ApiClient::start_workout(self, id).await
    }

    async fn complete_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        ApiClient::complete_workout(self, id).await
    }

    async fn list_sets_page(&self, workout: WorkoutId, page: u32) -> ApiResult<Page<WorkoutSet>> {
        ApiClient::list_sets_page(self, workout, page).await
    }

    async fn create_set(&self, set: &NewSet) -> ApiResult<WorkoutSet> {
        ApiClient::create_set(self, set).await
    }

    async fn update_set(&self, id: SetId, patch: &SetPatch) -> ApiResult<WorkoutSet> {
        ApiClient::update_set(self, id, patch).await
    }

    async fn delete_set(&self, id: SetId) -> ApiResult<()> {
        ApiClient::delete_set(self, id).await
    }

    async fn duplicate_set(&self, id: SetId) -> ApiResult<WorkoutSet> {
        ApiClient::duplicate_set(self, id).await
    }

    async fn complete_set(&self, id: SetId) -> ApiResult<WorkoutSet> {
        ApiClient::complete_set(self, id).await
    }

    async fn skip_set(&self, id: SetId) -> ApiResult<WorkoutSet> {
        ApiClient::skip_set(self, id).await
    }

    async fn move_set(&self, id: SetId, new_position: u32) -> ApiResult<()> {
        ApiClient::move_set(self, id, new_position).await
    }
}
