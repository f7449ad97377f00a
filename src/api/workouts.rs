use reqwest::Method;
use serde_json::Value;

use crate::models::{NewWorkout, Page, Workout, WorkoutId, WorkoutPatch};

use super::{
    client::{decode, unwrap_envelope, ApiClient},
    error::{ApiError, ApiResult},
};

/// Workout listings come back paginated, but a bare array is accepted too.
pub(crate) fn decode_page<T: serde::de::DeserializeOwned>(value: Value) -> ApiResult<Page<T>> {
    match value {
        Value::Array(_) => {
            let results: Vec<T> = decode(value)?;
            Ok(Page {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            })
        }
        other => decode(other),
    }
}

impl ApiClient {
    pub async fn list_workouts(&self, page: u32) -> ApiResult<Page<Workout>> {
        let value: Value = self
            .get("workouts/", &[("page", page.max(1).to_string())])
            .await?;
        decode_page(value)
    }

    /// A body without an `id` is the server's empty shell for a missing workout.
    pub async fn get_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        let value: Value = self.get(&format!("workouts/{id}/"), &[]).await?;
        if value.get("id").map_or(true, Value::is_null) {
            return Err(ApiError::NotFound(format!("workout {id}")));
        }
        decode(value)
    }

    pub async fn create_workout(&self, workout: &NewWorkout) -> ApiResult<Workout> {
        let value: Value = self.send(Method::POST, "workouts/", workout).await?;
        unwrap_envelope(value, "workout")
    }

    pub async fn update_workout(&self, id: WorkoutId, patch: &WorkoutPatch) -> ApiResult<Workout> {
        let value: Value = self
            .send(Method::PATCH, &format!("workouts/{id}/"), patch)
            .await?;
        unwrap_envelope(value, "workout")
    }

    pub async fn delete_workout(&self, id: WorkoutId) -> ApiResult<()> {
        self.delete(&format!("workouts/{id}/")).await
    }

    /// Returns the copy, which has a fresh id.
    pub async fn duplicate_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        let value = self
            .action(Method::POST, &format!("workouts/{id}/duplicate/"))
            .await?;
        unwrap_envelope(value, "workout")
    }

    pub async fn start_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        let value = self
            .action(Method::PATCH, &format!("workouts/{id}/start_workout/"))
            .await?;
        unwrap_envelope(value, "workout")
    }

    pub async fn complete_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        let value = self
            .action(Method::PATCH, &format!("workouts/{id}/complete_workout/"))
            .await?;
        unwrap_envelope(value, "workout")
    }
}
