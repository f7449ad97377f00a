use std::future::Future;

use reqwest::Method;
use serde_json::{json, Value};

use crate::models::{NewSet, Page, SetId, SetPatch, WorkoutId, WorkoutSet};

use super::{
    client::{unwrap_envelope, ApiClient},
    error::ApiResult,
    workouts::decode_page,
};

/// Walks a paginated listing: page 1 gives `count` and the page size, the
/// remaining pages are fetched in order and concatenated. The merged page
/// carries no `next`/`previous` links.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> ApiResult<Page<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    let first = fetch(1).await?;
    let page_size = first.results.len() as u64;
    let mut results = first.results;

    if page_size > 0 && first.count > page_size {
        let pages = first.count.div_ceil(page_size);
        for page in 2..=pages {
            let next = fetch(page as u32).await?;
            if next.results.is_empty() {
                break;
            }
            results.extend(next.results);
        }
    }

    Ok(Page {
        count: results.len() as u64,
        next: None,
        previous: None,
        results,
    })
}

impl ApiClient {
    pub async fn list_sets_page(
        &self,
        workout: WorkoutId,
        page: u32,
    ) -> ApiResult<Page<WorkoutSet>> {
        let value: Value = self
            .get(
                "sets/",
                &[("workout", workout.to_string()), ("page", page.to_string())],
            )
            .await?;
        decode_page(value)
    }

    pub async fn get_set(&self, id: SetId) -> ApiResult<WorkoutSet> {
        self.get(&format!("sets/{id}/"), &[]).await
    }

    pub async fn create_set(&self, set: &NewSet) -> ApiResult<WorkoutSet> {
        let value: Value = self.send(Method::POST, "sets/", set).await?;
        unwrap_envelope(value, "set")
    }

    pub async fn update_set(&self, id: SetId, patch: &SetPatch) -> ApiResult<WorkoutSet> {
        let value: Value = self.send(Method::PATCH, &format!("sets/{id}/"), patch).await?;
        unwrap_envelope(value, "set")
    }

    pub async fn delete_set(&self, id: SetId) -> ApiResult<()> {
        self.delete(&format!("sets/{id}/")).await
    }

    pub async fn duplicate_set(&self, id: SetId) -> ApiResult<WorkoutSet> {
        let value = self
            .action(Method::POST, &format!("sets/{id}/duplicate/"))
            .await?;
        unwrap_envelope(value, "set")
    }

    pub async fn complete_set(&self, id: SetId) -> ApiResult<WorkoutSet> {
        let value = self
            .action(Method::PATCH, &format!("sets/{id}/complete_set/"))
            .await?;
        unwrap_envelope(value, "set")
    }

    pub async fn skip_set(&self, id: SetId) -> ApiResult<WorkoutSet> {
        let value = self
            .action(Method::PATCH, &format!("sets/{id}/skip_set/"))
            .await?;
        unwrap_envelope(value, "set")
    }

    pub async fn move_set(&self, id: SetId, new_position: u32) -> ApiResult<()> {
        let _: Value = self
            .send(
                Method::PATCH,
                &format!("sets/{id}/move_set/"),
                &json!({ "new_position": new_position }),
            )
            .await?;
        Ok(())
    }
}
