use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::{
    db::Database,
    models::{SetId, WorkoutId},
    timer::RestSnapshot,
};

use super::keys;

fn anchor_key(workout_id: WorkoutId) -> String {
    format!("{}{workout_id}", keys::WORKOUT_ANCHOR_PREFIX)
}

impl Database {
    pub async fn load_rest_snapshot(&self) -> Result<Option<RestSnapshot>> {
        self.get_value(keys::REST_TIMER).await
    }

    pub async fn save_rest_snapshot(&self, snapshot: &RestSnapshot) -> Result<()> {
        self.put_value(keys::REST_TIMER, snapshot).await
    }

    pub async fn clear_rest_snapshot(&self) -> Result<()> {
        self.remove_value(keys::REST_TIMER).await
    }

    pub async fn load_workout_anchor(
        &self,
        workout_id: WorkoutId,
    ) -> Result<Option<DateTime<Utc>>> {
        self.get_value(&anchor_key(workout_id)).await
    }

    pub async fn save_workout_anchor(
        &self,
        workout_id: WorkoutId,
        started_at: DateTime<Utc>,
    ) -> Result<()> {
        self.put_value(&anchor_key(workout_id), &started_at).await
    }

    pub async fn clear_workout_anchor(&self, workout_id: WorkoutId) -> Result<()> {
        self.remove_value(&anchor_key(workout_id)).await
    }

    pub async fn clear_all_workout_anchors(&self) -> Result<usize> {
        self.remove_prefix(keys::WORKOUT_ANCHOR_PREFIX).await
    }

    pub async fn load_manual_sets(&self) -> Result<HashMap<SetId, bool>> {
        Ok(self
            .get_value::<HashMap<SetId, bool>>(keys::MANUAL_SETS)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_manual_sets(&self, sets: &HashMap<SetId, bool>) -> Result<()> {
        if sets.is_empty() {
            self.remove_value(keys::MANUAL_SETS).await
        } else {
            self.put_value(keys::MANUAL_SETS, sets).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn anchors_are_per_workout() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("state.sqlite3")).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        db.save_workout_anchor(7, start).await.unwrap();
        assert_eq!(db.load_workout_anchor(7).await.unwrap(), Some(start));
        assert_eq!(db.load_workout_anchor(8).await.unwrap(), None);

        db.clear_workout_anchor(7).await.unwrap();
        assert_eq!(db.load_workout_anchor(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn manual_sets_round_trip_with_integer_keys() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("state.sqlite3")).unwrap();

        let mut sets = HashMap::new();
        sets.insert(42, true);
        db.save_manual_sets(&sets).await.unwrap();
        assert_eq!(db.load_manual_sets().await.unwrap(), sets);

        db.save_manual_sets(&HashMap::new()).await.unwrap();
        assert!(db.load_manual_sets().await.unwrap().is_empty());
    }
}
