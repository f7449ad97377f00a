//! Integration tests for the session store against the in-memory backend.

mod common;

use std::time::Duration;

use gains_lib::{
    api::ApiError,
    models::{NewWorkout, Patch, SetPatch, SetTemplate, WorkoutPatch},
    session::{store, NoticeLevel, SetStatus},
};

#[tokio::test]
async fn move_set_outside_range_is_rejected_without_a_request() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Legs");
    for id in 1..=3 {
        backend.add_set(1, id, "Squat", Some(90));
    }
    let store = common::store_for(&backend);
    let mut notices = store.notifier().subscribe();
    store.fetch_workout_details(1).await.unwrap();

    for position in [0, 4] {
        let err = store.move_set(2, position).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)), "got {err:?}");
    }
    assert_eq!(backend.calls("move_set"), 0);
    assert_eq!(notices.recv().await.unwrap().level, NoticeLevel::Error);

    store.move_set(1, 3).await.unwrap();
    assert_eq!(backend.calls("move_set"), 1);
    let order: Vec<_> = store.snapshot().sets.iter().map(|s| s.id).collect();
    assert_eq!(order, vec![2, 3, 1]);
}

#[tokio::test]
async fn batch_creation_adds_sets_matching_the_template() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Push");
    let store = common::store_for(&backend);

    let mut template = SetTemplate::new("Bench press");
    template.loading = Some(80.0);
    template.reps = Some(5);
    template.rest = Some(120);
    template.set_type = "working".into();

    let outcome = store.create_sets(1, &template, 5).await.unwrap();
    assert_eq!((outcome.created, outcome.failed), (5, 0));

    store.fetch_workout_details(1).await.unwrap();
    let state = store.snapshot();
    assert_eq!(state.sets.len(), 5);
    assert!(state.sets.iter().all(|set| template.matches(set)));
    assert!(state.sets.iter().all(|set| !set.complete));
    assert_eq!(backend.calls("create_set"), 5);
}

#[tokio::test]
async fn partial_batch_failure_is_reported_and_not_rolled_back() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Push");
    backend.fail_creations(2);
    let store = common::store_for(&backend);
    let mut notices = store.notifier().subscribe();

    let outcome = store
        .create_sets(1, &SetTemplate::new("Dip"), 5)
        .await
        .unwrap();

    assert_eq!((outcome.created, outcome.failed), (3, 2));
    assert_eq!(store.snapshot().sets.len(), 3);
    assert_eq!(backend.sets_of(1).len(), 3);

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("3 of 5"));
}

#[tokio::test]
async fn zero_set_batch_is_rejected() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Push");
    let store = common::store_for(&backend);

    let err = store
        .create_sets(1, &SetTemplate::new("Dip"), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(backend.calls("create_set"), 0);
}

#[tokio::test]
async fn set_listing_walks_every_page_in_order() {
    let backend = common::FakeBackend::with_page_size(20);
    backend.add_workout(1, "Volume");
    for id in 1..=45 {
        backend.add_set(1, id, "Curl", None);
    }
    let store = common::store_for(&backend);

    store.fetch_workout_details(1).await.unwrap();

    assert_eq!(backend.calls("list_sets_page"), 3);
    let ids: Vec<_> = store.snapshot().sets.iter().map(|s| s.id).collect();
    assert_eq!(ids, (1..=45).collect::<Vec<_>>());
}

#[tokio::test]
async fn toggling_completion_twice_reopens_the_workout() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Pull");
    let store = common::store_for(&backend);
    store.fetch_workout_details(1).await.unwrap();

    let completed = store.toggle_complete(1).await.unwrap();
    assert!(completed.complete);
    assert_eq!(completed.duration, Some(1800));
    assert_eq!(backend.calls("complete_workout"), 1);

    let reopened = store.toggle_complete(1).await.unwrap();
    assert!(!reopened.complete);
    assert_eq!(reopened.duration, None);
    assert_eq!(backend.calls("update_workout"), 1);

    let server = backend.workout(1).unwrap();
    assert!(!server.complete);
    assert_eq!(server.duration, None);
}

#[tokio::test]
async fn starting_a_workout_records_start_time() {
    let backend = common::FakeBackend::new();
    backend.add_workout(7, "Legs");
    let store = common::store_for(&backend);

    let started = store.start_workout(7).await.unwrap();
    assert_eq!(started.start_time, Some(common::t0()));
    assert_eq!(
        store.snapshot().workout.and_then(|w| w.start_time),
        Some(common::t0())
    );
}

#[tokio::test]
async fn missing_workout_becomes_not_found_state() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Legs");
    let store = common::store_for(&backend);
    store.fetch_workout_details(1).await.unwrap();

    let err = store.fetch_workout_details(999).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let state = store.snapshot();
    assert!(state.workout.is_none());
    assert!(state.sets.is_empty());
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some(store::WORKOUT_NOT_FOUND));
}

#[tokio::test]
async fn failed_refresh_keeps_last_good_details() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Legs");
    backend.add_set(1, 1, "Squat", Some(60));
    let store = common::store_for(&backend);
    store.fetch_workout_details(1).await.unwrap();

    backend.fail("get_workout");
    assert!(store.fetch_workout_details(1).await.is_err());

    let state = store.snapshot();
    assert_eq!(state.workout.map(|w| w.id), Some(1));
    assert_eq!(state.sets.len(), 1);
    assert_eq!(state.error.as_deref(), Some(store::LOAD_DETAILS_FAILED));
}

#[tokio::test]
async fn failed_listing_clears_workouts_and_pagination() {
    let backend = common::FakeBackend::with_page_size(2);
    for id in 1..=3 {
        backend.add_workout(id, "Session");
    }
    let store = common::store_for(&backend);

    store.fetch_all_workouts(1).await.unwrap();
    let state = store.snapshot();
    assert_eq!(state.workouts.len(), 2);
    assert_eq!(state.pagination.count, 3);
    assert!(state.pagination.next.is_some());

    backend.fail("list_workouts");
    assert!(store.fetch_all_workouts(2).await.is_err());

    let state = store.snapshot();
    assert!(state.workouts.is_empty());
    assert_eq!(state.pagination.count, 0);
    assert!(state.pagination.next.is_none());
    assert_eq!(state.error.as_deref(), Some(store::LOAD_WORKOUTS_FAILED));
}

#[tokio::test]
async fn skipped_set_moves_to_the_end_and_stays_incomplete() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Legs");
    for id in 1..=3 {
        backend.add_set(1, id, "Lunge", Some(30));
    }
    let store = common::store_for(&backend);
    store.fetch_workout_details(1).await.unwrap();

    store.skip_set(1).await.unwrap();

    let state = store.snapshot();
    let order: Vec<_> = state.sets.iter().map(|s| s.id).collect();
    assert_eq!(order, vec![2, 3, 1]);
    let skipped = state.find_set(1).unwrap();
    assert!(!skipped.complete);
    assert_eq!(state.set_status(skipped), SetStatus::Skipped);
    assert_eq!(state.current_set().map(|s| s.id), Some(2));

    store.toggle_set_complete(1).await.unwrap();
    let state = store.snapshot();
    assert_eq!(state.set_status(state.find_set(1).unwrap()), SetStatus::Complete);
    assert!(state.skipped.is_empty());
}

#[tokio::test]
async fn duplicating_a_workout_returns_the_new_id() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Legs");
    backend.add_set(1, 1, "Squat", Some(90));
    let store = common::store_for(&backend);
    store.fetch_all_workouts(1).await.unwrap();

    let copy = store.duplicate_workout(1).await.unwrap();
    assert_ne!(copy, 1);
    assert_eq!(backend.sets_of(copy).len(), 1);
    assert!(store.snapshot().workouts.iter().any(|w| w.id == copy));
}

#[tokio::test]
async fn deleting_the_focused_workout_clears_details() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Legs");
    let store = common::store_for(&backend);
    store.fetch_workout_details(1).await.unwrap();

    store.delete_workout(1).await.unwrap();
    assert!(store.snapshot().workout.is_none());
    assert!(backend.workout(1).is_none());
}

#[tokio::test]
async fn update_refreshes_from_server() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Legs");
    let store = common::store_for(&backend);
    store.fetch_workout_details(1).await.unwrap();

    let patch = WorkoutPatch {
        workout_name: Some("Heavy legs".into()),
        ..WorkoutPatch::default()
    };
    store.update_workout(1, &patch).await.unwrap();

    assert_eq!(
        store.snapshot().workout.map(|w| w.workout_name),
        Some("Heavy legs".to_string())
    );
}

#[tokio::test]
async fn cancelled_scope_never_writes_state() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Legs");
    backend.set_delay(Duration::from_millis(200));
    let store = common::store_for(&backend);
    store.begin_scope();

    let pending = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch_workout_details(1).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    store.end_scope();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(ApiError::Cancelled)));
    let state = store.snapshot();
    assert!(state.workout.is_none());
    assert!(state.error.is_none());
}

#[tokio::test]
async fn duplicate_returns_the_copy_even_when_the_listing_refresh_fails() {
    let backend = common::FakeBackend::new();
    backend.add_workout(7, "Legs");
    let store = common::store_for(&backend);
    store.fetch_all_workouts(1).await.unwrap();
    let mut notices = store.notifier().subscribe();

    backend.fail("list_workouts");
    let copy = store.duplicate_workout(7).await.unwrap();

    assert_ne!(copy, 7);
    assert!(backend.workout(copy).is_some());
    assert_eq!(backend.calls("duplicate_workout"), 1);
    assert_eq!(notices.recv().await.unwrap().level, NoticeLevel::Success);
    assert_eq!(notices.recv().await.unwrap().level, NoticeLevel::Error);
    assert_eq!(
        store.snapshot().error.as_deref(),
        Some(store::LOAD_WORKOUTS_FAILED)
    );
}

#[tokio::test]
async fn created_workout_id_survives_a_failed_refresh() {
    let backend = common::FakeBackend::new();
    let store = common::store_for(&backend);
    backend.fail("list_workouts");

    let new = NewWorkout {
        workout_name: "Upper".into(),
        date: common::t0().date_naive(),
        notes: None,
        user_weight: None,
        sleep_score: None,
        sleep_quality: None,
    };
    let id = store.create_workout(&new).await.unwrap();

    assert_eq!(backend.workout(id).map(|w| w.workout_name), Some("Upper".to_string()));
    assert_eq!(backend.calls("create_workout"), 1);
}

#[tokio::test]
async fn batch_outcome_survives_a_failed_refresh() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Push");
    let store = common::store_for(&backend);
    store.fetch_workout_details(1).await.unwrap();

    backend.fail("list_sets_page");
    let outcome = store
        .create_sets(1, &SetTemplate::new("Dip"), 3)
        .await
        .unwrap();

    assert_eq!((outcome.created, outcome.failed), (3, 0));
    assert_eq!(backend.sets_of(1).len(), 3);
    let state = store.snapshot();
    assert!(state.sets.is_empty());
    assert_eq!(state.error.as_deref(), Some(store::LOAD_DETAILS_FAILED));

    backend.recover("list_sets_page");
    store.fetch_workout_details(1).await.unwrap();
    assert_eq!(store.snapshot().sets.len(), 3);
}

#[tokio::test]
async fn set_mutations_succeed_when_only_the_refresh_fails() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Legs");
    for id in 1..=3 {
        backend.add_set(1, id, "Squat", Some(60));
    }
    let store = common::store_for(&backend);
    store.fetch_workout_details(1).await.unwrap();
    backend.fail("list_sets_page");

    let patch = SetPatch {
        reps: Patch::Set(8),
        ..SetPatch::default()
    };
    store.update_set(1, &patch).await.unwrap();
    store.skip_set(1).await.unwrap();
    store.move_set(3, 1).await.unwrap();
    store.delete_set(2).await.unwrap();

    let server: Vec<_> = backend.sets_of(1).iter().map(|s| s.id).collect();
    assert_eq!(server, vec![3, 1]);
    assert_eq!(backend.sets_of(1)[1].reps, Some(8));
    assert!(store.snapshot().skipped.contains(&1));
}

#[tokio::test]
async fn completed_set_is_kept_when_the_refresh_fails() {
    let backend = common::FakeBackend::new();
    backend.add_workout(1, "Legs");
    backend.add_set(1, 1, "Squat", Some(60));
    backend.add_set(1, 2, "Squat", Some(60));
    let store = common::store_for(&backend);
    store.fetch_workout_details(1).await.unwrap();

    backend.fail("list_sets_page");
    let updated = store.toggle_set_complete(1).await.unwrap();

    assert!(updated.complete);
    let state = store.snapshot();
    assert_eq!(state.set_status(state.find_set(1).unwrap()), SetStatus::Complete);
    assert_eq!(state.current_set().map(|s| s.id), Some(2));
    assert_eq!(state.error.as_deref(), Some(store::LOAD_DETAILS_FAILED));
}
