//! Common test utilities: an in-memory backend and temp storage.
#![allow(dead_code)]

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use gains_lib::{
    api::{ApiError, ApiResult, GainsApi},
    db::Database,
    models::{
        NewSet, NewWorkout, Page, Patch, SetId, SetPatch, Workout, WorkoutId, WorkoutPatch,
        WorkoutSet,
    },
    session::{Notifier, SessionStore},
};
use tempfile::TempDir;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

pub fn test_db() -> (TempDir, Database) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::new(dir.path().join("gains.sqlite3")).expect("Failed to open database");
    (dir, db)
}

pub fn store_for(backend: &Arc<FakeBackend>) -> SessionStore {
    SessionStore::new(backend.clone(), Notifier::default())
}

#[derive(Default)]
struct Inner {
    workouts: BTreeMap<WorkoutId, Workout>,
    sets: Vec<WorkoutSet>,
    next_id: i64,
    calls: HashMap<&'static str, usize>,
    failing: HashSet<&'static str>,
    failing_creations: usize,
}

/// Workout server kept in memory. Set order is dense per workout, like the
/// real backend's post-save renumbering.
pub struct FakeBackend {
    inner: Mutex<Inner>,
    page_size: usize,
    delay: Mutex<Option<Duration>>,
    started_at: DateTime<Utc>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Self::with_page_size(20)
    }

    pub fn with_page_size(page_size: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                next_id: 1000,
                ..Inner::default()
            }),
            page_size,
            delay: Mutex::new(None),
            started_at: t0(),
        })
    }

    pub fn add_workout(&self, id: WorkoutId, name: &str) -> WorkoutId {
        let mut inner = self.inner.lock().unwrap();
        inner.workouts.insert(id, workout(id, name));
        id
    }

    pub fn add_set(
        &self,
        workout: WorkoutId,
        id: SetId,
        exercise: &str,
        rest: Option<u64>,
    ) -> SetId {
        let mut inner = self.inner.lock().unwrap();
        let order = inner.sets.iter().filter(|s| s.workout == workout).count() as u32 + 1;
        let mut set = blank_set(id, workout, exercise);
        set.set_order = Some(order);
        set.rest = rest;
        inner.sets.push(set);
        id
    }

    pub fn workout(&self, id: WorkoutId) -> Option<Workout> {
        self.inner.lock().unwrap().workouts.get(&id).cloned()
    }

    pub fn sets_of(&self, workout: WorkoutId) -> Vec<WorkoutSet> {
        ordered(&self.inner.lock().unwrap().sets, workout)
    }

    pub fn calls(&self, op: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .get(op)
            .copied()
            .unwrap_or(0)
    }

    /// Every later call of `op` answers 500.
    pub fn fail(&self, op: &'static str) {
        self.inner.lock().unwrap().failing.insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.inner.lock().unwrap().failing.remove(op);
    }

    /// The next `n` set creations fail.
    pub fn fail_creations(&self, n: usize) {
        self.inner.lock().unwrap().failing_creations = n;
    }

    /// Every call sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    async fn enter(&self, op: &'static str) -> ApiResult<()> {
        let delay = *self.delay.lock().unwrap();
        {
            let mut inner = self.inner.lock().unwrap();
            *inner.calls.entry(op).or_default() += 1;
            if inner.failing.contains(op) {
                return Err(server_error());
            }
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn with<T>(&self, f: impl FnOnce(&mut Inner) -> ApiResult<T>) -> ApiResult<T> {
        let mut inner = self.inner.lock().unwrap();
        f(&mut inner)
    }
}

#[async_trait]
impl GainsApi for FakeBackend {
    async fn list_workouts(&self, page: u32) -> ApiResult<Page<Workout>> {
        self.enter("list_workouts").await?;
        let page_size = self.page_size;
        self.with(|inner| {
            let all: Vec<_> = inner.workouts.values().rev().cloned().collect();
            Ok(paginate(all, page, page_size))
        })
    }

    async fn get_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        self.enter("get_workout").await?;
        self.with(|inner| {
            inner
                .workouts
                .get(&id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("workouts/{id}")))
        })
    }

    async fn create_workout(&self, new: &NewWorkout) -> ApiResult<Workout> {
        self.enter("create_workout").await?;
        self.with(|inner| {
            inner.next_id += 1;
            let mut created = workout(inner.next_id, &new.workout_name);
            created.date = new.date;
            created.notes = new.notes.clone();
            inner.workouts.insert(created.id, created.clone());
            Ok(created)
        })
    }

    async fn update_workout(&self, id: WorkoutId, patch: &WorkoutPatch) -> ApiResult<Workout> {
        self.enter("update_workout").await?;
        self.with(|inner| {
            let workout = inner.workouts.get_mut(&id).ok_or_else(|| not_found(id))?;
            if let Some(name) = &patch.workout_name {
                workout.workout_name = name.clone();
            }
            if let Some(date) = patch.date {
                workout.date = date;
            }
            if let Some(complete) = patch.complete {
                workout.complete = complete;
            }
            if let Some(notes) = &patch.notes {
                workout.notes = Some(notes.clone());
            }
            apply(&mut workout.duration, &patch.duration);
            apply(&mut workout.start_time, &patch.start_time);
            apply(&mut workout.sleep_score, &patch.sleep_score);
            Ok(workout.clone())
        })
    }

    async fn delete_workout(&self, id: WorkoutId) -> ApiResult<()> {
        self.enter("delete_workout").await?;
        self.with(|inner| {
            inner.workouts.remove(&id).ok_or_else(|| not_found(id))?;
            inner.sets.retain(|set| set.workout != id);
            Ok(())
        })
    }

    async fn duplicate_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        self.enter("duplicate_workout").await?;
        self.with(|inner| {
            let source = inner.workouts.get(&id).cloned().ok_or_else(|| not_found(id))?;
            inner.next_id += 1;
            let copy_id = inner.next_id;
            let mut copy = workout(copy_id, &format!("{} (copy)", source.workout_name));
            copy.date = source.date;
            inner.workouts.insert(copy_id, copy.clone());

            for set in ordered(&inner.sets, id) {
                inner.next_id += 1;
                let mut clone = blank_set(inner.next_id, copy_id, &set.exercise_name);
                clone.set_order = set.set_order;
                clone.loading = set.loading;
                clone.reps = set.reps;
                clone.rest = set.rest;
                inner.sets.push(clone);
            }
            Ok(copy)
        })
    }

    async fn start_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        self.enter("start_workout").await?;
        let started_at = self.started_at;
        self.with(|inner| {
            let workout = inner.workouts.get_mut(&id).ok_or_else(|| not_found(id))?;
            workout.start_time = Some(started_at);
            Ok(workout.clone())
        })
    }

    async fn complete_workout(&self, id: WorkoutId) -> ApiResult<Workout> {
        self.enter("complete_workout").await?;
        self.with(|inner| {
            let workout = inner.workouts.get_mut(&id).ok_or_else(|| not_found(id))?;
            workout.complete = true;
            workout.duration = Some(1800);
            Ok(workout.clone())
        })
    }

    async fn list_sets_page(&self, workout: WorkoutId, page: u32) -> ApiResult<Page<WorkoutSet>> {
        self.enter("list_sets_page").await?;
        let page_size = self.page_size;
        self.with(|inner| Ok(paginate(ordered(&inner.sets, workout), page, page_size)))
    }

    async fn create_set(&self, new: &NewSet) -> ApiResult<WorkoutSet> {
        self.enter("create_set").await?;
        self.with(|inner| {
            if inner.failing_creations > 0 {
                inner.failing_creations -= 1;
                return Err(server_error());
            }
            if !inner.workouts.contains_key(&new.workout) {
                return Err(not_found(new.workout));
            }
            inner.next_id += 1;
            let order = ordered(&inner.sets, new.workout).len() as u32 + 1;
            let template = &new.template;
            let mut set = blank_set(inner.next_id, new.workout, &template.exercise_name);
            set.set_order = Some(order);
            set.set_type = template.set_type.clone();
            set.focus = template.focus.clone();
            set.loading = template.loading;
            set.reps = template.reps;
            set.rest = template.rest;
            set.notes = template.notes.clone();
            inner.sets.push(set.clone());
            Ok(set)
        })
    }

    async fn update_set(&self, id: SetId, patch: &SetPatch) -> ApiResult<WorkoutSet> {
        self.enter("update_set").await?;
        self.with(|inner| {
            let set = find_set(inner, id)?;
            if let Some(name) = &patch.exercise_name {
                set.exercise_name = name.clone();
            }
            if let Some(notes) = &patch.notes {
                set.notes = notes.clone();
            }
            if let Some(complete) = patch.complete {
                set.complete = complete;
            }
            apply(&mut set.loading, &patch.loading);
            apply(&mut set.reps, &patch.reps);
            apply(&mut set.rest, &patch.rest);
            Ok(set.clone())
        })
    }

    async fn delete_set(&self, id: SetId) -> ApiResult<()> {
        self.enter("delete_set").await?;
        self.with(|inner| {
            let workout = find_set(inner, id)?.workout;
            inner.sets.retain(|set| set.id != id);
            renumber(inner, workout, None);
            Ok(())
        })
    }

    async fn duplicate_set(&self, id: SetId) -> ApiResult<WorkoutSet> {
        self.enter("duplicate_set").await?;
        self.with(|inner| {
            let source = find_set(inner, id)?.clone();
            inner.next_id += 1;
            let mut copy = source.clone();
            copy.id = inner.next_id;
            copy.complete = false;
            copy.set_order = Some(ordered(&inner.sets, source.workout).len() as u32 + 1);
            copy.set_duration = None;
            copy.set_start_time = None;
            inner.sets.push(copy.clone());
            Ok(copy)
        })
    }

    async fn complete_set(&self, id: SetId) -> ApiResult<WorkoutSet> {
        self.enter("complete_set").await?;
        self.with(|inner| {
            let set = find_set(inner, id)?;
            set.complete = !set.complete;
            if !set.complete {
                set.set_duration = None;
                set.set_start_time = None;
            }
            Ok(set.clone())
        })
    }

    async fn skip_set(&self, id: SetId) -> ApiResult<WorkoutSet> {
        self.enter("skip_set").await?;
        self.with(|inner| {
            let workout = find_set(inner, id)?.workout;
            renumber(inner, workout, Some((id, u32::MAX)));
            Ok(find_set(inner, id)?.clone())
        })
    }

    async fn move_set(&self, id: SetId, new_position: u32) -> ApiResult<()> {
        self.enter("move_set").await?;
        self.with(|inner| {
            let workout = find_set(inner, id)?.workout;
            renumber(inner, workout, Some((id, new_position)));
            Ok(())
        })
    }
}

fn workout(id: WorkoutId, name: &str) -> Workout {
    Workout {
        id,
        user: Some(1),
        workout_name: name.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        complete: false,
        user_weight: None,
        sleep_score: None,
        sleep_quality: None,
        notes: None,
        start_time: None,
        duration: None,
    }
}

fn blank_set(id: SetId, workout: WorkoutId, exercise: &str) -> WorkoutSet {
    WorkoutSet {
        id,
        workout,
        exercise_name: exercise.to_string(),
        set_order: None,
        set_number: None,
        set_type: String::new(),
        loading: None,
        reps: None,
        focus: String::new(),
        rest: None,
        notes: String::new(),
        complete: false,
        is_active_set: false,
        set_start_time: None,
        set_duration: None,
    }
}

fn ordered(sets: &[WorkoutSet], workout: WorkoutId) -> Vec<WorkoutSet> {
    let mut matching: Vec<_> = sets.iter().filter(|s| s.workout == workout).cloned().collect();
    matching.sort_by_key(|s| s.set_order.unwrap_or(u32::MAX));
    matching
}

/// Rewrites `set_order` as 1..=n, optionally moving one set to a 1-based
/// position first (clamped to the end).
fn renumber(inner: &mut Inner, workout: WorkoutId, moving: Option<(SetId, u32)>) {
    let mut order: Vec<SetId> = ordered(&inner.sets, workout).iter().map(|s| s.id).collect();
    if let Some((id, position)) = moving {
        order.retain(|other| *other != id);
        let index = (position.saturating_sub(1) as usize).min(order.len());
        order.insert(index, id);
    }
    for set in inner.sets.iter_mut().filter(|s| s.workout == workout) {
        let position = order.iter().position(|id| *id == set.id).unwrap_or(0);
        set.set_order = Some(position as u32 + 1);
    }
}

fn find_set(inner: &mut Inner, id: SetId) -> ApiResult<&mut WorkoutSet> {
    inner
        .sets
        .iter_mut()
        .find(|set| set.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("sets/{id}")))
}

fn paginate<T>(all: Vec<T>, page: u32, page_size: usize) -> Page<T> {
    let count = all.len() as u64;
    let start = (page.max(1) as usize - 1) * page_size;
    let results: Vec<T> = all.into_iter().skip(start).take(page_size).collect();
    let has_next = start + results.len() < count as usize;
    Page {
        count,
        next: has_next.then(|| format!("?page={}", page + 1)),
        previous: (page > 1).then(|| format!("?page={}", page - 1)),
        results,
    }
}

fn apply<T: Clone>(field: &mut Option<T>, patch: &Patch<T>) {
    match patch {
        Patch::Absent => {}
        Patch::Clear => *field = None,
        Patch::Set(value) => *field = Some(value.clone()),
    }
}

fn not_found(id: WorkoutId) -> ApiError {
    ApiError::NotFound(format!("workouts/{id}"))
}

fn server_error() -> ApiError {
    ApiError::Http {
        status: 500,
        message: "Internal Server Error".into(),
    }
}
