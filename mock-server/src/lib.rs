//! In-memory stand-in for the Hevy API, used by integration tests.
//!
//! Serves the endpoint subset the client covers under `/v1`. Every route
//! requires the configured `api-key` header. Records are stored as JSON
//! values so the server stays independent of the client's types.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const MAX_PAGE_SIZE: usize = 10;
pub const TEMPLATES_MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct EventParams {
    pub page: Option<usize>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<usize>,
    pub since: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateWorkout {
    pub workout: Value,
}

#[derive(Deserialize)]
pub struct CreateRoutine {
    pub routine: Value,
}

#[derive(Deserialize)]
pub struct NewFolder {
    pub title: String,
}

#[derive(Deserialize)]
pub struct CreateFolder {
    pub routine_folder: NewFolder,
}

#[derive(Debug, Clone)]
struct Event {
    at: DateTime<Utc>,
    body: Value,
}

#[derive(Debug, Default)]
pub struct Store {
    workouts: Vec<Value>,
    events: Vec<Event>,
    routines: Vec<Value>,
    folders: Vec<Value>,
    templates: Vec<Value>,
}

impl Store {
    /// A store with the built-in exercise templates.
    pub fn seeded() -> Self {
        Self {
            templates: seed_templates(),
            ..Self::default()
        }
    }

    /// Record a deletion so `/workouts/events` reports it.
    pub fn delete_workout(&mut self, id: &str) -> bool {
        let before = self.workouts.len();
        self.workouts.retain(|w| w["id"] != id);
        if self.workouts.len() == before {
            return false;
        }
        let at = now();
        self.events.push(Event {
            at,
            body: json!({"type": "deleted", "id": id, "deleted_at": timestamp(at)}),
        });
        true
    }
}

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    pub db: Db,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app(api_key: &str) -> Router {
    app_with_store(api_key, Store::seeded()).0
}

/// Build the router and hand back the store so tests can inspect or seed it.
pub fn app_with_store(api_key: &str, store: Store) -> (Router, Db) {
    let state = AppState {
        api_key: Arc::from(api_key),
        db: Arc::new(RwLock::new(store)),
    };
    let db = state.db.clone();
    let api = Router::new()
        .route("/workouts", get(list_workouts).post(create_workout))
        .route("/workouts/count", get(workout_count))
        .route("/workouts/events", get(workout_events))
        .route("/workouts/{id}", get(get_workout))
        .route("/routines", get(list_routines).post(create_routine))
        .route("/exercise_templates", get(list_templates))
        .route("/exercise_templates/{id}", get(get_template))
        .route("/routine_folders", get(list_folders).post(create_folder))
        .route("/routine_folders/{id}", get(get_folder))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state);
    (Router::new().nest("/v1", api), db)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

/// Current time at the one-second precision clients see, so a timestamp
/// handed back as a `since` cursor excludes the event it came from.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = request
        .headers()
        .get("api-key")
        .and_then(|value| value.to_str().ok());
    if key != Some(&*state.api_key) {
        tracing::warn!(path = %request.uri().path(), "rejected request without valid api-key");
        return error(StatusCode::UNAUTHORIZED, "Invalid API key");
    }
    next.run(request).await
}

/// Validate paging and slice `items`, returning the page envelope fields.
fn paginate(
    items: &[Value],
    page: Option<usize>,
    page_size: Option<usize>,
    max_page_size: usize,
) -> Result<(usize, usize, Vec<Value>), Response> {
    let page = page.unwrap_or(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page < 1 {
        return Err(error(StatusCode::BAD_REQUEST, "page must be 1 or greater"));
    }
    if page_size < 1 || page_size > max_page_size {
        let message = format!("pageSize must be between 1 and {max_page_size}");
        return Err(error(StatusCode::BAD_REQUEST, &message));
    }
    let page_count = items.len().div_ceil(page_size);
    // Pages past the end are empty, including ones whose offset overflows.
    let offset = (page - 1).checked_mul(page_size).unwrap_or(usize::MAX);
    let slice = items
        .iter()
        .skip(offset)
        .take(page_size)
        .cloned()
        .collect();
    Ok((page, page_count, slice))
}

fn page_body(key: &str, (page, page_count, items): (usize, usize, Vec<Value>)) -> Json<Value> {
    let mut body = json!({ "page": page, "page_count": page_count });
    body[key] = Value::Array(items);
    Json(body)
}

fn require_title(resource: &Value) -> Result<(), Response> {
    match resource.get("title").and_then(Value::as_str) {
        Some(title) if !title.is_empty() => Ok(()),
        _ => Err(error(StatusCode::BAD_REQUEST, "title is required")),
    }
}

// --- workouts ---

async fn list_workouts(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, Response> {
    let store = state.db.read().await;
    let page = paginate(&store.workouts, params.page, params.page_size, MAX_PAGE_SIZE)?;
    Ok(page_body("workouts", page))
}

async fn create_workout(
    State(state): State<AppState>,
    Json(input): Json<CreateWorkout>,
) -> Result<(StatusCode, Json<Value>), Response> {
    let mut workout = input.workout;
    require_title(&workout)?;
    let at = now();
    workout["id"] = json!(Uuid::new_v4().to_string());
    workout["created_at"] = json!(timestamp(at));
    workout["updated_at"] = json!(timestamp(at));

    let mut store = state.db.write().await;
    store.workouts.push(workout.clone());
    store.events.push(Event {
        at,
        body: json!({"type": "updated", "workout": workout.clone()}),
    });
    Ok((StatusCode::CREATED, Json(workout)))
}

async fn workout_count(State(state): State<AppState>) -> Json<Value> {
    let store = state.db.read().await;
    Json(json!({ "workout_count": store.workouts.len() }))
}

async fn workout_events(
    State(state): State<AppState>,
    Query(params): Query<EventParams>,
) -> Result<Json<Value>, Response> {
    let since = match params.since.as_deref() {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(_) => return Err(error(StatusCode::BAD_REQUEST, "since must be an ISO-8601 date")),
        },
        None => None,
    };
    let store = state.db.read().await;
    let events: Vec<Value> = store
        .events
        .iter()
        .filter(|event| since.is_none_or(|since| event.at > since))
        .map(|event| event.body.clone())
        .collect();
    let page = paginate(&events, params.page, params.page_size, MAX_PAGE_SIZE)?;
    Ok(page_body("events", page))
}

async fn get_workout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    let store = state.db.read().await;
    store
        .workouts
        .iter()
        .find(|w| w["id"] == id.as_str())
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Workout not found"))
}

// --- routines ---

async fn list_routines(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, Response> {
    let store = state.db.read().await;
    let page = paginate(&store.routines, params.page, params.page_size, MAX_PAGE_SIZE)?;
    Ok(page_body("routines", page))
}

async fn create_routine(
    State(state): State<AppState>,
    Json(input): Json<CreateRoutine>,
) -> Result<(StatusCode, Json<Value>), Response> {
    let mut routine = input.routine;
    require_title(&routine)?;

    let mut store = state.db.write().await;
    if let Some(folder_id) = routine.get("folder_id").and_then(Value::as_u64) {
        if !store.folders.iter().any(|f| f["id"] == folder_id) {
            return Err(error(StatusCode::NOT_FOUND, "Routine folder not found"));
        }
    }
    let stamp = timestamp(now());
    routine["id"] = json!(Uuid::new_v4().to_string());
    routine["created_at"] = json!(stamp);
    routine["updated_at"] = json!(stamp);
    store.routines.push(routine.clone());
    Ok((StatusCode::CREATED, Json(routine)))
}

// --- exercise templates ---

async fn list_templates(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, Response> {
    let store = state.db.read().await;
    let page = paginate(
        &store.templates,
        params.page,
        params.page_size,
        TEMPLATES_MAX_PAGE_SIZE,
    )?;
    Ok(page_body("exercise_templates", page))
}

async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    let store = state.db.read().await;
    store
        .templates
        .iter()
        .find(|t| t["id"] == id.as_str())
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Exercise template not found"))
}

// --- routine folders ---

async fn list_folders(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, Response> {
    let store = state.db.read().await;
    let page = paginate(&store.folders, params.page, params.page_size, MAX_PAGE_SIZE)?;
    Ok(page_body("routine_folders", page))
}

async fn create_folder(
    State(state): State<AppState>,
    Json(input): Json<CreateFolder>,
) -> Result<(StatusCode, Json<Value>), Response> {
    if input.routine_folder.title.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "title is required"));
    }
    let mut store = state.db.write().await;
    let index = store.folders.len();
    let stamp = timestamp(now());
    let folder = json!({
        "id": index as u64 + 1,
        "index": index,
        "title": input.routine_folder.title,
        "created_at": stamp,
        "updated_at": stamp,
    });
    store.folders.push(folder.clone());
    Ok((StatusCode::CREATED, Json(folder)))
}

async fn get_folder(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    let store = state.db.read().await;
    store
        .folders
        .iter()
        .find(|f| f["id"] == id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Routine folder not found"))
}

fn seed_templates() -> Vec<Value> {
    [
        ("79D0BB3A", "Bench Press (Barbell)", "weight_reps", "chest", &["shoulders", "triceps"][..]),
        ("D04AC939", "Squat (Barbell)", "weight_reps", "quadriceps", &["glutes", "hamstrings"][..]),
        ("C6272009", "Deadlift (Barbell)", "weight_reps", "lower_back", &["glutes", "hamstrings"][..]),
        ("1B2B1E7C", "Pull Up", "reps_only", "lats", &["biceps"][..]),
        ("AC1BB830", "Running", "distance_duration", "cardio", &[][..]),
        ("C2B5C4E5", "Plank", "duration", "abdominals", &[][..]),
    ]
    .iter()
    .map(|(id, title, kind, primary, secondary)| {
        json!({
            "id": id,
            "title": title,
            "type": kind,
            "primary_muscle_group": primary,
            "secondary_muscle_groups": secondary,
            "is_custom": false,
        })
    })
    .collect()
}
