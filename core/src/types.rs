//! Resource records, response envelopes and query parameters for the Hevy API.
//!
//! # Design
//! Records are plain data that serialize to exactly what the API expects:
//! optional fields are skipped when `None`, never sent as `null`. Fields the
//! API treats as nullable use `Option<Option<T>>` so "absent" (`None`) and
//! "explicitly cleared" (`Some(None)`, sent as `null`) stay distinct.
//!
//! The same record type is used for the create body and the response. Fields
//! only the server assigns (`id`, timestamps) are `Option` for that reason.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Largest `pageSize` accepted by `/workouts`.
pub const WORKOUTS_MAX_PAGE_SIZE: u32 = 10;
/// Largest `pageSize` accepted by `/workouts/events`.
pub const WORKOUT_EVENTS_MAX_PAGE_SIZE: u32 = 10;
/// Largest `pageSize` accepted by `/routines`.
pub const ROUTINES_MAX_PAGE_SIZE: u32 = 10;
/// Largest `pageSize` accepted by `/exercise_templates`.
pub const EXERCISE_TEMPLATES_MAX_PAGE_SIZE: u32 = 100;
/// Largest `pageSize` accepted by `/routine_folders`.
pub const ROUTINE_FOLDERS_MAX_PAGE_SIZE: u32 = 10;

/// Deserialize a present field (even `null`) as `Some(..)`. Paired with
/// `#[serde(default)]` so a missing field stays `None`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// A point in time as the API sends it.
///
/// Workouts carry ISO-8601 strings in most payloads but Unix seconds in
/// others, so both forms are accepted and written back unchanged. Whole
/// seconds stay `Epoch`; only numbers with a fractional part land in
/// `Fractional`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Iso(String),
    Epoch(i64),
    Fractional(f64),
}

impl Timestamp {
    /// Interpret the timestamp as UTC. Returns `None` for strings that are
    /// not RFC 3339 or epochs out of range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Iso(value) => DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|parsed| parsed.with_timezone(&Utc)),
            Timestamp::Epoch(seconds) => DateTime::from_timestamp(*seconds, 0),
            Timestamp::Fractional(seconds) => {
                if !seconds.is_finite() {
                    return None;
                }
                let whole = seconds.floor();
                let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
                DateTime::from_timestamp(whole as i64, nanos)
            }
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp::Iso(value.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Timestamp::Iso(value.to_string())
    }
}

impl From<String> for Timestamp {
    fn from(value: String) -> Self {
        Timestamp::Iso(value)
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Timestamp::Epoch(value)
    }
}

impl From<f64> for Timestamp {
    fn from(value: f64) -> Self {
        Timestamp::Fractional(value)
    }
}

// ---------------------------------------------------------------------------
// Workouts
// ---------------------------------------------------------------------------

/// Kind of a set within an exercise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetType {
    #[default]
    Normal,
    Warmup,
    Dropset,
    Failure,
}

/// One set of an exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(rename = "type")]
    pub set_type: SetType,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub reps: Option<Option<u32>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<Option<u32>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<Option<u32>>,
    /// Rating of perceived exertion.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub rpe: Option<Option<f64>>,
}

impl WorkoutSet {
    /// A `normal` set of `reps` at `weight_kg`.
    pub fn weighted(weight_kg: f64, reps: u32) -> Self {
        Self {
            set_type: SetType::Normal,
            weight_kg: Some(Some(weight_kg)),
            reps: Some(Some(reps)),
            ..Self::default()
        }
    }
}

/// An exercise within a workout or routine, referencing a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub exercise_template_id: String,
    /// Groups exercises performed back-to-back; `null` means ungrouped.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub superset_id: Option<Option<u32>>,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

/// A logged workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Workout {
    /// A workout with no exercises yet, ready to be filled in and created.
    pub fn new(
        title: impl Into<String>,
        start_time: impl Into<Timestamp>,
        end_time: impl Into<Timestamp>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            start_time: start_time.into(),
            end_time: end_time.into(),
            is_private: None,
            exercises: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// A change to a workout, as reported by `/workouts/events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkoutEvent {
    Updated { workout: Workout },
    Deleted { id: String, deleted_at: String },
}

// ---------------------------------------------------------------------------
// Routines, folders and templates
// ---------------------------------------------------------------------------

/// A saved workout plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    /// `null` places the routine in the default folder.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Option<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Routine {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            folder_id: None,
            notes: None,
            exercises: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineFolder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Position in the user's folder list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Request payload for creating a routine folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoutineFolder {
    pub title: String,
}

impl NewRoutineFolder {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

/// A built-in or custom exercise definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseTemplate {
    pub id: String,
    pub title: String,
    /// Category such as `weight_reps` or `duration`.
    #[serde(rename = "type")]
    pub exercise_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_muscle_group: Option<String>,
    #[serde(default)]
    pub secondary_muscle_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_custom: Option<bool>,
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPage {
    pub page: u32,
    pub page_count: u32,
    #[serde(default)]
    pub workouts: Vec<Workout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEventPage {
    pub page: u32,
    pub page_count: u32,
    #[serde(default)]
    pub events: Vec<WorkoutEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutinePage {
    pub page: u32,
    pub page_count: u32,
    #[serde(default)]
    pub routines: Vec<Routine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseTemplatePage {
    pub page: u32,
    pub page_count: u32,
    #[serde(default)]
    pub exercise_templates: Vec<ExerciseTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineFolderPage {
    pub page: u32,
    pub page_count: u32,
    #[serde(default)]
    pub routine_folders: Vec<RoutineFolder>,
}

/// Body of `/workouts/count`. A missing count reads as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutCount {
    #[serde(default)]
    pub workout_count: u64,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Page selection for list endpoints. Defaults to page 1 with 5 items.
///
/// Keys serialize in declaration order; `None` keys are left out of the
/// query string entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(rename = "pageSize", skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl Pagination {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_PAGE_SIZE: u32 = 5;

    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Only return events after `since`.
    pub fn since(self, since: impl Into<String>) -> WorkoutEventsQuery {
        WorkoutEventsQuery {
            page: self.page,
            page_size: self.page_size,
            since: Some(since.into()),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE, Self::DEFAULT_PAGE_SIZE)
    }
}

/// Query for `/workouts/events`: pagination plus an optional `since` cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkoutEventsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(rename = "pageSize", skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

impl Default for WorkoutEventsQuery {
    fn default() -> Self {
        Pagination::default().into()
    }
}

impl From<Pagination> for WorkoutEventsQuery {
    fn from(pagination: Pagination) -> Self {
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            since: None,
        }
    }
}
