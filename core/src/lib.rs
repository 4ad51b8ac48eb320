//! Typed blocking client for the Hevy fitness-tracking API.
//!
//! # Overview
//! Covers workouts, workout events, routines, routine folders and exercise
//! templates. Every call is a single round-trip: no retries, caching or
//! automatic pagination.
//!
//! # Design
//! - `HevyClient` holds only immutable configuration (base URL, headers,
//!   transport) and can be shared across threads.
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`); the plain method runs both
//!   through a `Transport`. `UreqTransport` is the default.
//! - Non-2xx responses become `ApiError::Http` with status, status text, raw
//!   body and resolved URL.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use client::HevyClient;
pub use config::{ClientConfig, HEVY_BASE_URL};
pub use error::ApiError;
pub use http::{
    HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport, UNREADABLE_BODY,
};
pub use types::{
    Exercise, ExerciseTemplate, ExerciseTemplatePage, NewRoutineFolder, Pagination, Routine,
    RoutineFolder, RoutineFolderPage, RoutinePage, SetType, Timestamp, Workout, WorkoutCount,
    WorkoutEvent, WorkoutEventPage, WorkoutEventsQuery, WorkoutPage, WorkoutSet,
};
