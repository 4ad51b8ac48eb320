//! Typed client for the Hevy REST API.
//!
//! # Design
//! `HevyClient` holds only immutable configuration: the base URL, the fixed
//! header set and a `Transport`. Each operation comes in three pieces:
//! `build_*` produces an `HttpRequest`, `parse_*` consumes an `HttpResponse`,
//! and the plain method ties the two together through the transport. The
//! build/parse halves never touch the network, so callers can inspect or
//! tweak requests (e.g. add headers) and run them through `send`.
//!
//! The client is `Send + Sync` whenever its transport is; concurrent calls
//! share nothing mutable.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{merge_header, HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{
    ExerciseTemplate, ExerciseTemplatePage, NewRoutineFolder, Pagination, Routine, RoutineFolder,
    RoutineFolderPage, RoutinePage, Workout, WorkoutCount, WorkoutEventPage, WorkoutEventsQuery,
    WorkoutPage,
};

#[derive(Serialize)]
struct WorkoutBody<'a> {
    workout: &'a Workout,
}

#[derive(Serialize)]
struct RoutineBody<'a> {
    routine: &'a Routine,
}

#[derive(Serialize)]
struct RoutineFolderBody<'a> {
    routine_folder: &'a NewRoutineFolder,
}

/// Client for the Hevy API, generic over how requests reach the network.
#[derive(Clone)]
pub struct HevyClient<T = UreqTransport> {
    base_url: String,
    headers: Vec<(String, String)>,
    transport: T,
}

impl HevyClient {
    /// Client against the public API with default settings.
    pub fn new(api_key: &str) -> Self {
        Self::from_config(ClientConfig::new(api_key))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> HevyClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers: vec![
                ("api-key".to_string(), config.api_key),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Workouts
    // -----------------------------------------------------------------------

    pub fn list_workouts(&self, pagination: &Pagination) -> Result<WorkoutPage, ApiError> {
        let response = self.send(&self.build_list_workouts(pagination)?)?;
        self.parse_list_workouts(response)
    }

    pub fn build_list_workouts(&self, pagination: &Pagination) -> Result<HttpRequest, ApiError> {
        self.get_with_query("/workouts", pagination)
    }

    pub fn parse_list_workouts(&self, response: HttpResponse) -> Result<WorkoutPage, ApiError> {
        parse_json(response)
    }

    /// Create a workout. Returns it with server-assigned id and timestamps.
    pub fn create_workout(&self, workout: &Workout) -> Result<Workout, ApiError> {
        let response = self.send(&self.build_create_workout(workout)?)?;
        self.parse_create_workout(response)
    }

    pub fn build_create_workout(&self, workout: &Workout) -> Result<HttpRequest, ApiError> {
        self.post("/workouts", &WorkoutBody { workout })
    }

    pub fn parse_create_workout(&self, response: HttpResponse) -> Result<Workout, ApiError> {
        parse_json(response)
    }

    /// Total number of workouts on the account; 0 when the server omits it.
    pub fn get_workout_count(&self) -> Result<u64, ApiError> {
        let response = self.send(&self.build_get_workout_count())?;
        self.parse_get_workout_count(response)
    }

    pub fn build_get_workout_count(&self) -> HttpRequest {
        self.get("/workouts/count")
    }

    pub fn parse_get_workout_count(&self, response: HttpResponse) -> Result<u64, ApiError> {
        parse_json::<WorkoutCount>(response).map(|count| count.workout_count)
    }

    pub fn list_workout_events(
        &self,
        query: &WorkoutEventsQuery,
    ) -> Result<WorkoutEventPage, ApiError> {
        let response = self.send(&self.build_list_workout_events(query)?)?;
        self.parse_list_workout_events(response)
    }

    pub fn build_list_workout_events(
        &self,
        query: &WorkoutEventsQuery,
    ) -> Result<HttpRequest, ApiError> {
        self.get_with_query("/workouts/events", query)
    }

    pub fn parse_list_workout_events(
        &self,
        response: HttpResponse,
    ) -> Result<WorkoutEventPage, ApiError> {
        parse_json(response)
    }

    pub fn get_workout(&self, id: &str) -> Result<Workout, ApiError> {
        let response = self.send(&self.build_get_workout(id))?;
        self.parse_get_workout(response)
    }

    pub fn build_get_workout(&self, id: &str) -> HttpRequest {
        self.get(&format!("/workouts/{}", urlencoding::encode(id)))
    }

    pub fn parse_get_workout(&self, response: HttpResponse) -> Result<Workout, ApiError> {
        parse_json(response)
    }

    // -----------------------------------------------------------------------
    // Routines
    // -----------------------------------------------------------------------

    pub fn list_routines(&self, pagination: &Pagination) -> Result<RoutinePage, ApiError> {
        let response = self.send(&self.build_list_routines(pagination)?)?;
        self.parse_list_routines(response)
    }

    pub fn build_list_routines(&self, pagination: &Pagination) -> Result<HttpRequest, ApiError> {
        self.get_with_query("/routines", pagination)
    }

    pub fn parse_list_routines(&self, response: HttpResponse) -> Result<RoutinePage, ApiError> {
        parse_json(response)
    }

    pub fn create_routine(&self, routine: &Routine) -> Result<Routine, ApiError> {
        let response = self.send(&self.build_create_routine(routine)?)?;
        self.parse_create_routine(response)
    }

    pub fn build_create_routine(&self, routine: &Routine) -> Result<HttpRequest, ApiError> {
        self.post("/routines", &RoutineBody { routine })
    }

    pub fn parse_create_routine(&self, response: HttpResponse) -> Result<Routine, ApiError> {
        parse_json(response)
    }

    // -----------------------------------------------------------------------
    // Exercise templates
    // -----------------------------------------------------------------------

    pub fn list_exercise_templates(
        &self,
        pagination: &Pagination,
    ) -> Result<ExerciseTemplatePage, ApiError> {
        let response = self.send(&self.build_list_exercise_templates(pagination)?)?;
        self.parse_list_exercise_templates(response)
    }

    pub fn build_list_exercise_templates(
        &self,
        pagination: &Pagination,
    ) -> Result<HttpRequest, ApiError> {
        self.get_with_query("/exercise_templates", pagination)
    }

    pub fn parse_list_exercise_templates(
        &self,
        response: HttpResponse,
    ) -> Result<ExerciseTemplatePage, ApiError> {
        parse_json(response)
    }

    pub fn get_exercise_template(&self, id: &str) -> Result<ExerciseTemplate, ApiError> {
        let response = self.send(&self.build_get_exercise_template(id))?;
        self.parse_get_exercise_template(response)
    }

    pub fn build_get_exercise_template(&self, id: &str) -> HttpRequest {
        self.get(&format!("/exercise_templates/{}", urlencoding::encode(id)))
    }

    pub fn parse_get_exercise_template(
        &self,
        response: HttpResponse,
    ) -> Result<ExerciseTemplate, ApiError> {
        parse_json(response)
    }

    // -----------------------------------------------------------------------
    // Routine folders
    // -----------------------------------------------------------------------

    pub fn list_routine_folders(
        &self,
        pagination: &Pagination,
    ) -> Result<RoutineFolderPage, ApiError> {
        let response = self.send(&self.build_list_routine_folders(pagination)?)?;
        self.parse_list_routine_folders(response)
    }

    pub fn build_list_routine_folders(
        &self,
        pagination: &Pagination,
    ) -> Result<HttpRequest, ApiError> {
        self.get_with_query("/routine_folders", pagination)
    }

    pub fn parse_list_routine_folders(
        &self,
        response: HttpResponse,
    ) -> Result<RoutineFolderPage, ApiError> {
        parse_json(response)
    }

    pub fn create_routine_folder(
        &self,
        folder: &NewRoutineFolder,
    ) -> Result<RoutineFolder, ApiError> {
        let response = self.send(&self.build_create_routine_folder(folder)?)?;
        self.parse_create_routine_folder(response)
    }

    pub fn build_create_routine_folder(
        &self,
        folder: &NewRoutineFolder,
    ) -> Result<HttpRequest, ApiError> {
        self.post("/routine_folders", &RoutineFolderBody { routine_folder: folder })
    }

    pub fn parse_create_routine_folder(
        &self,
        response: HttpResponse,
    ) -> Result<RoutineFolder, ApiError> {
        parse_json(response)
    }

    pub fn get_routine_folder(&self, id: u64) -> Result<RoutineFolder, ApiError> {
        let response = self.send(&self.build_get_routine_folder(id))?;
        self.parse_get_routine_folder(response)
    }

    pub fn build_get_routine_folder(&self, id: u64) -> HttpRequest {
        self.get(&format!("/routine_folders/{id}"))
    }

    pub fn parse_get_routine_folder(
        &self,
        response: HttpResponse,
    ) -> Result<RoutineFolder, ApiError> {
        parse_json(response)
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    /// Execute a request through the transport. Any status is returned as a
    /// response; only a missing response is an error here.
    pub fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self
            .transport
            .execute(request)
            .map_err(|source| ApiError::Network {
                url: request.url.clone(),
                source,
            })?;
        if response.is_success() {
            debug!(status = response.status, url = %response.url, "received response");
        } else {
            warn!(status = response.status, url = %response.url, "request failed");
        }
        Ok(response)
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: self.headers.clone(),
            body,
        }
    }

    fn get(&self, path: &str) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}{path}", self.base_url), None)
    }

    fn get_with_query<Q: Serialize>(&self, path: &str, query: &Q) -> Result<HttpRequest, ApiError> {
        let query = serde_urlencoded::to_string(query)?;
        let mut url = format!("{}{path}", self.base_url);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        Ok(self.request(HttpMethod::Get, url, None))
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(ApiError::Serialization)?;
        Ok(self.request(HttpMethod::Post, format!("{}{path}", self.base_url), Some(body)))
    }
}

impl<T> HevyClient<T> {
    /// Replace or add a header sent with every request from this client.
    pub fn default_header(mut self, name: &str, value: &str) -> Self {
        merge_header(&mut self.headers, name, value);
        self
    }
}

impl<T> fmt::Debug for HevyClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case("api-key") {
                    (name.as_str(), "<redacted>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("HevyClient")
            .field("base_url", &self.base_url)
            .field("headers", &headers)
            .finish_non_exhaustive()
    }
}

/// Apply the status rule, then decode the body as `R`.
fn parse_json<R: DeserializeOwned>(response: HttpResponse) -> Result<R, ApiError> {
    if !response.is_success() {
        return Err(ApiError::from_response(response));
    }
    Ok(serde_json::from_str(&response.body)?)
}
