use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_store, Store};
use serde_json::{json, Value};
use tower::ServiceExt;

const KEY: &str = "test-api-key";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header("api-key", KEY)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("api-key", KEY)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_api_key_returns_401() {
    let resp = app(KEY)
        .oneshot(Request::builder().uri("/v1/workouts").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await, json!({"error": "Invalid API key"}));
}

#[tokio::test]
async fn wrong_api_key_returns_401() {
    let resp = app(KEY)
        .oneshot(
            Request::builder()
                .uri("/v1/workouts/count")
                .header("api-key", "nope")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- workouts ---

#[tokio::test]
async fn list_workouts_empty() {
    let resp = app(KEY).oneshot(get("/v1/workouts")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({"page": 1, "page_count": 0, "workouts": []})
    );
}

#[tokio::test]
async fn list_workouts_page_size_too_large_returns_400() {
    let resp = app(KEY)
        .oneshot(get("/v1/workouts?page=1&pageSize=11"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await,
        json!({"error": "pageSize must be between 1 and 10"})
    );
}

#[tokio::test]
async fn list_workouts_page_past_the_end_is_empty() {
    let resp = app(KEY)
        .oneshot(get("/v1/workouts?page=18446744073709551615&pageSize=5"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await;
    assert_eq!(page["workouts"], json!([]));
    assert_eq!(page["page_count"], 0);
}

#[tokio::test]
async fn create_workout_assigns_id_and_timestamps() {
    let resp = app(KEY)
        .oneshot(json_request(
            "POST",
            "/v1/workouts",
            r#"{"workout":{"title":"Leg day","start_time":"2024-01-01T10:00:00Z","end_time":"2024-01-01T11:00:00Z","exercises":[]}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let workout = body_json(resp).await;
    assert_eq!(workout["title"], "Leg day");
    assert!(workout["id"].is_string());
    assert!(workout["created_at"].is_string());
    assert_eq!(workout["created_at"], workout["updated_at"]);
}

#[tokio::test]
async fn create_workout_without_title_returns_400() {
    let resp = app(KEY)
        .oneshot(json_request("POST", "/v1/workouts", r#"{"workout":{"exercises":[]}}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_workout_unwrapped_body_returns_422() {
    let resp = app(KEY)
        .oneshot(json_request("POST", "/v1/workouts", r#"{"title":"No envelope"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_workout_not_found_is_plain_text() {
    let resp = app(KEY).oneshot(get("/v1/workouts/missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(&body_bytes(resp).await[..], b"Workout not found");
}

#[tokio::test]
async fn events_reject_bad_since() {
    let resp = app(KEY)
        .oneshot(get("/v1/workouts/events?since=yesterday"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn events_report_deletions() {
    let (router, db) = app_with_store(KEY, Store::seeded());
    let resp = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/workouts",
            r#"{"workout":{"title":"Short","start_time":"2024-01-01T10:00:00Z","end_time":"2024-01-01T10:30:00Z","exercises":[]}}"#,
        ))
        .await
        .unwrap();
    let id = body_json(resp).await["id"].as_str().unwrap().to_string();
    assert!(db.write().await.delete_workout(&id));

    let resp = router
        .oneshot(get("/v1/workouts/events?page=1&pageSize=10&since=2000-01-01T00%3A00%3A00Z"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await;
    let events = page["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["type"], "updated");
    assert_eq!(events[1]["type"], "deleted");
    assert_eq!(events[1]["id"], id.as_str());
}

#[tokio::test]
async fn events_since_returned_timestamp_excludes_that_event() {
    let router = app(KEY);
    let resp = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/workouts",
            r#"{"workout":{"title":"Cursor","start_time":"2024-01-01T10:00:00Z","end_time":"2024-01-01T10:30:00Z","exercises":[]}}"#,
        ))
        .await
        .unwrap();
    let updated_at = body_json(resp).await["updated_at"]
        .as_str()
        .unwrap()
        .to_string();

    let uri = format!(
        "/v1/workouts/events?since={}",
        updated_at.replace(':', "%3A").replace('+', "%2B")
    );
    let resp = router.oneshot(get(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["events"], json!([]));
}

// --- exercise templates ---

#[tokio::test]
async fn templates_allow_large_pages() {
    let resp = app(KEY)
        .oneshot(get("/v1/exercise_templates?page=1&pageSize=100"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await;
    assert_eq!(page["page_count"], 1);
    assert!(!page["exercise_templates"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn get_template_by_id() {
    let resp = app(KEY)
        .oneshot(get("/v1/exercise_templates/79D0BB3A"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let template = body_json(resp).await;
    assert_eq!(template["title"], "Bench Press (Barbell)");
    assert_eq!(template["type"], "weight_reps");
}

// --- routine folders ---

#[tokio::test]
async fn get_folder_bad_id_returns_400() {
    let resp = app(KEY)
        .oneshot(get("/v1/routine_folders/not-a-number"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_routine_in_unknown_folder_returns_404() {
    let resp = app(KEY)
        .oneshot(json_request(
            "POST",
            "/v1/routines",
            r#"{"routine":{"title":"Push","folder_id":99,"exercises":[]}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full lifecycle ---

#[tokio::test]
async fn folder_and_routine_lifecycle() {
    use tower::Service;

    let mut app = app(KEY).into_service();

    // create folder
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/v1/routine_folders",
            r#"{"routine_folder":{"title":"Strength"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let folder = body_json(resp).await;
    assert_eq!(folder["id"], 1);
    assert_eq!(folder["index"], 0);

    // fetch it back
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/v1/routine_folders/1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, folder);

    // routine in that folder
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/v1/routines",
            r#"{"routine":{"title":"Push","folder_id":1,"exercises":[]}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // routine in the default folder
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/v1/routines",
            r#"{"routine":{"title":"Pull","folder_id":null,"exercises":[]}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // list routines
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/v1/routines?page=1&pageSize=5"))
        .await
        .unwrap();
    let page = body_json(resp).await;
    assert_eq!(page["page_count"], 1);
    let routines = page["routines"].as_array().unwrap();
    assert_eq!(routines.len(), 2);
    assert_eq!(routines[0]["folder_id"], 1);
    assert!(routines[1]["folder_id"].is_null());
}
