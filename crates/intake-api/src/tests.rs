//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use axum::{
  Extension, Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use intake_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, StaffUser, admin_router, public_router};

const BASE_URL: &str = "https://jobs.example.com";

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let state = AppState::new(store, BASE_URL);
  Router::new().nest("/api", public_router(state.clone())).nest(
    "/api/admin",
    admin_router(state).layer(Extension(StaffUser("alice".to_owned()))),
  )
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, value)
}

fn draft(email: &str) -> Value {
  json!({
    "firstName": "Ada",
    "lastName": "Lovelace",
    "email": email,
    "phoneNumber": "555-0100",
    "highestFormalEducationLevel": "master",
    "currentJobStatus": "employed",
    "category": "Data Analyst",
    "countryOfResidence": "GB",
    "timeZone": "Europe/London",
    "languages": [{ "name": "English", "proficiency": "native" }],
    "linkedinUrl": "https://linkedin.com/in/ada",
    "availability": "full_time",
    "availableIn": 30,
    "expectedSalary": 3000
  })
}

async fn submit(app: &Router, email: &str) -> String {
  let (status, body) = call(app, "POST", "/api/applications", Some(draft(email))).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["id"].as_str().unwrap().to_owned()
}

// ── Submission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_returns_receipt_then_conflict() {
  let app = app().await;
  let (status, body) = call(&app, "POST", "/api/applications", Some(draft("ada@x.com"))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["email"], "ada@x.com");
  assert_eq!(body["message"], "Application submitted successfully");

  let (status, body) = call(&app, "POST", "/api/applications", Some(draft("ada@x.com"))).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("ada@x.com"));

  let (_, page) = call(&app, "GET", "/api/admin/applications", None).await;
  assert_eq!(page["total"], 1);
}

#[tokio::test]
async fn invalid_submission_lists_field_errors() {
  let app = app().await;
  let mut body = draft("ada@x.com");
  body["linkedinUrl"] = Value::Null;
  body["languages"] = json!([{ "name": "French", "proficiency": "native" }]);

  let (status, body) = call(&app, "POST", "/api/applications", Some(body)).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  let paths: Vec<&str> = body["fieldErrors"]
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["path"].as_str().unwrap())
    .collect();
  assert!(paths.contains(&"linkedinUrl"), "{paths:?}");
  assert!(paths.contains(&"languages"), "{paths:?}");
}

#[tokio::test]
async fn email_availability() {
  let app = app().await;
  submit(&app, "ada@x.com").await;

  let (status, body) =
    call(&app, "GET", "/api/applications/email-available?email=ada@x.com", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["isUnique"], false);

  let (_, body) =
    call(&app, "GET", "/api/applications/email-available?email=grace@x.com", None).await;
  assert_eq!(body["isUnique"], true);

  let (status, _) = call(&app, "GET", "/api/applications/email-available?email=", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Admin reads ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn listing_validates_limit_and_filters() {
  let app = app().await;
  submit(&app, "a@x.com").await;
  submit(&app, "b@x.com").await;

  let (status, _) = call(&app, "GET", "/api/admin/applications?limit=0", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = call(&app, "GET", "/api/admin/applications?limit=101", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, page) = call(&app, "GET", "/api/admin/applications?limit=1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["total"], 2);
  assert_eq!(page["applications"].as_array().unwrap().len(), 1);
  assert_eq!(page["limit"], 1);

  let (_, page) = call(
    &app,
    "GET",
    "/api/admin/applications?searchValue=b%40x&searchField=email",
    None,
  )
  .await;
  assert_eq!(page["total"], 1);
  assert_eq!(page["applications"][0]["email"], "b@x.com");

  let (_, page) = call(&app, "GET", "/api/admin/applications?filterMinSkills=true", None).await;
  assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn detail_or_not_found() {
  let app = app().await;
  let id = submit(&app, "ada@x.com").await;

  let (status, body) = call(&app, "GET", &format!("/api/admin/applications/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["languages"][0]["name"], "English");
  assert_eq!(body["socials"][0]["platform"], "linkedin");

  let missing = Uuid::new_v4();
  let (status, body) =
    call(&app, "GET", &format!("/api/admin/applications/{missing}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());
}

// ── Export ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_csv_and_json() {
  let app = app().await;
  submit(&app, "ada@x.com").await;

  let (status, body) = call(&app, "POST", "/api/admin/export", Some(json!({}))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["format"], "csv");
  let csv = body["data"].as_str().unwrap();
  let mut lines = csv.lines();
  assert!(lines.next().unwrap().starts_with("id,firstName,lastName,email"));
  assert!(lines.next().unwrap().contains("\"ada@x.com\""));
  assert!(!csv.ends_with('\n'));

  let (_, body) = call(
    &app,
    "POST",
    "/api/admin/export",
    Some(json!({ "format": "json", "filterCategory": "Video Editor" })),
  )
  .await;
  assert_eq!(body["format"], "json");
  let rows: Value = serde_json::from_str(body["data"].as_str().unwrap()).unwrap();
  assert_eq!(rows, json!([]));
}

// ── Sharing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn public_link_lifecycle() {
  let app = app().await;
  let id = submit(&app, "ada@x.com").await;
  let toggle = format!("/api/admin/applications/{id}/public");

  let (status, vis) = call(&app, "POST", &toggle, Some(json!({ "isPublic": true }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(vis["isPublic"], true);
  let token = vis["publicToken"].as_str().unwrap().to_owned();
  assert_eq!(token.len(), 64);
  assert_eq!(vis["shareableUrl"], format!("{BASE_URL}/application/{token}"));

  let (status, detail) = call(&app, "GET", &format!("/api/public/{token}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(detail["id"], id);

  let (_, vis) = call(&app, "POST", &toggle, Some(json!({ "isPublic": false }))).await;
  assert_eq!(vis["isPublic"], false);
  assert!(vis["shareableUrl"].is_null());

  let (stale, _) = call(&app, "GET", &format!("/api/public/{token}"), None).await;
  let (unknown, _) = call(&app, "GET", "/api/public/not-a-token", None).await;
  assert_eq!(stale, StatusCode::NOT_FOUND);
  assert_eq!(unknown, StatusCode::NOT_FOUND);

  let missing = format!("/api/admin/applications/{}/public", Uuid::new_v4());
  let (status, _) = call(&app, "POST", &missing, Some(json!({ "isPublic": true }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Favorites ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn favorites_toggle_and_list() {
  let app = app().await;
  let id = submit(&app, "ada@x.com").await;
  let uri = format!("/api/admin/applications/{id}/favorite");

  let (_, body) = call(&app, "GET", &uri, None).await;
  assert_eq!(body["isFavorite"], false);

  let (status, body) = call(&app, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["isFavorite"], true);
  let (_, body) = call(&app, "GET", &uri, None).await;
  assert_eq!(body["isFavorite"], true);

  let (_, page) = call(&app, "GET", "/api/admin/favorites", None).await;
  assert_eq!(page["total"], 1);
  assert_eq!(page["favorites"][0]["favoritedBy"], "alice");
  assert_eq!(page["favorites"][0]["application"]["id"], id);

  let (_, body) = call(&app, "POST", &uri, None).await;
  assert_eq!(body["isFavorite"], false);

  let (status, _) = call(&app, "GET", "/api/admin/favorites?limit=500", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let missing = format!("/api/admin/applications/{}/favorite", Uuid::new_v4());
  let (status, _) = call(&app, "POST", &missing, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
