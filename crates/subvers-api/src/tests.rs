//! Router tests against an in-memory SQLite store.

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use serde_json::{Value, json};
use subvers_core::catalog::Catalog;
use subvers_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use super::*;

async fn make_state(catalog: Catalog) -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(store, catalog)
}

async fn send(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> Response {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  api_router(state.clone()).oneshot(req).await.unwrap()
}

async fn json_of(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

/// Create the branch and return its id.
async fn branch(state: &AppState<SqliteStore>, video: &str, code: &str) -> String {
  let resp = send(
    state,
    "POST",
    &format!("/videos/{video}/languages"),
    Some(json!({ "language_code": code })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  json_of(resp).await["language_id"].as_str().unwrap().to_owned()
}

async fn add(state: &AppState<SqliteStore>, language_id: &str, body: Value) -> Response {
  send(state, "POST", &format!("/languages/{language_id}/versions"), Some(body)).await
}

// ─── Branches ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn language_codes_are_normalised_and_branches_reused() {
  let state = make_state(Catalog::default()).await;
  let a = branch(&state, "vid", "EN").await;
  let b = branch(&state, "vid", "en").await;
  assert_eq!(a, b);

  let resp = send(&state, "GET", &format!("/languages/{a}"), None).await;
  assert_eq!(json_of(resp).await["language_code"], "en");

  let resp = send(&state, "GET", "/videos/vid/languages", None).await;
  assert_eq!(json_of(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_language_is_a_validation_error() {
  let state = make_state(Catalog::default()).await;
  let resp = send(
    &state,
    "POST",
    "/videos/vid/languages",
    Some(json!({ "language_code": "klingon" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(json_of(resp).await["kind"], "validation");
}

#[tokio::test]
async fn unknown_video_is_not_found() {
  let catalog = Catalog::default().with_videos(["known".to_owned()]);
  let state = make_state(catalog).await;
  let resp = send(
    &state,
    "POST",
    "/videos/unknown/languages",
    Some(json!({ "language_code": "en" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn branch_listing_filters_and_summary() {
  let state = make_state(Catalog::default()).await;
  let en = branch(&state, "vid", "en").await;
  let fr = branch(&state, "vid", "fr").await;
  branch(&state, "vid", "de").await;

  add(&state, &en, json!({ "subtitles": [[0, 1, "a"], [1, 2, "b"]], "title": "Pilot" })).await;
  add(&state, &fr, json!({ "visibility": "private" })).await;

  let codes = |v: Value| -> Vec<String> {
    v.as_array()
      .unwrap()
      .iter()
      .map(|b| b["language_code"].as_str().unwrap().to_owned())
      .collect()
  };
  let resp = send(&state, "GET", "/videos/vid/languages?filter=having_versions", None).await;
  assert_eq!(codes(json_of(resp).await), ["en", "fr"]);
  let resp = send(&state, "GET", "/videos/vid/languages?filter=having_public_versions", None).await;
  assert_eq!(codes(json_of(resp).await), ["en"]);
  let resp = send(&state, "GET", "/videos/vid/languages?filter=sometimes", None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = send(&state, "GET", &format!("/languages/{en}/summary"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let summary = json_of(resp).await;
  assert_eq!(summary["language_code"], "en");
  assert_eq!(summary["num_versions"], 1);
  assert_eq!(summary["subtitle_count"], 2);
  assert_eq!(summary["title"], "Pilot");
  assert_eq!(summary["description"], "");

  let resp = send(&state, "GET", &format!("/languages/{}/summary", uuid::Uuid::new_v4()), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ─── Versions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn commit_then_read_tip_and_subtitles() {
  let state = make_state(Catalog::default()).await;
  let en = branch(&state, "vid", "en").await;

  let resp = send(&state, "GET", &format!("/languages/{en}/tip"), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = add(
    &state,
    &en,
    json!({
      "subtitles": [[0, 1500, "Hello"], [1500, 3000, "World", { "new_paragraph": true }]],
      "author": "alice",
      "title": "Pilot",
    }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let v1 = json_of(resp).await;
  assert_eq!(v1["version_number"], 1);
  assert_eq!(v1["author"], "alice");
  assert_eq!(v1["title"], "Pilot");

  let resp = add(&state, &en, json!({ "subtitles": null })).await;
  let v2 = json_of(resp).await;
  assert_eq!(v2["version_number"], 2);
  assert_eq!(v2["author"], subvers_core::catalog::ANONYMOUS);
  assert_eq!(v2["lineage"], json!({ "en": 1 }));
  assert_eq!(v2["parent_ids"], json!([v1["version_id"]]));

  let resp = send(&state, "GET", &format!("/languages/{en}/tip"), None).await;
  assert_eq!(json_of(resp).await["version_id"], v2["version_id"]);

  let v1_id = v1["version_id"].as_str().unwrap();
  let resp = send(&state, "GET", &format!("/versions/{v1_id}/subtitles"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let doc = json_of(resp).await;
  assert_eq!(doc["language_code"], "en");
  assert_eq!(doc["items"][1]["text"], "World");
  assert_eq!(doc["items"][1]["new_paragraph"], true);
}

#[tokio::test]
async fn wrongly_typed_input_is_classified() {
  let state = make_state(Catalog::default()).await;
  let en = branch(&state, "vid", "en").await;

  let resp = add(&state, &en, json!({ "subtitles": 42 })).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_of(resp).await["kind"], "type");

  let resp = add(&state, &en, json!({ "subtitles": { "items": "nope" } })).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_of(resp).await;
  assert_eq!(body["kind"], "type");
  assert!(body["error"].as_str().unwrap().contains("document object"));

  let resp = add(&state, &en, json!({ "subtitles": null, "title": 7 })).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let body = json_of(resp).await;
  assert_eq!(body["kind"], "validation");
  assert!(body["error"].as_str().unwrap().contains("title"));

  let resp = send(&state, "GET", &format!("/languages/{en}/versions"), None).await;
  assert!(json_of(resp).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_language_parents_are_rejected() {
  let state = make_state(Catalog::default()).await;
  let en = branch(&state, "vid", "en").await;
  let fr = branch(&state, "vid", "fr").await;

  let en1 = json_of(add(&state, &en, json!({})).await).await;
  let en2 = json_of(add(&state, &en, json!({})).await).await;

  let resp = add(
    &state,
    &fr,
    json!({ "parents": [en1["version_id"], en2["version_id"]] }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(json_of(resp).await["kind"], "validation");
}

#[tokio::test]
async fn unknown_author_is_not_found() {
  let catalog = Catalog::default().with_users(["alice".to_owned()]);
  let state = make_state(catalog).await;
  let en = branch(&state, "vid", "en").await;

  let resp = add(&state, &en, json!({ "author": "mallory" })).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let resp = add(&state, &en, json!({ "author": "alice" })).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn subtitles_honour_if_none_match() {
  let state = make_state(Catalog::default()).await;
  let en = branch(&state, "vid", "en").await;
  let v1 = json_of(add(&state, &en, json!({ "subtitles": [[0, 100, "x"]] })).await).await;
  let uri = format!("/versions/{}/subtitles", v1["version_id"].as_str().unwrap());

  let resp = send(&state, "GET", &uri, None).await;
  let tag = resp.headers()[header::ETAG].to_str().unwrap().to_owned();

  let req = Request::builder()
    .uri(&uri)
    .header(header::IF_NONE_MATCH, &tag)
    .body(Body::empty())
    .unwrap();
  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);

  let resp = send(&state, "GET", &format!("{uri}?format=dfxp"), None).await;
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/ttml+xml");
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  assert!(std::str::from_utf8(&bytes).unwrap().contains("<tt "));
}

#[tokio::test]
async fn private_versions_drop_out_of_public_listing() {
  let state = make_state(Catalog::default()).await;
  let en = branch(&state, "vid", "en").await;
  json_of(add(&state, &en, json!({})).await).await;
  let v2 = json_of(add(&state, &en, json!({})).await).await;

  let resp = send(
    &state,
    "PUT",
    &format!("/versions/{}/visibility", v2["version_id"].as_str().unwrap()),
    Some(json!({ "visibility": "public", "visibility_override": "private" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = send(&state, "GET", &format!("/languages/{en}/versions?public_only=true"), None).await;
  assert_eq!(json_of(resp).await.as_array().unwrap().len(), 1);
  let resp = send(&state, "GET", &format!("/languages/{en}/versions"), None).await;
  assert_eq!(json_of(resp).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn history_and_ancestors() {
  let state = make_state(Catalog::default()).await;
  let en = branch(&state, "vid", "en").await;
  let fr = branch(&state, "vid", "fr").await;
  let en1 = json_of(add(&state, &en, json!({})).await).await;
  let fr1 = json_of(add(&state, &fr, json!({ "parents": [en1["version_id"]] })).await).await;

  let resp = send(
    &state,
    "GET",
    &format!("/versions/{}/ancestors", fr1["version_id"].as_str().unwrap()),
    None,
  )
  .await;
  assert_eq!(json_of(resp).await, json!([en1["version_id"]]));

  let resp = send(&state, "GET", "/videos/vid/history.dot", None).await;
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/vnd.graphviz");
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let dot = std::str::from_utf8(&bytes).unwrap();
  assert!(dot.contains("\"en1\" -> \"fr1\";"), "{dot}");
}

#[tokio::test]
async fn missing_version_is_404() {
  let state = make_state(Catalog::default()).await;
  let resp = send(&state, "GET", &format!("/versions/{}", uuid::Uuid::new_v4()), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(json_of(resp).await["kind"], "not_found");
}

// ─── Write-locks and collaborators ───────────────────────────────────────────

#[tokio::test]
async fn writelock_conflicts_are_409() {
  let state = make_state(Catalog::default()).await;
  let en = branch(&state, "vid", "en").await;
  let uri = format!("/languages/{en}/writelock");

  let resp = send(&state, "POST", &uri, Some(json!({ "owner": "alice", "session_key": "s1" }))).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let resp = send(&state, "POST", &uri, Some(json!({ "owner": "bob", "session_key": "s2" }))).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
  assert!(json_of(resp).await["error"].as_str().unwrap().contains("alice"));

  let resp = send(&state, "DELETE", &format!("{uri}?session_key=s1"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(json_of(resp).await["writelock"].is_null());
}

#[tokio::test]
async fn collaborators_drive_signoff_counts() {
  let state = make_state(Catalog::default()).await;
  let en = branch(&state, "vid", "en").await;

  for (user, body) in [
    ("ann", json!({ "signoff": true, "signoff_is_official": true })),
    ("ben", json!({ "signoff": true })),
    ("cat", json!({ "expired": true })),
  ] {
    let resp = send(
      &state,
      "PUT",
      &format!("/languages/{en}/collaborators/{user}"),
      Some(body),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  let resp = send(&state, "GET", &format!("/languages/{en}"), None).await;
  let signoffs = json_of(resp).await["signoffs"].clone();
  assert_eq!(
    signoffs,
    json!({
      "official": 1, "unofficial": 1, "pending": 1,
      "pending_expired": 1, "pending_unexpired": 0,
    })
  );

  let resp = send(&state, "POST", &format!("/languages/{en}/signoffs"), None).await;
  assert_eq!(json_of(resp).await, signoffs);

  let resp = send(&state, "GET", &format!("/languages/{en}/collaborators"), None).await;
  assert_eq!(json_of(resp).await.as_array().unwrap().len(), 3);
}
