//! Job routes: ownership, lifecycle and paginated listing.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::common::TestHarness;

fn new_job(title: &str) -> Value {
    json!({
        "title": title,
        "company": "Big Corp",
        "location": "Zagreb",
        "job_url": format!("https://example.com/jobs/{}", title.replace(' ', "-")),
        "description": "Join us!",
        "logo_url": "https://example.com/logo.png",
    })
}

async fn create(harness: &TestHarness, token: &str, title: &str) -> Value {
    let response = harness.post("/api/jobs", Some(token), new_job(title)).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body
}

#[tokio::test]
async fn test_job_routes_require_token() {
    let harness = TestHarness::new();

    let response = harness.get("/api/jobs", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["detail"], "Invalid token");

    let response = harness.get("/api/jobs", Some("not-a-jwt")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = harness.post("/api/jobs", None, new_job("Engineer")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_token_from_another_audience_is_rejected() {
    let harness = TestHarness::new();
    let foreign = server_core::domains::auth::HsVerifier::new(
        common::TEST_SECRET,
        common::TEST_ISSUER,
        "some-other-client",
    )
    .issue_token("sub-1", "alice@example.com", &["User"])
    .unwrap();

    let response = harness.get("/api/jobs", Some(&foreign)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_job_lifecycle() {
    let harness = TestHarness::new();
    let token = harness.user_token("alice@example.com");

    let job = create(&harness, &token, "Software Engineer").await;
    assert_eq!(job["status"], "DRAFT");
    assert_eq!(job["author"], "alice@example.com");
    let id = job["id"].as_str().unwrap().to_string();
    let path = format!("/api/jobs/{}", id);

    let fetched = harness.get(&path, Some(&token)).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["title"], "Software Engineer");

    let active = harness.get("/api/jobs?status=ACTIVE", Some(&token)).await;
    assert_eq!(active.body, json!([]));

    let updated = harness
        .request(
            Method::PUT,
            &path,
            Some(&token),
            Some(json!({ "status": "ACTIVE", "title": "Senior Software Engineer" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["status"], "ACTIVE");
    assert_eq!(updated.body["title"], "Senior Software Engineer");
    assert_eq!(updated.body["company"], "Big Corp");

    let active = harness.get("/api/jobs?status=active", Some(&token)).await;
    assert_eq!(active.body.as_array().unwrap().len(), 1);
    assert_eq!(active.body[0]["id"], id.as_str());

    let drafts = harness.get("/api/jobs?status=DRAFT", Some(&token)).await;
    assert_eq!(drafts.body, json!([]));

    let deleted = harness
        .request(Method::DELETE, &path, Some(&token), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = harness.get(&path, Some(&token)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["detail"], format!("Job {} not found", id));

    // Deleting again is not an error
    let deleted = harness
        .request(Method::DELETE, &path, Some(&token), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_closed_job_cannot_reopen() {
    let harness = TestHarness::new();
    let token = harness.user_token("alice@example.com");
    let job = create(&harness, &token, "Data Engineer").await;
    let path = format!("/api/jobs/{}", job["id"].as_str().unwrap());

    let closed = harness
        .request(Method::PUT, &path, Some(&token), Some(json!({ "status": "CLOSED" })))
        .await;
    assert_eq!(closed.status, StatusCode::OK);

    let reopened = harness
        .request(
            Method::PUT,
            &path,
            Some(&token),
            Some(json!({ "status": "ACTIVE", "title": "Changed" })),
        )
        .await;
    assert_eq!(reopened.status, StatusCode::BAD_REQUEST);

    let stored = harness.get(&path, Some(&token)).await;
    assert_eq!(stored.body["status"], "CLOSED");
    assert_eq!(stored.body["title"], "Data Engineer");
}

#[tokio::test]
async fn test_jobs_are_scoped_to_author() {
    let harness = TestHarness::new();
    let alice = harness.user_token("alice@example.com");
    let bob = harness.user_token("bob@example.com");

    let job = create(&harness, &alice, "Backend Engineer").await;
    create(&harness, &bob, "Frontend Engineer").await;
    let path = format!("/api/jobs/{}", job["id"].as_str().unwrap());

    let listed = harness.get("/api/jobs", Some(&bob)).await;
    let titles: Vec<&str> = listed
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Frontend Engineer"]);

    assert_eq!(harness.get(&path, Some(&bob)).await.status, StatusCode::NOT_FOUND);

    let update = harness
        .request(Method::PUT, &path, Some(&bob), Some(json!({ "title": "Hijacked" })))
        .await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);

    let stored = harness.get(&path, Some(&alice)).await;
    assert_eq!(stored.body["title"], "Backend Engineer");
}

#[tokio::test]
async fn test_unknown_status_filter_is_bad_request() {
    let harness = TestHarness::new();
    let token = harness.user_token("alice@example.com");

    let response = harness.get("/api/jobs?status=ARCHIVED", Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_all_pages_through_every_author() {
    let harness = TestHarness::new();
    let alice = harness.user_token("alice@example.com");
    let bob = harness.user_token("bob@example.com");
    create(&harness, &alice, "One").await;
    create(&harness, &alice, "Two").await;
    create(&harness, &bob, "Three").await;

    let first = harness.get("/api/jobs/all?limit=2", Some(&alice)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["jobs"].as_array().unwrap().len(), 2);
    let cursor = first.body["last_key"].as_str().unwrap().to_string();

    let uri = format!("/api/jobs/all?limit=2&last_key={}", cursor.replace('=', "%3D"));
    let second = harness.get(&uri, Some(&alice)).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["jobs"].as_array().unwrap().len(), 1);
    assert!(second.body["last_key"].is_null());

    let mut titles: Vec<String> = first.body["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .chain(second.body["jobs"].as_array().unwrap())
        .map(|j| j["title"].as_str().unwrap().to_string())
        .collect();
    titles.sort();
    assert_eq!(titles, ["One", "Three", "Two"]);
}

#[tokio::test]
async fn test_list_all_rejects_bad_cursor() {
    let harness = TestHarness::new();
    let token = harness.user_token("alice@example.com");

    let response = harness
        .get("/api/jobs/all?last_key=not-a-cursor", Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
