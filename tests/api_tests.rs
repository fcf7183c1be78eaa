use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use reelmatch::{
    api::{create_router, AppState, SessionSettings},
    error::{AppError, AppResult},
    models::{Catalog, Item},
    services::{providers::PosterProvider, FeatureVectorizer, Recommender},
};

fn catalog() -> Catalog {
    let mut items = vec![
        Item::new(1, "Toy Story (1995)", ["Animation", "Children's", "Comedy"]),
        Item::new(2, "GoldenEye (1995)", ["Action", "Adventure", "Thriller"]),
        Item::new(3, "Four Rooms (1995)", ["Thriller"]),
        Item::new(4, "Get Shorty (1995)", ["Action", "Comedy", "Drama"]),
        Item::new(5, "Alpha", ["Comedy"]),
        Item::new(9, "Alpha", ["Drama"]),
    ];
    items[0].release_date = Some("01-Jan-1995".to_string());
    Catalog::new(items).unwrap()
}

fn create_state() -> AppState {
    let recommender = Recommender::build(catalog(), &FeatureVectorizer::default()).unwrap();
    AppState::new(Arc::new(recommender), SessionSettings::default())
}

fn create_test_server() -> TestServer {
    TestServer::new(create_router(create_state())).unwrap()
}

struct StaticPosters;

#[async_trait::async_trait]
impl PosterProvider for StaticPosters {
    async fn fetch_poster(&self, title: &str) -> AppResult<Option<String>> {
        if title.starts_with("Four Rooms") {
            return Err(AppError::ExternalApi("upstream timeout".to_string()));
        }
        Ok(Some(format!("https://posters.test/{}.jpg", title.len())))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

async fn open_session(server: &TestServer, title: &str) -> Value {
    let response = server
        .post("/api/v1/sessions")
        .json(&json!({ "title": title }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

fn titles(batch: &Value) -> Vec<String> {
    batch["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_list_titles_sorted_and_filtered() {
    let server = create_test_server();

    let all: Vec<String> = server.get("/api/v1/titles").await.json();
    assert_eq!(all.len(), 5);
    assert_eq!(all[0], "Alpha");

    let filtered: Vec<String> = server
        .get("/api/v1/titles")
        .add_query_param("q", "story")
        .await
        .json();
    assert_eq!(filtered, vec!["Toy Story (1995)".to_string()]);
}

#[tokio::test]
async fn test_open_session_resolves_duplicate_title_to_lowest_id() {
    let server = create_test_server();
    let session = open_session(&server, "Alpha").await;

    assert_eq!(session["query"]["id"], 5);
    assert_eq!(session["total"], 5);
    assert!(session["session_id"].as_str().is_some());
}

#[tokio::test]
async fn test_unknown_title_is_404() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/sessions")
        .json(&json!({ "title": "Jumanji (1995)" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Jumanji (1995)"));
}

#[tokio::test]
async fn test_contains_mode_matches_substring() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/sessions")
        .json(&json!({ "title": "shorty", "match_mode": "contains" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let session: Value = response.json();
    assert_eq!(session["query"]["id"], 4);
}

#[tokio::test]
async fn test_paging_until_exhausted() {
    let server = create_test_server();
    let session = open_session(&server, "GoldenEye (1995)").await;
    let next = format!(
        "/api/v1/sessions/{}/next",
        session["session_id"].as_str().unwrap()
    );

    let first: Value = server.post(&next).json(&json!({ "batch_size": 3 })).await.json();
    assert_eq!(first["items"].as_array().unwrap().len(), 3);
    assert_eq!(first["exhausted"], false);
    // Four Rooms shares Thriller, Get Shorty shares Action
    assert_eq!(titles(&first)[0], "Four Rooms (1995)");

    let second: Value = server.post(&next).json(&json!({ "batch_size": 3 })).await.json();
    assert_eq!(second["items"].as_array().unwrap().len(), 2);
    assert_eq!(second["exhausted"], true);
    assert_eq!(second["offset"], 5);

    let third: Value = server.post(&next).json(&json!({ "batch_size": 3 })).await.json();
    assert!(third["items"].as_array().unwrap().is_empty());
    assert_eq!(third["exhausted"], true);

    let mut seen: Vec<u64> = first["items"]
        .as_array()
        .unwrap()
        .iter()
        .chain(second["items"].as_array().unwrap())
        .map(|item| item["id"].as_u64().unwrap())
        .collect();
    assert!(!seen.contains(&2));
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen, vec![1, 3, 4, 5, 9]);
}

#[tokio::test]
async fn test_default_batch_size_without_body() {
    let server = create_test_server();
    let session = open_session(&server, "Toy Story (1995)").await;

    let batch: Value = server
        .post(&format!(
            "/api/v1/sessions/{}/next",
            session["session_id"].as_str().unwrap()
        ))
        .await
        .json();
    assert_eq!(batch["items"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_requery_replaces_cursor() {
    let server = create_test_server();
    let session = open_session(&server, "Toy Story (1995)").await;
    let session_id = session["session_id"].as_str().unwrap().to_string();
    let next = format!("/api/v1/sessions/{}/next", session_id);

    let before: Value = server.post(&next).json(&json!({ "batch_size": 2 })).await.json();

    let response = server
        .post("/api/v1/sessions")
        .json(&json!({ "title": "Toy Story (1995)", "session_id": session_id }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let after: Value = server.post(&next).json(&json!({ "batch_size": 2 })).await.json();
    assert_eq!(titles(&before), titles(&after));
    assert_eq!(after["offset"], 2);
}

#[tokio::test]
async fn test_zero_batch_size_is_400() {
    let server = create_test_server();
    let session = open_session(&server, "Alpha").await;

    let response = server
        .post(&format!(
            "/api/v1/sessions/{}/next",
            session["session_id"].as_str().unwrap()
        ))
        .json(&json!({ "batch_size": 0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_batch_is_400() {
    let server = create_test_server();
    let session = open_session(&server, "Alpha").await;

    let response = server
        .post(&format!(
            "/api/v1/sessions/{}/next",
            session["session_id"].as_str().unwrap()
        ))
        .json(&json!({ "batch_size": 10_000 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_batch_size_is_400_and_keeps_offset() {
    let server = create_test_server();
    let session = open_session(&server, "GoldenEye (1995)").await;
    let next = format!(
        "/api/v1/sessions/{}/next",
        session["session_id"].as_str().unwrap()
    );

    for body in [json!({ "batch_size": -1 }), json!({ "batch_size": "ten" })] {
        let response = server.post(&next).json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    let batch: Value = server.post(&next).json(&json!({ "batch_size": 1 })).await.json();
    assert_eq!(batch["offset"], 1);
    assert_eq!(titles(&batch), vec!["Four Rooms (1995)".to_string()]);
}

#[tokio::test]
async fn test_evicted_session_is_404() {
    let recommender = Recommender::build(catalog(), &FeatureVectorizer::default()).unwrap();
    let settings = SessionSettings {
        max_sessions: 1,
        ..SessionSettings::default()
    };
    let server = TestServer::new(create_router(AppState::new(Arc::new(recommender), settings)))
        .unwrap();

    let first = open_session(&server, "Alpha").await;
    let second = open_session(&server, "Toy Story (1995)").await;

    server
        .post(&format!(
            "/api/v1/sessions/{}/next",
            first["session_id"].as_str().unwrap()
        ))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post(&format!(
            "/api/v1/sessions/{}/next",
            second["session_id"].as_str().unwrap()
        ))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let server = create_test_server();
    let response = server
        .post(&format!("/api/v1/sessions/{}/next", uuid::Uuid::new_v4()))
        .json(&json!({ "batch_size": 1 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_close_session() {
    let server = create_test_server();
    let session = open_session(&server, "Alpha").await;
    let path = format!("/api/v1/sessions/{}", session["session_id"].as_str().unwrap());

    server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
    server.delete(&path).await.assert_status(StatusCode::NOT_FOUND);
    server
        .post(&format!("{}/next", path))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_posters_are_additive() {
    let state = create_state().with_posters(Arc::new(StaticPosters));
    let server = TestServer::new(create_router(state)).unwrap();
    let session = open_session(&server, "GoldenEye (1995)").await;
    let next = format!(
        "/api/v1/sessions/{}/next",
        session["session_id"].as_str().unwrap()
    );

    let batch: Value = server
        .post(&next)
        .json(&json!({ "batch_size": 2, "posters": true }))
        .await
        .json();

    let items = batch["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Failed lookup still returns the title, just without a poster
    assert_eq!(items[0]["title"], "Four Rooms (1995)");
    assert!(items[0]["poster_url"].is_null());
    assert!(items[1]["poster_url"].as_str().unwrap().starts_with("https://posters.test/"));
}
