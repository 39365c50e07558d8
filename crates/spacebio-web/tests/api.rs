//! Router tests against an in-memory store, the keyword chat backend and a
//! stub article scraper.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use spacebio_common::Paper;
use spacebio_db::{Database, PaperRepository};
use spacebio_ingestion::sources::ArticleSource;
use spacebio_ingestion::{ArticleMetadata, IngestError};
use spacebio_llm::KeywordBackend;
use spacebio_web::config::Config;
use spacebio_web::router::build_router;
use spacebio_web::state::{AppEvent, AppState};
use tower::ServiceExt;

/// Serves a fixed article for any URL containing "PMC", fails otherwise.
struct StubSource;

#[async_trait]
impl ArticleSource for StubSource {
    async fn fetch_article(&self, url: &str) -> spacebio_ingestion::Result<ArticleMetadata> {
        if !url.contains("PMC") {
            return Err(IngestError::HttpStatus { status: 404, url: url.to_string() });
        }
        Ok(ArticleMetadata {
            title: Some("Microgravity alters bone remodeling in mice".to_string()),
            doi: Some("10.1000/bone.2020".to_string()),
            abstract_text: Some("Mice flown on the ISS lost trabecular bone.".to_string()),
            pdf_url: None,
            pmcid: Some("PMC123".to_string()),
            html_url: url.to_string(),
            year: 2020,
            authors: "Smith J, Doe A".to_string(),
            source: "PMC".to_string(),
        })
    }
}

async fn state_with(papers: &[Paper]) -> AppState {
    let db = Database::open_in_memory().unwrap();
    db.initialize().await.unwrap();
    let db = Arc::new(db);
    PaperRepository::new(db.clone()).insert_batch(papers).await.unwrap();

    AppState::new(db, Config::default(), Arc::new(KeywordBackend), Arc::new(StubSource))
}

async fn app_with(papers: &[Paper]) -> Router {
    build_router(state_with(papers).await)
}

fn corpus(n: usize) -> Vec<Paper> {
    (1..=n)
        .map(|i| {
            let mut p = Paper::with_defaults("", format!("Study {i} of plant roots"), format!("https://example.org/{i}"));
            p.year = Some(2010 + (i as i32 % 10));
            p
        })
        .collect()
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

#[tokio::test]
async fn test_health() {
    let app = app_with(&corpus(3)).await;
    let (status, body) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["count"], 3);
    assert_eq!(body["chat_backend"], "keyword");
}

#[tokio::test]
async fn test_list_paging_is_clamped() {
    let app = app_with(&corpus(12)).await;

    let (status, body) = get(&app, "/api/papers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 12);

    let (_, body) = get(&app, "/api/papers?limit=0").await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = get(&app, "/api/papers?limit=5&offset=10").await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = get(&app, "/api/papers?limit=5000").await;
    assert_eq!(body.as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_bad_integer_param_is_400() {
    let app = app_with(&corpus(2)).await;
    let (status, body) = get(&app, "/api/papers?limit=ten").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("limit"));

    let (status, _) = get(&app, "/api/papers/search?year_gte=soon").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_ranks_and_filters() {
    let mut papers = corpus(4);
    papers[2].title = "Bone density loss in spaceflight".to_string();
    papers[2].year = Some(2021);
    let app = app_with(&papers).await;

    let (status, body) = get(&app, "/api/papers/search?q=bone").await;
    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "Bone density loss in spaceflight");
    assert!(hits[0]["score"].as_f64().unwrap() > 0.0);

    let (_, body) = get(&app, "/api/papers?q=bone&year_lte=2020").await;
    // Nothing left after the year filter, so the fallback list comes back.
    assert!(body.as_array().unwrap().iter().all(|h| h["title"] != "Bone density loss in spaceflight"));
}

#[tokio::test]
async fn test_missing_paper_is_404() {
    let app = app_with(&corpus(1)).await;
    let (status, body) = get(&app, "/api/papers/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Paper not found: 999");

    let (status, _) = send(&app, Method::DELETE, "/api/papers/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::PUT, "/api/papers/999", Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_delete() {
    let app = app_with(&corpus(2)).await;
    let (_, titles) = get(&app, "/api/papers/titles").await;
    let id = titles[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/papers/{id}"),
        Some(json!({ "id": "42", "organism": "Mouse", "hasOSDR": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["organism"], "Mouse");
    assert_eq!(body["hasOSDR"], true);
    assert_eq!(body["title"], "Study 1 of plant roots");

    let (status, body) = send(&app, Method::DELETE, &format!("/api/papers/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains(&id));
    let (status, _) = get(&app, &format!("/api/papers/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_skips_incomplete_rows() {
    let app = app_with(&[]).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/papers/bulk",
        Some(json!([
            { "title": "Arabidopsis on the ISS", "url": "https://example.org/a" },
            { "title": "No url" },
            { "url": "https://example.org/no-title" },
            { "title": "Rodent Research-1", "url": "https://example.org/b", "year": 2016 },
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved_count"], 2);
    assert_eq!(body["total_papers"], 2);
}

#[tokio::test]
async fn test_bulk_accepts_loose_scalars() {
    let app = app_with(&[]).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/papers/bulk",
        Some(json!([
            { "title": "Bone loss in flight", "url": "https://example.org/bone", "year": "2019", "hasOSDR": "yes" },
            { "title": "Plant roots", "url": "https://example.org/roots", "citations": "12" },
            "not a paper",
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved_count"], 2);
    assert_eq!(body["message"], "Successfully saved 2 papers");

    let (_, papers) = get(&app, "/api/papers?q=bone").await;
    let paper = &papers[0];
    assert_eq!(paper["year"], 2019);
    assert_eq!(paper["hasOSDR"], true);
}

#[tokio::test]
async fn test_bulk_rejects_non_array_body() {
    let app = app_with(&[]).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/papers/bulk",
        Some(json!({ "title": "Single", "url": "https://example.org/s" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Expected array of papers");
}

#[tokio::test]
async fn test_create_paper() {
    let app = app_with(&[]).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/papers",
        Some(json!({ "title": "Rodent Research-1", "url": "https://example.org/rr1", "mission": "RR-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Rodent Research-1");
    assert_eq!(body["mission"], "RR-1");

    let id = body["id"].as_str().unwrap().to_string();
    let (status, stored) = get(&app, &format!("/api/papers/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["url"], "https://example.org/rr1");
}

#[tokio::test]
async fn test_create_paper_requires_title_and_url() {
    let app = app_with(&[]).await;
    let (status, body) = send(&app, Method::POST, "/api/papers", Some(json!({ "title": "No url" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title and URL are required");

    let (_, health) = get(&app, "/api/health").await;
    assert_eq!(health["count"], 0);
}

#[tokio::test]
async fn test_add_paper_validation() {
    let app = app_with(&corpus(1)).await;

    let (status, _) = send(&app, Method::POST, "/api/papers/add", Some(json!({ "url": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::POST, "/api/papers/add", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/papers/add",
        Some(json!({ "url": "https://example.org/1/#section" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_add_paper_scrapes_and_stores() {
    let app = app_with(&[]).await;
    let url = "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC123/";

    let (status, body) = send(&app, Method::POST, "/api/papers/add", Some(json!({ "url": url }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["paper"]["title"], "Microgravity alters bone remodeling in mice");
    assert_eq!(body["paper"]["hasDOI"], true);

    // Same DOI behind a different URL is still a duplicate.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/papers/add",
        Some(json!({ "url": "https://pmc.ncbi.nlm.nih.gov/articles/PMC123/" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/papers/add",
        Some(json!({ "url": "https://example.org/missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_empty_chat_is_400() {
    let app = app_with(&[]).await;
    let (status, body) = send(&app, Method::POST, "/api/chat", Some(json!({ "messages": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No messages provided");
}

#[tokio::test]
async fn test_keyword_chat_reply() {
    let app = app_with(&[]).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(json!({ "messages": [{ "role": "user", "content": "What does radiation do?" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], true);
    assert!(body["answer"].as_str().unwrap().contains("radiation"));
}

#[tokio::test]
async fn test_context_chat_reports_sources() {
    let app = app_with(&corpus(7)).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/chat/context",
        Some(json!({
            "messages": [{ "role": "user", "content": "Tell me about plants" }],
            "searchQuery": "plant roots",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["context_papers"], 5);
    assert_eq!(body["sources"].as_array().unwrap().len(), 5);
    assert_eq!(body["sources"][0]["idx"], 1);
    assert!(body["answer"].is_string());
}

#[tokio::test]
async fn test_context_chat_without_hits_has_no_sources() {
    let app = app_with(&corpus(7)).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/chat/context",
        Some(json!({
            "messages": [{ "role": "user", "content": "What about the heart?" }],
            "searchQuery": "zebrafish cardiology",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["context_papers"], 0);
    assert!(body["sources"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_category_graph() {
    let app = app_with(&corpus(5)).await;
    let (status, body) = get(&app, "/api/graph/categories?dimension=area").await;
    assert_eq!(status, StatusCode::OK);
    let nodes = body["nodes"].as_array().unwrap();
    assert!(nodes.iter().filter(|n| n["kind"] == "paper").count() == 5);
    assert!(nodes.iter().all(|n| n["x"].is_number() && n["y"].is_number()));

    let (status, _) = get(&app, "/api/graph/categories?dimension=planet").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_knowledge_graph_params() {
    let app = app_with(&corpus(4)).await;
    let (status, body) = get(&app, "/api/graph/knowledge?layout=false&threshold=0.1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["nodes"].as_array().unwrap().iter().all(|n| n.get("x").is_none()));

    let (status, _) = get(&app, "/api/graph/knowledge?threshold=high").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_enrich_all_on_empty_store() {
    let app = app_with(&corpus(2)).await;
    let (status, body) = send(&app, Method::POST, "/api/papers/enrich-all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total_papers"], 0);
}

#[tokio::test]
async fn test_enrich_all_publishes_progress() {
    let mut stale = Paper::with_defaults("", "Stub", "https://pmc.ncbi.nlm.nih.gov/articles/PMC123/");
    stale.abstract_text = String::new();
    let state = state_with(&[stale]).await;
    let mut rx = state.subscribe();
    let app = build_router(state);

    let (status, _) = send(&app, Method::POST, "/api/papers/enrich-all", None).await;
    assert_eq!(status, StatusCode::OK);

    let mut processed = Vec::new();
    loop {
        match rx.try_recv().unwrap() {
            AppEvent::EnrichmentProgress(progress) => {
                assert_eq!(progress.total, 1);
                processed.push(progress.processed);
            }
            AppEvent::EnrichmentComplete { enriched, errors, skipped } => {
                assert_eq!((enriched, errors, skipped), (1, 0, 0));
                break;
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(processed, vec![0, 1]);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_added_papers_publish_events() {
    let state = state_with(&[]).await;
    let mut rx = state.subscribe();
    let app = build_router(state);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/papers/add",
        Some(json!({ "url": "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC123/" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    match rx.try_recv().unwrap() {
        AppEvent::PaperAdded { paper_id, title } => {
            assert_eq!(paper_id, body["paper"]["id"].as_str().unwrap());
            assert_eq!(title, "Microgravity alters bone remodeling in mice");
        }
        other => panic!("expected paper_added, got {other:?}"),
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/papers",
        Some(json!({ "title": "Cell culture on orbit", "url": "https://example.org/cells" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    match rx.try_recv().unwrap() {
        AppEvent::PaperAdded { paper_id, title } => {
            assert_eq!(paper_id, body["id"].as_str().unwrap());
            assert_eq!(title, "Cell culture on orbit");
        }
        other => panic!("expected paper_added, got {other:?}"),
    }
    assert!(rx.try_recv().is_err());
}
