//! HTTP-level tests for the excuse service router.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use excuse_engine::service::{create_router, ServiceState};
use excuse_engine::{Fragment, FragmentKind, InMemoryStore, Law, Meme, Role};
use serde_json::{json, Value};
use tower::ServiceExt;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn seeded_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();
    for kind in FragmentKind::DRAW_ORDER {
        store.add_fragment(Fragment::new(kind, format!("universal {} text", kind), None));
        store.add_fragment(Fragment::new(kind, format!("developer {} text", kind), Some(Role::Dev)));
    }
    store.add_meme(Meme::new("Anon", "it works on my machine"));
    store.add_law(Law::new("Murphy's Law", "Anything that can go wrong will.", "Murphy"));
    Arc::new(store)
}

fn app(store: Arc<InMemoryStore>) -> Router {
    create_router(ServiceState::from_arc(store))
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
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Excuses
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_generation_endpoints() {
    let store = seeded_store();
    let app = app(Arc::clone(&store));

    for (uri, expected_type) in [
        ("/api/excuses/random", "SIMPLE"),
        ("/api/excuses/meme", "WITH_MEME"),
        ("/api/excuses/law", "WITH_LAW"),
        ("/api/excuses/ultra", "ULTRA"),
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["type"], expected_type);
        assert!(body["context"]["text"].is_string());
        assert!(body["text"].as_str().unwrap().len() > 0);
    }

    let (_, ultra) = get(&app, "/api/excuses/ultra").await;
    assert_eq!(ultra["meme"]["author"], "Anon");
    assert_eq!(ultra["law"]["category"], "Murphy");
    assert_eq!(store.num_excuses(), 5);
}

#[tokio::test]
async fn test_role_endpoint() {
    let app = app(seeded_store());

    let (status, body) = get(&app, "/api/excuses/role/dev").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "DEV");
    for slot in ["context", "cause", "consequence", "recommendation"] {
        assert_eq!(body[slot]["role"], "DEV");
    }

    let (status, body) = get(&app, "/api/excuses/role/wizard").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ROLE");
}

#[tokio::test]
async fn test_daily_endpoint_is_reproducible() {
    let app = app(seeded_store());

    let (status, a) = get(&app, "/api/excuses/daily?date=2024-01-01").await;
    assert_eq!(status, StatusCode::OK);
    let (_, b) = get(&app, "/api/excuses/daily?date=2024-01-01").await;

    assert_eq!(a["seed"], 19_723);
    assert_ne!(a["id"], b["id"]);
    for slot in ["context", "cause", "consequence", "recommendation"] {
        assert_eq!(a[slot]["id"], b[slot]["id"]);
    }
}

#[tokio::test]
async fn test_empty_store_is_conflict() {
    let app = app(Arc::new(InMemoryStore::new()));
    let (status, body) = get(&app, "/api/excuses/random").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NO_FRAGMENTS_AVAILABLE");
}

#[tokio::test]
async fn test_manual_create_then_fetch_and_list() {
    let store = seeded_store();
    let app = app(Arc::clone(&store));

    let (_, fragments) = get(&app, "/api/fragments?kind=cause").await;
    let cause_id = fragments[0]["id"].clone();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/excuses",
        Some(json!({
            "context_id": "00000000-0000-0000-0000-00000000dead",
            "cause_id": cause_id,
            "type": "WITH_MEME",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["context"].is_null());
    assert_eq!(created["cause"]["id"], cause_id);
    assert_eq!(created["type"], "WITH_MEME");

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = get(&app, &format!("/api/excuses/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);

    let (_, listed) = get(&app, "/api/excuses").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dangling_reference_is_distinguishable() {
    let store = seeded_store();
    let app = app(Arc::clone(&store));

    let (_, generated) = get(&app, "/api/excuses/ultra").await;
    assert_eq!(generated["dangling"], false);
    let cause_id = generated["cause"]["id"].clone();
    assert_eq!(generated["refs"]["cause_id"], cause_id);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/fragments/{}", cause_id.as_str().unwrap()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, fetched) = get(&app, &format!("/api/excuses/{}", generated["id"].as_str().unwrap())).await;
    assert!(fetched["cause"].is_null());
    assert_eq!(fetched["refs"]["cause_id"], cause_id);
    assert_eq!(fetched["dangling"], true);

    let (_, manual) = send(&app, Method::POST, "/api/excuses", Some(json!({}))).await;
    assert!(manual["context"].is_null());
    assert!(manual["refs"]["context_id"].is_null());
    assert_eq!(manual["dangling"], false);
}

#[tokio::test]
async fn test_excuse_lookup_errors() {
    let app = app(seeded_store());

    let (status, body) = get(&app, "/api/excuses/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ID");

    let (status, body) = get(&app, "/api/excuses/00000000-0000-0000-0000-000000000042").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// ─────────────────────────────────────────────────────────────────────────────
// Content
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fragment_crud() {
    let app = app(Arc::new(InMemoryStore::new()));

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/fragments",
        Some(json!({"kind": "CAUSE", "text": "the certificate expired", "role": "DEVOPS"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/fragments/{}", created["id"].as_str().unwrap());

    let (status, updated) = send(&app, Method::PUT, &uri, Some(json!({"text": "the certificate expired again"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["text"], "the certificate expired again");
    assert_eq!(updated["kind"], "CAUSE");

    let (_, devops) = get(&app, "/api/fragments?role=devops").await;
    assert_eq!(devops.as_array().unwrap().len(), 1);
    let (_, contexts) = get(&app, "/api/fragments?kind=CONTEXT").await;
    assert!(contexts.as_array().unwrap().is_empty());

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_content_validation_and_filters() {
    let app = app(Arc::new(InMemoryStore::new()));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/memes",
        Some(json!({"author": "Anon", "quote": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["details"], "quote");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/laws",
        Some(json!({"name": "Hofstadter's Law", "description": "It always takes longer.", "category": "Hofstadter"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, laws) = get(&app, "/api/laws?category=Hofstadter").await;
    assert_eq!(laws.as_array().unwrap().len(), 1);
    let (_, laws) = get(&app, "/api/laws?category=Murphy").await;
    assert!(laws.as_array().unwrap().is_empty());

    let (status, body) = get(&app, "/api/fragments?kind=PUNCHLINE").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_KIND");
}

// ─────────────────────────────────────────────────────────────────────────────
// Roles and Health
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_roles() {
    let app = app(seeded_store());

    let (status, body) = get(&app, "/api/roles").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"], json!(["DEV", "QA", "DEVOPS", "PM", "ARCHITECT", "DEVREL"]));

    let (status, body) = get(&app, "/api/roles/qa").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"role": "QA", "valid": true}));

    let (status, body) = get(&app, "/api/roles/cto").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["valid"], false);
    assert_eq!(body["role"], "cto");
}

#[tokio::test]
async fn test_role_creation_is_refused() {
    let app = app(seeded_store());

    let (status, body) = send(&app, Method::POST, "/api/roles", Some(json!({"role": "CTO"}))).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["code"], "NOT_IMPLEMENTED");
    assert_eq!(body["details"], "CTO");

    let (status, _) = send(&app, Method::POST, "/api/roles", None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

    let (_, roles) = get(&app, "/api/roles").await;
    assert_eq!(roles["roles"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_health_probes() {
    let app = app(seeded_store());

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["content"]["fragments"], 8);

    let (status, body) = get(&app, "/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");

    let (status, body) = get(&app, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}
