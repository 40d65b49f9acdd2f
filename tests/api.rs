//! HTTP surface tests: drive the router end-to-end against the in-memory
//! store with `oneshot`, asserting status codes, JSON shapes, and the
//! error envelope.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use courier::config::Config;
use courier::store::memory::MemStore;
use courier::{api, AppState};

struct TestApp {
    app: Router,
    mem: Arc<MemStore>,
    buyer: Uuid,
    seller: Uuid,
    store_id: Uuid,
    listing: Uuid,
}

fn spawn_app() -> TestApp {
    let mem = Arc::new(MemStore::new());
    let buyer = mem.seed_user("ana@example.com", Some("Ana"));
    let seller = mem.seed_user("bob@example.com", Some("Bob"));
    let store_id = mem.seed_store(seller);
    let listing = mem.seed_listing(store_id, seller, "Vintage lamp", 4500);

    let state = Arc::new(AppState::new(mem.clone(), Config::default()));
    let app = Router::new()
        .nest("/api/v1", api::api_router())
        .with_state(state);
    TestApp {
        app,
        mem,
        buyer,
        seller,
        store_id,
        listing,
    }
}

fn request(method: &str, uri: &str, user: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_identity_header_is_401() {
    let t = spawn_app();
    let resp = t
        .app
        .oneshot(request("GET", "/api/v1/conversations", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "unauthenticated");
    assert_eq!(body["error"]["type"], "authentication_error");
}

#[tokio::test]
async fn unknown_user_id_is_401() {
    let t = spawn_app();
    let resp = t
        .app
        .oneshot(request(
            "GET",
            "/api/v1/conversations",
            Some(Uuid::new_v4()),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let t = spawn_app();
    let resp = t
        .app
        .oneshot(request("GET", "/api/v1/nope", Some(t.buyer), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_conversation_is_idempotent_per_listing() {
    let t = spawn_app();
    let payload = json!({ "listing_id": t.listing });

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/conversations",
            Some(t.buyer),
            Some(payload.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first = body_json(resp).await;
    assert_eq!(first["buyer_id"], json!(t.buyer));
    assert_eq!(first["seller_id"], json!(t.seller));
    assert_eq!(first["status"], "active");

    let resp = t
        .app
        .oneshot(request(
            "POST",
            "/api/v1/conversations",
            Some(t.buyer),
            Some(payload),
        ))
        .await
        .unwrap();
    let second = body_json(resp).await;
    assert_eq!(first["id"], second["id"]);
}

#[tokio::test]
async fn create_conversation_for_unknown_listing_is_404() {
    let t = spawn_app();
    let resp = t
        .app
        .oneshot(request(
            "POST",
            "/api/v1/conversations",
            Some(t.buyer),
            Some(json!({ "listing_id": Uuid::new_v4() })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["message"], "listing not found");
}

#[tokio::test]
async fn message_flow_round_trip() {
    let t = spawn_app();

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/conversations",
            Some(t.buyer),
            Some(json!({ "listing_id": t.listing })),
        ))
        .await
        .unwrap();
    let conv = body_json(resp).await;
    let conv_id = conv["id"].as_str().unwrap().to_string();

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/conversations/{}/messages", conv_id),
            Some(t.buyer),
            Some(json!({ "body": "Is this available?" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let msg = body_json(resp).await;
    assert_eq!(msg["body"], "Is this available?");
    assert_eq!(msg["is_read"], false);

    // Seller's badge shows the unread thread.
    let resp = t
        .app
        .clone()
        .oneshot(request("GET", "/api/v1/inbox/unread", Some(t.seller), None))
        .await
        .unwrap();
    let badge = body_json(resp).await;
    assert_eq!(badge["total"], 1);
    assert_eq!(badge["conversations"][0]["unread_count"], 1);

    // Opening the thread marks it read.
    let resp = t
        .app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/conversations/{}/messages", conv_id),
            Some(t.seller),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let messages = body_json(resp).await;
    assert_eq!(messages.as_array().unwrap().len(), 1);

    let resp = t
        .app
        .oneshot(request("GET", "/api/v1/inbox/unread", Some(t.seller), None))
        .await
        .unwrap();
    let badge = body_json(resp).await;
    assert_eq!(badge["total"], 0);
}

#[tokio::test]
async fn blank_message_body_is_422() {
    let t = spawn_app();
    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/conversations",
            Some(t.buyer),
            Some(json!({ "listing_id": t.listing })),
        ))
        .await
        .unwrap();
    let conv = body_json(resp).await;
    let conv_id = conv["id"].as_str().unwrap().to_string();

    let resp = t
        .app
        .oneshot(request(
            "POST",
            &format!("/api/v1/conversations/{}/messages", conv_id),
            Some(t.buyer),
            Some(json!({ "body": "   " })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "empty_body");
}

#[tokio::test]
async fn outsiders_cannot_read_a_thread() {
    let t = spawn_app();
    let stranger = t.mem.seed_user("eve@example.com", None);

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/conversations",
            Some(t.buyer),
            Some(json!({ "listing_id": t.listing })),
        ))
        .await
        .unwrap();
    let conv = body_json(resp).await;
    let conv_id = conv["id"].as_str().unwrap().to_string();

    // Known user, but not a participant of this thread.
    let resp = t
        .app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/conversations/{}/messages", conv_id),
            Some(stranger),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Unknown user is rejected earlier, at the identity gate.
    let resp = t
        .app
        .oneshot(request(
            "GET",
            &format!("/api/v1/conversations/{}/messages", conv_id),
            Some(Uuid::new_v4()),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_conversation_then_messages_are_gone() {
    let t = spawn_app();
    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/conversations",
            Some(t.buyer),
            Some(json!({ "listing_id": t.listing })),
        ))
        .await
        .unwrap();
    let conv = body_json(resp).await;
    let conv_id = conv["id"].as_str().unwrap().to_string();

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/conversations/{}", conv_id),
            Some(t.buyer),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = t
        .app
        .oneshot(request(
            "GET",
            &format!("/api/v1/conversations/{}/messages", conv_id),
            Some(t.buyer),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn follow_feeds_the_notification_bell() {
    let t = spawn_app();

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/stores/{}/follow", t.store_id),
            Some(t.buyer),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let state = body_json(resp).await;
    assert_eq!(state["following"], true);

    let resp = t
        .app
        .clone()
        .oneshot(request("GET", "/api/v1/notifications", Some(t.seller), None))
        .await
        .unwrap();
    let rows = body_json(resp).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["kind"], "new_follower");
    assert_eq!(rows[0]["title"], "Ana started following your store");
    assert_eq!(rows[0]["is_read"], false);

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "GET",
            "/api/v1/notifications/unread",
            Some(t.seller),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["unread"], 1);

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/notifications/read-all",
            Some(t.seller),
            None,
        ))
        .await
        .unwrap();
    let outcome = body_json(resp).await;
    assert_eq!(outcome["updated"], 1);
    assert_eq!(outcome["unread"], 0);
}

#[tokio::test]
async fn price_drop_event_notifies_favoriters() {
    let t = spawn_app();

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/listings/{}/favorite", t.listing),
            Some(t.buyer),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/events/price-drop",
            Some(t.seller),
            Some(json!({
                "listing_id": t.listing,
                "old_price_cents": 4500,
                "new_price_cents": 3000,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["notified"], 1);

    let resp = t
        .app
        .oneshot(request("GET", "/api/v1/notifications", Some(t.buyer), None))
        .await
        .unwrap();
    let rows = body_json(resp).await;
    assert_eq!(rows[0]["kind"], "price_drop");
    assert_eq!(rows[0]["body"], "Now $30.00 (was $45.00)");
}
