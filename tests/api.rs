// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use livestream_hub::api::{router, AppState};
use livestream_hub::models::{
    CheckoutCompletion, Comment, Friend, FriendRequest, Livestream, LivestreamChanges, LivestreamStatus,
    NotificationSettings, Tier, User,
};
use livestream_hub::payments::signature::compute_signature;
use livestream_hub::payments::{
    CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentProcessor, SIGNATURE_HEADER,
};
use livestream_hub::services::BillingConfig;
use livestream_hub::store::{
    CommentStore, FriendStore, LivestreamStore, MemoryStore, NotificationSettingsStore, Store, StoreError, UserStore,
};

const WEBHOOK_SECRET: &str = "whsec_test";

#[derive(Default)]
struct FakeProcessor {
    sessions: AtomicUsize,
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_checkout_session(&self, _request: &CheckoutSessionRequest) -> Result<CheckoutSession, PaymentError> {
        let n = self.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CheckoutSession {
            session_id: format!("cs_test_{}", n),
            url: format!("https://checkout.test/cs_test_{}", n),
        })
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    processor: Arc<FakeProcessor>,
}

fn billing_config() -> BillingConfig {
    BillingConfig {
        premium_price_id: Some("price_premium".to_string()),
        price_tiers: [("price_premium".to_string(), Tier::Premium)].into_iter().collect(),
        currency: "usd".to_string(),
        success_url: "https://app.test/success".to_string(),
        cancel_url: "https://app.test/cancel".to_string(),
        webhook_secret: WEBHOOK_SECRET.to_string(),
        webhook_tolerance_secs: 300,
    }
}

fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let processor = Arc::new(FakeProcessor::default());
    let state = AppState::new(store.clone(), processor.clone(), billing_config());
    TestApp {
        router: router(state, false),
        store,
        processor,
    }
}

async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    read(app.router.clone().oneshot(request).await.unwrap()).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_livestream(app: &TestApp, title: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/livestreams",
        Some(json!({
            "creatorId": "creator-1",
            "creatorName": "Creator",
            "title": title,
            "tags": ["music"],
            "viewerCount": 99,
            "status": "scheduled"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn created_livestream_is_live_with_no_viewers() {
    let app = test_app();
    let id = create_livestream(&app, "Late night jazz").await;

    let (status, body) = send(&app, Method::GET, &format!("/livestreams/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "live");
    assert_eq!(body["data"]["viewerCount"], 0);
    assert_eq!(body["data"]["title"], "Late night jazz");
}

#[tokio::test]
async fn create_without_title_is_rejected() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/livestreams",
        Some(json!({ "creatorId": "creator-1", "title": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn list_filters_by_search_and_reports_total() {
    let app = test_app();
    create_livestream(&app, "Morning Yoga").await;
    create_livestream(&app, "Chess openings").await;

    let (status, body) = send(&app, Method::GET, "/livestreams?search=yoga", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Morning Yoga");

    let (status, body) = send(&app, Method::GET, "/livestreams?status=scheduled", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);

    let (status, _) = send(&app, Method::GET, "/livestreams?status=paused", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_livestream_is_not_found() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/livestreams/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Method::GET, "/livestreams/nope/stream", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/livestreams/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_of_missing_livestream_creates_nothing() {
    let app = test_app();
    let (status, _) = send(
        &app,
        Method::PATCH,
        "/livestreams/ghost",
        Some(json!({ "title": "Ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/livestreams", None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn viewer_count_moves_and_never_goes_negative() {
    let app = test_app();
    let id = create_livestream(&app, "Speedrun").await;
    let uri = format!("/livestreams/{}/stream", id);

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "action": "decrement" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["viewerCount"], 0);

    for _ in 0..3 {
        send(&app, Method::PATCH, &uri, Some(json!({ "action": "increment" }))).await;
    }
    let (_, body) = send(&app, Method::PATCH, &uri, Some(json!({ "action": "decrement" }))).await;
    assert_eq!(body["data"]["viewerCount"], 2);
    assert!(body.get("degraded").is_none());

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["data"]["viewerCount"], 2);
    assert_eq!(body["data"]["status"], "live");

    let (_, body) = send(&app, Method::PATCH, &uri, Some(json!({ "action": "reset" }))).await;
    assert_eq!(body["data"]["viewerCount"], 0);

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "action": "explode" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comments_are_listed_newest_first() {
    let app = test_app();
    let id = create_livestream(&app, "Q&A").await;
    let uri = format!("/livestreams/{}/comments", id);

    for content in ["first", "second"] {
        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "authorId": "viewer", "authorName": "Viewer", "content": content })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "authorId": "viewer", "content": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"][0]["content"], "second");
    assert_eq!(body["data"][1]["content"], "first");
}

#[tokio::test]
async fn friend_request_lifecycle() {
    let app = test_app();
    let alice = json!({ "id": "alice", "name": "Alice" });

    let (status, _) = send(&app, Method::POST, "/users/bob/friend-requests", Some(alice.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, Method::POST, "/users/bob/friend-requests", Some(alice.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&app, Method::GET, "/users/bob/friend-requests/alice", None).await;
    assert_eq!(body["data"]["pending"], true);

    let (status, _) = send(&app, Method::POST, "/users/bob/friend-requests/alice/accept", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/users/alice/friends/bob", None).await;
    assert_eq!(body["data"]["areFriends"], true);
    let (_, body) = send(&app, Method::GET, "/users/bob/friends", None).await;
    assert_eq!(body["total"], 1);

    let (status, _) = send(&app, Method::POST, "/users/bob/friend-requests", Some(alice)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::DELETE, "/users/alice/friends/bob", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, Method::GET, "/users/bob/friends/alice", None).await;
    assert_eq!(body["data"]["areFriends"], false);
}

#[tokio::test]
async fn accepting_a_missing_request_is_not_found() {
    let app = test_app();
    let (status, _) = send(&app, Method::POST, "/users/bob/friend-requests/carol/accept", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/users/bob/friends", None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn notification_settings_default_then_toggle() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/users/dana/notification-settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["follow"], true);
    assert_eq!(body["data"]["email"], false);
    assert_eq!(app.store.notification_settings_count().await, 0);

    let (_, body) = send(
        &app,
        Method::PUT,
        "/users/dana/notification-settings",
        Some(json!({ "like": false })),
    )
    .await;
    assert_eq!(body["data"]["like"], false);
    assert_eq!(body["data"]["comment"], true);

    let (_, body) = send(&app, Method::POST, "/users/dana/notification-settings/email/toggle", None).await;
    assert_eq!(body["data"]["email"], true);
    assert_eq!(body["data"]["like"], false);

    let (status, _) = send(&app, Method::POST, "/users/dana/notification-settings/sms/toggle", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_returns_session_url() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/checkout",
        Some(json!({ "userId": "erin", "email": "erin@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], "cs_test_1");
    assert!(body["url"].as_str().unwrap().starts_with("https://checkout.test/"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/stripe/checkout",
        Some(json!({ "userId": "erin", "email": "erin@example.com", "creatorId": "c1", "priceCents": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(body.get("success").is_none());
    assert_eq!(app.processor.sessions.load(Ordering::SeqCst), 1);
}

fn checkout_completed(user_id: &str) -> Vec<u8> {
    json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "cs_1",
            "customer": "cus_1",
            "customer_email": "erin@example.com",
            "subscription": "sub_1",
            "metadata": { "userId": user_id, "priceId": "price_premium" }
        }}
    })
    .to_string()
    .into_bytes()
}

fn webhook_request(payload: Vec<u8>, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri("/webhooks/stripe");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(payload)).unwrap()
}

#[tokio::test]
async fn webhook_with_bad_signature_changes_nothing() {
    let app = test_app();
    let payload = checkout_completed("erin");
    let now = chrono::Utc::now().timestamp();
    let forged = compute_signature("whsec_wrong", now, &payload).unwrap();

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(payload.clone(), Some(format!("t={},v1={}", now, forged))))
        .await
        .unwrap();
    let (status, body) = read(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let response = app.router.clone().oneshot(webhook_request(payload, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(app.store.find_user("erin").await.unwrap().is_none());
}

#[tokio::test]
async fn signed_checkout_webhook_grants_entitlement() {
    let app = test_app();
    let payload = checkout_completed("erin");
    let now = chrono::Utc::now().timestamp();
    let signature = compute_signature(WEBHOOK_SECRET, now, &payload).unwrap();

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(payload, Some(format!("t={},v1={}", now, signature))))
        .await
        .unwrap();
    let (status, body) = read(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let (status, body) = send(&app, Method::GET, "/users/erin/entitlement?required=pro", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "premium");
    assert_eq!(body["hasAccess"], true);

    let (_, body) = send(&app, Method::GET, "/users/frank/entitlement", None).await;
    assert_eq!(body["hasAccess"], false);
}

#[tokio::test]
async fn unknown_webhook_events_are_acknowledged() {
    let app = test_app();
    let payload = json!({ "id": "evt_2", "type": "invoice.paid", "data": { "object": {} } })
        .to_string()
        .into_bytes();
    let now = chrono::Utc::now().timestamp();
    let signature = compute_signature(WEBHOOK_SECRET, now, &payload).unwrap();

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(payload, Some(format!("t={},v1={}", now, signature))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_and_metrics_respond() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// Backend whose every call fails
struct OfflineStore;

fn offline<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("offline".to_string()))
}

#[async_trait]
impl LivestreamStore for OfflineStore {
    async fn list_livestreams(&self, _: Option<LivestreamStatus>) -> Result<Vec<Livestream>, StoreError> {
        offline()
    }
    async fn find_livestream(&self, _: &str) -> Result<Option<Livestream>, StoreError> {
        offline()
    }
    async fn insert_livestream(&self, _: &Livestream) -> Result<Livestream, StoreError> {
        offline()
    }
    async fn update_livestream(&self, _: &str, _: &LivestreamChanges) -> Result<Option<Livestream>, StoreError> {
        offline()
    }
    async fn delete_livestream(&self, _: &str) -> Result<bool, StoreError> {
        offline()
    }
    async fn increment_viewer_count(&self, _: &str, _: i64) -> Result<bool, StoreError> {
        offline()
    }
    async fn set_viewer_count(&self, _: &str, _: i64) -> Result<bool, StoreError> {
        offline()
    }
}

#[async_trait]
impl CommentStore for OfflineStore {
    async fn list_comments(&self, _: &str) -> Result<Vec<Comment>, StoreError> {
        offline()
    }
    async fn insert_comment(&self, _: &Comment) -> Result<Comment, StoreError> {
        offline()
    }
}

#[async_trait]
impl FriendStore for OfflineStore {
    async fn find_friend_request(&self, _: &str, _: &str) -> Result<Option<FriendRequest>, StoreError> {
        offline()
    }
    async fn list_friend_requests(&self, _: &str) -> Result<Vec<FriendRequest>, StoreError> {
        offline()
    }
    async fn insert_friend_request(&self, _: &FriendRequest) -> Result<(), StoreError> {
        offline()
    }
    async fn delete_friend_request(&self, _: &str, _: &str) -> Result<bool, StoreError> {
        offline()
    }
    async fn find_friend(&self, _: &str, _: &str) -> Result<Option<Friend>, StoreError> {
        offline()
    }
    async fn list_friends(&self, _: &str) -> Result<Vec<Friend>, StoreError> {
        offline()
    }
    async fn accept_friend_request(&self, _: &str, _: &str) -> Result<bool, StoreError> {
        offline()
    }
    async fn delete_friendship(&self, _: &str, _: &str) -> Result<(), StoreError> {
        offline()
    }
}

#[async_trait]
impl NotificationSettingsStore for OfflineStore {
    async fn find_notification_settings(&self, _: &str) -> Result<Option<NotificationSettings>, StoreError> {
        offline()
    }
    async fn save_notification_settings(
        &self,
        _: &str,
        _: NotificationSettings,
    ) -> Result<NotificationSettings, StoreError> {
        offline()
    }
}

#[async_trait]
impl UserStore for OfflineStore {
    async fn find_user(&self, _: &str) -> Result<Option<User>, StoreError> {
        offline()
    }
    async fn record_checkout(&self, _: &CheckoutCompletion) -> Result<User, StoreError> {
        offline()
    }
    async fn clear_subscription(&self, _: &str) -> Result<Option<User>, StoreError> {
        offline()
    }
}

#[async_trait]
impl Store for OfflineStore {
    async fn ping(&self) -> Result<(), StoreError> {
        offline()
    }
}

fn offline_app() -> TestApp {
    let processor = Arc::new(FakeProcessor::default());
    let state = AppState::new(Arc::new(OfflineStore), processor.clone(), billing_config());
    TestApp {
        router: router(state, false),
        store: Arc::new(MemoryStore::new()),
        processor,
    }
}

#[tokio::test]
async fn stream_action_degrades_when_store_is_down() {
    let app = offline_app();

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/livestreams/any/stream",
        Some(json!({ "action": "increment" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["degraded"], true);
    assert!(body["data"]["viewerCount"].is_null());
    assert!(body["data"]["status"].is_null());

    let (status, body) = send(&app, Method::GET, "/users/bob/friends", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
    assert_eq!(body["total"], 0);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn subscription_checkout_rejects_oversized_price() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/stripe/checkout",
        Some(json!({
            "userId": "erin",
            "email": "erin@example.com",
            "creatorId": "c1",
            "priceCents": 922_337_203_685_477_580_i64
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(app.processor.sessions.load(Ordering::SeqCst), 0);
}
