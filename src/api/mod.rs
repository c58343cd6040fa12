// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

mod handlers;
pub mod response;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::payments::PaymentProcessor;
use crate::services::{
    BillingConfig, BillingService, CommentService, FriendService, LivestreamService, NotificationService,
};
use crate::store::Store;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub livestreams: Arc<LivestreamService>,
    pub comments: Arc<CommentService>,
    pub friends: Arc<FriendService>,
    pub notifications: Arc<NotificationService>,
    pub billing: Arc<BillingService>,
}

impl AppState {
    /// Wire every service to one store backend and one payment processor
    pub fn new<S: Store + 'static>(
        store: Arc<S>,
        processor: Arc<dyn PaymentProcessor>,
        billing: BillingConfig,
    ) -> Self {
        Self {
            livestreams: Arc::new(LivestreamService::new(store.clone())),
            comments: Arc::new(CommentService::new(store.clone())),
            friends: Arc::new(FriendService::new(store.clone())),
            notifications: Arc::new(NotificationService::new(store.clone())),
            billing: Arc::new(BillingService::new(processor, store.clone(), billing)),
            store,
        }
    }
}

/// Build the router with all routes
pub fn router(state: AppState, enable_cors: bool) -> Router {
    let app = Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        // Livestream routes
        .route(
            "/livestreams",
            get(handlers::livestreams::list_livestreams).post(handlers::livestreams::create_livestream),
        )
        .route(
            "/livestreams/:id",
            get(handlers::livestreams::get_livestream)
                .patch(handlers::livestreams::update_livestream)
                .delete(handlers::livestreams::delete_livestream),
        )
        .route(
            "/livestreams/:id/stream",
            get(handlers::livestreams::get_stream).patch(handlers::livestreams::update_stream),
        )
        .route(
            "/livestreams/:id/comments",
            get(handlers::comments::list_comments).post(handlers::comments::add_comment),
        )
        // Friend routes
        .route("/users/:user_id/friends", get(handlers::friends::list_friends))
        .route(
            "/users/:user_id/friends/:other_id",
            get(handlers::friends::check_friendship).delete(handlers::friends::remove_friend),
        )
        .route(
            "/users/:user_id/friend-requests",
            get(handlers::friends::list_requests).post(handlers::friends::send_request),
        )
        .route(
            "/users/:user_id/friend-requests/:request_id",
            get(handlers::friends::check_request),
        )
        .route(
            "/users/:user_id/friend-requests/:request_id/accept",
            post(handlers::friends::accept_request),
        )
        .route(
            "/users/:user_id/friend-requests/:request_id/reject",
            post(handlers::friends::reject_request),
        )
        // Notification routes
        .route(
            "/users/:user_id/notification-settings",
            get(handlers::notifications::get_settings).put(handlers::notifications::update_settings),
        )
        .route(
            "/users/:user_id/notification-settings/:flag/toggle",
            post(handlers::notifications::toggle_setting),
        )
        // Billing routes
        .route("/users/:user_id/entitlement", get(handlers::billing::get_entitlement))
        .route("/checkout", post(handlers::billing::premium_checkout))
        .route("/stripe/checkout", post(handlers::billing::subscription_checkout))
        .route("/webhooks/stripe", post(handlers::billing::stripe_webhook))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Start the API server and serve until `shutdown` resolves
pub async fn start_api_server(
    config: &ServerConfig,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(state, config.enable_cors);

    let addr = format!("{}:{}", config.host, config.port).parse::<SocketAddr>()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Starting API server on {}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    Ok(())
}
