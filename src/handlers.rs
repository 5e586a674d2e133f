// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the mention rate limiter service.
//!
//! The chat server (or a plugin shim inside it) posts every new message to
//! `/check` before publishing it and drops the message when the response
//! says `allowed: false`.

use crate::config::{Config, MentionLimitConfig};
use crate::limiter::{MentionLimiter, RateLimitDecision};
use crate::metrics::Metrics;
use crate::models::Post;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Shared application state.
pub struct AppState {
    pub limiter: MentionLimiter,
    pub metrics: Option<Metrics>,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Mention limit check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    /// The post to publish, unchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Post>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/check", post(check))
        .route("/config", get(get_config).put(put_config));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "mention-rate-limiter",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Check a new post against the channel-wide mention limit.
///
/// Always answers 200 so the caller can read the body; failed checks come
/// back as rejections.
pub async fn check(State(state): State<Arc<AppState>>, Json(post): Json<Post>) -> impl IntoResponse {
    debug!(
        post_id = %post.id,
        user_id = %post.user_id,
        channel_id = %post.channel_id,
        "Processing mention limit check"
    );

    let response = match state.limiter.check(&post).await {
        Ok(RateLimitDecision::Allowed) => CheckResponse {
            allowed: true,
            post: Some(post),
            reason: None,
            retry_after_secs: None,
        },
        Ok(RateLimitDecision::Blocked {
            reason,
            retry_after,
            ..
        }) => CheckResponse {
            allowed: false,
            post: None,
            reason: Some(reason),
            retry_after_secs: Some(retry_after.as_secs_f64().ceil() as u64),
        },
        Err(err) => CheckResponse {
            allowed: false,
            post: None,
            reason: Some(err.public_reason().to_string()),
            retry_after_secs: None,
        },
    };

    (StatusCode::OK, Json(response))
}

/// Current mention limit settings.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<MentionLimitConfig> {
    let snapshot = state.limiter.config().snapshot().await;
    Json(snapshot.as_ref().clone())
}

/// Replace the mention limit settings.
pub async fn put_config(
    State(state): State<Arc<AppState>>,
    Json(config): Json<MentionLimitConfig>,
) -> Json<MentionLimitConfig> {
    state.limiter.config().reload(config.clone()).await;
    Json(config)
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let Some(metrics) = &state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match metrics.render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
