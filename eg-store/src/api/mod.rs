//! REST API implementation for the storefront
//!
//! One router serves the order form, the checkout flow, the gallery, and
//! the SSE event stream. Sessions are addressed by an `x-session-id`
//! header carrying a UUID the client picks for its tab.

pub mod handlers;
pub mod sse;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::state::SharedState;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))

        // API v1 routes
        .nest("/api/v1", Router::new()
            // Catalog and order capture
            .route("/catalog", get(handlers::get_catalog))
            .route("/order", post(handlers::submit_order))

            // Checkout flow
            .route("/checkout", get(handlers::get_checkout))
            .route("/checkout/promo", post(handlers::apply_promo))
            .route("/checkout/submit", post(handlers::submit_checkout))
            .route("/checkout/success", get(handlers::checkout_success))
            .route("/checkout/cancel", get(handlers::checkout_cancel))

            // Vinyl waitlist
            .route("/waitlist", post(handlers::join_waitlist))

            // Gallery
            .route("/gallery", get(handlers::get_gallery))
            .route("/gallery/filter", post(handlers::set_gallery_filter))
            .route("/gallery/play/:sample_id", post(handlers::play_sample))
            .route("/gallery/pause", post(handlers::pause_gallery))
            .route("/gallery/now-playing", get(handlers::now_playing))
            .route("/gallery/artwork-error/:sample_id", post(handlers::artwork_error))

            // SSE events
            .route("/events", get(sse::event_stream))
        )
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Health check endpoint
async fn health_check(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "eg-store",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": ctx.state.sessions.session_count().await,
    }))
}
