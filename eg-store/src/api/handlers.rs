//! HTTP request handlers
//!
//! Implements the storefront endpoints: order capture, checkout flow,
//! waitlist signup, and gallery control.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use eg_common::catalog;
use eg_common::events::EgEvent;
use eg_common::order::{is_valid_email, OrderDraft, ProductType};

use crate::api::AppContext;
use crate::checkout::{self, CheckoutSummary, ConfirmationData, PromoOutcome, SubmitRedirect};
use crate::error::Error;
use crate::gallery::{sample_catalog, GalleryFilter};
use crate::notify;
use crate::payment::CheckoutSessionParams;
use crate::session::KEY_ORDER_DATA;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Serialize)]
pub struct ProductInfo {
    product_type: ProductType,
    name: &'static str,
    description: &'static str,
    amount_cents: u32,
    price_display: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    products: Vec<ProductInfo>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    status: String,
    next: String,
}

#[derive(Debug, Deserialize)]
pub struct PromoRequest {
    #[serde(default)]
    code: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    promo_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    status: String,
    mode: String,
    publishable_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checkout_params: Option<CheckoutSessionParams>,
}

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WaitlistRequest {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    filter: String,
}

#[derive(Debug, Serialize)]
pub struct GalleryCard {
    id: &'static str,
    title: &'static str,
    categories: &'static [&'static str],
    audio: &'static str,
    artwork: &'static str,
    visible: bool,
    playing: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryResponse {
    filter: String,
    now_playing: Option<String>,
    cards: Vec<GalleryCard>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResponse {
    now_playing: Option<String>,
    stopped: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArtworkResponse {
    artwork: &'static str,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: Error) -> HandlerError {
    let status = match &err {
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidState(_) => StatusCode::CONFLICT,
        Error::Provider(_) => StatusCode::BAD_GATEWAY,
        Error::Config(_) | Error::Notification(_) | Error::Io(_) | Error::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            next: None,
        }),
    )
}

/// Read the session id from the `x-session-id` header
fn session_id(headers: &HeaderMap) -> Result<Uuid, HandlerError> {
    headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| {
            error_response(Error::BadRequest(
                "Missing or invalid x-session-id header".to_string(),
            ))
        })
}

// ============================================================================
// Catalog and Order Capture
// ============================================================================

/// GET /catalog - Both products with formatted prices
pub async fn get_catalog() -> Json<CatalogResponse> {
    let products = [ProductType::Single, ProductType::Album]
        .into_iter()
        .map(|product_type| {
            let p = catalog::product(product_type);
            ProductInfo {
                product_type,
                name: p.name,
                description: p.description,
                amount_cents: p.amount_cents,
                price_display: catalog::format_usd(p.amount_cents),
            }
        })
        .collect();
    Json(CatalogResponse { products })
}

/// POST /order - Validate and store an order draft for checkout
pub async fn submit_order(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(draft): Json<OrderDraft>,
) -> Result<Json<OrderResponse>, HandlerError> {
    let sid = session_id(&headers)?;

    let order = draft
        .validate()
        .map_err(|e| error_response(Error::from(e)))?;

    ctx.state
        .sessions
        .put(sid, KEY_ORDER_DATA, &order)
        .await
        .map_err(error_response)?;

    info!(
        "Order captured: {} for {}",
        order.product_type, order.recipient_name
    );
    ctx.state.broadcast_event(EgEvent::OrderCaptured {
        product_type: order.product_type,
        recipient: order.recipient_name.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(OrderResponse {
        status: "ok".to_string(),
        next: "/checkout".to_string(),
    }))
}

// ============================================================================
// Checkout Flow
// ============================================================================

/// GET /checkout - Load the stored order and render the price summary
///
/// With no stored order the response carries `next: "/"`, sending the
/// customer back to the order form.
pub async fn get_checkout(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Json<CheckoutSummary>, HandlerError> {
    let sid = session_id(&headers)?;

    match checkout::load_summary(&ctx.state, sid).await {
        Ok(summary) => Ok(Json(summary)),
        Err(Error::NotFound(msg)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: msg,
                next: Some("/".to_string()),
            }),
        )),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /checkout/promo - Apply a promo code to the displayed totals
pub async fn apply_promo(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(req): Json<PromoRequest>,
) -> Result<Json<PromoOutcome>, HandlerError> {
    let sid = session_id(&headers)?;

    checkout::apply_promo(&ctx.state, sid, &req.code)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /checkout/submit - Fire the notification and build the payment
/// redirect
pub async fn submit_checkout(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Option<Json<SubmitRequest>>,
) -> Result<Json<SubmitResponse>, HandlerError> {
    let sid = session_id(&headers)?;
    let req = body.map(|Json(r)| r).unwrap_or_default();

    match checkout::submit(&ctx.state, sid, req.promo_code.as_deref()).await {
        Ok(SubmitRedirect::PaymentLink { url }) => Ok(Json(SubmitResponse {
            status: "redirect".to_string(),
            mode: "payment_link".to_string(),
            publishable_key: ctx.state.config.publishable_key.clone(),
            url: Some(url),
            checkout_params: None,
        })),
        Ok(SubmitRedirect::HostedCheckout { params }) => Ok(Json(SubmitResponse {
            status: "redirect".to_string(),
            mode: "hosted_checkout".to_string(),
            publishable_key: ctx.state.config.publishable_key.clone(),
            url: None,
            checkout_params: Some(params),
        })),
        Err(e) => {
            error!("Checkout failed: {}", e);
            Err(error_response(e))
        }
    }
}

/// GET /checkout/success - Payment confirmed by the provider redirect
pub async fn checkout_success(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(query): Query<SuccessQuery>,
) -> Result<Json<ConfirmationData>, HandlerError> {
    let sid = session_id(&headers)?;

    checkout::confirm_success(&ctx.state, sid, query.session_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /checkout/cancel - Provider cancel redirect, order retained
pub async fn checkout_cancel(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, HandlerError> {
    let sid = session_id(&headers)?;

    checkout::cancel(&ctx.state, sid)
        .await
        .map_err(error_response)?;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

// ============================================================================
// Vinyl Waitlist
// ============================================================================

/// POST /waitlist - Email-only signup relayed to the form endpoint
pub async fn join_waitlist(
    State(ctx): State<AppContext>,
    Json(req): Json<WaitlistRequest>,
) -> Result<Json<StatusResponse>, HandlerError> {
    let email = req.email.trim();
    if !is_valid_email(email) {
        return Err(error_response(Error::Validation(
            "Please enter a valid email address.".to_string(),
        )));
    }

    let payload = notify::waitlist_payload(email);
    ctx.state
        .notifier
        .send(&payload)
        .await
        .map_err(|e| {
            error!("Waitlist signup failed: {}", e);
            error_response(Error::Provider(
                "Could not join the waitlist right now. Please try again.".to_string(),
            ))
        })?;

    Ok(Json(StatusResponse {
        status: "Thank you! You've been added to our vinyl waitlist. \
                 We'll email you when vinyl records are available!"
            .to_string(),
    }))
}

// ============================================================================
// Gallery
// ============================================================================

async fn gallery_response(ctx: &AppContext) -> GalleryResponse {
    let gallery = ctx.state.gallery.read().await;
    let cards = sample_catalog()
        .iter()
        .map(|sample| GalleryCard {
            id: sample.id,
            title: sample.title,
            categories: sample.categories,
            audio: sample.audio,
            artwork: gallery.artwork_for(sample),
            visible: gallery.is_visible(sample),
            playing: gallery.now_playing() == Some(sample.id),
        })
        .collect();
    GalleryResponse {
        filter: gallery.filter().as_str().to_string(),
        now_playing: gallery.now_playing().map(str::to_string),
        cards,
    }
}

/// GET /gallery - All sample cards with visibility under the current filter
pub async fn get_gallery(State(ctx): State<AppContext>) -> Json<GalleryResponse> {
    Json(gallery_response(&ctx).await)
}

/// POST /gallery/filter - Select a category filter ("all" clears it)
pub async fn set_gallery_filter(
    State(ctx): State<AppContext>,
    Json(req): Json<FilterRequest>,
) -> Json<GalleryResponse> {
    let filter = GalleryFilter::parse(&req.filter);
    {
        let mut gallery = ctx.state.gallery.write().await;
        gallery.set_filter(filter.clone());
    }
    ctx.state.broadcast_event(EgEvent::GalleryFilterChanged {
        filter: filter.as_str().to_string(),
        timestamp: chrono::Utc::now(),
    });
    Json(gallery_response(&ctx).await)
}

/// POST /gallery/play/:sample_id - Toggle playback of a sample
pub async fn play_sample(
    State(ctx): State<AppContext>,
    Path(sample_id): Path<String>,
) -> Result<Json<PlayResponse>, HandlerError> {
    let outcome = {
        let mut gallery = ctx.state.gallery.write().await;
        gallery.play(&sample_id).map_err(error_response)?
    };

    if let Some(stopped) = &outcome.stopped {
        ctx.state.broadcast_event(EgEvent::PlaybackStopped {
            sample_id: stopped.clone(),
            timestamp: chrono::Utc::now(),
        });
    }
    if let Some(started) = &outcome.now_playing {
        ctx.state.broadcast_event(EgEvent::PlaybackStarted {
            sample_id: started.clone(),
            timestamp: chrono::Utc::now(),
        });
    }

    Ok(Json(PlayResponse {
        now_playing: outcome.now_playing,
        stopped: outcome.stopped,
    }))
}

/// POST /gallery/pause - Stop whatever is playing (page hidden)
pub async fn pause_gallery(State(ctx): State<AppContext>) -> Json<PlayResponse> {
    let stopped = {
        let mut gallery = ctx.state.gallery.write().await;
        gallery.pause_all()
    };
    if let Some(stopped) = &stopped {
        ctx.state.broadcast_event(EgEvent::PlaybackStopped {
            sample_id: stopped.clone(),
            timestamp: chrono::Utc::now(),
        });
    }
    Json(PlayResponse {
        now_playing: None,
        stopped,
    })
}

/// GET /gallery/now-playing - The sample currently playing, if any
pub async fn now_playing(State(ctx): State<AppContext>) -> Json<PlayResponse> {
    let gallery = ctx.state.gallery.read().await;
    Json(PlayResponse {
        now_playing: gallery.now_playing().map(str::to_string),
        stopped: None,
    })
}

/// POST /gallery/artwork-error/:sample_id - Artwork failed to load,
/// degrade to the fallback asset
pub async fn artwork_error(
    State(ctx): State<AppContext>,
    Path(sample_id): Path<String>,
) -> Result<Json<ArtworkResponse>, HandlerError> {
    let sample = crate::gallery::find_sample(&sample_id).ok_or_else(|| {
        error_response(Error::NotFound(format!("Unknown sample: {}", sample_id)))
    })?;

    let mut gallery = ctx.state.gallery.write().await;
    gallery.mark_artwork_failed(&sample_id);
    Ok(Json(ArtworkResponse {
        artwork: gallery.artwork_for(sample),
    }))
}
