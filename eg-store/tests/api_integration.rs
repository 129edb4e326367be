//! Integration tests for the storefront API
//!
//! Tests the complete surface including:
//! - Order capture and validation
//! - Checkout flow and promo codes
//! - Payment redirect variants
//! - Success/cancel bookkeeping

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use eg_store::api::{create_router, AppContext};
use eg_store::config::Config;
use eg_store::SharedState;

/// Relay endpoint nothing listens on, so notification attempts fail fast
fn test_config() -> Config {
    let mut config = Config::default();
    config.notify_endpoint = "http://127.0.0.1:9/relay".to_string();
    config
}

fn setup_test_server(config: Config) -> axum::Router {
    let state = Arc::new(SharedState::new(config));
    create_router(AppContext { state })
}

/// Helper function to make HTTP requests to the test server
async fn make_request(
    app: &axum::Router,
    method: &str,
    path: &str,
    session: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    use axum::body::Body;
    use http::{Method, Request};
    use tower::ServiceExt;

    let method = match method {
        "GET" => Method::GET,
        "POST" => Method::POST,
        _ => panic!("Unsupported method"),
    };

    let mut request = Request::builder().method(method).uri(path);
    if let Some(session_id) = session {
        request = request.header("x-session-id", session_id.to_string());
    }

    let request = if let Some(json_body) = body {
        request
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap()
    } else {
        request.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_body = if !body.is_empty() {
        Some(serde_json::from_slice(&body).unwrap())
    } else {
        None
    };

    (status, json_body)
}

fn order_body() -> Value {
    json!({
        "productType": "single",
        "recipientName": "Alex",
        "occasion": "Birthday",
        "storyThemes": "Twenty years of road trips",
        "genre": "Pop",
        "tone": "Happy",
        "languagePreference": "english",
        "email": "a@b.com",
        "termsAccepted": true
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_server(test_config());

    let (status, body) = make_request(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.expect("Expected response body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "eg-store");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_catalog_prices() {
    let app = setup_test_server(test_config());

    let (status, body) = make_request(&app, "GET", "/api/v1/catalog", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let products = body.unwrap()["products"].as_array().unwrap().clone();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["product_type"], "single");
    assert_eq!(products[0]["price_display"], "$79.00");
    assert_eq!(products[1]["product_type"], "album");
    assert_eq!(products[1]["price_display"], "$299.00");
}

#[tokio::test]
async fn test_order_requires_session_header() {
    let app = setup_test_server(test_config());

    let (status, _) = make_request(&app, "POST", "/api/v1/order", None, Some(order_body())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_field_blocks_submission_and_stores_nothing() {
    let app = setup_test_server(test_config());
    let sid = Uuid::new_v4();

    let mut body = order_body();
    body["occasion"] = json!("   ");
    let (status, response) =
        make_request(&app, "POST", "/api/v1/order", Some(sid), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.unwrap()["error"]
        .as_str()
        .unwrap()
        .contains("occasion"));

    // Nothing was stored: checkout redirects back to the order form
    let (status, response) = make_request(&app, "GET", "/api/v1/checkout", Some(sid), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response.unwrap()["next"], "/");
}

#[tokio::test]
async fn test_invalid_email_blocks_submission() {
    let app = setup_test_server(test_config());
    let sid = Uuid::new_v4();

    let mut body = order_body();
    body["email"] = json!("not-an-email");
    let (status, response) =
        make_request(&app, "POST", "/api/v1/order", Some(sid), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.unwrap()["error"]
        .as_str()
        .unwrap()
        .contains("valid email"));
}

#[tokio::test]
async fn test_terms_must_be_accepted() {
    let app = setup_test_server(test_config());
    let sid = Uuid::new_v4();

    let mut body = order_body();
    body["termsAccepted"] = json!(false);
    let (status, _) = make_request(&app, "POST", "/api/v1/order", Some(sid), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_order_to_checkout_happy_path() {
    let app = setup_test_server(test_config());
    let sid = Uuid::new_v4();

    let (status, response) =
        make_request(&app, "POST", "/api/v1/order", Some(sid), Some(order_body())).await;
    assert_eq!(status, StatusCode::OK);
    let response = response.unwrap();
    assert_eq!(response["status"], "ok");
    assert_eq!(response["next"], "/checkout");

    let (status, summary) = make_request(&app, "GET", "/api/v1/checkout", Some(sid), None).await;
    assert_eq!(status, StatusCode::OK);
    let summary = summary.unwrap();
    assert_eq!(summary["productName"], "Personalized Song");
    assert_eq!(summary["priceDisplay"], "$79.00");
    assert_eq!(summary["prices"]["total_display"], "$79.00");
    assert_eq!(summary["recipient"], "Alex");
    assert_eq!(summary["email"], "a@b.com");
    assert_eq!(summary["phase"], "awaitingsubmit");
}

#[tokio::test]
async fn test_album_checkout_price() {
    let app = setup_test_server(test_config());
    let sid = Uuid::new_v4();

    let mut body = order_body();
    body["productType"] = json!("album");
    body["albumSongs"] = json!([
        {"title": "Our First Dance", "story": "", "language": "english"},
        {"title": "", "story": "", "language": ""}
    ]);
    let (status, _) = make_request(&app, "POST", "/api/v1/order", Some(sid), Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, summary) = make_request(&app, "GET", "/api/v1/checkout", Some(sid), None).await;
    assert_eq!(status, StatusCode::OK);
    let summary = summary.unwrap();
    assert_eq!(summary["productName"], "Custom Song Album");
    assert_eq!(summary["priceDisplay"], "$299.00");
}

#[tokio::test]
async fn test_promo_code_accept_and_reject() {
    let app = setup_test_server(test_config());
    let sid = Uuid::new_v4();
    make_request(&app, "POST", "/api/v1/order", Some(sid), Some(order_body())).await;

    // The recognized literal changes the displayed discount
    let (status, outcome) = make_request(
        &app,
        "POST",
        "/api/v1/checkout/promo",
        Some(sid),
        Some(json!({"code": "elyson"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let outcome = outcome.unwrap();
    assert_eq!(outcome["accepted"], true);
    assert_eq!(outcome["prices"]["discount_display"], "-$15.80");
    assert_eq!(outcome["prices"]["total_display"], "$63.20");

    // Any other non-empty value shows an invalid-code message and leaves
    // the displayed total unchanged
    let (status, outcome) = make_request(
        &app,
        "POST",
        "/api/v1/checkout/promo",
        Some(sid),
        Some(json!({"code": "SOMETHINGELSE"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let outcome = outcome.unwrap();
    assert_eq!(outcome["accepted"], false);
    assert_eq!(outcome["message"], "Invalid promo code");
    assert!(outcome["prices"]["discount_display"].is_null());
    assert_eq!(outcome["prices"]["total_display"], "$79.00");

    // Empty code prompts for one
    let (status, outcome) = make_request(
        &app,
        "POST",
        "/api/v1/checkout/promo",
        Some(sid),
        Some(json!({"code": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome.unwrap()["message"], "Please enter a promo code");
}

#[tokio::test]
async fn test_submit_returns_hosted_checkout_params() {
    let app = setup_test_server(test_config());
    let sid = Uuid::new_v4();
    make_request(&app, "POST", "/api/v1/order", Some(sid), Some(order_body())).await;

    let (status, response) =
        make_request(&app, "POST", "/api/v1/checkout/submit", Some(sid), None).await;
    assert_eq!(status, StatusCode::OK);
    let response = response.unwrap();
    assert_eq!(response["status"], "redirect");
    assert_eq!(response["mode"], "hosted_checkout");
    assert!(response["publishableKey"].as_str().unwrap().starts_with("pk_"));
    let params = &response["checkoutParams"];
    assert_eq!(params["mode"], "payment");
    assert_eq!(params["lineItems"][0]["quantity"], 1);
    assert_eq!(params["customerEmail"], "a@b.com");
    assert!(params["successUrl"]
        .as_str()
        .unwrap()
        .contains("{CHECKOUT_SESSION_ID}"));

    // Resubmission is rejected while the submit is in flight
    let (status, _) =
        make_request(&app, "POST", "/api/v1/checkout/submit", Some(sid), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unrecognized_promo_fails_submit() {
    let app = setup_test_server(test_config());
    let sid = Uuid::new_v4();
    make_request(&app, "POST", "/api/v1/order", Some(sid), Some(order_body())).await;

    let (status, response) = make_request(
        &app,
        "POST",
        "/api/v1/checkout/submit",
        Some(sid),
        Some(json!({"promoCode": "BOGUS"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(response.unwrap()["error"]
        .as_str()
        .unwrap()
        .contains("not recognized"));

    // The failure re-enables submission
    let (status, _) =
        make_request(&app, "POST", "/api/v1/checkout/submit", Some(sid), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_placeholder_price_id_surfaces_config_error() {
    let mut config = test_config();
    config.price_id_single = "price_1234567890".to_string();
    let app = setup_test_server(config);
    let sid = Uuid::new_v4();
    make_request(&app, "POST", "/api/v1/order", Some(sid), Some(order_body())).await;

    let (status, response) =
        make_request(&app, "POST", "/api/v1/checkout/submit", Some(sid), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.unwrap()["error"]
        .as_str()
        .unwrap()
        .contains("price IDs not configured"));
}

#[tokio::test]
async fn test_payment_link_variant_builds_prefilled_url() {
    let mut config = test_config();
    config.use_payment_links = true;
    config.payment_link_single = "https://buy.example/live_single".to_string();
    let app = setup_test_server(config);
    let sid = Uuid::new_v4();
    make_request(&app, "POST", "/api/v1/order", Some(sid), Some(order_body())).await;
    make_request(
        &app,
        "POST",
        "/api/v1/checkout/promo",
        Some(sid),
        Some(json!({"code": "ELYSON"})),
    )
    .await;

    let (status, response) =
        make_request(&app, "POST", "/api/v1/checkout/submit", Some(sid), None).await;
    assert_eq!(status, StatusCode::OK);
    let response = response.unwrap();
    assert_eq!(response["mode"], "payment_link");
    let url = response["url"].as_str().unwrap();
    assert!(url.starts_with("https://buy.example/live_single?"));
    assert!(url.contains("prefilled_email=a%40b.com"));
    assert!(url.contains("client_reference_id=EG-"));
    assert!(url.contains("prefilled_promo_code=ELYSON"));
}

#[tokio::test]
async fn test_success_clears_order_and_cancel_keeps_it() {
    let app = setup_test_server(test_config());
    let sid = Uuid::new_v4();
    make_request(&app, "POST", "/api/v1/order", Some(sid), Some(order_body())).await;
    make_request(&app, "POST", "/api/v1/checkout/submit", Some(sid), None).await;

    // Cancel: the order survives for another attempt
    let (status, _) = make_request(&app, "GET", "/api/v1/checkout/cancel", Some(sid), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = make_request(&app, "GET", "/api/v1/checkout", Some(sid), None).await;
    assert_eq!(status, StatusCode::OK);

    // Submit again and confirm
    let (status, _) =
        make_request(&app, "POST", "/api/v1/checkout/submit", Some(sid), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, confirmation) = make_request(
        &app,
        "GET",
        "/api/v1/checkout/success?session_id=cs_test_123",
        Some(sid),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let confirmation = confirmation.unwrap();
    assert_eq!(confirmation["productName"], "Personalized Song");
    assert_eq!(confirmation["amountDisplay"], "$79.00");
    assert!(confirmation["reference"].as_str().unwrap().starts_with("EG-"));
    assert_eq!(confirmation["providerSessionId"], "cs_test_123");

    // The order record is discarded on confirmation
    let (status, response) = make_request(&app, "GET", "/api/v1/checkout", Some(sid), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response.unwrap()["next"], "/");
}

#[tokio::test]
async fn test_checkout_with_no_order_redirects_back() {
    let app = setup_test_server(test_config());

    let (status, response) =
        make_request(&app, "GET", "/api/v1/checkout", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response.unwrap()["next"], "/");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = setup_test_server(test_config());
    let sid = Uuid::new_v4();
    make_request(&app, "POST", "/api/v1/order", Some(sid), Some(order_body())).await;

    let (status, _) =
        make_request(&app, "GET", "/api/v1/checkout", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_waitlist_rejects_invalid_email() {
    let app = setup_test_server(test_config());

    let (status, response) = make_request(
        &app,
        "POST",
        "/api/v1/waitlist",
        None,
        Some(json!({"email": "not an email"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.unwrap()["error"]
        .as_str()
        .unwrap()
        .contains("valid email"));
}

#[tokio::test]
async fn test_waitlist_surfaces_relay_failure() {
    // The test relay endpoint is unreachable, so a valid signup fails
    let app = setup_test_server(test_config());

    let (status, _) = make_request(
        &app,
        "POST",
        "/api/v1/waitlist",
        None,
        Some(json!({"email": "fan@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
