//! Checkout orchestration
//!
//! Drives a stored order through the hosted payment flow. Each session
//! moves through the phases Loading -> AwaitingSubmit -> Submitting ->
//! Success, with Failed returning the session to a resubmittable state.
//!
//! The order notification relay is always attempted before the payment
//! redirect is built, and its outcome never affects checkout.

use std::sync::Arc;
use uuid::Uuid;

use eg_common::catalog;
use eg_common::events::{EgEvent, RedirectMode};
use eg_common::order::{order_reference, Order};

use crate::error::{Error, Result};
use crate::notify;
use crate::payment::{self, CheckoutSessionParams};
use crate::session::{KEY_CONFIRMATION, KEY_ORDER_DATA, KEY_PENDING_ORDER};
use crate::state::SharedState;

pub use eg_common::events::CheckoutPhase;

/// Order held while the customer is away at the payment provider
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PendingCheckout {
    pub order: Order,
    pub reference: String,
}

/// Post-payment confirmation bookkeeping
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationData {
    pub reference: String,
    pub product_name: String,
    pub amount_display: String,
    pub email: String,
    pub estimated_delivery: String,
    pub provider_session_id: Option<String>,
}

/// Price lines for the order summary
#[derive(Debug, Clone, serde::Serialize)]
pub struct PriceLines {
    pub subtotal_display: String,
    /// Discount row, present only while the recognized promo is applied
    pub discount_display: Option<String>,
    pub total_display: String,
}

/// Everything the checkout summary renders
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub phase: CheckoutPhase,
    pub product_name: String,
    pub product_description: String,
    pub price_display: String,
    pub prices: PriceLines,
    pub recipient: String,
    pub occasion: String,
    pub genre: String,
    pub tone: String,
    pub email: String,
    pub promo_code: Option<String>,
}

/// How the customer reaches the payment provider
#[derive(Debug, Clone)]
pub enum SubmitRedirect {
    /// Redirect to a pre-built hosted payment link
    PaymentLink { url: String },
    /// Invoke the provider's client-side checkout with these parameters
    HostedCheckout { params: CheckoutSessionParams },
}

fn price_lines(order: &Order, config: &crate::config::Config) -> PriceLines {
    let product = catalog::product(order.product_type);
    let subtotal = product.amount_cents;
    let promo_applied = order
        .promo_code
        .as_deref()
        .is_some_and(|code| code == config.promo_code);

    if promo_applied {
        let off = catalog::discount_cents(subtotal, config.promo_discount_percent);
        PriceLines {
            subtotal_display: catalog::format_usd(subtotal),
            discount_display: Some(format!("-{}", catalog::format_usd(off))),
            total_display: catalog::format_usd(subtotal - off),
        }
    } else {
        PriceLines {
            subtotal_display: catalog::format_usd(subtotal),
            discount_display: None,
            total_display: catalog::format_usd(subtotal),
        }
    }
}

/// Load the stored order and build the checkout summary
///
/// A session with no stored order gets `NotFound`, which the API layer
/// turns into a redirect back to the order form.
pub async fn load_summary(state: &SharedState, session_id: Uuid) -> Result<CheckoutSummary> {
    let order: Order = state
        .sessions
        .get(session_id, KEY_ORDER_DATA)
        .await
        .ok_or_else(|| Error::NotFound("No pending order for this session".to_string()))?;

    state
        .set_checkout_phase(session_id, CheckoutPhase::AwaitingSubmit)
        .await;

    let product = catalog::product(order.product_type);
    Ok(CheckoutSummary {
        phase: CheckoutPhase::AwaitingSubmit,
        product_name: product.name.to_string(),
        product_description: product.description.to_string(),
        price_display: catalog::format_usd(product.amount_cents),
        prices: price_lines(&order, &state.config),
        recipient: order.recipient_name.clone(),
        occasion: order.occasion.clone(),
        genre: order.genre.clone(),
        tone: order.tone.clone(),
        email: order.email.clone(),
        promo_code: order.promo_code.clone(),
    })
}

/// Result of applying a promo code to the summary
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoOutcome {
    pub accepted: bool,
    pub message: String,
    pub prices: PriceLines,
}

/// Apply a promo code to the stored order
///
/// Only the one recognized code is honored; it changes the displayed
/// totals and is recorded on the order so the notification and the
/// payment-link variant can carry it. Anything else clears a previously
/// applied code and restores the displayed total.
pub async fn apply_promo(
    state: &SharedState,
    session_id: Uuid,
    raw_code: &str,
) -> Result<PromoOutcome> {
    let mut order: Order = state
        .sessions
        .get(session_id, KEY_ORDER_DATA)
        .await
        .ok_or_else(|| Error::NotFound("No pending order for this session".to_string()))?;

    let code = raw_code.trim().to_uppercase();

    if code.is_empty() {
        return Ok(PromoOutcome {
            accepted: false,
            message: "Please enter a promo code".to_string(),
            prices: price_lines(&order, &state.config),
        });
    }

    if code == state.config.promo_code {
        order.promo_code = Some(code.clone());
        state
            .sessions
            .put(session_id, KEY_ORDER_DATA, &order)
            .await?;
        state.broadcast_event(EgEvent::PromoApplied {
            code,
            discount_percent: state.config.promo_discount_percent,
            timestamp: chrono::Utc::now(),
        });
        Ok(PromoOutcome {
            accepted: true,
            message: "\u{2713} Promo code accepted! Your discount will be automatically applied after checkout."
                .to_string(),
            prices: price_lines(&order, &state.config),
        })
    } else {
        order.promo_code = None;
        state
            .sessions
            .put(session_id, KEY_ORDER_DATA, &order)
            .await?;
        state.broadcast_event(EgEvent::PromoRejected {
            code,
            timestamp: chrono::Utc::now(),
        });
        Ok(PromoOutcome {
            accepted: false,
            message: "Invalid promo code".to_string(),
            prices: price_lines(&order, &state.config),
        })
    }
}

/// Submit the checkout: fire the notification, then build the payment
/// redirect
///
/// Rejected while a submit for the session is already in flight. Any
/// failure after that moves the session to Failed, from which the next
/// submit is allowed again.
pub async fn submit(
    state: &Arc<SharedState>,
    session_id: Uuid,
    promo_code: Option<&str>,
) -> Result<SubmitRedirect> {
    let mut order: Order = state
        .sessions
        .get(session_id, KEY_ORDER_DATA)
        .await
        .ok_or_else(|| Error::NotFound("No pending order for this session".to_string()))?;

    if !state.try_begin_submit(session_id).await {
        return Err(Error::InvalidState(
            "Checkout is already in progress".to_string(),
        ));
    }

    // A code typed into the promo field at submit time takes effect here,
    // even if the apply button was never pressed
    if let Some(code) = promo_code {
        let code = code.trim().to_uppercase();
        if !code.is_empty() {
            order.promo_code = Some(code);
        }
    }

    let reference = order_reference();

    // Best effort, never blocks checkout: the notification is attempted
    // before the payment redirect is built, and its outcome is ignored
    spawn_order_notification(Arc::clone(state), order.clone(), reference.clone());

    match build_redirect(state, session_id, &order, &reference).await {
        Ok(redirect) => Ok(redirect),
        Err(e) => {
            state
                .set_checkout_phase(session_id, CheckoutPhase::Failed)
                .await;
            Err(e)
        }
    }
}

async fn build_redirect(
    state: &Arc<SharedState>,
    session_id: Uuid,
    order: &Order,
    reference: &str,
) -> Result<SubmitRedirect> {
    let config = &state.config;
    let pending = PendingCheckout {
        order: order.clone(),
        reference: reference.to_string(),
    };

    // Payment links support promo codes natively; prefer them when
    // configured
    if config.use_payment_links {
        if let Some(link) = payment::payment_link(config, order.product_type) {
            let url = payment::build_payment_link_url(
                link,
                &order.email,
                reference,
                order.promo_code.as_deref(),
            )?;
            state
                .sessions
                .put(session_id, KEY_PENDING_ORDER, &pending)
                .await?;
            state.broadcast_event(EgEvent::PaymentRedirectIssued {
                mode: RedirectMode::PaymentLink,
                timestamp: chrono::Utc::now(),
            });
            return Ok(SubmitRedirect::PaymentLink {
                url: url.to_string(),
            });
        }
    }

    // The client-side checkout cannot apply promo codes; an unrecognized
    // code stops the submit instead of silently charging full price
    if let Some(code) = order.promo_code.as_deref() {
        if code != config.promo_code {
            return Err(Error::Provider(
                "This promo code is not recognized. Please check the code and try again."
                    .to_string(),
            ));
        }
        tracing::info!("Promo code {} will be processed after payment", code);
    }

    let params = payment::build_checkout_params(config, order.product_type, &order.email)?;
    state
        .sessions
        .put(session_id, KEY_PENDING_ORDER, &pending)
        .await?;
    state.broadcast_event(EgEvent::PaymentRedirectIssued {
        mode: RedirectMode::HostedCheckout,
        timestamp: chrono::Utc::now(),
    });
    Ok(SubmitRedirect::HostedCheckout { params })
}

fn spawn_order_notification(state: Arc<SharedState>, order: Order, reference: String) {
    tokio::spawn(async move {
        let payload = notify::order_payload(&order, &reference, &state.config.promo_code);
        let delivered = match state.notifier.send(&payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to send order notification: {}", e);
                false
            }
        };
        state.broadcast_event(EgEvent::OrderNotification {
            delivered,
            timestamp: chrono::Utc::now(),
        });
    });
}

/// Payment confirmed: clear the order and record the confirmation
pub async fn confirm_success(
    state: &SharedState,
    session_id: Uuid,
    provider_session_id: Option<String>,
) -> Result<ConfirmationData> {
    let pending: Option<PendingCheckout> =
        state.sessions.take(session_id, KEY_PENDING_ORDER).await;

    let confirmation = match pending {
        Some(pending) => {
            let product = catalog::product(pending.order.product_type);
            let delivery = chrono::Utc::now() + chrono::Duration::days(5);
            let confirmation = ConfirmationData {
                reference: pending.reference,
                product_name: product.name.to_string(),
                amount_display: catalog::format_usd(product.amount_cents),
                email: pending.order.email.clone(),
                estimated_delivery: delivery.format("%A, %B %-d, %Y").to_string(),
                provider_session_id,
            };
            state.sessions.remove(session_id, KEY_ORDER_DATA).await;
            state
                .sessions
                .put(session_id, KEY_CONFIRMATION, &confirmation)
                .await?;
            confirmation
        }
        // Reloading the success page after confirmation
        None => state
            .sessions
            .get(session_id, KEY_CONFIRMATION)
            .await
            .ok_or_else(|| Error::NotFound("No completed order for this session".to_string()))?,
    };

    state
        .set_checkout_phase(session_id, CheckoutPhase::Success)
        .await;
    Ok(confirmation)
}

/// Payment canceled: keep the order so the summary re-renders on return
pub async fn cancel(state: &SharedState, session_id: Uuid) -> Result<()> {
    if let Some(pending) = state
        .sessions
        .take::<PendingCheckout>(session_id, KEY_PENDING_ORDER)
        .await
    {
        let stored: Option<Order> = state.sessions.get(session_id, KEY_ORDER_DATA).await;
        if stored.is_none() {
            state
                .sessions
                .put(session_id, KEY_ORDER_DATA, &pending.order)
                .await?;
        }
    }
    state
        .set_checkout_phase(session_id, CheckoutPhase::AwaitingSubmit)
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use eg_common::order::OrderDraft;

    /// Relay endpoint nothing listens on, so spawned notification
    /// attempts fail fast instead of reaching the real relay
    fn test_config() -> Config {
        let mut config = Config::default();
        config.notify_endpoint = "http://127.0.0.1:9/relay".to_string();
        config
    }

    fn test_order() -> Order {
        OrderDraft {
            product_type: "single".to_string(),
            recipient_name: "Alex".to_string(),
            occasion: "Birthday".to_string(),
            story_themes: "Road trips".to_string(),
            genre: "Pop".to_string(),
            tone: "Happy".to_string(),
            language_preference: "english".to_string(),
            email: "a@b.com".to_string(),
            terms_accepted: true,
            ..Default::default()
        }
        .validate()
        .unwrap()
    }

    async fn state_with_order(config: Config) -> (Arc<SharedState>, Uuid) {
        let state = Arc::new(SharedState::new(config));
        let sid = Uuid::new_v4();
        state
            .sessions
            .put(sid, KEY_ORDER_DATA, &test_order())
            .await
            .unwrap();
        (state, sid)
    }

    #[tokio::test]
    async fn summary_renders_price_and_recipient() {
        let (state, sid) = state_with_order(test_config()).await;
        let summary = load_summary(&state, sid).await.unwrap();

        assert_eq!(summary.product_name, "Personalized Song");
        assert_eq!(summary.price_display, "$79.00");
        assert_eq!(summary.prices.total_display, "$79.00");
        assert!(summary.prices.discount_display.is_none());
        assert_eq!(summary.recipient, "Alex");
        assert_eq!(summary.phase, CheckoutPhase::AwaitingSubmit);
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let state = SharedState::new(test_config());
        let err = load_summary(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn recognized_promo_changes_displayed_total_only() {
        let (state, sid) = state_with_order(test_config()).await;

        let outcome = apply_promo(&state, sid, "elyson").await.unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.prices.discount_display.as_deref(), Some("-$15.80"));
        assert_eq!(outcome.prices.total_display, "$63.20");

        // The code is recorded on the stored order
        let order: Order = state.sessions.get(sid, KEY_ORDER_DATA).await.unwrap();
        assert_eq!(order.promo_code.as_deref(), Some("ELYSON"));
    }

    #[tokio::test]
    async fn unrecognized_promo_restores_the_total() {
        let (state, sid) = state_with_order(test_config()).await;
        apply_promo(&state, sid, "ELYSON").await.unwrap();

        let outcome = apply_promo(&state, sid, "NOTACODE").await.unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.message, "Invalid promo code");
        assert!(outcome.prices.discount_display.is_none());
        assert_eq!(outcome.prices.total_display, "$79.00");
    }

    #[tokio::test]
    async fn empty_promo_prompts_for_a_code() {
        let (state, sid) = state_with_order(test_config()).await;
        let outcome = apply_promo(&state, sid, "   ").await.unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.message, "Please enter a promo code");
    }

    #[tokio::test]
    async fn submit_builds_hosted_checkout_params() {
        let (state, sid) = state_with_order(test_config()).await;

        match submit(&state, sid, None).await.unwrap() {
            SubmitRedirect::HostedCheckout { params } => {
                assert_eq!(params.mode, "payment");
                assert_eq!(params.customer_email, "a@b.com");
            }
            other => panic!("Expected hosted checkout, got {:?}", other),
        }
        assert_eq!(state.checkout_phase(sid).await, CheckoutPhase::Submitting);
    }

    #[tokio::test]
    async fn resubmission_is_rejected_while_submitting() {
        let (state, sid) = state_with_order(test_config()).await;
        submit(&state, sid, None).await.unwrap();

        let err = submit(&state, sid, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn unrecognized_promo_fails_the_submit() {
        let (state, sid) = state_with_order(test_config()).await;

        let err = submit(&state, sid, Some("BOGUS")).await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert!(err.to_string().contains("not recognized"));
        assert_eq!(state.checkout_phase(sid).await, CheckoutPhase::Failed);

        // Failed re-enables submission; without the bad code it goes through
        assert!(submit(&state, sid, None).await.is_ok());
    }

    #[tokio::test]
    async fn placeholder_price_id_is_a_config_error() {
        let mut config = test_config();
        config.price_id_single = "price_1234567890".to_string();
        let (state, sid) = state_with_order(config).await;

        let err = submit(&state, sid, None).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(state.checkout_phase(sid).await, CheckoutPhase::Failed);
    }

    #[tokio::test]
    async fn payment_link_variant_redirects_with_prefill() {
        let mut config = test_config();
        config.use_payment_links = true;
        config.payment_link_single = "https://buy.example/live_single".to_string();
        let (state, sid) = state_with_order(config).await;
        apply_promo(&state, sid, "ELYSON").await.unwrap();

        match submit(&state, sid, None).await.unwrap() {
            SubmitRedirect::PaymentLink { url } => {
                assert!(url.starts_with("https://buy.example/live_single?"));
                assert!(url.contains("prefilled_email=a%40b.com"));
                assert!(url.contains("client_reference_id=EG-"));
                assert!(url.contains("prefilled_promo_code=ELYSON"));
            }
            other => panic!("Expected payment link, got {:?}", other),
        }

        // The order is parked for the provider round trip
        let pending: Option<PendingCheckout> =
            state.sessions.get(sid, KEY_PENDING_ORDER).await;
        assert!(pending.is_some());
    }

    #[tokio::test]
    async fn success_clears_the_order_and_records_confirmation() {
        let (state, sid) = state_with_order(test_config()).await;
        submit(&state, sid, None).await.unwrap();

        let confirmation = confirm_success(&state, sid, Some("cs_test_123".to_string()))
            .await
            .unwrap();
        assert_eq!(confirmation.product_name, "Personalized Song");
        assert_eq!(confirmation.amount_display, "$79.00");
        assert!(confirmation.reference.starts_with("EG-"));
        assert_eq!(state.checkout_phase(sid).await, CheckoutPhase::Success);

        // Order data is gone; the summary can no longer load
        assert!(load_summary(&state, sid).await.is_err());

        // Reloading the success page finds the stored confirmation
        let again = confirm_success(&state, sid, None).await.unwrap();
        assert_eq!(again.reference, confirmation.reference);
    }

    #[tokio::test]
    async fn cancel_restores_the_order_for_resubmission() {
        let mut config = test_config();
        config.use_payment_links = true;
        config.payment_link_single = "https://buy.example/live_single".to_string();
        let (state, sid) = state_with_order(config).await;
        submit(&state, sid, None).await.unwrap();

        cancel(&state, sid).await.unwrap();
        assert_eq!(
            state.checkout_phase(sid).await,
            CheckoutPhase::AwaitingSubmit
        );
        let summary = load_summary(&state, sid).await.unwrap();
        assert_eq!(summary.recipient, "Alex");

        // And the resubmission goes through
        assert!(submit(&state, sid, None).await.is_ok());
    }
}
