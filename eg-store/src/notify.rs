//! Order notification relay
//!
//! Before the customer is handed to the payment provider, the order
//! details are POSTed to a backend-less form-relay endpoint as a JSON body
//! of labeled fields. This is the only record of a completed order, and it
//! is strictly best effort: a failure is logged and broadcast, never shown
//! to the customer, and never blocks checkout.

use serde_json::{Map, Value};
use std::time::Duration;

use eg_common::catalog;
use eg_common::order::{Order, ProductType};

use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the form-relay notification endpoint
pub struct OrderNotifier {
    http_client: reqwest::Client,
    endpoint: String,
}

impl OrderNotifier {
    pub fn new(endpoint: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// POST a payload to the relay endpoint; any non-2xx is a failure
    pub async fn send(&self, payload: &Map<String, Value>) -> Result<()> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::Notification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Notification(format!(
                "Relay returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Build the labeled order-notification payload
///
/// Field labels are what the relay renders into the notification email,
/// so they stay human-readable rather than machine-keyed.
pub fn order_payload(order: &Order, order_id: &str, recognized_promo: &str) -> Map<String, Value> {
    let promo_suffix = match &order.promo_code {
        Some(code) => format!(" - PROMO: {}", code),
        None => String::new(),
    };

    let mut payload = Map::new();
    payload.insert(
        "_subject".to_string(),
        Value::String(format!(
            "\u{1F3B5} NEW SONG ORDER - {} ({}){}",
            order.recipient_name, order.occasion, promo_suffix
        )),
    );
    payload.insert("_template".to_string(), Value::String("box".to_string()));

    // Order summary
    payload.insert(
        "Order Type".to_string(),
        Value::String(catalog::order_type_label(order.product_type)),
    );
    payload.insert(
        "Customer Email".to_string(),
        Value::String(order.email.clone()),
    );
    payload.insert(
        "Order Date".to_string(),
        Value::String(chrono::Utc::now().format("%B %-d, %Y").to_string()),
    );

    // Song details
    payload.insert(
        "Recipient Name".to_string(),
        Value::String(order.recipient_name.clone()),
    );
    payload.insert("Occasion".to_string(), Value::String(order.occasion.clone()));
    payload.insert("Genre".to_string(), Value::String(order.genre.clone()));
    payload.insert("Tone".to_string(), Value::String(order.tone.clone()));
    payload.insert(
        "Delivery Method".to_string(),
        Value::String(order.delivery.clone()),
    );

    // Customer story
    payload.insert(
        "Story & Themes".to_string(),
        Value::String(order.story_themes.clone()),
    );
    payload.insert(
        "Artwork Inspiration".to_string(),
        Value::String(if order.artwork_inspiration.is_empty() {
            "None provided".to_string()
        } else {
            order.artwork_inspiration.clone()
        }),
    );

    // Per-song rows for albums
    if order.product_type == ProductType::Album {
        for song in &order.album_songs {
            payload.insert(
                format!("Song {} Title", song.number),
                Value::String(if song.title.is_empty() {
                    "No title provided".to_string()
                } else {
                    song.title.clone()
                }),
            );
            payload.insert(
                format!("Song {} Story", song.number),
                Value::String(if song.story.is_empty() {
                    "No story provided".to_string()
                } else {
                    song.story.clone()
                }),
            );
            payload.insert(
                format!("Song {} Language", song.number),
                Value::String(if song.language.is_empty() {
                    "Not specified".to_string()
                } else {
                    song.language.clone()
                }),
            );
        }
    }

    if let Some(code) = &order.promo_code {
        payload.insert("PROMO CODE".to_string(), Value::String(code.clone()));
        payload.insert(
            "PROMO NOTE".to_string(),
            Value::String(if code == recognized_promo {
                "Valid code - Apply discount after payment".to_string()
            } else {
                "Code entered but needs validation".to_string()
            }),
        );
    }

    payload.insert(
        "Order Source".to_string(),
        Value::String("echogifts.shop".to_string()),
    );
    payload.insert("Order ID".to_string(), Value::String(order_id.to_string()));
    payload.insert(
        "Status".to_string(),
        Value::String("Payment Pending".to_string()),
    );

    payload
}

/// Build the vinyl waitlist signup payload
pub fn waitlist_payload(email: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(
        "_subject".to_string(),
        Value::String("Vinyl waitlist signup".to_string()),
    );
    payload.insert("Email".to_string(), Value::String(email.to_string()));
    payload.insert(
        "Order Source".to_string(),
        Value::String("echogifts.shop".to_string()),
    );
    payload
}
