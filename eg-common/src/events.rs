//! Event types for the storefront event system
//!
//! Every state change of interest is broadcast as an [`EgEvent`] and can be
//! observed by SSE clients.

use serde::{Deserialize, Serialize};

use crate::order::ProductType;

/// Checkout flow phase for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutPhase {
    Loading,
    AwaitingSubmit,
    Submitting,
    Success,
    Failed,
}

impl std::fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutPhase::Loading => write!(f, "loading"),
            CheckoutPhase::AwaitingSubmit => write!(f, "awaiting_submit"),
            CheckoutPhase::Submitting => write!(f, "submitting"),
            CheckoutPhase::Success => write!(f, "success"),
            CheckoutPhase::Failed => write!(f, "failed"),
        }
    }
}

/// How a payment redirect was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectMode {
    /// Pre-built hosted payment link with query parameters
    PaymentLink,
    /// Client-side hosted checkout session
    HostedCheckout,
}

/// Storefront event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EgEvent {
    /// An order passed validation and was stored for checkout
    OrderCaptured {
        product_type: ProductType,
        recipient: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Checkout phase changed for a session
    CheckoutPhaseChanged {
        phase: CheckoutPhase,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The recognized promo code was applied
    PromoApplied {
        code: String,
        discount_percent: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An unrecognized promo code was entered
    PromoRejected {
        code: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A payment redirect was handed to the customer
    PaymentRedirectIssued {
        mode: RedirectMode,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Outcome of the best-effort order notification relay
    OrderNotification {
        delivered: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A gallery sample started playing
    PlaybackStarted {
        sample_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A gallery sample stopped (paused, replaced, or ended)
    PlaybackStopped {
        sample_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Gallery category filter changed
    GalleryFilterChanged {
        filter: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}
