//! Payment provider integration
//!
//! The storefront never touches card data or the payment protocol; it only
//! constructs what the hosted provider needs. Two variants exist, matching
//! the two ways the provider can be driven:
//!
//! - a client-side hosted checkout session (price id, quantity, mode,
//!   success/cancel URLs, customer email), serialized for the provider's
//!   browser SDK call;
//! - a pre-built hosted payment link with prefill query parameters. This
//!   is the only variant where an entered promo code reaches the provider.

use serde::Serialize;
use url::Url;

use eg_common::order::ProductType;

use crate::config::{Config, PLACEHOLDER_FRAGMENT};
use crate::error::{Error, Result};

/// Fragment that marks a price id as a dashboard placeholder
const PRICE_ID_PLACEHOLDER: &str = "1234567890";

/// Line item for a hosted checkout session
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LineItem {
    pub price: String,
    pub quantity: u32,
}

/// Parameters for the provider's client-side checkout call
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionParams {
    pub line_items: Vec<LineItem>,
    pub mode: String,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: String,
}

/// Resolve the configured price id for a product
///
/// A missing or placeholder id is a configuration error, surfaced as a
/// blocking message rather than a provider call that cannot succeed.
pub fn price_id(config: &Config, product_type: ProductType) -> Result<&str> {
    let id = match product_type {
        ProductType::Single => config.price_id_single.as_str(),
        ProductType::Album => config.price_id_album.as_str(),
    };
    if id.is_empty() || id.contains(PRICE_ID_PLACEHOLDER) {
        return Err(Error::Config(
            "Stripe price IDs not configured. Please set up your products in Stripe Dashboard."
                .to_string(),
        ));
    }
    Ok(id)
}

/// The configured payment link for a product, if it is real
///
/// Links still carrying the `YOUR_` placeholder are treated as absent.
pub fn payment_link(config: &Config, product_type: ProductType) -> Option<&str> {
    let link = match product_type {
        ProductType::Single => config.payment_link_single.as_str(),
        ProductType::Album => config.payment_link_album.as_str(),
    };
    if link.is_empty() || link.contains(PLACEHOLDER_FRAGMENT) {
        None
    } else {
        Some(link)
    }
}

/// Build the hosted payment-link URL with prefill parameters
pub fn build_payment_link_url(
    link: &str,
    email: &str,
    client_reference_id: &str,
    promo_code: Option<&str>,
) -> Result<Url> {
    let mut url = Url::parse(link)
        .map_err(|e| Error::Config(format!("Invalid payment link {}: {}", link, e)))?;
    url.query_pairs_mut()
        .append_pair("prefilled_email", email)
        .append_pair("client_reference_id", client_reference_id);
    if let Some(code) = promo_code {
        url.query_pairs_mut().append_pair("prefilled_promo_code", code);
    }
    Ok(url)
}

/// Build parameters for the client-side hosted checkout call
pub fn build_checkout_params(
    config: &Config,
    product_type: ProductType,
    customer_email: &str,
) -> Result<CheckoutSessionParams> {
    let price = price_id(config, product_type)?;
    Ok(CheckoutSessionParams {
        line_items: vec![LineItem {
            price: price.to_string(),
            quantity: 1,
        }],
        mode: "payment".to_string(),
        success_url: config.success_url(),
        cancel_url: config.cancel_url(),
        customer_email: customer_email.to_string(),
    })
}

/// Translate a provider error message for display
///
/// Errors about the client-only integration get replaced with setup
/// instructions; everything else surfaces verbatim.
pub fn translate_provider_error(message: &str) -> String {
    if message.contains("client-only integration") {
        "Stripe checkout needs to be configured. Please enable \"Client-only integration\" \
         in your Stripe Dashboard at https://dashboard.stripe.com/account/checkout/settings, \
         or contact support."
            .to_string()
    } else {
        message.to_string()
    }
}
