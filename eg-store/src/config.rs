//! eg-store specific configuration
//!
//! Payment provider identifiers, the form-relay endpoint, and session
//! tuning load from a TOML file resolved by [`eg_common::config`]. Missing
//! file means compiled defaults, which carry placeholder payment ids so
//! checkout surfaces a configuration message instead of charging anyone.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

/// Fragment that marks a payment link or price id as not yet configured
pub const PLACEHOLDER_FRAGMENT: &str = "YOUR_";

/// Storefront service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Public origin used to build success/cancel URLs, e.g. `https://echogifts.shop`
    pub public_origin: String,

    /// Payment provider publishable key
    pub publishable_key: String,

    /// Provider price id for the single-song product
    pub price_id_single: String,

    /// Provider price id for the album product
    pub price_id_album: String,

    /// Pre-built hosted payment link for the single-song product
    pub payment_link_single: String,

    /// Pre-built hosted payment link for the album product
    pub payment_link_album: String,

    /// Route checkout through the hosted payment links instead of
    /// client-side checkout sessions. Payment links are the only variant
    /// where the promo code reaches the provider.
    pub use_payment_links: bool,

    /// Form-relay endpoint receiving the order notification POST
    pub notify_endpoint: String,

    /// The one recognized promo code
    pub promo_code: String,

    /// Display-only discount percentage for the recognized promo code
    pub promo_discount_percent: u32,

    /// Idle seconds before a session and its stored order are dropped
    pub session_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            public_origin: "http://localhost:5780".to_string(),
            publishable_key: "pk_live_51RTWhNEinaZMSMtjUEnWpzUPDC8KZBlFOy9O4Is2iG6KDg0CrCLszCw8QksowdNQcUyFdp8BIuWmSPMYueau2t5200ayCjCLBw".to_string(),
            price_id_single: "price_1RsuIhEinaZMSMtjh8LOF9vc".to_string(),
            price_id_album: "price_1RsuIqEinaZMSMtjlfcmwgvI".to_string(),
            payment_link_single: "https://buy.stripe.com/YOUR_SINGLE_SONG_PAYMENT_LINK".to_string(),
            payment_link_album: "https://buy.stripe.com/YOUR_ALBUM_PAYMENT_LINK".to_string(),
            use_payment_links: false,
            notify_endpoint: "https://formspree.io/f/xkgzqpyy".to_string(),
            promo_code: eg_common::catalog::PROMO_CODE.to_string(),
            promo_discount_percent: eg_common::catalog::PROMO_DISCOUNT_PERCENT,
            session_ttl_secs: 1800,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, or compiled defaults when no
    /// file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Cannot read {}: {}", path.display(), e))
                })?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("Cannot parse {}: {}", path.display(), e)))
            }
            None => Ok(Self::default()),
        }
    }

    /// Success URL for the hosted checkout, carrying the provider's
    /// session-id token
    pub fn success_url(&self) -> String {
        format!(
            "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.public_origin.trim_end_matches('/')
        )
    }

    /// Cancel URL returning the customer to the checkout summary
    pub fn cancel_url(&self) -> String {
        format!(
            "{}/checkout?canceled=true",
            self.public_origin.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_payment_links_disabled() {
        let config = Config::default();
        assert!(!config.use_payment_links);
        assert!(config.payment_link_single.contains(PLACEHOLDER_FRAGMENT));
        assert_eq!(config.promo_code, "ELYSON");
        assert_eq!(config.promo_discount_percent, 20);
    }

    #[test]
    fn load_from_toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
public_origin = "https://shop.example"
use_payment_links = true
payment_link_single = "https://buy.example/live_single"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.use_payment_links);
        assert_eq!(config.payment_link_single, "https://buy.example/live_single");
        // Unspecified keys fall back to defaults
        assert_eq!(config.promo_code, "ELYSON");
        assert_eq!(
            config.success_url(),
            "https://shop.example/checkout/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(config.cancel_url(), "https://shop.example/checkout?canceled=true");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::load(Some(Path::new("/nonexistent/eg.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
