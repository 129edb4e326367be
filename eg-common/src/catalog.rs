//! Product catalog and pricing
//!
//! Prices are held in cents. The displayed discount for the recognized
//! promo code is computed here; the amount actually charged is always the
//! catalog amount unless the payment-link flow forwards the code to the
//! payment provider.

use serde::Serialize;

use crate::order::ProductType;

/// The single promo code the storefront recognizes
pub const PROMO_CODE: &str = "ELYSON";

/// Display-only discount applied for the recognized promo code
pub const PROMO_DISCOUNT_PERCENT: u32 = 20;

/// A sellable product
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub name: &'static str,
    pub description: &'static str,
    pub amount_cents: u32,
}

const SINGLE: Product = Product {
    name: "Personalized Song",
    description: "Custom AI-generated song with your story + custom artwork",
    amount_cents: 7900,
};

const ALBUM: Product = Product {
    name: "Custom Song Album",
    description: "5 personalized songs telling your complete story + custom artwork",
    amount_cents: 29900,
};

/// Look up the product for a product type
pub fn product(product_type: ProductType) -> &'static Product {
    match product_type {
        ProductType::Single => &SINGLE,
        ProductType::Album => &ALBUM,
    }
}

/// Short label used in order notifications, e.g. "Personalized Song ($79)"
pub fn order_type_label(product_type: ProductType) -> String {
    let p = product(product_type);
    format!("{} (${})", p.name, p.amount_cents / 100)
}

/// Format cents as a USD amount, e.g. `$79.00`
pub fn format_usd(cents: u32) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

/// Discount in cents for a percentage off a subtotal
pub fn discount_cents(subtotal_cents: u32, percent: u32) -> u32 {
    subtotal_cents * percent / 100
}
