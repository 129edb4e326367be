//! # EchoGifts Storefront Service (eg-store)
//!
//! Order capture, checkout orchestration against a hosted payment
//! provider, and the sample gallery, served over an HTTP/SSE interface.
//!
//! **Purpose:** Validate order submissions, hold them in transient
//! session storage, drive the hosted payment flow (payment links or
//! client-side checkout sessions), relay order notifications, and manage
//! gallery playback with single-flight semantics.

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gallery;
pub mod notify;
pub mod payment;
pub mod session;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
