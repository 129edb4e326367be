//! Order data model and validation
//!
//! An order is captured from the storefront form as an [`OrderDraft`],
//! validated into an [`Order`], and held in the session store until the
//! checkout flow completes. There is no server-side persistence; the order
//! record lives exactly as long as the customer's session.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum number of songs on an album order
pub const MAX_ALBUM_SONGS: usize = 5;

/// Product selection for an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Single,
    Album,
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductType::Single => write!(f, "single"),
            ProductType::Album => write!(f, "album"),
        }
    }
}

impl ProductType {
    /// Parse a form value ("single" / "album", any case)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Some(ProductType::Single),
            "album" => Some(ProductType::Album),
            _ => None,
        }
    }
}

/// Per-song details on an album order, numbered positionally 1..=5
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumSong {
    pub number: u8,
    pub title: String,
    pub story: String,
    pub language: String,
}

/// Raw album song fields as submitted from the form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumSongInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub language: String,
}

/// Raw order form submission, prior to validation
///
/// All fields default to empty so a partially filled form deserializes and
/// fails validation with a field-naming message instead of a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default)]
    pub occasion: String,
    #[serde(default)]
    pub story_themes: String,
    #[serde(default)]
    pub artwork_inspiration: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub language_preference: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub terms_accepted: bool,
    #[serde(default)]
    pub album_songs: Vec<AlbumSongInput>,
}

/// A validated order, as held in the session store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub product_type: ProductType,
    pub recipient_name: String,
    pub occasion: String,
    pub story_themes: String,
    pub artwork_inspiration: String,
    pub genre: String,
    pub tone: String,
    pub language_preference: String,
    pub email: String,
    pub delivery: String,
    #[serde(default)]
    pub album_songs: Vec<AlbumSong>,
    #[serde(default)]
    pub promo_code: Option<String>,
}

impl OrderDraft {
    /// Validate the draft into an [`Order`]
    ///
    /// Checks required fields in form order and returns the first failure,
    /// matching the inline-error behavior of the order form. Album song
    /// entries are only retained for album orders, and only when the entry
    /// has a title or a story.
    pub fn validate(&self) -> Result<Order> {
        let required = [
            (&self.product_type, "product type"),
            (&self.recipient_name, "recipient name"),
            (&self.occasion, "occasion"),
            (&self.story_themes, "story themes"),
            (&self.genre, "genre"),
            (&self.tone, "tone"),
            (&self.language_preference, "language preference"),
            (&self.email, "email"),
        ];
        for (value, label) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "Please fill in the {} field.",
                    label
                )));
            }
        }

        if !self.terms_accepted {
            return Err(Error::InvalidInput(
                "You must agree to the Terms of Service and Privacy Policy to proceed."
                    .to_string(),
            ));
        }

        let product_type = ProductType::parse(&self.product_type).ok_or_else(|| {
            Error::InvalidInput("Please select a valid product type.".to_string())
        })?;

        if !is_valid_email(self.email.trim()) {
            return Err(Error::InvalidInput(
                "Please enter a valid email address.".to_string(),
            ));
        }

        // Album song entries are numbered by position, skipping blanks
        let album_songs = if product_type == ProductType::Album {
            self.album_songs
                .iter()
                .take(MAX_ALBUM_SONGS)
                .enumerate()
                .filter(|(_, song)| {
                    !song.title.trim().is_empty() || !song.story.trim().is_empty()
                })
                .map(|(i, song)| AlbumSong {
                    number: (i + 1) as u8,
                    title: song.title.trim().to_string(),
                    story: song.story.trim().to_string(),
                    language: song.language.trim().to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(Order {
            product_type,
            recipient_name: self.recipient_name.trim().to_string(),
            occasion: self.occasion.trim().to_string(),
            story_themes: self.story_themes.trim().to_string(),
            artwork_inspiration: self.artwork_inspiration.trim().to_string(),
            genre: self.genre.trim().to_string(),
            tone: self.tone.trim().to_string(),
            language_preference: self.language_preference.trim().to_string(),
            email: self.email.trim().to_string(),
            delivery: "Email Download".to_string(),
            album_songs,
            promo_code: None,
        })
    }
}

/// Basic `local@domain.tld` email shape check
///
/// Mirrors the storefront's acceptance rule: no whitespace, exactly one
/// `@` with non-empty sides, and a dot inside the domain with non-empty
/// segments around it.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = match parts.next() {
        Some(d) => d,
        None => return false,
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Generate a client reference id for the payment provider and the
/// order notification, e.g. `EG-1754310000000`
pub fn order_reference() -> String {
    format!("EG-{}", Utc::now().timestamp_millis())
}
