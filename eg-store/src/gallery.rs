//! Gallery state: sample playback and category filtering
//!
//! Playback is single-flight: starting any sample stops and rewinds
//! whichever sample was playing before it, so at most one sample reports
//! playing at any instant. All gallery state lives in one [`GalleryState`]
//! object owned by the shared application state; handlers receive it by
//! reference rather than reaching for module globals.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Artwork served when a sample's own artwork failed to load
pub const FALLBACK_ARTWORK: &str = "audio/Two decades.png";

/// A showcased song sample
#[derive(Debug, Clone)]
pub struct Sample {
    pub id: &'static str,
    pub title: &'static str,
    pub categories: &'static [&'static str],
    pub audio: &'static str,
    pub artwork: &'static str,
}

/// The showcased samples, in display order
pub fn sample_catalog() -> &'static [Sample] {
    &[
        Sample {
            id: "two-decades",
            title: "Two Decades",
            categories: &["anniversary", "love"],
            audio: "audio/two-decades.mp3",
            artwork: "audio/Two decades.png",
        },
        Sample {
            id: "our-first-dance",
            title: "Our First Dance",
            categories: &["wedding", "love"],
            audio: "audio/our-first-dance.mp3",
            artwork: "audio/our-first-dance.png",
        },
        Sample {
            id: "college-years",
            title: "College Years",
            categories: &["graduation", "friendship"],
            audio: "audio/college-years.mp3",
            artwork: "audio/college-years.png",
        },
        Sample {
            id: "lullaby-for-june",
            title: "Lullaby for June",
            categories: &["newborn", "family"],
            audio: "audio/lullaby-for-june.mp3",
            artwork: "audio/lullaby-for-june.png",
        },
        Sample {
            id: "seventy-summers",
            title: "Seventy Summers",
            categories: &["birthday", "family"],
            audio: "audio/seventy-summers.mp3",
            artwork: "audio/seventy-summers.png",
        },
    ]
}

/// Look up a sample by id
pub fn find_sample(id: &str) -> Option<&'static Sample> {
    sample_catalog().iter().find(|s| s.id == id)
}

/// Category filter applied to the gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryFilter {
    All,
    Category(String),
}

impl GalleryFilter {
    /// Parse a filter value; "all" (any case) clears filtering
    pub fn parse(value: &str) -> Self {
        let value = value.trim().to_ascii_lowercase();
        if value.is_empty() || value == "all" {
            GalleryFilter::All
        } else {
            GalleryFilter::Category(value)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GalleryFilter::All => "all",
            GalleryFilter::Category(tag) => tag,
        }
    }
}

/// Outcome of a play toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayOutcome {
    /// Sample now playing, None when the toggle paused it
    pub now_playing: Option<String>,
    /// Sample that was stopped and rewound to make room
    pub stopped: Option<String>,
}

/// Mutable gallery state: current playback, filter, failed artwork loads
#[derive(Debug)]
pub struct GalleryState {
    playing: Option<String>,
    filter: GalleryFilter,
    failed_artwork: HashSet<String>,
}

impl GalleryState {
    pub fn new() -> Self {
        Self {
            playing: None,
            filter: GalleryFilter::All,
            failed_artwork: HashSet::new(),
        }
    }

    /// Toggle playback of a sample
    ///
    /// Starting a sample stops whichever other sample was playing.
    /// Toggling the sample that is already playing pauses it.
    pub fn play(&mut self, id: &str) -> Result<PlayOutcome> {
        if find_sample(id).is_none() {
            return Err(Error::NotFound(format!("Unknown sample: {}", id)));
        }

        if self.playing.as_deref() == Some(id) {
            self.playing = None;
            return Ok(PlayOutcome {
                now_playing: None,
                stopped: Some(id.to_string()),
            });
        }

        let stopped = self.playing.take();
        self.playing = Some(id.to_string());
        Ok(PlayOutcome {
            now_playing: Some(id.to_string()),
            stopped,
        })
    }

    /// Stop whatever is playing (the page-hidden behavior)
    pub fn pause_all(&mut self) -> Option<String> {
        self.playing.take()
    }

    /// Playback of a sample ran to completion
    pub fn sample_ended(&mut self, id: &str) {
        if self.playing.as_deref() == Some(id) {
            self.playing = None;
        }
    }

    pub fn now_playing(&self) -> Option<&str> {
        self.playing.as_deref()
    }

    pub fn set_filter(&mut self, filter: GalleryFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> &GalleryFilter {
        &self.filter
    }

    /// Whether a sample is visible under the current filter
    pub fn is_visible(&self, sample: &Sample) -> bool {
        match &self.filter {
            GalleryFilter::All => true,
            GalleryFilter::Category(tag) => sample.categories.contains(&tag.as_str()),
        }
    }

    /// Record that a sample's artwork failed to load
    pub fn mark_artwork_failed(&mut self, id: &str) {
        self.failed_artwork.insert(id.to_string());
    }

    /// Artwork to display for a sample, degrading to the fallback asset
    pub fn artwork_for(&self, sample: &Sample) -> &'static str {
        if self.failed_artwork.contains(sample.id) {
            FALLBACK_ARTWORK
        } else {
            sample.artwork
        }
    }
}

impl Default for GalleryState {
    fn default() -> Self {
        Self::new()
    }
}
