//! Core types for feed-rattler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single item fetched from a feed
///
/// Records are built once by the page extractor and never modified afterwards.
/// Serialized with the identifier encoded as a decimal string, since feed ids
/// exceed the integer range many JSON consumers can represent exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Feed-unique identifier, used as the deduplication key
    #[serde(with = "id_string")]
    pub id: u64,

    /// Publication time (None if the page did not carry one)
    pub timestamp: Option<DateTime<Utc>>,

    /// Display text (may be empty)
    pub text: String,

    /// Embedded content attached to the item, if any
    pub embed: Option<Embed>,
}

/// Embedded content attached to a [`Record`]
///
/// Serializes with a `type` discriminant (`EMBED_TYPE_IMAGE`, `EMBED_TYPE_VIDEO`,
/// `EMBED_TYPE_CARD`, `EMBED_TYPE_QUOTE`) next to the variant's URL field(s).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Embed {
    /// One or more images
    #[serde(rename = "EMBED_TYPE_IMAGE")]
    Gallery(Gallery),

    /// A playable video
    ///
    /// Video players are detected during extraction, but no URL scheme is known
    /// for them, so the extractor never produces this variant.
    #[serde(rename = "EMBED_TYPE_VIDEO")]
    Video(Video),

    /// A link preview card
    #[serde(rename = "EMBED_TYPE_CARD")]
    Card(Card),

    /// A quote of another item
    #[serde(rename = "EMBED_TYPE_QUOTE")]
    Quote(Quote),
}

/// Images embedded in a record, in document order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gallery {
    /// Image URLs (never empty when produced by the extractor)
    #[serde(rename = "imageURLs")]
    pub image_urls: Vec<String>,
}

/// Video embedded in a record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Video URL
    #[serde(rename = "videoURL")]
    pub video_url: String,
}

/// Link card embedded in a record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card URL
    #[serde(rename = "cardURL")]
    pub card_url: String,
}

/// Quoted item embedded in a record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Absolute URL of the quoted item
    #[serde(rename = "quoteURL")]
    pub quote_url: String,
}

mod id_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(id: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u64>().map_err(D::Error::custom)
    }
}
