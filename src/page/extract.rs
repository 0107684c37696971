//! Record extraction from a page's item markup
//!
//! Each item container yields one [`Record`]. Embedded content is classified in
//! a fixed order (gallery, card, quote, video) and the first kind present wins,
//! even when the markup carries several.

use crate::error::{Error, Result};
use crate::types::{Card, Embed, Gallery, Quote, Record};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Attribute carrying an item's numeric identifier
const ITEM_ID_ATTR: &str = "data-item-id";
/// Attribute carrying an item's unix timestamp
const TIME_ATTR: &str = "data-time";
/// Attribute carrying a gallery image URL
const IMAGE_URL_ATTR: &str = "data-image-url";
/// Attribute carrying a link card URL
const CARD_URL_ATTR: &str = "data-card-url";
/// Quote links are relative to the site root
const QUOTE_URL_PREFIX: &str = "https://twitter.com";

/// CSS selectors used by the extractor, compiled once per process
struct Selectors {
    item: Selector,
    time: Selector,
    text: Selector,
    image: Selector,
    card: Selector,
    quote: Selector,
    video: Selector,
}

impl Selectors {
    fn compile() -> std::result::Result<Self, String> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| format!("invalid selector '{}': {}", css, e))
        };
        Ok(Self {
            item: parse(r#"li[data-item-type="tweet"]"#)?,
            time: parse("[data-time]")?,
            text: parse("p.tweet-text")?,
            image: parse("div[data-image-url]")?,
            card: parse("[data-card-url]")?,
            quote: parse("div.QuoteTweet-link")?,
            video: parse("div.PlayableMedia-player")?,
        })
    }
}

static SELECTORS: LazyLock<std::result::Result<Selectors, String>> =
    LazyLock::new(Selectors::compile);

fn selectors() -> Result<&'static Selectors> {
    SELECTORS.as_ref().map_err(|e| Error::compat(e.clone()))
}

/// Extract every well-formed record from an items fragment, in document order
///
/// Extraction stops at the first container that cannot be turned into a record:
/// the records before it are returned and the rest of the page is dropped
/// without an error. A truncated page is indistinguishable from a short one.
///
/// # Errors
/// Only fails if the extractor's selectors are unusable.
pub fn extract_records(items_html: &str) -> Result<Vec<Record>> {
    let sel = selectors()?;
    let fragment = Html::parse_fragment(items_html);

    let mut records = Vec::new();
    for container in fragment.select(&sel.item) {
        match extract_record(container, sel) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    error = %e,
                    record_id = ?e.record_id(),
                    extracted = records.len(),
                    "Malformed item, dropping the rest of the page"
                );
                break;
            }
        }
    }

    Ok(records)
}

/// Identifier of the last item container in the fragment
///
/// Used as the next position when a payload does not carry one.
///
/// # Errors
/// Returns a structural error if the last container has no identifier attribute.
pub fn last_item_id(items_html: &str) -> Result<Option<String>> {
    let sel = selectors()?;
    let fragment = Html::parse_fragment(items_html);

    match fragment.select(&sel.item).last() {
        None => Ok(None),
        Some(container) => container
            .value()
            .attr(ITEM_ID_ATTR)
            .map(|id| Some(id.to_string()))
            .ok_or_else(|| {
                Error::compat(format!(
                    "Can't extract item id, attribute {} does not exist",
                    ITEM_ID_ATTR
                ))
            }),
    }
}

/// Build a record from one item container
fn extract_record(container: ElementRef<'_>, sel: &Selectors) -> Result<Record> {
    let raw_id = container
        .value()
        .attr(ITEM_ID_ATTR)
        .ok_or_else(|| Error::compat("Item id not found"))?;
    let id = raw_id
        .parse::<u64>()
        .map_err(|e| Error::compat(format!("Unable to parse item id '{}': {}", raw_id, e)))?;

    let timestamp = extract_timestamp(container, sel).map_err(|e| e.with_record_id(id))?;
    let text = extract_text(container, sel, id)?;
    let embed = classify_embed(container, sel, id).map_err(|e| e.with_record_id(id))?;

    Ok(Record {
        id,
        timestamp,
        text,
        embed,
    })
}

fn extract_timestamp(container: ElementRef<'_>, sel: &Selectors) -> Result<Option<DateTime<Utc>>> {
    let nodes: Vec<ElementRef<'_>> = container.select(&sel.time).collect();
    let node = match nodes.as_slice() {
        [] => return Ok(None),
        [node] => node,
        _ => {
            return Err(Error::compat(format!(
                "Expected at most one timestamp node, got {}",
                nodes.len()
            )));
        }
    };

    let raw = node
        .value()
        .attr(TIME_ATTR)
        .ok_or_else(|| Error::compat("Timestamp node is missing its attribute"))?;
    let secs = raw
        .parse::<i64>()
        .map_err(|e| Error::compat(format!("Unable to parse timestamp '{}': {}", raw, e)))?;

    DateTime::from_timestamp(secs, 0)
        .map(Some)
        .ok_or_else(|| Error::compat(format!("Timestamp {} is out of range", secs)))
}

fn extract_text(container: ElementRef<'_>, sel: &Selectors, id: u64) -> Result<String> {
    let nodes: Vec<ElementRef<'_>> = container.select(&sel.text).collect();
    match nodes.as_slice() {
        [node] => Ok(node.text().collect()),
        [] => Err(Error::compat_for("Item text not found", id)),
        _ => Err(Error::compat_for(
            format!(
                "Expected a single node containing item text, got {} instead",
                nodes.len()
            ),
            id,
        )),
    }
}

/// Classify the container's embedded content; first match wins
fn classify_embed(container: ElementRef<'_>, sel: &Selectors, id: u64) -> Result<Option<Embed>> {
    if let Some(gallery) = extract_gallery(container, sel) {
        return Ok(Some(Embed::Gallery(gallery)));
    }
    if let Some(card) = extract_card(container, sel)? {
        return Ok(Some(Embed::Card(card)));
    }
    if let Some(quote) = extract_quote(container, sel)? {
        return Ok(Some(Embed::Quote(quote)));
    }
    if container.select(&sel.video).next().is_some() {
        // Detected, but there is no known way to resolve the player to a video URL.
        debug!(record_id = id, "Video embeds are not supported yet, skipping");
    }
    Ok(None)
}

fn extract_gallery(container: ElementRef<'_>, sel: &Selectors) -> Option<Gallery> {
    let image_urls: Vec<String> = container
        .select(&sel.image)
        .filter_map(|node| node.value().attr(IMAGE_URL_ATTR))
        .map(str::to_string)
        .collect();

    (!image_urls.is_empty()).then_some(Gallery { image_urls })
}

fn extract_card(container: ElementRef<'_>, sel: &Selectors) -> Result<Option<Card>> {
    let nodes: Vec<ElementRef<'_>> = container.select(&sel.card).collect();
    match nodes.as_slice() {
        [] => Ok(None),
        [node] => node
            .value()
            .attr(CARD_URL_ATTR)
            .map(|url| {
                Some(Card {
                    card_url: url.to_string(),
                })
            })
            .ok_or_else(|| Error::compat("Card node is missing its URL")),
        _ => Err(Error::compat("Found more than a single card embeddable")),
    }
}

fn extract_quote(container: ElementRef<'_>, sel: &Selectors) -> Result<Option<Quote>> {
    let nodes: Vec<ElementRef<'_>> = container.select(&sel.quote).collect();
    match nodes.as_slice() {
        [] => Ok(None),
        [node] => node
            .value()
            .attr("href")
            .map(|href| {
                Some(Quote {
                    quote_url: format!("{}{}", QUOTE_URL_PREFIX, href),
                })
            })
            .ok_or_else(|| Error::compat("Quote node is missing its URL")),
        _ => Err(Error::compat("Found more than a single quote embeddable")),
    }
}
