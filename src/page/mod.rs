//! Feed pages
//!
//! A page payload is a JSON object with two fields of interest:
//! - `items_html`: an HTML fragment containing one container node per item
//! - `min_position`: the resume token for the next (older) page
//!
//! [`FeedPage::from_payload`] turns such a payload into records plus the next
//! position. A payload that is not an object or has no usable `items_html` is an
//! error. An unusable `min_position` is kept on the page instead, so the records
//! it carries are not lost. Problems inside a single item only truncate the page
//! (see [`extract::extract_records`]).

pub mod extract;
pub(crate) mod payload;

use crate::error::{Error, Result};
use crate::types::Record;
use payload::Lookup;
use serde_json::{Map, Value};
use tracing::debug;

/// Payload key holding the items fragment
const ITEMS_HTML_KEY: &str = "items_html";
/// Payload key holding the next position
const MIN_POSITION_KEY: &str = "min_position";

/// One page fetched from a feed
#[derive(Debug)]
pub struct FeedPage {
    records: Vec<Record>,
    next_position: Result<Option<String>>,
}

impl Default for FeedPage {
    fn default() -> Self {
        Self::new(Vec::new(), None)
    }
}

impl FeedPage {
    /// Create a page from already extracted parts
    ///
    /// An empty `next_position` is treated the same as `None`.
    pub fn new(records: Vec<Record>, next_position: Option<String>) -> Self {
        Self {
            records,
            next_position: Ok(next_position.filter(|p| !p.is_empty())),
        }
    }

    /// Create a page whose records are usable but whose next position is not
    pub fn with_position_error(records: Vec<Record>, error: Error) -> Self {
        Self {
            records,
            next_position: Err(error),
        }
    }

    /// Parse a decoded page payload
    ///
    /// When `min_position` is missing altogether, the identifier of the last item
    /// container in the markup is used instead. An explicit null means there are
    /// no further pages. A `min_position` of any other type, or a fallback
    /// container without an identifier, is kept as the page's
    /// [`position_error`](Self::position_error).
    ///
    /// # Errors
    /// Returns a structural error if:
    /// - the payload is not a JSON object
    /// - `items_html` is missing or not a string
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let object = payload.as_object().ok_or_else(|| {
            Error::compat(format!(
                "Expected page payload to be a JSON object, got {}",
                payload::type_name(payload)
            ))
        })?;

        let items_html = payload::require_str(object, ITEMS_HTML_KEY)?;
        let records = extract::extract_records(items_html)?;

        match read_position(object, items_html) {
            Ok(next_position) => Ok(Self::new(records, next_position)),
            Err(e) => {
                debug!(error = %e, records = records.len(), "Page has no usable next position");
                Ok(Self::with_position_error(records, e))
            }
        }
    }

    /// Records on this page, in document order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Resume token for the next (older) page
    ///
    /// None if there is no further page, or if the position could not be read.
    pub fn next_position(&self) -> Option<&str> {
        self.next_position.as_ref().ok().and_then(|p| p.as_deref())
    }

    /// Why the next position could not be read, if it could not
    pub fn position_error(&self) -> Option<&Error> {
        self.next_position.as_ref().err()
    }

    /// Split the page into its records and next position
    pub fn into_parts(self) -> (Vec<Record>, Result<Option<String>>) {
        (self.records, self.next_position)
    }
}

fn read_position(object: &Map<String, Value>, items_html: &str) -> Result<Option<String>> {
    match payload::lookup_str(object, MIN_POSITION_KEY) {
        Lookup::Str(position) => Ok(Some(position.to_string())),
        Lookup::Null => Ok(None),
        Lookup::Missing => {
            debug!("No 'min_position' in payload, falling back to the last item id");
            let position = extract::last_item_id(items_html)?;
            match &position {
                Some(p) => debug!(position = %p, "Extracted fallback position"),
                None => debug!("Couldn't extract a fallback position"),
            }
            Ok(position)
        }
        Lookup::WrongType(found) => Err(payload::wrong_type(MIN_POSITION_KEY, found)),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
