//! Cursors into paginated feeds
//!
//! A cursor knows which feed it points into and where it currently is. Fetching
//! never moves the cursor; the caller decides whether to [`seek`](FeedCursor::seek)
//! to the page's next position.

use crate::client::FeedClient;
use crate::error::Result;
use crate::page::FeedPage;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, REFERER};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Accept header sent with feed page requests
const PAGE_ACCEPT: &str = "application/json,text/javascript,*/*;q=0.01";

/// Positional handle into one logical feed
///
/// Implementations are driven by [`FeedSession`](crate::session::FeedSession),
/// which moves them into a background task.
#[async_trait]
pub trait FeedCursor: Send + Sync + 'static {
    /// Fetch the page at the current position
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the payload does not have the expected shape.
    async fn fetch_page(&self) -> Result<FeedPage>;

    /// Move to `position`
    ///
    /// An empty position means there is nothing older to fetch: the cursor is
    /// left unchanged and `false` is returned.
    fn seek(&mut self, position: &str) -> bool;

    /// Current resume token, empty at the start of the feed
    fn position(&self) -> &str;
}

/// Which of a user's feeds a [`TimelineCursor`] reads
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeedFilter {
    /// Every item
    #[default]
    Regular,
    /// Only items with attached media
    Media,
}

/// Cursor over a user's timeline
#[derive(Clone, Debug)]
pub struct TimelineCursor {
    client: Arc<FeedClient>,
    username: String,
    filter: FeedFilter,
    position: String,
}

impl TimelineCursor {
    /// Create a cursor at the start of `username`'s feed
    pub fn new(client: Arc<FeedClient>, username: impl Into<String>, filter: FeedFilter) -> Self {
        Self {
            client,
            username: username.into(),
            filter,
            position: String::new(),
        }
    }

    /// Start from a previously saved position instead of the newest item
    pub fn resume_at(mut self, position: impl Into<String>) -> Self {
        self.position = position.into();
        self
    }

    /// Username this cursor reads
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Feed filter this cursor reads
    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    fn page_url(&self) -> Result<Url> {
        let path = match self.filter {
            FeedFilter::Regular => format!("/i/profiles/show/{}/timeline", self.username),
            FeedFilter::Media => format!("/i/profiles/show/{}/media_timeline", self.username),
        };
        self.client.endpoint(&path, &common_params(&self.position))
    }

    fn referer(&self) -> Result<Url> {
        let path = match self.filter {
            FeedFilter::Regular => format!("/{}", self.username),
            FeedFilter::Media => format!("/{}/media", self.username),
        };
        self.client.endpoint(&path, &[])
    }
}

#[async_trait]
impl FeedCursor for TimelineCursor {
    async fn fetch_page(&self) -> Result<FeedPage> {
        let url = self.page_url()?;
        let mut headers = page_headers(&self.referer()?);
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );
        fetch(&self.client, &url, headers).await
    }

    fn seek(&mut self, position: &str) -> bool {
        seek_to(&mut self.position, position)
    }

    fn position(&self) -> &str {
        &self.position
    }
}

/// Cursor over search results
#[derive(Clone, Debug)]
pub struct SearchCursor {
    client: Arc<FeedClient>,
    query: String,
    position: String,
}

impl SearchCursor {
    /// Create a cursor at the start of the results for `query`
    pub fn new(client: Arc<FeedClient>, query: impl Into<String>) -> Self {
        Self {
            client,
            query: query.into(),
            position: String::new(),
        }
    }

    /// Start from a previously saved position instead of the newest result
    pub fn resume_at(mut self, position: impl Into<String>) -> Self {
        self.position = position.into();
        self
    }

    /// Query this cursor searches for
    pub fn query(&self) -> &str {
        &self.query
    }

    fn page_url(&self) -> Result<Url> {
        let mut params = vec![("vertical", "default"), ("q", self.query.as_str())];
        params.extend(common_params(&self.position));
        self.client.endpoint("/i/search/timeline", &params)
    }

    fn referer(&self) -> Result<Url> {
        self.client.endpoint("/search", &[("q", self.query.as_str())])
    }
}

#[async_trait]
impl FeedCursor for SearchCursor {
    async fn fetch_page(&self) -> Result<FeedPage> {
        let url = self.page_url()?;
        let headers = page_headers(&self.referer()?);
        fetch(&self.client, &url, headers).await
    }

    fn seek(&mut self, position: &str) -> bool {
        seek_to(&mut self.position, position)
    }

    fn position(&self) -> &str {
        &self.position
    }
}

/// Query parameters shared by every page request
fn common_params(position: &str) -> Vec<(&'static str, &str)> {
    let mut params = vec![("include_available_features", "1"), ("include_entities", "1")];
    if !position.is_empty() {
        params.push(("max_position", position));
    }
    params.push(("reset_error_state", "false"));
    params
}

fn seek_to(current: &mut String, position: &str) -> bool {
    if position.is_empty() {
        return false;
    }
    *current = position.to_string();
    true
}

/// Headers sent with every page request
fn page_headers(referer: &Url) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(PAGE_ACCEPT));
    // A Url always serializes to visible ASCII, so this cannot fail in practice.
    if let Ok(value) = HeaderValue::from_str(referer.as_str()) {
        headers.insert(REFERER, value);
    }
    headers
}

async fn fetch(client: &FeedClient, url: &Url, headers: HeaderMap) -> Result<FeedPage> {
    let payload = client.get_json(url, headers).await?;
    let page = FeedPage::from_payload(&payload)?;
    debug!(
        url = %url,
        records = page.records().len(),
        next_position = ?page.next_position(),
        "Fetched feed page"
    );
    Ok(page)
}
