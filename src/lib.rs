//! # feed-rattler
//!
//! Streaming client for paginated social media feeds.
//!
//! ## Design Philosophy
//!
//! feed-rattler is designed to be:
//! - **Lazy** - Pages are fetched only as fast as the consumer reads records
//! - **Deduplicating** - A session never yields the same record twice
//! - **Resumable** - The position of the next page is always available to persist
//! - **Library-first** - No CLI and no logging subscriber, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use feed_rattler::{Config, FeedClient, FeedFilter, FeedSession, PageLimit, TimelineCursor};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(FeedClient::new(Config::default())?);
//!     let cursor = TimelineCursor::new(client, "rustlang", FeedFilter::Media);
//!
//!     let mut records = FeedSession::new(cursor).stream(PageLimit::All);
//!     while let Some(record) = records.next().await {
//!         let record = record?;
//!         println!("{} {}", record.id, record.text);
//!     }
//!
//!     // Save this to continue later with `TimelineCursor::resume_at`
//!     println!("Next position: {}", records.position());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP transport
pub mod client;
/// Configuration types
pub mod config;
/// Feed cursors
pub mod cursor;
/// Error types
pub mod error;
/// Gallery image downloads
pub mod media;
/// Page parsing and record extraction
pub mod page;
/// Streaming, deduplicating sessions
pub mod session;
/// Core record types
pub mod types;

// Re-export commonly used types
pub use client::FeedClient;
pub use config::Config;
pub use cursor::{FeedCursor, FeedFilter, SearchCursor, TimelineCursor};
pub use error::{Error, Result, TransportError};
pub use media::{GalleryDownload, GalleryImage};
pub use page::FeedPage;
pub use page::extract::extract_records;
pub use session::{FeedSession, FeedStream, PageLimit};
pub use types::{Card, Embed, Gallery, Quote, Record, Video};
