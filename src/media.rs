//! Downloading embedded gallery images

use crate::client::FeedClient;
use crate::error::{Error, Result};
use crate::types::Gallery;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;
use url::Url;

/// Extension used when an image URL does not carry one
const DEFAULT_FILE_EXT: &str = "png";
/// Size variant suffixes that may trail an image URL
const VARIANT_SUFFIXES: [&str; 2] = [":large", ":orig"];

/// One downloaded gallery image
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryImage {
    /// File extension derived from the image URL, without the leading dot
    pub file_ext: String,
    /// Entire image body
    pub body: Vec<u8>,
}

/// Images produced by [`Gallery::download`], in gallery order
#[derive(Debug)]
pub struct GalleryDownload {
    images: ReceiverStream<Result<GalleryImage>>,
}

impl Stream for GalleryDownload {
    type Item = Result<GalleryImage>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().images).poll_next(cx)
    }
}

impl Gallery {
    /// Download every image of the gallery, one at a time
    ///
    /// Each image is requested in the size variant configured on the client.
    /// The stream ends after the first failure, which is yielded as
    /// [`Error::MediaDownload`]. An empty gallery yields a single error.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn download(&self, client: &FeedClient) -> GalleryDownload {
        let (tx, rx) = mpsc::channel(1);
        let client = client.clone();
        let image_urls = self.image_urls.clone();

        tokio::spawn(async move {
            if image_urls.is_empty() {
                let _ = tx
                    .send(Err(Error::compat("Gallery contains no image URLs")))
                    .await;
                return;
            }

            let variant = client.config().media_variant.clone();
            for raw_url in image_urls {
                let variant_url = format!("{}{}", raw_url, variant);
                let item = match client.get_bytes(&variant_url).await {
                    Ok(body) => {
                        debug!(url = %variant_url, bytes = body.len(), "Downloaded gallery image");
                        Ok(GalleryImage {
                            file_ext: file_extension(&raw_url),
                            body,
                        })
                    }
                    Err(e) => Err(Error::MediaDownload {
                        message: "Failed to download image".to_string(),
                        url: variant_url,
                        source: Box::new(e),
                    }),
                };

                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    return;
                }
            }
        });

        GalleryDownload {
            images: ReceiverStream::new(rx),
        }
    }
}

/// File extension of an image URL, ignoring size variant suffixes and the query
///
/// Falls back to `png` when the URL path has no extension.
pub fn file_extension(raw_url: &str) -> String {
    let clean = VARIANT_SUFFIXES
        .iter()
        .fold(raw_url, |url, suffix| url.strip_suffix(suffix).unwrap_or(url));

    Url::parse(clean)
        .ok()
        .and_then(|url| {
            let path = url.path();
            let offset = path.rfind(['/', '.'])?;
            let ext = &path[offset..];
            (ext.len() > 1 && ext.starts_with('.')).then(|| ext[1..].to_string())
        })
        .unwrap_or_else(|| DEFAULT_FILE_EXT.to_string())
}
