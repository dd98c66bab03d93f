//! Background artwork loading.
//!
//! Inline `data:` URIs are decoded locally. Remote URLs are downloaded at
//! most once and reused for every later export until [`ImageLoader::clear`],
//! so a preview, a download and a share of the same card all draw the same
//! picture even when the URL serves a random image per request.

use image::DynamicImage;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::debug;

use crate::card::ImageRef;
use crate::error::CardError;

/// Append a `cacheBust` query parameter so intermediaries serve a fresh copy.
pub fn cache_busted(url: &str, stamp: u128) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}cacheBust={}", url, separator, stamp)
}

/// Decodes and caches background images.
pub struct ImageLoader {
    client: reqwest::Client,
    // Held across the download so concurrent exports of one URL share a fetch.
    cache: Mutex<HashMap<String, Arc<DynamicImage>>>,
}

impl ImageLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Decode or fetch `image`. `cache_bust` only affects the first download
    /// of a URL; once fetched, the same pixels are returned every time.
    pub async fn load(&self, image: &ImageRef, cache_bust: bool) -> Result<Arc<DynamicImage>, CardError> {
        if let Some(bytes) = image.decode_data_uri() {
            return decode(&bytes?).map(Arc::new);
        }

        let url = image.as_str();
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(url) {
            return Ok(cached.clone());
        }

        let fetch_url = if cache_bust {
            let stamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default();
            cache_busted(url, stamp)
        } else {
            url.to_string()
        };
        debug!(url = %fetch_url, "downloading background");

        let response = self
            .client
            .get(&fetch_url)
            .send()
            .await
            .map_err(|e| CardError::Export(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(CardError::Export(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CardError::Export(format!("Failed to read image data: {}", e)))?;

        let decoded = Arc::new(decode(&bytes)?);
        cache.insert(url.to_string(), decoded.clone());
        Ok(decoded)
    }

    pub async fn cached_count(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Forget downloaded artwork.
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, CardError> {
    image::load_from_memory(bytes)
        .map_err(|e| CardError::Export(format!("Failed to decode image: {}", e)))
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_data_uri(width: u32, height: u32) -> ImageRef {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 120, 40]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ImageRef::from_base64("image/png", &STANDARD.encode(bytes))
    }

    #[test]
    fn test_cache_busted_separator() {
        assert_eq!(cache_busted("https://a/b", 5), "https://a/b?cacheBust=5");
        assert_eq!(
            cache_busted("https://picsum.photos/800/600?random=3", 5),
            "https://picsum.photos/800/600?random=3&cacheBust=5"
        );
    }

    #[tokio::test]
    async fn test_decodes_data_uri_without_network() {
        let loader = ImageLoader::new(reqwest::Client::new());
        let image = loader.load(&png_data_uri(8, 6), false).await.unwrap();
        assert_eq!((image.width(), image.height()), (8, 6));
        assert_eq!(loader.cached_count().await, 0);
    }

    /// Serves a red PNG on the first request and a blue one afterwards.
    pub(in crate::export) async fn changing_image_server() -> (String, Arc<std::sync::atomic::AtomicUsize>) {
        use axum::{Router, extract::State, http::header, routing::get};
        use std::sync::atomic::{AtomicUsize, Ordering};

        async fn serve_png(State(hits): State<Arc<AtomicUsize>>) -> ([(header::HeaderName, &'static str); 1], Vec<u8>) {
            let color = if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                Rgb([200, 0, 0])
            } else {
                Rgb([0, 0, 200])
            };
            let mut bytes = Vec::new();
            RgbImage::from_pixel(8, 6, color)
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                .unwrap();
            ([(header::CONTENT_TYPE, "image/png")], bytes)
        }

        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/800/600", get(serve_png))
            .with_state(hits.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/800/600?random=7", addr), hits)
    }

    #[tokio::test]
    async fn test_remote_artwork_is_fetched_once() {
        use std::sync::atomic::Ordering;

        let (url, hits) = changing_image_server().await;
        let loader = ImageLoader::new(reqwest::Client::new());
        let artwork = ImageRef::new(url);

        let first = loader.load(&artwork, true).await.unwrap();
        let again = loader.load(&artwork, true).await.unwrap();
        let cached = loader.load(&artwork, false).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(first.to_rgb8().get_pixel(0, 0), &Rgb([200, 0, 0]));
        assert_eq!(again.to_rgb8(), first.to_rgb8());
        assert_eq!(cached.to_rgb8(), first.to_rgb8());

        loader.clear().await;
        assert_eq!(loader.cached_count().await, 0);
        let fresh = loader.load(&artwork, false).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(fresh.to_rgb8().get_pixel(0, 0), &Rgb([0, 0, 200]));
    }

    #[tokio::test]
    async fn test_corrupt_data_uri_is_export_error() {
        let loader = ImageLoader::new(reqwest::Client::new());
        let bad = ImageRef::from_base64("image/png", "bm90IGFuIGltYWdl");
        assert!(matches!(loader.load(&bad, false).await, Err(CardError::Export(_))));
    }
}
