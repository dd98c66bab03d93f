//! Card fonts, fetched once per preview session.
//!
//! The card typefaces are not shipped with the crate. The first export of a
//! session downloads the TTFs from the font source; later exports reuse them
//! until the session starts over. A font that fails to download is replaced
//! by the embedded bitmap face for the rest of the session.

use ab_glyph::FontArc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::text::Typeface;
use crate::card::PostcardFont;
use crate::error::CardError;

/// Raw files of the google/fonts repository.
pub const DEFAULT_FONT_BASE_URL: &str = "https://raw.githubusercontent.com/google/fonts/main";

/// The faces available to the rasterizer.
#[derive(Clone, Default)]
pub struct CardFonts {
    faces: HashMap<PostcardFont, FontArc>,
}

impl CardFonts {
    /// No outline fonts; everything renders with the bitmap face.
    pub fn bitmap_only() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, font: PostcardFont, face: FontArc) {
        self.faces.insert(font, face);
    }

    pub fn is_loaded(&self, font: PostcardFont) -> bool {
        self.faces.contains_key(&font)
    }

    pub fn typeface(&self, font: PostcardFont) -> Typeface {
        match self.faces.get(&font) {
            Some(face) => Typeface::Outline(face.clone()),
            None => Typeface::Bitmap,
        }
    }
}

/// Session-scoped cache of [`CardFonts`].
pub struct FontCache {
    source: Option<(reqwest::Client, String)>,
    loaded: RwLock<Option<Arc<CardFonts>>>,
}

impl FontCache {
    /// Fetch fonts from `base_url` (see [`DEFAULT_FONT_BASE_URL`]).
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            source: Some((client, base_url.into())),
            loaded: RwLock::new(None),
        }
    }

    /// Never touch the network; always use the bitmap face.
    pub fn offline() -> Self {
        Self {
            source: None,
            loaded: RwLock::new(None),
        }
    }

    /// The session's fonts, fetching them on first use.
    pub async fn fonts(&self) -> Arc<CardFonts> {
        if let Some(fonts) = self.loaded.read().await.as_ref() {
            return fonts.clone();
        }

        let mut loaded = self.loaded.write().await;
        // Another export may have fetched while we waited for the lock
        if let Some(fonts) = loaded.as_ref() {
            return fonts.clone();
        }

        let mut fonts = CardFonts::bitmap_only();
        if let Some((client, base_url)) = &self.source {
            for font in PostcardFont::ALL {
                match fetch_font(client, base_url, font).await {
                    Ok(face) => fonts.insert(font, face),
                    Err(e) => warn!(font = %font, error = %e, "falling back to bitmap font"),
                }
            }
        }

        let fonts = Arc::new(fonts);
        *loaded = Some(fonts.clone());
        fonts
    }

    pub async fn is_cached(&self) -> bool {
        self.loaded.read().await.is_some()
    }

    /// Forget the fetched fonts; the next export fetches again.
    pub async fn clear(&self) {
        *self.loaded.write().await = None;
    }
}

async fn fetch_font(
    client: &reqwest::Client,
    base_url: &str,
    font: PostcardFont,
) -> Result<FontArc, CardError> {
    let url = format!("{}/{}", base_url.trim_end_matches('/'), font.font_file());
    debug!(%url, "fetching font");

    let response = client
        .get(&url)
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
        .map_err(|e| CardError::Export(format!("Failed to read font data: {}", e)))?;

    FontArc::try_from_vec(bytes.to_vec())
        .map_err(|e| CardError::Export(format!("Invalid font {}: {}", font, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_cache_uses_bitmap() {
        let cache = FontCache::offline();
        assert!(!cache.is_cached().await);

        let fonts = cache.fonts().await;
        assert!(cache.is_cached().await);
        for font in PostcardFont::ALL {
            assert!(!fonts.is_loaded(font));
            assert!(!fonts.typeface(font).is_outline());
        }
    }

    #[tokio::test]
    async fn test_fonts_are_shared_until_cleared() {
        let cache = FontCache::offline();
        let first = cache.fonts().await;
        let second = cache.fonts().await;
        assert!(Arc::ptr_eq(&first, &second));

        cache.clear().await;
        assert!(!cache.is_cached().await);
        let third = cache.fonts().await;
        assert!(!Arc::ptr_eq(&first, &third));
    }
}
