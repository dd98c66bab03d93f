//! # Card Exporter
//!
//! Turns a [`PostcardRecord`] into downloadable images of its faces.
//!
//! ## Architecture
//!
//! ```text
//! PostcardRecord ─▶ prepare (async)           ─▶ FaceScene ─▶ Rasterizer (blocking) ─▶ encode
//!                    - FontCache: TTFs, once                   800×600 × density        PNG/JPEG
//!                      per session
//!                    - ImageLoader: artwork
//! ```
//!
//! Exports never look at the on-screen preview (flip state, viewport): every
//! face is drawn on the same fixed logical canvas, so what is downloaded or
//! shared is always the same picture.
//!
//! Rendering and persisting are separate steps. [`CardExporter::export_face`]
//! returns an [`ExportedImage`]; [`ExportedImage::save`] writes it to disk
//! (the server instead streams it as an attachment).

mod draw;
mod fonts;
mod images;
mod raster;
mod text;

pub use fonts::{CardFonts, DEFAULT_FONT_BASE_URL, FontCache};
pub use images::{ImageLoader, cache_busted};
pub use raster::{CARD_HEIGHT, CARD_WIDTH, CanvasRasterizer, FaceScene, MAX_PIXEL_DENSITY, Rasterizer};
pub use text::Typeface;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::card::{CardFace, PostcardRecord};
use crate::error::CardError;

/// Default pixel density (2× for crisp downloads).
pub const DEFAULT_PIXEL_DENSITY: u32 = 2;

/// Rasterizer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Encoder quality in `0.0..=1.0` (JPEG only; PNG is lossless).
    pub quality: f32,
    /// Device pixels per logical pixel.
    pub pixel_density: u32,
    /// Bypass HTTP caches when remote artwork is first downloaded. Later
    /// exports always reuse that download.
    pub cache_bust: bool,
}

impl Default for RenderOptions {
    /// Download settings.
    fn default() -> Self {
        Self {
            quality: 0.95,
            pixel_density: DEFAULT_PIXEL_DENSITY,
            cache_bust: true,
        }
    }
}

impl RenderOptions {
    /// Settings for images attached to a share.
    pub fn for_share() -> Self {
        Self {
            quality: 0.8,
            pixel_density: DEFAULT_PIXEL_DENSITY,
            cache_bust: false,
        }
    }

    /// Output size in device pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (CARD_WIDTH * self.pixel_density, CARD_HEIGHT * self.pixel_density)
    }
}

/// Output encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }
}

/// An encoded face, ready to download or attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub face: CardFace,
    pub file_name: String,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ExportedImage {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// Write the image into `dir` under its file name.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, CardError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), "saved card face");
        Ok(path)
    }
}

/// Renders card faces for download and sharing.
pub struct CardExporter {
    rasterizer: Arc<dyn Rasterizer>,
    fonts: Arc<FontCache>,
    images: ImageLoader,
    options: RenderOptions,
    format: ExportFormat,
}

impl CardExporter {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, fonts: Arc<FontCache>, client: reqwest::Client) -> Self {
        Self {
            rasterizer,
            fonts,
            images: ImageLoader::new(client),
            options: RenderOptions::default(),
            format: ExportFormat::default(),
        }
    }

    /// Built-in rasterizer with bitmap fonts only. Remote artwork is still
    /// downloaded when a record references it.
    pub fn offline() -> Self {
        Self::new(
            Arc::new(CanvasRasterizer),
            Arc::new(FontCache::offline()),
            reqwest::Client::new(),
        )
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn fonts(&self) -> &Arc<FontCache> {
        &self.fonts
    }

    pub fn images(&self) -> &ImageLoader {
        &self.images
    }

    /// Render one face with the exporter's default options.
    pub async fn export_face(&self, record: &PostcardRecord, face: CardFace) -> Result<ExportedImage, CardError> {
        self.export_face_with(record, face, &self.options).await
    }

    pub async fn export_face_with(
        &self,
        record: &PostcardRecord,
        face: CardFace,
        options: &RenderOptions,
    ) -> Result<ExportedImage, CardError> {
        let scene = self.prepare(record, face, options).await?;
        let rasterizer = self.rasterizer.clone();
        let options = *options;
        let format = self.format;

        tokio::task::spawn_blocking(move || render_and_encode(rasterizer.as_ref(), &scene, &options, format))
            .await
            .map_err(|e| CardError::Export(format!("Render task failed: {}", e)))?
    }

    /// Render front and back side by side.
    pub async fn export_faces(
        &self,
        record: &PostcardRecord,
        options: &RenderOptions,
    ) -> Result<(ExportedImage, ExportedImage), CardError> {
        let front = self.prepare(record, CardFace::Front, options).await?;
        let back = self.prepare(record, CardFace::Back, options).await?;
        let rasterizer = self.rasterizer.clone();
        let options = *options;
        let format = self.format;

        let (front, back) = tokio::task::spawn_blocking(move || {
            rayon::join(
                || render_and_encode(rasterizer.as_ref(), &front, &options, format),
                || render_and_encode(rasterizer.as_ref(), &back, &options, format),
            )
        })
        .await
        .map_err(|e| CardError::Export(format!("Render task failed: {}", e)))?;

        Ok((front?, back?))
    }

    async fn prepare(
        &self,
        record: &PostcardRecord,
        face: CardFace,
        options: &RenderOptions,
    ) -> Result<FaceScene, CardError> {
        let fonts = self.fonts.fonts().await;
        let background = match (face, &record.image) {
            (CardFace::Front, Some(image)) => Some(self.images.load(image, options.cache_bust).await?),
            _ => None,
        };
        Ok(FaceScene {
            face,
            record: record.clone(),
            background,
            fonts,
        })
    }
}

fn render_and_encode(
    rasterizer: &dyn Rasterizer,
    scene: &FaceScene,
    options: &RenderOptions,
    format: ExportFormat,
) -> Result<ExportedImage, CardError> {
    let bitmap = rasterizer.render(scene, options)?;
    let (width, height) = bitmap.dimensions();
    let bytes = encode(bitmap, format, options.quality)?;
    debug!(face = scene.face.name(), width, height, size = bytes.len(), "encoded card face");

    Ok(ExportedImage {
        face: scene.face,
        file_name: scene.face.download_name(scene.record.holiday, format.extension()),
        mime_type: format.mime_type(),
        width,
        height,
        bytes,
    })
}

fn encode(bitmap: RgbaImage, format: ExportFormat, quality: f32) -> Result<Vec<u8>, CardError> {
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => DynamicImage::ImageRgba8(bitmap)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| CardError::Export(format!("PNG encoding failed: {}", e)))?,
        ExportFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(bitmap).to_rgb8();
            let quality = (quality.clamp(0.01, 1.0) * 100.0).round() as u8;
            JpegEncoder::new_with_quality(&mut bytes, quality)
                .encode_image(&rgb)
                .map_err(|e| CardError::Export(format!("JPEG encoding failed: {}", e)))?
        }
    }
    Ok(bytes)
}
