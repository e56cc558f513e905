//! Re-encoding source images to progressive JPEG with a blurhash placeholder.

use async_trait::async_trait;
use jpeg_encoder::{ColorType, Encoder};

use crate::error::AppError;

/// An encoded asset ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub blurhash: String,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait ImageEncoder: Send + Sync {
    async fn encode(&self, source: Vec<u8>) -> Result<EncodedImage, AppError>;
}

/// Progressive JPEG encoder computing the blurhash on a small thumbnail.
#[derive(Debug, Clone, Copy)]
pub struct JpegBlurhashEncoder {
    pub quality: u8,
    pub components_x: u32,
    pub components_y: u32,
    /// Longest thumbnail edge fed to the blurhash.
    pub thumbnail_edge: u32,
}

impl Default for JpegBlurhashEncoder {
    fn default() -> Self {
        Self {
            quality: 100,
            components_x: 4,
            components_y: 4,
            thumbnail_edge: 64,
        }
    }
}

impl JpegBlurhashEncoder {
    /// Blocking body of [`ImageEncoder::encode`].
    pub fn encode_blocking(&self, source: &[u8]) -> Result<EncodedImage, AppError> {
        let decoded =
            image::load_from_memory(source).map_err(|e| AppError::Image(e.to_string()))?;
        let rgb = decoded.to_rgb8();
        let dimension = |value: u32| {
            u16::try_from(value)
                .map_err(|_| AppError::Image(format!("{}px exceeds the JPEG size limit", value)))
        };
        let (width, height) = (dimension(rgb.width())?, dimension(rgb.height())?);

        let mut bytes = Vec::new();
        let mut encoder = Encoder::new(&mut bytes, self.quality);
        encoder.set_progressive(true);
        encoder
            .encode(rgb.as_raw(), width, height, ColorType::Rgb)
            .map_err(|e| AppError::Image(e.to_string()))?;

        let thumbnail = decoded
            .thumbnail(self.thumbnail_edge, self.thumbnail_edge)
            .to_rgba8();
        let blurhash = blurhash::encode(
            self.components_x,
            self.components_y,
            thumbnail.width(),
            thumbnail.height(),
            thumbnail.as_raw(),
        )
        .map_err(|e| AppError::Image(e.to_string()))?;

        Ok(EncodedImage {
            bytes,
            blurhash,
            width: decoded.width(),
            height: decoded.height(),
        })
    }
}

#[async_trait]
impl ImageEncoder for JpegBlurhashEncoder {
    async fn encode(&self, source: Vec<u8>) -> Result<EncodedImage, AppError> {
        let encoder = *self;
        tokio::task::spawn_blocking(move || encoder.encode_blocking(&source))
            .await
            .map_err(|e| AppError::Internal(format!("encoder task failed: {}", e)))?
    }
}
