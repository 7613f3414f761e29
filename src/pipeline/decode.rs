use crate::error::{AnimationError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::try_join_all;
use image::imageops::FilterType;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

/// Turns provider image references into `size x size` RGBA8 buffers.
#[derive(Clone, Default)]
pub struct RasterDecoder {
    client: Client,
}

impl RasterDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Loads the encoded bytes behind a `data:` URI or an `http(s)` URL.
    pub async fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        if reference.starts_with("data:") {
            return decode_data_uri(reference);
        }
        if !(reference.starts_with("http://") || reference.starts_with("https://")) {
            return Err(AnimationError::EncodingError(format!(
                "Unsupported image reference: {}",
                reference.chars().take(64).collect::<String>()
            )));
        }

        let response = self
            .client
            .get(reference)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AnimationError::EncodingError(format!("Failed to fetch frame: {}", e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AnimationError::EncodingError(format!("Failed to read frame: {}", e)))?;

        Ok(bytes.to_vec())
    }

    /// Fetches `reference` and rasterizes it on the blocking pool.
    pub async fn decode(&self, reference: &str, size: u32) -> Result<Vec<u8>> {
        let bytes = self.fetch(reference).await?;
        tokio::task::spawn_blocking(move || rasterize(&bytes, size))
            .await
            .map_err(|e| AnimationError::EncodingError(format!("Decode task failed: {}", e)))?
    }

    /// Decodes every reference concurrently, preserving order. Any failure fails the batch.
    pub async fn decode_all(
        &self,
        references: &[String],
        size: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<u8>>> {
        let tasks = references.iter().enumerate().map(|(index, reference)| async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AnimationError::Cancelled),
                decoded = self.decode(reference, size) => decoded.map_err(|e| e.in_frame(index)),
            }
        });

        try_join_all(tasks).await
    }
}

pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (header, payload) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| AnimationError::EncodingError("Malformed data URI".into()))?;

    if !header.ends_with(";base64") {
        return Err(AnimationError::EncodingError(
            "Only base64 data URIs are supported".into(),
        ));
    }

    STANDARD
        .decode(payload.trim())
        .map_err(|e| AnimationError::EncodingError(format!("Invalid base64 image data: {}", e)))
}

/// Decodes any supported format, resizes with nearest-neighbor to `size x size` and
/// returns straight RGBA8 with alpha always present.
pub fn rasterize(bytes: &[u8], size: u32) -> Result<Vec<u8>> {
    let image = image::load_from_memory(bytes)?;
    let resized = image.resize_exact(size, size, FilterType::Nearest);
    Ok(resized.to_rgba8().into_raw())
}
