pub mod fal;
pub mod huggingface;
pub mod pollinations;

use crate::{
    config::ProviderConfig,
    error::{AnimationError, Result},
    models::{GenerationParams, GenerationResult, Quality},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

pub use fal::FalClient;
pub use huggingface::HuggingFaceClient;
pub use pollinations::PollinationsClient;

#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, params: GenerationParams) -> Result<GenerationResult>;
}

type Predicate = Arc<dyn Fn(Quality) -> bool + Send + Sync>;

#[derive(Clone)]
struct ProviderEntry {
    predicate: Predicate,
    provider: Arc<dyn ImageProvider>,
}

/// Ordered `(predicate, provider)` list; the first matching entry serves the whole request.
#[derive(Clone, Default)]
pub struct ProviderChain {
    entries: Vec<ProviderEntry>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paid provider for `hd` when keyed, then the token-gated provider, then the open fallback.
    pub fn from_config(config: &ProviderConfig, http: &reqwest::Client) -> Self {
        let mut chain = Self::new();

        if let Some(api_key) = &config.fal.api_key {
            chain = chain.with_provider(
                |quality| quality == Quality::Hd,
                Arc::new(FalClient::with_client(
                    http.clone(),
                    api_key.clone(),
                    config.fal.model.clone(),
                    config.fal.base_url.clone(),
                )),
            );
        }

        if let Some(token) = &config.huggingface.token {
            chain = chain.with_provider(
                |_| true,
                Arc::new(HuggingFaceClient::with_client(
                    http.clone(),
                    token.clone(),
                    config.huggingface.model.clone(),
                    config.huggingface.base_url.clone(),
                )),
            );
        }

        chain.with_provider(
            |_| true,
            Arc::new(PollinationsClient::with_client(
                http.clone(),
                config.pollinations.base_url.clone(),
            )),
        )
    }

    pub fn with_provider<F>(mut self, predicate: F, provider: Arc<dyn ImageProvider>) -> Self
    where
        F: Fn(Quality) -> bool + Send + Sync + 'static,
    {
        self.entries.push(ProviderEntry {
            predicate: Arc::new(predicate),
            provider,
        });
        self
    }

    pub fn select(&self, quality: Quality) -> Result<Arc<dyn ImageProvider>> {
        self.entries
            .iter()
            .find(|entry| (entry.predicate)(quality))
            .map(|entry| Arc::clone(&entry.provider))
            .ok_or_else(|| {
                AnimationError::ConfigError(format!(
                    "No image provider available for {:?} quality",
                    quality
                ))
            })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.provider.name()).collect()
    }
}

/// Maps a non-2xx provider response to a [`AnimationError::ProviderError`].
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AnimationError::ProviderError(format!(
        "{} returned {}: {}",
        provider,
        status.as_u16(),
        body.chars().take(300).collect::<String>()
    )))
}

/// Reads a raw image body into a `data:` URI, keeping the served image type.
pub(crate) async fn image_data_uri(provider: &str, response: reqwest::Response) -> Result<String> {
    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("image/"))
        .unwrap_or("image/png")
        .to_string();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AnimationError::ProviderError(format!("{} body: {}", provider, e)))?;
    if bytes.is_empty() {
        return Err(AnimationError::ProviderError(format!(
            "{} returned an empty image",
            provider
        )));
    }

    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(&bytes)))
}
