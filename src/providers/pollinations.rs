use crate::{
    error::{AnimationError, Result},
    models::{GenerationParams, GenerationResult},
    providers::{check_status, image_data_uri, ImageProvider},
};
use async_trait::async_trait;
use reqwest::{Client, Url};

/// Unauthenticated fallback. Frames are rendered on GET of the prompt URL; the image body
/// comes back embedded as a data URI.
#[derive(Clone)]
pub struct PollinationsClient {
    client: Client,
    base_url: String,
}

impl PollinationsClient {
    pub fn new() -> Self {
        Self::with_client(
            Client::new(),
            crate::config::DEFAULT_POLLINATIONS_BASE_URL,
        )
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn image_url(&self, params: &GenerationParams) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AnimationError::ConfigError(format!("Invalid pollinations URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| AnimationError::ConfigError("Pollinations URL cannot be a base".into()))?
            .pop_if_empty()
            .push("prompt")
            .push(&params.prompt);

        url.query_pairs_mut()
            .append_pair("width", &params.width.to_string())
            .append_pair("height", &params.height.to_string())
            .append_pair("seed", &params.seed.to_string())
            .append_pair("negative", &params.negative_prompt)
            .append_pair("nologo", "true");

        Ok(url)
    }
}

impl Default for PollinationsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageProvider for PollinationsClient {
    fn name(&self) -> &'static str {
        "pollinations"
    }

    async fn generate(&self, params: GenerationParams) -> Result<GenerationResult> {
        let url = self.image_url(&params)?;
        log::debug!("Fetching pollinations frame for seed {}", params.seed);

        let response = self.client.get(url).send().await.map_err(|e| {
            AnimationError::ProviderError(format!("pollinations request failed: {}", e))
        })?;

        let response = check_status(self.name(), response).await?;
        Ok(GenerationResult {
            result_url: image_data_uri(self.name(), response).await?,
        })
    }
}
