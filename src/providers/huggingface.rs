use crate::{
    error::{AnimationError, Result},
    models::{GenerationParams, GenerationResult},
    providers::{check_status, image_data_uri, ImageProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Token-gated inference endpoint. The response body is the raw image, embedded as a data URI.
#[derive(Clone)]
pub struct HuggingFaceClient {
    client: Client,
    token: String,
    model: String,
    base_url: String,
}

impl HuggingFaceClient {
    pub fn new(token: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_client(
            Client::new(),
            token.into(),
            model.into(),
            crate::config::DEFAULT_HF_BASE_URL.to_string(),
        )
    }

    pub fn with_client(client: Client, token: String, model: String, base_url: String) -> Self {
        Self {
            client,
            token,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageProvider for HuggingFaceClient {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn generate(&self, params: GenerationParams) -> Result<GenerationResult> {
        log::debug!("Generating image with {} (seed {})", self.model, params.seed);

        let payload = json!({
            "inputs": params.prompt,
            "parameters": {
                "negative_prompt": params.negative_prompt,
                "seed": params.seed,
                "width": params.width,
                "height": params.height
            },
            "options": { "wait_for_model": true }
        });

        let response = self
            .client
            .post(format!("{}/models/{}", self.base_url, self.model))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "image/png")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                AnimationError::ProviderError(format!("huggingface request failed: {}", e))
            })?;

        let response = check_status(self.name(), response).await?;
        Ok(GenerationResult {
            result_url: image_data_uri(self.name(), response).await?,
        })
    }
}
