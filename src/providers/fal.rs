use crate::{
    error::{AnimationError, Result},
    models::{FalImageResponse, GenerationParams, GenerationResult, Quality},
    providers::{check_status, ImageProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Paid, highest-fidelity provider. Returns hosted image URLs.
#[derive(Clone)]
pub struct FalClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl FalClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_client(
            Client::new(),
            api_key.into(),
            model.into(),
            crate::config::DEFAULT_FAL_BASE_URL.to_string(),
        )
    }

    pub fn with_client(client: Client, api_key: String, model: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn payload(&self, params: &GenerationParams) -> serde_json::Value {
        let steps = match params.quality {
            Quality::Hd => 40,
            Quality::Standard => 28,
        };
        json!({
            "prompt": params.prompt,
            "negative_prompt": params.negative_prompt,
            "seed": params.seed,
            "image_size": {
                "width": params.width,
                "height": params.height
            },
            "num_images": 1,
            "num_inference_steps": steps,
            "enable_safety_checker": true
        })
    }
}

#[async_trait]
impl ImageProvider for FalClient {
    fn name(&self) -> &'static str {
        "fal"
    }

    async fn generate(&self, params: GenerationParams) -> Result<GenerationResult> {
        log::debug!("Generating image with {} (seed {})", self.model, params.seed);

        let response = self
            .client
            .post(format!("{}/{}", self.base_url, self.model))
            .header(reqwest::header::AUTHORIZATION, format!("Key {}", self.api_key))
            .json(&self.payload(&params))
            .send()
            .await
            .map_err(|e| AnimationError::ProviderError(format!("fal request failed: {}", e)))?;

        let response = check_status(self.name(), response).await?;
        let body: FalImageResponse = response
            .json()
            .await
            .map_err(|e| AnimationError::ProviderError(format!("fal response: {}", e)))?;

        let image = body
            .images
            .into_iter()
            .next()
            .ok_or_else(|| AnimationError::ProviderError("fal returned no images".into()))?;

        Ok(GenerationResult {
            result_url: image.url,
        })
    }
}
