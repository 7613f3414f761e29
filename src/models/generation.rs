use serde::{Deserialize, Serialize};

use super::Quality;

/// One text-to-image call as handed to a provider client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompt: String,
    pub negative_prompt: String,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Hosted `http(s)` URL or an embedded `data:` URI.
    pub result_url: String,
}

#[derive(Serialize, Deserialize)]
pub struct FalImage {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Serialize, Deserialize)]
pub struct FalImageResponse {
    pub images: Vec<FalImage>,
    pub seed: Option<u64>,
}
