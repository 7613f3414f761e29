use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AnimationError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    /// One of the concurrent frame jobs failed; the whole join is discarded.
    #[error("Failed to generate animation frames: {0}")]
    FrameGenerationError(String),

    /// Decode, quantize or encode failed while assembling the GIF.
    #[error("Failed to assemble animation: {0}")]
    EncodingError(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Animation exceeded its time budget of {}s", .0.as_secs())]
    BudgetExceeded(Duration),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

impl AnimationError {
    /// Prefixes an assembly failure with the frame it came from.
    pub fn in_frame(self, index: usize) -> Self {
        match self {
            AnimationError::EncodingError(msg) => {
                AnimationError::EncodingError(format!("frame {}: {}", index, msg))
            }
            other => other,
        }
    }
}

impl From<reqwest::Error> for AnimationError {
    fn from(err: reqwest::Error) -> Self {
        AnimationError::ProviderError(err.to_string())
    }
}

impl From<image::ImageError> for AnimationError {
    fn from(err: image::ImageError) -> Self {
        AnimationError::EncodingError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnimationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failure_point() {
        let frame = AnimationError::FrameGenerationError("frame 2: timeout".into());
        assert!(frame.to_string().contains("generate animation frames"));

        let encode = AnimationError::EncodingError("bad png".into());
        assert!(encode.to_string().contains("assemble animation"));
    }

    #[test]
    fn test_budget_message() {
        let err = AnimationError::BudgetExceeded(Duration::from_secs(90));
        assert_eq!(err.to_string(), "Animation exceeded its time budget of 90s");
    }
}
