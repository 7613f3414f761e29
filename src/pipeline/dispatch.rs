use crate::{
    error::{AnimationError, Result},
    models::{AnimationType, GenerationParams, PromptOptions, Quality},
    prompt::PromptSynthesizer,
    providers::ImageProvider,
};
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;

/// Offset added to the base seed per frame index.
pub const SEED_STRIDE: u64 = 137;

/// One independent unit of generation work.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameJob {
    pub index: usize,
    pub seed: u64,
    pub prompt: String,
}

pub fn frame_seed(base_seed: u64, index: usize) -> u64 {
    base_seed.wrapping_add((index as u64).wrapping_mul(SEED_STRIDE))
}

pub fn build_jobs(
    synthesizer: &dyn PromptSynthesizer,
    options: &PromptOptions,
    kind: AnimationType,
    frame_count: usize,
    base_seed: u64,
) -> Vec<FrameJob> {
    (0..frame_count)
        .map(|index| FrameJob {
            index,
            seed: frame_seed(base_seed, index),
            prompt: synthesizer.frame_prompt(options, kind, index, frame_count),
        })
        .collect()
}

/// Runs every job against `provider` concurrently and returns the image references in
/// job order.
///
/// The join is all-or-nothing: the first failure (or cancellation) drops the remaining
/// in-flight calls and discards the frames that already succeeded.
pub async fn dispatch_frames(
    provider: &dyn ImageProvider,
    jobs: &[FrameJob],
    negative_prompt: &str,
    resolution: u32,
    quality: Quality,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    log::info!(
        "Dispatching {} frame jobs to {}",
        jobs.len(),
        provider.name()
    );

    let tasks = jobs.iter().map(|job| {
        let params = GenerationParams {
            prompt: job.prompt.clone(),
            negative_prompt: negative_prompt.to_string(),
            seed: job.seed,
            width: resolution,
            height: resolution,
            quality,
        };
        let index = job.index;

        async move {
            let generated = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AnimationError::Cancelled),
                generated = provider.generate(params) => generated,
            };

            match generated {
                Ok(result) => {
                    log::debug!("Frame {} generated", index);
                    Ok(result.result_url)
                }
                Err(e) => {
                    log::warn!("Frame {} failed on {}: {}", index, provider.name(), e);
                    Err(AnimationError::FrameGenerationError(format!(
                        "frame {}: {}",
                        index, e
                    )))
                }
            }
        }
    });

    try_join_all(tasks).await
}
