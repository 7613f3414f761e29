pub mod decode;
pub mod dispatch;
pub mod gif;
pub mod lzw;
pub mod quantize;
pub mod seed;
pub mod sequence;

use crate::{
    animation_spec,
    config::Config,
    error::{AnimationError, Result},
    logger,
    models::{AnimationRequest, AnimationResponse, AnimationType, LoopMode, PromptOptions, Quality},
    prompt::{PromptSynthesizer, TemplatePromptSynthesizer},
    providers::{ImageProvider, ProviderChain},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use decode::RasterDecoder;
use seed::{RandomSeedSource, SeedSource};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const MIN_FRAME_COUNT: i64 = 2;
pub const MAX_FRAME_COUNT: i64 = 12;
pub const MIN_SIZE: i64 = 32;
pub const MAX_SIZE: i64 = 256;
pub const DEFAULT_SIZE: i64 = 128;

/// Square resolution requested from providers before downscaling.
pub fn generation_resolution(quality: Quality) -> u32 {
    match quality {
        Quality::Standard => 512,
        Quality::Hd => 1024,
    }
}

pub fn clamp_frame_count(requested: i64) -> usize {
    requested.clamp(MIN_FRAME_COUNT, MAX_FRAME_COUNT) as usize
}

pub fn clamp_size(requested: i64) -> u32 {
    requested.clamp(MIN_SIZE, MAX_SIZE) as u32
}

/// Everything resolved from a request before any network call is made.
#[derive(Clone)]
pub struct AnimationPlan {
    pub kind: AnimationType,
    pub options: PromptOptions,
    pub frame_count: usize,
    pub fps: f64,
    pub loop_mode: LoopMode,
    pub size: u32,
    pub base_seed: u64,
    pub quality: Quality,
    pub provider: Arc<dyn ImageProvider>,
}

/// Drives one animation request from validation to the encoded GIF.
#[derive(Clone)]
pub struct AnimationPipeline {
    providers: ProviderChain,
    synthesizer: Arc<dyn PromptSynthesizer>,
    seeds: Arc<dyn SeedSource>,
    decoder: RasterDecoder,
    budget: Option<Duration>,
}

impl AnimationPipeline {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::new();
        Self {
            providers: ProviderChain::from_config(&config.providers, &http),
            synthesizer: Arc::new(TemplatePromptSynthesizer::new()),
            seeds: Arc::new(RandomSeedSource),
            decoder: RasterDecoder::with_client(http),
            budget: config.request_budget,
        }
    }

    pub fn with_providers(mut self, providers: ProviderChain) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn PromptSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_seed_source(mut self, seeds: Arc<dyn SeedSource>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn with_decoder(mut self, decoder: RasterDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.budget = budget;
        self
    }

    pub fn providers(&self) -> &ProviderChain {
        &self.providers
    }

    /// Validates the request and resolves every default, the base seed and the provider.
    pub fn plan(&self, request: &AnimationRequest) -> Result<AnimationPlan> {
        let prompt = request.options.prompt.trim();
        if prompt.is_empty() {
            return Err(AnimationError::ValidationError(
                "prompt must not be empty".into(),
            ));
        }

        let kind = request
            .animation_type
            .unwrap_or(animation_spec::DEFAULT_ANIMATION_TYPE);
        let defaults = animation_spec::resolve(kind);

        let frame_count = request
            .frame_count
            .map(clamp_frame_count)
            .unwrap_or_else(|| clamp_frame_count(defaults.total_frames as i64));
        let fps = request
            .fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .unwrap_or(defaults.fps);
        let size = clamp_size(request.size.unwrap_or(DEFAULT_SIZE));
        let quality = request.quality.unwrap_or_default();

        let base_seed = match request.seed {
            Some(seed) => seed,
            None => self.seeds.next_seed(),
        };
        let provider = self.providers.select(quality)?;

        let mut options = request.options.clone();
        options.prompt = prompt.to_string();

        Ok(AnimationPlan {
            kind,
            options,
            frame_count,
            fps,
            loop_mode: request.loop_mode.unwrap_or_default(),
            size,
            base_seed,
            quality,
            provider,
        })
    }

    /// Runs the whole pipeline. Cancelling `cancel` aborts in-flight provider calls and
    /// fetches; an exhausted budget cancels it and reports [`AnimationError::BudgetExceeded`].
    pub async fn run(
        &self,
        request: &AnimationRequest,
        cancel: CancellationToken,
    ) -> Result<AnimationResponse> {
        let plan = self.plan(request)?;
        log::info!(
            "Animating {} frames of '{}' with {} (seed {}, {}px, {} fps)",
            plan.frame_count,
            plan.kind,
            plan.provider.name(),
            plan.base_seed,
            plan.size,
            plan.fps
        );

        match self.budget {
            Some(budget) => match tokio::time::timeout(budget, self.execute(&plan, &cancel)).await {
                Ok(result) => result,
                Err(_) => {
                    cancel.cancel();
                    log::warn!("Animation aborted after {}s budget", budget.as_secs());
                    Err(AnimationError::BudgetExceeded(budget))
                }
            },
            None => self.execute(&plan, &cancel).await,
        }
    }

    async fn execute(
        &self,
        plan: &AnimationPlan,
        cancel: &CancellationToken,
    ) -> Result<AnimationResponse> {
        let mut timer = logger::timer("animation pipeline");

        let negative_prompt = self.synthesizer.negative_prompt(&plan.options);
        let jobs = dispatch::build_jobs(
            self.synthesizer.as_ref(),
            &plan.options,
            plan.kind,
            plan.frame_count,
            plan.base_seed,
        );
        let references = dispatch::dispatch_frames(
            plan.provider.as_ref(),
            &jobs,
            &negative_prompt,
            generation_resolution(plan.quality),
            plan.quality,
            cancel,
        )
        .await?;

        // Each generated frame is fetched once; ping-pong repeats share the raster.
        let rasters = self.decoder.decode_all(&references, plan.size, cancel).await?;
        let rasters = sequence::expand(rasters, plan.loop_mode);
        let expanded_count = rasters.len();

        let size = plan.size as u16;
        let delay_cs = gif::delay_centiseconds(plan.fps);
        let repeat = plan.loop_mode.repeat_count();
        let encoded = tokio::task::spawn_blocking(move || {
            let frames = quantize::quantize_frames(&rasters, size)?;
            gif::encode_animation(&frames, delay_cs, repeat)
        })
        .await
        .map_err(|e| AnimationError::EncodingError(format!("Encoder task failed: {}", e)))??;

        let elapsed = timer.stop();
        log::info!(
            "Encoded {} frame GIF ({} bytes) in {}ms",
            expanded_count,
            encoded.len(),
            elapsed.as_millis()
        );

        Ok(AnimationResponse {
            ok: true,
            result_url: format!("data:image/gif;base64,{}", STANDARD.encode(&encoded)),
            frame_count: expanded_count,
            fps: plan.fps,
            duration_ms: duration_ms(expanded_count, plan.fps),
            seed: plan.base_seed,
            provider: plan.provider.name().to_string(),
        })
    }
}

pub fn duration_ms(frame_count: usize, fps: f64) -> u64 {
    (frame_count as f64 / fps * 1000.0).round() as u64
}
