use crate::models::{AnimationType, PromptOptions};

const BASE_NEGATIVE_PROMPT: &str = "blurry, low quality, watermark, signature, text, \
     cropped, multiple subjects, inconsistent design, deformed, extra limbs";

/// Builds the per-frame text prompts for a frame sequence.
pub trait PromptSynthesizer: Send + Sync {
    /// Shared negative prompt for every frame of the request.
    fn negative_prompt(&self, options: &PromptOptions) -> String;

    fn frame_prompt(
        &self,
        options: &PromptOptions,
        kind: AnimationType,
        index: usize,
        total: usize,
    ) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct TemplatePromptSynthesizer;

impl TemplatePromptSynthesizer {
    pub fn new() -> Self {
        Self
    }

    fn motion_phases(kind: AnimationType) -> &'static [&'static str] {
        match kind {
            AnimationType::Idle => &[
                "standing still, relaxed pose",
                "slight inhale, chest raised",
                "standing still, relaxed pose",
                "slight exhale, shoulders lowered",
            ],
            AnimationType::Walk => &[
                "contact pose, left foot forward",
                "down pose, weight on left leg",
                "passing pose, right leg swinging",
                "up pose, rising on left toes",
                "contact pose, right foot forward",
                "down pose, weight on right leg",
                "passing pose, left leg swinging",
                "up pose, rising on right toes",
            ],
            AnimationType::Run => &[
                "push off, body leaning forward",
                "airborne, legs extended",
                "landing on front foot",
                "crouched mid-stride",
            ],
            AnimationType::Jump => &[
                "crouching, preparing to jump",
                "launching upward, legs extending",
                "at the peak of the jump, tucked",
                "falling, legs reaching down",
                "landing, knees bent",
                "recovering to standing",
            ],
            AnimationType::Attack => &[
                "ready stance",
                "wind-up, weapon drawn back",
                "strike, full extension",
                "follow-through",
                "recovering guard",
            ],
            AnimationType::Spin => &[
                "facing front",
                "turned three-quarters right",
                "facing right side",
                "turned away, back view",
                "facing left side",
                "turned three-quarters left",
            ],
            AnimationType::Bounce => &[
                "resting on the ground, squashed",
                "stretching upward",
                "at the top, round",
                "falling, stretched",
            ],
            AnimationType::Pulse => &[
                "normal size, dim glow",
                "slightly larger, bright glow",
                "largest, brightest glow",
                "slightly smaller, fading glow",
            ],
            AnimationType::Wave => &[
                "arm lowered",
                "arm raised to the side",
                "hand waving left",
                "hand waving right",
            ],
        }
    }

    fn phase(kind: AnimationType, index: usize, total: usize) -> &'static str {
        let phases = Self::motion_phases(kind);
        let total = total.max(1);
        phases[(index * phases.len() / total).min(phases.len() - 1)]
    }
}

impl PromptSynthesizer for TemplatePromptSynthesizer {
    fn negative_prompt(&self, options: &PromptOptions) -> String {
        match options.negative_prompt.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => format!("{}, {}", BASE_NEGATIVE_PROMPT, extra),
            _ => BASE_NEGATIVE_PROMPT.to_string(),
        }
    }

    fn frame_prompt(
        &self,
        options: &PromptOptions,
        kind: AnimationType,
        index: usize,
        total: usize,
    ) -> String {
        let mut parts = vec![options.prompt.trim().to_string()];

        if let Some(asset_type) = &options.asset_type {
            parts.push(format!("{} asset", asset_type));
        }
        if let Some(style) = &options.style {
            parts.push(format!("{} style", style));
        }
        if let Some(palette) = &options.palette {
            parts.push(format!("{} color palette", palette));
        }
        match &options.background {
            Some(background) => parts.push(format!("{} background", background)),
            None => parts.push("plain background".to_string()),
        }

        parts.push(format!("{} animation", kind));
        parts.push(Self::phase(kind, index, total).to_string());
        parts.push(format!("frame {} of {}", index + 1, total));
        parts.push("same character design, same framing, consistent colors".to_string());

        parts.join(", ")
    }
}
