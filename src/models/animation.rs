use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Motion category of an animation. Unknown names deserialize to [`AnimationType::Idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnimationType {
    #[default]
    Idle,
    Walk,
    Run,
    Jump,
    Attack,
    Spin,
    Bounce,
    Pulse,
    Wave,
}

impl AnimationType {
    pub const ALL: [AnimationType; 9] = [
        AnimationType::Idle,
        AnimationType::Walk,
        AnimationType::Run,
        AnimationType::Jump,
        AnimationType::Attack,
        AnimationType::Spin,
        AnimationType::Bounce,
        AnimationType::Pulse,
        AnimationType::Wave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationType::Idle => "idle",
            AnimationType::Walk => "walk",
            AnimationType::Run => "run",
            AnimationType::Jump => "jump",
            AnimationType::Attack => "attack",
            AnimationType::Spin => "spin",
            AnimationType::Bounce => "bounce",
            AnimationType::Pulse => "pulse",
            AnimationType::Wave => "wave",
        }
    }

    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }
}

impl From<String> for AnimationType {
    fn from(name: String) -> Self {
        AnimationType::from_name(&name)
    }
}

impl From<AnimationType> for String {
    fn from(kind: AnimationType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AnimationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Infinite,
    Pingpong,
    Once,
}

impl LoopMode {
    /// NETSCAPE2.0 repeat count written on the first frame. `0` loops forever.
    pub fn repeat_count(&self) -> u16 {
        match self {
            LoopMode::Once => 1,
            LoopMode::Infinite | LoopMode::Pingpong => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    Hd,
}

/// Base prompt plus style/asset metadata handed to the prompt synthesizer untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOptions {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl PromptOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// Inbound body of `POST /api/animations`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationRequest {
    #[serde(flatten)]
    pub options: PromptOptions,
    #[serde(default)]
    pub animation_type: Option<AnimationType>,
    #[serde(default)]
    pub frame_count: Option<i64>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default, rename = "loop")]
    pub loop_mode: Option<LoopMode>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub quality: Option<Quality>,
}

impl AnimationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            options: PromptOptions::new(prompt),
            ..Default::default()
        }
    }

    pub fn with_animation_type(mut self, kind: AnimationType) -> Self {
        self.animation_type = Some(kind);
        self
    }

    pub fn with_frame_count(mut self, frames: i64) -> Self {
        self.frame_count = Some(frames);
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn with_loop(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = Some(loop_mode);
        self
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationResponse {
    pub ok: bool,
    /// `data:image/gif;base64,...`
    pub result_url: String,
    pub frame_count: usize,
    pub fps: f64,
    pub duration_ms: u64,
    pub seed: u64,
    pub provider: String,
}
