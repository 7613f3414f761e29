pub mod animation_spec;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod providers;

#[cfg(feature = "server")]
pub mod server;

pub use config::{Config, ProviderConfig, TenancyConfig};
pub use error::{AnimationError, Result};
pub use models::*;
pub use pipeline::{AnimationPipeline, AnimationPlan};
pub use prompt::{PromptSynthesizer, TemplatePromptSynthesizer};
pub use providers::{ImageProvider, ProviderChain};
