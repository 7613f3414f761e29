use std::collections::HashMap;
use std::env;
use std::time::Duration;

pub const DEFAULT_FAL_BASE_URL: &str = "https://fal.run";
pub const DEFAULT_FAL_MODEL: &str = "fal-ai/flux/dev";
pub const DEFAULT_HF_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_HF_MODEL: &str = "black-forest-labs/FLUX.1-schnell";
pub const DEFAULT_POLLINATIONS_BASE_URL: &str = "https://image.pollinations.ai";

#[derive(Debug, Clone)]
pub struct FalConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub token: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct PollinationsConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub fal: FalConfig,
    pub huggingface: HuggingFaceConfig,
    pub pollinations: PollinationsConfig,
}

#[derive(Debug, Clone)]
pub struct TenancyConfig {
    pub multi_tenant: bool,
    /// Bearer token -> user id.
    pub session_tokens: HashMap<String, String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: Option<u16>,
    pub providers: ProviderConfig,
    pub tenancy: TenancyConfig,
    /// Wall-clock budget for a whole animation request. `None` disables it.
    pub request_budget: Option<Duration>,
    pub log_json: bool,
    pub log_file: Option<String>,
}

impl Default for FalConfig {
    fn default() -> Self {
        FalConfig {
            api_key: None,
            model: DEFAULT_FAL_MODEL.to_string(),
            base_url: DEFAULT_FAL_BASE_URL.to_string(),
        }
    }
}

impl FalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        FalConfig {
            api_key: non_empty_var("FAL_KEY"),
            model: non_empty_var("FAL_MODEL").unwrap_or(defaults.model),
            base_url: non_empty_var("FAL_BASE_URL").unwrap_or(defaults.base_url),
        }
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        HuggingFaceConfig {
            token: None,
            model: DEFAULT_HF_MODEL.to_string(),
            base_url: DEFAULT_HF_BASE_URL.to_string(),
        }
    }
}

impl HuggingFaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        HuggingFaceConfig {
            token: non_empty_var("HF_TOKEN"),
            model: non_empty_var("HF_MODEL").unwrap_or(defaults.model),
            base_url: non_empty_var("HF_BASE_URL").unwrap_or(defaults.base_url),
        }
    }

    pub fn with_credentials(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for PollinationsConfig {
    fn default() -> Self {
        PollinationsConfig {
            base_url: DEFAULT_POLLINATIONS_BASE_URL.to_string(),
        }
    }
}

impl PollinationsConfig {
    pub fn from_env() -> Self {
        PollinationsConfig {
            base_url: non_empty_var("POLLINATIONS_BASE_URL")
                .unwrap_or_else(|| DEFAULT_POLLINATIONS_BASE_URL.to_string()),
        }
    }
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        ProviderConfig {
            fal: FalConfig::from_env(),
            huggingface: HuggingFaceConfig::from_env(),
            pollinations: PollinationsConfig::from_env(),
        }
    }

    pub fn with_fal(mut self, config: FalConfig) -> Self {
        self.fal = config;
        self
    }

    pub fn with_huggingface(mut self, config: HuggingFaceConfig) -> Self {
        self.huggingface = config;
        self
    }

    pub fn with_pollinations(mut self, config: PollinationsConfig) -> Self {
        self.pollinations = config;
        self
    }
}

impl Default for TenancyConfig {
    fn default() -> Self {
        TenancyConfig {
            multi_tenant: false,
            session_tokens: HashMap::new(),
            rate_limit_requests: 10,
            rate_limit_window: Duration::from_secs(60),
        }
    }
}

impl TenancyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let multi_tenant = env::var("MULTI_TENANT")
            .ok()
            .map_or(false, |val| val == "true");
        let session_tokens = non_empty_var("SESSION_TOKENS")
            .map(|raw| parse_session_tokens(&raw))
            .unwrap_or_default();
        let rate_limit_requests = env::var("RATE_LIMIT_REQUESTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.rate_limit_requests);
        let rate_limit_window = env::var("RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.rate_limit_window);

        TenancyConfig {
            multi_tenant,
            session_tokens,
            rate_limit_requests,
            rate_limit_window,
        }
    }

    pub fn with_session(mut self, user_id: impl Into<String>, token: impl Into<String>) -> Self {
        self.multi_tenant = true;
        self.session_tokens.insert(token.into(), user_id.into());
        self
    }

    pub fn with_rate_limit(mut self, requests: u32, window: Duration) -> Self {
        self.rate_limit_requests = requests;
        self.rate_limit_window = window;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: None,
            providers: ProviderConfig::default(),
            tenancy: TenancyConfig::default(),
            request_budget: Some(Duration::from_secs(120)),
            log_json: false,
            log_file: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let request_budget = match env::var("ANIMATION_BUDGET_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.request_budget,
        };

        Config {
            host: non_empty_var("HOST").unwrap_or(defaults.host),
            port,
            providers: ProviderConfig::from_env(),
            tenancy: TenancyConfig::from_env(),
            request_budget,
            log_json: env::var("LOG_FORMAT").ok().map_or(false, |val| val == "json"),
            log_file: non_empty_var("LOG_FILE"),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_providers(mut self, providers: ProviderConfig) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_tenancy(mut self, tenancy: TenancyConfig) -> Self {
        self.tenancy = tenancy;
        self
    }

    pub fn with_request_budget(mut self, budget: Option<Duration>) -> Self {
        self.request_budget = budget;
        self
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses `user:token,user:token` into a token -> user map. Malformed pairs are skipped.
fn parse_session_tokens(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (user, token) = pair.split_once(':')?;
            let (user, token) = (user.trim(), token.trim());
            if user.is_empty() || token.is_empty() {
                None
            } else {
                Some((token.to_string(), user.to_string()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_tokens() {
        let tokens = parse_session_tokens("alice:tok-a, bob:tok-b,broken,:nouser");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens.get("tok-a").map(String::as_str), Some("alice"));
        assert_eq!(tokens.get("tok-b").map(String::as_str), Some("bob"));
    }

    #[test]
    fn test_builders() {
        let config = Config::new()
            .with_port(9000)
            .with_request_budget(None)
            .with_providers(
                ProviderConfig::new().with_fal(FalConfig::new().with_credentials("key")),
            )
            .with_tenancy(TenancyConfig::new().with_session("alice", "tok"));

        assert_eq!(config.port, Some(9000));
        assert!(config.request_budget.is_none());
        assert_eq!(config.providers.fal.api_key.as_deref(), Some("key"));
        assert_eq!(config.providers.fal.model, DEFAULT_FAL_MODEL);
        assert!(config.tenancy.multi_tenant);
    }
}
