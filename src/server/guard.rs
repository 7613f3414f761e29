use crate::{
    config::TenancyConfig,
    error::{AnimationError, Result},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Maps an `Authorization` header to a user id.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, authorization: Option<&str>) -> Result<String>;
}

/// Per-user request quota.
pub trait RateLimiter: Send + Sync {
    fn check(&self, user_id: &str) -> Result<()>;
}

pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Sessions from a fixed token table, usually `SESSION_TOKENS`.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenSessions {
    tokens: HashMap<String, String>,
}

impl StaticTokenSessions {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }
}

impl SessionResolver for StaticTokenSessions {
    fn resolve(&self, authorization: Option<&str>) -> Result<String> {
        let header = authorization
            .ok_or_else(|| AnimationError::Unauthorized("Missing Authorization header".into()))?;

        let token = bearer_token(header).ok_or_else(|| {
            AnimationError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            )
        })?;

        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AnimationError::Unauthorized("Unknown or expired session".into()))
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Allows `max_requests` per user in each fixed window.
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    counters: Mutex<HashMap<String, Window>>,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn check_at(&self, user_id: &str, now: Instant) -> Result<()> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| AnimationError::ConfigError("Rate limiter state is poisoned".into()))?;

        let window = counters.entry(user_id.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count >= self.max_requests {
            let remaining = self
                .window
                .saturating_sub(now.saturating_duration_since(window.started));
            let retry_after_secs = remaining.as_secs_f64().ceil().max(1.0) as u64;
            log::warn!(
                "Rate limit hit for {} ({} requests per {}s)",
                user_id,
                self.max_requests,
                self.window.as_secs()
            );
            return Err(AnimationError::RateLimited { retry_after_secs });
        }

        window.count += 1;
        Ok(())
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self, user_id: &str) -> Result<()> {
        self.check_at(user_id, Instant::now())
    }
}

/// Session lookup followed by the rate limiter, consulted only in multi-tenant mode.
#[derive(Clone)]
pub struct TenantGuard {
    sessions: Arc<dyn SessionResolver>,
    limiter: Arc<dyn RateLimiter>,
}

impl TenantGuard {
    pub fn new(sessions: Arc<dyn SessionResolver>, limiter: Arc<dyn RateLimiter>) -> Self {
        Self { sessions, limiter }
    }

    /// `None` unless the deployment is multi-tenant.
    pub fn from_config(config: &TenancyConfig) -> Option<Self> {
        if !config.multi_tenant {
            return None;
        }
        Some(Self::new(
            Arc::new(StaticTokenSessions::new(config.session_tokens.clone())),
            Arc::new(FixedWindowRateLimiter::new(
                config.rate_limit_requests,
                config.rate_limit_window,
            )),
        ))
    }

    pub fn authorize(&self, authorization: Option<&str>) -> Result<String> {
        let user_id = self.sessions.resolve(authorization)?;
        self.limiter.check(&user_id)?;
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_static_sessions() {
        let sessions = StaticTokenSessions::default().with_token("t-1", "alice");

        assert_eq!(sessions.resolve(Some("Bearer t-1")).unwrap(), "alice");
        assert!(matches!(
            sessions.resolve(None),
            Err(AnimationError::Unauthorized(_))
        ));
        assert!(matches!(
            sessions.resolve(Some("Bearer nope")),
            Err(AnimationError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_fixed_window() {
        let limiter = FixedWindowRateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("alice", start).is_ok());
        assert!(limiter.check_at("alice", start + Duration::from_secs(1)).is_ok());

        match limiter.check_at("alice", start + Duration::from_secs(20)) {
            Err(AnimationError::RateLimited { retry_after_secs }) => {
                assert_eq!(retry_after_secs, 40)
            }
            other => panic!("expected rate limit, got {:?}", other),
        }

        // Other users have their own counters.
        assert!(limiter.check_at("bob", start + Duration::from_secs(20)).is_ok());
        // A new window resets the count.
        assert!(limiter.check_at("alice", start + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn test_guard_disabled_when_single_tenant() {
        assert!(TenantGuard::from_config(&TenancyConfig::default()).is_none());

        let config = TenancyConfig::default()
            .with_session("alice", "t-1")
            .with_rate_limit(1, Duration::from_secs(60));
        let guard = TenantGuard::from_config(&config).unwrap();

        assert_eq!(guard.authorize(Some("Bearer t-1")).unwrap(), "alice");
        assert!(matches!(
            guard.authorize(Some("Bearer t-1")),
            Err(AnimationError::RateLimited { .. })
        ));
    }
}
