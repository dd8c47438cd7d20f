use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 60;

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|val| {
        let val = val.trim();
        val.eq_ignore_ascii_case("true") || val == "1"
    })
}

/// Routing policy flags. Read once at startup and shared read-only by every
/// `generate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    /// Global kill-switch: when set, every request goes to the default provider
    /// regardless of entitlement.
    pub premium_kill_switch: bool,
    /// Premium rollout flag; entitled callers only reach the premium provider
    /// while this is on.
    pub premium_rollout: bool,
    pub fallback_enabled: bool,
    /// Run the default provider's own `validate_prompt` before a fallback attempt.
    pub revalidate_on_fallback: bool,
    /// Upper bound for each provider call (validation, generation, fallback).
    pub attempt_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            premium_kill_switch: false,
            premium_rollout: true,
            fallback_enabled: true,
            revalidate_on_fallback: false,
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
        }
    }
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let attempt_timeout = env::var("SOLEGEN_ATTEMPT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.attempt_timeout);

        RouterConfig {
            premium_kill_switch: env_flag("SOLEGEN_PREMIUM_DISABLED")
                .unwrap_or(defaults.premium_kill_switch),
            premium_rollout: env_flag("SOLEGEN_PREMIUM_ROLLOUT").unwrap_or(defaults.premium_rollout),
            fallback_enabled: env_flag("SOLEGEN_FALLBACK_ENABLED")
                .unwrap_or(defaults.fallback_enabled),
            revalidate_on_fallback: env_flag("SOLEGEN_REVALIDATE_ON_FALLBACK")
                .unwrap_or(defaults.revalidate_on_fallback),
            attempt_timeout,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.attempt_timeout.is_zero() {
            return Err(Error::Config("attempt timeout must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn with_premium_kill_switch(mut self, enabled: bool) -> Self {
        self.premium_kill_switch = enabled;
        self
    }

    pub fn with_premium_rollout(mut self, enabled: bool) -> Self {
        self.premium_rollout = enabled;
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    pub fn with_revalidate_on_fallback(mut self, enabled: bool) -> Self {
        self.revalidate_on_fallback = enabled;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct BedrockConfig {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub model_id: Option<String>,
}

impl BedrockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let region = env::var("AWS_REGION")
            .or_else(|_| env::var("AWS_DEFAULT_REGION"))
            .ok();
        let access_key = env::var("AWS_ACCESS_KEY_ID").ok();
        let secret_key = env::var("AWS_SECRET_ACCESS_KEY").ok();
        let model_id = env::var("BEDROCK_IMAGE_MODEL_ID").ok();

        BedrockConfig {
            region,
            access_key,
            secret_key,
            model_id,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct StabilityConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub engine: Option<String>,
}

impl StabilityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        StabilityConfig {
            api_key: env::var("STABILITY_API_KEY").ok(),
            base_url: env::var("STABILITY_BASE_URL").ok(),
            engine: env::var("STABILITY_ENGINE").ok(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct PollinationsConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl PollinationsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        PollinationsConfig {
            base_url: env::var("POLLINATIONS_BASE_URL").ok(),
            model: env::var("POLLINATIONS_MODEL").ok(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
