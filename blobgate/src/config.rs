use blobgate_azure_storage::{
    Config as StorageConfig, MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME,
    MIKROSERVICE_AZURE_STORAGE_SECRET_KEY,
};
use blobgate_bearer_token::{Config as TokenConfig, MIKROSERVICE_JWT_PUBLIC_KEY};
use blobgate_core::{Context, Error, Result};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Env value: total attempts per blob call, first one included.
pub const MIKROSERVICE_GATEWAY_MAX_ATTEMPTS: &str = "MIKROSERVICE_GATEWAY_MAX_ATTEMPTS";
/// Env value: deadline of a single attempt in milliseconds.
pub const MIKROSERVICE_GATEWAY_ATTEMPT_TIMEOUT_MS: &str = "MIKROSERVICE_GATEWAY_ATTEMPT_TIMEOUT_MS";
/// Env value: lifetime of a signature in seconds.
pub const MIKROSERVICE_GATEWAY_SIGNATURE_TTL_SECS: &str = "MIKROSERVICE_GATEWAY_SIGNATURE_TTL_SECS";
/// Env value: `on` to enforce `blob.read` / `blob.write` scopes.
pub const MIKROSERVICE_GATEWAY_REQUIRE_SCOPES: &str = "MIKROSERVICE_GATEWAY_REQUIRE_SCOPES";

/// Whether authorized callers also need a matching scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScopePolicy {
    /// Any valid credential may run any operation.
    #[default]
    Disabled,
    /// Reads need `blob.read`, writes need `blob.write`.
    Require,
}

/// Tunables of the gateway. Immutable once the gateway is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Total attempts per blob call. Never below 1.
    pub max_attempts: usize,
    /// Deadline of one attempt.
    pub attempt_timeout: Duration,
    /// How long a signature stays valid.
    pub signature_ttl: Duration,
    /// First backoff delay.
    pub min_backoff: Duration,
    /// Upper bound of a single backoff delay.
    pub max_backoff: Duration,
    /// Randomize backoff delays.
    pub jitter: bool,
    /// Scope enforcement.
    pub scope_policy: ScopePolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_timeout: Duration::from_secs(10),
            signature_ttl: Duration::from_secs(300),
            min_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            jitter: true,
            scope_policy: ScopePolicy::Disabled,
        }
    }
}

impl Options {
    /// Load options from env, falling back to defaults for unset values.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let mut options = Self::default();

        if let Some(v) = parse_env::<usize>(ctx, MIKROSERVICE_GATEWAY_MAX_ATTEMPTS)? {
            if v == 0 {
                return Err(Error::config_invalid(format!(
                    "{MIKROSERVICE_GATEWAY_MAX_ATTEMPTS} must be at least 1"
                )));
            }
            options.max_attempts = v;
        }
        if let Some(v) = parse_env::<u64>(ctx, MIKROSERVICE_GATEWAY_ATTEMPT_TIMEOUT_MS)? {
            options.attempt_timeout = Duration::from_millis(v);
        }
        if let Some(v) = parse_env::<u64>(ctx, MIKROSERVICE_GATEWAY_SIGNATURE_TTL_SECS)? {
            if v == 0 {
                return Err(Error::config_invalid(format!(
                    "{MIKROSERVICE_GATEWAY_SIGNATURE_TTL_SECS} must be at least 1"
                )));
            }
            options.signature_ttl = Duration::from_secs(v);
        }
        if let Some(v) = ctx.env_var_non_empty(MIKROSERVICE_GATEWAY_REQUIRE_SCOPES) {
            options.scope_policy = match v.trim().to_ascii_lowercase().as_str() {
                "on" | "true" | "1" => ScopePolicy::Require,
                "off" | "false" | "0" => ScopePolicy::Disabled,
                _ => {
                    return Err(Error::config_invalid(format!(
                        "{MIKROSERVICE_GATEWAY_REQUIRE_SCOPES} must be on or off, got {v:?}"
                    )))
                }
            };
        }

        Ok(options)
    }

    /// Set the total number of attempts, clamped to at least 1.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the per attempt deadline.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Set the signature lifetime.
    pub fn with_signature_ttl(mut self, ttl: Duration) -> Self {
        self.signature_ttl = ttl;
        self
    }

    /// Set the backoff bounds.
    pub fn with_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.min_backoff = min;
        self.max_backoff = max;
        self
    }

    /// Enable or disable backoff jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set the scope policy.
    pub fn with_scope_policy(mut self, policy: ScopePolicy) -> Self {
        self.scope_policy = policy;
        self
    }
}

fn parse_env<T>(ctx: &Context, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = ctx.env_var_non_empty(key) else {
        return Ok(None);
    };

    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| Error::config_invalid(format!("{key} is invalid: {e}")))
}

/// Everything the gateway needs at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Token verification settings.
    pub token: TokenConfig,
    /// Storage account settings.
    pub storage: StorageConfig,
    /// Gateway tunables.
    pub options: Options,
}

impl Settings {
    /// Load settings from env.
    ///
    /// Fails with `ConfigMissing` naming the first required value that is absent.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let token = TokenConfig::default().from_env(ctx);
        if token.public_key.is_none() {
            return Err(missing(MIKROSERVICE_JWT_PUBLIC_KEY));
        }

        let storage = StorageConfig::default().from_env(ctx);
        if storage.account_name.is_none() {
            return Err(missing(MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME));
        }
        if storage.account_key.is_none() {
            return Err(missing(MIKROSERVICE_AZURE_STORAGE_SECRET_KEY));
        }

        Ok(Self {
            token,
            storage,
            options: Options::from_env(ctx)?,
        })
    }
}

fn missing(key: &str) -> Error {
    Error::config_missing(format!("{key} is not set"))
}
