use blobgate_core::utils::Redact;
use blobgate_core::{Context, Error, Result};
use std::fmt::{Debug, Formatter};

use crate::constants::*;
use crate::key::{parse_algorithm, PublicKeyMaterial};

/// Config carries the token verification settings.
#[derive(Clone, Default)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Config {
    /// `public_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`MIKROSERVICE_JWT_PUBLIC_KEY`]
    pub public_key: Option<String>,
    /// `algorithm` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`MIKROSERVICE_JWT_ALGORITHM`]
    /// - default to [`DEFAULT_JWT_ALGORITHM`]
    pub algorithm: Option<String>,
    /// `issuer` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`MIKROSERVICE_JWT_ISSUER`]
    pub issuer: Option<String>,
    /// `audience` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`MIKROSERVICE_JWT_AUDIENCE`]
    pub audience: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("public_key", &Redact::from(&self.public_key))
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl Config {
    /// Load config from env, keeping values that are already set.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if self.public_key.is_none() {
            self.public_key = ctx.env_var_non_empty(MIKROSERVICE_JWT_PUBLIC_KEY);
        }
        if self.algorithm.is_none() {
            self.algorithm = ctx.env_var_non_empty(MIKROSERVICE_JWT_ALGORITHM);
        }
        if self.issuer.is_none() {
            self.issuer = ctx.env_var_non_empty(MIKROSERVICE_JWT_ISSUER);
        }
        if self.audience.is_none() {
            self.audience = ctx.env_var_non_empty(MIKROSERVICE_JWT_AUDIENCE);
        }

        self
    }

    /// Set the PEM public key.
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// Set the algorithm the public key was issued for.
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    /// Require tokens to carry this issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require tokens to carry this audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Decode the configured key.
    ///
    /// Fails with `ConfigMissing` when no key is configured and with
    /// `ConfigInvalid` when the key or algorithm can't be used.
    pub fn public_key_material(&self) -> Result<PublicKeyMaterial> {
        let pem = self.public_key.as_deref().ok_or_else(|| {
            Error::config_missing(format!("{MIKROSERVICE_JWT_PUBLIC_KEY} is not set"))
        })?;
        let algorithm =
            parse_algorithm(self.algorithm.as_deref().unwrap_or(DEFAULT_JWT_ALGORITHM))?;

        PublicKeyMaterial::from_pem(pem, algorithm)
    }
}
