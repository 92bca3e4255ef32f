use blobgate_core::utils::Redact;
use blobgate_core::Context;
use std::fmt::{Debug, Formatter};

use crate::constants::*;

/// Config carries the storage account configuration.
#[derive(Clone, Default)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Config {
    /// `account_name` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME`]
    pub account_name: Option<String>,
    /// `account_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`MIKROSERVICE_AZURE_STORAGE_SECRET_KEY`]
    pub account_key: Option<String>,
    /// `endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`MIKROSERVICE_AZURE_STORAGE_ENDPOINT`]
    /// - default to `https://{account_name}.blob.core.windows.net`
    pub endpoint: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("account_name", &self.account_name)
            .field("account_key", &Redact::from(&self.account_key))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Config {
    /// Load config from env, keeping values that are already set.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if self.account_name.is_none() {
            self.account_name = ctx.env_var_non_empty(MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME);
        }

        if self.account_key.is_none() {
            self.account_key = ctx.env_var_non_empty(MIKROSERVICE_AZURE_STORAGE_SECRET_KEY);
        }

        if self.endpoint.is_none() {
            self.endpoint = ctx.env_var_non_empty(MIKROSERVICE_AZURE_STORAGE_ENDPOINT);
        }

        self
    }

    /// Set the account name.
    pub fn with_account_name(mut self, account_name: impl Into<String>) -> Self {
        self.account_name = Some(account_name.into());
        self
    }

    /// Set the account key.
    pub fn with_account_key(mut self, account_key: impl Into<String>) -> Self {
        self.account_key = Some(account_key.into());
        self
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Resolve the blob service endpoint without a trailing slash.
    ///
    /// Returns `None` when neither an endpoint nor an account name is known.
    pub fn endpoint(&self) -> Option<String> {
        if let Some(endpoint) = &self.endpoint {
            return Some(endpoint.trim_end_matches('/').to_string());
        }

        self.account_name
            .as_ref()
            .map(|name| format!("https://{name}.blob.core.windows.net"))
    }
}
