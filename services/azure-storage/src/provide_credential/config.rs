use async_trait::async_trait;
use blobgate_core::{Context, ProvideCredential};

use crate::config::Config;
use crate::credential::Credential;

/// Builds the credential from an already resolved [`Config`].
#[derive(Clone, Debug)]
pub struct ConfigCredentialProvider {
    config: Config,
}

impl ConfigCredentialProvider {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvideCredential for ConfigCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(
        &self,
        _ctx: &Context,
    ) -> Result<Option<Self::Credential>, blobgate_core::Error> {
        match (&self.config.account_name, &self.config.account_key) {
            (Some(name), Some(key)) => Ok(Some(Credential::new(name, key))),
            _ => Ok(None),
        }
    }
}
