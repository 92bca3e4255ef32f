use async_trait::async_trait;
use blobgate_core::{Context, ProvideCredential};
use log::debug;

use crate::constants::*;
use crate::credential::Credential;

/// Loads the shared key credential from the process environment.
///
/// Both [`MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME`] and
/// [`MIKROSERVICE_AZURE_STORAGE_SECRET_KEY`] must be present; otherwise nothing is returned.
#[derive(Clone, Debug, Default)]
pub struct EnvCredentialProvider {}

impl EnvCredentialProvider {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(
        &self,
        ctx: &Context,
    ) -> Result<Option<Self::Credential>, blobgate_core::Error> {
        let account_name = ctx.env_var_non_empty(MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME);
        let account_key = ctx.env_var_non_empty(MIKROSERVICE_AZURE_STORAGE_SECRET_KEY);

        match (account_name, account_key) {
            (Some(account_name), Some(account_key)) => {
                Ok(Some(Credential::new(&account_name, &account_key)))
            }
            (name, _) => {
                debug!(
                    "storage credential not found in env, account name present: {}",
                    name.is_some()
                );
                Ok(None)
            }
        }
    }
}
