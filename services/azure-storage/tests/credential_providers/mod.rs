use blobgate_azure_storage::{
    Config, ConfigCredentialProvider, EnvCredentialProvider, StaticCredentialProvider,
    MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME, MIKROSERVICE_AZURE_STORAGE_SECRET_KEY,
};
use blobgate_core::{Context, ProvideCredential, SignOperation, StaticEnv, StorageOperation};
use chrono::TimeDelta;
use http::Method;

use crate::{init_signer, DEV_ACCOUNT_KEY, DEV_ACCOUNT_NAME};

async fn sign_with(
    provider: &impl ProvideCredential<Credential = blobgate_azure_storage::Credential>,
    ctx: &Context,
) -> String {
    let (_, signer, now) = init_signer();
    let cred = provider
        .provide_credential(ctx)
        .await
        .expect("load must succeed")
        .expect("credential must be present");

    let op = StorageOperation::new(
        Method::GET,
        "/mycontainer/path/to/blob.txt",
        now + TimeDelta::minutes(5),
    );
    signer.sign(&op, &cred).expect("sign must succeed").signature
}

#[tokio::test]
async fn test_providers_yield_same_signature() {
    let ctx = Context::new().with_env(StaticEnv::from_pairs([
        (MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME, DEV_ACCOUNT_NAME),
        (MIKROSERVICE_AZURE_STORAGE_SECRET_KEY, DEV_ACCOUNT_KEY),
    ]));

    let from_env = sign_with(&EnvCredentialProvider::new(), &ctx).await;
    let from_static = sign_with(
        &StaticCredentialProvider::new(DEV_ACCOUNT_NAME, DEV_ACCOUNT_KEY),
        &ctx,
    )
    .await;
    let from_config = sign_with(
        &ConfigCredentialProvider::new(Config::default().from_env(&ctx)),
        &ctx,
    )
    .await;

    assert_eq!(from_env, "vZ2bc0nbaR/3uhHCIHBpeufcNV2MWNc5YS9CYq28IL0=");
    assert_eq!(from_env, from_static);
    assert_eq!(from_env, from_config);
}

#[tokio::test]
async fn test_env_provider_empty_values() {
    let ctx = Context::new().with_env(StaticEnv::from_pairs([
        (MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME, DEV_ACCOUNT_NAME),
        (MIKROSERVICE_AZURE_STORAGE_SECRET_KEY, ""),
    ]));

    let cred = EnvCredentialProvider::new()
        .provide_credential(&ctx)
        .await
        .unwrap();
    assert!(cred.is_none());
}
