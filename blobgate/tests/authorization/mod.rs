use blobgate::{
    BlobOperation, BlobOutcome, Context, Denial, ErrorKind, Gateway, OperationResult,
    ScopePolicy, StaticEnv, MIKROSERVICE_GATEWAY_MAX_ATTEMPTS,
};
use blobgate::azure::{
    MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME, MIKROSERVICE_AZURE_STORAGE_ENDPOINT,
    MIKROSERVICE_AZURE_STORAGE_SECRET_KEY,
};
use blobgate::bearer::{MIKROSERVICE_JWT_ALGORITHM, MIKROSERVICE_JWT_PUBLIC_KEY};
use http::Method;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::*;

#[tokio::test]
async fn test_expired_token_is_denied_without_backend_calls() {
    let h = Harness::new(SpyBackend::default(), options(5));

    let result = h
        .gateway
        .handle(&token_expiring_in(-1), BlobOperation::download("/photos/cat.png"))
        .await;

    assert_eq!(result, OperationResult::Denied(Denial::Expired));
    assert_eq!(h.backend.calls(), 0);
    assert_eq!(h.signs(), 0);
}

#[tokio::test]
async fn test_malformed_token_is_denied() {
    let h = Harness::new(SpyBackend::default(), options(5));

    let result = h
        .gateway
        .handle("not-a-token", BlobOperation::delete("/photos/cat.png"))
        .await;

    assert_eq!(result, OperationResult::Denied(Denial::Malformed));
    assert_eq!(result.status_code(), http::StatusCode::UNAUTHORIZED);
    assert_eq!(h.backend.calls(), 0);
}

#[tokio::test]
async fn test_token_from_other_key_is_forbidden() {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = SpyBackend::default();
    let verifier = blobgate::bearer::TokenVerifier::new(
        blobgate::bearer::PublicKeyMaterial::from_pem(
            OTHER_ED25519_PUBLIC,
            blobgate::bearer::Algorithm::EdDSA,
        )
        .unwrap(),
    );
    let gateway = Gateway::new(
        Context::new().with_http_send(backend.clone()),
        verifier,
        blobgate::azure::RequestSigner::new(),
        blobgate::azure::Credential::new("devstoreaccount1", ACCOUNT_KEY),
        ENDPOINT,
    );

    let result = gateway
        .handle(&valid_token(), BlobOperation::download("/photos/cat.png"))
        .await;

    assert!(
        matches!(result, OperationResult::Denied(Denial::Forbidden(_))),
        "got {result}"
    );
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_scope_policy_requires_matching_scope() {
    let h = Harness::new(
        SpyBackend::default(),
        options(5).with_scope_policy(ScopePolicy::Require),
    );
    let reader = token(json!({
        "sub": "user-1",
        "exp": chrono::Utc::now().timestamp() + 600,
        "scope": "blob.read",
    }));

    let result = h
        .gateway
        .handle(&reader, BlobOperation::upload("/photos/cat.png", "meow"))
        .await;
    assert_eq!(
        result,
        OperationResult::Denied(Denial::Forbidden("missing scope blob.write".to_string()))
    );
    assert_eq!(h.backend.calls(), 0);

    let result = h
        .gateway
        .handle(&reader, BlobOperation::download("/photos/cat.png"))
        .await;
    assert!(result.is_success(), "got {result}");
    assert_eq!(h.backend.calls(), 1);
}

#[tokio::test]
async fn test_scope_policy_disabled_by_default() {
    let h = Harness::new(SpyBackend::default(), options(5));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::upload("/photos/cat.png", "meow"))
        .await;

    assert!(result.is_success(), "got {result}");
}

#[tokio::test]
async fn test_presign_does_not_dispatch() {
    let h = Harness::new(SpyBackend::default(), options(5));

    let result = h
        .gateway
        .handle(
            &valid_token(),
            BlobOperation::presign(Method::GET, "/photos/cat picture.png"),
        )
        .await;

    let OperationResult::Succeeded(BlobOutcome::Presigned { url, expires_at }) = result else {
        panic!("presign must succeed, got {result}");
    };
    assert!(url.starts_with(&format!("{ENDPOINT}/photos/cat%20picture.png?sv=2022-11-02&")));
    assert!(url.contains("&sp=r&sig="));
    assert!(expires_at > chrono::Utc::now());
    assert_eq!(h.backend.calls(), 0);
    assert_eq!(h.signs(), 1);
}

#[tokio::test]
async fn test_presign_unsupported_verb_is_invalid_request() {
    let h = Harness::new(SpyBackend::default(), options(5));

    let result = h
        .gateway
        .handle(
            &valid_token(),
            BlobOperation::presign(Method::POST, "/photos/cat.png"),
        )
        .await;

    assert_eq!(
        result,
        OperationResult::Failed(blobgate::FailureKind::InvalidRequest)
    );
}

#[tokio::test]
async fn test_invalid_path_is_not_dispatched() {
    let h = Harness::new(SpyBackend::default(), options(5));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::download("/NoContainer"))
        .await;

    assert_eq!(
        result,
        OperationResult::Failed(blobgate::FailureKind::InvalidRequest)
    );
    assert_eq!(result.status_code(), http::StatusCode::BAD_REQUEST);
    assert_eq!(h.backend.calls(), 0);
}

#[tokio::test]
async fn test_gateway_from_env() {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = SpyBackend::default();
    let ctx = Context::new()
        .with_http_send(backend.clone())
        .with_env(StaticEnv::from_pairs([
            (MIKROSERVICE_JWT_PUBLIC_KEY, ED25519_PUBLIC.trim().replace('\n', "\\n")),
            (MIKROSERVICE_JWT_ALGORITHM, "EdDSA".to_string()),
            (MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME, "devstoreaccount1".to_string()),
            (MIKROSERVICE_AZURE_STORAGE_SECRET_KEY, ACCOUNT_KEY.to_string()),
            (
                MIKROSERVICE_AZURE_STORAGE_ENDPOINT,
                "http://127.0.0.1:10000/devstoreaccount1/".to_string(),
            ),
            (MIKROSERVICE_GATEWAY_MAX_ATTEMPTS, "2".to_string()),
        ]));

    let gateway = Gateway::from_env(ctx).await.expect("gateway must build");
    assert_eq!(gateway.options().max_attempts, 2);

    let result = gateway
        .handle(&valid_token(), BlobOperation::properties("/photos/cat.png"))
        .await;
    assert!(result.is_success(), "got {result}");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::HEAD);
    assert!(requests[0]
        .uri
        .starts_with("http://127.0.0.1:10000/devstoreaccount1/photos/cat.png?"));
}

#[tokio::test]
async fn test_gateway_from_env_missing_key() {
    let ctx = Context::new().with_env(StaticEnv::from_pairs([(
        MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME,
        "devstoreaccount1",
    )]));

    let err = Gateway::from_env(ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigMissing);
    assert!(err.message().contains(MIKROSERVICE_JWT_PUBLIC_KEY));
}
