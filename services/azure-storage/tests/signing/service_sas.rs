use blobgate_core::{ErrorKind, SignOperation, StorageOperation};
use chrono::TimeDelta;
use http::Method;
use log::debug;
use pretty_assertions::assert_eq;
use test_case::test_case;

use crate::init_signer;

#[test_case(Method::GET, "r", "vZ2bc0nbaR/3uhHCIHBpeufcNV2MWNc5YS9CYq28IL0="; "get")]
#[test_case(Method::HEAD, "r", "vZ2bc0nbaR/3uhHCIHBpeufcNV2MWNc5YS9CYq28IL0="; "head")]
#[test_case(Method::PUT, "cw", "YaZtQ9FHL/NwGzBTTHFg1K5HzkdxRq7VgumOqX0wdDg="; "put")]
#[test_case(Method::DELETE, "d", "mhsr5kXHumieZieCsVLbcJsHO2qyFwa0oux/iXcYHWE="; "delete")]
fn test_sign_blob_operation(verb: Method, permissions: &str, signature: &str) {
    let (cred, signer, now) = init_signer();
    let op = StorageOperation::new(
        verb.clone(),
        "/mycontainer/path/to/blob.txt",
        now + TimeDelta::minutes(5),
    );

    let signed = signer.sign(&op, &cred).expect("sign must succeed");
    debug!("signed request: {signed:?}");

    assert_eq!(signed.verb, verb);
    assert_eq!(signed.signature, signature);
    assert_eq!(
        signed.query,
        vec![
            ("sv".to_string(), "2022-11-02".to_string()),
            ("spr".to_string(), "https".to_string()),
            ("se".to_string(), "2022-03-01T08:17:34Z".to_string()),
            ("sr".to_string(), "b".to_string()),
            ("sp".to_string(), permissions.to_string()),
            ("sig".to_string(), signature.to_string()),
        ]
    );
}

#[test]
fn test_sign_is_deterministic() {
    let (cred, signer, now) = init_signer();
    let op = StorageOperation::new(
        Method::GET,
        "/mycontainer/path/to/blob.txt",
        now + TimeDelta::minutes(5),
    );

    let first = signer.sign(&op, &cred).unwrap();
    let second = signer.sign(&op, &cred).unwrap();
    assert_eq!(first, second);

    // Signing time does not enter the signature as long as expiry stays in the future.
    let later = signer
        .with_time(now + TimeDelta::minutes(1))
        .sign(&op, &cred)
        .unwrap();
    assert_eq!(first.signature, later.signature);
}

#[test]
fn test_sign_url_encodes_path_and_query() {
    let (cred, signer, now) = init_signer();
    let op = StorageOperation::new(
        Method::GET,
        "/photos/cat picture.png",
        now + TimeDelta::minutes(5),
    );

    let signed = signer.sign(&op, &cred).unwrap();
    assert_eq!(signed.signature, "U1ItUXAyiBSV9qsWOWNghocviujbAEh7WA1CAfWR5Wg=");
    assert_eq!(
        signed.url("http://127.0.0.1:10000/devstoreaccount1"),
        "http://127.0.0.1:10000/devstoreaccount1/photos/cat%20picture.png?sv=2022-11-02&spr=https&se=2022-03-01T08%3A17%3A34Z&sr=b&sp=r&sig=U1ItUXAyiBSV9qsWOWNghocviujbAEh7WA1CAfWR5Wg%3D"
    );
}

#[test]
fn test_sign_encoded_path_addresses_signed_blob() {
    let (cred, signer, now) = init_signer();
    let op = StorageOperation::new(
        Method::GET,
        "/photos/cat%20picture.png",
        now + TimeDelta::minutes(5),
    );

    let signed = signer.sign(&op, &cred).unwrap();
    assert_eq!(signed.signature, "U1ItUXAyiBSV9qsWOWNghocviujbAEh7WA1CAfWR5Wg=");
    assert_eq!(signed.resource_path, "/photos/cat picture.png");
    assert_eq!(
        signed.url("http://127.0.0.1:10000/devstoreaccount1"),
        "http://127.0.0.1:10000/devstoreaccount1/photos/cat%20picture.png?sv=2022-11-02&spr=https&se=2022-03-01T08%3A17%3A34Z&sr=b&sp=r&sig=U1ItUXAyiBSV9qsWOWNghocviujbAEh7WA1CAfWR5Wg%3D"
    );
}

#[test]
fn test_signature_changes_with_inputs() {
    let (cred, signer, now) = init_signer();
    let base = StorageOperation::new(
        Method::GET,
        "/mycontainer/path/to/blob.txt",
        now + TimeDelta::minutes(5),
    );
    let signature = signer.sign(&base, &cred).unwrap().signature;

    let mut other_path = base.clone();
    other_path.resource_path = "/mycontainer/path/to/other.txt".to_string();
    assert_ne!(signer.sign(&other_path, &cred).unwrap().signature, signature);

    let mut other_expiry = base.clone();
    other_expiry.expires_at = now + TimeDelta::minutes(6);
    assert_ne!(signer.sign(&other_expiry, &cred).unwrap().signature, signature);

    let other_cred = blobgate_azure_storage::Credential::new(crate::DEV_ACCOUNT_NAME, "a2V5");
    assert_ne!(signer.sign(&base, &other_cred).unwrap().signature, signature);
}

#[test]
fn test_sign_rejects_past_expiry() {
    let (cred, signer, now) = init_signer();
    let op = StorageOperation::new(
        Method::GET,
        "/mycontainer/path/to/blob.txt",
        now - TimeDelta::seconds(30),
    );

    let err = signer.sign(&op, &cred).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidExpiry);
}

#[test_case(Method::POST; "post")]
#[test_case(Method::PATCH; "patch")]
fn test_sign_rejects_unsupported_verb(verb: Method) {
    let (cred, signer, now) = init_signer();
    let op = StorageOperation::new(verb, "/mycontainer/blob", now + TimeDelta::minutes(5));

    let err = signer.sign(&op, &cred).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
}

#[test]
fn test_sign_does_not_leak_key() {
    let (cred, signer, now) = init_signer();
    let op = StorageOperation::new(
        Method::GET,
        "/mycontainer/path/to/blob.txt",
        now + TimeDelta::minutes(5),
    );
    let signed = signer.sign(&op, &cred).unwrap();

    assert!(!format!("{cred:?}").contains(crate::DEV_ACCOUNT_KEY));
    assert!(!signed.url("https://x").contains(crate::DEV_ACCOUNT_KEY));
    assert!(!format!("{signed:?}").contains(&signed.signature));
}
