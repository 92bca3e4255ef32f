use crate::constants::*;
use crate::Credential;
use blobgate_core::hash::base64_hmac_sha256;
use blobgate_core::time::{format_rfc3339, now, truncate_to_seconds, DateTime};
use blobgate_core::{Error, Result, SignOperation, SignedRequest, StorageOperation};
use http::Method;
use log::debug;
use percent_encoding::percent_decode_str;

/// RequestSigner that implements Azure Blob Storage Service SAS.
///
/// - [Create a service SAS](https://learn.microsoft.com/en-us/rest/api/storageservices/create-service-sas)
///
/// The signature depends only on (verb, resource path, expiry, account key): no start
/// time, IP range or identifier is signed, so recomputing yields the same value.
#[derive(Debug)]
pub struct RequestSigner {
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for Azure Blob Storage.
    pub fn new() -> Self {
        Self { time: None }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

impl Default for RequestSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl SignOperation for RequestSigner {
    type Credential = Credential;

    fn sign(&self, operation: &StorageOperation, cred: &Self::Credential) -> Result<SignedRequest> {
        let now_time = self.time.unwrap_or_else(now);
        // `se` has whole second precision.
        let expires_at = truncate_to_seconds(operation.expires_at);
        if expires_at <= now_time {
            return Err(Error::invalid_expiry(format!(
                "expiry {} is not after signing time {}",
                format_rfc3339(expires_at),
                format_rfc3339(now_time)
            )));
        }

        let permissions = permissions_for(&operation.verb)?;
        let path = decode_path(&operation.resource_path);
        let resource = canonicalize_resource(cred.account_name(), &path)?;
        let expiry = format_rfc3339(expires_at);

        let string_to_sign = string_to_sign(permissions, &expiry, &resource);
        debug!("string to sign: {:?}", &string_to_sign);

        let signature = base64_hmac_sha256(&cred.decoded_key()?, string_to_sign.as_bytes());

        let query = vec![
            ("sv".to_string(), AZURE_STORAGE_VERSION.to_string()),
            ("spr".to_string(), SAS_PROTOCOL_HTTPS.to_string()),
            ("se".to_string(), expiry),
            ("sr".to_string(), SAS_RESOURCE_BLOB.to_string()),
            ("sp".to_string(), permissions.to_string()),
            ("sig".to_string(), signature.clone()),
        ];

        Ok(SignedRequest {
            verb: operation.verb.clone(),
            resource_path: path,
            expires_at,
            signature,
            query,
        })
    }
}

/// Map an HTTP verb onto the narrowest SAS permission set that allows it.
fn permissions_for(verb: &Method) -> Result<&'static str> {
    match *verb {
        Method::GET | Method::HEAD => Ok("r"),
        Method::PUT => Ok("cw"),
        Method::DELETE => Ok("d"),
        _ => Err(Error::request_invalid(format!(
            "verb {verb} is not supported for blob access"
        ))),
    }
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// signedPermissions + "\n" +
/// signedStart + "\n" +
/// signedExpiry + "\n" +
/// canonicalizedResource + "\n" +
/// signedIdentifier + "\n" +
/// signedIP + "\n" +
/// signedProtocol + "\n" +
/// signedVersion + "\n" +
/// signedResource + "\n" +
/// signedSnapshotTime + "\n" +
/// signedEncryptionScope + "\n" +
/// rscc + "\n" +
/// rscd + "\n" +
/// rsce + "\n" +
/// rscl + "\n" +
/// rsct
/// ```
///
/// ## Reference
///
/// - [Version 2020-12-06 and later](https://learn.microsoft.com/en-us/rest/api/storageservices/create-service-sas#version-2020-12-06-and-later)
fn string_to_sign(permissions: &str, expiry: &str, resource: &str) -> String {
    [
        permissions,
        "",
        expiry,
        resource,
        "",
        "",
        SAS_PROTOCOL_HTTPS,
        AZURE_STORAGE_VERSION,
        SAS_RESOURCE_BLOB,
        "",
        "",
        "",
        "",
        "",
        "",
        "",
    ]
    .join("\n")
}

/// Decode a resource path that may arrive percent-encoded.
///
/// The decoded form is both signed and addressed, so `/c/a%20b` and `/c/a b` name the same blob.
fn decode_path(resource_path: &str) -> String {
    percent_decode_str(resource_path)
        .decode_utf8_lossy()
        .into_owned()
}

/// Build `/blob/{account}/{container}/{blob}` from a decoded resource path.
///
/// The container must follow Azure naming rules and the blob name must be non-empty.
fn canonicalize_resource(account_name: &str, resource_path: &str) -> Result<String> {
    let Some(path) = resource_path.strip_prefix('/') else {
        return Err(Error::request_invalid(format!(
            "resource path {resource_path:?} must start with '/'"
        )));
    };

    let Some((container, blob)) = path.split_once('/') else {
        return Err(Error::request_invalid(format!(
            "resource path {resource_path:?} must name a container and a blob"
        )));
    };
    if !is_valid_container_name(container) {
        return Err(Error::request_invalid(format!(
            "container name {container:?} is invalid"
        )));
    }
    if blob.is_empty() || blob.ends_with('/') {
        return Err(Error::request_invalid(format!(
            "resource path {resource_path:?} does not name a blob"
        )));
    }

    Ok(format!("/blob/{account_name}/{container}/{blob}"))
}

/// ## Reference
///
/// - [Naming containers](https://learn.microsoft.com/en-us/rest/api/storageservices/naming-and-referencing-containers--blobs--and-metadata#container-names)
fn is_valid_container_name(name: &str) -> bool {
    (3..=63).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
}
