use std::fmt::{Debug, Formatter};

use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::time::{format_rfc3339, DateTime};
use crate::utils::Redact;

/// Characters that stay literal in a blob path; `/` separates container and blob segments.
static BLOB_PATH_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A storage operation waiting to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOperation {
    /// HTTP verb of the storage call.
    pub verb: Method,
    /// Logical, not percent-encoded path: `/container/path/to/blob`.
    pub resource_path: String,
    /// Instant after which the signature must be rejected by the backend.
    pub expires_at: DateTime,
}

impl StorageOperation {
    /// Create a new storage operation.
    pub fn new(verb: Method, resource_path: impl Into<String>, expires_at: DateTime) -> Self {
        Self {
            verb,
            resource_path: resource_path.into(),
            expires_at,
        }
    }
}

/// The result of signing a [`StorageOperation`].
///
/// `query` holds the raw (not url-encoded) query pairs that authenticate the call,
/// `signature` among them.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// HTTP verb the signature is valid for.
    pub verb: Method,
    /// Logical resource path the signature is valid for.
    pub resource_path: String,
    /// Expiry baked into the signature.
    pub expires_at: DateTime,
    /// Base64 encoded signature.
    pub signature: String,
    /// Query pairs to append to the outbound request.
    pub query: Vec<(String, String)>,
}

impl Debug for SignedRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedRequest")
            .field("verb", &self.verb)
            .field("resource_path", &self.resource_path)
            .field("expires_at", &format_rfc3339(self.expires_at))
            .field("signature", &Redact::from(&self.signature))
            .finish()
    }
}

impl SignedRequest {
    /// Check whether the signature is no longer usable at `now`.
    pub fn is_expired(&self, now: DateTime) -> bool {
        self.expires_at <= now
    }

    /// Url-encoded query string carrying the signature.
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish()
    }

    /// Percent-encoded form of the resource path.
    pub fn encoded_path(&self) -> String {
        utf8_percent_encode(&self.resource_path, &BLOB_PATH_ENCODE_SET).to_string()
    }

    /// Build the full url for the given service endpoint.
    ///
    /// ```text
    /// https://account.blob.core.windows.net + /container/blob => https://account.blob.core.windows.net/container/blob?sv=...
    /// ```
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}{}?{}",
            endpoint.trim_end_matches('/'),
            self.encoded_path(),
            self.query_string()
        )
    }
}
