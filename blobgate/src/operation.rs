use blobgate_core::time::DateTime;
use bytes::Bytes;
use http::{Method, StatusCode};
use std::fmt;

/// Scope a credential needs to read blobs.
pub const SCOPE_BLOB_READ: &str = "blob.read";
/// Scope a credential needs to create, overwrite or delete blobs.
pub const SCOPE_BLOB_WRITE: &str = "blob.write";

/// A blob operation requested by an inbound caller.
///
/// Paths are logical and not percent-encoded: `/container/path/to/blob`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobOperation {
    /// Fetch the blob content.
    Download {
        /// Blob path.
        path: String,
    },
    /// Create or overwrite a block blob.
    Upload {
        /// Blob path.
        path: String,
        /// Full blob content.
        body: Bytes,
        /// Content type stored with the blob.
        content_type: Option<String>,
    },
    /// Delete the blob.
    Delete {
        /// Blob path.
        path: String,
    },
    /// Read the blob properties without its content.
    Properties {
        /// Blob path.
        path: String,
    },
    /// Issue a time-bounded url for `verb` without calling the blob store.
    Presign {
        /// Verb the url will be valid for.
        verb: Method,
        /// Blob path.
        path: String,
    },
}

impl BlobOperation {
    /// Build a download operation.
    pub fn download(path: impl Into<String>) -> Self {
        BlobOperation::Download { path: path.into() }
    }

    /// Build an upload operation.
    pub fn upload(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        BlobOperation::Upload {
            path: path.into(),
            body: body.into(),
            content_type: None,
        }
    }

    /// Build a delete operation.
    pub fn delete(path: impl Into<String>) -> Self {
        BlobOperation::Delete { path: path.into() }
    }

    /// Build a properties operation.
    pub fn properties(path: impl Into<String>) -> Self {
        BlobOperation::Properties { path: path.into() }
    }

    /// Build a presign operation.
    pub fn presign(verb: Method, path: impl Into<String>) -> Self {
        BlobOperation::Presign {
            verb,
            path: path.into(),
        }
    }

    /// Set the content type of an upload. Other operations are left untouched.
    pub fn with_content_type(mut self, value: impl Into<String>) -> Self {
        if let BlobOperation::Upload { content_type, .. } = &mut self {
            *content_type = Some(value.into());
        }
        self
    }

    /// Blob path this operation targets.
    pub fn path(&self) -> &str {
        match self {
            BlobOperation::Download { path }
            | BlobOperation::Upload { path, .. }
            | BlobOperation::Delete { path }
            | BlobOperation::Properties { path }
            | BlobOperation::Presign { path, .. } => path,
        }
    }

    /// HTTP verb the signature has to cover.
    pub fn verb(&self) -> Method {
        match self {
            BlobOperation::Download { .. } => Method::GET,
            BlobOperation::Upload { .. } => Method::PUT,
            BlobOperation::Delete { .. } => Method::DELETE,
            BlobOperation::Properties { .. } => Method::HEAD,
            BlobOperation::Presign { verb, .. } => verb.clone(),
        }
    }

    /// Scope required when scopes are enforced.
    pub fn required_scope(&self) -> &'static str {
        match self.verb() {
            Method::GET | Method::HEAD => SCOPE_BLOB_READ,
            _ => SCOPE_BLOB_WRITE,
        }
    }

    /// Short operation name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            BlobOperation::Download { .. } => "download",
            BlobOperation::Upload { .. } => "upload",
            BlobOperation::Delete { .. } => "delete",
            BlobOperation::Properties { .. } => "properties",
            BlobOperation::Presign { .. } => "presign",
        }
    }
}

/// Properties returned by a `HEAD` on a blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobProperties {
    /// Size of the blob in bytes.
    pub content_length: Option<u64>,
    /// Stored content type.
    pub content_type: Option<String>,
    /// Entity tag of the current blob version.
    pub etag: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime>,
}

/// What a successful operation produced.
#[derive(Clone, PartialEq, Eq)]
pub enum BlobOutcome {
    /// Blob content.
    Downloaded {
        /// Raw content.
        body: Bytes,
        /// Properties sent along with the content.
        properties: BlobProperties,
    },
    /// The blob was stored.
    Uploaded {
        /// Entity tag of the stored blob.
        etag: Option<String>,
    },
    /// The blob was deleted.
    Deleted,
    /// Blob properties.
    Properties(BlobProperties),
    /// A signed url the caller can use directly.
    Presigned {
        /// Full url including the signature.
        url: String,
        /// Instant the url stops working.
        expires_at: DateTime,
    },
}

impl fmt::Debug for BlobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobOutcome::Downloaded { body, properties } => f
                .debug_struct("Downloaded")
                .field("body_len", &body.len())
                .field("properties", properties)
                .finish(),
            BlobOutcome::Uploaded { etag } => {
                f.debug_struct("Uploaded").field("etag", etag).finish()
            }
            BlobOutcome::Deleted => f.write_str("Deleted"),
            BlobOutcome::Properties(properties) => {
                f.debug_tuple("Properties").field(properties).finish()
            }
            // The url carries a live signature.
            BlobOutcome::Presigned { expires_at, .. } => f
                .debug_struct("Presigned")
                .field("url", &"<redacted>")
                .field("expires_at", expires_at)
                .finish(),
        }
    }
}

/// Why an inbound credential was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// The credential expired.
    Expired,
    /// The credential could not be parsed.
    Malformed,
    /// The credential is valid but not acceptable.
    Forbidden(String),
}

/// Why an authorized operation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The signing window was not in the future.
    InvalidExpiry,
    /// The operation can't be expressed as a blob call, such as a path without a container.
    InvalidRequest,
    /// The blob does not exist.
    NotFound,
    /// The blob store refused our signature.
    PermissionDenied,
    /// The blob store answered with a status we do not retry.
    Rejected(StatusCode),
    /// Retries ran out on transient failures.
    Transient,
    /// Retries ran out and the last attempt hit its deadline.
    Timeout,
    /// The caller gave up on the request.
    Cancelled,
    /// Misconfiguration or a bug on our side.
    Internal,
}

/// Normalized result of [`Gateway::handle`](crate::Gateway::handle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// The operation completed.
    Succeeded(BlobOutcome),
    /// The credential was refused; the blob store was never called.
    Denied(Denial),
    /// The operation was authorized but failed.
    Failed(FailureKind),
}

impl OperationResult {
    /// Returns true for `Succeeded`.
    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Succeeded(_))
    }

    /// Map the result onto the status an HTTP front end should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            OperationResult::Succeeded(outcome) => match outcome {
                BlobOutcome::Uploaded { .. } => StatusCode::CREATED,
                BlobOutcome::Deleted => StatusCode::NO_CONTENT,
                _ => StatusCode::OK,
            },
            OperationResult::Denied(denial) => match denial {
                Denial::Expired | Denial::Malformed => StatusCode::UNAUTHORIZED,
                Denial::Forbidden(_) => StatusCode::FORBIDDEN,
            },
            OperationResult::Failed(kind) => match kind {
                FailureKind::InvalidRequest => StatusCode::BAD_REQUEST,
                FailureKind::NotFound => StatusCode::NOT_FOUND,
                FailureKind::PermissionDenied | FailureKind::Rejected(_) => {
                    StatusCode::BAD_GATEWAY
                }
                FailureKind::Transient | FailureKind::Cancelled => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                FailureKind::InvalidExpiry | FailureKind::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationResult::Succeeded(outcome) => write!(f, "succeeded({outcome:?})"),
            OperationResult::Denied(denial) => write!(f, "denied({denial:?})"),
            OperationResult::Failed(kind) => write!(f, "failed({kind:?})"),
        }
    }
}

/// Steps a request goes through inside the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    /// The request arrived.
    Received,
    /// The bearer credential is being checked.
    Authorizing,
    /// The credential was refused. Terminal.
    Denied,
    /// The credential was accepted.
    Authorized,
    /// A signature is being computed.
    Signing,
    /// The signed call is in flight, including retries.
    Dispatching,
    /// Terminal success.
    Succeeded,
    /// Terminal failure.
    Failed,
}

impl fmt::Display for GatewayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GatewayState::Received => "received",
            GatewayState::Authorizing => "authorizing",
            GatewayState::Denied => "denied",
            GatewayState::Authorized => "authorized",
            GatewayState::Signing => "signing",
            GatewayState::Dispatching => "dispatching",
            GatewayState::Succeeded => "succeeded",
            GatewayState::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl GatewayState {
    /// Returns true once no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GatewayState::Denied | GatewayState::Succeeded | GatewayState::Failed
        )
    }
}
