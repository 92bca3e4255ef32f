use blobgate_azure_storage::{AZURE_STORAGE_VERSION, X_MS_BLOB_TYPE, X_MS_ERROR_CODE, X_MS_VERSION};
use blobgate_core::time::parse_http_date;
use blobgate_core::{ErrorKind, Result, SignedRequest};
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use http::{HeaderMap, HeaderName, Request, Response, StatusCode};
use log::{debug, warn};
use serde::Deserialize;

use crate::operation::{BlobOperation, BlobOutcome, BlobProperties, FailureKind, OperationResult};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// What a single dispatch attempt decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Attempt {
    /// Final result, no retry.
    Done(OperationResult),
    /// Retry if attempts remain; the kind is reported once they run out.
    Retry(FailureKind),
}

/// Build the outbound blob call for `op` signed by `signed`.
pub(crate) fn build_request(
    endpoint: &str,
    op: &BlobOperation,
    signed: &SignedRequest,
) -> Result<Request<Bytes>> {
    let builder = Request::builder()
        .method(signed.verb.clone())
        .uri(signed.url(endpoint))
        .header(X_MS_VERSION, AZURE_STORAGE_VERSION);

    let req = match op {
        BlobOperation::Upload {
            body, content_type, ..
        } => builder
            .header(X_MS_BLOB_TYPE, "BlockBlob")
            .header(
                CONTENT_TYPE,
                content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE),
            )
            .body(body.clone())?,
        _ => builder.body(Bytes::new())?,
    };

    Ok(req)
}

/// Classify a transport error.
pub(crate) fn classify_error(err: &blobgate_core::Error) -> Attempt {
    match err.kind() {
        ErrorKind::Timeout => Attempt::Retry(FailureKind::Timeout),
        _ if err.is_transient() => Attempt::Retry(FailureKind::Transient),
        _ => Attempt::Done(OperationResult::Failed(FailureKind::Internal)),
    }
}

/// Classify a blob store response.
pub(crate) fn classify_response(op: &BlobOperation, resp: Response<Bytes>) -> Attempt {
    let status = resp.status();

    if status.is_success() {
        let (parts, body) = resp.into_parts();
        let properties = read_properties(&parts.headers);
        let outcome = match op {
            BlobOperation::Download { .. } => BlobOutcome::Downloaded { body, properties },
            BlobOperation::Upload { .. } => BlobOutcome::Uploaded {
                etag: properties.etag,
            },
            BlobOperation::Delete { .. } => BlobOutcome::Deleted,
            BlobOperation::Properties { .. } => BlobOutcome::Properties(properties),
            // Presign never reaches the blob store.
            BlobOperation::Presign { .. } => {
                return Attempt::Done(OperationResult::Failed(FailureKind::Internal))
            }
        };
        return Attempt::Done(OperationResult::Succeeded(outcome));
    }

    let code = error_code(resp.headers(), resp.body());
    match status {
        StatusCode::NOT_FOUND => {
            debug!("blob store returned {status} for {}: {code}", op.path());
            Attempt::Done(OperationResult::Failed(FailureKind::NotFound))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            warn!("blob store refused signed {} call: {status} {code}", op.name());
            Attempt::Done(OperationResult::Failed(FailureKind::PermissionDenied))
        }
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            debug!("blob store returned transient {status}: {code}");
            Attempt::Retry(FailureKind::Transient)
        }
        _ => {
            warn!("blob store rejected {} call: {status} {code}", op.name());
            Attempt::Done(OperationResult::Failed(FailureKind::Rejected(status)))
        }
    }
}

fn read_properties(headers: &HeaderMap) -> BlobProperties {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    BlobProperties {
        content_length: header(CONTENT_LENGTH).and_then(|v| v.parse().ok()),
        content_type: header(CONTENT_TYPE),
        etag: header(ETAG),
        last_modified: header(LAST_MODIFIED).and_then(|v| parse_http_date(&v).ok()),
    }
}

/// Error body of the blob service.
///
/// ```xml
/// <?xml version="1.0" encoding="utf-8"?>
/// <Error>
///   <Code>BlobNotFound</Code>
///   <Message>The specified blob does not exist.</Message>
/// </Error>
/// ```
#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct StorageErrorBody {
    code: String,
}

/// Extract the storage error code, preferring the header over the body.
///
/// Only the code is kept: messages can echo request details.
pub(crate) fn error_code(headers: &HeaderMap, body: &[u8]) -> String {
    if let Some(code) = headers.get(X_MS_ERROR_CODE).and_then(|v| v.to_str().ok()) {
        return code.to_string();
    }

    std::str::from_utf8(body)
        .ok()
        .and_then(|s| quick_xml::de::from_str::<StorageErrorBody>(s).ok())
        .map(|e| e.code)
        .filter(|code| !code.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
