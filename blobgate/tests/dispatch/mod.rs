use blobgate::{BlobOperation, BlobOutcome, ErrorKind, FailureKind, OperationResult};
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use std::time::Duration;
use test_case::test_case;

use crate::*;

#[tokio::test(start_paused = true)]
async fn test_success_on_first_attempt() {
    let h = Harness::new(SpyBackend::default(), options(5));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::download("/photos/cat.png"))
        .await;

    let OperationResult::Succeeded(BlobOutcome::Downloaded { body, properties }) = result else {
        panic!("download must succeed, got {result}");
    };
    assert_eq!(body.as_ref(), b"hello");
    assert_eq!(properties.content_type.as_deref(), Some("text/plain"));
    assert_eq!(h.backend.calls(), 1);
    assert_eq!(h.signs(), 1);

    let req = &h.backend.requests()[0];
    assert_eq!(req.method, Method::GET);
    assert!(req.uri.starts_with(&format!("{ENDPOINT}/photos/cat.png?sv=2022-11-02&spr=https&se=")));
    assert!(req.uri.contains("&sr=b&sp=r&sig="));
    assert_eq!(req.headers["x-ms-version"], "2022-11-02");
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_then_success_within_ceiling() {
    let backend = SpyBackend::with_script([Reply::Hang, Reply::Hang, Reply::Hang]);
    let h = Harness::new(backend, options(5));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::download("/photos/cat.png"))
        .await;

    assert!(result.is_success(), "got {result}");
    assert_eq!(h.backend.calls(), 4);
    // The signature outlives the retries, no need to sign again.
    assert_eq!(h.signs(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_exhaust_ceiling() {
    let backend = SpyBackend::with_script([Reply::Hang, Reply::Hang, Reply::Hang, Reply::Hang]);
    let h = Harness::new(backend, options(3));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::download("/photos/cat.png"))
        .await;

    assert_eq!(result, OperationResult::Failed(FailureKind::Timeout));
    assert_eq!(result.status_code(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(h.backend.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_transient_statuses_exhaust_ceiling() {
    let backend = SpyBackend::with_script([
        Reply::Status(503),
        Reply::Status(500),
        Reply::Status(429),
        Reply::Status(502),
        Reply::Status(200),
    ]);
    let h = Harness::new(backend, options(4));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::delete("/photos/cat.png"))
        .await;

    assert_eq!(result, OperationResult::Failed(FailureKind::Transient));
    assert_eq!(h.backend.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_last_attempt_decides_failure_kind() {
    let backend = SpyBackend::with_script([Reply::Status(503), Reply::Hang]);
    let h = Harness::new(backend, options(2));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::download("/photos/cat.png"))
        .await;
    assert_eq!(result, OperationResult::Failed(FailureKind::Timeout));

    let backend = SpyBackend::with_script([Reply::Hang, Reply::Fail(ErrorKind::Transient)]);
    let h = Harness::new(backend, options(2));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::download("/photos/cat.png"))
        .await;
    assert_eq!(result, OperationResult::Failed(FailureKind::Transient));
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_ceiling_never_retries() {
    let backend = SpyBackend::with_script([Reply::Fail(ErrorKind::Timeout)]);
    let h = Harness::new(backend, options(1));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::download("/photos/cat.png"))
        .await;

    assert_eq!(result, OperationResult::Failed(FailureKind::Timeout));
    assert_eq!(h.backend.calls(), 1);
}

#[test_case(404, FailureKind::NotFound; "not found")]
#[test_case(403, FailureKind::PermissionDenied; "forbidden")]
#[test_case(401, FailureKind::PermissionDenied; "unauthorized")]
#[test_case(409, FailureKind::Rejected(StatusCode::CONFLICT); "conflict")]
#[test_case(412, FailureKind::Rejected(StatusCode::PRECONDITION_FAILED); "precondition")]
#[tokio::test(start_paused = true)]
async fn test_permanent_statuses_are_not_retried(status: u16, expected: FailureKind) {
    let backend = SpyBackend::with_script([Reply::Status(status)]);
    let h = Harness::new(backend, options(5));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::properties("/photos/cat.png"))
        .await;

    assert_eq!(result, OperationResult::Failed(expected));
    assert_eq!(h.backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_non_transient_transport_error_is_internal() {
    let backend = SpyBackend::with_script([Reply::Fail(ErrorKind::RequestInvalid)]);
    let h = Harness::new(backend, options(5));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::download("/photos/cat.png"))
        .await;

    assert_eq!(result, OperationResult::Failed(FailureKind::Internal));
    assert_eq!(h.backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_upload_sends_block_blob() {
    let h = Harness::new(SpyBackend::default(), options(5));

    let op = BlobOperation::upload("/photos/cat.txt", "meow").with_content_type("text/plain");
    let result = h.gateway.handle(&valid_token(), op).await;

    assert_eq!(
        result,
        OperationResult::Succeeded(BlobOutcome::Uploaded {
            etag: Some("\"0x8DA1\"".to_string())
        })
    );
    assert_eq!(result.status_code(), StatusCode::CREATED);

    let req = &h.backend.requests()[0];
    assert_eq!(req.method, Method::PUT);
    assert!(req.uri.contains("&sp=cw&"));
    assert_eq!(req.headers["x-ms-blob-type"], "BlockBlob");
    assert_eq!(req.headers["content-type"], "text/plain");
    assert_eq!(req.body.as_ref(), b"meow");
}

#[tokio::test(start_paused = true)]
async fn test_upload_with_invalid_content_type_is_invalid_request() {
    let h = Harness::new(SpyBackend::default(), options(5));

    let op = BlobOperation::upload("/photos/cat.txt", "meow").with_content_type("text/plain\r\n");
    let result = h.gateway.handle(&valid_token(), op).await;

    assert_eq!(result, OperationResult::Failed(FailureKind::InvalidRequest));
    assert_eq!(result.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(h.backend.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_upload_body_is_resent_on_retry() {
    let backend = SpyBackend::with_script([Reply::Status(500)]);
    let h = Harness::new(backend, options(3));

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::upload("/photos/cat.txt", "meow"))
        .await;

    assert!(result.is_success(), "got {result}");
    let requests = h.backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].body.as_ref(), b"meow");
    assert_eq!(requests[1].headers["content-type"], "application/octet-stream");
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_stops_retries() {
    let backend = SpyBackend::with_script(std::iter::repeat(Reply::Hang).take(10));
    let h = Harness::new(backend, options(5));

    // First attempt times out at 10s, the second starts at 10.2s and is still
    // running when the caller gives up at 15s.
    let result = h
        .gateway
        .handle_until(
            &valid_token(),
            BlobOperation::download("/photos/cat.png"),
            tokio::time::sleep(Duration::from_secs(15)),
        )
        .await;

    assert_eq!(result, OperationResult::Failed(FailureKind::Cancelled));
    assert_eq!(h.backend.calls(), 2);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.backend.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_share_gateway() {
    let h = Harness::new(SpyBackend::default(), options(5));
    let token = valid_token();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let gateway = h.gateway.clone();
            let token = token.clone();
            tokio::spawn(async move {
                gateway
                    .handle(&token, BlobOperation::download(format!("/photos/cat-{i}.png")))
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_success());
    }
    assert_eq!(h.backend.calls(), 8);
    assert_eq!(h.signs(), 8);
}

// Runs on the real clock: signature expiry is measured in wall time.
#[tokio::test]
async fn test_expired_signature_is_renewed_before_retry() {
    let backend = SpyBackend::with_script([Reply::Status(503)]);
    let h = Harness::new(
        backend,
        options(2)
            .with_signature_ttl(Duration::from_secs(1))
            .with_backoff(Duration::from_millis(2100), Duration::from_millis(2100)),
    );

    let result = h
        .gateway
        .handle(&valid_token(), BlobOperation::download("/photos/cat.png"))
        .await;

    assert!(result.is_success(), "got {result}");
    assert_eq!(h.backend.calls(), 2);
    assert_eq!(h.signs(), 2);

    let requests = h.backend.requests();
    assert_ne!(requests[0].uri, requests[1].uri);
}
