//! Reqwest-backed [`HttpSend`] for talking to the blob store over HTTPS.
//!
//! Transport failures are classified so the gateway can retry them:
//!
//! - deadline exceeded ⇒ [`ErrorKind::Timeout`](blobgate_core::ErrorKind::Timeout)
//! - connect / request / body failures ⇒ [`ErrorKind::Transient`](blobgate_core::ErrorKind::Transient)
//! - everything else ⇒ not retried

use async_trait::async_trait;
use blobgate_core::{Error, HttpSend, Result};
use bytes::Bytes;
use http_body_util::BodyExt;
use log::debug;
use reqwest::{Client, Request};

/// HttpSend implementation on top of a shared [`reqwest::Client`].
///
/// The client's connection pool is the only state shared between requests.
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let req = Request::try_from(req).map_err(classify)?;
        debug!("sending {} {}", req.method(), req.url().path());

        let resp: http::Response<_> = self.client.execute(req).await.map_err(classify)?.into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(classify)?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

fn classify(err: reqwest::Error) -> Error {
    let base = if err.is_timeout() {
        Error::timeout("request to blob store timed out")
    } else if err.is_builder() {
        Error::request_invalid("failed to build blob store request")
    } else if err.is_connect() {
        Error::transient("failed to connect to blob store")
    } else if err.is_request() || err.is_body() {
        Error::transient("blob store request failed in transit")
    } else {
        Error::unexpected("unexpected blob store transport error")
    };

    // Query strings carry SAS signatures, strip them before keeping the error around.
    base.with_source(err.without_url())
}
