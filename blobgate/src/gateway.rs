use backon::{BackoffBuilder, ExponentialBuilder};
use blobgate_azure_storage::{ConfigCredentialProvider, Credential, RequestSigner};
use blobgate_bearer_token::TokenVerifier;
use blobgate_core::time::{ceil_to_seconds, now, DateTime};
use blobgate_core::{
    AuthorizationResult, Claims, Context, Error, ErrorKind, ProvideCredential, Result,
    SignOperation, SignedRequest, SigningCredential, StorageOperation, VerifyToken,
};
use log::{debug, info, warn};
use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Options, ScopePolicy, Settings};
use crate::dispatch::{build_request, classify_error, classify_response, Attempt};
use crate::operation::{
    BlobOperation, BlobOutcome, Denial, FailureKind, GatewayState, OperationResult,
};

/// Gateway authorizes inbound blob operations and runs them against the blob store.
///
/// The gateway holds no mutable state: clone it freely and call [`Gateway::handle`]
/// from as many tasks as needed.
pub struct Gateway<K: SigningCredential> {
    ctx: Context,
    verifier: Arc<dyn VerifyToken>,
    signer: Arc<dyn SignOperation<Credential = K>>,
    credential: K,
    endpoint: String,
    options: Options,
}

impl<K: SigningCredential> Clone for Gateway<K> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            verifier: self.verifier.clone(),
            signer: self.signer.clone(),
            credential: self.credential.clone(),
            endpoint: self.endpoint.clone(),
            options: self.options.clone(),
        }
    }
}

impl<K: SigningCredential> Debug for Gateway<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("verifier", &self.verifier)
            .field("signer", &self.signer)
            .field("credential", &self.credential)
            .field("endpoint", &self.endpoint)
            .field("options", &self.options)
            .finish()
    }
}

impl Gateway<Credential> {
    /// Build an Azure Blob Storage gateway from the env values in `ctx`.
    ///
    /// The public key is decoded once here; a broken key fails startup instead of
    /// every request.
    pub async fn from_env(ctx: Context) -> Result<Self> {
        let settings = Settings::from_env(&ctx)?;
        Self::from_settings(ctx, &settings).await
    }

    /// Build an Azure Blob Storage gateway from settings.
    pub async fn from_settings(ctx: Context, settings: &Settings) -> Result<Self> {
        let verifier = TokenVerifier::from_config(&settings.token)?;

        let credential = ConfigCredentialProvider::new(settings.storage.clone())
            .provide_credential(&ctx)
            .await?
            .ok_or_else(|| Error::config_missing("storage credential is not configured"))?;
        if !credential.is_valid() {
            return Err(Error::config_invalid("storage credential is incomplete"));
        }

        let endpoint = settings
            .storage
            .endpoint()
            .ok_or_else(|| Error::config_missing("storage endpoint is not configured"))?;

        Ok(
            Self::new(ctx, verifier, RequestSigner::new(), credential, endpoint)
                .with_options(settings.options.clone()),
        )
    }
}

impl<K: SigningCredential> Gateway<K> {
    /// Create a gateway from its collaborators with default [`Options`].
    pub fn new(
        ctx: Context,
        verifier: impl VerifyToken,
        signer: impl SignOperation<Credential = K>,
        credential: K,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            ctx,
            verifier: Arc::new(verifier),
            signer: Arc::new(signer),
            credential,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            options: Options::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Options in use.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Authorize `token` and run `op`.
    ///
    /// Dropping the returned future abandons any in-flight blob call.
    pub async fn handle(&self, token: &str, op: BlobOperation) -> OperationResult {
        let mut state = Transitions::new(&op);

        state.enter(GatewayState::Authorizing);
        let claims = match self.authorize(token, &op) {
            Ok(claims) => claims,
            Err(denial) => {
                info!("{} {} denied: {denial:?}", op.name(), op.path());
                state.enter(GatewayState::Denied);
                return OperationResult::Denied(denial);
            }
        };
        state.enter(GatewayState::Authorized);
        debug!("{} {} authorized for {}", op.name(), op.path(), claims.subject());

        state.enter(GatewayState::Signing);
        let signed = match self.sign(&op) {
            Ok(signed) => signed,
            Err(kind) => return state.fail(kind),
        };

        if let BlobOperation::Presign { .. } = &op {
            let outcome = BlobOutcome::Presigned {
                url: signed.url(&self.endpoint),
                expires_at: signed.expires_at,
            };
            state.enter(GatewayState::Succeeded);
            return OperationResult::Succeeded(outcome);
        }

        state.enter(GatewayState::Dispatching);
        let result = self.dispatch(&op, signed).await;
        match &result {
            OperationResult::Succeeded(_) => state.enter(GatewayState::Succeeded),
            _ => state.enter(GatewayState::Failed),
        }
        result
    }

    /// Like [`Gateway::handle`], but gives up as soon as `cancel` completes.
    ///
    /// A cancelled request reports [`FailureKind::Cancelled`] and starts no further attempts.
    pub async fn handle_until<C>(&self, token: &str, op: BlobOperation, cancel: C) -> OperationResult
    where
        C: Future<Output = ()>,
    {
        let name = op.name();
        tokio::select! {
            result = self.handle(token, op) => result,
            _ = cancel => {
                info!("{name} cancelled by caller");
                OperationResult::Failed(FailureKind::Cancelled)
            }
        }
    }

    fn authorize(&self, token: &str, op: &BlobOperation) -> std::result::Result<Claims, Denial> {
        let claims = match self.verifier.verify(token, now()) {
            AuthorizationResult::Authorized(claims) => claims,
            AuthorizationResult::Denied(reason) => return Err(Denial::Forbidden(reason)),
            AuthorizationResult::Expired => return Err(Denial::Expired),
            AuthorizationResult::Malformed => return Err(Denial::Malformed),
        };

        if self.options.scope_policy == ScopePolicy::Require {
            let scope = op.required_scope();
            if !claims.has_scope(scope) {
                return Err(Denial::Forbidden(format!("missing scope {scope}")));
            }
        }

        Ok(claims)
    }

    fn sign(&self, op: &BlobOperation) -> std::result::Result<SignedRequest, FailureKind> {
        let expires_at = expiry_after(now(), self.options.signature_ttl)?;
        let operation = StorageOperation::new(op.verb(), op.path(), expires_at);

        self.signer
            .sign(&operation, &self.credential)
            .map_err(|err| {
                warn!("failed to sign {} {}: {err}", op.name(), op.path());
                match err.kind() {
                    ErrorKind::InvalidExpiry => FailureKind::InvalidExpiry,
                    ErrorKind::RequestInvalid => FailureKind::InvalidRequest,
                    _ => FailureKind::Internal,
                }
            })
    }

    /// Send the signed call, retrying transient failures with exponential backoff.
    async fn dispatch(&self, op: &BlobOperation, mut signed: SignedRequest) -> OperationResult {
        let mut backoff = self.backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;

            if signed.is_expired(now()) {
                debug!("signature for {} expired before attempt {attempt}, signing again", op.path());
                signed = match self.sign(op) {
                    Ok(signed) => signed,
                    Err(kind) => return OperationResult::Failed(kind),
                };
            }

            let outcome = match build_request(&self.endpoint, op, &signed) {
                Ok(req) => {
                    match tokio::time::timeout(self.options.attempt_timeout, self.ctx.http_send(req))
                        .await
                    {
                        Ok(Ok(resp)) => classify_response(op, resp),
                        Ok(Err(err)) => {
                            debug!("attempt {attempt} of {} failed: {err}", op.name());
                            classify_error(&err)
                        }
                        Err(_) => {
                            debug!(
                                "attempt {attempt} of {} timed out after {:?}",
                                op.name(),
                                self.options.attempt_timeout
                            );
                            Attempt::Retry(FailureKind::Timeout)
                        }
                    }
                }
                Err(err) => {
                    warn!("failed to build request for {}: {err}", op.path());
                    let kind = match err.kind() {
                        ErrorKind::RequestInvalid => FailureKind::InvalidRequest,
                        _ => FailureKind::Internal,
                    };
                    Attempt::Done(OperationResult::Failed(kind))
                }
            };

            match outcome {
                Attempt::Done(result) => {
                    if attempt > 1 {
                        debug!("{} finished after {attempt} attempts", op.name());
                    }
                    return result;
                }
                Attempt::Retry(kind) => match backoff.next() {
                    Some(delay) => {
                        debug!(
                            "{} attempt {attempt}/{} hit {kind:?}, retrying in {delay:?}",
                            op.name(),
                            self.options.max_attempts
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        warn!(
                            "{} {} still failing after {attempt} attempts: {kind:?}",
                            op.name(),
                            op.path()
                        );
                        return OperationResult::Failed(kind);
                    }
                },
            }
        }
    }

    fn backoff(&self) -> impl Iterator<Item = Duration> {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.options.min_backoff)
            .with_max_delay(self.options.max_backoff)
            .with_max_times(self.options.max_attempts.saturating_sub(1));

        if self.options.jitter {
            builder.with_jitter().build()
        } else {
            builder.build()
        }
    }
}

/// Expiry `ttl` after `from`, rounded up to the whole second `se` can express.
fn expiry_after(from: DateTime, ttl: Duration) -> std::result::Result<DateTime, FailureKind> {
    chrono::TimeDelta::from_std(ttl)
        .ok()
        .and_then(|ttl| ceil_to_seconds(from).checked_add_signed(ttl))
        .ok_or(FailureKind::InvalidExpiry)
}

/// Logs every state change of one request.
struct Transitions<'a> {
    op: &'a BlobOperation,
    state: GatewayState,
}

impl<'a> Transitions<'a> {
    fn new(op: &'a BlobOperation) -> Self {
        debug!("{} {}: {}", op.name(), op.path(), GatewayState::Received);
        Self {
            op,
            state: GatewayState::Received,
        }
    }

    fn enter(&mut self, next: GatewayState) {
        debug!(
            "{} {}: {} -> {next}",
            self.op.name(),
            self.op.path(),
            self.state
        );
        self.state = next;
    }

    fn fail(&mut self, kind: FailureKind) -> OperationResult {
        self.enter(GatewayState::Failed);
        OperationResult::Failed(kind)
    }
}
