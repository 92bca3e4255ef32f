use crate::time::DateTime;
use crate::{AuthorizationResult, Context, Result, SignedRequest, StorageOperation};
use std::fmt::Debug;

/// SigningCredential is the trait used by the gateway as the signing secret.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is usable for signing.
    fn is_valid(&self) -> bool;
}

/// ProvideCredential loads the storage credential at startup.
///
/// Returning `Ok(None)` means this source has nothing to offer; callers decide
/// whether that is fatal.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this provider.
    type Credential: Send + Sync + Unpin + 'static;

    /// Load credential from the context.
    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}

/// VerifyToken decides whether an inbound bearer credential is acceptable.
///
/// Implementations must be pure: the outcome depends only on the token, the
/// key material captured at construction and `now`.
pub trait VerifyToken: Debug + Send + Sync + 'static {
    /// Verify the token at the given instant.
    fn verify(&self, token: &str, now: DateTime) -> AuthorizationResult;
}

/// SignOperation produces a time-bounded signature for a storage operation.
pub trait SignOperation: Debug + Send + Sync + 'static {
    /// Credential used by this signer.
    type Credential: SigningCredential;

    /// Sign the operation.
    ///
    /// ## Expiry
    ///
    /// `operation.expires_at` must be strictly later than the signer's current time,
    /// otherwise the signer fails with [`crate::ErrorKind::InvalidExpiry`].
    fn sign(
        &self,
        operation: &StorageOperation,
        credential: &Self::Credential,
    ) -> Result<SignedRequest>;
}
