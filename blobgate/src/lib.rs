//! Authorize bearer tokens and broker signed access to Azure Blob Storage.
//!
//! A [`Gateway`] takes the caller's bearer token and a [`BlobOperation`], checks the
//! token, signs the blob call with a short lived Service SAS and dispatches it with
//! bounded retries. Every request ends in an [`OperationResult`]: nothing is thrown
//! back at the caller and no result carries key material.
//!
//! # Example
//!
//! ```no_run
//! use blobgate::{BlobOperation, Gateway};
//!
//! # async fn example() -> blobgate::Result<()> {
//! let gateway = Gateway::from_env(blobgate::default_context()).await?;
//!
//! let result = gateway
//!     .handle("eyJhbGciOi...", BlobOperation::download("/photos/cat.png"))
//!     .await;
//! println!("{} {result}", result.status_code());
//! # Ok(())
//! # }
//! ```

pub use blobgate_core::*;

pub mod azure {
    //! Azure Blob Storage signing.
    pub use blobgate_azure_storage::*;
}

pub mod bearer {
    //! Bearer token verification.
    pub use blobgate_bearer_token::*;
}

mod config;
pub use config::*;

mod operation;
pub use operation::*;

mod dispatch;

mod gateway;
pub use gateway::Gateway;

/// Build a [`Context`] backed by the reqwest transport and the process env.
#[cfg(feature = "default-context")]
pub fn default_context() -> Context {
    Context::new()
        .with_http_send(blobgate_http_send_reqwest::ReqwestHttpSend::default())
        .with_env(OsEnv)
}
