//! Azure Blob Storage signer
//!
//! This crate produces time-bounded [Service SAS] signatures for single blob
//! operations, so the gateway can call the blob store without ever shipping the
//! account key over the wire.
//!
//! # Example
//!
//! ```rust
//! use blobgate_azure_storage::{Credential, RequestSigner};
//! use blobgate_core::time::now;
//! use blobgate_core::{SignOperation, StorageOperation};
//!
//! # fn main() -> blobgate_core::Result<()> {
//! let cred = Credential::new("myaccount", "a2V5");
//! let signer = RequestSigner::new();
//!
//! let op = StorageOperation::new(
//!     http::Method::GET,
//!     "/mycontainer/path/to/blob.txt",
//!     now() + chrono::TimeDelta::minutes(5),
//! );
//! let signed = signer.sign(&op, &cred)?;
//!
//! println!("{}", signed.url("https://myaccount.blob.core.windows.net"));
//! # Ok(())
//! # }
//! ```
//!
//! [Service SAS]: https://learn.microsoft.com/en-us/rest/api/storageservices/create-service-sas

mod constants;
pub use constants::*;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::RequestSigner;

mod provide_credential;
pub use provide_credential::*;
