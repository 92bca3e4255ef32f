//! Core components for the blobgate gateway.
//!
//! This crate provides the foundational types and traits shared by the token verifier,
//! the storage signer and the gateway itself.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for HTTP sending and environment access
//! - **Traits**: Seams for token verification (`VerifyToken`), operation signing (`SignOperation`)
//!   and credential loading (`ProvideCredential`)
//! - **Data**: `Claims`, `AuthorizationResult`, `StorageOperation` and `SignedRequest`
//!
//! ## Example
//!
//! ```no_run
//! use blobgate_core::time::{now, DateTime};
//! use blobgate_core::{AuthorizationResult, Claims, VerifyToken};
//!
//! #[derive(Debug)]
//! struct AllowAll;
//!
//! impl VerifyToken for AllowAll {
//!     fn verify(&self, token: &str, now: DateTime) -> AuthorizationResult {
//!         if token.is_empty() {
//!             return AuthorizationResult::Malformed;
//!         }
//!         AuthorizationResult::Authorized(Claims::new(
//!             "anonymous",
//!             now + chrono::TimeDelta::minutes(5),
//!         ))
//!     }
//! }
//!
//! let result = AllowAll.verify("token", now());
//! assert!(result.is_authorized());
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: HMAC and base64 helpers
//! - [`time`]: Time formatting and parsing
//! - [`utils`]: Redaction of sensitive values in logs

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};

mod context;
pub use context::{Context, Env, HttpSend, NoopEnv, NoopHttpSend, OsEnv, StaticEnv};

mod api;
pub use api::{ProvideCredential, SignOperation, SigningCredential, VerifyToken};

mod authorize;
pub use authorize::{AuthorizationResult, Claims};

mod request;
pub use request::{SignedRequest, StorageOperation};
