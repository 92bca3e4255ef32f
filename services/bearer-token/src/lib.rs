//! Bearer token verification
//!
//! Checks signed JSON Web Tokens against a single public key and turns them into
//! an [`AuthorizationResult`](blobgate_core::AuthorizationResult).
//!
//! # Example
//!
//! ```no_run
//! use blobgate_bearer_token::TokenVerifier;
//! use blobgate_core::time::now;
//! use blobgate_core::{Context, OsEnv, VerifyToken};
//!
//! # fn main() -> blobgate_core::Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let verifier = TokenVerifier::from_env(&ctx)?;
//!
//! let result = verifier.verify("eyJhbGciOi...", now());
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

mod constants;
pub use constants::*;

mod config;
pub use config::Config;

mod key;
pub use key::{normalize_pem, parse_algorithm, PublicKeyMaterial};

mod verifier;
pub use verifier::TokenVerifier;

pub use jsonwebtoken::Algorithm;
