use blobgate_core::hash::base64_url_decode;
use blobgate_core::time::{from_timestamp, DateTime};
use blobgate_core::{AuthorizationResult, Claims, Context, Result, VerifyToken};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use log::debug;
use serde::Deserialize;

use crate::config::Config;
use crate::key::PublicKeyMaterial;

/// Registered claims read from the token payload.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    nbf: Option<i64>,
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// TokenVerifier checks bearer tokens against a single public key.
///
/// Verification never touches the network or the clock: the caller passes `now`.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    key: PublicKeyMaterial,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenVerifier {
    /// Create a verifier that accepts tokens signed by `key`.
    pub fn new(key: PublicKeyMaterial) -> Self {
        Self {
            key,
            issuer: None,
            audience: None,
        }
    }

    /// Build a verifier from config, loading the key once.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut verifier = Self::new(config.public_key_material()?);
        verifier.issuer = config.issuer.clone();
        verifier.audience = config.audience.clone();
        Ok(verifier)
    }

    /// Build a verifier from the env values in `ctx`.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        Self::from_config(&Config::default().from_env(ctx))
    }

    /// Only accept tokens whose `iss` equals `issuer`.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Only accept tokens whose `aud` contains `audience`.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.key.algorithm());
        // Time based claims are checked against the caller's `now`, not the system clock.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        let mut required = vec!["exp", "sub"];
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        match &self.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                required.push("aud");
            }
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&required);

        validation
    }
}

impl VerifyToken for TokenVerifier {
    fn verify(&self, token: &str, now: DateTime) -> AuthorizationResult {
        let token = token.trim();
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            debug!("bearer token rejected: expected 3 non-empty segments");
            return AuthorizationResult::Malformed;
        }

        let header = match decode_header(token) {
            Ok(header) => header,
            Err(e) => {
                debug!("bearer token rejected: invalid header: {e}");
                return AuthorizationResult::Malformed;
            }
        };

        let claims = match read_claims(segments[1]) {
            Some(claims) => claims,
            None => {
                debug!("bearer token rejected: payload is not a json object");
                return AuthorizationResult::Malformed;
            }
        };

        let Some(expires_at) = claims.exp.filter(|exp| *exp > 0).and_then(from_timestamp) else {
            debug!("bearer token rejected: missing exp");
            return AuthorizationResult::Malformed;
        };
        if now >= expires_at {
            debug!("bearer token rejected: expired at {expires_at}");
            return AuthorizationResult::Expired;
        }

        // Expiry is decided before anything about the signature, algorithm included.
        if header.alg != self.key.algorithm() {
            debug!(
                "bearer token rejected: algorithm {:?} does not match key algorithm {:?}",
                header.alg,
                self.key.algorithm()
            );
            return AuthorizationResult::Denied("algorithm mismatch".to_string());
        }

        let Some(subject) = claims.sub.filter(|sub| !sub.trim().is_empty()) else {
            debug!("bearer token rejected: missing sub");
            return AuthorizationResult::Malformed;
        };

        let checked =
            decode::<serde_json::Value>(token, self.key.decoding_key(), &self.validation());
        if let Err(e) = checked {
            debug!("bearer token rejected: {e}");
            return match e.kind() {
                JwtErrorKind::InvalidToken
                | JwtErrorKind::Base64(_)
                | JwtErrorKind::Json(_)
                | JwtErrorKind::Utf8(_) => AuthorizationResult::Malformed,
                JwtErrorKind::InvalidSignature => {
                    AuthorizationResult::Denied("invalid signature".to_string())
                }
                JwtErrorKind::InvalidIssuer => {
                    AuthorizationResult::Denied("issuer mismatch".to_string())
                }
                JwtErrorKind::InvalidAudience => {
                    AuthorizationResult::Denied("audience mismatch".to_string())
                }
                JwtErrorKind::MissingRequiredClaim(claim) => {
                    AuthorizationResult::Denied(format!("missing claim {claim}"))
                }
                _ => AuthorizationResult::Denied("verification failed".to_string()),
            };
        }

        if let Some(nbf) = claims.nbf {
            if now.timestamp() < nbf {
                debug!("bearer token rejected: not valid before {nbf}");
                return AuthorizationResult::Denied("token not yet valid".to_string());
            }
        }

        let mut verified = Claims::new(subject, expires_at);
        if let Some(scope) = &claims.scope {
            verified = verified.with_scope(scope);
        }
        if let Some(issuer) = claims.iss {
            verified = verified.with_issuer(issuer);
        }

        debug!("bearer token accepted for subject {}", verified.subject());
        AuthorizationResult::Authorized(verified)
    }
}

/// Read the payload segment without checking the signature.
fn read_claims(segment: &str) -> Option<TokenClaims> {
    let payload = base64_url_decode(segment).ok()?;
    serde_json::from_slice(&payload).ok()
}
