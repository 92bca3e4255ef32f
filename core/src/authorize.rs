use crate::time::DateTime;
use std::fmt;

/// Claims decoded from a verified bearer credential.
///
/// Claims are immutable once built: there is no setter for `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    subject: String,
    expires_at: DateTime,
    scope: Vec<String>,
    issuer: Option<String>,
}

impl Claims {
    /// Create claims with a subject and expiry.
    pub fn new(subject: impl Into<String>, expires_at: DateTime) -> Self {
        Self {
            subject: subject.into(),
            expires_at,
            scope: Vec::new(),
            issuer: None,
        }
    }

    /// Attach a space separated scope string.
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.split_whitespace().map(str::to_string).collect();
        self
    }

    /// Attach the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// The `sub` claim.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The `exp` claim.
    pub fn expires_at(&self) -> DateTime {
        self.expires_at
    }

    /// Individual scope entries.
    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    /// The `iss` claim, if any.
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Check whether the credential grants the given scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|s| s == scope)
    }
}

/// Outcome of verifying a bearer credential.
///
/// `Expired` is kept apart from `Denied` so callers can tell "retry with a fresh
/// token" from "access forbidden".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    /// Signature and claims checked out.
    Authorized(Claims),
    /// The credential is well formed but not acceptable.
    Denied(String),
    /// The credential expired at or before the verification instant.
    Expired,
    /// The credential could not be parsed or misses a required claim.
    Malformed,
}

impl AuthorizationResult {
    /// Returns true for `Authorized`.
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthorizationResult::Authorized(_))
    }

    /// Take the claims out of an `Authorized` outcome.
    pub fn into_claims(self) -> Option<Claims> {
        match self {
            AuthorizationResult::Authorized(claims) => Some(claims),
            _ => None,
        }
    }
}

impl fmt::Display for AuthorizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorizationResult::Authorized(claims) => write!(f, "authorized({})", claims.subject),
            AuthorizationResult::Denied(reason) => write!(f, "denied({reason})"),
            AuthorizationResult::Expired => write!(f, "expired"),
            AuthorizationResult::Malformed => write!(f, "malformed"),
        }
    }
}
