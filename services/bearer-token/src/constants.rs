// Env values used to configure token verification.
pub const MIKROSERVICE_JWT_PUBLIC_KEY: &str = "MIKROSERVICE_JWT_PUBLIC_KEY";
pub const MIKROSERVICE_JWT_ALGORITHM: &str = "MIKROSERVICE_JWT_ALGORITHM";
pub const MIKROSERVICE_JWT_ISSUER: &str = "MIKROSERVICE_JWT_ISSUER";
pub const MIKROSERVICE_JWT_AUDIENCE: &str = "MIKROSERVICE_JWT_AUDIENCE";

/// Algorithm assumed when none is configured.
pub const DEFAULT_JWT_ALGORITHM: &str = "RS256";
