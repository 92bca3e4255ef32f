use blobgate_core::{Error, Result};
use jsonwebtoken::{Algorithm, DecodingKey};
use std::fmt::{self, Debug};
use std::str::FromStr;

/// Public key used to check token signatures.
///
/// The key is bound to exactly one algorithm: tokens whose header names another
/// algorithm are refused before their signature is looked at.
#[derive(Clone)]
pub struct PublicKeyMaterial {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
}

impl Debug for PublicKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyMaterial")
            .field("algorithm", &self.algorithm)
            .field("decoding_key", &"<redacted>")
            .finish()
    }
}

impl PublicKeyMaterial {
    /// Load a PEM encoded public key issued for `algorithm`.
    ///
    /// The PEM may come with its newlines escaped as `<br>` or as a literal `\n`,
    /// which is how single line env values usually carry it.
    pub fn from_pem(pem: &str, algorithm: Algorithm) -> Result<Self> {
        let pem = normalize_pem(pem);

        let decoding_key = match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem.as_bytes()),
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem.as_bytes()),
            Algorithm::EdDSA => DecodingKey::from_ed_pem(pem.as_bytes()),
            _ => {
                return Err(Error::config_invalid(format!(
                    "algorithm {algorithm:?} is not a public key algorithm"
                )))
            }
        }
        .map_err(|e| {
            Error::config_invalid(format!("invalid {algorithm:?} public key pem")).with_source(e)
        })?;

        Ok(Self {
            algorithm,
            decoding_key,
        })
    }

    /// Algorithm this key was issued for.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// Parse a JWT algorithm name such as `RS256` or `EdDSA`.
pub fn parse_algorithm(name: &str) -> Result<Algorithm> {
    Algorithm::from_str(name.trim()).map_err(|e| {
        Error::config_invalid(format!("unknown jwt algorithm {name:?}")).with_source(e)
    })
}

/// Restore the newlines of a PEM that went through a single line transport.
pub fn normalize_pem(raw: &str) -> String {
    raw.replace("<br>", "\n")
        .replace("\\n", "\n")
        .trim()
        .to_string()
}
