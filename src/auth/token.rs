use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// HMAC family accepted on verify. Tokens are always minted with HS256.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing secret is not configured")]
    MissingSecret,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unexpected signing method: {0}")]
    BadAlgorithm(String),

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token expired at {0}")]
    Expired(i64),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Payload as it travels on the wire. `userID` is a decimal string for
/// compatibility with existing clients.
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    #[serde(rename = "userID")]
    user_id: String,
    #[serde(rename = "expiresAt")]
    expires_at: i64,
}

/// Verified token contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: i64,
    pub expires_at: i64,
}

/// Mints and verifies HS256 bearer tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    pub fn mint(&self, user_id: i64) -> Result<String, TokenError> {
        self.mint_at(user_id, Utc::now().timestamp())
    }

    /// Mint a token as if the current time were `now` (unix seconds).
    pub fn mint_at(&self, user_id: i64, now: i64) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let expires_at = now
            .checked_add(self.ttl_secs)
            .ok_or_else(|| TokenError::Signing(format!("expiry overflows with ttl {}s", self.ttl_secs)))?;

        let claims = WireClaims {
            user_id: user_id.to_string(),
            expires_at,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify structure, algorithm, signature and expiry, in that order.
    /// A token minted at `t0` is valid on `[t0, t0 + ttl)`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let algorithm = header_algorithm(token)?;

        let mut validation = Validation::new(algorithm);
        // Expiry lives in `expiresAt`, not the registered `exp` claim.
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;

        let data = decode::<WireClaims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::InvalidAlgorithm => TokenError::BadAlgorithm(format!("{:?}", algorithm)),
                other => TokenError::Malformed(format!("{:?}", other)),
            })?;

        let user_id = data
            .claims
            .user_id
            .parse::<i64>()
            .map_err(|_| TokenError::Malformed(format!("non-numeric userID '{}'", data.claims.user_id)))?;

        if now >= data.claims.expires_at {
            return Err(TokenError::Expired(data.claims.expires_at));
        }

        Ok(TokenClaims {
            user_id,
            expires_at: data.claims.expires_at,
        })
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Read `alg` from the header segment without trusting anything else in it.
fn header_algorithm(token: &str) -> Result<Algorithm, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, _, _] = segments.as_slice() else {
        return Err(TokenError::Malformed(format!("expected 3 segments, found {}", segments.len())));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| TokenError::Malformed(format!("header: {}", e)))?;
    let raw: RawHeader =
        serde_json::from_slice(&bytes).map_err(|e| TokenError::Malformed(format!("header: {}", e)))?;

    HMAC_ALGORITHMS
        .iter()
        .copied()
        .find(|alg| format!("{:?}", alg) == raw.alg)
        .ok_or(TokenError::BadAlgorithm(raw.alg))
}
