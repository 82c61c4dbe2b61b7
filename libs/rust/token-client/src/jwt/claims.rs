//! Assertion header and claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds either side of "now" that an assertion is valid for.
pub const ASSERTION_SKEW_SECONDS: i64 = 300;

/// JOSE header of every client assertion.
///
/// Field order is the serialization order: `{"alg":"RS256","typ":"JWT"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
    /// Signature algorithm, always `RS256`
    pub alg: String,
    /// Token type, always `JWT`
    pub typ: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            alg: "RS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Client assertion claims (RFC 7523 section 3).
///
/// Field order is the serialization order: `sub, jti, nbf, exp, iss, aud`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Client id
    pub sub: String,
    /// Unique per assertion
    pub jti: Uuid,
    /// Not before, seconds since the epoch
    pub nbf: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Client id, same as `sub`
    pub iss: String,
    /// Token endpoint the assertion is presented to
    pub aud: String,
}

impl Claims {
    /// Claims for `client_id` addressed to `token_endpoint`.
    ///
    /// `now` is truncated to whole seconds; the window is `now - 300 .. now + 300`.
    pub fn new(client_id: &str, token_endpoint: &str, now: DateTime<Utc>, jti: Uuid) -> Self {
        let now = now.timestamp();
        Self {
            sub: client_id.to_string(),
            jti,
            nbf: now - ASSERTION_SKEW_SECONDS,
            exp: now + ASSERTION_SKEW_SECONDS,
            iss: client_id.to_string(),
            aud: token_endpoint.to_string(),
        }
    }
}
