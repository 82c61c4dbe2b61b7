//! Compact JWS assembly for client assertions.

use crate::error::{TokenClientError, TokenClientResult};
use crate::jwt::claims::{Claims, Header};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;

/// `base64url(header) "." base64url(claims)`, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningInput(String);

impl SigningInput {
    pub(crate) fn encode(header: &Header, claims: &Claims) -> TokenClientResult<Self> {
        let header = serde_json::to_vec(header)
            .map_err(|e| TokenClientError::signature(format!("header encoding failed: {e}")))?;
        let claims = serde_json::to_vec(claims)
            .map_err(|e| TokenClientError::signature(format!("claims encoding failed: {e}")))?;

        Ok(Self(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        )))
    }

    /// The `header.claims` text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// UTF-8 bytes that the signer signs.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Decode the header segment.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::MalformedResponse`] if the segment does not decode.
    pub fn header(&self) -> TokenClientResult<Header> {
        decode_segment(self.0.split('.').next().unwrap_or_default())
    }

    /// Decode the claims segment.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::MalformedResponse`] if the segment does not decode.
    pub fn claims(&self) -> TokenClientResult<Claims> {
        decode_segment(self.0.split('.').nth(1).unwrap_or_default())
    }

    /// Append the signature, producing the compact JWT.
    pub fn into_assertion(self, signature: &[u8]) -> Assertion {
        let signing_input_len = self.0.len();
        let mut token = self.0;
        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(signature));
        Assertion {
            token,
            signing_input_len,
        }
    }
}

impl AsRef<[u8]> for SigningInput {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// A signed client assertion.
///
/// This is a bearer credential for its validity window, so `Debug` omits the
/// signature.
#[derive(Clone, PartialEq, Eq)]
pub struct Assertion {
    token: String,
    signing_input_len: usize,
}

impl Assertion {
    /// The compact `header.claims.signature` form.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// The `header.claims` part that was signed.
    pub fn signing_input(&self) -> &str {
        &self.token[..self.signing_input_len]
    }

    /// The base64url signature segment.
    pub fn signature(&self) -> &str {
        &self.token[self.signing_input_len + 1..]
    }

    /// Decoded signature bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::MalformedResponse`] if the segment is not base64url.
    pub fn signature_bytes(&self) -> TokenClientResult<Vec<u8>> {
        URL_SAFE_NO_PAD
            .decode(self.signature())
            .map_err(|e| TokenClientError::malformed(e.to_string()))
    }

    /// Take the compact form.
    pub fn into_string(self) -> String {
        self.token
    }
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("signing_input", &self.signing_input())
            .field("signature", &"[REDACTED]")
            .finish()
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> TokenClientResult<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenClientError::malformed(e.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}
