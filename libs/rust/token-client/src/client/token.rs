//! Token endpoint responses.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Deserialize)]
struct RawToken {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    issued_token_type: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Token issued by the authorization server.
///
/// Fields the server returns beyond the well-known ones are kept in
/// [`Token::extra`].
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawToken")]
pub struct Token {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    id_token: Option<SecretString>,
    /// Usually `Bearer`
    pub token_type: Option<String>,
    /// Lifetime in seconds
    pub expires_in: Option<u64>,
    /// Granted scope
    pub scope: Option<String>,
    /// Token type URI for token exchange responses
    pub issued_token_type: Option<String>,
    /// Remaining response fields
    pub extra: Map<String, Value>,
}

impl From<RawToken> for Token {
    fn from(raw: RawToken) -> Self {
        Self {
            access_token: SecretString::from(raw.access_token),
            refresh_token: raw.refresh_token.map(SecretString::from),
            id_token: raw.id_token.map(SecretString::from),
            token_type: raw.token_type,
            expires_in: raw.expires_in,
            scope: raw.scope,
            issued_token_type: raw.issued_token_type,
            extra: raw.extra,
        }
    }
}

impl Token {
    /// A token holding only an access token, e.g. one obtained elsewhere and
    /// passed to token exchange as the subject.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self::from(RawToken {
            access_token: access_token.into(),
            token_type: Some("Bearer".to_string()),
            expires_in: None,
            scope: None,
            refresh_token: None,
            issued_token_type: None,
            id_token: None,
            extra: Map::new(),
        })
    }

    /// The access token.
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Refresh token, when issued.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(ExposeSecret::expose_secret)
    }

    /// OpenID Connect ID token, when issued.
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_ref().map(ExposeSecret::expose_secret)
    }
}
