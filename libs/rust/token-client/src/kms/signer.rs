//! Remote KMS signer.
//!
//! The SHA-256 digest of the signing input is computed locally; only the
//! digest is sent to the key-management service, which signs it with a key
//! that never leaves the service.

use crate::config::KmsConfig;
use crate::error::{TokenClientError, TokenClientResult};
use crate::kms::credential::{CredentialProvider, CredentialRequest, credential_from_source};
use crate::signer::{AssertionSigner, RS256};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Client;
use rust_common::{HttpConfig, build_http_client};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Serialize)]
struct SignRequest<'a> {
    alg: &'a str,
    value: String,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(default)]
    kid: Option<String>,
    value: String,
}

#[derive(Deserialize)]
struct ServiceErrorBody {
    error: ServiceError,
}

#[derive(Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Signs digests with a key held by a remote key-management service.
pub struct RemoteKmsSigner {
    config: KmsConfig,
    sign_url: Url,
    http: Client,
    credential: Arc<dyn CredentialProvider>,
}

impl RemoteKmsSigner {
    /// Build a signer using the credential named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::Config`] if the sign URL or HTTP client
    /// cannot be built.
    pub fn new(config: KmsConfig, http: &HttpConfig) -> TokenClientResult<Self> {
        let credential = credential_from_source(&config.credential, http)?;
        Self::with_credential(config, http, credential)
    }

    /// Build a signer with an explicit credential provider.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::Config`] if the sign URL or HTTP client
    /// cannot be built.
    pub fn with_credential(
        config: KmsConfig,
        http: &HttpConfig,
        credential: Arc<dyn CredentialProvider>,
    ) -> TokenClientResult<Self> {
        let sign_url = config.sign_url()?;
        let http = build_http_client(http)
            .map_err(|e| TokenClientError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            sign_url,
            http,
            credential,
        })
    }

    /// Configuration this signer was built from.
    pub const fn config(&self) -> &KmsConfig {
        &self.config
    }

    fn service_error(status: u16, body: &str) -> TokenClientError {
        match serde_json::from_str::<ServiceErrorBody>(body) {
            Ok(parsed) => TokenClientError::remote_signing(
                status,
                parsed.error.code,
                parsed.error.message.unwrap_or_else(|| body.to_string()),
            ),
            Err(_) => TokenClientError::remote_signing(status, None, body),
        }
    }
}

impl std::fmt::Debug for RemoteKmsSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteKmsSigner")
            .field("sign_url", &self.sign_url.as_str())
            .finish_non_exhaustive()
    }
}

impl AssertionSigner for RemoteKmsSigner {
    #[instrument(
        skip(self, signing_input),
        fields(key = %self.config.key_name, vault = %self.config.vault_uri)
    )]
    async fn sign(&self, signing_input: &[u8]) -> TokenClientResult<Vec<u8>> {
        let digest = Sha256::digest(signing_input);

        let token = self
            .credential
            .get_token(&CredentialRequest::key_vault())
            .await?;

        let body = SignRequest {
            alg: RS256,
            value: URL_SAFE_NO_PAD.encode(digest),
        };

        let response = self
            .http
            .post(self.sign_url.clone())
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TokenClientError::Timeout
                } else {
                    TokenClientError::remote_signing(0, None, e.without_url().to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TokenClientError::Timeout
            } else {
                TokenClientError::remote_signing(
                    status.as_u16(),
                    None,
                    e.without_url().to_string(),
                )
            }
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Remote sign call rejected");
            return Err(Self::service_error(status.as_u16(), &text));
        }

        let signature = serde_json::from_str::<SignResponse>(&text)
            .ok()
            .and_then(|parsed| {
                URL_SAFE_NO_PAD
                    .decode(parsed.value.trim_end_matches('='))
                    .ok()
                    .map(|signature| (parsed.kid, signature))
            });
        let Some((kid, signature)) = signature else {
            warn!(status = status.as_u16(), "Remote sign response not understood");
            return Err(TokenClientError::remote_signing(status.as_u16(), None, text));
        };
        if signature.is_empty() {
            return Err(TokenClientError::signature(
                "key-management service returned an empty signature",
            ));
        }

        debug!(kid = ?kid, len = signature.len(), "Assertion signed remotely");
        Ok(signature)
    }

    fn key_reference(&self) -> &str {
        &self.config.key_name
    }
}
