//! Credentials for calling the key-management service.

use crate::config::{CredentialSource, KMS_RESOURCE};
use crate::error::{TokenClientError, TokenClientResult};
use async_trait::async_trait;
use reqwest::Client;
use rust_common::{HttpConfig, build_http_client};
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

/// What a credential is being requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    /// Resource (audience) of the token
    pub resource: String,
}

impl CredentialRequest {
    /// Request for the key vault resource.
    #[must_use]
    pub fn key_vault() -> Self {
        Self {
            resource: KMS_RESOURCE.to_string(),
        }
    }
}

/// Provides bearer tokens for the key-management service.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Obtain a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::AuthenticationError`] if no token can be
    /// obtained.
    async fn get_token(&self, request: &CredentialRequest) -> TokenClientResult<SecretString>;
}

/// A fixed token supplied by the embedding application.
#[derive(Debug, Clone)]
pub struct StaticCredential(SecretString);

impl StaticCredential {
    /// Wrap a token obtained elsewhere.
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

impl From<SecretString> for StaticCredential {
    fn from(token: SecretString) -> Self {
        Self(token)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn get_token(&self, _request: &CredentialRequest) -> TokenClientResult<SecretString> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct IdentityTokenResponse {
    access_token: String,
}

/// Managed identity served by the instance metadata endpoint.
///
/// Every call goes to the endpoint; token caching is left to the platform.
#[derive(Debug, Clone)]
pub struct ManagedIdentityCredential {
    endpoint: Url,
    client_id: Option<String>,
    http: Client,
}

impl ManagedIdentityCredential {
    /// # Errors
    ///
    /// Returns [`TokenClientError::Config`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: Url,
        client_id: Option<String>,
        http: &HttpConfig,
    ) -> TokenClientResult<Self> {
        // The metadata endpoint is link-local plain HTTP.
        let http = build_http_client(&http.clone().with_https_only(false))
            .map_err(|e| TokenClientError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            endpoint,
            client_id,
            http,
        })
    }

    fn token_url(&self, request: &CredentialRequest) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("api-version", "2018-02-01")
                .append_pair("resource", &request.resource);
            if let Some(client_id) = &self.client_id {
                query.append_pair("client_id", client_id);
            }
        }
        url
    }
}

#[async_trait]
impl CredentialProvider for ManagedIdentityCredential {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_token(&self, request: &CredentialRequest) -> TokenClientResult<SecretString> {
        let response = self
            .http
            .get(self.token_url(request))
            .header("Metadata", "true")
            .send()
            .await
            .map_err(|e| TokenClientError::authentication(format!("identity endpoint: {e}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(TokenClientError::authentication(format!(
                "Error fetching management token ({}): {text}",
                status.as_u16()
            )));
        }

        let token: IdentityTokenResponse = serde_json::from_str(&text).map_err(|e| {
            TokenClientError::authentication(format!("identity response not understood: {e}"))
        })?;

        debug!("Managed identity token acquired");
        Ok(SecretString::from(token.access_token))
    }
}

/// Build the provider described by `source`.
///
/// # Errors
///
/// Returns [`TokenClientError::Config`] if the provider cannot be built.
pub fn credential_from_source(
    source: &CredentialSource,
    http: &HttpConfig,
) -> TokenClientResult<Arc<dyn CredentialProvider>> {
    Ok(match source {
        CredentialSource::Static(token) => Arc::new(StaticCredential::from(token.clone())),
        CredentialSource::ManagedIdentity { client_id, endpoint } => Arc::new(
            ManagedIdentityCredential::new(endpoint.clone(), client_id.clone(), http)?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn identity(server: &MockServer, client_id: Option<&str>) -> ManagedIdentityCredential {
        let endpoint = Url::parse(&format!("{}/metadata/identity/oauth2/token", server.uri()))
            .unwrap();
        ManagedIdentityCredential::new(
            endpoint,
            client_id.map(str::to_string),
            &HttpConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_static_credential() {
        let credential = StaticCredential::new("fixed");
        let token = credential
            .get_token(&CredentialRequest::key_vault())
            .await
            .unwrap();
        assert_eq!(token.expose_secret(), "fixed");
    }

    #[tokio::test]
    async fn test_managed_identity_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata/identity/oauth2/token"))
            .and(header("Metadata", "true"))
            .and(query_param("resource", "https://vault.azure.net"))
            .and(query_param("client_id", "mi-client"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "kv-token"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let token = identity(&server, Some("mi-client"))
            .get_token(&CredentialRequest::key_vault())
            .await
            .unwrap();
        assert_eq!(token.expose_secret(), "kv-token");
    }

    #[tokio::test]
    async fn test_managed_identity_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "kv-token"})),
            )
            .mount(&server)
            .await;

        identity(&server, None)
            .get_token(&CredentialRequest::key_vault())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let pairs: Vec<(String, String)> = requests[0]
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("api-version".to_string(), "2018-02-01".to_string()),
                ("resource".to_string(), KMS_RESOURCE.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_managed_identity_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("identity not found"))
            .mount(&server)
            .await;

        let err = identity(&server, None)
            .get_token(&CredentialRequest::key_vault())
            .await
            .unwrap_err();
        assert!(matches!(err, TokenClientError::AuthenticationError(_)));
        assert!(err.to_string().contains("(400): identity not found"));
    }
}
