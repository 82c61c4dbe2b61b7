//! OAuth2 token client authenticating with signed client assertions.
//!
//! Each call runs build, sign, POST and decode in sequence. The client holds
//! only immutable configuration, so one instance can serve concurrent calls.

pub mod form;
pub mod token;
pub mod transport;

pub use token::Token;
pub use transport::{HttpResponse, HttpTransport};

use crate::config::TokenClientConfig;
use crate::error::{TokenClientError, TokenClientResult};
use crate::jwt::{Assertion, AssertionBuilder};
use crate::signer::{AssertionSigner, ConfiguredSigner};
use reqwest::Client;
use rust_common::build_http_client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Requests tokens from one token endpoint using one signer.
pub struct TokenClient<S, T = Client> {
    token_endpoint: Url,
    signer: S,
    transport: T,
    assertions: AssertionBuilder,
}

impl TokenClient<ConfiguredSigner, Client> {
    /// Build the signer and HTTP client described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the signer or HTTP client cannot be built.
    pub fn from_config(config: TokenClientConfig) -> TokenClientResult<Self> {
        let signer = ConfiguredSigner::from_config(&config.signer, &config.http)?;
        let transport = build_http_client(&config.http)
            .map_err(|e| TokenClientError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::new(config.token_endpoint, signer, transport))
    }
}

impl<S, T> TokenClient<S, T>
where
    S: AssertionSigner,
    T: HttpTransport,
{
    /// Client for `token_endpoint`, signing with `signer` and sending over `transport`.
    pub fn new(token_endpoint: Url, signer: S, transport: T) -> Self {
        Self {
            token_endpoint,
            signer,
            transport,
            assertions: AssertionBuilder::default(),
        }
    }

    /// Replace the assertion builder (clock and `jti` source).
    #[must_use]
    pub fn with_assertion_builder(mut self, assertions: AssertionBuilder) -> Self {
        self.assertions = assertions;
        self
    }

    /// Endpoint requests are sent to, also the assertion audience.
    pub const fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }

    /// The signing backend.
    pub const fn signer(&self) -> &S {
        &self.signer
    }

    /// Build and sign a client assertion for `client_id`, audience-bound to
    /// the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank client id, or the signer's error.
    pub async fn build_client_assertion(&self, client_id: &str) -> TokenClientResult<Assertion> {
        let input = self
            .assertions
            .build_signing_input(client_id, self.token_endpoint.as_str())?;
        let signature = self.signer.sign(input.as_bytes()).await?;
        Ok(input.into_assertion(&signature))
    }

    /// Client-credentials grant for `client_id`.
    ///
    /// # Errors
    ///
    /// Returns signing errors, `TokenRequestFailed` for a non-2xx response,
    /// `MalformedResponse` if a 2xx body does not decode, or the transport's
    /// `Timeout`/`Transport` error.
    #[instrument(skip(self), fields(key = %self.signer.key_reference()))]
    pub async fn get_access_token(&self, client_id: &str) -> TokenClientResult<Token> {
        let assertion = self.build_client_assertion(client_id).await?;
        let body = form::client_credentials(client_id, assertion.as_str());
        self.request_token(body).await
    }

    /// Token exchange of `initial` for `requested_subject`, authenticated as
    /// `requested_client_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotSupported` if the signer cannot be used for token
    /// exchange, `InvalidArgument` for blank inputs, and otherwise the same
    /// errors as [`Self::get_access_token`].
    #[instrument(skip(self, initial), fields(key = %self.signer.key_reference()))]
    pub async fn exchange_token(
        &self,
        initial: &Token,
        requested_client_id: &str,
        requested_subject: &str,
    ) -> TokenClientResult<Token> {
        if !self.signer.supports_token_exchange() {
            return Err(TokenClientError::not_supported(
                "token exchange is not available with the local key store signer",
            ));
        }
        if initial.access_token().trim().is_empty() {
            return Err(TokenClientError::invalid_argument(
                "subject access token must not be empty",
            ));
        }
        if requested_subject.trim().is_empty() {
            return Err(TokenClientError::invalid_argument(
                "requested_subject must not be empty",
            ));
        }

        let assertion = self.build_client_assertion(requested_client_id).await?;
        let body = form::token_exchange(
            initial.access_token(),
            requested_subject,
            requested_client_id,
            assertion.as_str(),
        );
        self.request_token(body).await
    }

    /// [`Self::get_access_token`], abandoned with `Cancelled` if `cancel`
    /// fires first.
    ///
    /// # Errors
    ///
    /// See [`Self::get_access_token`].
    pub async fn get_access_token_with_cancellation(
        &self,
        client_id: &str,
        cancel: &CancellationToken,
    ) -> TokenClientResult<Token> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Token request cancelled");
                Err(TokenClientError::Cancelled)
            }
            result = self.get_access_token(client_id) => result,
        }
    }

    /// [`Self::exchange_token`], abandoned with `Cancelled` if `cancel` fires
    /// first.
    ///
    /// # Errors
    ///
    /// See [`Self::exchange_token`].
    pub async fn exchange_token_with_cancellation(
        &self,
        initial: &Token,
        requested_client_id: &str,
        requested_subject: &str,
        cancel: &CancellationToken,
    ) -> TokenClientResult<Token> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Token exchange cancelled");
                Err(TokenClientError::Cancelled)
            }
            result = self.exchange_token(initial, requested_client_id, requested_subject) => result,
        }
    }

    async fn request_token(&self, body: String) -> TokenClientResult<Token> {
        let response = self.transport.post_form(&self.token_endpoint, body).await?;

        if !response.is_success() {
            warn!(status = response.status, "Token request rejected");
            return Err(TokenClientError::TokenRequestFailed {
                status: response.status,
                body: response.body,
            });
        }

        let token: Token = serde_json::from_str(&response.body)?;
        info!(
            token_type = token.token_type.as_deref().unwrap_or("unknown"),
            expires_in = token.expires_in,
            "Token issued"
        );
        Ok(token)
    }
}

impl<S: std::fmt::Debug, T> std::fmt::Debug for TokenClient<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenClient")
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
