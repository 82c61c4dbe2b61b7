//! HTTP collaborator for token endpoint requests.
//!
//! Timeouts, pooling and TLS belong to the transport; the client never
//! retries.

use crate::error::TokenClientResult;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};
use url::Url;

/// Status and raw body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Posts form-encoded bodies.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `body` as `application/x-www-form-urlencoded` to `url`.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` or `Transport` when no response is received.
    async fn post_form(&self, url: &Url, body: String) -> TokenClientResult<HttpResponse>;
}

#[async_trait]
impl HttpTransport for Client {
    #[instrument(skip(self, body), fields(url = %url))]
    async fn post_form(&self, url: &Url, body: String) -> TokenClientResult<HttpResponse> {
        let response = self
            .post(url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, "Token endpoint responded");

        Ok(HttpResponse { status, body })
    }
}
