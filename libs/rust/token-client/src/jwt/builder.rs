//! Signing-input construction with injectable time and `jti` sources.

use crate::error::{TokenClientError, TokenClientResult};
use crate::jwt::assertion::SigningInput;
use crate::jwt::claims::{Claims, Header};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of `jti` values. Implementations must never repeat a value.
pub trait JtiGenerator: Send + Sync {
    /// Next `jti`.
    fn generate(&self) -> Uuid;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJti;

impl JtiGenerator for RandomJti {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Build the unsigned `base64url(header).base64url(claims)` input.
///
/// # Errors
///
/// Returns [`TokenClientError::InvalidArgument`] if `client_id` or
/// `token_endpoint` is blank.
pub fn build_signing_input(
    client_id: &str,
    token_endpoint: &str,
    clock: &dyn Clock,
    ids: &dyn JtiGenerator,
) -> TokenClientResult<SigningInput> {
    if client_id.trim().is_empty() {
        return Err(TokenClientError::invalid_argument("client_id must not be empty"));
    }
    if token_endpoint.trim().is_empty() {
        return Err(TokenClientError::invalid_argument(
            "token_endpoint must not be empty",
        ));
    }

    let claims = Claims::new(client_id, token_endpoint, clock.now(), ids.generate());
    SigningInput::encode(&Header::default(), &claims)
}

/// Builds signing inputs with an injected clock and `jti` source.
#[derive(Clone)]
pub struct AssertionBuilder {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn JtiGenerator>,
}

impl Default for AssertionBuilder {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(RandomJti))
    }
}

impl std::fmt::Debug for AssertionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertionBuilder").finish_non_exhaustive()
    }
}

impl AssertionBuilder {
    /// Builder with an explicit clock and `jti` source.
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn JtiGenerator>) -> Self {
        Self { clock, ids }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the `jti` source.
    #[must_use]
    pub fn with_jti_generator(mut self, ids: Arc<dyn JtiGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// See [`build_signing_input`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::InvalidArgument`] on blank inputs.
    pub fn build_signing_input(
        &self,
        client_id: &str,
        token_endpoint: &str,
    ) -> TokenClientResult<SigningInput> {
        build_signing_input(client_id, token_endpoint, self.clock.as_ref(), self.ids.as_ref())
    }
}
