//! Assertion signing capability.
//!
//! Uses native async traits (Rust 2024 edition). Two backends implement it:
//! [`crate::keystore::LocalKeyStoreSigner`] and [`crate::kms::RemoteKmsSigner`].
//! Both produce RS256 signatures over the exact signing-input bytes.

pub mod configured;

pub use configured::ConfiguredSigner;

use crate::error::TokenClientResult;
use std::future::Future;

/// The only JWS algorithm this crate signs with.
pub const RS256: &str = "RS256";

/// RS256 signer over signing-input bytes.
pub trait AssertionSigner: Send + Sync {
    /// Sign `signing_input` and return the raw signature bytes.
    fn sign(
        &self,
        signing_input: &[u8],
    ) -> impl Future<Output = TokenClientResult<Vec<u8>>> + Send;

    /// Identity of the key used: certificate thumbprint or remote key name.
    fn key_reference(&self) -> &str;

    /// Algorithm name for the JWT header.
    fn algorithm(&self) -> &'static str {
        RS256
    }

    /// Whether token exchange is available with this backend.
    fn supports_token_exchange(&self) -> bool {
        true
    }
}
