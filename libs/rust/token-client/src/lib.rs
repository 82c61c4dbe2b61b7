//! OAuth2 token client using JWT-bearer client assertions.
//!
//! Provides RS256 client assertion building (RFC 7523), signing with a local
//! certificate store or a remote key-management service, the
//! client-credentials grant, and token exchange (RFC 8693).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod jwt;
pub mod keystore;
pub mod kms;
pub mod signer;

// Re-exports for convenience
pub use client::{HttpResponse, HttpTransport, Token, TokenClient};
pub use config::{CredentialSource, KmsConfig, SignerConfig, TokenClientConfig};
pub use error::{TokenClientError, TokenClientResult};
pub use jwt::{Assertion, AssertionBuilder, SigningInput, build_signing_input};
pub use keystore::{LocalKeyStoreSigner, Thumbprint};
pub use kms::RemoteKmsSigner;
pub use signer::{AssertionSigner, ConfiguredSigner};
pub use tokio_util::sync::CancellationToken;
