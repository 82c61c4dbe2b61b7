//! Signer selected from configuration.

use crate::config::SignerConfig;
use crate::error::TokenClientResult;
use crate::keystore::LocalKeyStoreSigner;
use crate::kms::RemoteKmsSigner;
use crate::signer::AssertionSigner;
use rust_common::HttpConfig;
use tracing::info;

/// One of the two signing backends, chosen at construction.
#[derive(Debug)]
pub enum ConfiguredSigner {
    /// Local certificate store
    LocalKeyStore(LocalKeyStoreSigner),
    /// Remote key-management service
    RemoteKms(RemoteKmsSigner),
}

impl ConfiguredSigner {
    /// Build the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be initialized.
    pub fn from_config(config: &SignerConfig, http: &HttpConfig) -> TokenClientResult<Self> {
        let signer = match config {
            SignerConfig::LocalKeyStore {
                store_path,
                thumbprint,
            } => Self::LocalKeyStore(LocalKeyStoreSigner::from_directory(
                store_path.clone(),
                thumbprint,
            )?),
            SignerConfig::RemoteKms(kms) => {
                Self::RemoteKms(RemoteKmsSigner::new(kms.clone(), http)?)
            }
        };
        info!(
            backend = signer.backend_name(),
            key = signer.key_reference(),
            "Assertion signer configured"
        );
        Ok(signer)
    }

    /// Short backend name for logs.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::LocalKeyStore(_) => "local",
            Self::RemoteKms(_) => "kms",
        }
    }
}

impl From<LocalKeyStoreSigner> for ConfiguredSigner {
    fn from(signer: LocalKeyStoreSigner) -> Self {
        Self::LocalKeyStore(signer)
    }
}

impl From<RemoteKmsSigner> for ConfiguredSigner {
    fn from(signer: RemoteKmsSigner) -> Self {
        Self::RemoteKms(signer)
    }
}

impl AssertionSigner for ConfiguredSigner {
    async fn sign(&self, signing_input: &[u8]) -> TokenClientResult<Vec<u8>> {
        match self {
            Self::LocalKeyStore(signer) => signer.sign(signing_input).await,
            Self::RemoteKms(signer) => signer.sign(signing_input).await,
        }
    }

    fn key_reference(&self) -> &str {
        match self {
            Self::LocalKeyStore(signer) => signer.key_reference(),
            Self::RemoteKms(signer) => signer.key_reference(),
        }
    }

    fn supports_token_exchange(&self) -> bool {
        match self {
            Self::LocalKeyStore(signer) => signer.supports_token_exchange(),
            Self::RemoteKms(signer) => signer.supports_token_exchange(),
        }
    }
}
