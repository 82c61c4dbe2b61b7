//! Signing with keys held in a local certificate store.

use crate::error::{TokenClientError, TokenClientResult};
use crate::keystore::store::{CertificateStore, PemDirectoryStore};
use crate::keystore::thumbprint::Thumbprint;
use crate::signer::AssertionSigner;
use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Signs with a private key found in a local certificate store.
///
/// The certificate is located by exact thumbprint on every call. There is no
/// fallback to another certificate when the thumbprint is absent.
#[derive(Clone)]
pub struct LocalKeyStoreSigner {
    store: Arc<dyn CertificateStore>,
    thumbprint: Thumbprint,
}

impl LocalKeyStoreSigner {
    /// Sign with the certificate in `store` matching `thumbprint`.
    pub fn new(store: Arc<dyn CertificateStore>, thumbprint: Thumbprint) -> Self {
        Self { store, thumbprint }
    }

    /// Open a [`PemDirectoryStore`] and sign with the certificate matching
    /// `thumbprint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the thumbprint is malformed or the directory
    /// cannot be opened.
    pub fn from_directory(dir: impl Into<PathBuf>, thumbprint: &str) -> TokenClientResult<Self> {
        let store = PemDirectoryStore::open(dir)?;
        Ok(Self::new(Arc::new(store), Thumbprint::parse(thumbprint)?))
    }

    /// Thumbprint of the certificate this signer looks up.
    pub const fn thumbprint(&self) -> &Thumbprint {
        &self.thumbprint
    }

    fn sign_blocking(
        store: &dyn CertificateStore,
        thumbprint: &Thumbprint,
        signing_input: &[u8],
    ) -> TokenClientResult<Vec<u8>> {
        let cert = store
            .find_by_thumbprint(thumbprint)?
            .ok_or_else(|| TokenClientError::key_not_found(thumbprint.to_string()))?;
        let key = cert.signing_key()?;

        let digest = Sha256::digest(signing_input);
        key.sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| TokenClientError::signature(format!("RS256 signing failed: {e}")))
    }
}

impl std::fmt::Debug for LocalKeyStoreSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeyStoreSigner")
            .field("thumbprint", &self.thumbprint)
            .finish_non_exhaustive()
    }
}

impl AssertionSigner for LocalKeyStoreSigner {
    #[instrument(skip(self, signing_input), fields(thumbprint = %self.thumbprint))]
    async fn sign(&self, signing_input: &[u8]) -> TokenClientResult<Vec<u8>> {
        let store = Arc::clone(&self.store);
        let thumbprint = self.thumbprint.clone();
        let input = signing_input.to_vec();

        // Store scans and RSA private-key operations block.
        let signature = tokio::task::spawn_blocking(move || {
            Self::sign_blocking(store.as_ref(), &thumbprint, &input)
        })
        .await
        .map_err(|e| TokenClientError::signature(format!("signing task failed: {e}")))??;

        debug!(len = signature.len(), "Assertion signed with local key");
        Ok(signature)
    }

    fn key_reference(&self) -> &str {
        self.thumbprint.as_str()
    }

    fn supports_token_exchange(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::store::InMemoryCertificateStore;
    use rsa::RsaPublicKey;
    use rsa::pkcs8::DecodePublicKey;
    use test_utils::fixtures::{
        ENCIPHER_ONLY_CERT_FINGERPRINT, PUBLIC_ONLY_CERT_FINGERPRINT, SIGNING_CERT_BUNDLE_PEM,
        SIGNING_CERT_FINGERPRINT, SIGNING_CERT_SHA1_FINGERPRINT, SIGNING_PUBLIC_KEY_PEM,
        certificate_store_dir,
    };

    fn verify(input: &[u8], signature: &[u8]) -> bool {
        let public = RsaPublicKey::from_public_key_pem(SIGNING_PUBLIC_KEY_PEM).unwrap();
        public
            .verify(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(input), signature)
            .is_ok()
    }

    #[tokio::test]
    async fn test_sign_verifies_with_certificate_key() {
        let signer =
            LocalKeyStoreSigner::from_directory(certificate_store_dir(), SIGNING_CERT_FINGERPRINT)
                .unwrap();

        let signature = signer.sign(b"header.claims").await.unwrap();
        assert_eq!(signature.len(), 256);
        assert!(verify(b"header.claims", &signature));
        assert!(!verify(b"header.claimz", &signature));
    }

    #[tokio::test]
    async fn test_unknown_thumbprint_is_key_not_found() {
        let mut store = InMemoryCertificateStore::new();
        store.add_pem(SIGNING_CERT_BUNDLE_PEM).unwrap();
        let missing = Thumbprint::parse(&"A".repeat(64)).unwrap();
        let signer = LocalKeyStoreSigner::new(Arc::new(store), missing);

        let err = signer.sign(b"x").await.unwrap_err();
        assert!(matches!(err, TokenClientError::KeyNotFound(ref t) if t == &"A".repeat(64)));
    }

    #[tokio::test]
    async fn test_sha1_thumbprint_resolves() {
        let signer = LocalKeyStoreSigner::from_directory(
            certificate_store_dir(),
            SIGNING_CERT_SHA1_FINGERPRINT,
        )
        .unwrap();

        let signature = signer.sign(b"header.claims").await.unwrap();
        assert!(verify(b"header.claims", &signature));
        assert_eq!(
            signer.key_reference(),
            "89D4D09D125C78283300C609C5E01A9C9D54CDEF"
        );
    }

    #[tokio::test]
    async fn test_unknown_sha1_thumbprint_is_key_not_found() {
        let mut store = InMemoryCertificateStore::new();
        store.add_pem(SIGNING_CERT_BUNDLE_PEM).unwrap();
        let missing = Thumbprint::parse(&"B".repeat(40)).unwrap();
        let signer = LocalKeyStoreSigner::new(Arc::new(store), missing);

        let err = signer.sign(b"x").await.unwrap_err();
        assert!(matches!(err, TokenClientError::KeyNotFound(ref t) if t == &"B".repeat(40)));
    }

    #[tokio::test]
    async fn test_key_access_denied_cases() {
        for fingerprint in [PUBLIC_ONLY_CERT_FINGERPRINT, ENCIPHER_ONLY_CERT_FINGERPRINT] {
            let signer =
                LocalKeyStoreSigner::from_directory(certificate_store_dir(), fingerprint).unwrap();
            assert!(matches!(
                signer.sign(b"x").await,
                Err(TokenClientError::KeyAccessDenied(_))
            ));
        }
    }

    #[test]
    fn test_metadata() {
        let signer =
            LocalKeyStoreSigner::from_directory(certificate_store_dir(), SIGNING_CERT_FINGERPRINT)
                .unwrap();
        assert!(!signer.supports_token_exchange());
        assert_eq!(signer.algorithm(), "RS256");
        assert_eq!(
            signer.key_reference(),
            Thumbprint::parse(SIGNING_CERT_FINGERPRINT).unwrap().as_str()
        );
    }

    #[test]
    fn test_malformed_thumbprint_rejected() {
        assert!(matches!(
            LocalKeyStoreSigner::from_directory(certificate_store_dir(), "not-a-thumbprint"),
            Err(TokenClientError::InvalidArgument(_))
        ));
    }
}
