//! Local certificate stores.
//!
//! A store maps certificate thumbprints to certificates and, where present,
//! their RSA private keys. Stores are opened read-only and are safe to share
//! between concurrent signers.

use crate::error::{TokenClientError, TokenClientResult};
use crate::keystore::thumbprint::{Thumbprint, ThumbprintAlgorithm};
use rsa::RsaPrivateKey;
use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rustls_pemfile::Item;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use x509_parser::prelude::*;

/// Private key held next to a certificate.
enum KeyMaterial {
    Missing,
    Rsa(RsaPrivateKey),
    Unusable(String),
}

/// A certificate and its private key as found in a store.
pub struct StoredCertificate {
    der: Vec<u8>,
    thumbprint: Thumbprint,
    sha1_thumbprint: Thumbprint,
    key: KeyMaterial,
}

impl StoredCertificate {
    /// Parse a PEM bundle holding one certificate and optionally its key.
    ///
    /// The key may be PKCS#8 or PKCS#1. A key that is present but not RSA is
    /// kept as unusable so that signing reports `KeyAccessDenied` rather than
    /// the certificate silently disappearing from the store.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::InvalidArgument`] if the text holds no
    /// parseable certificate.
    pub fn from_pem(pem: &str) -> TokenClientResult<Self> {
        let mut der = None;
        let mut key = KeyMaterial::Missing;

        let mut reader = pem.as_bytes();
        for item in rustls_pemfile::read_all(&mut reader) {
            let item = item.map_err(|e| {
                TokenClientError::invalid_argument(format!("Failed to parse PEM: {e}"))
            })?;
            match item {
                Item::X509Certificate(cert) if der.is_none() => der = Some(cert.to_vec()),
                Item::Pkcs8Key(k) => {
                    key = match RsaPrivateKey::from_pkcs8_der(k.secret_pkcs8_der()) {
                        Ok(rsa) => KeyMaterial::Rsa(rsa),
                        Err(_) => KeyMaterial::Unusable("private key is not an RSA key".into()),
                    };
                }
                Item::Pkcs1Key(k) => {
                    key = match RsaPrivateKey::from_pkcs1_der(k.secret_pkcs1_der()) {
                        Ok(rsa) => KeyMaterial::Rsa(rsa),
                        Err(_) => KeyMaterial::Unusable("PKCS#1 key could not be decoded".into()),
                    };
                }
                Item::Sec1Key(_) => {
                    key = KeyMaterial::Unusable("private key is an EC key, RS256 needs RSA".into());
                }
                _ => {}
            }
        }

        let der = der.ok_or_else(|| {
            TokenClientError::invalid_argument("No PEM certificate found")
        })?;
        X509Certificate::from_der(&der).map_err(|e| {
            TokenClientError::invalid_argument(format!("Failed to parse certificate: {e}"))
        })?;

        Ok(Self {
            thumbprint: Thumbprint::of_der(&der),
            sha1_thumbprint: Thumbprint::sha1_of_der(&der),
            der,
            key,
        })
    }

    /// Same as [`Self::from_pem`], with the private key in a separate PEM text.
    ///
    /// # Errors
    ///
    /// See [`Self::from_pem`].
    pub fn from_pem_pair(cert_pem: &str, key_pem: &str) -> TokenClientResult<Self> {
        Self::from_pem(&format!("{cert_pem}\n{key_pem}"))
    }

    /// SHA-256 thumbprint.
    pub const fn thumbprint(&self) -> &Thumbprint {
        &self.thumbprint
    }

    /// SHA-1 thumbprint.
    pub const fn sha1_thumbprint(&self) -> &Thumbprint {
        &self.sha1_thumbprint
    }

    /// Exact comparison against the thumbprint of the same digest.
    pub fn matches(&self, thumbprint: &Thumbprint) -> bool {
        match thumbprint.algorithm() {
            ThumbprintAlgorithm::Sha1 => &self.sha1_thumbprint == thumbprint,
            ThumbprintAlgorithm::Sha256 => &self.thumbprint == thumbprint,
        }
    }

    /// DER encoding of the certificate.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Whether the bundle carried a private key of any kind.
    pub const fn has_private_key(&self) -> bool {
        !matches!(self.key, KeyMaterial::Missing)
    }

    /// The private key, provided it can produce RS256 signatures for this
    /// certificate.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::KeyAccessDenied`] when the key is missing,
    /// not RSA, does not belong to the certificate, or the certificate's key
    /// usage excludes digital signatures.
    pub fn signing_key(&self) -> TokenClientResult<&RsaPrivateKey> {
        let key = match &self.key {
            KeyMaterial::Rsa(key) => key,
            KeyMaterial::Missing => {
                return Err(TokenClientError::key_access_denied(format!(
                    "certificate {} has no private key in the store",
                    self.thumbprint
                )));
            }
            KeyMaterial::Unusable(reason) => {
                return Err(TokenClientError::key_access_denied(format!(
                    "certificate {}: {reason}",
                    self.thumbprint
                )));
            }
        };

        let (_, cert) = X509Certificate::from_der(&self.der).map_err(|e| {
            TokenClientError::key_access_denied(format!("certificate unreadable: {e}"))
        })?;

        if let Ok(Some(usage)) = cert.key_usage() {
            if !usage.value.digital_signature() {
                return Err(TokenClientError::key_access_denied(format!(
                    "certificate {} key usage does not permit digital signatures",
                    self.thumbprint
                )));
            }
        }

        let public = RsaPublicKey::from_public_key_der(cert.public_key().raw).map_err(|_| {
            TokenClientError::key_access_denied(format!(
                "certificate {} does not carry an RSA public key",
                self.thumbprint
            ))
        })?;

        if key.n() != public.n() || key.e() != public.e() {
            return Err(TokenClientError::key_access_denied(format!(
                "private key does not match certificate {}",
                self.thumbprint
            )));
        }

        Ok(key)
    }
}

impl fmt::Debug for StoredCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCertificate")
            .field("thumbprint", &self.thumbprint)
            .field("has_private_key", &self.has_private_key())
            .finish()
    }
}

/// Lookup of certificates by thumbprint.
pub trait CertificateStore: Send + Sync {
    /// Exact-match lookup. Never returns a different certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the store itself cannot be read.
    fn find_by_thumbprint(
        &self,
        thumbprint: &Thumbprint,
    ) -> TokenClientResult<Option<Arc<StoredCertificate>>>;
}

/// Certificates loaded by the embedding application.
#[derive(Debug, Default)]
pub struct InMemoryCertificateStore {
    entries: Vec<Arc<StoredCertificate>>,
}

impl InMemoryCertificateStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a PEM bundle, returning its thumbprint.
    ///
    /// # Errors
    ///
    /// See [`StoredCertificate::from_pem`].
    pub fn add_pem(&mut self, pem: &str) -> TokenClientResult<Thumbprint> {
        let cert = StoredCertificate::from_pem(pem)?;
        let thumbprint = cert.thumbprint().clone();
        self.entries.push(Arc::new(cert));
        Ok(thumbprint)
    }

    /// Add an already parsed certificate.
    #[must_use]
    pub fn with_certificate(mut self, cert: StoredCertificate) -> Self {
        self.entries.push(Arc::new(cert));
        self
    }

    /// Number of certificates held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no certificates.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CertificateStore for InMemoryCertificateStore {
    fn find_by_thumbprint(
        &self,
        thumbprint: &Thumbprint,
    ) -> TokenClientResult<Option<Arc<StoredCertificate>>> {
        Ok(self
            .entries
            .iter()
            .find(|c| c.matches(thumbprint))
            .cloned())
    }
}

/// A directory of `.pem`, `.crt` and `.cer` files.
///
/// Each file holds one certificate, optionally followed by its private key.
/// A key may also live in a sibling `<stem>.key` file. The directory is
/// rescanned on every lookup so certificates can be rotated in place.
#[derive(Debug, Clone)]
pub struct PemDirectoryStore {
    dir: PathBuf,
}

impl PemDirectoryStore {
    /// # Errors
    ///
    /// Returns [`TokenClientError::Config`] if `dir` is not a directory.
    pub fn open(dir: impl Into<PathBuf>) -> TokenClientResult<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(TokenClientError::config(format!(
                "certificate store {} is not a directory",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    /// Directory being scanned.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn candidates(&self) -> TokenClientResult<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            TokenClientError::config(format!(
                "certificate store {} unreadable: {e}",
                self.dir.display()
            ))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| matches!(ext, "pem" | "crt" | "cer"))
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn load(path: &Path) -> Option<StoredCertificate> {
        let mut pem = match std::fs::read_to_string(path) {
            Ok(pem) => pem,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable certificate file");
                return None;
            }
        };

        let sibling_key = path.with_extension("key");
        if sibling_key.is_file() {
            if let Ok(key) = std::fs::read_to_string(&sibling_key) {
                pem.push('\n');
                pem.push_str(&key);
            }
        }

        match StoredCertificate::from_pem(&pem) {
            Ok(cert) => Some(cert),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping invalid certificate file");
                None
            }
        }
    }
}

impl CertificateStore for PemDirectoryStore {
    fn find_by_thumbprint(
        &self,
        thumbprint: &Thumbprint,
    ) -> TokenClientResult<Option<Arc<StoredCertificate>>> {
        for path in self.candidates()? {
            if let Some(cert) = Self::load(&path) {
                if cert.matches(thumbprint) {
                    debug!(path = %path.display(), %thumbprint, "Certificate found");
                    return Ok(Some(Arc::new(cert)));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::{
        ENCIPHER_ONLY_CERT_BUNDLE_PEM, ENCIPHER_ONLY_CERT_FINGERPRINT, PUBLIC_ONLY_CERT_FINGERPRINT,
        PUBLIC_ONLY_CERT_PEM, SIGNING_CERT_BUNDLE_PEM, SIGNING_CERT_FINGERPRINT,
        SIGNING_CERT_SHA1_FINGERPRINT, UNRELATED_KEY_PEM, certificate_store_dir, pem_block,
    };

    fn thumbprint(value: &str) -> Thumbprint {
        Thumbprint::parse(value).unwrap()
    }

    #[test]
    fn test_thumbprint_matches_openssl_fingerprint() {
        let cert = StoredCertificate::from_pem(SIGNING_CERT_BUNDLE_PEM).unwrap();
        assert_eq!(cert.thumbprint(), &thumbprint(SIGNING_CERT_FINGERPRINT));
        assert!(cert.has_private_key());
    }

    #[test]
    fn test_signing_key_available() {
        let cert = StoredCertificate::from_pem(SIGNING_CERT_BUNDLE_PEM).unwrap();
        assert!(cert.signing_key().is_ok());
    }

    #[test]
    fn test_public_only_certificate_denied() {
        let cert = StoredCertificate::from_pem(PUBLIC_ONLY_CERT_PEM).unwrap();
        assert!(!cert.has_private_key());
        assert!(matches!(
            cert.signing_key(),
            Err(TokenClientError::KeyAccessDenied(_))
        ));
    }

    #[test]
    fn test_encipher_only_certificate_denied() {
        let cert = StoredCertificate::from_pem(ENCIPHER_ONLY_CERT_BUNDLE_PEM).unwrap();
        assert!(cert.has_private_key());
        let err = cert.signing_key().unwrap_err();
        assert!(matches!(err, TokenClientError::KeyAccessDenied(_)));
        assert!(err.to_string().contains("digital signatures"));
    }

    #[test]
    fn test_mismatched_key_denied() {
        let cert_pem = pem_block(SIGNING_CERT_BUNDLE_PEM, "CERTIFICATE").unwrap();
        let cert = StoredCertificate::from_pem_pair(&cert_pem, UNRELATED_KEY_PEM).unwrap();
        let err = cert.signing_key().unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_from_pem_without_certificate() {
        assert!(matches!(
            StoredCertificate::from_pem(UNRELATED_KEY_PEM),
            Err(TokenClientError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let cert = StoredCertificate::from_pem(SIGNING_CERT_BUNDLE_PEM).unwrap();
        let debug = format!("{cert:?}");
        assert!(debug.contains("has_private_key: true"));
        assert!(!debug.contains("PRIVATE"));
    }

    #[test]
    fn test_in_memory_store_lookup() {
        let mut store = InMemoryCertificateStore::new();
        let added = store.add_pem(SIGNING_CERT_BUNDLE_PEM).unwrap();
        store.add_pem(PUBLIC_ONLY_CERT_PEM).unwrap();

        assert_eq!(store.len(), 2);
        let found = store.find_by_thumbprint(&added).unwrap().unwrap();
        assert_eq!(found.thumbprint(), &added);
        assert!(
            store
                .find_by_thumbprint(&thumbprint(ENCIPHER_ONLY_CERT_FINGERPRINT))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_directory_store_lookup() {
        let store = PemDirectoryStore::open(certificate_store_dir()).unwrap();

        for fingerprint in [
            SIGNING_CERT_FINGERPRINT,
            PUBLIC_ONLY_CERT_FINGERPRINT,
            ENCIPHER_ONLY_CERT_FINGERPRINT,
        ] {
            let found = store.find_by_thumbprint(&thumbprint(fingerprint)).unwrap();
            assert_eq!(found.unwrap().thumbprint(), &thumbprint(fingerprint));
        }
    }

    #[test]
    fn test_matches_by_supplied_algorithm() {
        let cert = StoredCertificate::from_pem(SIGNING_CERT_BUNDLE_PEM).unwrap();
        assert_eq!(
            cert.sha1_thumbprint(),
            &thumbprint(SIGNING_CERT_SHA1_FINGERPRINT)
        );
        assert!(cert.matches(&thumbprint(SIGNING_CERT_SHA1_FINGERPRINT)));
        assert!(cert.matches(&thumbprint(SIGNING_CERT_FINGERPRINT)));
        // A SHA-1 value never matches by prefix of the SHA-256 digest.
        let prefix = &cert.thumbprint().as_str()[..40];
        assert!(!cert.matches(&thumbprint(prefix)));
    }

    #[test]
    fn test_directory_store_sha1_lookup() {
        let store = PemDirectoryStore::open(certificate_store_dir()).unwrap();
        let found = store
            .find_by_thumbprint(&thumbprint(SIGNING_CERT_SHA1_FINGERPRINT))
            .unwrap()
            .unwrap();
        assert_eq!(found.thumbprint(), &thumbprint(SIGNING_CERT_FINGERPRINT));

        let missing = thumbprint(&"0".repeat(40));
        assert!(store.find_by_thumbprint(&missing).unwrap().is_none());
    }

    #[test]
    fn test_directory_store_unknown_thumbprint() {
        let store = PemDirectoryStore::open(certificate_store_dir()).unwrap();
        let missing = thumbprint(&"0".repeat(64));
        assert!(store.find_by_thumbprint(&missing).unwrap().is_none());
    }

    #[test]
    fn test_directory_store_requires_directory() {
        let missing = certificate_store_dir().join("does-not-exist");
        assert!(matches!(
            PemDirectoryStore::open(missing),
            Err(TokenClientError::Config(_))
        ));
    }
}
