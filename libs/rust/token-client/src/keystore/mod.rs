//! Local certificate-store signing backend.

pub mod signer;
pub mod store;
pub mod thumbprint;

pub use signer::LocalKeyStoreSigner;
pub use store::{CertificateStore, InMemoryCertificateStore, PemDirectoryStore, StoredCertificate};
pub use thumbprint::{Thumbprint, ThumbprintAlgorithm};
