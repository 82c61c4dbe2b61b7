//! Remote key-management signing backend.

pub mod credential;
pub mod signer;

pub use credential::{
    CredentialProvider, CredentialRequest, ManagedIdentityCredential, StaticCredential,
    credential_from_source,
};
pub use signer::RemoteKmsSigner;
