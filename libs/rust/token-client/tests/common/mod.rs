//! Shared helpers for integration tests.

#![allow(dead_code)]

use auth_token_client::kms::StaticCredential;
use auth_token_client::{KmsConfig, LocalKeyStoreSigner, RemoteKmsSigner};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use rust_common::HttpConfig;
use sha2::Sha256;
use std::sync::Arc;
use test_utils::fixtures::{
    SIGNING_CERT_FINGERPRINT, SIGNING_KEY_PEM, SIGNING_PUBLIC_KEY_PEM, certificate_store_dir,
};
use url::Url;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const KMS_KEY_NAME: &str = "assertion-key";
pub const KMS_TOKEN: &str = "kv-token";

/// Key-management service stand-in: signs the posted digest with the
/// fixture signing key, so signatures verify with the fixture public key.
pub struct KmsEmulator {
    key: RsaPrivateKey,
}

impl KmsEmulator {
    pub fn new() -> Self {
        Self {
            key: RsaPrivateKey::from_pkcs8_pem(SIGNING_KEY_PEM).unwrap(),
        }
    }
}

impl Respond for KmsEmulator {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["alg"], "RS256");
        let digest = URL_SAFE_NO_PAD
            .decode(body["value"].as_str().unwrap())
            .unwrap();
        assert_eq!(digest.len(), 32);

        let signature = self
            .key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .unwrap();
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kid": format!("https://vault.example/keys/{KMS_KEY_NAME}/1"),
            "value": URL_SAFE_NO_PAD.encode(signature),
        }))
    }
}

pub fn plain_http() -> HttpConfig {
    HttpConfig::default().with_https_only(false)
}

pub fn local_signer() -> LocalKeyStoreSigner {
    LocalKeyStoreSigner::from_directory(certificate_store_dir(), SIGNING_CERT_FINGERPRINT).unwrap()
}

pub fn kms_signer(server: &MockServer) -> RemoteKmsSigner {
    let config = KmsConfig::new(Url::parse(&server.uri()).unwrap(), KMS_KEY_NAME).unwrap();
    RemoteKmsSigner::with_credential(
        config,
        &plain_http(),
        Arc::new(StaticCredential::new(KMS_TOKEN)),
    )
    .unwrap()
}

pub fn token_endpoint(server: &MockServer) -> Url {
    Url::parse(&format!("{}/token", server.uri())).unwrap()
}

/// Verify an assertion with the fixture public key and return its claims.
pub fn verify_assertion(
    assertion: &str,
    audience: &str,
) -> jsonwebtoken::errors::Result<serde_json::Value> {
    let key = DecodingKey::from_rsa_pem(SIGNING_PUBLIC_KEY_PEM.as_bytes())?;
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[audience]);
    validation.validate_nbf = true;
    jsonwebtoken::decode::<serde_json::Value>(assertion, &key, &validation).map(|data| data.claims)
}

/// Form fields of a recorded request body.
pub fn form_fields(body: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(body).into_owned().collect()
}

pub fn form_value(body: &[u8], name: &str) -> Option<String> {
    form_fields(body)
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}
