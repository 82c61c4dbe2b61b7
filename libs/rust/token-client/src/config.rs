//! Configuration for the token client.
//!
//! Values are loaded from environment variables (and a `.env` file when
//! present) and validated before any client is built.

use crate::error::{TokenClientError, TokenClientResult};
use rust_common::HttpConfig;
use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Azure instance metadata service token endpoint.
pub const DEFAULT_IDENTITY_ENDPOINT: &str =
    "http://169.254.169.254/metadata/identity/oauth2/token";

/// Key Vault REST API version used for sign calls.
pub const DEFAULT_KMS_API_VERSION: &str = "7.4";

/// Resource the managed identity token is requested for.
pub const KMS_RESOURCE: &str = "https://vault.azure.net";

/// How the remote KMS signer authenticates.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Platform-provided managed identity
    ManagedIdentity {
        /// User-assigned identity client id; system-assigned when `None`
        client_id: Option<String>,
        /// Identity token endpoint
        endpoint: Url,
    },
    /// Bearer token supplied by the embedding application
    Static(SecretString),
}

impl CredentialSource {
    /// System-assigned managed identity on the default endpoint.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in endpoint does not parse.
    pub fn managed_identity(client_id: Option<String>) -> TokenClientResult<Self> {
        Ok(Self::ManagedIdentity {
            client_id,
            endpoint: parse_url("identity endpoint", DEFAULT_IDENTITY_ENDPOINT)?,
        })
    }
}

/// Remote key-management signer configuration.
#[derive(Debug, Clone)]
pub struct KmsConfig {
    /// Vault base URI, e.g. `https://my-vault.vault.azure.net`
    pub vault_uri: Url,
    /// Key name inside the vault
    pub key_name: String,
    /// Key version; latest when `None`
    pub key_version: Option<String>,
    /// Credential used for the sign call
    pub credential: CredentialSource,
    /// REST API version
    pub api_version: String,
}

impl KmsConfig {
    /// Configuration using a system-assigned managed identity.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::Config`] if the key name is blank.
    pub fn new(vault_uri: Url, key_name: impl Into<String>) -> TokenClientResult<Self> {
        let key_name = key_name.into();
        if key_name.trim().is_empty() {
            return Err(TokenClientError::config("KMS key name must not be empty"));
        }
        Ok(Self {
            vault_uri,
            key_name,
            key_version: None,
            credential: CredentialSource::managed_identity(None)?,
            api_version: DEFAULT_KMS_API_VERSION.to_string(),
        })
    }

    /// Pin a key version.
    #[must_use]
    pub fn with_key_version(mut self, version: impl Into<String>) -> Self {
        self.key_version = Some(version.into());
        self
    }

    /// Set the credential source.
    #[must_use]
    pub fn with_credential(mut self, credential: CredentialSource) -> Self {
        self.credential = credential;
        self
    }

    /// `{vault}/keys/{name}[/{version}]/sign?api-version=...`
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::Config`] if the vault URI cannot hold a path.
    pub fn sign_url(&self) -> TokenClientResult<Url> {
        let mut url = self.vault_uri.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                TokenClientError::config(format!("Invalid KMS vault URI: {}", self.vault_uri))
            })?;
            segments.pop_if_empty().push("keys").push(&self.key_name);
            if let Some(version) = &self.key_version {
                segments.push(version);
            }
            segments.push("sign");
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

/// Which backend signs client assertions.
#[derive(Debug, Clone)]
pub enum SignerConfig {
    /// Certificate store on the local machine
    LocalKeyStore {
        /// Directory of PEM certificates
        store_path: PathBuf,
        /// Certificate thumbprint
        thumbprint: String,
    },
    /// Remote key-management service
    RemoteKms(KmsConfig),
}

/// Token client configuration.
#[derive(Debug, Clone)]
pub struct TokenClientConfig {
    /// Authorization server token endpoint
    pub token_endpoint: Url,
    /// Signing backend
    pub signer: SignerConfig,
    /// HTTP transport settings
    pub http: HttpConfig,
}

impl TokenClientConfig {
    /// Create a configuration with default HTTP settings.
    #[must_use]
    pub fn new(token_endpoint: Url, signer: SignerConfig) -> Self {
        Self {
            token_endpoint,
            signer,
            http: HttpConfig::default(),
        }
    }

    /// Set HTTP settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> TokenClientResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::Config`] if required variables are missing
    /// or invalid.
    pub fn from_lookup<F>(lookup: F) -> TokenClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| TokenClientError::config(format!("{name} is required")))
        };

        let token_endpoint = parse_url("TOKEN_ENDPOINT", &require("TOKEN_ENDPOINT")?)?;

        let backend = get("SIGNER_BACKEND").unwrap_or_else(|| "local".to_string());
        let signer = match backend.to_lowercase().as_str() {
            "local" => SignerConfig::LocalKeyStore {
                store_path: PathBuf::from(require("CERT_STORE_PATH")?),
                thumbprint: require("CERT_THUMBPRINT")?,
            },
            "kms" => {
                let vault_uri = parse_url("KMS_VAULT_URI", &require("KMS_VAULT_URI")?)?;
                let credential = match get("KMS_ACCESS_TOKEN") {
                    Some(token) => CredentialSource::Static(SecretString::from(token)),
                    None => CredentialSource::ManagedIdentity {
                        client_id: get("KMS_MANAGED_IDENTITY_CLIENT_ID"),
                        endpoint: parse_url(
                            "KMS_IDENTITY_ENDPOINT",
                            &get("KMS_IDENTITY_ENDPOINT")
                                .unwrap_or_else(|| DEFAULT_IDENTITY_ENDPOINT.to_string()),
                        )?,
                    },
                };

                let mut kms = KmsConfig::new(vault_uri, require("KMS_KEY_NAME")?)?
                    .with_credential(credential);
                kms.key_version = get("KMS_KEY_VERSION");
                if let Some(api_version) = get("KMS_API_VERSION") {
                    kms.api_version = api_version;
                }
                SignerConfig::RemoteKms(kms)
            }
            other => {
                return Err(TokenClientError::config(format!(
                    "Invalid SIGNER_BACKEND: {other} (expected local or kms)"
                )));
            }
        };

        let mut http = HttpConfig::default();
        if let Some(secs) = get("HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| TokenClientError::config(format!("Invalid HTTP_TIMEOUT_SECS: {e}")))?;
            http = http.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            token_endpoint,
            signer,
            http,
        })
    }
}

fn parse_url(name: &str, value: &str) -> TokenClientResult<Url> {
    Url::parse(value).map_err(|e| TokenClientError::config(format!("Invalid {name}: {e}")))
}
