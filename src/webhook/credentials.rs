//! Basic-auth credentials for the source fetch

use async_trait::async_trait;

use crate::error::{DeployError, Result};

/// Username and password pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Split `user:pass` at the first colon
    pub fn parse(value: &str) -> Result<Self> {
        let (username, password) = value.split_once(':').ok_or_else(|| {
            DeployError::Credentials("expected credentials in user:pass form".to_string())
        })?;
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Yields the credentials used for the source fetch, if any
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn resolve(&self) -> Result<Option<Credentials>>;
}

/// No authentication
pub struct NoCredentials;

#[async_trait]
impl CredentialProvider for NoCredentials {
    async fn resolve(&self) -> Result<Option<Credentials>> {
        Ok(None)
    }
}

/// Credentials given in plain `user:pass` form
pub struct StaticCredentials(pub Credentials);

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn resolve(&self) -> Result<Option<Credentials>> {
        Ok(Some(self.0.clone()))
    }
}

/// Base64 ciphertext decrypted with KMS into `user:pass`
#[cfg(feature = "cloud")]
pub struct KmsCredentials {
    client: aws_sdk_kms::Client,
    ciphertext: String,
}

#[cfg(feature = "cloud")]
impl KmsCredentials {
    pub fn new(client: aws_sdk_kms::Client, ciphertext: impl Into<String>) -> Self {
        Self {
            client,
            ciphertext: ciphertext.into(),
        }
    }
}

#[cfg(feature = "cloud")]
#[async_trait]
impl CredentialProvider for KmsCredentials {
    async fn resolve(&self) -> Result<Option<Credentials>> {
        use aws_sdk_kms::primitives::Blob;
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

        let blob = BASE64
            .decode(self.ciphertext.trim())
            .map_err(|e| DeployError::Credentials(format!("ciphertext is not base64: {}", e)))?;

        let response = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(blob))
            .send()
            .await
            .map_err(|e| DeployError::Credentials(format!("KMS decrypt failed: {}", e)))?;

        let plaintext = response
            .plaintext()
            .ok_or_else(|| DeployError::Credentials("KMS returned no plaintext".to_string()))?;
        let text = std::str::from_utf8(plaintext.as_ref())
            .map_err(|e| DeployError::Credentials(format!("plaintext is not UTF-8: {}", e)))?;

        Credentials::parse(text.trim()).map(Some)
    }
}

/// Provider for the `GITHUB_AUTH` value: plain when it contains a colon,
/// KMS ciphertext otherwise.
#[cfg(feature = "cloud")]
pub async fn provider_from_auth(auth: Option<&str>) -> Result<Box<dyn CredentialProvider>> {
    match auth {
        None => Ok(Box::new(NoCredentials)),
        Some(value) if value.contains(':') => {
            Ok(Box::new(StaticCredentials(Credentials::parse(value)?)))
        }
        Some(value) => {
            let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .load()
                .await;
            Ok(Box::new(KmsCredentials::new(
                aws_sdk_kms::Client::new(&config),
                value,
            )))
        }
    }
}
