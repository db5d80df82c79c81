use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

/// Wrapper for sensitive strings with redacted Debug/Display.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Pluggable secret retrieval backend.
pub trait VaultProvider: Send + Sync {
    fn get_secret(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>>;
}

/// Reads secrets from environment variables.
pub struct EnvVaultProvider;

impl VaultProvider for EnvVaultProvider {
    fn get_secret(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move { Ok(std::env::var(&key).ok()) })
    }
}

/// A configured secret value: either the secret itself or `${env.NAME}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef<'a> {
    Literal(&'a str),
    Env(&'a str),
}

impl<'a> SecretRef<'a> {
    #[must_use]
    pub fn parse(raw: &'a str) -> Self {
        raw.strip_prefix("${env.")
            .and_then(|rest| rest.strip_suffix('}'))
            .filter(|name| !name.is_empty())
            .map_or(Self::Literal(raw), Self::Env)
    }

    /// Resolve through `vault`. A literal resolves to itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve(self, vault: &dyn VaultProvider) -> anyhow::Result<Option<Secret>> {
        match self {
            Self::Literal(value) => Ok(Some(Secret::new(value))),
            Self::Env(name) => Ok(vault.get_secret(name).await?.map(Secret::new)),
        }
    }
}

/// Test helper with HashMap-based secret storage.
#[cfg(test)]
#[derive(Default)]
pub struct MockVaultProvider {
    secrets: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MockVaultProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_secret(mut self, key: &str, value: &str) -> Self {
        self.secrets.insert(key.to_owned(), value.to_owned());
        self
    }
}

#[cfg(test)]
impl VaultProvider for MockVaultProvider {
    fn get_secret(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>> {
        let result = self.secrets.get(key).cloned();
        Box::pin(async move { Ok(result) })
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn secret_debug_and_display_are_redacted() {
        let secret = Secret::new("sk-live-123");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
        assert_eq!(secret.expose(), "sk-live-123");
    }

    #[test]
    fn secret_deserialize() {
        let secret: Secret = serde_json::from_str("\"my-secret-value\"").unwrap();
        assert_eq!(secret.expose(), "my-secret-value");
    }

    #[test]
    fn parse_env_reference() {
        assert_eq!(SecretRef::parse("${env.OPENAI_API_KEY}"), SecretRef::Env("OPENAI_API_KEY"));
    }

    #[test]
    fn parse_literal_and_malformed_references() {
        assert_eq!(SecretRef::parse("sk-abc"), SecretRef::Literal("sk-abc"));
        assert_eq!(SecretRef::parse("${env.}"), SecretRef::Literal("${env.}"));
        assert_eq!(SecretRef::parse("${env.KEY"), SecretRef::Literal("${env.KEY"));
        assert_eq!(SecretRef::parse("$env.KEY}"), SecretRef::Literal("$env.KEY}"));
    }

    #[tokio::test]
    #[serial]
    async fn env_vault_returns_set_var() {
        let key = "CODESCOPE_TEST_VAULT_SECRET_SET";
        unsafe { std::env::set_var(key, "test-value") };
        let result = EnvVaultProvider.get_secret(key).await.unwrap();
        unsafe { std::env::remove_var(key) };
        assert_eq!(result.as_deref(), Some("test-value"));
    }

    #[tokio::test]
    async fn env_vault_returns_none_for_unset() {
        let result = EnvVaultProvider
            .get_secret("CODESCOPE_TEST_VAULT_NONEXISTENT_KEY_12345")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn resolve_env_reference_through_vault() {
        let vault = MockVaultProvider::new().with_secret("API_KEY", "secret-123");
        let secret = SecretRef::parse("${env.API_KEY}")
            .resolve(&vault)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(secret.expose(), "secret-123");

        let missing = SecretRef::parse("${env.MISSING}").resolve(&vault).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn resolve_literal_skips_vault() {
        let vault = MockVaultProvider::new();
        let secret = SecretRef::parse("plain").resolve(&vault).await.unwrap().unwrap();
        assert_eq!(secret.expose(), "plain");
    }
}
