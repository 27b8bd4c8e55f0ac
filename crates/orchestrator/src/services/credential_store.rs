use std::sync::Arc;

use db::KeyValueStore;
use planwise_core::CoreError;
use tracing::info;

use crate::error::{OrchestratorError, Result};

/// Fixed key of the AI service credential
pub const CREDENTIAL_KEY: &str = "planwise-credential";

/// The single user-supplied API key. Absence disables every generation path.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored key, treating a blank value as absent
    pub async fn get(&self) -> Result<Option<String>> {
        let value = self.store.get(CREDENTIAL_KEY).await?;
        Ok(value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    pub async fn set(&self, credential: &str) -> Result<()> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(CoreError::Validation("API key must not be empty".to_string()).into());
        }
        self.store.set(CREDENTIAL_KEY, credential).await?;
        info!("API key saved");
        Ok(())
    }

    pub async fn clear(&self) -> Result<bool> {
        let existed = self.store.delete(CREDENTIAL_KEY).await?;
        if existed {
            info!("API key cleared");
        }
        Ok(existed)
    }

    pub async fn is_configured(&self) -> Result<bool> {
        Ok(self.get().await?.is_some())
    }

    /// The key, or `MissingCredential`
    pub async fn require(&self) -> Result<String> {
        self.get().await?.ok_or(OrchestratorError::MissingCredential)
    }
}

/// Shortened form for display, e.g. `AIza…9xYz`
pub fn mask_credential(credential: &str) -> String {
    let chars: Vec<char> = credential.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::MemoryStore;

    fn credentials() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let credentials = credentials();
        assert!(credentials.get().await.unwrap().is_none());
        assert!(!credentials.is_configured().await.unwrap());
        assert!(matches!(
            credentials.require().await,
            Err(OrchestratorError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_set_get_clear() {
        let credentials = credentials();
        credentials.set("  AIzaSecret  ").await.unwrap();
        assert_eq!(credentials.require().await.unwrap(), "AIzaSecret");

        assert!(credentials.clear().await.unwrap());
        assert!(!credentials.clear().await.unwrap());
        assert!(credentials.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_credential_rejected() {
        let credentials = credentials();
        assert!(matches!(
            credentials.set("   ").await,
            Err(OrchestratorError::Core(CoreError::Validation(_)))
        ));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask_credential("AIzaSyD-1234567890xYz9"), "AIza…xYz9");
        assert_eq!(mask_credential("short"), "*****");
    }
}
