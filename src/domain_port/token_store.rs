use crate::domain_model::*;

/// Storage of issued tokens. One implementation is active per process,
/// picked from `auth.store_type`.
///
/// Every read treats an entry whose expiry instant has passed as absent.
/// `Ok(false)` / `Ok(None)` mean the token is legitimately unknown or
/// expired; `Err(Store | Codec)` means the medium failed and the failure
/// has already been logged.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Issue a fresh token for `login_id` and persist its subject.
    async fn create_token(&self, login_id: &LoginId) -> Result<String, TokenStoreError>;

    /// Whether the token exists and has not expired.
    async fn check_token(&self, token: &str) -> Result<bool, TokenStoreError>;

    /// Push the expiry of a live token to `timeout` from now.
    /// Returns `false` when the token is absent; never resurrects it.
    async fn refresh_token(&self, token: &str) -> Result<bool, TokenStoreError>;

    /// Replace the stored subject of a live token and push its expiry.
    async fn refresh_subject(
        &self,
        token: &str,
        subject: &SessionSubject,
    ) -> Result<bool, TokenStoreError>;

    async fn get_subject(&self, token: &str) -> Result<Option<SessionSubject>, TokenStoreError>;

    async fn get_login_id(&self, token: &str) -> Result<Option<LoginId>, TokenStoreError> {
        Ok(self.get_subject(token).await?.map(|s| s.login_id))
    }

    /// Remaining lifetime in whole seconds, `None` when absent.
    async fn remaining_ttl(&self, token: &str) -> Result<Option<u64>, TokenStoreError>;

    /// Returns whether something was removed. Deleting twice is fine.
    async fn delete_token(&self, token: &str) -> Result<bool, TokenStoreError>;

    /// Revoke every token of `login_id`, returning how many were removed.
    /// Not transactional across tokens.
    async fn delete_token_by_login_id(&self, login_id: &LoginId)
    -> Result<usize, TokenStoreError>;

    /// Stop background work owned by the store. Idempotent.
    async fn shutdown(&self) {}
}

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("codec error: {0}")]
    Codec(String),
}

impl TokenStoreError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, TokenStoreError::InvalidArgument(_))
    }
}

impl From<serde_json::Error> for TokenStoreError {
    fn from(e: serde_json::Error) -> Self {
        TokenStoreError::Codec(e.to_string())
    }
}

pub fn ensure_token(token: &str) -> Result<(), TokenStoreError> {
    if token.trim().is_empty() {
        return Err(TokenStoreError::InvalidArgument(
            "the token cannot be empty".to_string(),
        ));
    }
    Ok(())
}

pub fn ensure_login_id(login_id: &LoginId) -> Result<(), TokenStoreError> {
    if login_id.is_blank() {
        return Err(TokenStoreError::InvalidArgument(
            "the login id cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Settings shared by every backend.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    /// Prepended to every token to form its storage key.
    pub token_prefix: String,
    /// Session lifetime in seconds.
    pub timeout_secs: u64,
}

impl TokenStoreConfig {
    pub fn key(&self, token: &str) -> String {
        format!("{}{}", self.token_prefix, token)
    }
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        TokenStoreConfig {
            token_prefix: "auth_token:".to_string(),
            timeout_secs: 3600,
        }
    }
}
