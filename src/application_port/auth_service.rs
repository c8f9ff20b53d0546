use crate::domain_model::*;
use crate::domain_port::{RequestContext, TokenStoreError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("no permission")]
    NoPermission,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<TokenStoreError> for AuthError {
    fn from(error: TokenStoreError) -> Self {
        match error {
            TokenStoreError::InvalidArgument(e) => AuthError::InvalidArgument(e),
            TokenStoreError::Store(e) => AuthError::Store(e),
            TokenStoreError::Codec(e) => AuthError::Store(e),
        }
    }
}

/// Session façade called by request middleware.
///
/// Read operations fail closed: a store failure reads as "absent" or
/// "not logged in". Only precondition violations surface as errors.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Issue a token and attach it to the outgoing response.
    async fn login(&self, login_id: LoginId, ctx: &dyn RequestContext)
    -> Result<String, AuthError>;

    /// Delete the token carried by the request. `Ok(false)` when the
    /// request carries none or it was already gone.
    async fn logout(&self, ctx: &dyn RequestContext) -> Result<bool, AuthError>;

    async fn is_login(&self, ctx: &dyn RequestContext) -> bool;

    async fn current_login_id(&self, ctx: &dyn RequestContext) -> Option<LoginId>;

    /// Resolve, validate and refresh the request's token.
    async fn authenticate(&self, ctx: &dyn RequestContext) -> Result<LoginId, AuthError>;

    async fn create_token(&self, login_id: LoginId) -> Result<String, AuthError>;
    async fn check_token(&self, token: &str) -> Result<bool, AuthError>;
    async fn refresh_token(&self, token: &str) -> Result<bool, AuthError>;
    async fn get_login_id(&self, token: &str) -> Result<Option<LoginId>, AuthError>;
    async fn get_subject(&self, token: &str) -> Result<Option<SessionSubject>, AuthError>;
    async fn delete_token(&self, token: &str) -> Result<bool, AuthError>;
    async fn delete_token_by_login_id(&self, login_id: &LoginId) -> Result<usize, AuthError>;

    /// Configured header/cookie name carrying the token.
    fn token_name(&self) -> &str;
}
