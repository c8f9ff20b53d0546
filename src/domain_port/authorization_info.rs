use crate::domain_model::LoginId;
use std::collections::HashSet;

/// Source of permission codes and roles for an identity. Implementations
/// own any caching; callers ask on every check.
#[async_trait::async_trait]
pub trait AuthorizationInfo: Send + Sync {
    async fn permission_set(&self, login_id: &LoginId) -> HashSet<String>;
    async fn role_set(&self, login_id: &LoginId) -> HashSet<String>;
}
