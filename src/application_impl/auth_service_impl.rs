use crate::application_port::{AuthError, AuthService};
use crate::domain_model::*;
use crate::domain_port::{RequestContext, TokenStore, TokenStoreError};
use std::sync::Arc;
use tracing::{debug, info};

pub struct RealAuthService {
    store: Arc<dyn TokenStore>,
    token_name: String,
}

impl RealAuthService {
    pub fn new(store: Arc<dyn TokenStore>, token_name: impl Into<String>) -> RealAuthService {
        RealAuthService {
            store,
            token_name: token_name.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }
}

// Backend failures were logged by the store; reads treat them as absent.
fn fail_closed<T>(result: Result<T, TokenStoreError>, absent: T) -> Result<T, AuthError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_invalid_argument() => Err(e.into()),
        Err(_) => Ok(absent),
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(
        &self,
        login_id: LoginId,
        ctx: &dyn RequestContext,
    ) -> Result<String, AuthError> {
        let token = self.create_token(login_id.clone()).await?;
        ctx.attach_token(&self.token_name, &token);
        info!(%login_id, "login");
        Ok(token)
    }

    async fn logout(&self, ctx: &dyn RequestContext) -> Result<bool, AuthError> {
        match ctx.current_token(&self.token_name) {
            Some(token) => self.delete_token(&token).await,
            None => Ok(false),
        }
    }

    async fn is_login(&self, ctx: &dyn RequestContext) -> bool {
        match ctx.current_token(&self.token_name) {
            Some(token) => self.check_token(&token).await.unwrap_or(false),
            None => false,
        }
    }

    async fn current_login_id(&self, ctx: &dyn RequestContext) -> Option<LoginId> {
        let token = ctx.current_token(&self.token_name)?;
        self.get_login_id(&token).await.ok().flatten()
    }

    async fn authenticate(&self, ctx: &dyn RequestContext) -> Result<LoginId, AuthError> {
        let token = ctx
            .current_token(&self.token_name)
            .filter(|token| !token.trim().is_empty())
            .ok_or(AuthError::Unauthorized)?;

        let login_id = self
            .get_login_id(&token)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        // The token may expire between the lookup and the refresh.
        if !self.refresh_token(&token).await? {
            return Err(AuthError::Unauthorized);
        }
        debug!(%login_id, "authenticated");
        Ok(login_id)
    }

    async fn create_token(&self, login_id: LoginId) -> Result<String, AuthError> {
        Ok(self.store.create_token(&login_id).await?)
    }

    async fn check_token(&self, token: &str) -> Result<bool, AuthError> {
        fail_closed(self.store.check_token(token).await, false)
    }

    async fn refresh_token(&self, token: &str) -> Result<bool, AuthError> {
        fail_closed(self.store.refresh_token(token).await, false)
    }

    async fn get_login_id(&self, token: &str) -> Result<Option<LoginId>, AuthError> {
        fail_closed(self.store.get_login_id(token).await, None)
    }

    async fn get_subject(&self, token: &str) -> Result<Option<SessionSubject>, AuthError> {
        fail_closed(self.store.get_subject(token).await, None)
    }

    async fn delete_token(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.store.delete_token(token).await?)
    }

    async fn delete_token_by_login_id(&self, login_id: &LoginId) -> Result<usize, AuthError> {
        let removed = self.store.delete_token_by_login_id(login_id).await?;
        info!(%login_id, removed, "sessions revoked");
        Ok(removed)
    }

    fn token_name(&self) -> &str {
        &self.token_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::token_generator;
    use crate::application_port::TokenStyle;
    use crate::domain_port::TokenStoreConfig;
    use crate::infra_memory::MemoryTokenStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeContext {
        incoming: Option<String>,
        attached: Mutex<Vec<(String, String)>>,
    }

    impl FakeContext {
        fn with_token(token: &str) -> Self {
            FakeContext {
                incoming: Some(token.to_string()),
                ..Default::default()
            }
        }
    }

    impl RequestContext for FakeContext {
        fn current_token(&self, _token_name: &str) -> Option<String> {
            self.incoming.clone()
        }

        fn attach_token(&self, token_name: &str, token: &str) {
            self.attached
                .lock()
                .unwrap()
                .push((token_name.to_string(), token.to_string()));
        }
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl TokenStore for BrokenStore {
        async fn create_token(&self, _: &LoginId) -> Result<String, TokenStoreError> {
            Err(TokenStoreError::Store("connection refused".into()))
        }
        async fn check_token(&self, _: &str) -> Result<bool, TokenStoreError> {
            Err(TokenStoreError::Store("connection refused".into()))
        }
        async fn refresh_token(&self, _: &str) -> Result<bool, TokenStoreError> {
            Err(TokenStoreError::Store("connection refused".into()))
        }
        async fn refresh_subject(
            &self,
            _: &str,
            _: &SessionSubject,
        ) -> Result<bool, TokenStoreError> {
            Err(TokenStoreError::Store("connection refused".into()))
        }
        async fn get_subject(&self, _: &str) -> Result<Option<SessionSubject>, TokenStoreError> {
            Err(TokenStoreError::Codec("expected value".into()))
        }
        async fn remaining_ttl(&self, _: &str) -> Result<Option<u64>, TokenStoreError> {
            Err(TokenStoreError::Store("connection refused".into()))
        }
        async fn delete_token(&self, _: &str) -> Result<bool, TokenStoreError> {
            Err(TokenStoreError::Store("connection refused".into()))
        }
        async fn delete_token_by_login_id(&self, _: &LoginId) -> Result<usize, TokenStoreError> {
            Err(TokenStoreError::Store("connection refused".into()))
        }
    }

    fn service(timeout_secs: u64) -> RealAuthService {
        let store = MemoryTokenStore::new(
            token_generator(TokenStyle::Uuid, 1),
            TokenStoreConfig {
                token_prefix: "auth_token:".to_string(),
                timeout_secs,
            },
            None,
        );
        RealAuthService::new(Arc::new(store), "token")
    }

    #[tokio::test]
    async fn test_login_attaches_token() {
        let service = service(60);
        let ctx = FakeContext::default();

        let token = service.login(LoginId::from(7), &ctx).await.unwrap();

        let attached = ctx.attached.lock().unwrap().clone();
        assert_eq!(attached, vec![("token".to_string(), token.clone())]);
        assert!(service.check_token(&token).await.unwrap());
    }

    #[tokio::test]
    async fn test_request_with_token_is_logged_in() {
        let service = service(60);
        let token = service.create_token(LoginId::from("alice")).await.unwrap();
        let ctx = FakeContext::with_token(&token);

        assert!(service.is_login(&ctx).await);
        assert_eq!(
            service.current_login_id(&ctx).await,
            Some(LoginId::from("alice"))
        );
        assert_eq!(
            service.authenticate(&ctx).await.unwrap(),
            LoginId::from("alice")
        );
    }

    #[tokio::test]
    async fn test_request_without_token() {
        let service = service(60);
        let ctx = FakeContext::default();

        assert!(!service.is_login(&ctx).await);
        assert_eq!(service.current_login_id(&ctx).await, None);
        assert!(!service.logout(&ctx).await.unwrap());
        assert!(matches!(
            service.authenticate(&ctx).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_unknown_or_blank_token_is_unauthorized() {
        let service = service(60);

        for token in ["no-such-token", "   "] {
            let ctx = FakeContext::with_token(token);
            assert!(matches!(
                service.authenticate(&ctx).await,
                Err(AuthError::Unauthorized)
            ));
        }
    }

    #[tokio::test]
    async fn test_logout_removes_session() {
        let service = service(60);
        let token = service.create_token(LoginId::from(1)).await.unwrap();
        let ctx = FakeContext::with_token(&token);

        assert!(service.logout(&ctx).await.unwrap());
        assert!(!service.is_login(&ctx).await);
        assert!(!service.logout(&ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_by_login_id_leaves_others() {
        let service = service(60);
        let a1 = service.create_token(LoginId::from("a")).await.unwrap();
        let a2 = service.create_token(LoginId::from("a")).await.unwrap();
        let b = service.create_token(LoginId::from("b")).await.unwrap();

        assert_eq!(
            service
                .delete_token_by_login_id(&LoginId::from("a"))
                .await
                .unwrap(),
            2
        );
        assert!(!service.check_token(&a1).await.unwrap());
        assert!(!service.check_token(&a2).await.unwrap());
        assert!(service.check_token(&b).await.unwrap());
    }

    #[tokio::test]
    async fn test_blank_arguments_are_rejected() {
        let service = service(60);
        assert!(matches!(
            service.create_token(LoginId::from("  ")).await,
            Err(AuthError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.check_token("").await,
            Err(AuthError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_fails_closed() {
        let service = RealAuthService::new(Arc::new(BrokenStore), "token");
        let ctx = FakeContext::with_token("abc");

        assert!(!service.check_token("abc").await.unwrap());
        assert!(!service.refresh_token("abc").await.unwrap());
        assert_eq!(service.get_login_id("abc").await.unwrap(), None);
        assert_eq!(service.get_subject("abc").await.unwrap(), None);
        assert!(!service.is_login(&ctx).await);
        assert!(matches!(
            service.authenticate(&ctx).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            service.login(LoginId::from(1), &ctx).await,
            Err(AuthError::Store(_))
        ));
        assert!(ctx.attached.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_survives_while_refreshed() {
        let service = service(2);
        let token = service.create_token(LoginId::from("u1")).await.unwrap();
        let ctx = FakeContext::with_token(&token);

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(service.check_token(&token).await.unwrap());
        assert!(service.authenticate(&ctx).await.is_ok());

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(service.check_token(&token).await.unwrap());

        tokio::time::sleep(std::time::Duration::from_millis(1000)).await;
        assert!(!service.check_token(&token).await.unwrap());
        assert_eq!(service.get_login_id(&token).await.unwrap(), None);
    }
}
