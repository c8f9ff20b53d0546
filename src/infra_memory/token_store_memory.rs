use super::{Sweeper, TtlCache};
use crate::application_port::TokenGenerator;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Token store living in process memory. Sessions do not survive a restart
/// and are not shared between processes.
pub struct MemoryTokenStore {
    cache: Arc<TtlCache<SessionSubject>>,
    generator: Arc<dyn TokenGenerator>,
    config: TokenStoreConfig,
    sweeper: Option<Sweeper>,
}

impl MemoryTokenStore {
    /// `sweep_interval` of `None` leaves expiry to lazy eviction alone.
    /// Starting a sweeper requires a tokio runtime.
    pub fn new(
        generator: Arc<dyn TokenGenerator>,
        config: TokenStoreConfig,
        sweep_interval: Option<Duration>,
    ) -> Self {
        let cache = Arc::new(TtlCache::new());
        let sweeper = sweep_interval.map(|period| cache.spawn_sweeper(period));
        if sweeper.is_none() {
            info!("memory token store running without sweeper");
        }

        MemoryTokenStore {
            cache,
            generator,
            config,
            sweeper,
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache<SessionSubject>> {
        &self.cache
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn create_token(&self, login_id: &LoginId) -> Result<String, TokenStoreError> {
        ensure_login_id(login_id)?;
        let token = self.generator.generate();
        let subject = SessionSubject::new(login_id.clone(), self.config.timeout_secs);
        self.cache
            .set(&self.config.key(&token), subject, self.config.timeout_secs);
        debug!(%login_id, "token created");
        Ok(token)
    }

    async fn check_token(&self, token: &str) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        Ok(self
            .cache
            .ttl(&self.config.key(token))
            .is_some_and(|remaining| !remaining.is_zero()))
    }

    async fn refresh_token(&self, token: &str) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        Ok(self
            .cache
            .touch(&self.config.key(token), self.config.timeout_secs))
    }

    async fn refresh_subject(
        &self,
        token: &str,
        subject: &SessionSubject,
    ) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        let key = self.config.key(token);
        if !self.cache.update(&key, subject.clone()) {
            return Ok(false);
        }
        Ok(self.cache.touch(&key, self.config.timeout_secs))
    }

    async fn get_subject(&self, token: &str) -> Result<Option<SessionSubject>, TokenStoreError> {
        ensure_token(token)?;
        Ok(self.cache.get(&self.config.key(token)))
    }

    async fn remaining_ttl(&self, token: &str) -> Result<Option<u64>, TokenStoreError> {
        ensure_token(token)?;
        Ok(self.cache.remaining_ttl(&self.config.key(token)))
    }

    async fn delete_token(&self, token: &str) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        let key = self.config.key(token);
        let existed = self.cache.contains(&key);
        self.cache.delete(&key);
        Ok(existed)
    }

    async fn delete_token_by_login_id(
        &self,
        login_id: &LoginId,
    ) -> Result<usize, TokenStoreError> {
        ensure_login_id(login_id)?;
        let mut removed = 0;
        for key in self.cache.keys() {
            if !key.starts_with(&self.config.token_prefix) {
                continue;
            }
            let owned = self
                .cache
                .get(&key)
                .is_some_and(|subject| &subject.login_id == login_id);
            if owned {
                self.cache.delete(&key);
                removed += 1;
            }
        }
        debug!(%login_id, removed, "tokens revoked by login id");
        Ok(removed)
    }

    async fn shutdown(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::token_generator;
    use crate::application_port::TokenStyle;
    use std::collections::HashSet;

    fn store(timeout_secs: u64) -> MemoryTokenStore {
        MemoryTokenStore::new(
            token_generator(TokenStyle::Uuid, 1),
            TokenStoreConfig {
                token_prefix: "auth_token:".to_string(),
                timeout_secs,
            },
            None,
        )
    }

    #[tokio::test]
    async fn test_created_token_resolves_to_login_id() {
        let store = store(60);
        let token = store.create_token(&LoginId::from("user-42")).await.unwrap();

        assert!(store.check_token(&token).await.unwrap());
        assert_eq!(
            store.get_login_id(&token).await.unwrap(),
            Some(LoginId::from("user-42"))
        );
        let subject = store.get_subject(&token).await.unwrap().unwrap();
        assert_eq!(subject.login_expire_time - subject.login_time, 60_000);
        assert!(store.cache().contains(&format!("auth_token:{}", token)));
    }

    #[tokio::test]
    async fn test_remaining_ttl_after_create_and_refresh() {
        let store = store(5);
        let token = store.create_token(&LoginId::Int(1)).await.unwrap();
        assert!(matches!(
            store.remaining_ttl(&token).await.unwrap(),
            Some(4 | 5)
        ));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(matches!(
            store.remaining_ttl(&token).await.unwrap(),
            Some(2 | 3)
        ));

        assert!(store.refresh_token(&token).await.unwrap());
        assert!(matches!(
            store.remaining_ttl(&token).await.unwrap(),
            Some(4 | 5)
        ));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = store(60);
        let token = store.create_token(&LoginId::Int(7)).await.unwrap();

        assert!(store.delete_token(&token).await.unwrap());
        assert!(!store.delete_token(&token).await.unwrap());
        assert!(!store.check_token(&token).await.unwrap());
        assert_eq!(store.get_login_id(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_does_not_resurrect() {
        let store = store(60);
        let token = store.create_token(&LoginId::Int(7)).await.unwrap();
        store.delete_token(&token).await.unwrap();

        assert!(!store.refresh_token(&token).await.unwrap());
        assert!(!store.check_token(&token).await.unwrap());
        assert!(!store.refresh_token("never-issued").await.unwrap());
        assert_eq!(store.cache().tracked_len(), 0);
    }

    #[tokio::test]
    async fn test_refresh_subject_replaces_live_subject() {
        let store = store(60);
        let token = store.create_token(&LoginId::from("alice")).await.unwrap();
        let subject = store.get_subject(&token).await.unwrap().unwrap();
        let renewed = SessionSubject {
            login_expire_time: subject.login_expire_time + 10,
            ..subject
        };

        assert!(store.refresh_subject(&token, &renewed).await.unwrap());
        assert_eq!(store.get_subject(&token).await.unwrap(), Some(renewed.clone()));
        assert!(!store.refresh_subject("unknown", &renewed).await.unwrap());
    }

    #[tokio::test]
    async fn test_bulk_revocation_is_scoped_to_login_id() {
        let store = store(60);
        let alice = LoginId::from("alice");
        let mut tokens = Vec::new();
        for _ in 0..3 {
            tokens.push(store.create_token(&alice).await.unwrap());
        }
        let bob_token = store.create_token(&LoginId::from("bob")).await.unwrap();
        let numeric = store.create_token(&LoginId::Int(42)).await.unwrap();
        store.cache().set("other:alice", store.get_subject(&tokens[0]).await.unwrap().unwrap(), 60);

        assert_eq!(store.delete_token_by_login_id(&alice).await.unwrap(), 3);
        for token in &tokens {
            assert!(!store.check_token(token).await.unwrap());
        }
        assert!(store.check_token(&bob_token).await.unwrap());
        assert!(store.check_token(&numeric).await.unwrap());
        assert!(store.cache().contains("other:alice"));

        assert_eq!(
            store.delete_token_by_login_id(&LoginId::from("42")).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_preconditions() {
        let store = store(60);
        assert!(store.check_token("").await.unwrap_err().is_invalid_argument());
        assert!(store.delete_token(" ").await.unwrap_err().is_invalid_argument());
        assert!(
            store
                .create_token(&LoginId::from(""))
                .await
                .unwrap_err()
                .is_invalid_argument()
        );
    }

    #[tokio::test]
    async fn test_expiry_without_sweeper() {
        let store = store(1);
        let token = store.create_token(&LoginId::Int(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(!store.check_token(&token).await.unwrap());
        assert_eq!(store.get_subject(&token).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creation_yields_distinct_tokens() {
        for style in [TokenStyle::Uuid, TokenStyle::Snowflake] {
            let store = Arc::new(MemoryTokenStore::new(
                token_generator(style, 1),
                TokenStoreConfig::default(),
                None,
            ));
            let tasks: Vec<_> = (0..200)
                .map(|i| {
                    let store = store.clone();
                    tokio::spawn(async move { store.create_token(&LoginId::Int(i)).await })
                })
                .collect();

            let mut tokens = HashSet::new();
            for task in tasks {
                tokens.insert(task.await.unwrap().unwrap());
            }
            assert_eq!(tokens.len(), 200);
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweeper() {
        let store = MemoryTokenStore::new(
            token_generator(TokenStyle::Uuid, 1),
            TokenStoreConfig::default(),
            Some(Duration::from_millis(50)),
        );
        store.shutdown().await;
        store.shutdown().await;
    }
}
