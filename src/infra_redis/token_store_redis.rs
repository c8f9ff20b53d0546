use crate::application_port::TokenGenerator;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, FromRedisValue, RedisError, RedisResult, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

const SCAN_BATCH: usize = 500;

/// Token store on Redis. Expiry is Redis' own key TTL.
///
/// Revoking by login id walks every key under the prefix with `SCAN`, which
/// is linear in the number of live sessions.
pub struct RedisTokenStore {
    conn: ConnectionManager,
    generator: Arc<dyn TokenGenerator>,
    config: TokenStoreConfig,
}

impl RedisTokenStore {
    pub fn new(
        conn: ConnectionManager,
        generator: Arc<dyn TokenGenerator>,
        config: TokenStoreConfig,
    ) -> Self {
        RedisTokenStore {
            conn,
            generator,
            config,
        }
    }

    fn key(&self, token: &str) -> String {
        self.config.key(token)
    }

    fn ttl_arg(&self) -> i64 {
        i64::try_from(self.config.timeout_secs).unwrap_or(i64::MAX)
    }

    async fn scan_keys(&self) -> Result<Vec<String>, TokenStoreError> {
        let pattern = scan_pattern(&self.config.token_prefix);
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| store_error("scan", e))?;
            keys.extend(batch);
            if next == 0 {
                return Ok(keys);
            }
            cursor = next;
        }
    }
}

impl FromRedisValue for SessionSubject {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        let subject = SessionSubject::decode(&s).map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "invalid session subject",
                e.to_string(),
            ))
        })?;
        Ok(subject)
    }
}

/// `SCAN MATCH` pattern for every key under `prefix`, with glob
/// characters in the prefix matched literally.
fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

fn store_error(op: &str, e: RedisError) -> TokenStoreError {
    error!("redis token store {} failed: {}", op, e);
    if e.kind() == redis::ErrorKind::TypeError {
        TokenStoreError::Codec(e.to_string())
    } else {
        TokenStoreError::Store(e.to_string())
    }
}

#[async_trait::async_trait]
impl TokenStore for RedisTokenStore {
    async fn create_token(&self, login_id: &LoginId) -> Result<String, TokenStoreError> {
        ensure_login_id(login_id)?;
        let token = self.generator.generate();
        let subject = SessionSubject::new(login_id.clone(), self.config.timeout_secs);
        let content = subject.encode()?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(self.key(&token), content, self.config.timeout_secs)
            .await
            .map_err(|e| store_error("create_token", e))?;
        debug!(%login_id, "token created");
        Ok(token)
    }

    async fn check_token(&self, token: &str) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        let mut conn = self.conn.clone();
        let exists: bool = conn
            .exists(self.key(token))
            .await
            .map_err(|e| store_error("check_token", e))?;
        Ok(exists)
    }

    async fn refresh_token(&self, token: &str) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        let mut conn = self.conn.clone();
        let refreshed: bool = conn
            .expire(self.key(token), self.ttl_arg())
            .await
            .map_err(|e| store_error("refresh_token", e))?;
        Ok(refreshed)
    }

    async fn refresh_subject(
        &self,
        token: &str,
        subject: &SessionSubject,
    ) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        let content = subject.encode()?;
        let mut conn = self.conn.clone();
        // XX: only overwrite a key that still exists.
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.key(token))
            .arg(content)
            .arg("EX")
            .arg(self.config.timeout_secs)
            .arg("XX")
            .query_async(&mut conn)
            .await
            .map_err(|e| store_error("refresh_subject", e))?;
        Ok(reply.is_some())
    }

    async fn get_subject(&self, token: &str) -> Result<Option<SessionSubject>, TokenStoreError> {
        ensure_token(token)?;
        let mut conn = self.conn.clone();
        let subject: Option<SessionSubject> = conn
            .get(self.key(token))
            .await
            .map_err(|e| store_error("get_subject", e))?;
        Ok(subject)
    }

    async fn remaining_ttl(&self, token: &str) -> Result<Option<u64>, TokenStoreError> {
        ensure_token(token)?;
        let mut conn = self.conn.clone();
        // -2: no key, -1: key without expiry
        let ttl: i64 = conn
            .ttl(self.key(token))
            .await
            .map_err(|e| store_error("remaining_ttl", e))?;
        Ok(u64::try_from(ttl).ok())
    }

    async fn delete_token(&self, token: &str) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        let mut conn = self.conn.clone();
        let removed: usize = conn
            .del(self.key(token))
            .await
            .map_err(|e| store_error("delete_token", e))?;
        Ok(removed > 0)
    }

    async fn delete_token_by_login_id(
        &self,
        login_id: &LoginId,
    ) -> Result<usize, TokenStoreError> {
        ensure_login_id(login_id)?;
        let keys = self.scan_keys().await?;
        let mut conn = self.conn.clone();
        let mut removed = 0;
        for key in keys {
            let subject: Option<SessionSubject> = match conn.get(&key).await {
                Ok(subject) => subject,
                Err(e) => {
                    warn!(key = %key, "skipping unreadable session: {}", e);
                    continue;
                }
            };
            if !subject.is_some_and(|s| &s.login_id == login_id) {
                continue;
            }
            let deleted: RedisResult<usize> = conn.del(&key).await;
            match deleted {
                Ok(n) => removed += n,
                Err(e) => warn!(key = %key, "failed to revoke session: {}", e),
            }
        }
        debug!(%login_id, removed, "tokens revoked by login id");
        Ok(removed)
    }
}
