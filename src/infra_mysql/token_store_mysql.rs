use super::Janitor;
use crate::application_port::TokenGenerator;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Token store on a MySQL table.
///
/// Rows carry their expiry in `token_expire_time` (epoch ms). Reads ignore
/// expired rows and a [`Janitor`] deletes them once a day. Tokens are stored
/// as-is in `token_str`; the key prefix only applies to key-value backends.
pub struct MySqlTokenStore {
    pool: MySqlPool,
    generator: Arc<dyn TokenGenerator>,
    config: TokenStoreConfig,
    table: String,
    janitor: Janitor,
}

impl MySqlTokenStore {
    /// Starts the daily janitor, so this must run inside a tokio runtime.
    pub fn new(
        pool: MySqlPool,
        generator: Arc<dyn TokenGenerator>,
        config: TokenStoreConfig,
        table_name: &str,
    ) -> Result<Self, TokenStoreError> {
        ensure_table_name(table_name)?;
        let table = table_name.to_owned();
        let janitor = Janitor::spawn(pool.clone(), table.clone());

        Ok(MySqlTokenStore {
            pool,
            generator,
            config,
            table,
            janitor,
        })
    }

    /// Create the token table when it does not exist yet.
    pub async fn ensure_table(&self) -> Result<(), TokenStoreError> {
        let sql = format!(
            r#"
CREATE TABLE IF NOT EXISTS {} (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    token_str VARCHAR(128) NOT NULL,
    login_id VARCHAR(128) NOT NULL,
    login_subject TEXT NOT NULL,
    token_expire_time BIGINT NOT NULL,
    UNIQUE KEY uk_token_str (token_str),
    KEY idx_login_id (login_id),
    KEY idx_token_expire_time (token_expire_time)
)
"#,
            self.table
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("ensure_table", e))?;
        info!(table = %self.table, "token table ready");
        Ok(())
    }

    /// What the janitor runs: drop every expired row now.
    pub async fn clean_expired(&self) -> Result<u64, TokenStoreError> {
        delete_expired(&self.pool, &self.table)
            .await
            .map_err(|e| store_error("clean_expired", e))
    }

    fn expire_time(&self) -> i64 {
        now_millis().saturating_add(secs_to_millis(self.config.timeout_secs))
    }

    fn row_to_subject(row: MySqlRow) -> Result<SessionSubject, TokenStoreError> {
        let content: String = row
            .try_get("login_subject")
            .map_err(|e| store_error("decode login_subject", e))?;
        SessionSubject::decode(&content).map_err(|e| {
            error!("mysql token store holds an undecodable subject: {}", e);
            TokenStoreError::from(e)
        })
    }
}

pub(crate) async fn delete_expired(pool: &MySqlPool, table: &str) -> Result<u64, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE token_expire_time < ?", table);
    let result = sqlx::query(&sql).bind(now_millis()).execute(pool).await?;
    Ok(result.rows_affected())
}

fn ensure_table_name(table_name: &str) -> Result<(), TokenStoreError> {
    let valid = !table_name.is_empty()
        && table_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(TokenStoreError::InvalidArgument(format!(
            "invalid table name: {:?}",
            table_name
        )));
    }
    Ok(())
}

fn store_error(op: &str, e: sqlx::Error) -> TokenStoreError {
    error!("mysql token store {} failed: {}", op, e);
    TokenStoreError::Store(e.to_string())
}

#[async_trait::async_trait]
impl TokenStore for MySqlTokenStore {
    async fn create_token(&self, login_id: &LoginId) -> Result<String, TokenStoreError> {
        ensure_login_id(login_id)?;
        let token = self.generator.generate();
        let subject = SessionSubject::new(login_id.clone(), self.config.timeout_secs);
        let sql = format!(
            r#"
INSERT INTO {} (token_str, login_id, login_subject, token_expire_time)
VALUES (?, ?, ?, ?)
"#,
            self.table
        );
        sqlx::query(&sql)
            .bind(&token)
            .bind(login_id.to_string())
            .bind(subject.encode()?)
            .bind(subject.login_expire_time)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("create_token", e))?;
        debug!(%login_id, "token created");
        Ok(token)
    }

    async fn check_token(&self, token: &str) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        let sql = format!(
            "SELECT token_expire_time FROM {} WHERE token_str = ?",
            self.table
        );
        let row_opt: Option<MySqlRow> = sqlx::query(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("check_token", e))?;

        match row_opt {
            Some(row) => {
                let expire_time: i64 = row
                    .try_get("token_expire_time")
                    .map_err(|e| store_error("decode token_expire_time", e))?;
                Ok(expire_time > now_millis())
            }
            None => Ok(false),
        }
    }

    async fn refresh_token(&self, token: &str) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        let sql = format!(
            r#"
UPDATE {} SET token_expire_time = ?
WHERE token_str = ? AND token_expire_time > ?
"#,
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(self.expire_time())
            .bind(token)
            .bind(now_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("refresh_token", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn refresh_subject(
        &self,
        token: &str,
        subject: &SessionSubject,
    ) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        let sql = format!(
            r#"
UPDATE {} SET token_expire_time = ?, login_subject = ?
WHERE token_str = ? AND token_expire_time > ?
"#,
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(self.expire_time())
            .bind(subject.encode()?)
            .bind(token)
            .bind(now_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("refresh_subject", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_subject(&self, token: &str) -> Result<Option<SessionSubject>, TokenStoreError> {
        ensure_token(token)?;
        let sql = format!(
            r#"
SELECT login_subject FROM {}
WHERE token_str = ? AND token_expire_time > ?
"#,
            self.table
        );
        let row_opt: Option<MySqlRow> = sqlx::query(&sql)
            .bind(token)
            .bind(now_millis())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("get_subject", e))?;

        row_opt.map(Self::row_to_subject).transpose()
    }

    async fn remaining_ttl(&self, token: &str) -> Result<Option<u64>, TokenStoreError> {
        ensure_token(token)?;
        let sql = format!(
            "SELECT token_expire_time FROM {} WHERE token_str = ?",
            self.table
        );
        let expire_time: Option<i64> = sqlx::query_scalar(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("remaining_ttl", e))?;

        let now = now_millis();
        Ok(expire_time
            .filter(|expire_time| *expire_time > now)
            .map(|expire_time| ((expire_time - now) / 1000) as u64))
    }

    async fn delete_token(&self, token: &str) -> Result<bool, TokenStoreError> {
        ensure_token(token)?;
        let sql = format!("DELETE FROM {} WHERE token_str = ?", self.table);
        let result = sqlx::query(&sql)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("delete_token", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_token_by_login_id(
        &self,
        login_id: &LoginId,
    ) -> Result<usize, TokenStoreError> {
        ensure_login_id(login_id)?;
        let sql = format!("DELETE FROM {} WHERE login_id = ?", self.table);
        let result = sqlx::query(&sql)
            .bind(login_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("delete_token_by_login_id", e))?;
        let removed = result.rows_affected() as usize;
        debug!(%login_id, removed, "tokens revoked by login id");
        Ok(removed)
    }

    async fn shutdown(&self) {
        self.janitor.stop().await;
    }
}
