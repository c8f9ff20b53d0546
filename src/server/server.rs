use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::{Settings, StoreType};
use anyhow::anyhow;
use sqlx::MySqlPool;
use std::sync::Arc;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    store: Arc<dyn TokenStore>,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let auth = &settings.auth;
        auth.validate()?;
        let generator = token_generator(auth.token_style()?, auth.node_id);
        let config = auth.store_config();
        let mut pool = None;

        let store: Arc<dyn TokenStore> = match auth.store_type {
            StoreType::Redis => {
                let redis_settings = settings
                    .redis
                    .as_ref()
                    .ok_or_else(|| anyhow!("store_type is redis but [redis] is missing"))?;
                let redis_client = redis::Client::open(redis_settings.dsn.as_str())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisTokenStore::new(redis_manager, generator, config))
            }
            StoreType::Jdbc => {
                let mysql_settings = settings
                    .mysql
                    .as_ref()
                    .ok_or_else(|| anyhow!("store_type is jdbc but [mysql] is missing"))?;
                let mysql_pool = MySqlPool::connect(&mysql_settings.dsn).await?;
                let store =
                    MySqlTokenStore::new(mysql_pool.clone(), generator, config, &auth.table_name)?;
                if mysql_settings.ensure_table {
                    store.ensure_table().await?;
                }
                pool = Some(mysql_pool);
                Arc::new(store)
            }
            StoreType::Single => Arc::new(MemoryTokenStore::new(
                generator,
                config,
                auth.sweep_interval(),
            )),
        };

        let auth_service: Arc<dyn AuthService> =
            Arc::new(RealAuthService::new(store.clone(), auth.token_name.clone()));

        info!(store_type = ?auth.store_type, "server started");

        Ok(Self {
            auth_service,
            store,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.store.shutdown().await;
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
