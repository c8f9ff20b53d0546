use crate::application_impl::MAX_NODE_ID;
use crate::application_port::{TokenStyle, TokenStyleError};
use crate::domain_port::TokenStoreConfig;
use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub auth: Auth,
    pub redis: Option<Redis>,
    pub mysql: Option<MySql>,
    pub http: Http,
    #[serde(default)]
    pub log: Log,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    Redis,
    #[serde(alias = "mysql")]
    Jdbc,
    Single,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Auth {
    pub store_type: StoreType,
    /// Header and cookie name carrying the token.
    pub token_name: String,
    /// Session lifetime in seconds.
    pub timeout: u64,
    pub token_style: String,
    pub token_prefix: String,
    pub table_name: String,
    /// Seconds between memory sweeps, `<= 0` disables the sweeper.
    pub sweep_interval: i64,
    /// Snowflake node id.
    pub node_id: u16,
}

impl Default for Auth {
    fn default() -> Self {
        Auth {
            store_type: StoreType::Redis,
            token_name: "token".to_string(),
            timeout: 3600,
            token_style: "uuid".to_string(),
            token_prefix: "auth_token:".to_string(),
            table_name: "s_auth_token".to_string(),
            sweep_interval: 30,
            node_id: 1,
        }
    }
}

impl Auth {
    /// Reject values the stores cannot honour. Called before anything is
    /// built from these settings.
    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            return Err(anyhow!("auth.timeout must be at least 1 second"));
        }
        if self.node_id > MAX_NODE_ID {
            return Err(anyhow!(
                "auth.node_id must be at most {}, got {}",
                MAX_NODE_ID,
                self.node_id
            ));
        }
        if self.token_name.trim().is_empty() {
            return Err(anyhow!("auth.token_name cannot be empty"));
        }
        self.token_style()?;
        Ok(())
    }

    pub fn token_style(&self) -> Result<TokenStyle, TokenStyleError> {
        self.token_style.parse()
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval > 0).then(|| Duration::from_secs(self.sweep_interval as u64))
    }

    pub fn store_config(&self) -> TokenStoreConfig {
        TokenStoreConfig {
            token_prefix: self.token_prefix.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Redis {
    pub dsn: String,
}

#[derive(Debug, Deserialize)]
pub struct MySql {
    pub dsn: String,
    #[serde(default)]
    pub ensure_table: bool,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            filter: "info".to_string(),
        }
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
