use super::LoginId;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current wall clock in epoch milliseconds. Every expiry instant in the
/// crate is expressed on this clock.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// What a token resolves to. Stored as JSON by the Redis and MySQL backends,
/// with the camelCase field names existing deployments already hold.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSubject {
    pub login_id: LoginId,
    /// Epoch milliseconds.
    pub login_time: i64,
    /// Epoch milliseconds.
    pub login_expire_time: i64,
}

impl SessionSubject {
    pub fn new(login_id: LoginId, timeout_secs: u64) -> Self {
        let login_time = now_millis();
        SessionSubject {
            login_id,
            login_time,
            login_expire_time: login_time + secs_to_millis(timeout_secs),
        }
    }

    /// Moves the expiry to `timeout_secs` from now.
    pub fn renewed(&self, timeout_secs: u64) -> Self {
        SessionSubject {
            login_expire_time: now_millis() + secs_to_millis(timeout_secs),
            ..self.clone()
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

pub(crate) fn secs_to_millis(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}
