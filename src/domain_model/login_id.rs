use serde::{Deserialize, Serialize};
use std::fmt;

/// Application identity bound to a session. Either a number or a string,
/// never a composite value.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoginId {
    Int(i64),
    Str(String),
}

impl LoginId {
    pub fn is_blank(&self) -> bool {
        match self {
            LoginId::Int(_) => false,
            LoginId::Str(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for LoginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginId::Int(id) => write!(f, "{}", id),
            LoginId::Str(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for LoginId {
    fn from(id: i64) -> Self {
        LoginId::Int(id)
    }
}

impl From<&str> for LoginId {
    fn from(id: &str) -> Self {
        LoginId::Str(id.to_owned())
    }
}

impl From<String> for LoginId {
    fn from(id: String) -> Self {
        LoginId::Str(id)
    }
}
