use std::str::FromStr;

/// Produces token strings. Must be callable from many tasks at once.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Token styles selectable from configuration. Anything else can be
/// plugged in directly as an `Arc<dyn TokenGenerator>`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TokenStyle {
    /// 128 random bits, 32 lowercase hex characters.
    Uuid,
    /// 64-bit time ordered id, decimal.
    Snowflake,
    /// 32 random characters from `[A-Za-z0-9_]`.
    Nanoid,
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported token style: {0}")]
pub struct TokenStyleError(pub String);

impl FromStr for TokenStyle {
    type Err = TokenStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" => Ok(TokenStyle::Uuid),
            "snowflake" => Ok(TokenStyle::Snowflake),
            "nanoid" => Ok(TokenStyle::Nanoid),
            _ => Err(TokenStyleError(s.to_owned())),
        }
    }
}
