// src/config.rs

use std::fmt;

use crate::error::ConfigError;

/// Validated Razorpay credentials. Built once at startup, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    key_id: String,
    key_secret: String,
}

impl Config {
    /// Validates both credentials, collecting one message per failure.
    pub fn new(
        key_id: Option<String>,
        key_secret: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut messages = Vec::new();

        let key_id = key_id.unwrap_or_default();
        if key_id.is_empty() {
            messages.push("Razorpay Key ID is required".to_string());
        }

        let key_secret = key_secret.unwrap_or_default();
        if key_secret.is_empty() {
            messages.push("Razorpay Key Secret is required".to_string());
        }

        if !messages.is_empty() {
            return Err(ConfigError::new(messages));
        }

        Ok(Self { key_id, key_secret })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn key_secret(&self) -> &str {
        &self.key_secret
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .finish()
    }
}
