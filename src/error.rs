// src/error.rs

use thiserror::Error;

/// Startup configuration rejected. Each message is reported on its own line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration validation failed: {}", .messages.join("; "))]
pub struct ConfigError {
    messages: Vec<String>,
}

impl ConfigError {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

/// Caller-supplied tool parameters rejected by a schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid parameter `{field}`: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failures raised while talking to the Razorpay API.
#[derive(Error, Debug)]
pub enum RazorpayError {
    #[error("Request to Razorpay failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{description}")]
    Api {
        status: u16,
        code: Option<String>,
        description: String,
    },

    #[error("Failed to decode Razorpay response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid Razorpay URL: {0}")]
    InvalidUrl(String),
}

/// Everything a tool handler can fail with. The `Display` output is what
/// ends up in the envelope's `error` field.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] RazorpayError),
}

pub type Result<T> = std::result::Result<T, RazorpayError>;
