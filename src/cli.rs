// src/cli.rs

use clap::{Args, Parser};

use crate::config::Config;
use crate::error::ConfigError;
use crate::sse::{SseOptions, DEFAULT_PORT};

/// Razorpay credentials. Accepted on the command line only.
#[derive(Args, Clone, Default)]
pub struct Credentials {
    /// Razorpay API key id
    #[arg(long = "key-id", value_name = "KEY_ID")]
    pub key_id: Option<String>,

    /// Razorpay API key secret
    #[arg(long = "key-secret", value_name = "KEY_SECRET")]
    pub key_secret: Option<String>,
}

impl Credentials {
    pub fn into_config(self) -> Result<Config, ConfigError> {
        Config::new(self.key_id, self.key_secret)
    }
}

#[derive(Parser)]
#[command(name = "razorpay-mcp-stdio")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Razorpay MCP server over stdio")]
pub struct StdioArgs {
    #[command(flatten)]
    pub credentials: Credentials,
}

#[derive(Parser)]
#[command(name = "razorpay-mcp-sse")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Razorpay MCP server over HTTP Server-Sent Events")]
pub struct SseArgs {
    #[command(flatten)]
    pub credentials: Credentials,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT, value_parser = parse_port)]
    pub port: u16,

    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
}

impl SseArgs {
    pub fn options(&self) -> SseOptions {
        SseOptions {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

fn parse_port(value: &str) -> Result<u16, String> {
    match value.trim().parse::<u16>() {
        Ok(port) if port >= 1 => Ok(port),
        _ => Err("Port must be a valid number between 1 and 65535".to_string()),
    }
}

/// Prints one diagnostic line per configuration problem to stderr.
pub fn report_config_error(err: &ConfigError) {
    eprintln!("Configuration validation failed:");
    for message in err.messages() {
        eprintln!("- {}", message);
    }
}
