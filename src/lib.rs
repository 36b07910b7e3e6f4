//! # razorpay_mcp_server
//!
//! Model Context Protocol (MCP) server exposing the Razorpay REST API (orders,
//! payments, settlements, refunds, disputes, invoices, account balances,
//! contacts, transfers, virtual accounts and customers) as tools.
//!
//! ## Features
//!
//! - **Two transports**: stdio and SSE (Server-Sent Events) over HTTP
//! - **Uniform replies**: every tool answers with a `{success, data | error}`
//!   JSON envelope, never a protocol fault
//! - **Validated input**: pagination (`skip`, `count`, `from`, `to`) is checked
//!   before Razorpay is called
//!
//! ## Usage
//!
//! ### CLI
//!
//! ```bash
//! # Start stdio server
//! razorpay-mcp-stdio --key-id rzp_test_xxx --key-secret yyy
//!
//! # Start SSE server on port 3001
//! razorpay-mcp-sse --key-id rzp_test_xxx --key-secret yyy --port 3001
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use razorpay_mcp_server::{config::Config, razorpay::RazorpayService, start_stdio};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new(Some("rzp_test_xxx".into()), Some("yyy".into()))?;
//!     start_stdio(RazorpayService::from_config(&config)?).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod razorpay;
pub mod schemas;
pub mod sse;
pub mod tools;

use handler::RazorpayServerHandler;
use razorpay::RazorpayService;
use rust_mcp_sdk::{
    error::SdkResult,
    mcp_server::{server_runtime, ServerRuntime},
    schema::{
        Implementation, InitializeResult, ServerCapabilities, ServerCapabilitiesTools,
        LATEST_PROTOCOL_VERSION,
    },
    McpServer, StdioTransport, TransportOptions,
};
use sse::SseOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const SERVER_NAME: &str = "razorpay-mcp";

/// The `initialize` result both transports advertise.
pub fn server_details() -> InitializeResult {
    InitializeResult {
        server_info: Implementation {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
        instructions: Some(
            "Razorpay MCP server. Use list_tools to see the available Razorpay queries.".into(),
        ),
        meta: None,
    }
}

/// Installs the global tracing subscriber. Logs go to stderr so stdout stays
/// free for the stdio transport; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

fn log_tools(mode: &str) {
    let available_tools = tools::list_tools();
    tracing::info!("🚀 Starting Razorpay MCP server ({} mode)...", mode);
    tracing::info!("📋 Available tools ({}):", available_tools.len());
    for (i, tool) in available_tools.iter().enumerate() {
        tracing::info!(
            "   {}. {} - {}",
            i + 1,
            tool.name,
            tool.description.as_deref().unwrap_or("No description")
        );
    }
}

/// Starts the MCP server in **stdio** mode.
///
/// Reads framed MCP requests from `stdin` and writes framed responses to
/// `stdout` until the input closes.
pub async fn start_stdio(service: RazorpayService) -> SdkResult<()> {
    log_tools("stdio");

    let transport = StdioTransport::new(TransportOptions::default())?;
    let handler = RazorpayServerHandler::new(service);
    let server: ServerRuntime = server_runtime::create_server(server_details(), transport, handler);

    tracing::info!("✅ Server initialized successfully. Listening for MCP requests...");
    server.start().await?;
    Ok(())
}

/// Starts the MCP server in **SSE** mode and serves until SIGINT/SIGTERM.
pub async fn start_sse(service: RazorpayService, options: SseOptions) -> std::io::Result<()> {
    log_tools("SSE");
    sse::serve(service, &options).await
}
