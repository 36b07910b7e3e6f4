// src/main.rs
use clap::Parser;
use razorpay_mcp_server::cli::{report_config_error, StdioArgs};
use razorpay_mcp_server::razorpay::RazorpayService;
use razorpay_mcp_server::{init_tracing, start_stdio};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = StdioArgs::parse();
    let config = match args.credentials.into_config() {
        Ok(config) => config,
        Err(err) => {
            report_config_error(&err);
            std::process::exit(1);
        }
    };

    init_tracing();
    let service = RazorpayService::from_config(&config)?;
    start_stdio(service).await?;
    Ok(())
}
