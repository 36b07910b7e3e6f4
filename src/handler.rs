// src/handler.rs

use async_trait::async_trait;
use rust_mcp_sdk::schema::{
    schema_utils::CallToolError, CallToolRequest, CallToolResult, ListToolsRequest,
    ListToolsResult, RpcError,
};
use rust_mcp_sdk::{mcp_server::ServerHandler, McpServer};
use tracing::info;

use crate::razorpay::RazorpayService;
use crate::tools::{dispatch_tool_call, list_tools};

// Custom Handler to handle MCP Messages
pub struct RazorpayServerHandler {
    service: RazorpayService,
}

impl RazorpayServerHandler {
    pub fn new(service: RazorpayService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ServerHandler for RazorpayServerHandler {
    // Handle ListToolsRequest, return list of available tools as ListToolsResult
    async fn handle_list_tools_request(
        &self,
        _request: ListToolsRequest,
        _runtime: &dyn McpServer,
    ) -> std::result::Result<ListToolsResult, RpcError> {
        Ok(ListToolsResult {
            tools: list_tools(),
            meta: None,
            next_cursor: None,
        })
    }

    /// Handles incoming CallToolRequest and processes it using the appropriate tool.
    async fn handle_call_tool_request(
        &self,
        request: CallToolRequest,
        _runtime: &dyn McpServer,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        info!(tool = %request.params.name, "Tool call received");
        dispatch_tool_call(&self.service, request.params).await
    }
}
