// src/tools.rs

use rust_mcp_sdk::schema::{
    schema_utils::CallToolError, CallToolRequestParams, CallToolResult, Tool,
};
use rust_mcp_sdk::{
    macros::{mcp_tool, JsonSchema},
    tool_box,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{ToolError, ValidationError};
use crate::razorpay::RazorpayService;
use crate::schemas::{validate_account_id, PaginationParams, MAX_COUNT, MIN_COUNT};

/// The JSON document carried in every tool reply, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResponse {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn into_call_tool_result(self) -> CallToolResult {
        let text = serde_json::to_string(&self).unwrap_or_else(|e| {
            format!(
                "{{\"success\":false,\"error\":\"Failed to serialize tool response: {}\"}}",
                e
            )
        });
        CallToolResult::text_content(text, None)
    }
}

fn envelope(tool: &str, result: Result<Value, ToolError>) -> CallToolResult {
    let response = match result {
        Ok(data) => {
            debug!(%tool, "Tool call succeeded");
            ToolResponse::success(data)
        }
        Err(err) => {
            warn!(%tool, "Tool call failed: {}", err);
            ToolResponse::failure(err.to_string())
        }
    };
    response.into_call_tool_result()
}

// --- Paginated list tools ---

#[mcp_tool(
    name = "getAllOrders",
    description = "Fetch all orders with pagination support"
)]
#[derive(Debug, Default, ::serde::Deserialize, ::serde::Serialize, JsonSchema)]
pub struct GetAllOrdersTool {
    /// Number of records to skip (>= 0).
    pub skip: Option<i64>,
    /// Number of records to return (1-100).
    pub count: Option<i64>,
    /// Only records created at or after this Unix timestamp.
    pub from: Option<i64>,
    /// Only records created at or before this Unix timestamp.
    pub to: Option<i64>,
}

#[mcp_tool(
    name = "getAllPayments",
    description = "Fetch all payments with pagination support"
)]
#[derive(Debug, Default, ::serde::Deserialize, ::serde::Serialize, JsonSchema)]
pub struct GetAllPaymentsTool {
    /// Number of records to skip (>= 0).
    pub skip: Option<i64>,
    /// Number of records to return (1-100).
    pub count: Option<i64>,
    /// Only records created at or after this Unix timestamp.
    pub from: Option<i64>,
    /// Only records created at or before this Unix timestamp.
    pub to: Option<i64>,
}

#[mcp_tool(
    name = "getAllSettlements",
    description = "Fetch all settlements with pagination support"
)]
#[derive(Debug, Default, ::serde::Deserialize, ::serde::Serialize, JsonSchema)]
pub struct GetAllSettlementsTool {
    /// Number of records to skip (>= 0).
    pub skip: Option<i64>,
    /// Number of records to return (1-100).
    pub count: Option<i64>,
    /// Only records created at or after this Unix timestamp.
    pub from: Option<i64>,
    /// Only records created at or before this Unix timestamp.
    pub to: Option<i64>,
}

#[mcp_tool(
    name = "getAllRefunds",
    description = "Fetch all refunds with pagination support"
)]
#[derive(Debug, Default, ::serde::Deserialize, ::serde::Serialize, JsonSchema)]
pub struct GetAllRefundsTool {
    /// Number of records to skip (>= 0).
    pub skip: Option<i64>,
    /// Number of records to return (1-100).
    pub count: Option<i64>,
    /// Only records created at or after this Unix timestamp.
    pub from: Option<i64>,
    /// Only records created at or before this Unix timestamp.
    pub to: Option<i64>,
}

#[mcp_tool(
    name = "getAllDisputes",
    description = "Fetch all disputes with pagination support"
)]
#[derive(Debug, Default, ::serde::Deserialize, ::serde::Serialize, JsonSchema)]
pub struct GetAllDisputesTool {
    /// Number of records to skip (>= 0).
    pub skip: Option<i64>,
    /// Number of records to return (1-100).
    pub count: Option<i64>,
    /// Only records created at or after this Unix timestamp.
    pub from: Option<i64>,
    /// Only records created at or before this Unix timestamp.
    pub to: Option<i64>,
}

#[mcp_tool(
    name = "getAllInvoices",
    description = "Fetch all invoices with pagination support"
)]
#[derive(Debug, Default, ::serde::Deserialize, ::serde::Serialize, JsonSchema)]
pub struct GetAllInvoicesTool {
    /// Number of records to skip (>= 0).
    pub skip: Option<i64>,
    /// Number of records to return (1-100).
    pub count: Option<i64>,
    /// Only records created at or after this Unix timestamp.
    pub from: Option<i64>,
    /// Only records created at or before this Unix timestamp.
    pub to: Option<i64>,
}

#[mcp_tool(
    name = "getAllContacts",
    description = "Fetch all contacts with pagination support"
)]
#[derive(Debug, Default, ::serde::Deserialize, ::serde::Serialize, JsonSchema)]
pub struct GetAllContactsTool {
    /// Number of records to skip (>= 0).
    pub skip: Option<i64>,
    /// Number of records to return (1-100).
    pub count: Option<i64>,
    /// Only records created at or after this Unix timestamp.
    pub from: Option<i64>,
    /// Only records created at or before this Unix timestamp.
    pub to: Option<i64>,
}

#[mcp_tool(
    name = "getAllTransactions",
    description = "Fetch all transactions with pagination support"
)]
#[derive(Debug, Default, ::serde::Deserialize, ::serde::Serialize, JsonSchema)]
pub struct GetAllTransactionsTool {
    /// Number of records to skip (>= 0).
    pub skip: Option<i64>,
    /// Number of records to return (1-100).
    pub count: Option<i64>,
    /// Only records created at or after this Unix timestamp.
    pub from: Option<i64>,
    /// Only records created at or before this Unix timestamp.
    pub to: Option<i64>,
}

#[mcp_tool(
    name = "getAllVPAs",
    description = "Fetch all VPAs (Virtual Payment Addresses) with pagination support"
)]
#[derive(Debug, Default, ::serde::Deserialize, ::serde::Serialize, JsonSchema)]
pub struct GetAllVpasTool {
    /// Number of records to skip (>= 0).
    pub skip: Option<i64>,
    /// Number of records to return (1-100).
    pub count: Option<i64>,
    /// Only records created at or after this Unix timestamp.
    pub from: Option<i64>,
    /// Only records created at or before this Unix timestamp.
    pub to: Option<i64>,
}

#[mcp_tool(
    name = "getAllCustomers",
    description = "Fetch all customers with pagination support"
)]
#[derive(Debug, Default, ::serde::Deserialize, ::serde::Serialize, JsonSchema)]
pub struct GetAllCustomersTool {
    /// Number of records to skip (>= 0).
    pub skip: Option<i64>,
    /// Number of records to return (1-100).
    pub count: Option<i64>,
    /// Only records created at or after this Unix timestamp.
    pub from: Option<i64>,
    /// Only records created at or before this Unix timestamp.
    pub to: Option<i64>,
}

/// Gives every list tool the same validate-then-forward `call_tool`.
macro_rules! paginated_tools {
    ($($tool:ident => $method:ident),* $(,)?) => {
        $(
            impl $tool {
                pub fn params(&self) -> PaginationParams {
                    PaginationParams {
                        skip: self.skip,
                        count: self.count,
                        from: self.from,
                        to: self.to,
                    }
                }

                pub async fn call_tool(&self, service: &RazorpayService) -> CallToolResult {
                    let result = match self.params().validate() {
                        Ok(options) => service.$method(options).await.map_err(ToolError::from),
                        Err(err) => Err(err.into()),
                    };
                    envelope(&Self::tool_name(), result)
                }
            }
        )*
    };
}

paginated_tools!(
    GetAllOrdersTool => get_all_orders,
    GetAllPaymentsTool => get_all_payments,
    GetAllSettlementsTool => get_all_settlements,
    GetAllRefundsTool => get_all_refunds,
    GetAllDisputesTool => get_all_disputes,
    GetAllInvoicesTool => get_all_invoices,
    GetAllContactsTool => get_all_contacts,
    GetAllTransactionsTool => get_all_transactions,
    GetAllVpasTool => get_all_vpas,
    GetAllCustomersTool => get_all_customers,
);

// --- Account balance ---

#[mcp_tool(
    name = "getAccountBalance",
    description = "Fetch account balance for a specific account"
)]
#[derive(Debug, ::serde::Deserialize, ::serde::Serialize, JsonSchema)]
pub struct GetAccountBalanceTool {
    /// Razorpay account identifier.
    #[serde(rename = "accountId")]
    pub account_id: String,
}

impl GetAccountBalanceTool {
    pub async fn call_tool(&self, service: &RazorpayService) -> CallToolResult {
        let result = match validate_account_id(&self.account_id) {
            Ok(account_id) => service
                .get_account_balance(account_id)
                .await
                .map_err(ToolError::from),
            Err(err) => Err(err.into()),
        };
        envelope(&Self::tool_name(), result)
    }
}

// --- Create a Tool Box ---
// This generates an enum `ServerTools` that contains all our defined tools.
tool_box!(
    ServerTools,
    [
        GetAllOrdersTool,
        GetAllPaymentsTool,
        GetAllSettlementsTool,
        GetAllRefundsTool,
        GetAllDisputesTool,
        GetAllInvoicesTool,
        GetAccountBalanceTool,
        GetAllContactsTool,
        GetAllTransactionsTool,
        GetAllVpasTool,
        GetAllCustomersTool
    ]
);

/// Tool definitions as advertised to clients. The derived input schemas only
/// carry types, so the limits the validators enforce are added here.
pub fn list_tools() -> Vec<Tool> {
    ServerTools::tools().into_iter().map(with_bounds).collect()
}

fn with_bounds(mut tool: Tool) -> Tool {
    let Some(properties) = tool.input_schema.properties.as_mut() else {
        return tool;
    };
    for (name, schema) in properties.iter_mut() {
        let bounds = match name.as_str() {
            "skip" => json!({ "type": "integer", "minimum": 0 }),
            "count" => json!({ "type": "integer", "minimum": MIN_COUNT, "maximum": MAX_COUNT }),
            "from" | "to" => json!({ "type": "integer", "exclusiveMinimum": 0 }),
            "accountId" => json!({ "minLength": 1 }),
            _ => continue,
        };
        if let Value::Object(bounds) = bounds {
            schema.extend(bounds);
        }
    }
    tool
}

fn is_registered(name: &str) -> bool {
    ServerTools::tools().iter().any(|tool| tool.name == name)
}

/// Runs one `tools/call` request. Every outcome for a registered tool is a
/// normal envelope; only an unknown tool name is reported as an error.
pub async fn dispatch_tool_call(
    service: &RazorpayService,
    params: CallToolRequestParams,
) -> Result<CallToolResult, CallToolError> {
    let name = params.name.clone();

    let tool_call = match ServerTools::try_from(params) {
        Ok(tool_call) => tool_call,
        Err(err) if is_registered(&name) => {
            // Arguments of the wrong JSON type never reach the validators.
            let err = ValidationError::new("arguments", err.to_string());
            return Ok(envelope(&name, Err(err.into())));
        }
        Err(err) => return Err(CallToolError::new(err)),
    };

    let result = match tool_call {
        ServerTools::GetAllOrdersTool(tool) => tool.call_tool(service).await,
        ServerTools::GetAllPaymentsTool(tool) => tool.call_tool(service).await,
        ServerTools::GetAllSettlementsTool(tool) => tool.call_tool(service).await,
        ServerTools::GetAllRefundsTool(tool) => tool.call_tool(service).await,
        ServerTools::GetAllDisputesTool(tool) => tool.call_tool(service).await,
        ServerTools::GetAllInvoicesTool(tool) => tool.call_tool(service).await,
        ServerTools::GetAccountBalanceTool(tool) => tool.call_tool(service).await,
        ServerTools::GetAllContactsTool(tool) => tool.call_tool(service).await,
        ServerTools::GetAllTransactionsTool(tool) => tool.call_tool(service).await,
        ServerTools::GetAllVpasTool(tool) => tool.call_tool(service).await,
        ServerTools::GetAllCustomersTool(tool) => tool.call_tool(service).await,
    };
    Ok(result)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{RazorpayError, Result as RazorpayResult};
    use crate::razorpay::{RazorpayApi, Resource};
    use crate::schemas::PaginationOptions;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        All(Resource, PaginationOptions),
        FetchAccount(String),
    }

    /// Records every call and answers with a fixed payload, or a fixed error.
    #[derive(Default)]
    pub(crate) struct FakeRazorpay {
        pub calls: Mutex<Vec<Call>>,
        pub fail_with: Option<String>,
    }

    impl FakeRazorpay {
        fn reply(&self, call: Call) -> RazorpayResult<Value> {
            self.calls.lock().unwrap().push(call.clone());
            if let Some(description) = &self.fail_with {
                return Err(RazorpayError::Api {
                    status: 400,
                    code: Some("BAD_REQUEST_ERROR".into()),
                    description: description.clone(),
                });
            }
            Ok(match call {
                Call::All(resource, _) => json!({
                    "entity": "collection",
                    "count": 1,
                    "items": [{ "id": "item_1", "path": resource.path() }]
                }),
                Call::FetchAccount(id) => json!({ "id": id, "balance": 125000 }),
            })
        }
    }

    #[async_trait]
    impl RazorpayApi for FakeRazorpay {
        async fn all(
            &self,
            resource: Resource,
            options: &PaginationOptions,
        ) -> RazorpayResult<Value> {
            self.reply(Call::All(resource, *options))
        }

        async fn fetch_account(&self, account_id: &str) -> RazorpayResult<Value> {
            self.reply(Call::FetchAccount(account_id.to_string()))
        }
    }

    pub(crate) fn service_with(fake: FakeRazorpay) -> (RazorpayService, Arc<FakeRazorpay>) {
        let fake = Arc::new(fake);
        (RazorpayService::new(fake.clone()), fake)
    }

    pub(crate) fn call_params(name: &str, arguments: Value) -> CallToolRequestParams {
        serde_json::from_value(json!({ "name": name, "arguments": arguments })).unwrap()
    }

    /// Pulls the envelope out of `content[0].text`.
    pub(crate) fn envelope_of(result: &CallToolResult) -> Value {
        let result = serde_json::to_value(result).unwrap();
        assert_eq!(result["content"][0]["type"], "text");
        let text = result["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    async fn call(service: &RazorpayService, name: &str, arguments: Value) -> Value {
        let result = dispatch_tool_call(service, call_params(name, arguments))
            .await
            .unwrap();
        envelope_of(&result)
    }

    #[test]
    fn registers_all_eleven_tools() {
        let mut names: Vec<String> = ServerTools::tools()
            .into_iter()
            .map(|tool| tool.name)
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "getAccountBalance",
                "getAllContacts",
                "getAllCustomers",
                "getAllDisputes",
                "getAllInvoices",
                "getAllOrders",
                "getAllPayments",
                "getAllRefunds",
                "getAllSettlements",
                "getAllTransactions",
                "getAllVPAs",
            ]
        );
    }

    fn input_schema(name: &str) -> Value {
        let tool = list_tools()
            .into_iter()
            .find(|tool| tool.name == name)
            .unwrap();
        serde_json::to_value(tool.input_schema).unwrap()
    }

    #[test]
    fn advertised_schemas_carry_pagination_bounds() {
        for tool in list_tools() {
            if tool.name == "getAccountBalance" {
                continue;
            }
            let schema = input_schema(&tool.name);
            let properties = &schema["properties"];
            assert_eq!(properties["skip"]["type"], "integer", "{}", tool.name);
            assert_eq!(properties["skip"]["minimum"], 0);
            assert_eq!(properties["count"]["minimum"], 1);
            assert_eq!(properties["count"]["maximum"], 100);
            assert_eq!(properties["from"]["exclusiveMinimum"], 0);
            assert_eq!(properties["to"]["exclusiveMinimum"], 0);
            assert!(properties["count"]["description"].is_string());
            assert!(schema.get("required").is_none(), "{}", tool.name);
        }
    }

    #[test]
    fn account_balance_schema_requires_a_non_empty_id() {
        let schema = input_schema("getAccountBalance");
        assert_eq!(schema["required"], json!(["accountId"]));
        assert_eq!(schema["properties"]["accountId"]["type"], "string");
        assert_eq!(schema["properties"]["accountId"]["minLength"], 1);
    }

    #[tokio::test]
    async fn list_tools_route_to_their_collections() {
        let cases = [
            ("getAllOrders", Resource::Orders),
            ("getAllPayments", Resource::Payments),
            ("getAllSettlements", Resource::Settlements),
            ("getAllRefunds", Resource::Refunds),
            ("getAllDisputes", Resource::Disputes),
            ("getAllInvoices", Resource::Invoices),
            ("getAllContacts", Resource::Customers),
            ("getAllTransactions", Resource::Transfers),
            ("getAllVPAs", Resource::VirtualAccounts),
            ("getAllCustomers", Resource::Customers),
        ];

        for (name, resource) in cases {
            let (service, fake) = service_with(FakeRazorpay::default());
            let envelope = call(&service, name, json!({})).await;
            assert_eq!(envelope["success"], true, "{name}");
            assert_eq!(
                *fake.calls.lock().unwrap(),
                vec![Call::All(resource, PaginationOptions::default())],
                "{name}"
            );
        }
    }

    #[tokio::test]
    async fn valid_pagination_is_forwarded_unmodified() {
        let (service, fake) = service_with(FakeRazorpay::default());
        let envelope = call(
            &service,
            "getAllPayments",
            json!({ "skip": 20, "count": 100, "from": 1_690_000_000, "to": 1_700_000_000 }),
        )
        .await;

        assert_eq!(
            *fake.calls.lock().unwrap(),
            vec![Call::All(
                Resource::Payments,
                PaginationOptions {
                    skip: Some(20),
                    count: Some(100),
                    from: Some(1_690_000_000),
                    to: Some(1_700_000_000),
                }
            )]
        );
        assert_eq!(
            envelope,
            json!({
                "success": true,
                "data": {
                    "entity": "collection",
                    "count": 1,
                    "items": [{ "id": "item_1", "path": "/v1/payments" }]
                }
            })
        );
    }

    #[tokio::test]
    async fn invalid_pagination_never_reaches_razorpay() {
        for arguments in [
            json!({ "count": 0 }),
            json!({ "count": 101 }),
            json!({ "skip": -1 }),
            json!({ "from": 0 }),
            json!({ "count": "ten" }),
            json!({ "skip": 1.5 }),
        ] {
            let (service, fake) = service_with(FakeRazorpay::default());
            let envelope = call(&service, "getAllOrders", arguments.clone()).await;

            assert_eq!(envelope["success"], false, "{arguments}");
            assert!(envelope.get("data").is_none());
            assert!(!envelope["error"].as_str().unwrap().is_empty());
            assert!(fake.calls.lock().unwrap().is_empty(), "{arguments}");
        }
    }

    #[tokio::test]
    async fn account_balance_requires_an_id() {
        let (service, fake) = service_with(FakeRazorpay::default());

        let envelope = call(&service, "getAccountBalance", json!({ "accountId": "" })).await;
        assert_eq!(envelope["success"], false);
        assert_eq!(
            envelope["error"],
            "Invalid parameter `accountId`: Account ID cannot be empty"
        );

        let envelope = call(&service, "getAccountBalance", json!({})).await;
        assert_eq!(envelope["success"], false);
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn account_balance_fetches_exactly_that_account() {
        let (service, fake) = service_with(FakeRazorpay::default());

        let envelope = call(&service, "getAccountBalance", json!({ "accountId": "acc_9" })).await;
        assert_eq!(envelope["success"], true);
        assert_eq!(envelope["data"]["id"], "acc_9");
        assert_eq!(
            *fake.calls.lock().unwrap(),
            vec![Call::FetchAccount("acc_9".into())]
        );
    }

    #[tokio::test]
    async fn upstream_failures_become_error_envelopes() {
        let (service, _) = service_with(FakeRazorpay {
            fail_with: Some("Authentication failed".into()),
            ..Default::default()
        });

        let envelope = call(&service, "getAllRefunds", json!({ "count": 5 })).await;
        assert_eq!(
            envelope,
            json!({ "success": false, "error": "Authentication failed" })
        );
    }

    #[tokio::test]
    async fn repeated_calls_yield_identical_envelopes() {
        let (service, _) = service_with(FakeRazorpay::default());
        let first = call(&service, "getAllInvoices", json!({ "count": 3 })).await;
        let second = call(&service, "getAllInvoices", json!({ "count": 3 })).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_tools_are_rejected() {
        let (service, fake) = service_with(FakeRazorpay::default());
        let result = dispatch_tool_call(&service, call_params("refundEverything", json!({}))).await;
        assert!(result.is_err());
        assert!(fake.calls.lock().unwrap().is_empty());
    }
}
