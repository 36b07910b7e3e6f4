// src/razorpay.rs

//! Thin adapter over the Razorpay REST API.
//!
//! [`RazorpayApi`] is the seam the tools talk through; [`RazorpayClient`] is
//! the real HTTP implementation and [`RazorpayService`] exposes one method per
//! tool. Results are passed back exactly as Razorpay returned them.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{RazorpayError, Result};
use crate::schemas::PaginationOptions;

pub const DEFAULT_BASE_URL: &str = "https://api.razorpay.com";

/// Collections reachable through a paginated `list` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Orders,
    Payments,
    Settlements,
    Refunds,
    Disputes,
    Invoices,
    Customers,
    Transfers,
    VirtualAccounts,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::Orders => "/v1/orders",
            Resource::Payments => "/v1/payments",
            Resource::Settlements => "/v1/settlements",
            Resource::Refunds => "/v1/refunds",
            Resource::Disputes => "/v1/disputes",
            Resource::Invoices => "/v1/invoices",
            Resource::Customers => "/v1/customers",
            Resource::Transfers => "/v1/transfers",
            Resource::VirtualAccounts => "/v1/virtual_accounts",
        }
    }
}

/// The subset of the Razorpay API the tools depend on.
#[async_trait]
pub trait RazorpayApi: Send + Sync {
    /// `<resource>.all(options)`
    async fn all(&self, resource: Resource, options: &PaginationOptions) -> Result<Value>;

    /// `accounts.fetch(id)`
    async fn fetch_account(&self, account_id: &str) -> Result<Value>;
}

/// HTTP client for the Razorpay REST API, authenticated with basic auth.
pub struct RazorpayClient {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    code: Option<String>,
    description: Option<String>,
}

impl RazorpayClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("razorpay-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(strip_url)?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            key_id: config.key_id().to_string(),
            key_secret: config.key_secret().to_string(),
        })
    }

    /// Points the client at another host, e.g. a local stand-in.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| RazorpayError::InvalidUrl(e.to_string()))
    }

    async fn get(&self, url: Url, query: Option<&PaginationOptions>) -> Result<Value> {
        let path = url.path().to_string();
        debug!(%path, "Calling Razorpay");

        let mut request = self
            .client
            .get(url)
            .basic_auth(&self.key_id, Some(&self.key_secret));
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await.map_err(strip_url)?;
        let status = response.status();
        let body = response.bytes().await.map_err(strip_url)?;

        if !status.is_success() {
            let err = api_error(status, &body);
            warn!(%path, status = status.as_u16(), "Razorpay request failed: {}", err);
            return Err(err);
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl RazorpayApi for RazorpayClient {
    async fn all(&self, resource: Resource, options: &PaginationOptions) -> Result<Value> {
        let url = self.endpoint(resource.path())?;
        self.get(url, Some(options)).await
    }

    async fn fetch_account(&self, account_id: &str) -> Result<Value> {
        let mut url = self.endpoint("/v2/accounts")?;
        push_segment(&mut url, account_id)?;
        self.get(url, None).await
    }
}

/// Appends `segment` as one percent-encoded path segment, so ids can never
/// add segments, climb out of the path or start a query string.
fn push_segment(url: &mut Url, segment: &str) -> Result<()> {
    // `Url` silently drops dot segments instead of encoding them.
    if matches!(segment, "." | "..") {
        return Err(RazorpayError::InvalidUrl(format!(
            "path segment `{segment}` is not allowed"
        )));
    }
    url.path_segments_mut()
        .map_err(|_| RazorpayError::InvalidUrl("base URL cannot take path segments".into()))?
        .push(segment);
    Ok(())
}

// Request URLs are never echoed back to tool callers.
fn strip_url(err: reqwest::Error) -> RazorpayError {
    RazorpayError::Http(err.without_url())
}

fn api_error(status: StatusCode, body: &[u8]) -> RazorpayError {
    let detail = serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .map(|body| body.error);

    let code = detail.as_ref().and_then(|detail| detail.code.clone());
    let description = detail
        .and_then(|detail| detail.description)
        .filter(|description| !description.is_empty())
        .unwrap_or_else(|| {
            format!(
                "Razorpay returned HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            )
        });

    RazorpayError::Api {
        status: status.as_u16(),
        code,
        description,
    }
}

/// One method per tool, each forwarding to a single Razorpay call.
#[derive(Clone)]
pub struct RazorpayService {
    api: Arc<dyn RazorpayApi>,
}

impl RazorpayService {
    pub fn new(api: Arc<dyn RazorpayApi>) -> Self {
        Self { api }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Arc::new(RazorpayClient::new(config)?)))
    }

    pub async fn get_all_orders(&self, options: PaginationOptions) -> Result<Value> {
        self.api.all(Resource::Orders, &options).await
    }

    pub async fn get_all_payments(&self, options: PaginationOptions) -> Result<Value> {
        self.api.all(Resource::Payments, &options).await
    }

    pub async fn get_all_settlements(&self, options: PaginationOptions) -> Result<Value> {
        self.api.all(Resource::Settlements, &options).await
    }

    pub async fn get_all_refunds(&self, options: PaginationOptions) -> Result<Value> {
        self.api.all(Resource::Refunds, &options).await
    }

    pub async fn get_all_disputes(&self, options: PaginationOptions) -> Result<Value> {
        self.api.all(Resource::Disputes, &options).await
    }

    pub async fn get_all_invoices(&self, options: PaginationOptions) -> Result<Value> {
        self.api.all(Resource::Invoices, &options).await
    }

    pub async fn get_account_balance(&self, account_id: &str) -> Result<Value> {
        self.api.fetch_account(account_id).await
    }

    // Razorpay has no separate contacts listing on this API; contacts are customers.
    pub async fn get_all_contacts(&self, options: PaginationOptions) -> Result<Value> {
        self.api.all(Resource::Customers, &options).await
    }

    pub async fn get_all_transactions(&self, options: PaginationOptions) -> Result<Value> {
        self.api.all(Resource::Transfers, &options).await
    }

    pub async fn get_all_vpas(&self, options: PaginationOptions) -> Result<Value> {
        self.api.all(Resource::VirtualAccounts, &options).await
    }

    pub async fn get_all_customers(&self, options: PaginationOptions) -> Result<Value> {
        self.api.all(Resource::Customers, &options).await
    }
}
