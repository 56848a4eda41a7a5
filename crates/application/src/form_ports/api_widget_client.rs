use std::collections::BTreeMap;

use async_trait::async_trait;
use formloom_core::AppResult;
use formloom_domain::ApiMethod;
use serde_json::Value;

/// Outbound request issued for an api column.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiWidgetRequest {
    /// HTTP method.
    pub method: ApiMethod,
    /// Fully interpolated URL.
    pub url: String,
    /// Static request headers.
    pub headers: BTreeMap<String, String>,
    /// JSON body for submissions.
    pub body: Option<Value>,
}

/// Port for the network client performing api column calls.
#[async_trait]
pub trait ApiWidgetClient: Send + Sync {
    /// Sends one request and returns the decoded JSON response body.
    async fn send(&self, request: ApiWidgetRequest) -> AppResult<Value>;
}
