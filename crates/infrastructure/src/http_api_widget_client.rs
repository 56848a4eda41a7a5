use std::time::Duration;

use async_trait::async_trait;
use formloom_application::{ApiWidgetClient, ApiWidgetRequest};
use formloom_core::{AppError, AppResult};
use serde_json::Value;
use tracing::warn;

/// HTTP-based implementation for api column calls.
pub struct HttpApiWidgetClient {
    http_client: reqwest::Client,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

impl HttpApiWidgetClient {
    /// Creates a new api widget client.
    #[must_use]
    pub fn new(http_client: reqwest::Client, max_attempts: u8, retry_backoff_ms: u64) -> Self {
        Self {
            http_client,
            max_attempts: max_attempts.max(1),
            retry_backoff_ms: retry_backoff_ms.max(50),
        }
    }

    fn build(&self, request: &ApiWidgetRequest) -> AppResult<reqwest::RequestBuilder> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes()).map_err(
            |error| AppError::Validation(format!("api column has invalid HTTP method: {error}")),
        )?;

        let mut builder = self
            .http_client
            .request(method, request.url.as_str())
            .header("Accept", "application/json");
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        Ok(match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        })
    }
}

#[async_trait]
impl ApiWidgetClient for HttpApiWidgetClient {
    async fn send(&self, request: ApiWidgetRequest) -> AppResult<Value> {
        if request.url.trim().is_empty() {
            return Err(AppError::Validation("api column url is empty".to_owned()));
        }

        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < self.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = self.build(&request)?.send().await;

            match response {
                Ok(response) if response.status().is_success() => {
                    let body = response.text().await.map_err(|error| {
                        AppError::Internal(format!("failed to read api response body: {error}"))
                    })?;
                    if body.trim().is_empty() {
                        return Ok(Value::Null);
                    }
                    return serde_json::from_str(body.as_str()).map_err(|error| {
                        AppError::Validation(format!("api response is not valid JSON: {error}"))
                    });
                }
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    last_error = Some(format!(
                        "transient HTTP status {} from '{}'",
                        response.status(),
                        request.url
                    ));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
                    return Err(AppError::Validation(format!(
                        "api request failed with status {status}: {body}"
                    )));
                }
                Err(error) => {
                    last_error = Some(format!("api request transport error: {error}"));
                }
            }

            if attempt < self.max_attempts {
                warn!(
                    url = request.url.as_str(),
                    attempt,
                    error = last_error.as_deref().unwrap_or_default(),
                    "retrying api column request"
                );
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Unavailable(last_error.unwrap_or_else(|| {
            "api request exhausted retries".to_owned()
        })))
    }
}
