use std::sync::Arc;

use async_trait::async_trait;
use formloom_core::{AppError, AppResult, ColumnId, FormId, RowId};
use formloom_domain::ApiMethod;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use super::{ApiWidgetAction, ApiWidgetService, ApiWidgetTrigger, Connectivity};
use crate::form_ports::{ApiWidgetClient, ApiWidgetRequest};
use crate::test_support::FakeFormRepository;

struct FakeApiWidgetClient {
    response: Value,
    requests: Mutex<Vec<ApiWidgetRequest>>,
}

impl FakeApiWidgetClient {
    fn new(response: Value) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ApiWidgetClient for FakeApiWidgetClient {
    async fn send(&self, request: ApiWidgetRequest) -> AppResult<Value> {
        self.requests.lock().await.push(request);
        Ok(self.response.clone())
    }
}

fn snapshot() -> Value {
    json!({
        "columns": [
            { "id": "serial", "name": "serial", "type": "text" },
            { "id": "position", "name": "position", "type": "gps" },
            { "id": "lookup", "name": "lookup", "type": "api", "schema": {
                "request": {
                    "url": "https://devices.test/${#serial}?lat=${#position#latitude}",
                    "method": "POST",
                    "headers": { "accept": "application/json" },
                    "schema": { "type": "object", "required": ["reason"] }
                },
                "response": { "schema": {
                    "type": "object",
                    "required": ["status"],
                    "properties": { "status": { "enum": ["ok", "faulty"] } }
                } }
            } }
        ],
        "layouts": [
            { "id": "inspection", "type": "group" },
            { "id": "lookup-field", "type": "input", "ColumnId": "lookup", "LayoutId": "inspection" }
        ],
        "rows": [{ "id": "cpu-424", "FormId": "inspection" }],
        "cells": [
            { "id": "c1", "ColumnId": "serial", "RowId": "cpu-424", "FormId": "inspection", "data": "\"CPU-424\"" }
        ]
    })
}

fn trigger(action: ApiWidgetAction, request: Option<Value>) -> ApiWidgetTrigger {
    ApiWidgetTrigger {
        form_id: FormId::new("inspection").unwrap_or_else(|_| unreachable!()),
        row_id: Some(RowId::new("cpu-424").unwrap_or_else(|_| unreachable!())),
        column_id: ColumnId::new("lookup").unwrap_or_else(|_| unreachable!()),
        action,
        request,
    }
}

fn service(
    response: Value,
    connectivity: Connectivity,
) -> (ApiWidgetService, Arc<FakeFormRepository>, Arc<FakeApiWidgetClient>) {
    let repository = Arc::new(FakeFormRepository::new(snapshot()));
    let client = Arc::new(FakeApiWidgetClient::new(response));
    (
        ApiWidgetService::new(repository.clone(), client.clone(), connectivity),
        repository,
        client,
    )
}

#[tokio::test]
async fn fetch_interpolates_url_with_blank_placeholders_and_stores_response() {
    let (service, repository, client) = service(json!({ "status": "ok" }), Connectivity::Online);

    let outcome = service
        .trigger(trigger(ApiWidgetAction::Fetch, None))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(outcome.url, "https://devices.test/CPU-424?lat=");
    assert_eq!(outcome.payload.response, Some(json!({ "status": "ok" })));

    let requests = client.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, ApiMethod::Post);
    assert!(requests[0].body.is_none());

    let stored = repository
        .cells()
        .await
        .into_iter()
        .find(|cell| cell.column_id().as_str() == "lookup")
        .unwrap_or_else(|| unreachable!());
    let payload = stored.api_data().unwrap_or_else(|_| unreachable!());
    assert!(payload.has_response());
}

#[tokio::test]
async fn response_failing_schema_is_not_persisted() {
    let (service, repository, _) = service(json!({ "status": "melted" }), Connectivity::Online);

    let result = service.trigger(trigger(ApiWidgetAction::Fetch, None)).await;

    assert!(matches!(result, Err(AppError::Validation(message)) if message.contains("/status")));
    assert_eq!(repository.cells().await.len(), 1);
}

#[tokio::test]
async fn submit_validates_request_payload() {
    let (service, _, client) = service(json!({ "status": "faulty" }), Connectivity::Online);

    let rejected = service
        .trigger(trigger(ApiWidgetAction::Submit, Some(json!({ "note": "x" }))))
        .await;
    assert!(matches!(rejected, Err(AppError::Validation(_))));
    assert!(client.requests.lock().await.is_empty());

    let outcome = service
        .trigger(trigger(
            ApiWidgetAction::Submit,
            Some(json!({ "reason": "fan noise" })),
        ))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(outcome.payload.request, Some(json!({ "reason": "fan noise" })));
    assert_eq!(
        client.requests.lock().await[0].body,
        Some(json!({ "reason": "fan noise" }))
    );
}

#[tokio::test]
async fn offline_triggering_is_unavailable() {
    let (service, _, client) = service(json!({ "status": "ok" }), Connectivity::Offline);

    let result = service.trigger(trigger(ApiWidgetAction::Fetch, None)).await;

    assert!(matches!(result, Err(AppError::Unavailable(_))));
    assert!(client.requests.lock().await.is_empty());
}

#[tokio::test]
async fn non_api_columns_are_rejected() {
    let (service, _, _) = service(json!({}), Connectivity::Online);
    let mut request = trigger(ApiWidgetAction::Fetch, None);
    request.column_id = ColumnId::new("serial").unwrap_or_else(|_| unreachable!());

    let result = service.trigger(request).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}
