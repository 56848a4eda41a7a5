use std::sync::Arc;

use formloom_core::{AppError, AppResult, ColumnId, FormId, RowId};
use formloom_domain::{ApiCellData, Cell};
use serde_json::Value;
use tracing::{info, warn};

use crate::engine::{
    EvaluationScope, FormAssembler, FormEngineError, ReferenceResolver, UnresolvedPolicy,
    ValueStore,
};
use crate::form_ports::{ApiWidgetClient, ApiWidgetRequest, CellWrite, FormRepository};

/// User-triggered api column operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiWidgetAction {
    /// Retrieve data without a request body.
    Fetch,
    /// Send the request payload.
    Submit,
}

impl ApiWidgetAction {
    /// Returns stable action value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Submit => "submit",
        }
    }
}

/// Whether the network collaborator is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// Calls may be issued.
    Online,
    /// Triggering is disabled; stored data remains readable.
    Offline,
}

/// Input for one api column trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiWidgetTrigger {
    /// Form providing the evaluation scope.
    pub form_id: FormId,
    /// Row providing the evaluation scope.
    pub row_id: Option<RowId>,
    /// Triggered api column.
    pub column_id: ColumnId,
    /// Requested operation.
    pub action: ApiWidgetAction,
    /// Request payload for submissions, replacing the stored one.
    pub request: Option<Value>,
}

/// Result of a successful trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiWidgetOutcome {
    /// URL the request was sent to.
    pub url: String,
    /// Stored request and validated response.
    pub payload: ApiCellData,
    /// Persisted cell.
    pub cell: Cell,
}

/// Application service performing api column fetch and submit calls.
#[derive(Clone)]
pub struct ApiWidgetService {
    repository: Arc<dyn FormRepository>,
    client: Arc<dyn ApiWidgetClient>,
    connectivity: Connectivity,
}

impl ApiWidgetService {
    /// Creates an api widget service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn FormRepository>,
        client: Arc<dyn ApiWidgetClient>,
        connectivity: Connectivity,
    ) -> Self {
        Self {
            repository,
            client,
            connectivity,
        }
    }

    /// Returns the configured connectivity.
    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Issues the api call of one column and stores the validated response.
    ///
    /// A response failing the column's response schema is reported as a
    /// validation error and nothing is stored.
    pub async fn trigger(&self, trigger: ApiWidgetTrigger) -> AppResult<ApiWidgetOutcome> {
        if self.connectivity == Connectivity::Offline {
            return Err(AppError::Unavailable(
                "api columns cannot be triggered while offline".to_owned(),
            ));
        }

        let snapshot = self.repository.load_snapshot().await?;
        let column = snapshot
            .columns
            .iter()
            .find(|column| column.id() == &trigger.column_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("column '{}' does not exist", trigger.column_id))
            })?;
        let schema = column.api_schema().ok_or_else(|| {
            AppError::Validation(format!(
                "column '{}' is not an api column",
                column.name().as_str()
            ))
        })?;

        FormAssembler::new(&snapshot).assemble(&trigger.form_id, trigger.row_id.as_ref())?;

        let scope = EvaluationScope::new(&trigger.form_id, trigger.row_id.as_ref());
        let resolver = ReferenceResolver::new(&snapshot.columns, ValueStore::new(&snapshot.cells));
        let url = resolver.interpolate(&schema.request.url, scope, UnresolvedPolicy::Blank)?;

        let stored = match resolver
            .values()
            .resolve(column.id(), scope.row_id, scope.form_id)
            .data()
        {
            Some(data) => ApiCellData::parse(data)?,
            None => ApiCellData::default(),
        };

        let body = match trigger.action {
            ApiWidgetAction::Fetch => None,
            ApiWidgetAction::Submit => {
                let body = trigger.request.or(stored.request.clone()).ok_or_else(|| {
                    AppError::Validation(format!(
                        "column '{}' has no request payload to submit",
                        column.name().as_str()
                    ))
                })?;
                if let Some(request_schema) = &schema.request.schema {
                    request_schema
                        .validate(&body)
                        .map_err(FormEngineError::from)?;
                }
                Some(body)
            }
        };

        let response = self
            .client
            .send(ApiWidgetRequest {
                method: schema.request.method,
                url: url.clone(),
                headers: schema.request.headers.clone(),
                body: body.clone(),
            })
            .await?;

        if let Some(response_schema) = &schema.response.schema
            && let Err(violation) = response_schema.validate(&response)
        {
            warn!(
                column = column.name().as_str(),
                action = trigger.action.as_str(),
                %violation,
                "api response rejected by schema"
            );
            return Err(FormEngineError::from(violation).into());
        }

        let payload = ApiCellData {
            request: body.or(stored.request),
            response: Some(response),
        };
        let cell = self
            .repository
            .save_cell(CellWrite {
                form_id: trigger.form_id,
                row_id: trigger.row_id,
                column_id: trigger.column_id,
                data: payload.to_data(),
            })
            .await?;

        info!(
            column = column.name().as_str(),
            action = trigger.action.as_str(),
            url = url.as_str(),
            "api response stored"
        );

        Ok(ApiWidgetOutcome { url, payload, cell })
    }
}

#[cfg(test)]
mod tests;
