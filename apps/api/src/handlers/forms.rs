use axum::Json;
use axum::extract::{Path, Query, State};
use formloom_application::{ApiWidgetTrigger, CellWrite};
use formloom_core::{AppResult, ColumnId, FormId, RowId};

use crate::dto::{
    ApiWidgetOutcomeResponse, CellResponse, FormResponse, FormViewResponse,
    TriggerApiWidgetRequest, UnsatisfiedFieldResponse, WriteCellRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, serde::Deserialize)]
pub struct RowScopeQuery {
    pub row_id: Option<String>,
}

pub async fn list_forms_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<FormResponse>>> {
    let forms = state
        .form_runtime_service
        .list_forms()
        .await?
        .into_iter()
        .map(FormResponse::from)
        .collect();

    Ok(Json(forms))
}

pub async fn form_view_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Query(query): Query<RowScopeQuery>,
) -> ApiResult<Json<FormViewResponse>> {
    let form_id = FormId::new(form_id)?;
    let row_id = optional_row_id(query.row_id)?;

    let view = state
        .form_runtime_service
        .view(&form_id, row_id.as_ref())
        .await?;

    Ok(Json(FormViewResponse::from(view)))
}

pub async fn row_views_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> ApiResult<Json<Vec<FormViewResponse>>> {
    let form_id = FormId::new(form_id)?;

    let views = state
        .form_runtime_service
        .row_views(&form_id)
        .await?
        .into_iter()
        .map(FormViewResponse::from)
        .collect();

    Ok(Json(views))
}

pub async fn unsatisfied_required_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Query(query): Query<RowScopeQuery>,
) -> ApiResult<Json<Vec<UnsatisfiedFieldResponse>>> {
    let form_id = FormId::new(form_id)?;
    let row_id = optional_row_id(query.row_id)?;

    let fields = state
        .form_runtime_service
        .unsatisfied_required(&form_id, row_id.as_ref())
        .await?
        .into_iter()
        .map(UnsatisfiedFieldResponse::from)
        .collect();

    Ok(Json(fields))
}

pub async fn write_cell_handler(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Json(payload): Json<WriteCellRequest>,
) -> ApiResult<Json<CellResponse>> {
    let cell = state
        .form_runtime_service
        .write_cell(CellWrite {
            form_id: FormId::new(form_id)?,
            row_id: optional_row_id(payload.row_id)?,
            column_id: ColumnId::new(payload.column_id)?,
            data: payload.data,
        })
        .await?;

    Ok(Json(CellResponse::from(cell)))
}

pub async fn trigger_api_widget_handler(
    State(state): State<AppState>,
    Path((form_id, column_id)): Path<(String, String)>,
    Json(payload): Json<TriggerApiWidgetRequest>,
) -> ApiResult<Json<ApiWidgetOutcomeResponse>> {
    let outcome = state
        .api_widget_service
        .trigger(ApiWidgetTrigger {
            form_id: FormId::new(form_id)?,
            row_id: optional_row_id(payload.row_id)?,
            column_id: ColumnId::new(column_id)?,
            action: payload.action.into(),
            request: payload.request,
        })
        .await?;

    Ok(Json(ApiWidgetOutcomeResponse::from(outcome)))
}

fn optional_row_id(row_id: Option<String>) -> AppResult<Option<RowId>> {
    row_id
        .filter(|value| !value.trim().is_empty())
        .map(RowId::new)
        .transpose()
}
