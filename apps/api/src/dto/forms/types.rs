use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// API representation of a selectable form.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/form-response.ts"
)]
pub struct FormResponse {
    pub form_id: String,
    pub name: Option<String>,
}

/// Static requiredness of a layout node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/required-state-dto.ts"
)]
pub enum RequiredStateDto {
    Required,
    Optional,
    Static,
}

/// Where an input value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/value-source-dto.ts"
)]
pub enum ValueSourceDto {
    Row,
    Form,
    None,
}

/// Column bound to an input node.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/column-binding-response.ts"
)]
pub struct ColumnBindingResponse {
    pub column_id: String,
    pub name: String,
    pub column_type: String,
    #[ts(type = "Record<string, unknown>")]
    pub schema: Value,
}

/// Fully resolved layout node.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/layout-view-response.ts"
)]
pub struct LayoutViewResponse {
    pub layout_id: String,
    pub name: Option<String>,
    pub layout_type: String,
    #[ts(type = "unknown")]
    pub schema: Value,
    pub column: Option<ColumnBindingResponse>,
    pub visible: bool,
    pub enabled: bool,
    pub required: RequiredStateDto,
    pub value: Option<String>,
    pub value_source: ValueSourceDto,
    pub children: Vec<LayoutViewResponse>,
}

/// Assembled view model of one form for one row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/form-view-response.ts"
)]
pub struct FormViewResponse {
    pub form_id: String,
    pub row_id: Option<String>,
    pub root: LayoutViewResponse,
}

/// Required input without a usable value or bound to an unknown column.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/unsatisfied-field-response.ts"
)]
pub struct UnsatisfiedFieldResponse {
    pub layout_id: String,
    pub column_id: String,
    pub column_name: Option<String>,
}

/// Incoming cell write payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/write-cell-request.ts"
)]
pub struct WriteCellRequest {
    pub column_id: String,
    pub row_id: Option<String>,
    pub data: String,
}

/// API representation of a stored cell.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/cell-response.ts"
)]
pub struct CellResponse {
    pub cell_id: String,
    pub form_id: String,
    pub row_id: Option<String>,
    pub column_id: String,
    pub data: String,
    pub updated_at: Option<String>,
}

/// Api column operation exposed through trigger DTOs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/api-widget-action-dto.ts"
)]
pub enum ApiWidgetActionDto {
    Fetch,
    Submit,
}

/// Incoming api column trigger payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/trigger-api-widget-request.ts"
)]
pub struct TriggerApiWidgetRequest {
    pub action: ApiWidgetActionDto,
    pub row_id: Option<String>,
    #[ts(type = "unknown")]
    pub request: Option<Value>,
}

/// Result of a successful api column trigger.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/api-widget-outcome-response.ts"
)]
pub struct ApiWidgetOutcomeResponse {
    pub url: String,
    #[ts(type = "unknown")]
    pub request: Option<Value>,
    #[ts(type = "unknown")]
    pub response: Option<Value>,
    pub cell: CellResponse,
}
