use formloom_application::engine::{FormView, LayoutView, ViewValue};
use formloom_application::{ApiWidgetAction, ApiWidgetOutcome, UnsatisfiedField};
use formloom_domain::{Cell, Form, RequiredState};

use super::types::{
    ApiWidgetActionDto, ApiWidgetOutcomeResponse, CellResponse, ColumnBindingResponse,
    FormResponse, FormViewResponse, LayoutViewResponse, RequiredStateDto,
    UnsatisfiedFieldResponse, ValueSourceDto,
};

impl From<Form> for FormResponse {
    fn from(value: Form) -> Self {
        Self {
            form_id: value.id().as_str().to_owned(),
            name: value.name().map(ToOwned::to_owned),
        }
    }
}

impl From<RequiredState> for RequiredStateDto {
    fn from(value: RequiredState) -> Self {
        match value {
            RequiredState::Required => Self::Required,
            RequiredState::Optional => Self::Optional,
            RequiredState::Static => Self::Static,
        }
    }
}

impl From<LayoutView> for LayoutViewResponse {
    fn from(value: LayoutView) -> Self {
        let (value_source, data) = match value.value {
            ViewValue::Row(data) => (ValueSourceDto::Row, Some(data)),
            ViewValue::Form(data) => (ValueSourceDto::Form, Some(data)),
            ViewValue::NoValue => (ValueSourceDto::None, None),
        };

        Self {
            layout_id: value.layout_id.as_str().to_owned(),
            name: value.name,
            layout_type: value.kind.layout_type().as_str().to_owned(),
            schema: value.kind.to_payload(),
            column: value.column.map(|column| ColumnBindingResponse {
                column_id: column.column_id.as_str().to_owned(),
                column_type: column.column_type().as_str().to_owned(),
                schema: column.schema.to_payload(),
                name: column.name,
            }),
            visible: value.visible,
            enabled: value.enabled,
            required: RequiredStateDto::from(value.required),
            value: data,
            value_source,
            children: value
                .children
                .into_iter()
                .map(LayoutViewResponse::from)
                .collect(),
        }
    }
}

impl From<FormView> for FormViewResponse {
    fn from(value: FormView) -> Self {
        Self {
            form_id: value.form_id.as_str().to_owned(),
            row_id: value.row_id.map(|row_id| row_id.as_str().to_owned()),
            root: LayoutViewResponse::from(value.root),
        }
    }
}

impl From<UnsatisfiedField> for UnsatisfiedFieldResponse {
    fn from(value: UnsatisfiedField) -> Self {
        Self {
            layout_id: value.layout_id.as_str().to_owned(),
            column_id: value.column_id.as_str().to_owned(),
            column_name: value.column_name,
        }
    }
}

impl From<Cell> for CellResponse {
    fn from(value: Cell) -> Self {
        Self {
            cell_id: value.id().as_str().to_owned(),
            form_id: value.form_id().as_str().to_owned(),
            row_id: value.row_id().map(|row_id| row_id.as_str().to_owned()),
            column_id: value.column_id().as_str().to_owned(),
            data: value.data().to_owned(),
            updated_at: value.updated_at().map(|updated_at| updated_at.to_rfc3339()),
        }
    }
}

impl From<ApiWidgetActionDto> for ApiWidgetAction {
    fn from(value: ApiWidgetActionDto) -> Self {
        match value {
            ApiWidgetActionDto::Fetch => Self::Fetch,
            ApiWidgetActionDto::Submit => Self::Submit,
        }
    }
}

impl From<ApiWidgetOutcome> for ApiWidgetOutcomeResponse {
    fn from(value: ApiWidgetOutcome) -> Self {
        Self {
            url: value.url,
            request: value.payload.request,
            response: value.payload.response,
            cell: CellResponse::from(value.cell),
        }
    }
}
