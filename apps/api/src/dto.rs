mod common;
mod forms;

pub use common::HealthResponse;
pub use forms::{
    ApiWidgetActionDto, ApiWidgetOutcomeResponse, CellResponse, ColumnBindingResponse,
    FormResponse, FormViewResponse, LayoutViewResponse, RequiredStateDto,
    TriggerApiWidgetRequest, UnsatisfiedFieldResponse, ValueSourceDto, WriteCellRequest,
};
