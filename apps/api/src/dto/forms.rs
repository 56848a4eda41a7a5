mod conversions;
mod types;

pub use types::{
    ApiWidgetActionDto, ApiWidgetOutcomeResponse, CellResponse, ColumnBindingResponse,
    FormResponse, FormViewResponse, LayoutViewResponse, RequiredStateDto,
    TriggerApiWidgetRequest, UnsatisfiedFieldResponse, ValueSourceDto, WriteCellRequest,
};
