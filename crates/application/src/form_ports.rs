mod api_widget_client;
mod repository;

pub use api_widget_client::{ApiWidgetClient, ApiWidgetRequest};
pub use repository::{CellWrite, FormRepository};
