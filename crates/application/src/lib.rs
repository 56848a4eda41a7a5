//! Application services, ports and the form rule engine.

#![forbid(unsafe_code)]

mod api_widget_service;
pub mod engine;
mod form_ports;
mod form_runtime_service;
#[cfg(test)]
mod test_support;

pub use api_widget_service::{
    ApiWidgetAction, ApiWidgetOutcome, ApiWidgetService, ApiWidgetTrigger, Connectivity,
};
pub use form_ports::{ApiWidgetClient, ApiWidgetRequest, CellWrite, FormRepository};
pub use form_runtime_service::{FormRuntimeService, UnsatisfiedField};
