//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_api_widget_client;
mod in_memory_form_repository;
mod postgres_form_repository;

pub use http_api_widget_client::HttpApiWidgetClient;
pub use in_memory_form_repository::InMemoryFormRepository;
pub use postgres_form_repository::PostgresFormRepository;
