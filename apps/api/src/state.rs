use formloom_application::{ApiWidgetService, FormRuntimeService};

/// Storage backend serving the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    InMemory,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::InMemory => "in_memory",
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub form_runtime_service: FormRuntimeService,
    pub api_widget_service: ApiWidgetService,
    pub storage: StorageKind,
}
