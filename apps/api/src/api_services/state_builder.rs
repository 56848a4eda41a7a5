use std::path::Path;
use std::sync::Arc;

use formloom_application::{
    ApiWidgetService, Connectivity, FormRepository, FormRuntimeService,
};
use formloom_core::AppError;
use formloom_infrastructure::{
    HttpApiWidgetClient, InMemoryFormRepository, PostgresFormRepository,
};
use tracing::info;

use super::connect_and_migrate;
use crate::api_config::{ApiConfig, StorageConfig};
use crate::state::{AppState, StorageKind};

pub async fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let (repository, storage): (Arc<dyn FormRepository>, StorageKind) = match &config.storage {
        StorageConfig::Postgres { database_url } => {
            let pool = connect_and_migrate(database_url).await?;
            (
                Arc::new(PostgresFormRepository::new(pool)),
                StorageKind::Postgres,
            )
        }
        StorageConfig::InMemory { snapshot_path } => (
            Arc::new(load_in_memory_repository(snapshot_path.as_deref())?),
            StorageKind::InMemory,
        ),
    };

    let http_client = reqwest::Client::builder()
        .timeout(config.api_widget_client.timeout)
        .build()
        .map_err(|error| {
            AppError::Internal(format!("failed to build api widget HTTP client: {error}"))
        })?;
    let api_widget_client = Arc::new(HttpApiWidgetClient::new(
        http_client,
        config.api_widget_client.max_attempts,
        config.api_widget_client.retry_backoff_ms,
    ));

    let connectivity = if config.offline {
        Connectivity::Offline
    } else {
        Connectivity::Online
    };

    Ok(AppState {
        form_runtime_service: FormRuntimeService::new(repository.clone()),
        api_widget_service: ApiWidgetService::new(repository, api_widget_client, connectivity),
        storage,
    })
}

fn load_in_memory_repository(snapshot_path: Option<&Path>) -> Result<InMemoryFormRepository, AppError> {
    let Some(snapshot_path) = snapshot_path else {
        return Ok(InMemoryFormRepository::new());
    };

    let contents = std::fs::read_to_string(snapshot_path).map_err(|error| {
        AppError::Validation(format!(
            "failed to read FORMLOOM_SNAPSHOT_PATH '{}': {error}",
            snapshot_path.display()
        ))
    })?;
    let repository = InMemoryFormRepository::from_json(contents.as_str())?;
    info!(path = %snapshot_path.display(), "seeded in-memory form storage");

    Ok(repository)
}
