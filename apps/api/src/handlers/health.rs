use axum::Json;
use axum::extract::State;
use formloom_application::Connectivity;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        storage: state.storage.as_str(),
        online: state.api_widget_service.connectivity() == Connectivity::Online,
    })
}
