mod cors;

use axum::Router;
use axum::routing::{get, post, put};
use formloom_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let form_routes = Router::new()
        .route("/api/forms", get(handlers::forms::list_forms_handler))
        .route(
            "/api/forms/{form_id}/view",
            get(handlers::forms::form_view_handler),
        )
        .route(
            "/api/forms/{form_id}/rows/views",
            get(handlers::forms::row_views_handler),
        )
        .route(
            "/api/forms/{form_id}/required",
            get(handlers::forms::unsatisfied_required_handler),
        )
        .route(
            "/api/forms/{form_id}/cells",
            put(handlers::forms::write_cell_handler),
        )
        .route(
            "/api/forms/{form_id}/columns/{column_id}/api",
            post(handlers::forms::trigger_api_widget_handler),
        );

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(form_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
