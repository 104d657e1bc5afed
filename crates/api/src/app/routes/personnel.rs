use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
};

use orderdesk_directory::PersonnelId;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list))
        .route("/drivers", get(list_drivers))
        .route("/:id", get(get_one))
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.queries.personnel().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Staff eligible to carry deliveries.
pub async fn list_drivers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.queries.delivery_agents().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.queries.personnel_member(PersonnelId::new(id)).await {
        Ok(member) => Json(member).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
