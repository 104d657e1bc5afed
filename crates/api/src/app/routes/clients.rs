use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
};

use orderdesk_directory::ClientId;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list))
        .route("/:id", get(get_one))
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.queries.clients().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.queries.client(ClientId::new(id)).await {
        Ok(client) => Json(client).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
