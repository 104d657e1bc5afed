use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use orderdesk_directory::ClientId;
use orderdesk_orders::{OrderId, OrderStatus};
use orderdesk_query::parse_day;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create).get(list))
        .route("/ready", get(list_ready))
        .route("/client/:id", get(list_for_client))
        .route("/date/:date", get(list_on_date))
        .route("/:id", get(get_one))
        .route("/:id/status", put(set_status))
        .route("/:id/cancel", put(cancel))
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    match services.orders.create(body.client_id).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.queries.orders().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.orders.get(OrderId::new(id)).await {
        Ok(row) => Json(row).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
    Json(body): Json<dto::OrderStatusRequest>,
) -> axum::response::Response {
    let target = match OrderStatus::from_code(&body.status) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.orders.transition(OrderId::new(id), target).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.orders.cancel(OrderId::new(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_ready(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.queries.orders_ready().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_for_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.queries.orders_for_client(ClientId::new(id)).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_on_date(
    Extension(services): Extension<Arc<AppServices>>,
    Path(date): Path<String>,
) -> axum::response::Response {
    let day = match parse_day(&date) {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.queries.orders_on(day).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
