use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use orderdesk_directory::PersonnelId;
use orderdesk_orders::OrderId;
use orderdesk_query::parse_day;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(schedule).get(list))
        .route("/agent/:id", get(list_for_agent))
        .route("/postal/:code", get(list_for_postal_code))
        .route("/date/:date", get(list_on_date))
        .route("/:order_id", get(get_one).patch(reschedule))
        .route("/:order_id/dispatch", put(dispatch))
        .route("/:order_id/complete", put(complete))
        .route("/:order_id/cancel", put(cancel))
}

pub async fn schedule(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ScheduleDeliveryRequest>,
) -> axum::response::Response {
    match services
        .deliveries
        .schedule(
            body.order_id,
            body.scheduled_at,
            body.agent_id,
            body.payment_mode,
        )
        .await
    {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.queries.deliveries().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<i64>,
) -> axum::response::Response {
    match services.deliveries.get(OrderId::new(order_id)).await {
        Ok(details) => Json(details).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn reschedule(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<i64>,
    Json(body): Json<dto::RescheduleDeliveryRequest>,
) -> axum::response::Response {
    match services
        .deliveries
        .reschedule(OrderId::new(order_id), body.scheduled_at, body.agent_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn dispatch(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<i64>,
) -> axum::response::Response {
    match services.deliveries.dispatch(OrderId::new(order_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn complete(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<i64>,
) -> axum::response::Response {
    match services.deliveries.complete(OrderId::new(order_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<i64>,
) -> axum::response::Response {
    match services.deliveries.cancel(OrderId::new(order_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_for_agent(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services
        .queries
        .deliveries_for_agent(PersonnelId::new(id))
        .await
    {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_for_postal_code(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> axum::response::Response {
    match services.queries.deliveries_for_postal_code(&code).await {
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
    match services.queries.deliveries_on(day).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
