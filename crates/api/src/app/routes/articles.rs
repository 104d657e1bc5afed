use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use orderdesk_catalog::{ArticleId, ArticlePatch, NewArticle};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create).get(list))
        .route("/meta/categories", get(categories))
        .route("/search/:needle", get(search_designation))
        .route("/category/:category", get(search_category))
        .route("/:id", get(get_one).patch(update_one).delete(delete_one))
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewArticle>,
) -> axum::response::Response {
    match services.catalog.create(body).await {
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
    match services.queries.articles().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.catalog.get(ArticleId::new(id)).await {
        Ok(article) => Json(article).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
    Json(patch): Json<ArticlePatch>,
) -> axum::response::Response {
    match services.catalog.update(ArticleId::new(id), patch).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    match services.catalog.soft_delete(ArticleId::new(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn search_designation(
    Extension(services): Extension<Arc<AppServices>>,
    Path(needle): Path<String>,
) -> axum::response::Response {
    match services.queries.articles_by_designation(&needle).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn search_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category): Path<String>,
) -> axum::response::Response {
    match services.queries.articles_by_category(&category).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.queries.categories().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
