use axum::Router;

pub mod articles;
pub mod clients;
pub mod deliveries;
pub mod orders;
pub mod personnel;
pub mod system;

/// Router for all domain endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/articles", articles::router())
        .nest("/orders", orders::router())
        .nest("/deliveries", deliveries::router())
        .nest("/clients", clients::router())
        .nest("/personnel", personnel::router())
}
