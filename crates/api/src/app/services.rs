//! Store selection and service wiring.

use std::sync::Arc;

use chrono::FixedOffset;
use sqlx::PgPool;

use orderdesk_lifecycle::{CatalogService, DeliveryLifecycle, OrderLifecycle};
use orderdesk_query::QueryFacade;
use orderdesk_store::{InMemoryStore, PostgresStore, Store};

use crate::config::Config;

/// The wired write- and read-side services the handlers use.
#[derive(Clone)]
pub struct AppServices {
    pub orders: OrderLifecycle,
    pub deliveries: DeliveryLifecycle,
    pub catalog: CatalogService,
    pub queries: QueryFacade,
}

impl AppServices {
    /// Wire every service over one shared store.
    pub fn new(store: Arc<dyn Store>, zone: FixedOffset) -> Self {
        Self {
            orders: OrderLifecycle::new(store.clone()),
            deliveries: DeliveryLifecycle::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            queries: QueryFacade::new(store, zone),
        }
    }
}

/// Build services from config: Postgres when `DATABASE_URL` is set, the
/// in-memory store otherwise (dev/test).
pub async fn build_services(config: &Config) -> anyhow::Result<AppServices> {
    let zone = config.zone()?;
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = PgPool::connect(url).await?;
            let store = PostgresStore::new(pool);
            store.migrate().await?;
            tracing::info!("using postgres store");
            Arc::new(store)
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };
    Ok(AppServices::new(store, zone))
}
