//! Postgres-backed store implementation.
//!
//! Each named procedure runs inside a transaction; the cross-entity cascades
//! (schedule, complete, cancel) commit both writes or neither. Compare-and-set
//! updates are plain conditional `UPDATE`s, so two concurrent transitions on
//! the same order are serialized by row-level locking and the loser sees
//! `StaleState`.
//!
//! ## Error mapping
//!
//! | PostgreSQL error code | StoreError            | Scenario                          |
//! |-----------------------|-----------------------|-----------------------------------|
//! | `23505`               | `UniqueViolation`     | Second delivery for one order     |
//! | `23503`               | `ForeignKeyViolation` | Unknown client/agent reference    |
//! | other / connectivity  | `Backend`             | Unclassified persistence failure  |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;

use orderdesk_catalog::{Article, ArticleId, ArticlePatch, NewArticle, Patch};
use orderdesk_delivery::{Delivery, DeliveryStatus};
use orderdesk_directory::{Client, ClientId, Personnel, PersonnelId};
use orderdesk_orders::{Order, OrderId, OrderStatus};

use crate::query::{
    DeliveryDetails, DeliveryFilter, DeliverySort, OrderFilter, OrderSort, OrderWithClient,
};
use crate::r#trait::{CatalogStore, DeliveryStore, DirectoryStore, OrderStore, StoreError};

/// Schema applied by [`PostgresStore::migrate`]. Idempotent.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id          BIGSERIAL PRIMARY KEY,
    name        TEXT NOT NULL,
    surname     TEXT NOT NULL,
    address     TEXT NOT NULL,
    postal_code TEXT NOT NULL,
    phone       TEXT NOT NULL,
    email       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS personnel (
    id         BIGSERIAL PRIMARY KEY,
    name       TEXT NOT NULL,
    surname    TEXT NOT NULL,
    address    TEXT NOT NULL,
    city       TEXT NOT NULL,
    phone      TEXT NOT NULL,
    hired_on   DATE NOT NULL,
    role_label TEXT
);

CREATE TABLE IF NOT EXISTS articles (
    id             BIGSERIAL PRIMARY KEY,
    designation    TEXT NOT NULL,
    purchase_price BIGINT NOT NULL CHECK (purchase_price >= 0),
    sale_price     BIGINT NOT NULL CHECK (sale_price >= 0),
    tax_rate_bp    INTEGER NOT NULL CHECK (tax_rate_bp >= 0),
    category       TEXT NOT NULL DEFAULT '',
    stock          BIGINT NOT NULL CHECK (stock >= 0),
    deleted        BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS orders (
    id         BIGSERIAL PRIMARY KEY,
    client_id  BIGINT NOT NULL REFERENCES clients(id),
    created_at TIMESTAMPTZ NOT NULL,
    status     TEXT NOT NULL CHECK (status IN ('EC', 'PR', 'LI', 'SO', 'AN'))
);

CREATE TABLE IF NOT EXISTS deliveries (
    order_id     BIGINT PRIMARY KEY REFERENCES orders(id),
    scheduled_at TIMESTAMPTZ NOT NULL,
    agent_id     BIGINT NOT NULL REFERENCES personnel(id),
    payment_mode TEXT NOT NULL,
    status       TEXT NOT NULL CHECK (status IN ('EP', 'EL', 'LV'))
);
"#;

/// Postgres-backed transactional store.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the schema (idempotent; dev/test convenience).
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    /// Distinguish "row missing" from "row in another state" after a
    /// conditional update matched nothing.
    async fn order_status_or_missing(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderStatus>, StoreError> {
        let row = sqlx::query("SELECT status FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_order_status", e))?;
        row.map(|r| status_from_row::<OrderStatus>(&r, "status", OrderStatus::from_code))
            .transpose()
    }

    async fn delivery_status_or_missing(
        &self,
        order_id: OrderId,
    ) -> Result<Option<DeliveryStatus>, StoreError> {
        let row = sqlx::query("SELECT status FROM deliveries WHERE order_id = $1")
            .bind(order_id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_delivery_status", e))?;
        row.map(|r| status_from_row::<DeliveryStatus>(&r, "status", DeliveryStatus::from_code))
            .transpose()
    }

    async fn stale_or_missing_order(&self, id: OrderId, expected: &str) -> StoreError {
        match self.order_status_or_missing(id).await {
            Ok(Some(found)) => StoreError::StaleState(format!(
                "order {id}: expected {expected}, found {found}"
            )),
            Ok(None) => StoreError::RowNotFound(format!("order {id}")),
            Err(e) => e,
        }
    }

    async fn stale_or_missing_delivery(&self, order_id: OrderId) -> StoreError {
        match self.delivery_status_or_missing(order_id).await {
            Ok(Some(_)) => StoreError::StaleState(format!(
                "delivery for order {order_id} is already delivered"
            )),
            Ok(None) => StoreError::RowNotFound(format!("delivery for order {order_id}")),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self, article), err)]
    async fn insert_article(&self, article: NewArticle) -> Result<ArticleId, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO articles (designation, purchase_price, sale_price, tax_rate_bp, category, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&article.designation)
        .bind(cents_to_db(article.purchase_price)?)
        .bind(cents_to_db(article.sale_price)?)
        .bind(article.tax_rate_bp as i32)
        .bind(&article.category)
        .bind(article.stock)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_article", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::Backend(format!("insert_article returning: {e}")))?;
        Ok(ArticleId::new(id))
    }

    #[instrument(skip(self, patch), err)]
    async fn update_article(
        &self,
        id: ArticleId,
        patch: &ArticlePatch,
    ) -> Result<(), StoreError> {
        if patch.is_empty() {
            // Still surface RowNotFound for unknown/deleted references.
            let exists = sqlx::query("SELECT 1 FROM articles WHERE id = $1 AND deleted = FALSE")
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_article", e))?;
            return exists
                .map(|_| ())
                .ok_or_else(|| StoreError::RowNotFound(format!("article {id}")));
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE articles SET ");
        let mut sep = qb.separated(", ");
        if let Patch::Set(designation) = &patch.designation {
            sep.push("designation = ").push_bind_unseparated(designation);
        }
        if let Patch::Set(price) = patch.purchase_price {
            sep.push("purchase_price = ")
                .push_bind_unseparated(cents_to_db(price)?);
        }
        if let Patch::Set(price) = patch.sale_price {
            sep.push("sale_price = ")
                .push_bind_unseparated(cents_to_db(price)?);
        }
        if let Patch::Set(rate) = patch.tax_rate_bp {
            sep.push("tax_rate_bp = ").push_bind_unseparated(rate as i32);
        }
        match &patch.category {
            Patch::Keep => {}
            Patch::Clear => {
                sep.push("category = ''");
            }
            Patch::Set(category) => {
                sep.push("category = ").push_bind_unseparated(category);
            }
        }
        if let Patch::Set(stock) = patch.stock {
            sep.push("stock = ").push_bind_unseparated(stock);
        }
        qb.push(" WHERE id = ")
            .push_bind(id.as_i64())
            .push(" AND deleted = FALSE");

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_article", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound(format!("article {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn soft_delete_article(&self, id: ArticleId) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE articles SET deleted = TRUE WHERE id = $1 AND deleted = FALSE")
                .bind(id.as_i64())
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("soft_delete_article", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound(format!("article {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn fetch_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        let row = sqlx::query(ARTICLE_SELECT)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_article", e))?;
        row.map(|r| article_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_articles(&self) -> Result<Vec<Article>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, designation, purchase_price, sale_price, tax_rate_bp, category, stock, deleted
             FROM articles WHERE deleted = FALSE ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_articles", e))?;
        rows.iter().map(article_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn search_articles_by_designation(
        &self,
        needle: &str,
    ) -> Result<Vec<Article>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT id, designation, purchase_price, sale_price, tax_rate_bp, category, stock, deleted
             FROM articles
             WHERE deleted = FALSE AND designation ILIKE '%' || $1 || '%' ESCAPE '\'
             ORDER BY LOWER(designation)"#,
        )
        .bind(escape_like(needle))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("search_articles_by_designation", e))?;
        rows.iter().map(article_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn search_articles_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Article>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, designation, purchase_price, sale_price, tax_rate_bp, category, stock, deleted
             FROM articles
             WHERE deleted = FALSE AND LOWER(category) = LOWER($1)
             ORDER BY LOWER(designation)",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("search_articles_by_category", e))?;
        rows.iter().map(article_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_categories(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT DISTINCT category FROM articles
             WHERE deleted = FALSE AND category <> ''
             ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))?;
        rows.iter()
            .map(|r| {
                r.try_get("category")
                    .map_err(|e| StoreError::Backend(format!("list_categories row: {e}")))
            })
            .collect()
    }
}

#[async_trait]
impl DirectoryStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn fetch_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, surname, address, postal_code, phone, email
             FROM clients WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_client", e))?;
        row.map(|r| client_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, surname, address, postal_code, phone, email
             FROM clients ORDER BY name, surname",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_clients", e))?;
        rows.iter().map(client_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn fetch_personnel(&self, id: PersonnelId) -> Result<Option<Personnel>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, surname, address, city, phone, hired_on, role_label
             FROM personnel WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_personnel", e))?;
        row.map(|r| personnel_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_personnel(&self) -> Result<Vec<Personnel>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, surname, address, city, phone, hired_on, role_label
             FROM personnel ORDER BY name, surname",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_personnel", e))?;
        rows.iter().map(personnel_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_delivery_agents(&self) -> Result<Vec<Personnel>, StoreError> {
        let mut agents = self.list_personnel().await?;
        // Eligibility lives in one place (the domain predicate), not in SQL.
        agents.retain(Personnel::is_delivery_agent);
        Ok(agents)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn insert_order(
        &self,
        client_id: ClientId,
        created_at: DateTime<Utc>,
    ) -> Result<OrderId, StoreError> {
        let row = sqlx::query(
            "INSERT INTO orders (client_id, created_at, status)
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(client_id.as_i64())
        .bind(created_at)
        .bind(OrderStatus::initial().code())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::Backend(format!("insert_order returning: {e}")))?;
        Ok(OrderId::new(id))
    }

    #[instrument(skip(self), err)]
    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(
            "SELECT id, client_id, created_at, status FROM orders WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_order", e))?;
        row.map(|r| order_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn fetch_order_with_client(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithClient>, StoreError> {
        let row = sqlx::query(
            "SELECT o.id, o.client_id, o.created_at, o.status,
                    c.name AS client_first, c.surname AS client_last
             FROM orders o JOIN clients c ON o.client_id = c.id
             WHERE o.id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_order_with_client", e))?;
        row.map(|r| order_with_client_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn advance_order(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(next.code())
            .bind(id.as_i64())
            .bind(expected.code())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("advance_order", e))?;
        if result.rows_affected() == 0 {
            return Err(self.stale_or_missing_order(id, expected.code()).await);
        }
        Ok(())
    }

    #[instrument(skip(self, filter), err)]
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<OrderWithClient>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT o.id, o.client_id, o.created_at, o.status,
                    c.name AS client_first, c.surname AS client_last
             FROM orders o JOIN clients c ON o.client_id = c.id
             WHERE 1 = 1",
        );
        if let Some(client) = filter.client {
            qb.push(" AND o.client_id = ").push_bind(client.as_i64());
        }
        if let Some(status) = filter.status {
            qb.push(" AND o.status = ").push_bind(status.code());
        }
        if let Some(interval) = &filter.created_within {
            qb.push(" AND o.created_at >= ").push_bind(interval.start);
            qb.push(" AND o.created_at < ").push_bind(interval.end);
        }
        qb.push(match filter.sort {
            OrderSort::IdDesc => " ORDER BY o.id DESC",
            OrderSort::IdAsc => " ORDER BY o.id ASC",
            OrderSort::CreatedDesc => " ORDER BY o.created_at DESC",
        });

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?;
        rows.iter().map(order_with_client_from_row).collect()
    }
}

#[async_trait]
impl DeliveryStore for PostgresStore {
    #[instrument(skip(self, delivery), err)]
    async fn schedule_delivery(&self, delivery: &Delivery) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let advanced = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(OrderStatus::InDelivery.code())
            .bind(delivery.order_id.as_i64())
            .bind(OrderStatus::Ready.code())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("schedule_delivery", e))?;
        if advanced.rows_affected() == 0 {
            drop(tx);
            return Err(
                self.stale_or_missing_order(delivery.order_id, OrderStatus::Ready.code())
                    .await,
            );
        }

        sqlx::query(
            "INSERT INTO deliveries (order_id, scheduled_at, agent_id, payment_mode, status)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(delivery.order_id.as_i64())
        .bind(delivery.scheduled_at)
        .bind(delivery.agent_id.as_i64())
        .bind(&delivery.payment_mode)
        .bind(DeliveryStatus::initial().code())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("schedule_delivery", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn fetch_delivery(&self, order_id: OrderId) -> Result<Option<Delivery>, StoreError> {
        let row = sqlx::query(
            "SELECT order_id, scheduled_at, agent_id, payment_mode, status
             FROM deliveries WHERE order_id = $1",
        )
        .bind(order_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_delivery", e))?;
        row.map(|r| delivery_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn fetch_delivery_details(
        &self,
        order_id: OrderId,
    ) -> Result<Option<DeliveryDetails>, StoreError> {
        let row = sqlx::query(&delivery_details_sql(" AND d.order_id = $1"))
            .bind(order_id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_delivery_details", e))?;
        row.map(|r| delivery_details_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn update_delivery(
        &self,
        order_id: OrderId,
        scheduled_at: Option<DateTime<Utc>>,
        agent_id: Option<PersonnelId>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE deliveries
             SET scheduled_at = COALESCE($2, scheduled_at),
                 agent_id = COALESCE($3, agent_id)
             WHERE order_id = $1 AND status <> $4",
        )
        .bind(order_id.as_i64())
        .bind(scheduled_at)
        .bind(agent_id.map(|a| a.as_i64()))
        .bind(DeliveryStatus::Delivered.code())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_delivery", e))?;
        if result.rows_affected() == 0 {
            return Err(self.stale_or_missing_delivery(order_id).await);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn advance_delivery(
        &self,
        order_id: OrderId,
        expected: DeliveryStatus,
        next: DeliveryStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE deliveries SET status = $1 WHERE order_id = $2 AND status = $3",
        )
        .bind(next.code())
        .bind(order_id.as_i64())
        .bind(expected.code())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("advance_delivery", e))?;
        if result.rows_affected() == 0 {
            let err = match self.delivery_status_or_missing(order_id).await {
                Ok(Some(found)) => StoreError::StaleState(format!(
                    "delivery for order {order_id}: expected {expected}, found {found}"
                )),
                Ok(None) => {
                    StoreError::RowNotFound(format!("delivery for order {order_id}"))
                }
                Err(e) => e,
            };
            return Err(err);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn complete_delivery(&self, order_id: OrderId) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let delivered = sqlx::query(
            "UPDATE deliveries SET status = $1 WHERE order_id = $2 AND status <> $1",
        )
        .bind(DeliveryStatus::Delivered.code())
        .bind(order_id.as_i64())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("complete_delivery", e))?;
        if delivered.rows_affected() == 0 {
            drop(tx);
            return Err(self.stale_or_missing_delivery(order_id).await);
        }

        let closed = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(OrderStatus::Completed.code())
            .bind(order_id.as_i64())
            .bind(OrderStatus::InDelivery.code())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("complete_delivery", e))?;
        if closed.rows_affected() == 0 {
            drop(tx);
            return Err(
                self.stale_or_missing_order(order_id, OrderStatus::InDelivery.code())
                    .await,
            );
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn cancel_delivery(&self, order_id: OrderId) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let removed = sqlx::query("DELETE FROM deliveries WHERE order_id = $1 AND status <> $2")
            .bind(order_id.as_i64())
            .bind(DeliveryStatus::Delivered.code())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("cancel_delivery", e))?;
        if removed.rows_affected() == 0 {
            drop(tx);
            return Err(self.stale_or_missing_delivery(order_id).await);
        }

        let reverted = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(OrderStatus::Ready.code())
            .bind(order_id.as_i64())
            .bind(OrderStatus::InDelivery.code())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("cancel_delivery", e))?;
        if reverted.rows_affected() == 0 {
            drop(tx);
            return Err(
                self.stale_or_missing_order(order_id, OrderStatus::InDelivery.code())
                    .await,
            );
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self, filter), err)]
    async fn list_deliveries(
        &self,
        filter: &DeliveryFilter,
    ) -> Result<Vec<DeliveryDetails>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(delivery_details_sql(""));
        if let Some(agent) = filter.agent {
            qb.push(" AND d.agent_id = ").push_bind(agent.as_i64());
        }
        if let Some(postal_code) = &filter.postal_code {
            qb.push(" AND c.postal_code = ").push_bind(postal_code);
        }
        if let Some(interval) = &filter.scheduled_within {
            qb.push(" AND d.scheduled_at >= ").push_bind(interval.start);
            qb.push(" AND d.scheduled_at < ").push_bind(interval.end);
        }
        qb.push(match filter.sort {
            DeliverySort::ScheduledDesc => " ORDER BY d.scheduled_at DESC",
            DeliverySort::OrderIdAsc => " ORDER BY d.order_id ASC",
        });

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_deliveries", e))?;
        rows.iter().map(delivery_details_from_row).collect()
    }
}

const ARTICLE_SELECT: &str =
    "SELECT id, designation, purchase_price, sale_price, tax_rate_bp, category, stock, deleted
     FROM articles WHERE id = $1";

fn delivery_details_sql(extra_where: &str) -> String {
    format!(
        "SELECT d.order_id, d.scheduled_at, d.agent_id, d.payment_mode, d.status,
                o.status AS order_status, o.client_id,
                c.name AS client_first, c.surname AS client_last, c.postal_code,
                p.name AS agent_first, p.surname AS agent_last
         FROM deliveries d
         JOIN orders o ON d.order_id = o.id
         JOIN clients c ON o.client_id = c.id
         JOIN personnel p ON d.agent_id = p.id
         WHERE 1 = 1{extra_where}"
    )
}

/// Escape `LIKE` metacharacters so a bound needle matches literally, the way
/// the in-memory substring search does.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(msg),
                Some("23503") => StoreError::ForeignKeyViolation(msg),
                _ => StoreError::Backend(msg),
            }
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn cents_to_db(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Backend("price out of range".to_string()))
}

fn cents_from_db(value: i64, field: &str) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Backend(format!("negative {field} in store")))
}

fn status_from_row<T>(
    row: &PgRow,
    column: &str,
    parse: fn(&str) -> Result<T, orderdesk_core::DomainError>,
) -> Result<T, StoreError> {
    let code: String = row
        .try_get(column)
        .map_err(|e| StoreError::Backend(format!("status column: {e}")))?;
    parse(&code).map_err(|e| StoreError::Backend(format!("corrupt status: {e}")))
}

fn article_from_row(row: &PgRow) -> Result<Article, StoreError> {
    let get = |e: sqlx::Error| StoreError::Backend(format!("article row: {e}"));
    Ok(Article {
        id: ArticleId::new(row.try_get("id").map_err(get)?),
        designation: row.try_get("designation").map_err(get)?,
        purchase_price: cents_from_db(row.try_get("purchase_price").map_err(get)?, "purchase_price")?,
        sale_price: cents_from_db(row.try_get("sale_price").map_err(get)?, "sale_price")?,
        tax_rate_bp: row.try_get::<i32, _>("tax_rate_bp").map_err(get)? as u32,
        category: row.try_get("category").map_err(get)?,
        stock: row.try_get("stock").map_err(get)?,
        deleted: row.try_get("deleted").map_err(get)?,
    })
}

fn client_from_row(row: &PgRow) -> Result<Client, StoreError> {
    let get = |e: sqlx::Error| StoreError::Backend(format!("client row: {e}"));
    Ok(Client {
        id: ClientId::new(row.try_get("id").map_err(get)?),
        name: row.try_get("name").map_err(get)?,
        surname: row.try_get("surname").map_err(get)?,
        address: row.try_get("address").map_err(get)?,
        postal_code: row.try_get("postal_code").map_err(get)?,
        phone: row.try_get("phone").map_err(get)?,
        email: row.try_get("email").map_err(get)?,
    })
}

fn personnel_from_row(row: &PgRow) -> Result<Personnel, StoreError> {
    let get = |e: sqlx::Error| StoreError::Backend(format!("personnel row: {e}"));
    Ok(Personnel {
        id: PersonnelId::new(row.try_get("id").map_err(get)?),
        name: row.try_get("name").map_err(get)?,
        surname: row.try_get("surname").map_err(get)?,
        address: row.try_get("address").map_err(get)?,
        city: row.try_get("city").map_err(get)?,
        phone: row.try_get("phone").map_err(get)?,
        hired_on: row.try_get("hired_on").map_err(get)?,
        role_label: row.try_get("role_label").map_err(get)?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let get = |e: sqlx::Error| StoreError::Backend(format!("order row: {e}"));
    Ok(Order {
        id: OrderId::new(row.try_get("id").map_err(get)?),
        client_id: ClientId::new(row.try_get("client_id").map_err(get)?),
        created_at: row.try_get("created_at").map_err(get)?,
        status: status_from_row(row, "status", OrderStatus::from_code)?,
    })
}

fn order_with_client_from_row(row: &PgRow) -> Result<OrderWithClient, StoreError> {
    let get = |e: sqlx::Error| StoreError::Backend(format!("order row: {e}"));
    let first: String = row.try_get("client_first").map_err(get)?;
    let last: String = row.try_get("client_last").map_err(get)?;
    Ok(OrderWithClient {
        order: order_from_row(row)?,
        client_name: format!("{first} {last}"),
    })
}

fn delivery_from_row(row: &PgRow) -> Result<Delivery, StoreError> {
    let get = |e: sqlx::Error| StoreError::Backend(format!("delivery row: {e}"));
    Ok(Delivery {
        order_id: OrderId::new(row.try_get("order_id").map_err(get)?),
        scheduled_at: row.try_get("scheduled_at").map_err(get)?,
        agent_id: PersonnelId::new(row.try_get("agent_id").map_err(get)?),
        payment_mode: row.try_get("payment_mode").map_err(get)?,
        status: status_from_row(row, "status", DeliveryStatus::from_code)?,
    })
}

fn delivery_details_from_row(row: &PgRow) -> Result<DeliveryDetails, StoreError> {
    let get = |e: sqlx::Error| StoreError::Backend(format!("delivery row: {e}"));
    let client_first: String = row.try_get("client_first").map_err(get)?;
    let client_last: String = row.try_get("client_last").map_err(get)?;
    let agent_first: String = row.try_get("agent_first").map_err(get)?;
    let agent_last: String = row.try_get("agent_last").map_err(get)?;
    Ok(DeliveryDetails {
        delivery: delivery_from_row(row)?,
        client_id: ClientId::new(row.try_get("client_id").map_err(get)?),
        client_name: format!("{client_first} {client_last}"),
        postal_code: row.try_get("postal_code").map_err(get)?,
        agent_name: format!("{agent_first} {agent_last}"),
        order_status: status_from_row(row, "order_status", OrderStatus::from_code)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped_to_match_literally() {
        assert_eq!(escape_like("coffee"), "coffee");
        assert_eq!(escape_like("100% arabica"), r"100\% arabica");
        assert_eq!(escape_like("a_b"), r"a\_b");
        assert_eq!(escape_like(r"back\slash"), r"back\\slash");
        assert_eq!(escape_like("%_\\"), r"\%\_\\");
    }
}
