//! Catalog service: article creation, partial update, soft delete.

use std::sync::Arc;

use tracing::{info, instrument};

use orderdesk_catalog::{Article, ArticleId, ArticlePatch, NewArticle};
use orderdesk_core::{DomainError, DomainResult};
use orderdesk_store::Store;

use crate::map_store_error;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a new article; the store assigns the reference.
    #[instrument(skip(self, article), err)]
    pub async fn create(&self, article: NewArticle) -> DomainResult<ArticleId> {
        article.validate()?;
        let id = self
            .store
            .insert_article(article)
            .await
            .map_err(map_store_error)?;
        info!(article = %id, "article created");
        Ok(id)
    }

    /// Apply a partial update: absent fields keep their value, an explicit
    /// null clears (only the category is clearable). Soft-deleted articles
    /// are not updatable.
    #[instrument(skip(self, patch), err)]
    pub async fn update(&self, id: ArticleId, patch: ArticlePatch) -> DomainResult<()> {
        patch.validate()?;
        self.store
            .update_article(id, &patch)
            .await
            .map_err(map_store_error)?;
        info!(article = %id, "article updated");
        Ok(())
    }

    /// Retire an article. It leaves listings and category results but stays
    /// resolvable by reference.
    #[instrument(skip(self), err)]
    pub async fn soft_delete(&self, id: ArticleId) -> DomainResult<()> {
        self.store
            .soft_delete_article(id)
            .await
            .map_err(map_store_error)?;
        info!(article = %id, "article soft-deleted");
        Ok(())
    }

    /// Direct lookup by reference; resolves soft-deleted articles too.
    pub async fn get(&self, id: ArticleId) -> DomainResult<Article> {
        self.store
            .fetch_article(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| DomainError::not_found(format!("article {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_catalog::Patch;
    use orderdesk_store::InMemoryStore;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(InMemoryStore::new()))
    }

    fn oil() -> NewArticle {
        NewArticle {
            designation: "Olive oil 1L".into(),
            purchase_price: 450,
            sale_price: 700,
            tax_rate_bp: 550,
            category: "grocery".into(),
            stock: 12,
        }
    }

    #[tokio::test]
    async fn create_validates_the_designation() {
        let catalog = service();
        let mut bad = oil();
        bad.designation = "  ".into();
        let err = catalog.create(bad).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let id = catalog.create(oil()).await.unwrap();
        assert_eq!(catalog.get(id).await.unwrap().designation, "Olive oil 1L");
    }

    #[tokio::test]
    async fn update_is_partial_and_clear_is_category_only() {
        let catalog = service();
        let id = catalog.create(oil()).await.unwrap();

        let patch = ArticlePatch {
            sale_price: Patch::Set(750),
            category: Patch::Clear,
            ..Default::default()
        };
        catalog.update(id, patch).await.unwrap();
        let article = catalog.get(id).await.unwrap();
        assert_eq!(article.sale_price, 750);
        assert_eq!(article.category, "");
        assert_eq!(article.designation, "Olive oil 1L");

        let err = catalog
            .update(
                id,
                ArticlePatch {
                    designation: Patch::Clear,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn soft_deleted_articles_reject_updates_but_resolve() {
        let catalog = service();
        let id = catalog.create(oil()).await.unwrap();
        catalog.soft_delete(id).await.unwrap();

        let err = catalog
            .update(
                id,
                ArticlePatch {
                    stock: Patch::Set(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        assert!(catalog.get(id).await.unwrap().deleted);
        let err = catalog.soft_delete(id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
