//! Article entity, creation input and partial updates.

use serde::{Deserialize, Serialize};

use orderdesk_core::{entity_id, DomainError, DomainResult, Entity};

use crate::patch::Patch;

entity_id! {
    /// Article reference, assigned by the store on insert.
    pub struct ArticleId
}

/// A priced stock item in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub designation: String,
    /// Purchase price in smallest currency unit (e.g., cents).
    pub purchase_price: u64,
    /// Sale price in smallest currency unit (e.g., cents).
    pub sale_price: u64,
    /// Tax rate in basis points (2000 = 20.00%).
    pub tax_rate_bp: u32,
    pub category: String,
    /// Units on hand; must never go negative.
    pub stock: i64,
    /// Soft-delete flag. Deleted articles stay resolvable by id but are
    /// excluded from listings and category results.
    pub deleted: bool,
}

impl Article {
    /// Apply a validated partial update. Unmentioned fields stay untouched;
    /// only `category` may be cleared.
    pub fn apply_patch(&mut self, patch: &ArticlePatch) -> DomainResult<()> {
        patch.validate()?;

        if let Patch::Set(designation) = &patch.designation {
            self.designation = designation.clone();
        }
        if let Patch::Set(price) = patch.purchase_price {
            self.purchase_price = price;
        }
        if let Patch::Set(price) = patch.sale_price {
            self.sale_price = price;
        }
        if let Patch::Set(rate) = patch.tax_rate_bp {
            self.tax_rate_bp = rate;
        }
        match &patch.category {
            Patch::Keep => {}
            Patch::Clear => self.category.clear(),
            Patch::Set(category) => self.category = category.clone(),
        }
        if let Patch::Set(stock) = patch.stock {
            self.stock = stock;
        }
        Ok(())
    }

    /// Adjust stock by a signed delta, rejecting any result below zero.
    pub fn adjust_stock(&mut self, delta: i64) -> DomainResult<()> {
        let next = self.stock.checked_add(delta).ok_or_else(|| {
            DomainError::validation("stock adjustment overflows")
        })?;
        if next < 0 {
            return Err(DomainError::validation("stock cannot go negative"));
        }
        self.stock = next;
        Ok(())
    }
}

impl Entity for Article {
    type Id = ArticleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for catalog insert; the store assigns the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticle {
    pub designation: String,
    /// Purchase price in smallest currency unit (e.g., cents).
    pub purchase_price: u64,
    /// Sale price in smallest currency unit (e.g., cents).
    pub sale_price: u64,
    /// Tax rate in basis points (2000 = 20.00%).
    pub tax_rate_bp: u32,
    pub category: String,
    pub stock: i64,
}

impl NewArticle {
    pub fn validate(&self) -> DomainResult<()> {
        if self.designation.trim().is_empty() {
            return Err(DomainError::validation("designation cannot be empty"));
        }
        if self.stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        Ok(())
    }

    /// Materialize as a live article under a store-assigned reference.
    pub fn into_article(self, id: ArticleId) -> Article {
        Article {
            id,
            designation: self.designation,
            purchase_price: self.purchase_price,
            sale_price: self.sale_price,
            tax_rate_bp: self.tax_rate_bp,
            category: self.category,
            stock: self.stock,
            deleted: false,
        }
    }
}

/// Partial update for an article. Absent fields mean "keep".
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ArticlePatch {
    #[serde(default)]
    pub designation: Patch<String>,
    #[serde(default)]
    pub purchase_price: Patch<u64>,
    #[serde(default)]
    pub sale_price: Patch<u64>,
    #[serde(default)]
    pub tax_rate_bp: Patch<u32>,
    #[serde(default)]
    pub category: Patch<String>,
    #[serde(default)]
    pub stock: Patch<i64>,
}

impl ArticlePatch {
    pub fn is_empty(&self) -> bool {
        self.designation.is_keep()
            && self.purchase_price.is_keep()
            && self.sale_price.is_keep()
            && self.tax_rate_bp.is_keep()
            && self.category.is_keep()
            && self.stock.is_keep()
    }

    pub fn validate(&self) -> DomainResult<()> {
        match &self.designation {
            Patch::Clear => {
                return Err(DomainError::validation("designation cannot be cleared"));
            }
            Patch::Set(d) if d.trim().is_empty() => {
                return Err(DomainError::validation("designation cannot be empty"));
            }
            _ => {}
        }
        for (field, patch) in [
            ("purchase_price", self.purchase_price.is_clear()),
            ("sale_price", self.sale_price.is_clear()),
            ("tax_rate_bp", self.tax_rate_bp.is_clear()),
            ("stock", self.stock.is_clear()),
        ] {
            if patch {
                return Err(DomainError::validation(format!(
                    "{field} cannot be cleared"
                )));
            }
        }
        if let Patch::Set(stock) = self.stock {
            if stock < 0 {
                return Err(DomainError::validation("stock cannot be negative"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        NewArticle {
            designation: "Ground coffee 1kg".into(),
            purchase_price: 650,
            sale_price: 990,
            tax_rate_bp: 550,
            category: "grocery".into(),
            stock: 40,
        }
        .into_article(ArticleId::new(1))
    }

    #[test]
    fn new_article_requires_designation() {
        let mut input = NewArticle {
            designation: "  ".into(),
            purchase_price: 0,
            sale_price: 0,
            tax_rate_bp: 0,
            category: String::new(),
            stock: 0,
        };
        assert!(matches!(
            input.validate().unwrap_err(),
            DomainError::Validation(_)
        ));
        input.designation = "Box".into();
        assert!(input.validate().is_ok());
    }

    #[test]
    fn new_article_rejects_negative_stock() {
        let input = NewArticle {
            designation: "Box".into(),
            purchase_price: 0,
            sale_price: 0,
            tax_rate_bp: 0,
            category: String::new(),
            stock: -1,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn patch_keeps_unmentioned_fields() {
        let mut a = article();
        let patch = ArticlePatch {
            sale_price: Patch::Set(1090),
            ..ArticlePatch::default()
        };
        a.apply_patch(&patch).unwrap();
        assert_eq!(a.sale_price, 1090);
        assert_eq!(a.designation, "Ground coffee 1kg");
        assert_eq!(a.purchase_price, 650);
        assert_eq!(a.stock, 40);
    }

    #[test]
    fn patch_clears_category_only() {
        let mut a = article();
        let patch = ArticlePatch {
            category: Patch::Clear,
            ..ArticlePatch::default()
        };
        a.apply_patch(&patch).unwrap();
        assert_eq!(a.category, "");

        let bad = ArticlePatch {
            designation: Patch::Clear,
            ..ArticlePatch::default()
        };
        assert!(a.apply_patch(&bad).is_err());

        let bad = ArticlePatch {
            sale_price: Patch::Clear,
            ..ArticlePatch::default()
        };
        assert!(a.apply_patch(&bad).is_err());
    }

    #[test]
    fn patch_rejects_empty_designation_and_negative_stock() {
        let mut a = article();
        let bad = ArticlePatch {
            designation: Patch::Set("  ".into()),
            ..ArticlePatch::default()
        };
        assert!(a.apply_patch(&bad).is_err());

        let bad = ArticlePatch {
            stock: Patch::Set(-5),
            ..ArticlePatch::default()
        };
        assert!(a.apply_patch(&bad).is_err());
        assert_eq!(a.stock, 40);
    }

    #[test]
    fn stock_adjustments_never_go_negative() {
        let mut a = article();
        a.adjust_stock(-40).unwrap();
        assert_eq!(a.stock, 0);
        let err = a.adjust_stock(-1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(a.stock, 0);
    }
}
