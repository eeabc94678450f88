//! Product Repository

use chrono::Utc;
use serde::Deserialize;
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{PRODUCT_TABLE, Product, ProductImage, ProductUpdate};
use crate::utils::Pagination;

/// Storefront sort keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    RatingDesc,
    TitleAsc,
}

impl ProductSort {
    fn order_clause(self) -> &'static str {
        match self {
            ProductSort::Newest => "createdAt DESC",
            ProductSort::PriceAsc => "priceInFils ASC",
            ProductSort::PriceDesc => "priceInFils DESC",
            ProductSort::RatingDesc => "rating.rate DESC",
            ProductSort::TitleAsc => "title ASC",
        }
    }
}

/// Filters applied to the public product listing
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    /// Case-insensitive substring match on title/description
    pub q: Option<String>,
    /// Category record id (already resolved from id or slug)
    pub category: Option<RecordId>,
    pub sort: ProductSort,
    /// Public listing sees active products only; admin sees everything
    pub active_only: bool,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn where_clause(filter: &ProductFilter) -> String {
        let mut conds: Vec<&str> = Vec::new();
        if filter.active_only {
            conds.push("status = 'active'");
        }
        if filter.q.is_some() {
            conds.push(
                "(string::contains(string::lowercase(title), $q) \
                 OR string::contains(string::lowercase(description), $q))",
            );
        }
        if filter.category.is_some() {
            conds.push("category = $category");
        }
        if conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conds.join(" AND "))
        }
    }

    /// One page of products plus the total matching count.
    pub async fn find_page(
        &self,
        filter: &ProductFilter,
        page: &Pagination,
    ) -> RepoResult<(Vec<Product>, i64)> {
        let where_clause = Self::where_clause(filter);
        let query_str = format!(
            "SELECT * FROM product{where_clause} ORDER BY {} LIMIT $limit START $start",
            filter.sort.order_clause()
        );
        let count_str = format!("SELECT count() FROM product{where_clause} GROUP ALL");

        let mut query = self
            .base
            .db()
            .query(query_str)
            .query(count_str)
            .bind(("limit", page.limit))
            .bind(("start", page.start));
        if let Some(q) = &filter.q {
            query = query.bind(("q", q.to_lowercase()));
        }
        if let Some(category) = &filter.category {
            // category is stored as a "table:key" string
            query = query.bind(("category", category.to_string()));
        }

        let mut result = query.await?;
        let products: Vec<Product> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.count).unwrap_or(0);
        Ok((products, total))
    }

    /// Find any product by id, regardless of status (admin view)
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let record_id = parse_record_id(PRODUCT_TABLE, id)?;
        let product: Option<Product> = self.base.db().select(record_id).await?;
        Ok(product)
    }

    /// Storefront detail lookup: `id_or_slug` may be either a record id
    /// or a slug; only active products resolve.
    pub async fn find_active_by_id_or_slug(&self, id_or_slug: &str) -> RepoResult<Option<Product>> {
        if let Ok(record_id) = parse_record_id(PRODUCT_TABLE, id_or_slug) {
            let found: Option<Product> = self.base.db().select(record_id).await?;
            if let Some(product) = found {
                return Ok(product.is_sellable().then_some(product));
            }
        }
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE slug = $slug AND status = 'active'")
            .bind(("slug", id_or_slug.to_string()))
            .await?
            .take(0)?;
        Ok(products.into_iter().next())
    }

    /// Batch fetch active products by id, used by checkout
    pub async fn find_active_by_ids(&self, ids: Vec<RecordId>) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE id IN $ids AND status = 'active'")
            .bind(("ids", ids))
            .await?
            .take(0)?;
        Ok(products)
    }

    pub async fn create(&self, product: Product) -> RepoResult<Product> {
        let created: Option<Product> = self
            .base
            .db()
            .create(PRODUCT_TABLE)
            .content(product)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    pub async fn update(&self, id: &str, mut patch: ProductUpdate) -> RepoResult<Product> {
        let record_id = parse_record_id(PRODUCT_TABLE, id)?;
        patch.updated_at = Some(Utc::now());
        let updated: Option<Product> = self.base.db().update(record_id).merge(patch).await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let record_id = parse_record_id(PRODUCT_TABLE, id)?;
        let deleted: Option<Product> = self.base.db().delete(record_id).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Product {id} not found")));
        }
        Ok(())
    }

    /// Append uploaded images to a product's gallery
    pub async fn push_images(&self, id: &str, images: Vec<ProductImage>) -> RepoResult<Product> {
        let record_id = parse_record_id(PRODUCT_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $rid SET images += $imgs, updatedAt = $now RETURN AFTER")
            .bind(("rid", record_id))
            .bind(("imgs", images))
            .bind(("now", Utc::now()))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }

    /// Atomic conditional stock decrement. Returns false (and leaves the
    /// row untouched) when remaining stock is below `qty`.
    pub async fn try_decrement_stock(&self, id: &RecordId, qty: i64) -> RepoResult<bool> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $rid SET stock -= $qty, updatedAt = $now WHERE stock >= $qty RETURN AFTER")
            .bind(("rid", id.clone()))
            .bind(("qty", qty))
            .bind(("now", Utc::now()))
            .await?;
        let updated: Vec<Product> = result.take(0)?;
        Ok(!updated.is_empty())
    }

    /// Compensating restock for a failed checkout
    pub async fn restock(&self, id: &RecordId, qty: i64) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $rid SET stock += $qty, updatedAt = $now")
            .bind(("rid", id.clone()))
            .bind(("qty", qty))
            .bind(("now", Utc::now()))
            .await?;
        Ok(())
    }
}
