//! Category Repository

use chrono::Utc;
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{CATEGORY_TABLE, Category, CategoryCreate, CategoryUpdate};

#[derive(Clone)]
pub struct CategoryRepository {
    base: BaseRepository,
}

impl CategoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Category>> {
        let categories: Vec<Category> = self
            .base
            .db()
            .query("SELECT * FROM category ORDER BY sortOrder, name")
            .await?
            .take(0)?;
        Ok(categories)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Category>> {
        let record_id = parse_record_id(CATEGORY_TABLE, id)?;
        let category: Option<Category> = self.base.db().select(record_id).await?;
        Ok(category)
    }

    /// Category filters on the product listing accept either form
    pub async fn find_by_id_or_slug(&self, id_or_slug: &str) -> RepoResult<Option<Category>> {
        if let Ok(record_id) = parse_record_id(CATEGORY_TABLE, id_or_slug) {
            let found: Option<Category> = self.base.db().select(record_id).await?;
            if found.is_some() {
                return Ok(found);
            }
        }
        self.find_by_slug(id_or_slug).await
    }

    pub async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let categories: Vec<Category> = self
            .base
            .db()
            .query("SELECT * FROM category WHERE slug = $slug")
            .bind(("slug", slug.to_string()))
            .await?
            .take(0)?;
        Ok(categories.into_iter().next())
    }

    pub async fn create(&self, data: CategoryCreate) -> RepoResult<Category> {
        let now = Utc::now();
        let category = Category {
            id: None,
            name: data.name,
            slug: data.slug,
            description: data.description.unwrap_or_default(),
            image_url: data.image_url,
            sort_order: data.sort_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        let created: Option<Category> = self
            .base
            .db()
            .create(CATEGORY_TABLE)
            .content(category)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create category".to_string()))
    }

    pub async fn update(&self, id: &str, mut patch: CategoryUpdate) -> RepoResult<Category> {
        let record_id = parse_record_id(CATEGORY_TABLE, id)?;
        patch.updated_at = Some(Utc::now());
        let updated: Option<Category> = self.base.db().update(record_id).merge(patch).await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let record_id = parse_record_id(CATEGORY_TABLE, id)?;

        // Refuse deletion while products still point at it
        let in_use = self.products_in_category(&record_id).await?;
        if in_use > 0 {
            return Err(RepoError::Validation(format!(
                "Category has {in_use} products; reassign them first"
            )));
        }

        let deleted: Option<Category> = self.base.db().delete(record_id).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Category {id} not found")));
        }
        Ok(())
    }

    async fn products_in_category(&self, id: &RecordId) -> RepoResult<i64> {
        #[derive(serde::Deserialize)]
        struct CountRow {
            count: i64,
        }
        let counts: Vec<CountRow> = self
            .base
            .db()
            .query("SELECT count() FROM product WHERE category = $category GROUP ALL")
            .bind(("category", id.to_string()))
            .await?
            .take(0)?;
        Ok(counts.first().map(|c| c.count).unwrap_or(0))
    }
}
