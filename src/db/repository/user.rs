//! User Repository

use chrono::Utc;
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Role, USER_TABLE, User};

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let record_id = parse_record_id(USER_TABLE, id)?;
        let user: Option<User> = self.base.db().select(record_id).await?;
        Ok(user)
    }

    /// Emails are stored lowercase; lookup folds case to match
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email")
            .bind(("email", email.trim().to_lowercase()))
            .await?
            .take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create an account. The UNIQUE email index turns races on the same
    /// address into a Duplicate error.
    pub async fn create(&self, name: String, email: String, password_hash: String) -> RepoResult<User> {
        let now = Utc::now();
        let user = User {
            id: None,
            name,
            email: email.trim().to_lowercase(),
            password_hash,
            role: Role::Customer,
            wishlist: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let created: Option<User> = self.base.db().create(USER_TABLE).content(user).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Add or remove a product from the wishlist. Returns the new list
    /// and whether the product is now present.
    pub async fn toggle_wishlist(
        &self,
        user_id: &str,
        product_id: &RecordId,
    ) -> RepoResult<(Vec<RecordId>, bool)> {
        let record_id = parse_record_id(USER_TABLE, user_id)?;
        let user: Option<User> = self.base.db().select(record_id.clone()).await?;
        let user = user.ok_or_else(|| RepoError::NotFound(format!("User {user_id} not found")))?;

        let already = user.wishlist.contains(product_id);
        let op = if already { "-=" } else { "+=" };
        let query_str =
            format!("UPDATE $rid SET wishlist {op} $product, updatedAt = $now RETURN AFTER");

        let mut result = self
            .base
            .db()
            .query(query_str)
            .bind(("rid", record_id))
            .bind(("product", product_id.to_string()))
            .bind(("now", Utc::now()))
            .await?;
        let updated: Vec<User> = result.take(0)?;
        let updated = updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("User {user_id} not found")))?;
        Ok((updated.wishlist, !already))
    }
}
