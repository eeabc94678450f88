//! Repository Module
//!
//! Provides CRUD operations for SurrealDB tables, one repository per table.

pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use category::CategoryRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use user::UserRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        // UNIQUE index violations surface as "Database index ... already
        // contains ..." from the local engines
        if msg.contains("already contains") {
            RepoError::Duplicate(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: "table:id" strings at the API boundary
// =============================================================================
//
// surrealdb::RecordId everywhere inside:
//   - parse: let id: RecordId = "product:abc".parse()?;
//   - build: let id = RecordId::from_table_key("product", "abc");
//   - table: id.table(), key: id.key().to_string()
//   - CRUD: db.select(id) / db.delete(id) take the RecordId directly

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// Parse a client-supplied id into a RecordId of the expected table.
/// Accepts both `"table:key"` and a bare key.
pub fn parse_record_id(table: &str, id: &str) -> RepoResult<surrealdb::RecordId> {
    let candidate = if id.contains(':') {
        id.to_string()
    } else {
        format!("{table}:{id}")
    };
    let record_id: surrealdb::RecordId = candidate
        .parse()
        .map_err(|_| RepoError::Validation(format!("Invalid id: {id}")))?;
    if record_id.table() != table {
        return Err(RepoError::Validation(format!(
            "Invalid id: expected {table}, got {id}"
        )));
    }
    Ok(record_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_bare_and_prefixed_keys() {
        assert_eq!(
            parse_record_id("product", "abc123").unwrap().to_string(),
            "product:abc123"
        );
        assert_eq!(
            parse_record_id("product", "product:abc123")
                .unwrap()
                .to_string(),
            "product:abc123"
        );
    }

    #[test]
    fn parse_rejects_foreign_table() {
        assert!(parse_record_id("product", "category:abc").is_err());
    }
}
