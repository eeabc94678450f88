//! Database Module
//!
//! Embedded SurrealDB: RocksDB on disk in production, memory engine in
//! tests. Uniqueness constraints live in the schema so concurrent writers
//! cannot slip duplicates past application checks.

pub mod models;
pub mod repository;

use std::path::Path;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};
use tracing::info;

use crate::utils::{AppError, AppResult};

const NAMESPACE: &str = "ozkw";
const DATABASE: &str = "store";

/// Owns the embedded database handle
#[derive(Clone)]
pub struct DbService {
    db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the on-disk database
    pub async fn new(path: &Path) -> AppResult<Self> {
        let db = Surreal::new::<RocksDb>(path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;
        let service = Self::init(db).await?;
        info!("Database ready at {}", path.display());
        Ok(service)
    }

    /// In-memory database for tests
    pub async fn memory() -> AppResult<Self> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open memory database: {e}")))?;
        Self::init(db).await
    }

    async fn init(db: Surreal<Db>) -> AppResult<Self> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;
        let service = Self { db };
        service.define_schema().await?;
        Ok(service)
    }

    /// Declare the UNIQUE indexes the business rules depend on
    async fn define_schema(&self) -> AppResult<()> {
        self.db
            .query("DEFINE INDEX IF NOT EXISTS idx_user_email ON TABLE user COLUMNS email UNIQUE")
            .query("DEFINE INDEX IF NOT EXISTS idx_product_slug ON TABLE product COLUMNS slug UNIQUE")
            .query("DEFINE INDEX IF NOT EXISTS idx_category_slug ON TABLE category COLUMNS slug UNIQUE")
            .query("DEFINE INDEX IF NOT EXISTS idx_order_invoice ON TABLE `order` COLUMNS invoiceNo UNIQUE")
            .await
            .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;
        Ok(())
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
