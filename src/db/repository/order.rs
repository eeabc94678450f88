//! Order Repository

use chrono::Utc;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{ORDER_TABLE, Order, OrderStatus};
use crate::utils::Pagination;

/// Admin listing filter
#[derive(Debug, Default, Clone)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Restrict to one account ("user:key" string)
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a new order. An invoiceNo collision on the UNIQUE index
    /// comes back as `RepoError::Duplicate` so the caller can regenerate.
    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(ORDER_TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let record_id = parse_record_id(ORDER_TABLE, id)?;
        let order: Option<Order> = self.base.db().select(record_id).await?;
        Ok(order)
    }

    /// Newest-first page of orders with the total matching count
    pub async fn find_page(
        &self,
        filter: &OrderFilter,
        page: &Pagination,
    ) -> RepoResult<(Vec<Order>, i64)> {
        let mut conds: Vec<&str> = Vec::new();
        if filter.status.is_some() {
            conds.push("status = $status");
        }
        if filter.user.is_some() {
            conds.push("user = $user");
        }
        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conds.join(" AND "))
        };

        // `order` collides with the ORDER keyword, so the table name is
        // escaped in raw queries
        let query_str = format!(
            "SELECT * FROM `order`{where_clause} ORDER BY createdAt DESC LIMIT $limit START $start"
        );
        let count_str = format!("SELECT count() FROM `order`{where_clause} GROUP ALL");

        let mut query = self
            .base
            .db()
            .query(query_str)
            .query(count_str)
            .bind(("limit", page.limit))
            .bind(("start", page.start));
        if let Some(status) = filter.status {
            query = query.bind(("status", status.as_str()));
        }
        if let Some(user) = &filter.user {
            query = query.bind(("user", user.clone()));
        }

        let mut result = query.await?;
        let orders: Vec<Order> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.count).unwrap_or(0);
        Ok((orders, total))
    }

    pub async fn update_status(&self, id: &str, status: OrderStatus) -> RepoResult<Order> {
        let record_id = parse_record_id(ORDER_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $rid SET status = $status, updatedAt = $now RETURN AFTER")
            .bind(("rid", record_id))
            .bind(("status", status.as_str()))
            .bind(("now", Utc::now()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
    }

    pub async fn update_payment(&self, id: &str, paid: bool) -> RepoResult<Order> {
        let record_id = parse_record_id(ORDER_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $rid SET paid = $paid, updatedAt = $now RETURN AFTER")
            .bind(("rid", record_id))
            .bind(("paid", paid))
            .bind(("now", Utc::now()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
    }
}
