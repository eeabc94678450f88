//! Order API Handlers
//!
//! Checkout is open to guests; everything else requires a login. Admins
//! see and manage all orders, customers only their own.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::auth::{CurrentUser, OptionalUser};
use crate::checkout::{self, CheckoutRequest};
use crate::core::ServerState;
use crate::db::models::{Order, OrderStatus};
use crate::db::repository::order::OrderFilter;
use crate::db::repository::OrderRepository;
use crate::utils::{AppError, AppResult, PageQuery, Paginated, Pagination};

fn require_admin(user: &CurrentUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("Admin access required"))
    }
}

/// POST /api/orders - checkout
pub async fn create(
    State(state): State<ServerState>,
    OptionalUser(user): OptionalUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let user_id = match &user {
        Some(u) => Some(
            u.id.parse::<surrealdb::RecordId>()
                .map_err(|_| AppError::internal("Malformed user id in token"))?,
        ),
        None => None,
    };

    let order = checkout::place_order(
        &state.db,
        state.config.shipping,
        &state.config.default_currency,
        user_id,
        payload,
    )
    .await?;

    // Side effects run after the order row exists; their failures never
    // roll back the order
    state.dispatch_order_notifications(order.clone());

    Ok((StatusCode::CREATED, Json(order)))
}

// page/limit inlined: serde_urlencoded cannot deserialize numeric
// fields through #[serde(flatten)]
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<OrderStatus>,
}

/// GET /api/orders
///
/// Admin: every order, optionally filtered by status.
/// Customer: only their own orders.
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<Paginated<Order>>> {
    let page = Pagination::parse(&PageQuery {
        page: query.page,
        limit: query.limit,
    });
    let filter = OrderFilter {
        status: query.status,
        user: if user.is_admin() {
            None
        } else {
            Some(user.id.clone())
        },
    };

    let repo = OrderRepository::new(state.surreal());
    let (orders, total) = repo.find_page(&filter, &page).await?;
    Ok(Json(Paginated::new(orders, &page, total)))
}

/// GET /api/orders/{id} - owner or admin
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let repo = OrderRepository::new(state.surreal());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;

    let is_owner = order
        .user
        .as_ref()
        .is_some_and(|owner| owner.to_string() == user.id);
    if !user.is_admin() && !is_owner {
        return Err(AppError::forbidden("Not your order"));
    }
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

/// PATCH /api/orders/{id}/status (admin)
///
/// Transitions go through the lifecycle state machine; anything else is
/// rejected before touching the row.
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<Order>> {
    require_admin(&user)?;
    let repo = OrderRepository::new(state.surreal());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;

    if !order.status.can_transition_to(payload.status) {
        return Err(AppError::business_rule(format!(
            "Cannot move order from {} to {}",
            order.status.as_str(),
            payload.status.as_str()
        )));
    }

    let updated = repo.update_status(&id, payload.status).await?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct PaymentUpdateRequest {
    pub paid: bool,
}

/// PATCH /api/orders/{id}/payment (admin)
pub async fn update_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<PaymentUpdateRequest>,
) -> AppResult<Json<Order>> {
    require_admin(&user)?;
    let repo = OrderRepository::new(state.surreal());
    let updated = repo.update_payment(&id, payload.paid).await?;
    Ok(Json(updated))
}
