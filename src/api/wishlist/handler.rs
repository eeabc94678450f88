//! Wishlist API Handlers

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Product;
use crate::db::repository::{ProductRepository, UserRepository, parse_record_id};
use crate::utils::{AppError, AppResult};

/// GET /api/wishlist - the caller's wishlist, resolved to products
///
/// Products that went inactive since being saved drop out silently.
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    let users = UserRepository::new(state.surreal());
    let account = users
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Account not found"))?;

    if account.wishlist.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let products = ProductRepository::new(state.surreal());
    let resolved = products.find_active_by_ids(account.wishlist).await?;
    Ok(Json(resolved))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub product_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    /// True when the product is in the wishlist after the toggle
    pub in_wishlist: bool,
    pub wishlist: Vec<String>,
}

/// POST /api/wishlist/toggle
pub async fn toggle(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ToggleRequest>,
) -> AppResult<Json<ToggleResponse>> {
    let product_id = parse_record_id("product", &payload.product_id)
        .map_err(|_| AppError::validation(format!("Invalid product id: {}", payload.product_id)))?;

    // Only sellable products can be wishlisted
    let products = ProductRepository::new(state.surreal());
    let sellable = products
        .find_by_id(&product_id.to_string())
        .await?
        .is_some_and(|p| p.is_sellable());
    if !sellable {
        return Err(AppError::not_found(format!(
            "Product {} not found",
            payload.product_id
        )));
    }

    let users = UserRepository::new(state.surreal());
    let (wishlist, in_wishlist) = users.toggle_wishlist(&user.id, &product_id).await?;

    Ok(Json(ToggleResponse {
        in_wishlist,
        wishlist: wishlist.iter().map(|id| id.to_string()).collect(),
    }))
}
