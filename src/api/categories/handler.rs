//! Category API Handlers
//!
//! Listing and detail are public; create/update/delete are admin only.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Category, CategoryCreate, CategoryUpdate};
use crate::db::repository::{CategoryRepository, RepoError};
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text, validate_slug};
use crate::utils::{AppError, AppResult};

fn require_admin(user: &CurrentUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("Admin access required"))
    }
}

/// GET /api/categories
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    let repo = CategoryRepository::new(state.surreal());
    let categories = repo.find_all().await?;
    Ok(Json(categories))
}

/// GET /api/categories/{id} - id or slug
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Category>> {
    let repo = CategoryRepository::new(state.surreal());
    let category = repo
        .find_by_id_or_slug(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))?;
    Ok(Json(category))
}

/// POST /api/categories (admin)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<(StatusCode, Json<Category>)> {
    require_admin(&user)?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_slug(&payload.slug, "slug")?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let repo = CategoryRepository::new(state.surreal());
    let category = repo.create(payload).await.map_err(|e| match e {
        RepoError::Duplicate(_) => AppError::conflict("Category slug already exists"),
        other => other.into(),
    })?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/{id} (admin)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    require_admin(&user)?;
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(slug) = &payload.slug {
        validate_slug(slug, "slug")?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let repo = CategoryRepository::new(state.surreal());
    let category = repo.update(&id, payload).await.map_err(|e| match e {
        RepoError::Duplicate(_) => AppError::conflict("Category slug already exists"),
        other => other.into(),
    })?;
    Ok(Json(category))
}

/// DELETE /api/categories/{id} (admin)
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    require_admin(&user)?;
    let repo = CategoryRepository::new(state.surreal());
    repo.delete(&id).await?;
    Ok(Json(true))
}
