//! Product API Handlers
//!
//! Public listing and detail see active products only. Admin CRUD works
//! on any status; deletion is a hard delete (archive via status instead
//! when history matters).

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::{CurrentUser, OptionalUser};
use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductImage, ProductStatus, ProductUpdate, Rating};
use crate::db::repository::product::{ProductFilter, ProductSort};
use crate::db::repository::{CategoryRepository, ProductRepository, RepoError};
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text, validate_slug};
use crate::utils::{AppError, AppResult, PageQuery, Paginated, Pagination};

fn require_admin(user: &CurrentUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("Admin access required"))
    }
}

// page/limit are inlined rather than flattened: serde_urlencoded cannot
// deserialize numeric fields through #[serde(flatten)]
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub q: Option<String>,
    /// Category record id or slug
    pub category: Option<String>,
    pub sort: Option<ProductSort>,
}

impl ListQuery {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// GET /api/products
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Paginated<Product>>> {
    let page = Pagination::parse(&query.page_query());

    // Resolve the category filter up front; an unknown category matches
    // nothing rather than erroring
    let category = match &query.category {
        Some(selector) if !selector.trim().is_empty() => {
            let repo = CategoryRepository::new(state.surreal());
            match repo.find_by_id_or_slug(selector.trim()).await? {
                Some(category) => category.id,
                None => return Ok(Json(Paginated::empty(&page))),
            }
        }
        _ => None,
    };

    let filter = ProductFilter {
        q: query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
        category,
        sort: query.sort.unwrap_or_default(),
        active_only: true,
    };

    let repo = ProductRepository::new(state.surreal());
    let (products, total) = repo.find_page(&filter, &page).await?;
    Ok(Json(Paginated::new(products, &page, total)))
}

/// GET /api/products/{id} - record id or slug
///
/// Admins also see draft and archived products.
pub async fn get_by_id(
    State(state): State<ServerState>,
    OptionalUser(user): OptionalUser,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.surreal());

    let is_admin = user.as_ref().is_some_and(|u| u.is_admin());
    let product = if is_admin {
        match repo.find_by_id(&id).await {
            Ok(found) => found,
            // Not a record id; fall through to the slug path
            Err(RepoError::Validation(_)) => repo.find_active_by_id_or_slug(&id).await?,
            Err(e) => return Err(e.into()),
        }
    } else {
        repo.find_active_by_id_or_slug(&id).await?
    };

    product
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))
}

fn validate_pricing(price_in_fils: i64, compare_at: Option<i64>, stock: i64) -> AppResult<()> {
    if price_in_fils < 0 {
        return Err(AppError::validation("priceInFils must not be negative"));
    }
    if let Some(compare) = compare_at
        && compare < 0
    {
        return Err(AppError::validation(
            "compareAtPriceInFils must not be negative",
        ));
    }
    if stock < 0 {
        return Err(AppError::validation("stock must not be negative"));
    }
    Ok(())
}

/// POST /api/products (admin)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<(StatusCode, Json<Product>)> {
    require_admin(&user)?;
    validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;
    validate_slug(&payload.slug, "slug")?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_pricing(
        payload.price_in_fils,
        payload.compare_at_price_in_fils,
        payload.stock.unwrap_or(0),
    )?;

    let category = match &payload.category {
        Some(selector) if !selector.trim().is_empty() => {
            let repo = CategoryRepository::new(state.surreal());
            let category = repo
                .find_by_id_or_slug(selector.trim())
                .await?
                .ok_or_else(|| AppError::validation(format!("Unknown category: {selector}")))?;
            category.id
        }
        _ => None,
    };

    let now = Utc::now();
    let product = Product {
        id: None,
        title: payload.title.trim().to_string(),
        slug: payload.slug.clone(),
        description: payload.description.unwrap_or_default(),
        price_in_fils: payload.price_in_fils,
        compare_at_price_in_fils: payload.compare_at_price_in_fils,
        currency: payload
            .currency
            .unwrap_or_else(|| state.config.default_currency.clone()),
        stock: payload.stock.unwrap_or(0),
        status: payload.status.unwrap_or(ProductStatus::Draft),
        images: payload.images.unwrap_or_default(),
        category,
        rating: Rating::default(),
        created_at: now,
        updated_at: now,
    };

    let repo = ProductRepository::new(state.surreal());
    let created = repo.create(product).await.map_err(|e| match e {
        RepoError::Duplicate(_) => AppError::conflict("Product slug already exists"),
        other => other.into(),
    })?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/products/{id} (admin)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    require_admin(&user)?;
    if let Some(title) = &payload.title {
        validate_required_text(title, "title", MAX_NAME_LEN)?;
    }
    if let Some(slug) = &payload.slug {
        validate_slug(slug, "slug")?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_pricing(
        payload.price_in_fils.unwrap_or(0),
        payload.compare_at_price_in_fils,
        payload.stock.unwrap_or(0),
    )?;

    let repo = ProductRepository::new(state.surreal());
    let updated = repo.update(&id, payload).await.map_err(|e| match e {
        RepoError::Duplicate(_) => AppError::conflict("Product slug already exists"),
        other => other.into(),
    })?;
    Ok(Json(updated))
}

/// DELETE /api/products/{id} (admin)
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    require_admin(&user)?;
    let repo = ProductRepository::new(state.surreal());
    repo.delete(&id).await?;
    Ok(Json(true))
}

#[derive(Debug, Deserialize)]
pub struct AddImagesRequest {
    pub images: Vec<ProductImage>,
}

/// POST /api/products/{id}/images (admin)
///
/// Attaches already-uploaded image urls to the product gallery.
pub async fn add_images(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<AddImagesRequest>,
) -> AppResult<Json<Product>> {
    require_admin(&user)?;
    if payload.images.is_empty() {
        return Err(AppError::validation("images must not be empty"));
    }
    let repo = ProductRepository::new(state.surreal());
    let product = repo.push_images(&id, payload.images).await?;
    Ok(Json(product))
}
