//! Auth API Handlers

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::auth::{CurrentUser, JwtError, TokenPair};
use crate::core::ServerState;
use crate::db::models::{User, UserPublic};
use crate::db::repository::{RepoError, UserRepository};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, is_valid_email, validate_required_text,
};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserPublic,
    pub tokens: TokenPair,
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn issue_tokens(state: &ServerState, user: &User) -> AppResult<TokenPair> {
    let id = user
        .id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or_else(|| AppError::internal("User row has no id"))?;
    state
        .jwt_service()
        .generate_pair(&id, &user.name, &user.email, role_str(user))
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))
}

fn role_str(user: &User) -> &'static str {
    match user.role {
        crate::db::models::Role::Admin => "admin",
        crate::db::models::Role::Customer => "customer",
    }
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::validation("email is not a valid email address"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN || payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} characters"
        )));
    }

    let repo = UserRepository::new(state.surreal());
    let password_hash = hash_password(&payload.password)?;
    let user = repo
        .create(payload.name.trim().to_string(), email, password_hash)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::conflict("Email already registered"),
            other => other.into(),
        })?;

    let tokens = issue_tokens(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserPublic::from(&user),
            tokens,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let repo = UserRepository::new(state.surreal());
    let user = repo
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::invalid_credentials());
    }

    let tokens = issue_tokens(&state, &user)?;
    Ok(Json(AuthResponse {
        user: UserPublic::from(&user),
        tokens,
    }))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<ServerState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let claims = state
        .jwt_service()
        .validate_refresh(&payload.refresh_token)
        .map_err(|e| match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid refresh token"),
        })?;

    // The account must still exist; role changes take effect here too
    let repo = UserRepository::new(state.surreal());
    let user = repo
        .find_by_id(&claims.sub)
        .await?
        .ok_or_else(|| AppError::invalid_token("Account no longer exists"))?;

    let tokens = issue_tokens(&state, &user)?;
    Ok(Json(AuthResponse {
        user: UserPublic::from(&user),
        tokens,
    }))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; logout just tells the client to drop them.
pub async fn logout() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// GET /api/auth/me
pub async fn me(State(state): State<ServerState>, user: CurrentUser) -> AppResult<Json<UserPublic>> {
    let repo = UserRepository::new(state.surreal());
    let account = repo
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Account not found"))?;
    Ok(Json(UserPublic::from(&account)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
