//! Registration, login, sessions, and the authenticated-user extractor.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    Json,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::db::{
    AuthResponse, LoginRequest, RegisterRequest, Session, UpdateProfileRequest, User,
    UserResponse,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_email, validate_name, validate_password, validate_phone, validate_registration_type,
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random bearer token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage; only the hash is persisted.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Create a session for the user and return the bearer token.
async fn create_session(
    db: &sqlx::SqlitePool,
    user_id: &str,
    ttl_days: i64,
) -> Result<String, ApiError> {
    let token = generate_token();
    let token_hash = hash_token(&token);

    // Stored in sqlite datetime format so it compares against datetime('now')
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(ttl_days))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    sqlx::query("INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)")
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(&token_hash)
        .bind(&expires_at)
        .execute(db)
        .await?;

    Ok(token)
}

/// Register a new student or vendor account and log them in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_name(&request.name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_email(&request.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_password(&request.password) {
        errors.add("password", e);
    }
    if let Err(e) = validate_phone(&request.phone) {
        errors.add("phone", e);
    }
    if let Err(e) = validate_registration_type(&request.user_type) {
        errors.add("type", e);
    }
    errors.finish()?;

    if User::find_by_email(&state.db, &request.email)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: request.name.trim().to_string(),
        email: request.email,
        password_hash,
        phone: request.phone,
        user_type: request.user_type,
        business_name: request.business_name,
        profile_image: None,
        is_active: true,
        created_at: String::new(),
        updated_at: String::new(),
    };
    user.insert(&state.db).await?;

    tracing::info!(email = %user.email, user_type = %user.user_type, "Registered new user");

    let token = create_session(&state.db, &user.id, state.config.auth.session_ttl_days).await?;

    // Re-read so the response carries store-assigned timestamps
    let user = User::find(&state.db, &user.id)
        .await?
        .ok_or_else(|| ApiError::internal("User vanished after registration"))?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = User::find_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    if !user.is_active {
        return Err(ApiError::forbidden("Account is suspended"));
    }

    let token = create_session(&state.db, &user.id, state.config.auth.session_ttl_days).await?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Current user profile
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Self-service profile edit. Email and account type never change here.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(name) = &request.name {
        if let Err(e) = validate_name(name) {
            errors.add("name", e);
        }
    }
    if let Some(phone) = &request.phone {
        if let Err(e) = validate_phone(phone) {
            errors.add("phone", e);
        }
    }
    if let Some(password) = &request.password {
        if let Err(e) = validate_password(password) {
            errors.add("password", e);
        }
    }
    errors.finish()?;

    let name = request.name.map(|n| n.trim().to_string()).unwrap_or(user.name);
    let phone = request.phone.unwrap_or(user.phone);
    let business_name = request.business_name.or(user.business_name);
    let profile_image = request.profile_image.or(user.profile_image);
    let password_hash = match request.password {
        Some(password) => hash_password(&password)
            .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?,
        None => user.password_hash,
    };

    sqlx::query(
        r#"
        UPDATE users
        SET name = ?, phone = ?, business_name = ?, profile_image = ?,
            password_hash = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(&phone)
    .bind(&business_name)
    .bind(&profile_image)
    .bind(&password_hash)
    .bind(&user.id)
    .execute(&state.db)
    .await?;

    let updated = User::find(&state.db, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(updated)))
}

/// Extract the bearer token from request headers
fn extract_token(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Resolve a token to its user. Fails 401 for missing/expired sessions and
/// 403 for suspended accounts -- suspension applies to every authenticated
/// call, not just login.
pub async fn get_current_user(db: &sqlx::SqlitePool, token: &str) -> Result<User, ApiError> {
    let token_hash = hash_token(token);
    let session: Option<Session> = sqlx::query_as(
        "SELECT * FROM sessions WHERE token_hash = ? AND expires_at > datetime('now')",
    )
    .bind(&token_hash)
    .fetch_optional(db)
    .await?;

    let session = session.ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    let user = User::find(db, &session.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    if !user.is_active {
        return Err(ApiError::forbidden("Account is suspended"));
    }

    Ok(user)
}

/// Extractor for the authenticated user on protected routes.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;
        let user = get_current_user(&state.db, &token).await?;
        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorCode;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("topsecret99").unwrap();
        assert!(verify_password("topsecret99", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("topsecret99", "not-a-hash"));
    }

    #[test]
    fn token_hash_is_stable_and_opaque() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
    }

    #[tokio::test]
    async fn session_resolves_to_user() {
        let db = crate::db::init_memory().await;
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, user_type) VALUES ('u1', 'U', 'u@example.com', 'h', 'student')",
        )
        .execute(&db)
        .await
        .unwrap();

        let token = create_session(&db, "u1", 7).await.unwrap();
        let user = get_current_user(&db, &token).await.unwrap();
        assert_eq!(user.id, "u1");

        let err = get_current_user(&db, "bogus-token").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn suspended_user_is_forbidden_with_valid_token() {
        let db = crate::db::init_memory().await;
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, user_type) VALUES ('u1', 'U', 'u@example.com', 'h', 'vendor')",
        )
        .execute(&db)
        .await
        .unwrap();

        let token = create_session(&db, "u1", 7).await.unwrap();
        crate::db::User::set_active(&db, "u1", false).await.unwrap();

        let err = get_current_user(&db, &token).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let db = crate::db::init_memory().await;
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, user_type) VALUES ('u1', 'U', 'u@example.com', 'h', 'student')",
        )
        .execute(&db)
        .await
        .unwrap();

        let token = generate_token();
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES ('s1', 'u1', ?, datetime('now', '-1 day'))",
        )
        .bind(hash_token(&token))
        .execute(&db)
        .await
        .unwrap();

        let err = get_current_user(&db, &token).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
