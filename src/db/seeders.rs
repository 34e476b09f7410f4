//! Startup seeding.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::auth::hash_password;
use crate::config::AuthConfig;
use crate::db::User;

/// Make sure an admin account exists. Admin accounts cannot be created
/// through registration, so the first one comes from config; when no
/// password is configured a random one is generated and logged once.
pub async fn ensure_admin_user(pool: &SqlitePool, auth: &AuthConfig) -> Result<()> {
    if User::find_by_email(pool, &auth.admin_email).await?.is_some() {
        return Ok(());
    }

    let (password, generated) = match &auth.admin_password {
        Some(p) if !p.is_empty() => (p.clone(), false),
        _ => (Uuid::new_v4().to_string(), true),
    };

    let password_hash =
        hash_password(&password).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {}", e))?;

    let admin = User {
        id: Uuid::new_v4().to_string(),
        name: "Admin".to_string(),
        email: auth.admin_email.clone(),
        password_hash,
        phone: String::new(),
        user_type: "admin".to_string(),
        business_name: None,
        profile_image: None,
        is_active: true,
        created_at: String::new(),
        updated_at: String::new(),
    };
    admin.insert(pool).await?;

    info!("Created admin user {}", auth.admin_email);
    if generated {
        warn!(
            "No admin password configured; generated one-time password: {}",
            password
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_admin_once() {
        let db = crate::db::init_memory().await;
        let auth = AuthConfig {
            admin_email: "admin@test.local".to_string(),
            admin_password: Some("let-me-in-123".to_string()),
            session_ttl_days: 7,
        };

        ensure_admin_user(&db, &auth).await.unwrap();
        ensure_admin_user(&db, &auth).await.unwrap();

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE user_type = 'admin'")
                .fetch_one(&db)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }
}
