//! User, session, and role models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Marketplace roles. Fixed at registration; never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Browses listings, likes them, sends inquiries
    Student,
    /// Creates and manages listings, works leads
    Vendor,
    /// Moderates listings and user accounts
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Student => write!(f, "student"),
            UserRole::Vendor => write!(f, "vendor"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(UserRole::Student),
            "vendor" => Ok(UserRole::Vendor),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Unknown user type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub user_type: String,
    pub business_name: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn role(&self) -> UserRole {
        self.user_type.parse().unwrap_or(UserRole::Student)
    }

    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(db)
            .await
    }

    pub async fn insert(&self, db: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, phone, user_type,
                               business_name, profile_image, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(&self.phone)
        .bind(&self.user_type)
        .bind(&self.business_name)
        .bind(&self.profile_image)
        .bind(self.is_active)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Users visible on the admin dashboard. Admin accounts are excluded
    /// unless explicitly requested by type.
    pub async fn list_for_admin(
        db: &SqlitePool,
        user_type: Option<&str>,
    ) -> Result<Vec<User>, sqlx::Error> {
        match user_type {
            Some(t) => {
                sqlx::query_as(
                    "SELECT * FROM users WHERE user_type = ? ORDER BY created_at DESC",
                )
                .bind(t)
                .fetch_all(db)
                .await
            }
            None => {
                sqlx::query_as(
                    "SELECT * FROM users WHERE user_type != 'admin' ORDER BY created_at DESC",
                )
                .fetch_all(db)
                .await
            }
        }
    }

    pub async fn set_active(
        db: &SqlitePool,
        id: &str,
        is_active: bool,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET is_active = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(is_active)
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub business_name: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            user_type: user.user_type,
            business_name: user.business_name,
            profile_image: user.profile_image,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Compact vendor summary attached to listing responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VendorSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub business_name: Option<String>,
}

impl VendorSummary {
    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<VendorSummary>, sqlx::Error> {
        sqlx::query_as("SELECT id, name, email, business_name FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub business_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub business_name: Option<String>,
    pub profile_image: Option<String>,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing() {
        assert_eq!("vendor".parse::<UserRole>().unwrap(), UserRole::Vendor);
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("landlord".parse::<UserRole>().is_err());
    }

    #[test]
    fn response_drops_password_hash() {
        let user = User {
            id: "u1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            phone: "9876543210".to_string(),
            user_type: "student".to_string(),
            business_name: None,
            profile_image: None,
            is_active: true,
            created_at: "2025-01-01 00:00:00".to_string(),
            updated_at: "2025-01-01 00:00:00".to_string(),
        };
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains(r#""type":"student""#));
    }

    #[tokio::test]
    async fn duplicate_email_rejected_by_store() {
        let db = crate::db::init_memory().await;
        let mut user = User {
            id: "u1".to_string(),
            name: "First".to_string(),
            email: "dup@example.com".to_string(),
            password_hash: "h".to_string(),
            phone: String::new(),
            user_type: "student".to_string(),
            business_name: None,
            profile_image: None,
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
        };
        user.insert(&db).await.unwrap();

        user.id = "u2".to_string();
        user.name = "Second".to_string();
        let err = user.insert(&db).await.unwrap_err();
        assert!(err.to_string().contains("UNIQUE"));

        // No second document was created
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = 'dup@example.com'")
                .fetch_one(&db)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }
}
