//! Per-user listing favorites.
//!
//! One row per (listing, user) pair, enforced by a unique index; the toggle
//! flips the status flag in place instead of inserting duplicates.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Like {
    pub id: String,
    pub listing_id: String,
    pub user_id: String,
    pub status: bool,
    pub created_at: String,
}

impl Like {
    pub async fn find(
        db: &SqlitePool,
        listing_id: &str,
        user_id: &str,
    ) -> Result<Option<Like>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM likes WHERE listing_id = ? AND user_id = ?")
            .bind(listing_id)
            .bind(user_id)
            .fetch_optional(db)
            .await
    }

    /// Toggle the favorite flag, creating the record on first like.
    /// Returns the new status.
    pub async fn toggle(
        db: &SqlitePool,
        listing_id: &str,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        match Like::find(db, listing_id, user_id).await? {
            Some(like) => {
                let new_status = !like.status;
                sqlx::query("UPDATE likes SET status = ? WHERE id = ?")
                    .bind(new_status)
                    .bind(&like.id)
                    .execute(db)
                    .await?;
                Ok(new_status)
            }
            None => {
                sqlx::query(
                    "INSERT INTO likes (id, listing_id, user_id, status) VALUES (?, ?, ?, 1)",
                )
                .bind(Uuid::new_v4().to_string())
                .bind(listing_id)
                .bind(user_id)
                .execute(db)
                .await?;
                Ok(true)
            }
        }
    }

    /// Ids of listings the user currently likes.
    pub async fn liked_listing_ids(
        db: &SqlitePool,
        user_id: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT listing_id FROM likes WHERE user_id = ? AND status = 1")
                .bind(user_id)
                .fetch_all(db)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleLikeRequest {
    pub listing_id: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleLikeResponse {
    pub listing_id: String,
    pub liked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed(db: &SqlitePool) {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, user_type) VALUES ('v1', 'V', 'v@example.com', 'h', 'vendor')",
        )
        .execute(db)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, user_type) VALUES ('s1', 'S', 's@example.com', 'h', 'student')",
        )
        .execute(db)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO listings (id, vendor_id, title, category, location, city, price) VALUES ('l1', 'v1', 'T', 'hostel', 'Pune', 'Pune', 100)",
        )
        .execute(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn double_toggle_restores_original_state() {
        let db = crate::db::init_memory().await;
        seed(&db).await;

        assert!(Like::toggle(&db, "l1", "s1").await.unwrap());
        assert!(!Like::toggle(&db, "l1", "s1").await.unwrap());

        // still a single record, not two
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn liked_ids_only_include_active_likes() {
        let db = crate::db::init_memory().await;
        seed(&db).await;

        Like::toggle(&db, "l1", "s1").await.unwrap();
        assert_eq!(
            Like::liked_listing_ids(&db, "s1").await.unwrap(),
            vec!["l1".to_string()]
        );

        Like::toggle(&db, "l1", "s1").await.unwrap();
        assert!(Like::liked_listing_ids(&db, "s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_pair_rejected_by_unique_index() {
        let db = crate::db::init_memory().await;
        seed(&db).await;

        Like::toggle(&db, "l1", "s1").await.unwrap();
        let err = sqlx::query(
            "INSERT INTO likes (id, listing_id, user_id, status) VALUES ('x', 'l1', 's1', 1)",
        )
        .execute(&db)
        .await
        .unwrap_err();
        assert!(err.to_string().contains("UNIQUE"));
    }
}
