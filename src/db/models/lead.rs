//! Lead (student inquiry) model.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Converted,
    Closed,
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadStatus::New => write!(f, "new"),
            LeadStatus::Contacted => write!(f, "contacted"),
            LeadStatus::Converted => write!(f, "converted"),
            LeadStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "converted" => Ok(LeadStatus::Converted),
            "closed" => Ok(LeadStatus::Closed),
            _ => Err(format!("Unknown lead status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: String,
    pub listing_id: String,
    pub vendor_id: String,
    pub student_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

impl Lead {
    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<Lead>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM leads WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn insert(&self, db: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO leads (id, listing_id, vendor_id, student_id, name, email,
                               phone, message, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.listing_id)
        .bind(&self.vendor_id)
        .bind(&self.student_id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.phone)
        .bind(&self.message)
        .bind(&self.status)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn list_for_vendor(
        db: &SqlitePool,
        vendor_id: &str,
    ) -> Result<Vec<Lead>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM leads WHERE vendor_id = ? ORDER BY created_at DESC")
            .bind(vendor_id)
            .fetch_all(db)
            .await
    }

    pub async fn count_for_vendor(db: &SqlitePool, vendor_id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads WHERE vendor_id = ?")
            .bind(vendor_id)
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    pub async fn set_status(
        db: &SqlitePool,
        id: &str,
        status: LeadStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE leads SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

/// Inquiry payload from the listing detail page.
#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLeadStatusRequest {
    pub status: String,
}
