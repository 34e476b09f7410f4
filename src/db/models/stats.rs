//! Dashboard stats, computed fresh on each request.

use serde::Serialize;
use sqlx::SqlitePool;

use super::lead::Lead;

/// Vendor dashboard summary.
#[derive(Debug, Clone, Serialize)]
pub struct VendorStats {
    pub total_listings: i64,
    pub active_listings: i64,
    pub total_views: i64,
    pub total_leads: i64,
    pub conversion_rate: f64,
}

impl VendorStats {
    pub async fn for_vendor(db: &SqlitePool, vendor_id: &str) -> Result<Self, sqlx::Error> {
        let (total_listings, active_listings, total_views): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'approved' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(views), 0)
            FROM listings
            WHERE vendor_id = ?
            "#,
        )
        .bind(vendor_id)
        .fetch_one(db)
        .await?;

        let total_leads = Lead::count_for_vendor(db, vendor_id).await?;

        Ok(Self {
            total_listings,
            active_listings,
            total_views,
            total_leads,
            conversion_rate: conversion_rate(total_leads, total_views),
        })
    }
}

/// Leads as a percentage of views, rounded to one decimal. Zero when there
/// are no views yet.
pub fn conversion_rate(leads: i64, views: i64) -> f64 {
    if views <= 0 {
        return 0.0;
    }
    (leads as f64 / views as f64 * 1000.0).round() / 10.0
}

/// Admin dashboard summary: global marketplace counts.
#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub total_students: i64,
    pub total_vendors: i64,
    pub active_listings: i64,
    pub pending_approvals: i64,
}

impl AdminStats {
    pub async fn collect(db: &SqlitePool) -> Result<Self, sqlx::Error> {
        let (total_students,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE user_type = 'student'")
                .fetch_one(db)
                .await?;
        let (total_vendors,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE user_type = 'vendor'")
                .fetch_one(db)
                .await?;
        let (active_listings,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM listings WHERE status = 'approved'")
                .fetch_one(db)
                .await?;
        let (pending_approvals,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM listings WHERE status = 'submitted'")
                .fetch_one(db)
                .await?;

        Ok(Self {
            total_students,
            total_vendors,
            active_listings,
            pending_approvals,
        })
    }
}
