//! Admin dashboard: marketplace stats, listing moderation, user management.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::{
    AdminStats, Listing, ListingResponse, ListingStatus, User, UserResponse, VendorSummary,
};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::ApiError;
use super::policy::{self, Action};

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<AdminStats>, ApiError> {
    policy::require(&user, Action::ViewAdminDashboard)?;
    let stats = AdminStats::collect(&state.db).await?;
    Ok(Json(stats))
}

#[derive(Debug, Default, Deserialize)]
pub struct ModerationFilter {
    pub status: Option<String>,
}

/// GET /api/admin/listings — moderation queue with vendor summaries,
/// optionally narrowed to one status.
pub async fn list_listings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<ModerationFilter>,
) -> Result<Json<Vec<ListingResponse>>, ApiError> {
    policy::require(&user, Action::ViewAdminDashboard)?;

    let status = match filter.status.as_deref() {
        Some("all") | None => None,
        Some(s) => Some(s.parse::<ListingStatus>().map_err(|_| {
            ApiError::validation_field(
                "status",
                "Status must be one of draft, submitted, approved, rejected",
            )
        })?),
    };
    let listings = Listing::list_with_status(&state.db, status).await?;

    // One vendor lookup per distinct vendor, not per listing
    let mut vendors: HashMap<String, Option<VendorSummary>> = HashMap::new();
    for listing in &listings {
        if !vendors.contains_key(&listing.vendor_id) {
            let summary = VendorSummary::find(&state.db, &listing.vendor_id).await?;
            vendors.insert(listing.vendor_id.clone(), summary);
        }
    }

    let responses = listings
        .into_iter()
        .map(|l| {
            let vendor = vendors.get(&l.vendor_id).cloned().flatten();
            ListingResponse::from(l).with_vendor(vendor)
        })
        .collect();
    Ok(Json(responses))
}

#[derive(Debug, Deserialize)]
pub struct DecideListingRequest {
    pub status: String,
}

/// PUT /api/admin/listings/:id/status — approve or reject a submitted
/// listing. Only submitted listings can be decided.
pub async fn update_listing_status(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<DecideListingRequest>,
) -> Result<Json<ListingResponse>, ApiError> {
    policy::require(&user, Action::DecideListing)?;

    let listing = Listing::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    let requested: ListingStatus = request.status.parse().map_err(|_| {
        ApiError::validation_field("status", "Status must be 'approved' or 'rejected'")
    })?;
    if !matches!(requested, ListingStatus::Approved | ListingStatus::Rejected) {
        return Err(ApiError::validation_field(
            "status",
            "Status must be 'approved' or 'rejected'",
        ));
    }
    let current = listing.status_enum();
    if !current.admin_can_decide(requested) {
        return Err(ApiError::conflict(
            "Only submitted listings can be approved or rejected",
        ));
    }

    Listing::set_status(&state.db, &id, requested).await?;
    tracing::info!(listing_id = %id, decision = %requested, admin_id = %user.id, "Listing moderated");

    let updated = Listing::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;
    Ok(Json(ListingResponse::from(updated)))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    #[serde(rename = "type")]
    pub user_type: Option<String>,
}

/// GET /api/admin/users — student and vendor accounts, optionally by type.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    policy::require(&user, Action::ModerateUsers)?;
    let users = User::list_for_admin(&state.db, filter.user_type.as_deref()).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub is_active: bool,
}

/// PUT /api/admin/users/:id/status — suspend or reactivate an account.
/// Admins cannot suspend themselves.
pub async fn update_user_status(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserStatusRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    policy::require(&user, Action::ModerateUsers)?;

    if id == user.id {
        return Err(ApiError::conflict("Cannot change your own account status"));
    }

    let affected = User::set_active(&state.db, &id, request.is_active).await?;
    if affected == 0 {
        return Err(ApiError::not_found("User not found"));
    }
    tracing::info!(user_id = %id, is_active = request.is_active, admin_id = %user.id, "User status changed");

    let updated = User::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(UserResponse::from(updated)))
}
