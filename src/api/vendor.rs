//! Vendor dashboard: stats, own listings, and lead management.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::{
    serialize_address, serialize_string_list, Category, Gender, Lead, LeadStatus, Listing,
    ListingResponse, ListingStatus, UpdateLeadStatusRequest, UpdateListingRequest, VendorStats,
};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::policy::{self, Action};
use super::validation::{validate_description, validate_location, validate_price, validate_title};

/// GET /api/vendor/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<VendorStats>, ApiError> {
    policy::require(&user, Action::ViewVendorDashboard)?;
    let stats = VendorStats::for_vendor(&state.db, &user.id).await?;
    Ok(Json(stats))
}

/// GET /api/vendor/listings — all of the caller's listings, every status.
pub async fn list_listings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ListingResponse>>, ApiError> {
    policy::require(&user, Action::ViewVendorDashboard)?;
    let listings = Listing::list_for_vendor(&state.db, &user.id).await?;
    Ok(Json(listings.into_iter().map(ListingResponse::from).collect()))
}

/// PUT /api/vendor/listings/:id — partial edit plus lifecycle moves.
///
/// Vendors may keep the current status, or move draft/rejected listings to
/// submitted. Approval and rejection are admin decisions and come back as
/// 403 here; any other transition is a 409.
pub async fn update_listing(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateListingRequest>,
) -> Result<Json<ListingResponse>, ApiError> {
    let mut listing = Listing::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;
    policy::require(&user, Action::EditListing(&listing))?;

    let current = listing.status_enum();
    let requested = match &request.status {
        Some(s) => Some(s.parse::<ListingStatus>().map_err(|_| {
            ApiError::validation_field(
                "status",
                "Status must be one of draft, submitted, approved, rejected",
            )
        })?),
        None => None,
    };
    if let Some(requested) = requested {
        if requested != current {
            policy::require(&user, Action::SubmitListing(&listing))?;
            if !current.vendor_can_set(requested) {
                if matches!(requested, ListingStatus::Approved | ListingStatus::Rejected) {
                    return Err(ApiError::forbidden(
                        "Only admins can approve or reject listings",
                    ));
                }
                return Err(ApiError::conflict(format!(
                    "Cannot change status from {} to {}",
                    current, requested
                )));
            }
        }
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Some(title) = &request.title {
        if let Err(e) = validate_title(title) {
            errors.add("title", e);
        }
    }
    if let Some(description) = &request.description {
        if let Err(e) = validate_description(description) {
            errors.add("description", e);
        }
    }
    if let Some(category) = &request.category {
        if category.parse::<Category>().is_err() {
            errors.add(
                "category",
                "Category must be one of hostel, pg, coaching, library, mess",
            );
        }
    }
    if let Some(location) = &request.location {
        if let Err(e) = validate_location("Location", location) {
            errors.add("location", e);
        }
    }
    if let Some(city) = &request.city {
        if let Err(e) = validate_location("City", city) {
            errors.add("city", e);
        }
    }
    if let Some(price) = request.price {
        if let Err(e) = validate_price(price) {
            errors.add("price", e);
        }
    }
    if let Some(gender) = &request.gender {
        if gender.parse::<Gender>().is_err() {
            errors.add("gender", "Gender must be one of boys, girls, unisex");
        }
    }
    if let Some(images) = &request.images {
        if images.len() > state.config.uploads.max_gallery_images {
            errors.add(
                "images",
                format!(
                    "At most {} gallery images are allowed",
                    state.config.uploads.max_gallery_images
                ),
            );
        }
    }
    errors.finish()?;

    if let Some(title) = request.title {
        listing.title = title.trim().to_string();
    }
    if let Some(description) = request.description {
        listing.description = description;
    }
    if let Some(category) = request.category {
        listing.category = category.to_lowercase();
    }
    if let Some(location) = request.location {
        listing.location = location;
    }
    if let Some(city) = request.city {
        listing.city = city;
    }
    if request.address.is_some() {
        listing.address = serialize_address(&request.address);
    }
    if let Some(price) = request.price {
        listing.price = price;
    }
    if let Some(image) = request.image {
        listing.image = image;
    }
    if let Some(images) = request.images {
        listing.images = serialize_string_list(&images);
    }
    if let Some(videos) = request.videos {
        listing.videos = serialize_string_list(&videos);
    }
    if let Some(features) = request.features {
        listing.features = serialize_string_list(&features);
    }
    if let Some(amenities) = request.amenities {
        listing.amenities = serialize_string_list(&amenities);
    }
    if let Some(gender) = request.gender {
        listing.gender = gender.to_lowercase();
    }
    if let Some(requested) = requested {
        listing.status = requested.to_string();
    }
    listing.update(&state.db).await?;

    if let Some(requested) = requested {
        if requested != current {
            tracing::info!(listing_id = %id, from = %current, to = %requested, "Listing status changed");
        }
    }

    let updated = Listing::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;
    Ok(Json(ListingResponse::from(updated)))
}

/// DELETE /api/vendor/listings/:id
pub async fn delete_listing(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let listing = Listing::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;
    policy::require(&user, Action::DeleteListing(&listing))?;

    Listing::delete(&state.db, &id).await?;
    tracing::info!(listing_id = %id, vendor_id = %user.id, "Deleted listing");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct LeadFilter {
    pub listing_id: Option<String>,
}

/// GET /api/vendor/leads — inquiries for the caller's listings, newest first.
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<LeadFilter>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    policy::require(&user, Action::ViewVendorDashboard)?;
    let mut leads = Lead::list_for_vendor(&state.db, &user.id).await?;
    if let Some(listing_id) = filter.listing_id {
        leads.retain(|l| l.listing_id == listing_id);
    }
    Ok(Json(leads))
}

/// PUT /api/vendor/leads/:id/status
pub async fn update_lead_status(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateLeadStatusRequest>,
) -> Result<Json<Lead>, ApiError> {
    let lead = Lead::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead not found"))?;
    policy::require(&user, Action::ManageLead(&lead))?;

    let status: LeadStatus = request.status.parse().map_err(|_| {
        ApiError::validation_field(
            "status",
            "Status must be one of new, contacted, converted, closed",
        )
    })?;
    Lead::set_status(&state.db, &id, status).await?;

    let updated = Lead::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead not found"))?;
    Ok(Json(updated))
}
